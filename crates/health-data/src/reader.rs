//! Export file discovery and loading for the ingestion stage.
//!
//! Locates the structured files produced by the external exporters under the
//! data directory and reads each one into a [`Table`] named after the raw
//! store table it feeds.

use std::fs::File;
use std::path::{Path, PathBuf};

use health_core::error::{HealthError, Result};
use health_core::records::{
    RAW_ACTIVE_ENERGY, RAW_BODYWEIGHT, RAW_HEART_RATE, RAW_NUTRITION, RAW_RESTING_HEART_RATE,
    RAW_REST_ENERGY, RAW_STANDING, RAW_STEPS, RAW_WORKOUT,
};
use health_core::table::{Cell, Table};
use tracing::{debug, warn};

/// Directory the health-device export parser writes into.
pub const HEALTH_EXPORT_DIR: &str = "apple_health_export";

/// Health-device export files, keyed by the raw table they load into.
pub const HEALTH_EXPORT_FILES: &[(&str, &str)] = &[
    (RAW_WORKOUT, "Workout.csv"),
    (RAW_ACTIVE_ENERGY, "ActiveEnergyBurned.csv"),
    (RAW_REST_ENERGY, "BasalEnergyBurned.csv"),
    (RAW_BODYWEIGHT, "BodyMass.csv"),
    (RAW_STANDING, "AppleStandTime.csv"),
    (RAW_HEART_RATE, "HeartRate.csv"),
    (RAW_RESTING_HEART_RATE, "RestingHeartRate.csv"),
];

/// Step-counter export, relative to the data directory.
pub const STEPS_EXPORT: &str = "Exports/activity-export.csv";

/// Diet-diary exports carry a date range in their name; only the prefix is fixed.
pub const NUTRITION_PREFIX: &str = "Nutrition";

// ── ExportFile ────────────────────────────────────────────────────────────────

/// How a raw file's header row is turned into column names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderStyle {
    /// Use header fields verbatim.
    Verbatim,
    /// Keep only the first word of each header (`"date (local)"` → `"date"`).
    FirstWord,
}

/// One located export file.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportFile {
    pub table: &'static str,
    pub path: PathBuf,
    pub delimiter: u8,
    pub headers: HeaderStyle,
}

impl ExportFile {
    fn csv(table: &'static str, path: PathBuf) -> Self {
        Self {
            table,
            path,
            delimiter: b',',
            headers: HeaderStyle::Verbatim,
        }
    }
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Locate every export file under `data_dir`.
///
/// Fails on the first missing file, before anything is read.
pub fn locate_exports(data_dir: &Path) -> Result<Vec<ExportFile>> {
    let health_dir = data_dir.join(HEALTH_EXPORT_DIR);
    let mut files: Vec<ExportFile> = HEALTH_EXPORT_FILES
        .iter()
        .map(|&(table, file)| ExportFile::csv(table, health_dir.join(file)))
        .collect();

    files.push(ExportFile {
        table: RAW_STEPS,
        path: data_dir.join(STEPS_EXPORT),
        delimiter: b';',
        headers: HeaderStyle::FirstWord,
    });

    let nutrition = find_nutrition_export(data_dir).ok_or_else(|| {
        HealthError::MissingInput(data_dir.join(format!("{}*.csv", NUTRITION_PREFIX)))
    })?;
    files.push(ExportFile::csv(RAW_NUTRITION, nutrition));

    if let Some(missing) = files.iter().find(|f| !f.path.is_file()) {
        return Err(HealthError::MissingInput(missing.path.clone()));
    }

    Ok(files)
}

/// Find the diet-diary export directly inside `data_dir`.
///
/// When several files match, the lexicographically last one wins.
pub fn find_nutrition_export(data_dir: &Path) -> Option<PathBuf> {
    if !data_dir.exists() {
        warn!("Data path does not exist: {}", data_dir.display());
        return None;
    }

    let mut matches: Vec<PathBuf> = walkdir::WalkDir::new(data_dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            let name = entry.file_name().to_string_lossy();
            entry.file_type().is_file()
                && name.starts_with(NUTRITION_PREFIX)
                && name.ends_with(".csv")
        })
        .map(|entry| entry.into_path())
        .collect();

    matches.sort();
    if matches.len() > 1 {
        debug!("{} nutrition exports found, using the last", matches.len());
    }
    matches.pop()
}

/// Read one located export into a table.
pub fn load_export(file: &ExportFile) -> Result<Table> {
    let mut table = read_csv(file.table, &file.path, file.delimiter)?;
    if file.headers == HeaderStyle::FirstWord {
        table.rename_columns(first_word);
    }
    debug!(
        "Read {} rows x {} columns from {}",
        table.len(),
        table.columns().len(),
        file.path.display()
    );
    Ok(table)
}

/// Read a delimited file with a header row into a table named `name`.
///
/// Ragged rows are a parse error; cells are typed with [`Cell::infer`].
pub fn read_csv(name: &str, path: &Path, delimiter: u8) -> Result<Table> {
    let file = File::open(path).map_err(|source| HealthError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .trim(csv::Trim::All)
        .from_reader(file);

    let csv_err = |e: csv::Error| HealthError::CsvParse {
        path: path.to_path_buf(),
        message: e.to_string(),
    };

    let columns: Vec<String> = reader
        .headers()
        .map_err(csv_err)?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').to_string())
        .collect();

    let mut table = Table::new(name, columns);
    for record in reader.records() {
        let record = record.map_err(csv_err)?;
        table.push_row(record.iter().map(Cell::infer).collect())?;
    }

    Ok(table)
}

// ── Internal helpers ──────────────────────────────────────────────────────────

fn first_word(header: &str) -> String {
    header.split(' ').next().unwrap_or(header).to_string()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
