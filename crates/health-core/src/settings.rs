use chrono::NaiveDate;
use clap::{CommandFactory, Parser};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::HealthError;
use crate::time_utils::TimezoneHandler;

/// Device whose active-energy samples are authoritative.  The export writes a
/// non-breaking space between the first two words.
pub const DEFAULT_ACTIVE_ENERGY_SOURCE: &str = "Apple\u{a0}Watch von Kevin";

/// Manual-entry source whose bodyweight samples are kept.
pub const DEFAULT_WEIGHT_SOURCE: &str = "Health";

/// Source name written on days without a recorded workout.
pub const DEFAULT_WORKOUT_SOURCE: &str = "GymGoal Pro";

/// First day of every calendar grid.
pub const DEFAULT_EPOCH: &str = "2019-08-01";

/// Rows on or before this date are dropped as bootstrap period.
pub const DEFAULT_CUTOFF: &str = "2019-07-31";

// ── Stage ─────────────────────────────────────────────────────────────────────

/// Which part of the pipeline a run executes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Load the raw export files into the store.
    Ingest,
    /// Rebuild the cleaned tables from the raw tables in the store.
    Clean,
    /// Ingest, then clean.
    All,
}

impl FromStr for Stage {
    type Err = HealthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ingest" => Ok(Stage::Ingest),
            "clean" => Ok(Stage::Clean),
            "all" => Ok(Stage::All),
            other => Err(HealthError::Config(format!("unknown stage: {}", other))),
        }
    }
}

// ── PipelineConfig ────────────────────────────────────────────────────────────

/// Everything the library crates need to know about a run.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Root directory of the export drop.
    pub data_dir: PathBuf,
    /// First day of every calendar grid.
    pub epoch: NaiveDate,
    /// Rows on or before this date are dropped.
    pub cutoff: NaiveDate,
    pub active_energy_source: String,
    pub weight_source: String,
    pub workout_source: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./Data"),
            epoch: NaiveDate::from_ymd_opt(2019, 8, 1).unwrap_or_default(),
            cutoff: NaiveDate::from_ymd_opt(2019, 7, 31).unwrap_or_default(),
            active_energy_source: DEFAULT_ACTIVE_ENERGY_SOURCE.to_string(),
            weight_source: DEFAULT_WEIGHT_SOURCE.to_string(),
            workout_source: DEFAULT_WORKOUT_SOURCE.to_string(),
        }
    }
}

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Normalize personal health exports into calendar-aligned tables
#[derive(Parser, Debug, Clone)]
#[command(
    name = "health-pipeline",
    about = "Normalize personal health exports into calendar-aligned tables",
    version
)]
pub struct Settings {
    /// Pipeline stage to run
    #[arg(long, default_value = "all", value_parser = ["ingest", "clean", "all"])]
    pub stage: String,

    /// Directory holding the exported files
    #[arg(long, default_value = "./Data")]
    pub data_dir: PathBuf,

    /// SQLite store path (defaults to <data-dir>/Health.db)
    #[arg(long)]
    pub db: Option<PathBuf>,

    /// First day of the calendar grid (YYYY-MM-DD)
    #[arg(long, default_value = DEFAULT_EPOCH, value_parser = parse_date_arg)]
    pub epoch: NaiveDate,

    /// Drop rows on or before this date (YYYY-MM-DD)
    #[arg(long, default_value = DEFAULT_CUTOFF, value_parser = parse_date_arg)]
    pub cutoff: NaiveDate,

    /// Timezone used to evaluate "now" (auto-detected if not specified)
    #[arg(long, default_value = "auto")]
    pub timezone: String,

    /// Device whose active-energy samples are kept
    #[arg(long, default_value = DEFAULT_ACTIVE_ENERGY_SOURCE)]
    pub active_energy_source: String,

    /// Source whose bodyweight samples are kept
    #[arg(long, default_value = DEFAULT_WEIGHT_SOURCE)]
    pub weight_source: String,

    /// Source name filled in on days without a workout
    #[arg(long, default_value = DEFAULT_WORKOUT_SOURCE)]
    pub workout_source: String,

    /// Write a JSON run report to this path
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Logging level
    #[arg(long, default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL"])]
    pub log_level: String,

    /// Log file path
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,

    /// Clear saved configuration
    #[arg(long)]
    pub clear: bool,

    /// Problems met while loading, logged once logging is set up.
    #[arg(skip)]
    pub warnings: Vec<String>,
}

fn parse_date_arg(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| format!("{} (expected YYYY-MM-DD)", e))
}

// ── PersistedParams ───────────────────────────────────────────────────────────

/// Source and location overrides saved to `~/.health-pipeline/config.json`.
#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq)]
pub struct PersistedParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_energy_source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight_source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workout_source: Option<String>,
}

impl PersistedParams {
    /// Default path of the persisted config file.
    pub fn config_path() -> PathBuf {
        Self::config_path_in(&dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
    }

    /// Config path rooted at `base_dir`.
    pub fn config_path_in(base_dir: &Path) -> PathBuf {
        base_dir.join(".health-pipeline").join("config.json")
    }

    /// Load persisted params; `Default` when the file is absent or unreadable.
    pub fn load_from(path: &Path) -> Self {
        let Ok(content) = std::fs::read_to_string(path) else {
            return Self::default();
        };
        serde_json::from_str(&content).unwrap_or_default()
    }

    /// Atomically write params to `path`, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<(), std::io::Error> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;

        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, &json)?;
        std::fs::rename(&tmp, path)?;

        Ok(())
    }

    /// Delete the config file at `path` if it exists.
    pub fn clear_at(path: &Path) -> Result<(), std::io::Error> {
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }
}

// ── Settings impl ──────────────────────────────────────────────────────────────

impl Settings {
    /// Parse CLI arguments, merge persisted params where no explicit CLI value
    /// was provided, resolve `"auto"` values, and persist the result.
    pub fn load() -> Self {
        Self::load_impl(std::env::args_os().collect(), &PersistedParams::config_path())
    }

    /// Same as [`Settings::load`] with an explicit argument list and config path.
    pub fn load_impl(args: Vec<std::ffi::OsString>, config_path: &Path) -> Self {
        let matches = Settings::command().get_matches_from(args.clone());
        let mut settings = Settings::parse_from(args);

        if settings.clear {
            if let Err(e) = PersistedParams::clear_at(config_path) {
                settings
                    .warnings
                    .push(format!("could not clear {}: {}", config_path.display(), e));
            }
            return Self::resolve_auto_values(settings);
        }

        let persisted = PersistedParams::load_from(config_path);

        // CLI always wins over persisted values.
        if !is_arg_explicitly_set(&matches, "data_dir") {
            if let Some(v) = persisted.data_dir {
                settings.data_dir = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "timezone") {
            if let Some(v) = persisted.timezone {
                settings.timezone = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "active_energy_source") {
            if let Some(v) = persisted.active_energy_source {
                settings.active_energy_source = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "weight_source") {
            if let Some(v) = persisted.weight_source {
                settings.weight_source = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "workout_source") {
            if let Some(v) = persisted.workout_source {
                settings.workout_source = v;
            }
        }

        // Persist before resolving "auto" so the zone keeps tracking the system.
        let params = PersistedParams::from(&settings);
        if let Err(e) = params.save_to(config_path) {
            settings.warnings.push(format!(
                "could not persist settings to {}: {}",
                config_path.display(),
                e
            ));
        }

        Self::resolve_auto_values(settings)
    }

    /// Resolve `"auto"` sentinel values and apply the `--debug` flag.
    fn resolve_auto_values(mut settings: Settings) -> Settings {
        if settings.timezone == "auto" {
            settings.timezone = crate::time_utils::get_system_timezone();
        } else if !TimezoneHandler::validate_timezone(&settings.timezone) {
            let unknown = std::mem::replace(&mut settings.timezone, "UTC".to_string());
            settings
                .warnings
                .push(format!("unknown timezone {:?}, using UTC", unknown));
        }

        if settings.debug {
            settings.log_level = "DEBUG".to_string();
        }

        settings
    }

    pub fn stage(&self) -> Result<Stage, HealthError> {
        self.stage.parse()
    }

    /// Store path: `--db`, or `Health.db` inside the data directory.
    pub fn db_path(&self) -> PathBuf {
        self.db
            .clone()
            .unwrap_or_else(|| self.data_dir.join("Health.db"))
    }

    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            data_dir: self.data_dir.clone(),
            epoch: self.epoch,
            cutoff: self.cutoff,
            active_energy_source: self.active_energy_source.clone(),
            weight_source: self.weight_source.clone(),
            workout_source: self.workout_source.clone(),
        }
    }
}

// ── Conversion ─────────────────────────────────────────────────────────────────

impl From<&Settings> for PersistedParams {
    fn from(s: &Settings) -> Self {
        PersistedParams {
            data_dir: Some(s.data_dir.clone()),
            timezone: Some(s.timezone.clone()),
            active_energy_source: Some(s.active_energy_source.clone()),
            weight_source: Some(s.weight_source.clone()),
            workout_source: Some(s.workout_source.clone()),
        }
    }
}

/// Returns `true` when `name` was supplied explicitly on the command line
/// (not via default value or environment variable).
fn is_arg_explicitly_set(matches: &clap::ArgMatches, name: &str) -> bool {
    matches.value_source(name) == Some(clap::parser::ValueSource::CommandLine)
}

// ── Tests ──────────────────────────────────────────────────────────────────────
