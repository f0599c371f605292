use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the health pipeline.
#[derive(Error, Debug)]
pub enum HealthError {
    /// A file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An export file the pipeline depends on is absent.
    #[error("Missing input file: {0}")]
    MissingInput(PathBuf),

    /// A table expected in the store does not exist.
    #[error("Table not found in store: {0}")]
    MissingTable(String),

    /// A raw table lacks a column its typed schema requires.
    #[error("Table {table} has no column {column}")]
    MissingColumn { table: String, column: String },

    /// A cell could not be converted into the type its column requires.
    #[error("Invalid value {value:?} in {table}.{column}")]
    InvalidValue {
        table: String,
        column: String,
        value: String,
    },

    /// A timestamp string did not match any recognised format.
    #[error("Invalid timestamp format: {0}")]
    TimestampParse(String),

    /// A CSV export could not be parsed.
    #[error("Failed to parse CSV {path}: {message}")]
    CsvParse { path: PathBuf, message: String },

    /// The relational store rejected an operation.
    #[error("Database error: {0}")]
    Database(String),

    /// A table reached a step that needs at least one observation.
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    /// Writing failed after the store had already been dropped; the store may
    /// hold none, or only some, of the cleaned tables.
    #[error("Store left incomplete while writing {table}: {message}")]
    StoreCorrupted { table: String, message: String },

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A JSON document could not be parsed or written.
    #[error("Failed to process JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Catch-all for errors from third-party crates via `anyhow`.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Convenience alias used throughout the pipeline crates.
pub type Result<T> = std::result::Result<T, HealthError>;

impl HealthError {
    /// `true` for failures that leave the store in a state the user must
    /// repair by re-running the pipeline.
    pub fn is_critical(&self) -> bool {
        matches!(self, Self::StoreCorrupted { .. })
    }

    pub fn missing_column(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self::MissingColumn {
            table: table.into(),
            column: column.into(),
        }
    }

    pub fn invalid_value(
        table: impl Into<String>,
        column: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self::InvalidValue {
            table: table.into(),
            column: column.into(),
            value: value.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_file_read() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        let err = HealthError::FileRead {
            path: PathBuf::from("/data/BodyMass.csv"),
            source: io_err,
        };
        let msg = err.to_string();
        assert!(msg.contains("Failed to read file"));
        assert!(msg.contains("/data/BodyMass.csv"));
        assert!(msg.contains("no such file"));
    }

    #[test]
    fn test_error_display_missing_input() {
        let err = HealthError::MissingInput(PathBuf::from("/data/Exports/activity-export.csv"));
        assert_eq!(
            err.to_string(),
            "Missing input file: /data/Exports/activity-export.csv"
        );
    }

    #[test]
    fn test_error_display_missing_table() {
        let err = HealthError::MissingTable("RestEnergy".to_string());
        assert_eq!(err.to_string(), "Table not found in store: RestEnergy");
    }

    #[test]
    fn test_error_display_missing_column() {
        let err = HealthError::missing_column("Steps", "date");
        assert_eq!(err.to_string(), "Table Steps has no column date");
    }

    #[test]
    fn test_error_display_invalid_value() {
        let err = HealthError::invalid_value("Bodyweight", "value", "heavy");
        assert_eq!(err.to_string(), "Invalid value \"heavy\" in Bodyweight.value");
    }

    #[test]
    fn test_error_display_timestamp_parse() {
        let err = HealthError::TimestampParse("yesterday".to_string());
        assert_eq!(err.to_string(), "Invalid timestamp format: yesterday");
    }

    #[test]
    fn test_error_display_insufficient_data() {
        let err = HealthError::InsufficientData("HeartRate is empty".to_string());
        assert_eq!(err.to_string(), "Insufficient data: HeartRate is empty");
    }

    #[test]
    fn test_only_store_corruption_is_critical() {
        let critical = HealthError::StoreCorrupted {
            table: "Activity".to_string(),
            message: "disk full".to_string(),
        };
        assert!(critical.is_critical());
        assert!(critical.to_string().contains("Activity"));

        assert!(!HealthError::Database("locked".to_string()).is_critical());
        assert!(!HealthError::InsufficientData("x".to_string()).is_critical());
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: HealthError = io_err.into();
        assert!(err.to_string().contains("denied"));
    }

    #[test]
    fn test_error_from_serde_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("{invalid}").unwrap_err();
        let err: HealthError = json_err.into();
        assert!(err.to_string().contains("Failed to process JSON"));
    }
}
