use std::path::PathBuf;

/// Input tables that cannot be used at all. Partial or missing attendance
/// data is never reported through this type.
#[derive(Debug, thiserror::Error)]
pub enum DataError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{table} row {row} is missing required field `{field}`")]
    MissingField {
        table: &'static str,
        field: &'static str,
        row: usize,
    },

    #[error("{table} row {row} has an invalid date: {value:?}")]
    InvalidDate {
        table: &'static str,
        row: usize,
        value: String,
    },
}
