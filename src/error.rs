use thiserror::Error;

/// Failures raised while turning a raw feed table into typed game-log records.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IngestError {
    #[error("game log feed is missing required column `{column}`")]
    MissingColumn { column: String },

    #[error("row {row}: column `{column}` has unparseable value {value:?}")]
    InvalidValue {
        row: usize,
        column: String,
        value: String,
    },

    #[error("row {row}: expected {expected} cells, found {found}")]
    ShortRow {
        row: usize,
        expected: usize,
        found: usize,
    },
}
