use crate::charts::ChartKind;
use crate::spec::Dimension;
use serde::{Deserialize, Serialize};
use tessella_records::TableKind;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, EngineError>;

/// Chart-level failures. None of them is fatal to a session: the affected
/// chart renders an empty state and the other charts are unaffected.
///
/// Row-level exclusions (unparseable months, unmapped aliases or countries)
/// are not errors; they are counted in [`PassStats`](crate::PassStats).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("Missing or unreadable input: {0}")]
    MissingInput(TableKind),

    #[error("Empty input: {0}")]
    EmptyInput(TableKind),

    #[error("No {0} data left after filtering")]
    EmptyFilterResult(ChartKind),

    #[error("Dimension '{dimension}' is not available on {table}")]
    UnsupportedDimension {
        dimension: Dimension,
        table: TableKind,
    },

    #[error("Invalid chart settings: {0}")]
    InvalidSpec(String),
}

/// Serializable classification of an [`EngineError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    MissingInput,
    EmptyInput,
    EmptyFilterResult,
    InvalidSpec,
}

impl EngineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::MissingInput(_) => ErrorKind::MissingInput,
            EngineError::EmptyInput(_) => ErrorKind::EmptyInput,
            EngineError::EmptyFilterResult(_) => ErrorKind::EmptyFilterResult,
            EngineError::UnsupportedDimension { .. } | EngineError::InvalidSpec(_) => {
                ErrorKind::InvalidSpec
            }
        }
    }
}
