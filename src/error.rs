//! Error type shared by every module.

use thiserror::Error;

use crate::types::ElementId;

/// Everything that can go wrong in pagesync.
///
/// Missing optional elements and anchors pointing nowhere are not errors;
/// the affected feature is skipped instead.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration JSON could not be parsed.
    #[error("failed to parse configuration: {0}")]
    Config(#[from] serde_json::Error),

    /// A configuration value is out of range.
    #[error("invalid configuration: `{field}` {reason}")]
    InvalidConfig { field: &'static str, reason: String },

    /// A selector uses syntax the memory document does not understand.
    #[error("unsupported selector `{0}`")]
    InvalidSelector(String),

    /// Block layout of the memory document failed.
    #[error("layout computation failed: {0}")]
    Layout(String),

    /// A handle that does not belong to the document.
    #[error("unknown element {0:?}")]
    UnknownElement(ElementId),

    /// Failure reported by the host environment.
    #[error("host error: {0}")]
    Host(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
