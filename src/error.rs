//! Error taxonomy shared across the crate

use thiserror::Error;

/// Failures surfaced by dataset loading, network construction, selection
/// and cluster-quality analysis. None of these are retried; parsing and
/// integrity errors carry the offending content.
#[derive(Debug, Error)]
pub enum FcnError {
    /// Malformed line in a network, partition, selection or dataset file.
    #[error("parse error in {file}: {reason} |{line}|")]
    Parse {
        file: String,
        line: String,
        reason: String,
    },

    /// Undefined label binarization or invalid threshold.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Partition/graph vertex mismatch or inconsistent identifiers.
    #[error("data integrity error: {0}")]
    DataIntegrity(String),

    /// External community-detection process failed, timed out, or produced
    /// a malformed first output line.
    #[error("collaborator failure: {0}")]
    Collaborator(String),

    /// Operation invoked on a structure in the wrong lifecycle state.
    #[error("illegal state: {0}")]
    IllegalState(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl FcnError {
    pub(crate) fn parse(file: &str, line: &str, reason: &str) -> Self {
        FcnError::Parse {
            file: file.to_string(),
            line: line.to_string(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, FcnError>;
