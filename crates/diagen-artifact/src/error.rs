use thiserror::Error;

/// Why a captured artifact was not accepted
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Artifact incomplete: no closed diagram block found")]
    Incomplete,

    #[error("Artifact malformed: {0}")]
    Malformed(String),

    #[error("Artifact missing required marker: {0}")]
    MissingMarker(String),
}
