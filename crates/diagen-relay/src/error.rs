use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RelayError {
    #[error("Generation failed: {0}")]
    Upstream(String),

    #[error("Generation timed out: no response within {0:?}")]
    ConnectTimeout(Duration),

    #[error("Generation stalled: no output for {0:?}")]
    IdleTimeout(Duration),

    /// The caller went away. Nothing more can be sent.
    #[error("Caller disconnected")]
    Disconnected,
}

impl RelayError {
    /// Whether a terminal `error` event can still reach the caller.
    pub fn is_reportable(&self) -> bool {
        !matches!(self, Self::Disconnected)
    }
}

impl From<anyhow::Error> for RelayError {
    fn from(e: anyhow::Error) -> Self {
        Self::Upstream(e.to_string())
    }
}
