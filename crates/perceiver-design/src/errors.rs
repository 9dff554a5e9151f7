use stylescope_core_types::ProbeError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PerceiverError {
    #[error("node not found: {0}")]
    NotFound(String),
    #[error("style source unreadable: {0}")]
    SourceUnreadable(String),
    #[error("{state} capture failed: {reason}")]
    StateCapture { state: String, reason: String },
    #[error("document has no root element")]
    RootMissing,
    #[error(transparent)]
    Port(#[from] ProbeError),
    #[error("internal error: {0}")]
    Internal(String),
}

impl PerceiverError {
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    /// Stable machine tag, used as the prefix of facade `reason` strings.
    pub fn kind(&self) -> &'static str {
        match self {
            PerceiverError::NotFound(_) => "not_found",
            PerceiverError::SourceUnreadable(_) => "source_unreadable",
            PerceiverError::StateCapture { .. } => "state_capture",
            PerceiverError::RootMissing => "root_missing",
            PerceiverError::Port(ProbeError::DetachedNode(_)) => "not_found",
            PerceiverError::Port(_) => "port",
            PerceiverError::Internal(_) => "internal",
        }
    }
}
