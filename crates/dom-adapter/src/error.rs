use stylescope_core_types::{NodeId, ProbeError};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DocumentError {
    #[error("invalid selector: {0}")]
    InvalidSelector(String),
    #[error("unknown node {0}")]
    UnknownNode(NodeId),
    #[error("{0} is detached")]
    Detached(NodeId),
    #[error("invalid rule text: {0}")]
    InvalidRule(String),
    #[error("no injected rule with handle {0}")]
    UnknownRule(u64),
}

impl From<DocumentError> for ProbeError {
    fn from(err: DocumentError) -> Self {
        match err {
            DocumentError::Detached(node) => ProbeError::DetachedNode(node),
            DocumentError::InvalidRule(text) => ProbeError::InvalidRule(text),
            other => ProbeError::new(other.to_string()),
        }
    }
}
