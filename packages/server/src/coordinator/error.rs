use std::fmt;
use std::time::Duration;

use common::storage::StorageError;

use crate::metadata::MetadataError;

/// A user-level operation driven by the coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Upload,
    List,
    Download,
    Delete,
    Rename,
    Reconcile,
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Upload => "upload",
            Self::List => "list",
            Self::Download => "download",
            Self::Delete => "delete",
            Self::Rename => "rename",
            Self::Reconcile => "reconcile",
        };
        f.write_str(name)
    }
}

/// Which store a step talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Blob,
    Metadata,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Blob => f.write_str("blob"),
            Self::Metadata => f.write_str("metadata"),
        }
    }
}

/// Why an intent stopped.
#[derive(Debug, thiserror::Error)]
pub enum PhaseFailure {
    #[error("invalid request: {0}")]
    Validation(String),
    #[error("blob store: {0}")]
    Store(#[from] StorageError),
    #[error("metadata store: {0}")]
    Metadata(#[from] MetadataError),
    #[error("{phase} phase timed out after {limit:?}")]
    Timeout { phase: Phase, limit: Duration },
}

impl PhaseFailure {
    /// The store the failure came from, if any.
    pub fn phase(&self) -> Option<Phase> {
        match self {
            Self::Validation(_) => None,
            Self::Store(_) => Some(Phase::Blob),
            Self::Metadata(_) => Some(Phase::Metadata),
            Self::Timeout { phase, .. } => Some(*phase),
        }
    }

    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Store(e) => e.is_not_found(),
            Self::Metadata(e) => e.is_not_found(),
            _ => false,
        }
    }
}

/// An intent that did not complete.
///
/// Earlier phases may already have taken effect; see the intent's docs on
/// [`super::Coordinator`] for which states are reachable.
#[derive(Debug, thiserror::Error)]
#[error("{intent} failed: {failure}")]
pub struct IntentError {
    pub intent: Intent,
    #[source]
    pub failure: PhaseFailure,
}

impl IntentError {
    pub fn new(intent: Intent, failure: impl Into<PhaseFailure>) -> Self {
        Self {
            intent,
            failure: failure.into(),
        }
    }

    pub fn validation(intent: Intent, msg: impl Into<String>) -> Self {
        Self::new(intent, PhaseFailure::Validation(msg.into()))
    }

    pub fn is_not_found(&self) -> bool {
        self.failure.is_not_found()
    }
}
