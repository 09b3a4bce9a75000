use std::path::PathBuf;

use thiserror::Error;

use crate::signer::SignerError;

/// Result type alias for meshca operations
pub type Result<T> = std::result::Result<T, MeshError>;

/// Errors that can occur while managing the CA, certificates and topology
#[derive(Error, Debug)]
pub enum MeshError {
    /// Issuance attempted before a CA was created
    #[error("CA not established: create a CA before signing certificates")]
    CaNotEstablished,

    /// The external signer could not start, failed, or timed out
    #[error("signer failed: {0}")]
    Signer(#[from] SignerError),

    /// A signer artifact or the state document could not be read or written
    #[error("failed to {action} {}: {source}", path.display())]
    Io {
        /// What was being attempted (e.g. "read", "write")
        action: &'static str,
        /// File or directory involved
        path: PathBuf,
        /// Underlying cause
        #[source]
        source: std::io::Error,
    },

    /// The state document could not be encoded or decoded
    #[error("state document error: {0}")]
    Json(#[from] serde_json::Error),

    /// Settings file could not be parsed
    #[error("settings error: {0}")]
    Settings(String),

    /// Malformed request or topology
    #[error("validation failed: {0}")]
    Validation(String),
}

/// Coarse failure classes surfaced to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// No CA exists yet
    CaNotEstablished,
    /// External signer failed to start or exited with an error
    SignerFailure,
    /// Expected artifact missing/unreadable, or persistence failed
    IoFailure,
    /// Malformed input
    ValidationFailure,
}

impl MeshError {
    pub(crate) fn io(
        action: &'static str,
        path: impl Into<PathBuf>,
        source: std::io::Error,
    ) -> Self {
        Self::Io {
            action,
            path: path.into(),
            source,
        }
    }

    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Returns the failure class of this error
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::CaNotEstablished => ErrorKind::CaNotEstablished,
            Self::Signer(_) => ErrorKind::SignerFailure,
            Self::Io { .. } | Self::Json(_) => ErrorKind::IoFailure,
            Self::Settings(_) | Self::Validation(_) => ErrorKind::ValidationFailure,
        }
    }

    /// Returns true if the error means no CA exists yet
    #[must_use]
    pub const fn is_ca_missing(&self) -> bool {
        matches!(self, Self::CaNotEstablished)
    }
}
