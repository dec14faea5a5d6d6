//! Framework error taxonomy
//!
//! All DAO, registry, and command-dispatch failures flow through [`Error`].
//! The [`ErrorKind`] classification drives uniform user-facing messaging;
//! `is_expected` governs warn-vs-error log levels.

use thiserror::Error;

/// Framework-level error type
#[derive(Debug, Error)]
pub enum Error {
    /// Resource absent. List calls translate this to an empty result,
    /// Get calls surface it, Delete calls treat it as already satisfied.
    #[error("{what} not found")]
    NotFound { what: String },

    /// The backing API refused a mutation because of live dependents.
    #[error("{0} is in use and cannot be deleted")]
    ResourceInUse(String),

    #[error("access denied: {0}")]
    Unauthorized(String),

    #[error("rate limited: {0}")]
    Throttled(String),

    /// Operation not implemented for this resource type.
    #[error("{0} is not supported for this resource type")]
    Unsupported(String),

    /// Shell metacharacter detected during command expansion.
    #[error("unsafe value for ${{{var}}}: contains shell metacharacters")]
    UnsafeValue { var: String },

    /// Sentinel for actions blocked by the global read-only flag.
    #[error("blocked by read-only mode")]
    ReadOnlyDenied,

    /// A malformed or unregistered action definition.
    #[error("misconfigured action: {0}")]
    Misconfigured(String),

    /// Underlying API call failed without a more specific classification.
    #[error("{operation} failed: {message}")]
    Api { operation: String, message: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Coarse classification used for user-facing hints
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    ResourceInUse,
    Auth,
    Throttling,
    Unsupported,
    UnsafeInput,
    ReadOnly,
    Misconfigured,
    Other,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::ResourceInUse(_) => ErrorKind::ResourceInUse,
            Self::Unauthorized(_) => ErrorKind::Auth,
            Self::Throttled(_) => ErrorKind::Throttling,
            Self::Unsupported(_) => ErrorKind::Unsupported,
            Self::UnsafeValue { .. } => ErrorKind::UnsafeInput,
            Self::ReadOnlyDenied => ErrorKind::ReadOnly,
            Self::Misconfigured(_) => ErrorKind::Misconfigured,
            Self::Api { .. } | Self::Other(_) => ErrorKind::Other,
        }
    }

    /// Whether the error is expected behavior (user input, absent
    /// resource). `true` should log at warn, `false` at error.
    pub fn is_expected(&self) -> bool {
        matches!(
            self,
            Self::NotFound { .. }
                | Self::Unsupported(_)
                | Self::ReadOnlyDenied
                | Self::UnsafeValue { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_map_one_to_one() {
        assert_eq!(
            Error::NotFound {
                what: "queue q1".into()
            }
            .kind(),
            ErrorKind::NotFound
        );
        assert_eq!(Error::ReadOnlyDenied.kind(), ErrorKind::ReadOnly);
        assert_eq!(
            Error::UnsafeValue { var: "ID".into() }.kind(),
            ErrorKind::UnsafeInput
        );
        assert_eq!(
            Error::Api {
                operation: "DescribeInstances".into(),
                message: "boom".into()
            }
            .kind(),
            ErrorKind::Other
        );
    }

    #[test]
    fn expectedness_split() {
        assert!(Error::ReadOnlyDenied.is_expected());
        assert!(Error::Unsupported("delete".into()).is_expected());
        assert!(!Error::Throttled("slow down".into()).is_expected());
        assert!(!Error::Misconfigured("empty operation".into()).is_expected());
    }
}
