//! Request-scoped error taxonomy.
//!
//! Every error terminates only the request that raised it; the pipeline
//! shares no mutable state across requests, so nothing is left to corrupt.

use letsrevoke_dictionary as dictionary;
use thiserror::Error as ThisError;

/// Errors raised while producing or verifying a signed revocation
/// dictionary.
#[derive(ThisError, Debug)]
pub enum Error {
    /// Malformed or out-of-range input. A client error, never retried.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
    /// Requested population exceeds the configured memory bound.
    #[error("population of {requested} exceeds limit of {limit}")]
    ResourceExceeded { requested: u64, limit: u64 },
    /// Internal invariant violation while encoding the dictionary.
    #[error("encoding failure: {0}")]
    EncodingFailure(#[source] dictionary::Error),
    /// The signing backend failed.
    #[error("signing failure: {0}")]
    SigningFailure(String),
    /// Build and sign did not finish within the configured deadline.
    #[error("build deadline exceeded")]
    Timeout,
    /// The artifact is tampered, truncated, or signed by another key.
    #[error("verification failed")]
    VerificationFailed,
    #[error("internal: {0}")]
    Internal(String),
}

impl Error {
    /// Returns a stable machine-readable code for responses and metrics.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidParameter(_) => "invalid_parameter",
            Self::ResourceExceeded { .. } => "resource_exceeded",
            Self::EncodingFailure(_) => "encoding_failure",
            Self::SigningFailure(_) => "signing_failure",
            Self::Timeout => "timeout",
            Self::VerificationFailed => "verification_failed",
            Self::Internal(_) => "internal",
        }
    }

    /// Returns true if the error is the client's fault.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::InvalidParameter(_) | Self::ResourceExceeded { .. }
        )
    }
}

impl From<dictionary::Error> for Error {
    fn from(err: dictionary::Error) -> Self {
        match err {
            dictionary::Error::PopulationTooLarge { requested, limit } => {
                Self::ResourceExceeded { requested, limit }
            }
            dictionary::Error::InvalidPercent(percent) => Self::InvalidParameter(format!(
                "PercentRevoked must be in [0, 100], got {percent}"
            )),
            other => Self::EncodingFailure(other),
        }
    }
}
