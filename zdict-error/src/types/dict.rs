use std::any::Any;

use crate::{ErrorExt, StatusCode};

/// Errors raised by the `Dict` hash table.
///
/// `AlreadyExists` and `NotFound` are ordinary, recoverable outcomes a caller
/// is expected to handle. `AllocationFailure` is surfaced only by the `try_*`
/// entry points; the non-`try` paths abort the process instead of returning
/// it. `InvalidOperation` and `FingerprintMismatch` are programming errors —
/// assertion failures that indicate misuse of the API, not data conditions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DictError {
    /// `insert` was called for a key that is already present.
    AlreadyExists,
    /// `find` / `delete` / `unlink` was called for a key that isn't present.
    NotFound,
    /// A `try_*` entry point could not grow or allocate a table.
    AllocationFailure,
    /// An assertion failure: rehashing to the same exponent, rehashing while
    /// not rehashing, reading a value on a no-value dict, and similar misuse.
    InvalidOperation { reason: String },
    /// An unsafe iterator's fingerprint changed between acquire and release,
    /// meaning the dict's structure was mutated mid-iteration.
    FingerprintMismatch,
}

impl std::fmt::Display for DictError {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        match self {
            Self::AlreadyExists => write!(f, "key already exists"),
            Self::NotFound => write!(f, "key not found"),
            Self::AllocationFailure => write!(f, "allocation failure while growing table"),
            Self::InvalidOperation { reason } => write!(f, "invalid dict operation: {reason}"),
            Self::FingerprintMismatch => {
                write!(f, "dict mutated during unsafe iteration (fingerprint mismatch)")
            }
        }
    }
}

impl std::error::Error for DictError {}

impl ErrorExt for DictError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::AlreadyExists => StatusCode::AlreadyExists,
            Self::NotFound => StatusCode::NotFound,
            Self::AllocationFailure => StatusCode::AllocationFailure,
            Self::InvalidOperation { .. } => StatusCode::InvalidOperation,
            Self::FingerprintMismatch => StatusCode::FingerprintMismatch,
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn client_message(&self) -> String {
        match self {
            Self::AlreadyExists => "key already exists".to_string(),
            Self::NotFound => "key not found".to_string(),
            Self::AllocationFailure => "out of memory".to_string(),
            Self::InvalidOperation { .. } | Self::FingerprintMismatch => {
                "internal error".to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_already_exists() {
        let err = DictError::AlreadyExists;
        assert_eq!(err.status_code(), StatusCode::AlreadyExists);
        assert_eq!(err.client_message(), "key already exists");
    }

    #[test]
    fn test_invalid_operation_reason_in_display() {
        let err = DictError::InvalidOperation {
            reason: "rehashIdx == -1".to_string(),
        };
        assert!(err.to_string().contains("rehashIdx == -1"));
        assert_eq!(err.status_code(), StatusCode::InvalidOperation);
    }

    #[test]
    fn test_fingerprint_mismatch_is_critical() {
        let err = DictError::FingerprintMismatch;
        assert!(err.status_code().is_critical());
    }
}
