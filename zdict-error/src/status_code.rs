use std::fmt;

use num_enum::TryFromPrimitive;
#[cfg(feature = "serde_repr")]
use serde_repr::{Deserialize_repr, Serialize_repr};
#[cfg(feature = "strum")]
use strum_macros::{AsRefStr, EnumIter};

/// Status codes used to categorize errors across the crate.
///
/// # Ranges:
/// - 0xxx: Success
/// - 1xxx: General errors
/// - 2xxx: Data errors
/// - 5xxx: Storage
///
/// # Notes:
/// - `num_enum::TryFromPrimitive` gives a native `TryFrom<u32>` impl (useful
///   for a wire protocol).
/// - optional: `strum` for `AsRefStr`/`EnumIter` (feature = "strum").
/// - optional: `serde_repr` for numeric serialization (feature =
///   "serde_repr").
#[cfg_attr(feature = "strum", derive(AsRefStr, EnumIter))]
#[cfg_attr(feature = "serde_repr", derive(Serialize_repr, Deserialize_repr))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive)]
#[repr(u32)]
#[non_exhaustive]
pub enum StatusCode {
    // === 0xxx: Success ===
    Success = 0,

    // === 1xxx: General errors ===
    Unknown = 1000,
    Unsupported = 1001,
    Unexpected = 1002,
    Internal = 1003,
    InvalidArgs = 1004,
    NotImplemented = 1005,
    AllocationFailure = 1006,

    // === 2xxx: Data errors ===
    NotFound = 2000,
    AlreadyExists = 2001,
    TypeError = 2002,
    InvalidKey = 2003,
    InvalidValue = 2004,
    IndexOutOfBounds = 2006,
    WrongType = 2007,
    InvalidOperation = 2008,
    InvalidData = 2009,
    FingerprintMismatch = 2010,

    // === 5xxx: Storage ===
    StorageUnavailable = 5000,
    CorruptedData = 5002,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

////////////////////////////////////////////////////////////////////////////////
// Собственные методы
////////////////////////////////////////////////////////////////////////////////

impl StatusCode {
    /// Numeric representation of the status code.
    pub const fn code(self) -> u32 {
        self as u32
    }

    /// Attempts to recover a `StatusCode` from a `u32`.
    ///
    /// Uses `TryFrom<u32>` from `num_enum`; returns `None` if the value
    /// doesn't match any variant.
    pub fn from_u32(v: u32) -> Option<Self> {
        Self::try_from(v).ok()
    }

    /// `true` if a caller may reasonably retry the failed operation.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::StorageUnavailable)
    }

    /// `true` if `code` denotes a successful result.
    pub fn is_success(code: u32) -> bool {
        Self::Success as u32 == code
    }

    /// Whether the code is a client-side error — a problem in the request or
    /// the data.
    ///
    /// Most client errors live in the `2xxx..4xxx` range. `InvalidArgs`
    /// (1004) is semantically a client error and is listed explicitly.
    pub fn is_client_error(&self) -> bool {
        let c = self.code();
        if (2000..=4999).contains(&c) {
            return true;
        }
        matches!(self, Self::InvalidArgs)
    }

    /// Whether the code is a server-side error — internal or infrastructure
    /// related.
    ///
    /// Usually the `1xxx` and `5xxx..7xxx` ranges.
    pub fn is_server_error(&self) -> bool {
        let c = self.code();
        matches!(c, 1000..=1999 | 5000..=7999)
    }

    /// Whether this should be logged as a critical failure.
    pub fn is_critical(&self) -> bool {
        matches!(
            self,
            Self::Internal | Self::CorruptedData | Self::StorageUnavailable
        )
    }

    /// Recommended logging level for this code.
    pub fn log_level(&self) -> LogLevel {
        match self {
            Self::Success => LogLevel::Trace,
            Self::NotFound | Self::AlreadyExists => LogLevel::Debug,
            Self::InvalidArgs | Self::TypeError | Self::InvalidKey | Self::InvalidValue
            | Self::InvalidData => LogLevel::Info,
            Self::StorageUnavailable => LogLevel::Warn,
            Self::Internal
            | Self::CorruptedData
            | Self::InvalidOperation
            | Self::FingerprintMismatch
            | Self::AllocationFailure => LogLevel::Error,
            _ => LogLevel::Warn,
        }
    }

    /// HTTP status matching this code, useful when the crate is embedded
    /// behind an HTTP-facing admin surface.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::Success => 200,
            Self::NotFound => 404,
            Self::AlreadyExists => 409,
            Self::InvalidArgs
            | Self::TypeError
            | Self::InvalidKey
            | Self::InvalidValue
            | Self::InvalidData => 400,
            Self::NotImplemented | Self::Unsupported => 501,
            Self::StorageUnavailable => 503,
            _ => 500,
        }
    }
}

////////////////////////////////////////////////////////////////////////////////
// Общие реализации трейтов для StatusCode
////////////////////////////////////////////////////////////////////////////////

impl From<StatusCode> for u32 {
    fn from(c: StatusCode) -> Self {
        c.code()
    }
}

impl fmt::Display for StatusCode {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        #[cfg(feature = "strum")]
        {
            write!(f, "{} ({})", self.as_ref(), self.code())
        }
        #[cfg(not(feature = "strum"))]
        {
            write!(f, "{:?} ({})", self, self.code())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_u32_roundtrip() {
        assert_eq!(StatusCode::from_u32(2000), Some(StatusCode::NotFound));
        assert_eq!(StatusCode::from_u32(999_999), None);
    }

    #[test]
    fn test_is_success() {
        assert!(StatusCode::is_success(StatusCode::Success.code()));
        assert!(!StatusCode::is_success(StatusCode::NotFound.code()));
    }

    #[test]
    fn test_is_critical() {
        assert!(StatusCode::Internal.is_critical());
        assert!(StatusCode::FingerprintMismatch.is_critical());
        assert!(!StatusCode::NotFound.is_critical());
    }

    #[test]
    fn test_log_level_mappings() {
        assert_eq!(StatusCode::Success.log_level(), LogLevel::Trace);
        assert_eq!(StatusCode::NotFound.log_level(), LogLevel::Debug);
        assert_eq!(StatusCode::Internal.log_level(), LogLevel::Error);
    }

    #[test]
    fn test_display_contains_name_and_code() {
        let s = format!("{}", StatusCode::NotFound);
        assert!(s.contains("2000"));
        assert!(s.contains("NotFound"));
    }

    #[test]
    fn test_http_default_fallback() {
        assert_eq!(StatusCode::Unexpected.http_status(), 500);
    }
}
