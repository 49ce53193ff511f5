//! Core error types for VQL.

use thiserror::Error;

/// Result type alias using `VqlError`.
pub type VqlResult<T> = std::result::Result<T, VqlError>;

/// Core error type for VQL operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum VqlError {
    /// Invalid value provided (malformed column literal, bad constant).
    #[error("ValueError: {0}")]
    ValueError(String),

    /// The plan tree violates a structural invariant.
    #[error("InvalidPlan: {0}")]
    InvalidPlan(String),

    /// A rule name outside the rule catalog was requested.
    #[error("UnknownRule: {0}")]
    UnknownRule(String),

    /// Invalid parameter provided.
    #[error("InvalidParameter: {0}")]
    InvalidParameter(String),

    /// Internal error (bug in VQL).
    #[error("InternalError: {0}")]
    InternalError(String),

    /// IO error.
    #[error("IoError: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("SerdeJsonError: {0}")]
    SerdeJsonError(#[from] serde_json::Error),
}

impl VqlError {
    /// Create a new `ValueError`.
    pub fn value_error<S: Into<String>>(msg: S) -> Self {
        Self::ValueError(msg.into())
    }

    /// Create a new `InvalidPlan` error.
    pub fn invalid_plan<S: Into<String>>(msg: S) -> Self {
        Self::InvalidPlan(msg.into())
    }

    /// Create a new `UnknownRule` error.
    pub fn unknown_rule<S: Into<String>>(name: S) -> Self {
        Self::UnknownRule(name.into())
    }

    /// Create a new `InvalidParameter` error.
    pub fn invalid_parameter<S: Into<String>>(msg: S) -> Self {
        Self::InvalidParameter(msg.into())
    }

    /// Create a new `InternalError`.
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        Self::InternalError(msg.into())
    }
}

/// Ensure a condition holds, returning an `InvalidPlan` error if not.
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $variant:ident: $($msg:tt)*) => {
        if !$cond {
            return Err($crate::VqlError::$variant(format!($($msg)*)));
        }
    };
    ($cond:expr, $msg:expr) => {
        if !$cond {
            return Err($crate::VqlError::InvalidPlan($msg.to_string()));
        }
    };
}

/// Return early with a `ValueError`.
#[macro_export]
macro_rules! value_err {
    ($($arg:tt)*) => {
        return Err($crate::VqlError::ValueError(format!($($arg)*)))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = VqlError::unknown_rule("PUSH_EVERYTHING");
        assert_eq!(err.to_string(), "UnknownRule: PUSH_EVERYTHING");
    }

    #[test]
    fn test_error_constructors() {
        let _ = VqlError::value_error("column literal without index");
        let _ = VqlError::invalid_plan("child 3 does not point back to 1");
        let _ = VqlError::invalid_parameter("empty rule list");
        let _ = VqlError::internal("unexpected state");
    }

    fn checked(flag: bool) -> VqlResult<()> {
        ensure!(flag, InvalidParameter: "flag was {}", flag);
        Ok(())
    }

    fn parsed(raw: &str) -> VqlResult<i64> {
        match raw.parse::<i64>() {
            Ok(v) => Ok(v),
            Err(_) => value_err!("not an integer: {raw}"),
        }
    }

    #[test]
    fn test_macros() {
        assert!(checked(true).is_ok());
        assert!(matches!(checked(false), Err(VqlError::InvalidParameter(_))));
        assert_eq!(parsed("7").unwrap(), 7);
        assert!(matches!(parsed("x"), Err(VqlError::ValueError(_))));
    }
}
