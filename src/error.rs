//! Error types for session setup
//!
//! Ticking never fails. Only loading levels and parsing configuration can.

use thiserror::Error;

/// Errors raised while configuring a session or loading a level
#[derive(Debug, Error)]
pub enum SimError {
    #[error("level index {index} out of range ({count} levels loaded)")]
    LevelOutOfRange { index: usize, count: usize },

    #[error("session needs at least one level")]
    NoLevels,

    #[error("invalid configuration: {field} {reason}")]
    InvalidConfig {
        field: &'static str,
        reason: &'static str,
    },

    #[error("level {level:?} is invalid: {reason}")]
    InvalidLevel { level: String, reason: &'static str },

    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = SimError::LevelOutOfRange { index: 7, count: 4 };
        assert_eq!(err.to_string(), "level index 7 out of range (4 levels loaded)");

        let err = SimError::InvalidConfig {
            field: "vision.range",
            reason: "must not be negative",
        };
        assert_eq!(
            err.to_string(),
            "invalid configuration: vision.range must not be negative"
        );
    }

    #[test]
    fn test_json_error_converts() {
        let parse: Result<serde_json::Value, _> = serde_json::from_str("{ nope");
        let err: SimError = parse.unwrap_err().into();
        assert!(matches!(err, SimError::Json(_)));
    }
}
