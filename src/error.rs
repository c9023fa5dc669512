//! Error types for hookscript.

use std::path::PathBuf;

use serde_json::Value;
use thiserror::Error;

use crate::interpreter::text_form;

/// Error raised by a script engine while evaluating a script.
#[derive(Error, Debug)]
pub enum EvaluationError {
    /// Lua syntax or runtime error.
    #[error(transparent)]
    Lua(#[from] mlua::Error),

    /// Rhai parse or runtime error.
    #[error(transparent)]
    Rhai(#[from] Box<rhai::EvalAltResult>),

    /// Script output could not be written.
    #[error("failed to write script output: {0}")]
    Output(#[from] std::io::Error),

    /// Error raised by a custom interpreter.
    #[error("{0}")]
    Other(Box<dyn std::error::Error + Send + Sync>),
}

/// Common error type for hookscript.
#[derive(Error, Debug)]
pub enum HookError {
    /// The script file could not be read or decoded.
    #[error("error reading {description} {}, {source}", .path.display())]
    ScriptRead {
        description: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The interpreter failed while running the script.
    #[error(transparent)]
    Evaluation(#[from] EvaluationError),

    /// The script ran but did not return a passing value.
    #[error("The {description} returned {}.", text_form(.result))]
    ReturnValue { description: String, result: Value },

    /// I/O error while writing to the execution log.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl HookError {
    /// The value returned by the script, for return value failures.
    pub fn result(&self) -> Option<&Value> {
        match self {
            HookError::ReturnValue { result, .. } => Some(result),
            _ => None,
        }
    }
}

/// Result type alias for hookscript operations.
pub type Result<T> = std::result::Result<T, HookError>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_return_value_display_uses_raw_string() {
        let err = HookError::ReturnValue {
            description: "test".to_string(),
            result: json!("Not true value"),
        };
        assert_eq!(err.to_string(), "The test returned Not true value.");
        assert_eq!(err.result(), Some(&json!("Not true value")));
    }

    #[test]
    fn test_return_value_display_boolean() {
        let err = HookError::ReturnValue {
            description: "post-build script".to_string(),
            result: json!(false),
        };
        assert_eq!(err.to_string(), "The post-build script returned false.");
    }

    #[test]
    fn test_script_read_display() {
        let err = HookError::ScriptRead {
            description: "setup script".to_string(),
            path: PathBuf::from("it/setup.lua"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied"),
        };
        assert_eq!(
            err.to_string(),
            "error reading setup script it/setup.lua, access denied"
        );
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_evaluation_error_is_transparent() {
        let err: HookError = EvaluationError::Other("boom".into()).into();
        assert_eq!(err.to_string(), "boom");
        assert!(err.result().is_none());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: HookError = io_err.into();
        assert!(matches!(err, HookError::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }
}
