//! Script interpreters.
//!
//! Each interpreter evaluates the full text of a script with a set of
//! variables and an explicit output stream, and hands back whatever value
//! the script produced.

pub mod lua_engine;
pub mod registry;
pub mod rhai_engine;

use std::io::Write;
use std::path::PathBuf;

use serde_json::{Map, Value};

use crate::error::EvaluationError;

pub use lua_engine::LuaInterpreter;
pub use registry::{InterpreterRegistry, DEFAULT_INTERPRETER};
pub use rhai_engine::RhaiInterpreter;

/// Variables handed to a script, by name.
pub type Variables = Map<String, Value>;

/// A script engine able to evaluate hook scripts.
pub trait ScriptInterpreter {
    /// Short name used in log messages.
    fn name(&self) -> &str;

    /// Evaluate `script`.
    ///
    /// `class_path` lists extra directories the engine searches for modules,
    /// in order. Output printed by the script goes to `output`, or to the
    /// process stdout when `None`. Returns the script's result value, `Null`
    /// when it produced none.
    fn evaluate(
        &self,
        script: &str,
        class_path: &[PathBuf],
        variables: &Variables,
        output: Option<&mut dyn Write>,
    ) -> Result<Value, EvaluationError>;
}

/// Textual form of a script result: strings as-is, everything else as JSON.
pub fn text_form(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Whether a script result lets the build continue.
///
/// No value passes; otherwise the textual form must read `true`
/// (case-insensitive).
pub fn is_passing(value: &Value) -> bool {
    value.is_null() || text_form(value).eq_ignore_ascii_case("true")
}
