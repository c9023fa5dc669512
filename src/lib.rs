//! hookscript - runs pre-/post-build hook scripts.
//!
//! Scripts are picked by file extension (Lua by default, Rhai for `.rhai`),
//! run with a set of variables, and must return nothing or `true` for the
//! build to go on. Their output is captured in a build log.

pub mod config;
pub mod error;
pub mod interpreter;
pub mod locator;
pub mod logging;
pub mod runner;
pub mod sink;

pub use config::Config;
pub use error::{EvaluationError, HookError, Result};
pub use interpreter::{
    InterpreterRegistry, LuaInterpreter, RhaiInterpreter, ScriptInterpreter, Variables,
    DEFAULT_INTERPRETER,
};
pub use locator::ScriptLocator;
pub use runner::ScriptRunner;
pub use sink::{ExecutionLogger, FileLogger, MirrorHandler, LINE_SEPARATOR};
