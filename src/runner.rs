//! Runs pre-/post-build hook scripts.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use encoding_rs::{Encoding, UTF_8};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::{EvaluationError, HookError, Result};
use crate::interpreter::{is_passing, InterpreterRegistry, ScriptInterpreter, Variables};
use crate::locator::ScriptLocator;
use crate::sink::{ExecutionLogger, LINE_SEPARATOR};

/// Runs hook scripts through the interpreter registered for their extension
/// and checks their result.
///
/// A runner is meant to be driven from one thread; each call runs one script
/// to completion.
pub struct ScriptRunner {
    registry: InterpreterRegistry,
    global_variables: Variables,
    class_path: Vec<PathBuf>,
    encoding: Option<String>,
}

impl ScriptRunner {
    /// Create a runner with the Lua and Rhai interpreters.
    pub fn new() -> Self {
        Self::with_registry(InterpreterRegistry::new())
    }

    /// Create a runner using the interpreters of `registry`.
    pub fn with_registry(registry: InterpreterRegistry) -> Self {
        Self {
            registry,
            global_variables: Variables::new(),
            class_path: Vec::new(),
            encoding: None,
        }
    }

    /// Register an interpreter for scripts with the extension `id`.
    pub fn add_script_interpreter<I>(&mut self, id: &str, interpreter: I)
    where
        I: ScriptInterpreter + 'static,
    {
        self.registry.register(id, interpreter);
    }

    /// Set a variable passed to every script.
    ///
    /// `basedir` and `context` are always overridden by the runner.
    pub fn set_global_variable(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.global_variables.insert(name.into(), value.into());
    }

    /// Set the extra module search path handed to the interpreters. The
    /// entries are copied.
    pub fn set_class_path<I, P>(&mut self, class_path: I)
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.class_path = class_path.into_iter().map(Into::into).collect();
    }

    /// Set the encoding of script files. `None` or an empty label means the
    /// platform default (UTF-8).
    pub fn set_script_encoding(&mut self, encoding: Option<&str>) {
        self.encoding = encoding.filter(|e| !e.is_empty()).map(str::to_string);
    }

    /// The interpreter registry.
    pub fn registry(&self) -> &InterpreterRegistry {
        &self.registry
    }

    /// Run the hook script `relative_script_path` found under `basedir`.
    ///
    /// The name may omit the extension; every registered extension is then
    /// tried. A `None` name, or a script that cannot be found, is skipped
    /// without error.
    pub fn run(
        &self,
        description: &str,
        basedir: &Path,
        relative_script_path: Option<&str>,
        context: Option<&Variables>,
        logger: Option<&mut dyn ExecutionLogger>,
    ) -> Result<()> {
        let locator = ScriptLocator::new(&self.registry);

        let Some(script_file) = locator.resolve_by_name(basedir, relative_script_path) else {
            debug!("{}: relative script path is not set, not executing script", description);
            return Ok(());
        };

        if !script_file.exists() {
            debug!(
                "{} : no script '{}' found in directory {}",
                description,
                relative_script_path.unwrap_or_default(),
                basedir.display()
            );
            return Ok(());
        }

        info!(
            "run {} {}.{}",
            description,
            relative_script_path.unwrap_or_default(),
            script_file
                .extension()
                .map(|ext| ext.to_string_lossy())
                .unwrap_or_default()
        );

        self.execute_run(description, &script_file, context, logger)
    }

    /// Run the hook script at `script_file`. A missing file is skipped
    /// without error.
    pub fn run_file(
        &self,
        description: &str,
        script_file: &Path,
        context: Option<&Variables>,
        logger: Option<&mut dyn ExecutionLogger>,
    ) -> Result<()> {
        let script_file = ScriptLocator::new(&self.registry).resolve_by_path(script_file);

        if !script_file.exists() {
            debug!(
                "{} : script file not found in directory {}",
                description,
                script_file.display()
            );
            return Ok(());
        }

        info!("run {} {}", description, script_file.display());

        self.execute_run(description, &script_file, context, logger)
    }

    fn execute_run(
        &self,
        description: &str,
        script_file: &Path,
        context: Option<&Variables>,
        mut logger: Option<&mut dyn ExecutionLogger>,
    ) -> Result<()> {
        let interpreter = self.registry.resolve(script_file);
        debug!("Running script with {} :{}", interpreter.name(), script_file.display());

        let script = self
            .read_script(script_file)
            .map_err(|source| HookError::ScriptRead {
                description: description.to_string(),
                path: script_file.to_path_buf(),
                source,
            })?;

        if let Some(logger) = logger.as_deref_mut() {
            logger.consume_line(&format!("Running {}: {}", description, script_file.display()))?;
        }

        let variables = self.script_variables(script_file, context);
        let output = logger.as_deref_mut().map(|logger| logger.print_stream());

        let result = match interpreter.evaluate(&script, &self.class_path, &variables, output) {
            Ok(result) => result,
            Err(e) => {
                if let Some(logger) = logger.as_deref_mut() {
                    if let Err(write_err) = write_trace(logger.print_stream(), &e) {
                        warn!("cannot write {} diagnostics: {}", description, write_err);
                    }
                }
                return Err(e.into());
            }
        };

        if let Some(logger) = logger.as_deref_mut() {
            logger.consume_line(&format!("Finished {}: {}", description, script_file.display()))?;
        }

        if !is_passing(&result) {
            return Err(HookError::ReturnValue {
                description: description.to_string(),
                result,
            });
        }

        Ok(())
    }

    /// Read and decode the script text.
    fn read_script(&self, script_file: &Path) -> io::Result<String> {
        let bytes = fs::read(script_file)?;

        let text = match self.encoding.as_deref() {
            // A configured encoding is used as given, without BOM sniffing.
            Some(label) => {
                let encoding = Encoding::for_label(label.as_bytes()).ok_or_else(|| {
                    io::Error::new(
                        io::ErrorKind::InvalidInput,
                        format!("unsupported encoding: {label}"),
                    )
                })?;
                encoding.decode_without_bom_handling(&bytes).0
            }
            None => UTF_8.decode(&bytes).0,
        };

        Ok(text.into_owned())
    }

    /// Global variables plus `basedir` and `context`, which always win.
    fn script_variables(&self, script_file: &Path, context: Option<&Variables>) -> Variables {
        let mut variables = self.global_variables.clone();

        let basedir = script_file
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .map(|dir| Value::String(dir.display().to_string()))
            .unwrap_or(Value::Null);
        variables.insert("basedir".to_string(), basedir);

        let context = context.cloned().map(Value::Object).unwrap_or(Value::Null);
        variables.insert("context".to_string(), context);

        variables
    }
}

impl Default for ScriptRunner {
    fn default() -> Self {
        Self::new()
    }
}

/// Write `error` and its source chain to `out`.
fn write_trace(out: &mut dyn Write, error: &EvaluationError) -> io::Result<()> {
    write!(out, "{}{}", error, LINE_SEPARATOR)?;

    let mut source = std::error::Error::source(error);
    while let Some(cause) = source {
        write!(out, "Caused by: {}{}", cause, LINE_SEPARATOR)?;
        source = cause.source();
    }

    out.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn test_script_variables_fixed_keys_win() {
        let mut runner = ScriptRunner::new();
        runner.set_global_variable("globalVar", "value");
        runner.set_global_variable("basedir", "bogus");
        runner.set_global_variable("context", "bogus");

        let mut context = Variables::new();
        context.insert("foo".to_string(), json!("bar"));

        let variables = runner.script_variables(Path::new("it/verify.lua"), Some(&context));
        assert_eq!(variables["globalVar"], json!("value"));
        assert_eq!(variables["basedir"], json!("it"));
        assert_eq!(variables["context"], json!({"foo": "bar"}));

        // The runner's own globals are untouched.
        assert_eq!(runner.global_variables["basedir"], json!("bogus"));
    }

    #[test]
    fn test_script_variables_without_context() {
        let runner = ScriptRunner::new();
        let variables = runner.script_variables(Path::new("verify.lua"), None);
        assert_eq!(variables["context"], Value::Null);
        assert_eq!(variables["basedir"], Value::Null);
    }

    #[test]
    fn test_set_script_encoding_empty_means_default() {
        let mut runner = ScriptRunner::new();
        runner.set_script_encoding(Some(""));
        assert!(runner.encoding.is_none());
        runner.set_script_encoding(Some("ISO-8859-1"));
        assert_eq!(runner.encoding.as_deref(), Some("ISO-8859-1"));
        runner.set_script_encoding(None);
        assert!(runner.encoding.is_none());
    }

    #[test]
    fn test_read_script_with_encoding() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("verify.lua");
        // "café" in ISO-8859-1
        fs::write(&path, [b'c', b'a', b'f', 0xE9]).unwrap();

        let mut runner = ScriptRunner::new();
        runner.set_script_encoding(Some("ISO-8859-1"));
        assert_eq!(runner.read_script(&path).unwrap(), "café");
    }

    #[test]
    fn test_read_script_configured_encoding_ignores_bom() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("verify.lua");
        fs::write(&path, [0xEF, 0xBB, 0xBF, b'x']).unwrap();

        let mut runner = ScriptRunner::new();
        assert_eq!(runner.read_script(&path).unwrap(), "x");

        runner.set_script_encoding(Some("ISO-8859-1"));
        assert_eq!(runner.read_script(&path).unwrap(), "\u{EF}\u{BB}\u{BF}x");
    }

    #[test]
    fn test_read_script_unknown_encoding() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("verify.lua");
        fs::write(&path, "return true").unwrap();

        let mut runner = ScriptRunner::new();
        runner.set_script_encoding(Some("no-such-charset"));
        let err = runner.read_script(&path).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }

    #[test]
    fn test_set_class_path_copies() {
        let mut runner = ScriptRunner::new();
        let dirs = vec!["lib", "scripts/lib"];
        runner.set_class_path(dirs.clone());
        assert_eq!(
            runner.class_path,
            vec![PathBuf::from("lib"), PathBuf::from("scripts/lib")]
        );
    }
}
