//! Extension-keyed interpreter registry.

use std::path::Path;

use super::{LuaInterpreter, RhaiInterpreter, ScriptInterpreter};

/// Key of the interpreter used for unrecognized extensions.
pub const DEFAULT_INTERPRETER: &str = "lua";

/// Interpreters indexed by lower-case file extension, in registration order.
///
/// The fallback entry is registered first and can only be replaced, never
/// removed, so it always sits at index 0.
pub struct InterpreterRegistry {
    entries: Vec<(String, Box<dyn ScriptInterpreter>)>,
}

impl InterpreterRegistry {
    /// Create a registry with the Lua (fallback) and Rhai interpreters.
    pub fn new() -> Self {
        let mut registry = Self::with_fallback(LuaInterpreter::new());
        registry.register("rhai", RhaiInterpreter::new());
        registry
    }

    /// Create a registry holding only `fallback`, under [`DEFAULT_INTERPRETER`].
    pub fn with_fallback<I>(fallback: I) -> Self
    where
        I: ScriptInterpreter + 'static,
    {
        Self {
            entries: vec![(DEFAULT_INTERPRETER.to_string(), Box::new(fallback))],
        }
    }

    /// Register `interpreter` for `extension` (without the dot).
    ///
    /// Re-registering an extension replaces its interpreter but keeps its
    /// position in the probing order.
    pub fn register<I>(&mut self, extension: &str, interpreter: I)
    where
        I: ScriptInterpreter + 'static,
    {
        let key = extension.to_lowercase();
        let interpreter: Box<dyn ScriptInterpreter> = Box::new(interpreter);

        match self.entries.iter_mut().find(|(ext, _)| *ext == key) {
            Some(entry) => entry.1 = interpreter,
            None => self.entries.push((key, interpreter)),
        }
    }

    /// Look up the interpreter registered for `extension`.
    pub fn get(&self, extension: &str) -> Option<&dyn ScriptInterpreter> {
        let key = extension.to_lowercase();
        self.entries
            .iter()
            .find(|(ext, _)| *ext == key)
            .map(|(_, interpreter)| interpreter.as_ref())
    }

    /// Interpreter for `script_file`, chosen by its extension.
    ///
    /// Extensions match case-insensitively; files with an unknown or no
    /// extension get the fallback interpreter.
    pub fn resolve(&self, script_file: &Path) -> &dyn ScriptInterpreter {
        script_file
            .extension()
            .and_then(|ext| self.get(&ext.to_string_lossy()))
            .unwrap_or_else(|| self.fallback())
    }

    /// The interpreter registered under [`DEFAULT_INTERPRETER`].
    pub fn fallback(&self) -> &dyn ScriptInterpreter {
        self.entries[0].1.as_ref()
    }

    /// Registered extensions, in registration order.
    pub fn extensions(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(ext, _)| ext.as_str())
    }
}

impl Default for InterpreterRegistry {
    fn default() -> Self {
        Self::new()
    }
}
