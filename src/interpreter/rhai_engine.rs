//! Rhai interpreter.

use std::cell::RefCell;
use std::io::Write;
use std::path::PathBuf;
use std::rc::Rc;

use rhai::module_resolvers::{FileModuleResolver, ModuleResolversCollection};
use rhai::serde::{from_dynamic, to_dynamic};
use rhai::{Dynamic, Engine, Scope};
use serde_json::Value;

use super::{ScriptInterpreter, Variables};
use crate::error::EvaluationError;
use crate::sink::LINE_SEPARATOR;

/// Interpreter for `.rhai` hook scripts.
///
/// A new engine and scope are built for every evaluation.
#[derive(Debug, Default)]
pub struct RhaiInterpreter;

impl RhaiInterpreter {
    /// Create a new Rhai interpreter.
    pub fn new() -> Self {
        Self
    }

    fn build_engine(class_path: &[PathBuf]) -> Engine {
        let mut engine = Engine::new();

        if !class_path.is_empty() {
            let mut resolvers = ModuleResolversCollection::new();
            for dir in class_path {
                resolvers.push(FileModuleResolver::new_with_path(dir.clone()));
            }
            engine.set_module_resolver(resolvers);
        }

        engine
    }
}

/// Convert a script result to JSON, falling back to its display text.
fn to_json(value: &Dynamic) -> Value {
    from_dynamic::<Value>(value).unwrap_or_else(|_| Value::String(value.to_string()))
}

impl ScriptInterpreter for RhaiInterpreter {
    fn name(&self) -> &str {
        "RhaiInterpreter"
    }

    fn evaluate(
        &self,
        script: &str,
        class_path: &[PathBuf],
        variables: &Variables,
        output: Option<&mut dyn Write>,
    ) -> Result<Value, EvaluationError> {
        let mut engine = Self::build_engine(class_path);

        // on_print and on_debug need 'static callbacks, so lines are
        // collected and written out once evaluation ends.
        let printed: Rc<RefCell<Vec<String>>> = Rc::new(RefCell::new(Vec::new()));
        if output.is_some() {
            let lines = Rc::clone(&printed);
            engine.on_print(move |text| lines.borrow_mut().push(text.to_string()));

            let lines = Rc::clone(&printed);
            engine.on_debug(move |text, source, pos| {
                let line = match source {
                    Some(source) => format!("{source} @ {pos:?} | {text}"),
                    None if pos.is_none() => text.to_string(),
                    None => format!("{pos:?} | {text}"),
                };
                lines.borrow_mut().push(line);
            });
        }

        let mut scope = Scope::new();
        for (name, value) in variables {
            scope.push_dynamic(name.as_str(), to_dynamic(value)?);
        }

        let result = engine.eval_with_scope::<Dynamic>(&mut scope, script);

        if let Some(out) = output {
            for line in printed.take() {
                out.write_all(line.as_bytes())?;
                out.write_all(LINE_SEPARATOR.as_bytes())?;
                out.flush()?;
            }
        }

        Ok(to_json(&result?))
    }
}
