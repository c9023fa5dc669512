//! Lua interpreter backed by mlua.

use std::io::Write;
use std::path::PathBuf;

use mlua::{Function, Lua, LuaSerdeExt, SerializeOptions, Table, Value as LuaValue, Variadic};
use serde_json::Value;

use super::{ScriptInterpreter, Variables};
use crate::error::EvaluationError;
use crate::sink::LINE_SEPARATOR;

/// Interpreter for `.lua` hook scripts.
///
/// Every evaluation runs in a fresh Lua state, so globals never leak from
/// one script into the next.
#[derive(Debug, Default)]
pub struct LuaInterpreter;

impl LuaInterpreter {
    /// Create a new Lua interpreter.
    pub fn new() -> Self {
        Self
    }
}

/// JSON null must arrive in Lua as `nil`, not as the light userdata sentinel.
fn serialize_options() -> SerializeOptions {
    SerializeOptions::new()
        .serialize_none_to_null(false)
        .serialize_unit_to_null(false)
}

/// Put the class path directories in front of `package.path`.
fn prepend_package_path(lua: &Lua, class_path: &[PathBuf]) -> mlua::Result<()> {
    if class_path.is_empty() {
        return Ok(());
    }

    let package: Table = lua.globals().get("package")?;
    let current: String = package.get("path")?;

    let mut entries: Vec<String> = class_path
        .iter()
        .flat_map(|dir| {
            [
                format!("{}/?.lua", dir.display()),
                format!("{}/?/init.lua", dir.display()),
            ]
        })
        .collect();
    entries.push(current);

    package.set("path", entries.join(";"))
}

/// `print` replacement: tab-separated `tostring` values, one line per call.
fn print_line(lua: &Lua, out: &mut dyn Write, args: Variadic<LuaValue>) -> mlua::Result<()> {
    let tostring: Function = lua.globals().get("tostring")?;

    let mut parts = Vec::with_capacity(args.len());
    for arg in args {
        parts.push(tostring.call::<String>(arg)?);
    }

    write!(out, "{}{}", parts.join("\t"), LINE_SEPARATOR)
        .and_then(|_| out.flush())
        .map_err(mlua::Error::external)
}

/// Convert a script result to JSON, falling back to its `tostring` text.
fn to_json(lua: &Lua, value: LuaValue) -> mlua::Result<Value> {
    match lua.from_value::<Value>(value.clone()) {
        Ok(json) => Ok(json),
        Err(_) => {
            let tostring: Function = lua.globals().get("tostring")?;
            Ok(Value::String(tostring.call::<String>(value)?))
        }
    }
}

impl ScriptInterpreter for LuaInterpreter {
    fn name(&self) -> &str {
        "LuaInterpreter"
    }

    fn evaluate(
        &self,
        script: &str,
        class_path: &[PathBuf],
        variables: &Variables,
        output: Option<&mut dyn Write>,
    ) -> Result<Value, EvaluationError> {
        let lua = Lua::new();
        prepend_package_path(&lua, class_path)?;

        let globals = lua.globals();
        for (name, value) in variables {
            globals.set(name.as_str(), lua.to_value_with(value, serialize_options())?)?;
        }

        let result = match output {
            Some(out) => lua.scope(|scope| {
                let print = scope.create_function_mut(move |lua, args: Variadic<LuaValue>| {
                    print_line(lua, &mut *out, args)
                })?;
                lua.globals().set("print", print)?;
                lua.load(script).call::<LuaValue>(())
            })?,
            None => lua.load(script).call::<LuaValue>(())?,
        };

        Ok(to_json(&lua, result)?)
    }
}
