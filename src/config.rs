//! Configuration module for hookscript.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::interpreter::Variables;
use crate::runner::ScriptRunner;
use crate::{HookError, Result};

/// Script runner configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RunnerConfig {
    /// Encoding of the script files (empty or absent = UTF-8).
    #[serde(default)]
    pub encoding: Option<String>,
    /// Extra module search path for the interpreters.
    #[serde(default)]
    pub class_path: Vec<PathBuf>,
    /// Global variables passed to every script.
    #[serde(default)]
    pub globals: Variables,
}

impl RunnerConfig {
    /// Build a [`ScriptRunner`] with the default interpreters and this
    /// configuration applied.
    pub fn build_runner(&self) -> ScriptRunner {
        let mut runner = ScriptRunner::new();
        runner.set_script_encoding(self.encoding.as_deref());
        runner.set_class_path(self.class_path.iter().cloned());
        for (name, value) in &self.globals {
            runner.set_global_variable(name.clone(), value.clone());
        }
        runner
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Path to the log file, console only when unset.
    #[serde(default)]
    pub file: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Script runner configuration.
    #[serde(default)]
    pub runner: RunnerConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            HookError::Config(format!("cannot read {}: {e}", path.as_ref().display()))
        })?;
        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| HookError::Config(format!("config parse error: {e}")))
    }
}
