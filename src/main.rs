use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use serde_json::Value;
use tracing::{error, info};

use hookscript::{Config, ExecutionLogger, FileLogger, Variables};

/// Run a pre-/post-build hook script.
#[derive(Debug, Parser)]
#[command(name = "hookscript", version, about)]
struct Cli {
    /// Script file, or logical script name when --basedir is given
    script: String,

    /// Configuration file
    #[arg(short, long, default_value = "hookscript.toml")]
    config: PathBuf,

    /// Resolve SCRIPT under this directory, trying every known extension
    #[arg(short, long)]
    basedir: Option<PathBuf>,

    /// Description used in log messages
    #[arg(short, long, default_value = "hook script")]
    description: String,

    /// Build log file
    #[arg(short, long)]
    log: Option<PathBuf>,

    /// Extra global variable (KEY=VALUE)
    #[arg(short = 'D', long = "define", value_parser = parse_key_value)]
    defines: Vec<(String, String)>,

    /// Shared context entry (KEY=VALUE)
    #[arg(short = 'C', long = "context", value_parser = parse_key_value)]
    context: Vec<(String, String)>,

    /// Do not mirror script output to stdout
    #[arg(short, long)]
    quiet: bool,
}

fn parse_key_value(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected KEY=VALUE, got '{s}'"))
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Load configuration
    let config = match Config::load(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load {}: {e}", cli.config.display());
            eprintln!("Using default configuration.");
            Config::default()
        }
    };

    // Initialize logging
    if let Err(e) = hookscript::logging::init(&config.logging) {
        eprintln!("Failed to initialize logging: {e}");
        hookscript::logging::init_console_only(&config.logging.level);
    }

    let mut runner = config.runner.build_runner();
    for (name, value) in &cli.defines {
        runner.set_global_variable(name.clone(), value.clone());
    }

    let context: Variables = cli
        .context
        .iter()
        .map(|(k, v)| (k.clone(), Value::String(v.clone())))
        .collect();

    let logger = if cli.quiet {
        FileLogger::new(cli.log.as_deref())
    } else {
        FileLogger::with_mirror(cli.log.as_deref(), |line: &str| println!("{line}"))
    };
    let mut logger = match logger {
        Ok(logger) => logger,
        Err(e) => {
            error!("Failed to open build log: {e}");
            return ExitCode::FAILURE;
        }
    };

    let result = match &cli.basedir {
        Some(basedir) => runner.run(
            &cli.description,
            basedir,
            Some(cli.script.as_str()),
            Some(&context),
            Some(&mut logger as &mut dyn ExecutionLogger),
        ),
        None => runner.run_file(
            &cli.description,
            Path::new(&cli.script),
            Some(&context),
            Some(&mut logger as &mut dyn ExecutionLogger),
        ),
    };

    if let Err(e) = logger.close() {
        error!("Failed to close build log: {e}");
    }

    match result {
        Ok(()) => {
            info!("{} passed", cli.description);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
