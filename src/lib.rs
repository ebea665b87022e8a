//! INI Registry - shared INI configuration files with per-section typed parsers.
//!
//! Files are loaded once per identity (name without extension) and shared by
//! every caller that opens them. Components attach their own parser to the
//! sections they own and read typed values back with defaults.
//!
//! ```no_run
//! use ini_registry::{ConfigRegistry, DefaultParser};
//!
//! let registry = ConfigRegistry::new();
//! let config = registry.open("app.ini");
//!
//! if !config.has_section("server") {
//!     config.attach("server", DefaultParser::new());
//! }
//! let port = config
//!     .with_section("server", |p: &mut DefaultParser| p.get_int32("port", 8080))
//!     .unwrap_or(8080);
//! # let _ = port;
//! ```

pub mod cli;
pub mod error;
pub mod inspect;
pub mod parser;
pub mod registry;
pub mod store;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::cli::{Cli, Commands, OutputFormat};
use crate::registry::{ConfigHandle, RegistryOptions};

pub use error::{IngestError, InspectError, LoadError};
pub use parser::{DefaultParser, SectionEntries, SectionParser};
pub use registry::{ConfigRegistry, DiagnosticQueue};

/// Runs the command-line tool with the provided arguments.
pub fn run(cli: Cli) -> Result<()> {
    setup_logging(cli.log_level(), cli.log_json)?;

    let mut options = RegistryOptions {
        max_messages: cli.max_messages,
        ..RegistryOptions::default()
    };
    if let Some(dir) = &cli.dir {
        options.fallback_dir = Some(dir.clone());
    }
    let registry = ConfigRegistry::with_options(options);

    let result = match &cli.command {
        Commands::Sections { file } => {
            let config = open_existing(&registry, file)?;
            list_sections(&config)
        }
        Commands::Get {
            file,
            section,
            key,
            default,
        } => {
            let config = open_existing(&registry, file)?;
            get_value(&config, section, key, default.as_deref())
        }
        Commands::Dump { file, format } => {
            let config = open_existing(&registry, file)?;
            dump_file(&config, *format)
        }
    };

    registry.close_all(true);
    result
}

/// Initializes the tracing subscriber for structured logging.
fn setup_logging(level: &str, json: bool) -> Result<()> {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let builder = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true);

    let initialized = if json {
        builder
            .json()
            .with_file(true)
            .with_line_number(true)
            .try_init()
    } else {
        builder.try_init()
    };

    initialized.map_err(|e| anyhow::anyhow!("Failed to initialize logging: {e}"))
}

/// Opens a file, failing if it could not be loaded.
fn open_existing(registry: &ConfigRegistry, file: &std::path::Path) -> Result<ConfigHandle> {
    let config = registry.open(file);
    if config.source().is_none() {
        let reason = Some(config.poll_messages())
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| format!("Failed to open config file: {}", file.display()));
        anyhow::bail!(reason);
    }

    info!(file = %config.identity(), source = ?config.source(), "Config file ready");
    Ok(config)
}

/// Reports every queued diagnostic of a file as a warning.
fn report_diagnostics(config: &ConfigHandle) {
    for message in inspect::drain_messages(config) {
        warn!(file = %config.identity(), "{}", message);
    }
}

/// Lists sections and their raw line counts.
fn list_sections(config: &ConfigHandle) -> Result<()> {
    let sections = inspect::summarize(config);

    println!("{} ({} section(s)):", config.identity(), sections.len());
    for section in sections {
        println!("  [{}] {} line(s)", section.name, section.lines);
    }

    report_diagnostics(config);
    Ok(())
}

/// Prints a single value.
fn get_value(config: &ConfigHandle, section: &str, key: &str, default: Option<&str>) -> Result<()> {
    let value = inspect::lookup(config, section, key, default);
    report_diagnostics(config);

    let value = value.with_context(|| format!("Lookup failed in '{}'", config.identity()))?;
    println!("{}", value);
    Ok(())
}

/// Prints every section as JSON or YAML.
fn dump_file(config: &ConfigHandle, format: OutputFormat) -> Result<()> {
    let dump = inspect::dump(config);
    report_diagnostics(config);

    let rendered = match format {
        OutputFormat::Json => serde_json::to_string_pretty(&dump)?,
        OutputFormat::Yaml => serde_yaml::to_string(&dump)?,
    };
    println!("{}", rendered);
    Ok(())
}
