//! Command-line interface definitions.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Inspect INI configuration files through a shared section registry.
#[derive(Parser, Debug)]
#[command(name = "ini-registry", version, about, long_about = None)]
pub struct Cli {
    /// Directory searched for relative file names that do not resolve as given
    /// (defaults to the executable's directory).
    #[arg(short, long, env = "INI_REGISTRY_DIR", global = true)]
    pub dir: Option<PathBuf>,

    /// Maximum number of diagnostics kept per file.
    #[arg(long, default_value_t = 100, global = true)]
    pub max_messages: usize,

    /// Increase logging verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Emit logs as JSON.
    #[arg(long, default_value = "false", global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Returns the log level based on verbosity flags.
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the sections of a file with their raw line counts.
    Sections {
        /// The configuration file.
        file: PathBuf,
    },

    /// Print a single value.
    Get {
        /// The configuration file.
        file: PathBuf,
        /// Section name (case-insensitive).
        section: String,
        /// Key within the section.
        key: String,
        /// Value printed when the key is missing.
        #[arg(long)]
        default: Option<String>,
    },

    /// Print every section's entries in file order.
    Dump {
        /// The configuration file.
        file: PathBuf,
        /// Output format.
        #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,
    },
}

/// Serialization format for `dump`.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Yaml,
}
