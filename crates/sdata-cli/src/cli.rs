use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Crates whose output `--log-level` controls
const LOG_TARGETS: [&str; 3] = ["sdata_cli", "sdata_query", "sdata_uri"];

/// Verbosity of the workspace crates. The URI and query crates only emit
/// `debug` (one line per translation) and `trace` (key folding, dropped
/// sort direction), so `info` and below are effectively quiet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Off,
    Error,
    /// Default
    Warn,
    Info,
    /// Translation summaries
    Debug,
    /// Key folding and rewrite details
    Trace,
}

impl LogLevel {
    /// Directive value understood by `EnvFilter`
    pub fn as_directive(self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}

#[derive(Parser)]
#[command(name = "sdata")]
#[command(about = "sdata - inspect SData URIs and translate command trees")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Set log level (off, error, warn, info, debug, trace)
    #[arg(short = 'l', long, global = true, value_enum)]
    pub log_level: Option<LogLevel>,

    /// Enable verbose logging (shortcut for --log-level=debug)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Dialect config file (TOML); defaults to the built-in dialect
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// Effective log level: explicit level, then `--verbose`, then warn
    pub fn log_level(&self) -> LogLevel {
        match (self.log_level, self.verbose) {
            (Some(level), _) => level,
            (None, true) => LogLevel::Debug,
            (None, false) => LogLevel::Warn,
        }
    }

    /// `EnvFilter` directives scoping the level to this workspace's crates
    pub fn env_filter(&self) -> String {
        let level = self.log_level().as_directive();
        LOG_TARGETS
            .iter()
            .map(|target| format!("{}={}", target, level))
            .collect::<Vec<_>>()
            .join(",")
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the resolved parts of a URI as JSON
    Inspect {
        /// URI to inspect, absolute or relative
        uri: String,

        /// Compact single-line JSON
        #[arg(long)]
        compact: bool,
    },

    /// Translate a JSON command tree into a verb and URI
    Translate {
        /// File containing the serialized command
        file: PathBuf,

        /// Base URI the collection segment is appended to
        #[arg(short, long)]
        base: Option<String>,

        /// Map a table name to a resource kind (can be repeated)
        /// Format: TABLE=RESOURCE
        #[arg(short = 'r', long = "resource", value_name = "TABLE=RESOURCE")]
        resources: Vec<String>,
    },
}
