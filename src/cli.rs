//! Command-line interface definitions for MemFS.
//!
//! This module defines all CLI arguments, subcommands, and options using the clap derive API.
//! Global options select the configuration, the cache pool and its backend; subcommands
//! map one-to-one onto loader operations.
//!
//! # Example
//!
//! ```bash
//! # Load two files, reading from disk only on a cache miss
//! memfs load /srv/app/bootstrap.php /srv/app/routes.php
//!
//! # Fail if a file cannot be read
//! memfs load --required /srv/app/bootstrap.php
//!
//! # Load only if not cached yet
//! memfs once /srv/app/bootstrap.php
//!
//! # Drop cached entries
//! memfs flush /srv/app/routes.php
//! memfs flush-all
//! ```

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Cache source file contents in a shared key-value pool.
///
/// MemFS serves file and URI contents from a cache pool keyed by a hash of the
/// identifier, reading the original source only on a miss.
#[derive(Debug, Parser)]
#[command(name = "memfs")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Path to a TOML configuration file
    #[arg(long, value_name = "PATH", global = true, env = "MEMFS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Named profile from the configuration file
    #[arg(long, value_name = "NAME", global = true)]
    pub profile: Option<String>,

    /// Cache pool name
    #[arg(long, value_name = "NAME", global = true)]
    pub pool: Option<String>,

    /// Cache backend
    #[arg(long, value_enum, global = true)]
    pub backend: Option<StoreBackend>,

    /// Path to the cache database (sqlite backend)
    #[arg(long, value_name = "PATH", global = true)]
    pub database: Option<PathBuf>,

    /// Report errors as JSON on stderr
    #[arg(long, global = true)]
    pub json_errors: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands for MemFS.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Load resources, reading sources only for cache misses
    Load(LoadArgs),
    /// Load a resource only if it is not cached yet
    Once(OnceArgs),
    /// Remove cached entries for the given identifiers
    Flush(FlushArgs),
    /// Remove every entry from the cache pool
    FlushAll,
    /// Print the cache key derived for each identifier
    Key(KeyArgs),
}

/// Arguments for the load subcommand.
#[derive(Debug, Args)]
pub struct LoadArgs {
    /// Local paths or URIs to load
    #[arg(value_name = "IDENTIFIER", required = true)]
    pub identifiers: Vec<String>,

    /// Fail if any resource cannot be read
    #[arg(short, long)]
    pub required: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,
}

/// Arguments for the once subcommand.
#[derive(Debug, Args)]
pub struct OnceArgs {
    /// Local path or URI to load
    #[arg(value_name = "IDENTIFIER")]
    pub identifier: String,

    /// Fail if the resource cannot be read
    #[arg(short, long)]
    pub required: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,
}

/// Arguments for the flush subcommand.
#[derive(Debug, Args)]
pub struct FlushArgs {
    /// Local paths or URIs whose entries should be removed
    #[arg(value_name = "IDENTIFIER", required = true)]
    pub identifiers: Vec<String>,
}

/// Arguments for the key subcommand.
#[derive(Debug, Args)]
pub struct KeyArgs {
    /// Local paths or URIs
    #[arg(value_name = "IDENTIFIER", required = true)]
    pub identifiers: Vec<String>,
}

/// Output format for loaded resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Resource contents written to stdout in order
    Text,
    /// Outcome as JSON, including skipped identifiers and counters
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// Cache pool backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Persistent SQLite database shared across processes
    #[default]
    Sqlite,
    /// Process-local memory, discarded on exit
    Memory,
}

impl std::fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreBackend::Sqlite => write!(f, "sqlite"),
            StoreBackend::Memory => write!(f, "memory"),
        }
    }
}
