//! MemFS - cache-backed source loader
//!
//! Serves the text of local files and remote URIs from a shared key-value
//! pool, keyed by a hash of the identifier, so repeated loads across process
//! invocations skip the filesystem and the network.
//!
//! The library surface is [`loader::Loader`] over any [`store::CacheStore`];
//! the `memfs` binary wires it to configuration and a CLI.

pub mod cli;
pub mod config;
pub mod error;
pub mod key;
pub mod loader;
pub mod logging;
pub mod output;
pub mod source;
pub mod store;

pub use key::CacheKey;
pub use loader::{LoadError, LoadOutcome, Loader};
pub use store::{CacheStore, MemoryStore, SqliteStore};

use anyhow::{Context, Result};

use crate::cli::{Cli, Commands, StoreBackend};
use crate::config::Config;
use crate::error::ExitCode;
use crate::source::SourceReader;

/// Open the cache pool selected by the configuration.
pub fn open_store(config: &Config) -> Result<Box<dyn CacheStore>> {
    match config.backend {
        StoreBackend::Sqlite => {
            let path = config.database_path()?;
            let store = SqliteStore::open(&path, config.pool.as_str())
                .with_context(|| format!("Failed to open cache database: {}", path.display()))?;
            Ok(Box::new(store))
        }
        StoreBackend::Memory => {
            log::debug!("Using in-memory cache pool; entries are discarded on exit");
            Ok(Box::new(MemoryStore::new()))
        }
    }
}

/// Run the CLI and return the process exit code.
pub fn run_app(cli: Cli) -> Result<ExitCode> {
    logging::init_logging(cli.verbose, cli.quiet);

    let mut config = Config::load(cli.config.as_deref(), cli.profile.as_deref());
    config.merge_cli(&cli);
    log::debug!("Using pool '{}' on {} backend", config.pool, config.backend);

    let mut stdout = std::io::stdout().lock();

    if let Commands::Key(args) = &cli.command {
        output::write_keys(&mut stdout, &args.identifiers)?;
        return Ok(ExitCode::Success);
    }

    let reader = SourceReader::new(config.http_timeout()).with_body_limit(config.max_body_bytes);
    let loader = Loader::new(open_store(&config)?)
        .with_reader(reader)
        .with_markers(config.markers()?);

    match cli.command {
        Commands::Load(args) => {
            let outcome = loader.load(&args.identifiers, args.required || config.required)?;
            output::write_outcome(&mut stdout, &outcome, args.output)?;
            Ok(exit_code_for(&outcome))
        }
        Commands::Once(args) => {
            match loader.once(&args.identifier, args.required || config.required)? {
                Some(outcome) => {
                    output::write_outcome(&mut stdout, &outcome, args.output)?;
                    Ok(exit_code_for(&outcome))
                }
                None => {
                    log::info!("Already cached: {}", args.identifier);
                    Ok(ExitCode::Success)
                }
            }
        }
        Commands::Flush(args) => {
            loader.flush(&args.identifiers)?;
            log::info!("Flushed {} entries", args.identifiers.len());
            Ok(ExitCode::Success)
        }
        Commands::FlushAll => {
            loader.flush_all()?;
            Ok(ExitCode::Success)
        }
        Commands::Key(_) => Ok(ExitCode::Success),
    }
}

fn exit_code_for(outcome: &LoadOutcome) -> ExitCode {
    if outcome.is_partial() {
        ExitCode::PartialSuccess
    } else {
        ExitCode::Success
    }
}
