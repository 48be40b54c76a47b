//! Logging setup for MemFS.
//!
//! Uses the `log` facade with an `env_logger` backend writing to stderr, so
//! resource contents on stdout stay clean. The level comes from, in order:
//!
//! 1. `RUST_LOG`, when set
//! 2. `--quiet` (errors only) or `--verbose` (`-v` debug, `-vv` trace)
//! 3. Info otherwise
//!
//! Debug builds prefix each line with a timestamp and, when verbose, the
//! module path. Release builds print the level and message only.

use env_logger::{Builder, Target};
use log::LevelFilter;
use std::io::Write;

/// Initialize logging from CLI verbosity flags.
///
/// Call once at startup, before anything logs.
///
/// # Priority
///
/// 1. `RUST_LOG`, when set, replaces the flags entirely
/// 2. `quiet`: Error level only
/// 3. `verbose >= 2`: Trace level
/// 4. `verbose == 1`: Debug level
/// 5. Default: Info level
///
/// # Arguments
///
/// * `verbose` - Verbosity count from CLI (0=normal, 1=debug, 2+=trace)
/// * `quiet` - If true, only show errors (ignored when `RUST_LOG` is set)
///
/// # Panics
///
/// Never. A second call finds a logger already installed and returns
/// without replacing it.
///
/// # Example
///
/// ```rust,no_run
/// use memfs::logging::init_logging;
///
/// init_logging(1, false);
/// log::debug!("visible with -v");
/// ```
pub fn init_logging(verbose: u8, quiet: bool) {
    let from_env = std::env::var_os("RUST_LOG").is_some();

    let mut builder = Builder::new();
    builder.target(Target::Stderr);
    if from_env {
        builder.parse_default_env();
    } else {
        builder.filter_level(level_for(verbose, quiet));
    }
    configure_format(&mut builder, verbose);

    if builder.try_init().is_err() {
        return;
    }

    if from_env {
        log::debug!("Log filter taken from RUST_LOG");
    } else {
        log::debug!("Logging at level {}", level_for(verbose, quiet));
    }
}

/// Map CLI flags to a level filter. Quiet wins over verbose.
fn level_for(verbose: u8, quiet: bool) -> LevelFilter {
    match (quiet, verbose) {
        (true, _) => LevelFilter::Error,
        (false, 0) => LevelFilter::Info,
        (false, 1) => LevelFilter::Debug,
        (false, _) => LevelFilter::Trace,
    }
}

#[cfg(debug_assertions)]
fn configure_format(builder: &mut Builder, verbose: u8) {
    builder.format(move |buf, record| {
        let style = buf.default_level_style(record.level());
        let timestamp = buf.timestamp_seconds();
        if verbose > 0 {
            writeln!(
                buf,
                "{timestamp} {style}{:<5}{style:#} [{}] {}",
                record.level(),
                record.module_path().unwrap_or("unknown"),
                record.args()
            )
        } else {
            writeln!(
                buf,
                "{timestamp} {style}{:<5}{style:#} {}",
                record.level(),
                record.args()
            )
        }
    });
}

#[cfg(not(debug_assertions))]
fn configure_format(builder: &mut Builder, _verbose: u8) {
    builder.format(|buf, record| {
        let style = buf.default_level_style(record.level());
        writeln!(buf, "{style}{:<5}{style:#} {}", record.level(), record.args())
    });
}
