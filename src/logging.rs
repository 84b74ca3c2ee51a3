//! Logging setup for bytedupe.
//!
//! Uses the `log` facade with the `env_logger` backend. The level is chosen
//! by (in priority order):
//!
//! 1. `RUST_LOG` environment variable (if set)
//! 2. CLI flags: `--quiet` (error only) or `--verbose` (debug/trace)
//! 3. Default: info level
//!
//! Debug builds print a timestamp and, with `-v`, the module path. Release
//! builds print level and message only.
//!
//! ```rust,no_run
//! use bytedupe::logging::init_logging;
//!
//! init_logging(1, false);
//! log::debug!("visible with -v");
//! ```

use env_logger::Builder;
use log::LevelFilter;
use std::env;
use std::io::Write;

/// Initialize the logger from the CLI verbosity flags.
///
/// Call once, before any logging. Later calls are ignored.
///
/// # Arguments
///
/// * `verbose` - Verbosity count from CLI (0=info, 1=debug, 2+=trace)
/// * `quiet` - If true, only show errors (overridden by `RUST_LOG`)
pub fn init_logging(verbose: u8, quiet: bool) {
    let rust_log = env::var("RUST_LOG").ok();

    let mut builder = Builder::new();
    match &rust_log {
        Some(_) => {
            builder.parse_default_env();
        }
        None => {
            builder.filter_level(determine_level(verbose, quiet));
        }
    }
    configure_format(&mut builder, verbose);

    if builder.try_init().is_err() {
        return;
    }

    match rust_log {
        Some(filter) => log::debug!("Logging initialized from RUST_LOG={}", filter),
        None => log::debug!(
            "Logging initialized at level: {:?}",
            determine_level(verbose, quiet)
        ),
    }
}

/// Determine the log level from CLI flags.
fn determine_level(verbose: u8, quiet: bool) -> LevelFilter {
    if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }
}

fn configure_format(builder: &mut Builder, verbose: u8) {
    #[cfg(debug_assertions)]
    {
        builder.format(move |buf, record| {
            let timestamp = buf.timestamp_seconds();
            let level = record.level();
            let level_style = buf.default_level_style(level);

            if verbose >= 1 {
                writeln!(
                    buf,
                    "{} {level_style}{:<5}{level_style:#} [{}] {}",
                    timestamp,
                    level,
                    record.module_path().unwrap_or("unknown"),
                    record.args()
                )
            } else {
                writeln!(
                    buf,
                    "{} {level_style}{:<5}{level_style:#} {}",
                    timestamp,
                    level,
                    record.args()
                )
            }
        });
    }

    #[cfg(not(debug_assertions))]
    {
        let _ = verbose;
        builder.format(|buf, record| {
            let level = record.level();
            let level_style = buf.default_level_style(level);
            writeln!(
                buf,
                "{level_style}{:<5}{level_style:#} {}",
                level,
                record.args()
            )
        });
    }
}

/// Name of the active maximum log level.
#[must_use]
pub fn current_level_name() -> &'static str {
    match log::max_level() {
        LevelFilter::Off => "off",
        LevelFilter::Error => "error",
        LevelFilter::Warn => "warn",
        LevelFilter::Info => "info",
        LevelFilter::Debug => "debug",
        LevelFilter::Trace => "trace",
    }
}
