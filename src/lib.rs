//! bytedupe - byte-exact duplicate file finder
//!
//! Finds sets of byte-identical files beneath a directory in two phases:
//! files are grouped by length, then each group of equal-length files is
//! refined byte by byte, splitting as soon as contents diverge. No hashes
//! are computed; every reported group is verified end to end.
//!
//! The library entry point is [`duplicates::DuplicateFinder`]. The binary
//! wraps it in [`run_app`].

pub mod cli;
pub mod config;
pub mod duplicates;
pub mod error;
pub mod logging;
pub mod output;
pub mod progress;
pub mod scanner;
pub mod signal;

use std::io::{self, IsTerminal, Write};
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::cli::{Cli, OutputFormat, USAGE};
use crate::config::Config;
use crate::duplicates::{DuplicateFinder, FinderConfig};
use crate::error::ExitCode;
use crate::output::{JsonOutput, TextOutput};
use crate::progress::Progress;
use crate::scanner::GrouperConfig;

/// Merge command-line flags over the loaded configuration.
fn apply_cli_overrides(config: &mut Config, cli: &Cli) {
    if let Some(threads) = cli.io_threads {
        config.io_threads = threads;
    }
    if cli.skip_hidden {
        config.skip_hidden = true;
    }
    if cli.no_lengths {
        config.show_lengths = false;
    }
    config
        .ignore_patterns
        .extend(cli.ignore_patterns.iter().cloned());
}

/// Run the application for parsed command-line arguments.
///
/// Validation failures print a German message and usage text to stderr and
/// return [`ExitCode::UsageError`] without scanning.
///
/// # Errors
///
/// Returns an error if the scan fails or the results cannot be written.
pub fn run_app(cli: Cli) -> Result<ExitCode> {
    logging::init_logging(cli.verbose, cli.quiet);

    if cli.no_color || !io::stdout().is_terminal() {
        yansi::disable();
    }

    let root = match cli::validate_path(cli.path.as_deref()) {
        Ok(path) => path.to_path_buf(),
        Err(e) => {
            log::debug!("Rejected command line: {:?}", e);
            eprintln!("{}", e);
            eprintln!();
            eprintln!("{}", USAGE);
            return Ok(ExitCode::UsageError);
        }
    };

    let mut config = Config::load();
    apply_cli_overrides(&mut config, &cli);
    if cli.save_config {
        config.save().context("Failed to save configuration")?;
    }
    log::debug!("Effective configuration: {:?}", config);

    let shutdown = signal::install_handler()?;
    let progress = Arc::new(Progress::new(cli.quiet || !io::stderr().is_terminal()));

    let finder_config = FinderConfig::default()
        .with_io_threads(config.io_threads)
        .with_shutdown_flag(shutdown.get_flag())
        .with_observer(progress.clone())
        .with_grouper_config(GrouperConfig::new(
            config.skip_hidden,
            config.ignore_patterns.clone(),
        ));

    let result = DuplicateFinder::new(finder_config).find_duplicates(&root);
    progress.finish();
    let (groups, summary) = result?;

    let exit_code = if summary.interrupted {
        ExitCode::Interrupted
    } else if summary.has_errors() {
        ExitCode::PartialSuccess
    } else {
        ExitCode::Success
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match cli.output {
        OutputFormat::Text => TextOutput::new(&groups)
            .with_lengths(config.show_lengths)
            .with_color(yansi::is_enabled())
            .write_to(&mut out)
            .context("Failed to write results")?,
        OutputFormat::Json => JsonOutput::new(&groups, &summary, exit_code)
            .write_to(&mut out, true)
            .context("Failed to write results")?,
    }
    out.flush()?;

    log::info!(
        "{} duplicate groups in {} files ({} reclaimable), {} unreadable, {:.2?}",
        summary.duplicate_groups,
        summary.total_files,
        summary.reclaimable_display(),
        summary.failed_files,
        summary.scan_duration
    );

    Ok(exit_code)
}
