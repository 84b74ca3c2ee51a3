//! Command-line interface definitions for bytedupe.
//!
//! The binary takes exactly one directory and prints the duplicate groups
//! found beneath it.
//!
//! # Example
//!
//! ```bash
//! # Print duplicate groups with length headers
//! bytedupe ~/Downloads
//!
//! # Paths only, skipping dotfiles
//! bytedupe --no-lengths --skip-hidden ~/Downloads
//!
//! # JSON for scripting
//! bytedupe --output json ~/Downloads
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use clap::{Parser, ValueEnum};

/// Find byte-identical files beneath a directory.
///
/// Files are grouped by length first; only files of equal length are
/// compared, byte by byte, until they differ or end.
#[derive(Debug, Parser)]
#[command(name = "bytedupe")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Directory to search for duplicate files
    #[arg(value_name = "VERZEICHNIS")]
    pub path: Option<PathBuf>,

    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, env = "NO_COLOR")]
    pub no_color: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,

    /// Omit the "( Orte mit N Bytes Länge )" header above each group
    #[arg(long)]
    pub no_lengths: bool,

    /// Skip hidden files and directories (starting with .)
    #[arg(long)]
    pub skip_hidden: bool,

    /// Glob patterns to ignore (can be specified multiple times)
    #[arg(short, long = "ignore", value_name = "PATTERN")]
    pub ignore_patterns: Vec<String>,

    /// Number of worker threads (default: 4)
    #[arg(long, value_name = "N")]
    pub io_threads: Option<usize>,

    /// Write the effective settings to the config file before scanning
    #[arg(long)]
    pub save_config: bool,

    /// Print errors as JSON on stderr
    #[arg(long)]
    pub json_errors: bool,
}

/// Output format for scan results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Blank-line separated blocks of paths
    Text,
    /// JSON document with groups and summary
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

/// Short usage text printed after a validation error.
pub const USAGE: &str = "Aufruf: bytedupe [OPTIONEN] <VERZEICHNIS>\n\
Sucht unterhalb von VERZEICHNIS nach Dateien mit identischem Inhalt.\n\
Weitere Optionen zeigt: bytedupe --help";

/// Reasons the command line does not name a usable directory.
#[derive(thiserror::Error, Debug)]
pub enum UsageError {
    /// No directory argument was given.
    #[error("Fehler: Es wurde kein Verzeichnis angegeben.")]
    MissingPath,

    /// The argument does not name a directory.
    #[error("Fehler: \"{}\" ist kein Verzeichnis.", .0.display())]
    NotADirectory(PathBuf),

    /// The directory cannot be listed.
    #[error("Fehler: Das Verzeichnis \"{}\" ist nicht lesbar.", .path.display())]
    Unreadable {
        /// Directory that could not be listed
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },
}

/// Check, in order, that a path was given, is a directory and is readable.
///
/// # Errors
///
/// Returns the first [`UsageError`] that applies.
pub fn validate_path(path: Option<&Path>) -> Result<&Path, UsageError> {
    let path = path
        .filter(|p| !p.as_os_str().is_empty())
        .ok_or(UsageError::MissingPath)?;

    if !path.is_dir() {
        return Err(UsageError::NotADirectory(path.to_path_buf()));
    }

    fs::read_dir(path).map_err(|source| UsageError::Unreadable {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(path)
}
