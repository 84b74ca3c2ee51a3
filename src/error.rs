//! Structured error handling and exit codes.

use serde::Serialize;

use crate::duplicates::FinderError;

/// Exit codes for the bytedupe binary.
///
/// - 0: Success (scan completed, with or without duplicates)
/// - 1: General error (unexpected failure)
/// - 2: Usage error (missing, non-directory or unreadable root; no scan ran)
/// - 3: Partial success (completed with some unreadable files or directories)
/// - 130: Interrupted by user (Ctrl+C)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitCode {
    /// Success: Scan completed.
    Success = 0,
    /// General error: An unexpected error occurred.
    GeneralError = 1,
    /// Usage error: The command line did not name a usable directory.
    UsageError = 2,
    /// Partial success: Scan completed but encountered some non-fatal errors.
    PartialSuccess = 3,
    /// Interrupted: Scan was interrupted by user (Ctrl+C).
    Interrupted = 130,
}

impl ExitCode {
    /// Get the numeric exit code.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Get the machine-readable code prefix.
    #[must_use]
    pub fn code_prefix(self) -> &'static str {
        match self {
            Self::Success => "BD000",
            Self::GeneralError => "BD001",
            Self::UsageError => "BD002",
            Self::PartialSuccess => "BD003",
            Self::Interrupted => "BD130",
        }
    }

    /// Pick the exit code for an error that ended the run.
    #[must_use]
    pub fn for_error(err: &anyhow::Error) -> Self {
        match err.downcast_ref::<FinderError>() {
            Some(FinderError::Interrupted) => Self::Interrupted,
            Some(e) if e.is_invalid_argument() => Self::UsageError,
            _ => Self::GeneralError,
        }
    }
}

/// Structured error information for JSON output.
#[derive(Debug, Serialize)]
pub struct StructuredError {
    /// The error code (e.g., "BD001")
    pub code: String,
    /// The exit code number
    pub exit_code: i32,
    /// Human-readable error message
    pub message: String,
    /// Whether the operation was interrupted
    pub interrupted: bool,
}

impl StructuredError {
    /// Create a new structured error from an anyhow error and an exit code.
    #[must_use]
    pub fn new(err: &anyhow::Error, exit_code: ExitCode) -> Self {
        Self {
            code: exit_code.code_prefix().to_string(),
            exit_code: exit_code.as_i32(),
            message: format!("{:#}", err),
            interrupted: exit_code == ExitCode::Interrupted,
        }
    }
}
