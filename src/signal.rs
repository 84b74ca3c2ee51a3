//! Ctrl+C handling for graceful shutdown.
//!
//! The handler raises a shared `AtomicBool`. The flag is passed to
//! [`FinderConfig::with_shutdown_flag`](crate::duplicates::FinderConfig::with_shutdown_flag);
//! every worker task checks it before doing any work, so a raised flag ends
//! the run with [`FinderError::Interrupted`](crate::duplicates::FinderError::Interrupted)
//! and exit code 130.
//!
//! ```rust,no_run
//! use bytedupe::duplicates::FinderConfig;
//! use bytedupe::signal::install_handler;
//!
//! let handler = install_handler().expect("Failed to install signal handler");
//! let config = FinderConfig::default().with_shutdown_flag(handler.get_flag());
//! ```

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

/// Shared shutdown flag.
#[derive(Debug, Clone, Default)]
pub struct ShutdownHandler {
    flag: Arc<AtomicBool>,
}

impl ShutdownHandler {
    /// Create a handler with no shutdown requested.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if shutdown has been requested.
    #[must_use]
    pub fn is_shutdown_requested(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Request a shutdown, as Ctrl+C would.
    pub fn request_shutdown(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Get the flag for the finder's worker tasks.
    #[must_use]
    pub fn get_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.flag)
    }

    /// Lower the flag again.
    pub fn reset(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

/// Error type for signal handler installation.
#[derive(Debug, thiserror::Error)]
pub enum SignalError {
    /// Failed to install the Ctrl+C handler.
    #[error("Failed to install signal handler: {0}")]
    InstallFailed(#[from] ctrlc::Error),
}

static GLOBAL_HANDLER: OnceLock<ShutdownHandler> = OnceLock::new();

/// Install the process-wide Ctrl+C handler.
///
/// The hook can only be registered once per process. Later calls return the
/// already installed handler with its flag lowered, so `run_app` may be
/// called repeatedly (as the integration tests do).
///
/// # Errors
///
/// Returns [`SignalError::InstallFailed`] if the OS refuses the hook.
pub fn install_handler() -> Result<ShutdownHandler, SignalError> {
    if let Some(handler) = GLOBAL_HANDLER.get() {
        handler.reset();
        return Ok(handler.clone());
    }

    let handler = ShutdownHandler::new();
    let flag = handler.get_flag();

    let installed = ctrlc::set_handler(move || {
        flag.store(true, Ordering::SeqCst);
        let _ = writeln!(std::io::stderr(), "\nAbbruch angefordert, räume auf...");
        let _ = std::io::stderr().flush();
        log::info!("Shutdown signal received");
    });

    match installed {
        Ok(()) => {
            let _ = GLOBAL_HANDLER.set(handler.clone());
            Ok(GLOBAL_HANDLER.get().cloned().unwrap_or(handler))
        }
        Err(ctrlc::Error::MultipleHandlers) => {
            // Registered by a racing caller; share whichever handler won.
            log::debug!("Ctrl+C handler already registered, using unhooked handler");
            let fallback = GLOBAL_HANDLER.get_or_init(ShutdownHandler::new).clone();
            fallback.reset();
            Ok(fallback)
        }
        Err(e) => Err(SignalError::InstallFailed(e)),
    }
}
