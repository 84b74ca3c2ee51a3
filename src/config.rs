//! Application configuration management.
//!
//! Settings are layered with `figment`, later layers winning:
//!
//! 1. Built-in defaults
//! 2. `config.toml` in the platform config directory
//! 3. Environment variables prefixed `BYTEDUPE_` (e.g. `BYTEDUPE_IO_THREADS=8`)
//! 4. Command-line flags, applied by the binary after loading
//!
//! The detection library never reads this; the binary turns it into a
//! [`FinderConfig`](crate::duplicates::FinderConfig).

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::duplicates::DEFAULT_IO_THREADS;

/// Prefix for environment variable overrides.
pub const ENV_PREFIX: &str = "BYTEDUPE_";

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Worker threads shared by both detection phases.
    pub io_threads: usize,
    /// Print the `( Orte mit N Bytes Länge )` header above each group.
    pub show_lengths: bool,
    /// Skip hidden files and directories.
    pub skip_hidden: bool,
    /// Gitignore-style patterns excluded from the scan.
    pub ignore_patterns: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            io_threads: DEFAULT_IO_THREADS,
            show_lengths: true,
            skip_hidden: false,
            ignore_patterns: Vec::new(),
        }
    }
}

impl Config {
    /// Load the configuration from defaults, the config file and environment.
    ///
    /// Falls back to defaults (logging why) if the layers cannot be merged.
    pub fn load() -> Self {
        let path = match Self::config_path() {
            Ok(path) => Some(path),
            Err(e) => {
                log::debug!("No config directory: {}", e);
                None
            }
        };

        match Self::figment(path.as_deref()).extract() {
            Ok(config) => config,
            Err(e) => {
                log::warn!("Ignoring invalid configuration: {}", e);
                Self::default()
            }
        }
    }

    /// Build the layered figment, reading the TOML file at `path` if given.
    #[must_use]
    pub fn figment(path: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(path) = path {
            figment = figment.merge(Toml::file(path));
        }
        figment.merge(Env::prefixed(ENV_PREFIX))
    }

    /// Save the configuration to the default platform-specific path.
    ///
    /// # Errors
    ///
    /// Returns an error if the config directory is unknown or not writable.
    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::config_path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    /// Save the configuration as TOML to `path`, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))?;
        log::info!("Saved configuration to {}", path.display());
        Ok(())
    }

    /// Get the default platform-specific configuration path.
    ///
    /// # Errors
    ///
    /// Returns an error if no home directory can be determined.
    pub fn config_path() -> Result<PathBuf> {
        let project_dirs = ProjectDirs::from("com", "bytedupe", "bytedupe")
            .ok_or_else(|| anyhow::anyhow!("Failed to determine project directories"))?;
        Ok(project_dirs.config_dir().join("config.toml"))
    }
}
