//! Vault configuration and builder.

use super::Vault;
use crate::error::{Result, VaultError};
use crate::events::{null_sender, EventSender};
use std::path::PathBuf;

/// Default name of the operation log inside the backup root
pub const DEFAULT_LOG_FILE: &str = "operations.json";

/// Where the vault keeps its backups and log
#[derive(Debug, Clone)]
pub struct VaultConfig {
    /// Root of the backup store; namespaces and the log live here
    pub backup_root: PathBuf,
    /// Log file name, relative to `backup_root`
    pub log_file_name: String,
    /// Hashing threads for scans (0 = one per core)
    pub hash_workers: usize,
}

impl VaultConfig {
    /// `<data dir>/artwork-vault/backups`, or `./artwork-vault/backups`
    /// when the platform has no data directory
    pub fn default_backup_root() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("artwork-vault")
            .join("backups")
    }

    pub fn log_path(&self) -> PathBuf {
        self.backup_root.join(&self.log_file_name)
    }

    fn validate(&self) -> Result<()> {
        let name = std::path::Path::new(&self.log_file_name);
        if self.log_file_name.is_empty() || name.components().count() != 1 {
            return Err(VaultError::Config(format!(
                "log file name must be a plain file name, got {:?}",
                self.log_file_name
            )));
        }
        Ok(())
    }
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            backup_root: Self::default_backup_root(),
            log_file_name: DEFAULT_LOG_FILE.to_string(),
            hash_workers: 0,
        }
    }
}

/// Builder for configuring and opening a vault
pub struct VaultBuilder {
    config: VaultConfig,
    events: EventSender,
}

impl VaultBuilder {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self {
            config: VaultConfig::default(),
            events: null_sender(),
        }
    }

    /// Set the backup root
    pub fn backup_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.config.backup_root = root.into();
        self
    }

    /// Set the log file name
    pub fn log_file_name(mut self, name: impl Into<String>) -> Self {
        self.config.log_file_name = name.into();
        self
    }

    /// Set the number of hashing threads
    pub fn hash_workers(mut self, workers: usize) -> Self {
        self.config.hash_workers = workers;
        self
    }

    /// Send progress events to this channel
    pub fn events(mut self, events: EventSender) -> Self {
        self.events = events;
        self
    }

    /// Replace the whole configuration
    pub fn config(mut self, config: VaultConfig) -> Self {
        self.config = config;
        self
    }

    /// Create the backup root if needed and load the log
    pub fn open(self) -> Result<Vault> {
        self.config.validate()?;
        Vault::open_with(self.config, self.events)
    }
}

impl Default for VaultBuilder {
    fn default() -> Self {
        Self::new()
    }
}
