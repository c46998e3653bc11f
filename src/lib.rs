//! # Artwork Vault
//!
//! A safe-delete and recovery engine for media-server artwork.
//!
//! ## Core Philosophy
//! - **Never destroy on one click** - deletes are moves into a timestamped backup
//! - **Audit everything** - every delete, undo and purge lands in a durable log
//! - **Exact undo** - any logged delete can be reversed byte-for-byte
//! - **Hash once** - duplicate detection streams each file exactly once per scan
//!
//! ## Architecture
//! - `core` - hashing, duplicate detection, operation log, backup store,
//!   retention and the `Vault` coordinator
//! - `events` - Event-driven progress reporting
//! - `error` - Typed error taxonomy

pub mod core;
pub mod error;
pub mod events;

// Re-export commonly used types at the crate root
pub use crate::core::vault::{Vault, VaultBuilder, VaultConfig};
pub use error::{OperationError, Result, VaultError};

/// Initialize tracing for the library
///
/// This should be called by the application entry point. `default_filter`
/// applies when `RUST_LOG` is not set.
pub fn init_tracing(default_filter: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    // A subscriber may already be installed (tests, embedding services)
    let _ = tracing::subscriber::set_global_default(subscriber);
}
