//! # Operation Log Module
//!
//! The audit trail of every delete, undo and purge.
//!
//! ## Features
//! - Sequential ids, never reused
//! - Full-file JSON persistence on every mutation, swapped in atomically
//! - Undo/purge markers that can each be set once
//!
//! A crash between moving a file and appending its record leaves that one
//! file in the backup store with no log entry. This is not repaired
//! automatically; the orphan is visible by comparing the backup tree with
//! the log.

mod repository;
mod types;

pub use repository::OperationLog;
pub use types::{NewOperation, Operation, OperationAction};
