//! # Retention Module
//!
//! Removes backup namespaces older than a cutoff.
//!
//! The sweep works on directories only. Operations whose backups it removes
//! stay in the log with `can_undo == true`; undoing them afterwards reports
//! `BackupMissing`.

use crate::core::backup::BackupStore;
use crate::events::{Event, EventSender, RetentionEvent};
use chrono::{Duration, Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fs;
use tracing::{info, warn};

/// Outcome of a sweep
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanResult {
    pub removed_count: usize,
    /// Namespace names, oldest first
    pub removed: Vec<String>,
}

/// Remove every namespace created at or before `now - max_age`.
pub fn sweep(
    store: &BackupStore,
    max_age: Duration,
    events: &EventSender,
) -> std::io::Result<CleanResult> {
    sweep_before(store, Local::now().naive_local() - max_age, events)
}

/// Remove every namespace created at or before `cutoff`.
pub fn sweep_before(
    store: &BackupStore,
    cutoff: NaiveDateTime,
    events: &EventSender,
) -> std::io::Result<CleanResult> {
    let _exclusive = store.exclusive();
    let mut removed = Vec::new();

    for namespace in store.namespaces()? {
        if namespace.created > cutoff {
            continue;
        }
        match fs::remove_dir_all(&namespace.path) {
            Ok(()) => {
                events.send(Event::Retention(RetentionEvent::NamespaceRemoved {
                    name: namespace.name.clone(),
                }));
                removed.push(namespace.name);
            }
            Err(e) => warn!(namespace = %namespace.name, "failed to remove backup namespace: {}", e),
        }
    }

    info!(removed = removed.len(), %cutoff, "retention sweep finished");
    events.send(Event::Retention(RetentionEvent::Completed {
        removed: removed.len(),
    }));

    Ok(CleanResult {
        removed_count: removed.len(),
        removed,
    })
}
