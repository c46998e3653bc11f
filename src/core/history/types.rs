//! Types for the operation log.

use crate::core::backup::TIMESTAMP_FORMAT;
use chrono::{DateTime, Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// What an operation did
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationAction {
    Delete,
}

impl OperationAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Delete => "delete",
        }
    }
}

/// One audited relocation and its eventual disposition.
///
/// Immutable once logged except for the undo/purge markers, each of which
/// is set at most once and only while `can_undo` is still true.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operation {
    pub id: u64,
    /// Second precision; doubles as the backup namespace name
    #[serde(with = "namespace_time")]
    pub timestamp: NaiveDateTime,
    pub action: OperationAction,
    pub original_path: PathBuf,
    pub backup_path: PathBuf,
    pub reason: String,
    pub can_undo: bool,
    /// Older logs wrote this without an offset; those read as local time
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "undone_time::deserialize"
    )]
    pub undone_at: Option<DateTime<Local>>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub permanently_deleted: bool,
}

impl Operation {
    /// Name of the backup namespace this operation wrote into
    pub fn namespace(&self) -> String {
        self.timestamp.format(TIMESTAMP_FORMAT).to_string()
    }

    pub fn is_undone(&self) -> bool {
        self.undone_at.is_some()
    }

    /// `can_undo` agrees with the markers
    pub fn is_consistent(&self) -> bool {
        self.can_undo == (self.undone_at.is_none() && !self.permanently_deleted)
            && !(self.undone_at.is_some() && self.permanently_deleted)
    }
}

/// An operation before the log has given it an id
#[derive(Debug, Clone)]
pub struct NewOperation {
    pub timestamp: NaiveDateTime,
    pub original_path: PathBuf,
    pub backup_path: PathBuf,
    pub reason: String,
}

impl NewOperation {
    pub fn delete(
        timestamp: NaiveDateTime,
        original_path: &Path,
        backup_path: &Path,
        reason: &str,
    ) -> Self {
        Self {
            timestamp,
            original_path: original_path.to_path_buf(),
            backup_path: backup_path.to_path_buf(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn into_operation(self, id: u64) -> Operation {
        Operation {
            id,
            timestamp: self.timestamp,
            action: OperationAction::Delete,
            original_path: self.original_path,
            backup_path: self.backup_path,
            reason: self.reason,
            can_undo: true,
            undone_at: None,
            permanently_deleted: false,
        }
    }
}

mod namespace_time {
    use super::TIMESTAMP_FORMAT;
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(time: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&time.format(TIMESTAMP_FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&raw, TIMESTAMP_FORMAT).map_err(serde::de::Error::custom)
    }
}

mod undone_time {
    use chrono::{DateTime, Local, NaiveDateTime, TimeZone};
    use serde::{de::Error, Deserialize, Deserializer};

    const NAIVE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DateTime<Local>>, D::Error> {
        let raw = match Option::<String>::deserialize(deserializer)? {
            Some(raw) => raw,
            None => return Ok(None),
        };

        if let Ok(time) = DateTime::parse_from_rfc3339(&raw) {
            return Ok(Some(time.with_timezone(&Local)));
        }

        let naive = NaiveDateTime::parse_from_str(&raw, NAIVE_FORMAT).map_err(D::Error::custom)?;
        Local
            .from_local_datetime(&naive)
            .earliest()
            .map(Some)
            .ok_or_else(|| D::Error::custom(format!("undone_at {} does not exist locally", raw)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample() -> Operation {
        let ts = NaiveDate::from_ymd_opt(2024, 3, 9)
            .unwrap()
            .and_hms_opt(14, 5, 7)
            .unwrap();
        NewOperation::delete(
            ts,
            Path::new("/meta/posters/a.jpg"),
            Path::new("/backups/20240309_140507/a.jpg"),
            "duplicate",
        )
        .into_operation(0)
    }

    #[test]
    fn new_operation_starts_undoable() {
        let op = sample();
        assert!(op.can_undo);
        assert!(op.is_consistent());
        assert_eq!(op.action.as_str(), "delete");
    }

    #[test]
    fn namespace_matches_timestamp() {
        assert_eq!(sample().namespace(), "20240309_140507");
    }

    #[test]
    fn json_layout_is_flat_and_readable() {
        let json = serde_json::to_value(sample()).unwrap();

        assert_eq!(json["timestamp"], "20240309_140507");
        assert_eq!(json["action"], "delete");
        assert_eq!(json["can_undo"], true);
        assert!(json.get("undone_at").is_none());
        assert!(json.get("permanently_deleted").is_none());
    }

    #[test]
    fn finalized_markers_survive_serde() {
        let mut op = sample();
        op.can_undo = false;
        op.permanently_deleted = true;

        let json = serde_json::to_string(&op).unwrap();
        let back: Operation = serde_json::from_str(&json).unwrap();

        assert_eq!(back, op);
        assert!(back.is_consistent());
    }

    #[test]
    fn undone_at_without_offset_reads_as_local_time() {
        let mut json = serde_json::to_value(sample()).unwrap();
        json["can_undo"] = false.into();
        json["undone_at"] = "2024-03-09T14:05:07.123456".into();

        let op: Operation = serde_json::from_value(json.clone()).unwrap();
        let expected = NaiveDate::from_ymd_opt(2024, 3, 9)
            .unwrap()
            .and_hms_micro_opt(14, 5, 7, 123_456)
            .unwrap();
        assert_eq!(op.undone_at.map(|t| t.naive_local()), Some(expected));
        assert!(op.is_consistent());

        json["undone_at"] = "2024-03-09T14:05:07".into();
        let op: Operation = serde_json::from_value(json).unwrap();
        assert!(op.is_undone());
    }

    #[test]
    fn undone_at_with_offset_round_trips() {
        let mut op = sample();
        op.can_undo = false;
        op.undone_at = Some(Local::now());

        let json = serde_json::to_string(&op).unwrap();
        let back: Operation = serde_json::from_str(&json).unwrap();

        assert_eq!(back, op);
    }

    #[test]
    fn garbage_undone_at_is_rejected() {
        let mut json = serde_json::to_value(sample()).unwrap();
        json["undone_at"] = "yesterday".into();

        assert!(serde_json::from_value::<Operation>(json).is_err());
    }

    #[test]
    fn inconsistent_flags_are_detected() {
        let mut op = sample();
        op.can_undo = false;
        assert!(!op.is_consistent());
    }
}
