//! Per-entity sync outcome records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Distinguishes a real sync pass from a stubbed operation, so monitoring can
/// tell "zero records to sync" apart from "nothing was attempted".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncState {
    Completed,
    NotImplemented,
}

/// Outcome of one entity's one sync attempt. Created fresh per call, never
/// persisted; the caller aggregates a map of entity → result for a full sync.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncResult {
    pub success: bool,
    /// Successfully processed records only; failures land in `errors`.
    pub records_processed: u64,
    pub errors: Vec<String>,
    pub last_sync_time: DateTime<Utc>,
    pub state: SyncState,
}

impl SyncResult {
    /// A completed pass; `success` reflects whether any record failed.
    pub fn completed(records_processed: u64, errors: Vec<String>) -> Self {
        Self {
            success: errors.is_empty(),
            records_processed,
            errors,
            last_sync_time: Utc::now(),
            state: SyncState::Completed,
        }
    }

    /// A sync operation this adapter does not implement yet.
    pub fn not_implemented() -> Self {
        Self {
            success: true,
            records_processed: 0,
            errors: Vec::new(),
            last_sync_time: Utc::now(),
            state: SyncState::NotImplemented,
        }
    }

    /// A pass that failed before any record was processed.
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            records_processed: 0,
            errors: vec![message.into()],
            last_sync_time: Utc::now(),
            state: SyncState::Completed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completed_success_tracks_error_list() {
        let clean = SyncResult::completed(5, Vec::new());
        assert!(clean.success);
        assert_eq!(clean.records_processed, 5);

        let partial = SyncResult::completed(4, vec!["record 3: not an object".to_string()]);
        assert!(!partial.success);
        assert_eq!(partial.records_processed, 4);
        assert_eq!(partial.errors.len(), 1);
    }

    #[test]
    fn not_implemented_is_distinguishable_from_empty_success() {
        let stub = SyncResult::not_implemented();
        assert!(stub.success);
        assert_eq!(stub.records_processed, 0);
        assert_eq!(stub.state, SyncState::NotImplemented);

        let empty = SyncResult::completed(0, Vec::new());
        assert_eq!(empty.state, SyncState::Completed);
    }
}
