//! Roster and plan documents.
//!
//! A document captures the groups, their competitors (with any accepted
//! results) and optionally a previously generated plan, including recorded
//! attempts. It is read on startup and written on demand in the same shape.
//!
//! # File Format
//!
//! Pretty-printed JSON:
//!
//! ```json
//! {
//!   "schema_version": 1,
//!   "saved_at": "2026-03-07T18:00:00Z",
//!   "n_lanes": 4,
//!   "groups": [{"name": "Wolves", "ability_rank": 1, "competitors": [...]}],
//!   "plan": [{"plan_number": 0, "lanes": [{"kind": "entry", ...}], ...}]
//! }
//! ```
//!
//! The sentinel group is synthetic and never written.
//!
//! # Atomic Writes
//!
//! Documents go through [`write_atomic`], so a crash mid-save leaves the
//! previous document intact.

use std::io;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::durable::write_atomic;
use crate::types::{Group, ScheduledRace};

/// Current schema version. Increment when making breaking changes.
pub const SCHEMA_VERSION: u32 = 1;

/// Errors that can occur while reading or writing documents.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// IO error during file operations.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Schema version mismatch.
    #[error("schema version mismatch: expected {expected}, got {got}")]
    SchemaMismatch { expected: u32, got: u32 },
}

/// Result type for document operations.
pub type Result<T> = std::result::Result<T, DocumentError>;

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

/// The persisted shape of an event's roster and plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RosterDocument {
    /// Schema version for forward-compatible migrations. Hand-written
    /// rosters may omit it.
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    /// When the document was written.
    #[serde(default = "Utc::now")]
    pub saved_at: DateTime<Utc>,

    /// Lane count the results and plan were built for.
    pub n_lanes: usize,

    /// Real groups in schedule order.
    pub groups: Vec<Group>,

    /// Previously generated plan. Absent means "generate on load".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan: Option<Vec<ScheduledRace>>,
}

impl RosterDocument {
    pub fn new(n_lanes: usize, groups: Vec<Group>, plan: Option<Vec<ScheduledRace>>) -> Self {
        RosterDocument {
            schema_version: SCHEMA_VERSION,
            saved_at: Utc::now(),
            n_lanes,
            groups,
            plan,
        }
    }

    /// Total number of competitors across all groups.
    pub fn competitor_count(&self) -> usize {
        self.groups.iter().map(Group::len).sum()
    }
}

/// Writes a document atomically.
pub fn save_document(path: &Path, document: &RosterDocument) -> Result<()> {
    let bytes = serde_json::to_vec_pretty(document)?;
    write_atomic(path, &bytes)?;
    Ok(())
}

/// Loads a document from disk.
///
/// # Errors
///
/// Returns an error if:
/// - The file doesn't exist or can't be read
/// - The JSON is malformed, including invalid names
/// - The schema version is incompatible
pub fn load_document(path: &Path) -> Result<RosterDocument> {
    let bytes = std::fs::read(path)?;
    let document: RosterDocument = serde_json::from_slice(&bytes)?;

    if document.schema_version != SCHEMA_VERSION {
        return Err(DocumentError::SchemaMismatch {
            expected: SCHEMA_VERSION,
            got: document.schema_version,
        });
    }

    Ok(document)
}

/// Attempts to load a document, returning None if the file doesn't exist.
///
/// Other errors (malformed JSON, schema mismatch) are propagated.
pub fn try_load_document(path: &Path) -> Result<Option<RosterDocument>> {
    match load_document(path) {
        Ok(document) => Ok(Some(document)),
        Err(DocumentError::Io(e)) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::build_plan;
    use crate::test_utils::arb_groups;
    use proptest::prelude::*;
    use tempfile::tempdir;

    proptest! {
        #[test]
        fn atomic_save_load_roundtrip(groups in arb_groups(4, 0..20), with_plan in any::<bool>()) {
            let dir = tempdir().unwrap();
            let path = dir.path().join("roster.json");

            let real: Vec<Group> = groups.iter().filter(|g| !g.is_sentinel()).cloned().collect();
            let plan = with_plan.then(|| build_plan(&groups, 4));
            let document = RosterDocument::new(4, real, plan);

            save_document(&path, &document).unwrap();
            let loaded = load_document(&path).unwrap();

            // Back-references are not persisted; compare what is.
            prop_assert_eq!(loaded.n_lanes, document.n_lanes);
            prop_assert_eq!(&loaded.plan, &document.plan);
            prop_assert_eq!(loaded.competitor_count(), document.competitor_count());
            prop_assert!(!dir.path().join("roster.json.tmp").exists());
        }
    }

    #[test]
    fn hand_written_roster_without_plan_loads() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("roster.json");
        std::fs::write(
            &path,
            r#"{
                "n_lanes": 4,
                "groups": [
                    {"name": "Tigers", "ability_rank": 2, "competitors": [
                        {"name": "Ann", "rank": "Tiger", "eligibility": {"weight": "5.0oz"}},
                        {"name": "Bo"}
                    ]}
                ]
            }"#,
        )
        .unwrap();

        let document = load_document(&path).unwrap();
        assert_eq!(document.schema_version, SCHEMA_VERSION);
        assert!(document.plan.is_none());
        assert_eq!(document.groups[0].competitors.len(), 2);
        assert_eq!(
            document.groups[0].competitors[0].eligibility.get("weight").map(String::as_str),
            Some("5.0oz")
        );
    }

    #[test]
    fn try_load_nonexistent_returns_none() {
        let dir = tempdir().unwrap();
        let result = try_load_document(&dir.path().join("missing.json")).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn load_invalid_json_returns_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("roster.json");
        std::fs::write(&path, "not json").unwrap();

        assert!(matches!(load_document(&path), Err(DocumentError::Json(_))));
    }

    #[test]
    fn load_name_with_comma_returns_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("roster.json");
        std::fs::write(
            &path,
            r#"{"n_lanes": 4, "groups": [{"name": "Cubs", "competitors": [{"name": "Smith, J"}]}]}"#,
        )
        .unwrap();

        assert!(matches!(load_document(&path), Err(DocumentError::Json(_))));
    }

    #[test]
    fn load_wrong_schema_version_returns_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("roster.json");
        std::fs::write(&path, r#"{"schema_version": 99, "n_lanes": 4, "groups": []}"#).unwrap();

        let result = load_document(&path);
        assert!(matches!(
            result,
            Err(DocumentError::SchemaMismatch {
                expected: 1,
                got: 99
            })
        ));
    }
}
