//! Manifest index over the per-date log files
//!
//! A single aggregate `index.json` document lists the known logs by date
//! so clients can answer latest/recent queries without listing the whole
//! folder. Entries stay sorted by date ascending with at most one entry
//! per date, and the whole index can be rebuilt from the folder listing
//! when the document is missing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::drive::RemoteFile;
use crate::model::{WorkoutType, SCHEMA_VERSION};

/// Name of the aggregate index document inside the folder
pub const INDEX_FILE: &str = "index.json";

/// One manifest entry per saved log, keyed by date
///
/// Entries rebuilt from a bare folder listing carry only `date` and
/// `file`; the remaining fields are filled on the next save.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ManifestEntry {
    pub date: String,
    pub file: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_version: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workout_type: Option<WorkoutType>,
}

impl ManifestEntry {
    /// Entry holding only what a folder listing can tell us
    pub fn bare(date: &str, file: &str) -> Self {
        Self {
            date: date.to_string(),
            file: file.to_string(),
            hash: None,
            created_at: None,
            schema_version: None,
            session_id: None,
            workout_type: None,
        }
    }
}

/// The aggregate index document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    pub schema_version: u32,
    pub entries: Vec<ManifestEntry>,
}

impl Manifest {
    /// Create an empty manifest
    pub fn new() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            entries: Vec::new(),
        }
    }

    /// Re-sort entries by date. Manifests written by other tools are not
    /// guaranteed to be ordered, and `upsert` relies on the order.
    pub fn sort_entries(&mut self) {
        self.entries.sort_by(|a, b| a.date.cmp(&b.date));
    }

    /// Insert or replace the entry for its date, keeping entries sorted by
    /// date ascending with at most one entry per date
    pub fn upsert(&mut self, entry: ManifestEntry) {
        match self
            .entries
            .binary_search_by(|e| e.date.as_str().cmp(entry.date.as_str()))
        {
            Ok(idx) => self.entries[idx] = entry,
            Err(idx) => self.entries.insert(idx, entry),
        }
    }

    /// Rebuild a manifest from a raw folder listing. Every date-named JSON
    /// file becomes a bare entry; the index document itself is skipped.
    pub fn from_listing(files: &[RemoteFile]) -> Self {
        let mut manifest = Self::new();
        for file in files {
            if file.name == INDEX_FILE {
                continue;
            }
            if let Some(date) = file.name.strip_suffix(".json") {
                manifest.upsert(ManifestEntry::bare(date, &file.name));
            }
        }
        manifest
    }
}

impl Default for Manifest {
    fn default() -> Self {
        Self::new()
    }
}
