//! Log service layer that orchestrates the remote file store
//!
//! Every read/modify/write sequence against the folder lives here: the
//! per-date documents, the manifest index, and the backward scans behind
//! the latest_* lookups. Each operation is a single sequential call
//! chain; concurrent saves for the same date race with last-write-wins
//! semantics on the remote store.

use actix_web::Error;
use actix_web::error::{ErrorInternalServerError, ErrorNotFound};
use chrono::Utc;
use log::{debug, info, warn};
use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::sync::Arc;

use crate::drive::FileStore;
use crate::manifest::{Manifest, ManifestEntry, INDEX_FILE};
use crate::model::{WorkoutLog, WorkoutType};

/// Receipt returned after a successful save
#[derive(Debug, Clone, Serialize)]
pub struct SaveReceipt {
    pub ok: bool,
    pub file: String,
    pub sha256: String,
}

/// Result of a latest-log lookup
#[derive(Debug, Clone, Serialize)]
pub struct LogWithMeta {
    pub meta: ManifestEntry,
    pub log: Value,
}

/// Result of a muscle lookup, including which exercise matched
#[derive(Debug, Clone, Serialize)]
pub struct MuscleMatch {
    pub meta: ManifestEntry,
    pub log: Value,
    pub matched_exercise: Option<String>,
}

/// Service over the remote folder holding the per-date log files
pub struct LogService {
    store: Arc<dyn FileStore>,
    folder_id: String,
}

impl LogService {
    /// Create a new log service with an injected store backend
    pub fn new(store: Arc<dyn FileStore>, folder_id: String) -> Self {
        Self { store, folder_id }
    }

    fn log_filename(date: &str) -> String {
        format!("{}.json", date)
    }

    /// Upsert the per-date document, then its manifest entry
    pub async fn save_log(&self, mut log: WorkoutLog) -> Result<SaveReceipt, Error> {
        log.validate()?;

        let filename = Self::log_filename(&log.date);
        let payload = serde_json::to_value(&log).map_err(ErrorInternalServerError)?;
        let encoded = serde_json::to_vec(&payload).map_err(ErrorInternalServerError)?;
        let sha256 = hex::encode(Sha256::digest(&encoded));

        match self.store.find_by_name(&self.folder_id, &filename).await? {
            Some(existing) => {
                debug!("Overwriting existing log file {} (id {})", filename, existing.id);
                self.store.update_json(&existing.id, &payload).await?;
            }
            None => {
                self.store.create_json(&self.folder_id, &filename, &payload).await?;
            }
        }

        let entry = ManifestEntry {
            date: log.date.clone(),
            file: filename.clone(),
            hash: Some(sha256.clone()),
            created_at: Some(Utc::now()),
            schema_version: Some(log.schema_version),
            session_id: Some(log.session_id.clone()),
            workout_type: log.workout_type,
        };
        self.upsert_manifest(entry).await?;

        info!("Saved log for {} ({} bytes)", log.date, encoded.len());
        Ok(SaveReceipt {
            ok: true,
            file: filename,
            sha256,
        })
    }

    /// Read-modify-write of the index document
    async fn upsert_manifest(&self, entry: ManifestEntry) -> Result<(), Error> {
        let existing = self.store.find_by_name(&self.folder_id, INDEX_FILE).await?;
        let mut manifest = match &existing {
            Some(index) => {
                let value = self.store.read_json(&index.id).await?;
                match serde_json::from_value(value) {
                    Ok(manifest) => manifest,
                    Err(e) => {
                        warn!("Manifest document is unreadable, starting fresh: {}", e);
                        Manifest::new()
                    }
                }
            }
            None => Manifest::new(),
        };
        manifest.sort_entries();
        manifest.upsert(entry);

        let body = serde_json::to_value(&manifest).map_err(ErrorInternalServerError)?;
        match existing {
            Some(index) => self.store.update_json(&index.id, &body).await?,
            None => {
                self.store.create_json(&self.folder_id, INDEX_FILE, &body).await?;
            }
        }
        Ok(())
    }

    /// Entries from the index document, or rebuilt from the folder listing
    /// when no index exists yet
    pub async fn manifest_entries(&self) -> Result<Vec<ManifestEntry>, Error> {
        if let Some(index) = self.store.find_by_name(&self.folder_id, INDEX_FILE).await? {
            let value = self.store.read_json(&index.id).await?;
            let mut manifest: Manifest = serde_json::from_value(value).map_err(|e| {
                warn!("Manifest document is malformed: {}", e);
                ErrorInternalServerError("manifest document is malformed")
            })?;
            manifest.sort_entries();
            return Ok(manifest.entries);
        }

        debug!("No index document, rebuilding from folder listing");
        let files = self.store.list_json_files(&self.folder_id).await?;
        Ok(Manifest::from_listing(&files).entries)
    }

    fn filter_before(entries: Vec<ManifestEntry>, before: Option<&str>) -> Vec<ManifestEntry> {
        match before {
            Some(cutoff) => entries
                .into_iter()
                .filter(|e| e.date.as_str() < cutoff)
                .collect(),
            None => entries,
        }
    }

    /// Newest log, optionally restricted to dates strictly before a cutoff
    pub async fn latest(&self, before: Option<&str>) -> Result<LogWithMeta, Error> {
        let entries = Self::filter_before(self.manifest_entries().await?, before);
        let latest = entries
            .last()
            .cloned()
            .ok_or_else(|| ErrorNotFound("No logs found"))?;

        let log = match self.store.find_by_name(&self.folder_id, &latest.file).await? {
            Some(file) => self.store.read_json(&file.id).await?,
            None => {
                warn!("Manifest entry {} has no backing file", latest.date);
                Value::Object(Default::default())
            }
        };
        Ok(LogWithMeta { meta: latest, log })
    }

    /// Newest log for a workout type. The strict pass trusts the manifest
    /// label and confirms it against the document; the fallback pass opens
    /// every candidate file and matches on the document alone.
    pub async fn latest_for_workout(
        &self,
        workout_type: WorkoutType,
        before: Option<&str>,
    ) -> Result<LogWithMeta, Error> {
        let entries = Self::filter_before(self.manifest_entries().await?, before);

        for entry in entries.iter().rev() {
            if entry.workout_type != Some(workout_type) {
                continue;
            }
            let file = match self.store.find_by_name(&self.folder_id, &entry.file).await? {
                Some(file) => file,
                None => continue,
            };
            let log = self.store.read_json(&file.id).await?;
            if document_workout_type(&log) == Some(workout_type) {
                return Ok(LogWithMeta { meta: entry.clone(), log });
            }
            // Relaxed acceptance: a document whose label drifted from the
            // manifest still counts when it carries muscle annotations.
            if document_has_target_muscles(&log) {
                return Ok(LogWithMeta { meta: entry.clone(), log });
            }
        }

        for entry in entries.iter().rev() {
            let file = match self.store.find_by_name(&self.folder_id, &entry.file).await? {
                Some(file) => file,
                None => continue,
            };
            let log = self.store.read_json(&file.id).await?;
            if document_workout_type(&log) == Some(workout_type) {
                return Ok(LogWithMeta { meta: entry.clone(), log });
            }
        }

        Err(ErrorNotFound(format!(
            "No logs found for workout_type '{}'",
            workout_type
        )))
    }

    /// Newest log containing an exercise targeting the given muscle.
    /// Linear backward scan opening every candidate file.
    pub async fn latest_for_muscle(
        &self,
        muscle: &str,
        before: Option<&str>,
    ) -> Result<MuscleMatch, Error> {
        let needle = muscle.trim().to_lowercase();
        let entries = Self::filter_before(self.manifest_entries().await?, before);

        for entry in entries.iter().rev() {
            let file = match self.store.find_by_name(&self.folder_id, &entry.file).await? {
                Some(file) => file,
                None => continue,
            };
            let log = self.store.read_json(&file.id).await?;
            if let Some(matched_exercise) = find_exercise_for_muscle(&log, &needle) {
                return Ok(MuscleMatch {
                    meta: entry.clone(),
                    log,
                    matched_exercise,
                });
            }
        }

        Err(ErrorNotFound(format!(
            "No logs found containing muscle '{}'",
            muscle
        )))
    }

    /// The stored document for an exact date
    pub async fn log_by_date(&self, date: &str) -> Result<Value, Error> {
        let filename = Self::log_filename(date);
        let file = self
            .store
            .find_by_name(&self.folder_id, &filename)
            .await?
            .ok_or_else(|| ErrorNotFound(format!("No log for {}", date)))?;
        self.store.read_json(&file.id).await
    }
}

/// workout_type of a stored document, when present and recognizable
fn document_workout_type(log: &Value) -> Option<WorkoutType> {
    log.get("workout_type")?.as_str()?.parse().ok()
}

/// Whether any exercise in the document carries target-muscle labels
fn document_has_target_muscles(log: &Value) -> bool {
    log.get("exercises")
        .and_then(Value::as_array)
        .map(|exercises| {
            exercises.iter().any(|exercise| {
                exercise
                    .get("target_muscles")
                    .and_then(Value::as_array)
                    .map(|muscles| !muscles.is_empty())
                    .unwrap_or(false)
            })
        })
        .unwrap_or(false)
}

/// Name of the first exercise whose normalized target muscles contain the
/// needle. Outer None means no exercise matched; the inner option is the
/// matched exercise's name, which stored documents may omit.
fn find_exercise_for_muscle(log: &Value, needle: &str) -> Option<Option<String>> {
    for exercise in log.get("exercises")?.as_array()? {
        let matched = exercise
            .get("target_muscles")
            .and_then(Value::as_array)
            .map(|muscles| {
                muscles
                    .iter()
                    .filter_map(Value::as_str)
                    .any(|m| m.trim().to_lowercase() == needle)
            })
            .unwrap_or(false);
        if matched {
            return Some(
                exercise
                    .get("name")
                    .and_then(Value::as_str)
                    .map(str::to_string),
            );
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_document_workout_type() {
        assert_eq!(
            document_workout_type(&json!({"workout_type": "push"})),
            Some(WorkoutType::Push)
        );
        assert_eq!(
            document_workout_type(&json!({"workout_type": " PULL "})),
            Some(WorkoutType::Pull)
        );
        assert_eq!(document_workout_type(&json!({"workout_type": null})), None);
        assert_eq!(document_workout_type(&json!({"workout_type": "cardio"})), None);
        assert_eq!(document_workout_type(&json!({})), None);
    }

    #[test]
    fn test_document_has_target_muscles() {
        assert!(document_has_target_muscles(&json!({
            "exercises": [{"name": "Row", "target_muscles": ["back"]}]
        })));
        assert!(!document_has_target_muscles(&json!({
            "exercises": [{"name": "Row", "target_muscles": []}]
        })));
        assert!(!document_has_target_muscles(&json!({
            "exercises": [{"name": "Row"}]
        })));
        assert!(!document_has_target_muscles(&json!({})));
    }

    #[test]
    fn test_find_exercise_for_muscle() {
        let log = json!({
            "exercises": [
                {"name": "Squat", "target_muscles": ["quads", "glutes"]},
                {"name": "Curl", "target_muscles": ["Biceps "]},
            ]
        });
        assert_eq!(
            find_exercise_for_muscle(&log, "biceps"),
            Some(Some("Curl".to_string()))
        );
        assert_eq!(
            find_exercise_for_muscle(&log, "quads"),
            Some(Some("Squat".to_string()))
        );
        assert_eq!(find_exercise_for_muscle(&log, "chest"), None);

        // A matching exercise without a name still matches
        let unnamed = json!({"exercises": [{"target_muscles": ["chest"]}]});
        assert_eq!(find_exercise_for_muscle(&unnamed, "chest"), Some(None));
    }

    #[test]
    fn test_filter_before() {
        let entries = vec![
            ManifestEntry::bare("2024-05-01", "2024-05-01.json"),
            ManifestEntry::bare("2024-05-02", "2024-05-02.json"),
            ManifestEntry::bare("2024-05-03", "2024-05-03.json"),
        ];
        let filtered = LogService::filter_before(entries.clone(), Some("2024-05-03"));
        let dates: Vec<&str> = filtered.iter().map(|e| e.date.as_str()).collect();
        assert_eq!(dates, vec!["2024-05-01", "2024-05-02"]);

        assert_eq!(LogService::filter_before(entries.clone(), None).len(), 3);
        assert!(LogService::filter_before(entries, Some("2024-05-01")).is_empty());
    }
}
