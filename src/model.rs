//! Workout log document model
//!
//! Serde types for the stored documents plus the validation and
//! normalization rules applied before anything is written to the remote
//! folder.

use actix_web::Error;
use actix_web::error::ErrorBadRequest;
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

/// Schema version written into every new document and manifest entry
pub const SCHEMA_VERSION: u32 = 2;

/// Workout split for a training day
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkoutType {
    Push,
    Pull,
    Legs,
}

impl WorkoutType {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkoutType::Push => "push",
            WorkoutType::Pull => "pull",
            WorkoutType::Legs => "legs",
        }
    }
}

impl std::str::FromStr for WorkoutType {
    type Err = String;

    // Accepts surrounding whitespace and any casing
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "push" => Ok(WorkoutType::Push),
            "pull" => Ok(WorkoutType::Pull),
            "legs" => Ok(WorkoutType::Legs),
            _ => Err("workout_type must be one of: push, pull, legs".to_string()),
        }
    }
}

impl std::fmt::Display for WorkoutType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for WorkoutType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for WorkoutType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// One performed set of an exercise
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SetEntry {
    pub reps: u32,
    pub weight: f64,
}

/// One exercise and its ordered sets
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Exercise {
    pub name: String,
    pub sets: Vec<SetEntry>,
    #[serde(default)]
    pub target_muscles: Option<Vec<String>>,
}

/// A single calendar date's workout record
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkoutLog {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub date: String,
    #[serde(default)]
    pub workout_type: Option<WorkoutType>,
    pub exercises: Vec<Exercise>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default = "new_session_id")]
    pub session_id: String,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

fn new_session_id() -> String {
    Uuid::new_v4().to_string()
}

/// Strict `YYYY-MM-DD` check used for both document dates and path segments
pub fn is_iso_date(s: &str) -> bool {
    s.len() == 10 && NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok()
}

impl WorkoutLog {
    /// Validate the document and normalize the free-form muscle labels in
    /// place. Invalid documents surface as client errors.
    pub fn validate(&mut self) -> Result<(), Error> {
        if !is_iso_date(&self.date) {
            return Err(ErrorBadRequest("date must be YYYY-MM-DD"));
        }
        if !self.exercises.iter().any(|e| !e.sets.is_empty()) {
            return Err(ErrorBadRequest("at least one exercise with sets is required"));
        }
        for exercise in &mut self.exercises {
            if exercise.name.trim().is_empty() {
                return Err(ErrorBadRequest("exercise name required"));
            }
            for set in &exercise.sets {
                if set.reps < 1 {
                    return Err(ErrorBadRequest("reps must be >= 1"));
                }
                if !set.weight.is_finite() || set.weight < 0.0 {
                    return Err(ErrorBadRequest("weight must be >= 0"));
                }
            }
            if let Some(muscles) = &mut exercise.target_muscles {
                *muscles = muscles
                    .iter()
                    .map(|m| m.trim().to_lowercase())
                    .filter(|m| !m.is_empty())
                    .collect();
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_log() -> WorkoutLog {
        WorkoutLog {
            schema_version: SCHEMA_VERSION,
            date: "2024-05-01".to_string(),
            workout_type: Some(WorkoutType::Push),
            exercises: vec![Exercise {
                name: "Bench Press".to_string(),
                sets: vec![SetEntry { reps: 8, weight: 80.0 }],
                target_muscles: Some(vec!["  Chest ".to_string(), "".to_string(), "Triceps".to_string()]),
            }],
            notes: None,
            session_id: new_session_id(),
        }
    }

    #[test]
    fn test_workout_type_parsing() {
        assert_eq!("push".parse::<WorkoutType>().unwrap(), WorkoutType::Push);
        assert_eq!(" PULL ".parse::<WorkoutType>().unwrap(), WorkoutType::Pull);
        assert_eq!("Legs".parse::<WorkoutType>().unwrap(), WorkoutType::Legs);
        assert!("cardio".parse::<WorkoutType>().is_err());
        assert!("".parse::<WorkoutType>().is_err());
    }

    #[test]
    fn test_workout_type_serde_round_trip() {
        let json = serde_json::to_string(&WorkoutType::Legs).unwrap();
        assert_eq!(json, "\"legs\"");
        let parsed: WorkoutType = serde_json::from_str("\" Push \"").unwrap();
        assert_eq!(parsed, WorkoutType::Push);
        assert!(serde_json::from_str::<WorkoutType>("\"cardio\"").is_err());
    }

    #[test]
    fn test_validate_accepts_and_normalizes() {
        let mut log = sample_log();
        assert!(log.validate().is_ok());
        assert_eq!(
            log.exercises[0].target_muscles,
            Some(vec!["chest".to_string(), "triceps".to_string()])
        );
    }

    #[test]
    fn test_validate_rejects_bad_date() {
        let mut log = sample_log();
        log.date = "05/01/2024".to_string();
        assert!(log.validate().is_err());

        log.date = "2024-5-1".to_string();
        assert!(log.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_exercise_name() {
        let mut log = sample_log();
        log.exercises[0].name = "   ".to_string();
        assert!(log.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_sets() {
        let mut log = sample_log();
        log.exercises[0].sets[0].reps = 0;
        assert!(log.validate().is_err());

        let mut log = sample_log();
        log.exercises[0].sets[0].weight = -2.5;
        assert!(log.validate().is_err());
    }

    #[test]
    fn test_validate_requires_at_least_one_set() {
        let mut log = sample_log();
        log.exercises[0].sets.clear();
        assert!(log.validate().is_err());

        let mut log = sample_log();
        log.exercises.clear();
        assert!(log.validate().is_err());
    }

    #[test]
    fn test_deserialize_fills_defaults() {
        let log: WorkoutLog = serde_json::from_value(serde_json::json!({
            "date": "2024-05-01",
            "exercises": [{"name": "Squat", "sets": [{"reps": 5, "weight": 100.0}]}]
        }))
        .unwrap();

        assert_eq!(log.schema_version, SCHEMA_VERSION);
        assert!(!log.session_id.is_empty());
        assert_eq!(log.workout_type, None);
        assert_eq!(log.notes, None);
    }
}
