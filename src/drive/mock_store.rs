//! Mock implementation of the FileStore trait for testing

use actix_web::Error;
use actix_web::error::ErrorNotFound;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::drive::{FileStore, RemoteFile};

/// In-memory FileStore keyed by generated file ids
pub struct MockFileStore {
    files: Arc<Mutex<HashMap<String, (RemoteFile, Value)>>>,
    next_id: Arc<Mutex<u64>>,
}

impl MockFileStore {
    /// Create a new empty mock store
    pub fn new() -> Self {
        Self {
            files: Arc::new(Mutex::new(HashMap::new())),
            next_id: Arc::new(Mutex::new(0)),
        }
    }

    /// Clear all files from the store (useful for test cleanup)
    pub fn clear(&self) {
        let mut files = self.files.lock().unwrap();
        files.clear();
    }

    /// Number of files currently in the store
    pub fn file_count(&self) -> usize {
        let files = self.files.lock().unwrap();
        files.len()
    }

    /// Seed a file directly, bypassing the trait (test setup helper)
    pub fn insert_file(&self, name: &str, body: Value) -> RemoteFile {
        let file = RemoteFile {
            id: self.allocate_id(),
            name: name.to_string(),
            md5_checksum: None,
        };
        let mut files = self.files.lock().unwrap();
        files.insert(file.id.clone(), (file.clone(), body));
        file
    }

    fn allocate_id(&self) -> String {
        let mut next_id = self.next_id.lock().unwrap();
        *next_id += 1;
        format!("mock-file-{}", *next_id)
    }
}

impl Default for MockFileStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FileStore for MockFileStore {
    async fn find_by_name(&self, _folder_id: &str, name: &str) -> Result<Option<RemoteFile>, Error> {
        let files = self.files.lock().unwrap();
        Ok(files
            .values()
            .find(|(file, _)| file.name == name)
            .map(|(file, _)| file.clone()))
    }

    async fn list_json_files(&self, _folder_id: &str) -> Result<Vec<RemoteFile>, Error> {
        let files = self.files.lock().unwrap();
        let mut listing: Vec<RemoteFile> = files
            .values()
            .filter(|(file, _)| file.name.ends_with(".json"))
            .map(|(file, _)| file.clone())
            .collect();
        // HashMap iteration order is arbitrary; keep listings deterministic
        listing.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(listing)
    }

    async fn create_json(&self, _folder_id: &str, name: &str, body: &Value) -> Result<RemoteFile, Error> {
        Ok(self.insert_file(name, body.clone()))
    }

    async fn update_json(&self, file_id: &str, body: &Value) -> Result<(), Error> {
        let mut files = self.files.lock().unwrap();
        match files.get_mut(file_id) {
            Some((_, content)) => {
                *content = body.clone();
                Ok(())
            }
            None => Err(ErrorNotFound(format!("No file with id: {}", file_id))),
        }
    }

    async fn read_json(&self, file_id: &str) -> Result<Value, Error> {
        let files = self.files.lock().unwrap();
        match files.get(file_id) {
            Some((_, content)) => Ok(content.clone()),
            None => Err(ErrorNotFound(format!("No file with id: {}", file_id))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[actix_web::test]
    async fn test_mock_file_store_basic_operations() {
        let store = MockFileStore::new();
        assert_eq!(store.file_count(), 0);

        // Create and find by name
        let created = store
            .create_json("folder", "2024-05-01.json", &json!({"date": "2024-05-01"}))
            .await
            .unwrap();
        assert_eq!(store.file_count(), 1);

        let found = store.find_by_name("folder", "2024-05-01.json").await.unwrap();
        assert_eq!(found.as_ref().map(|f| f.id.as_str()), Some(created.id.as_str()));
        assert!(store.find_by_name("folder", "missing.json").await.unwrap().is_none());

        // Read and update content
        let content = store.read_json(&created.id).await.unwrap();
        assert_eq!(content["date"], "2024-05-01");

        store
            .update_json(&created.id, &json!({"date": "2024-05-01", "notes": "pr day"}))
            .await
            .unwrap();
        let content = store.read_json(&created.id).await.unwrap();
        assert_eq!(content["notes"], "pr day");

        // Clear
        store.clear();
        assert_eq!(store.file_count(), 0);
    }

    #[actix_web::test]
    async fn test_mock_file_store_listing_is_sorted_json_only() {
        let store = MockFileStore::new();
        store.insert_file("2024-05-02.json", json!({}));
        store.insert_file("readme.txt", json!({}));
        store.insert_file("2024-05-01.json", json!({}));

        let listing = store.list_json_files("folder").await.unwrap();
        let names: Vec<&str> = listing.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["2024-05-01.json", "2024-05-02.json"]);
    }

    #[actix_web::test]
    async fn test_mock_file_store_error_cases() {
        let store = MockFileStore::new();
        assert!(store.read_json("missing-id").await.is_err());
        assert!(store.update_json("missing-id", &json!({})).await.is_err());
    }
}
