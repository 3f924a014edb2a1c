//! Remote File-Store Abstraction
//!
//! This module provides an abstraction over the cloud folder holding the
//! log documents, allowing the system to swap the Google Drive backend
//! for an in-memory mock without affecting higher-level services.

pub mod client;
pub mod mock_store;

use actix_web::Error;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Identifier assigned to a file by the remote store
pub type FileId = String;

/// Handle to a file living in the remote folder
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RemoteFile {
    pub id: FileId,
    pub name: String,
    /// Content checksum as reported by the remote store, when available
    pub md5_checksum: Option<String>,
}

/// Trait defining the remote file-store interface
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Find a file by exact name inside a folder
    async fn find_by_name(&self, folder_id: &str, name: &str) -> Result<Option<RemoteFile>, Error>;

    /// List all JSON files inside a folder
    async fn list_json_files(&self, folder_id: &str) -> Result<Vec<RemoteFile>, Error>;

    /// Create a JSON file with the given name and content
    async fn create_json(&self, folder_id: &str, name: &str, body: &Value) -> Result<RemoteFile, Error>;

    /// Replace the content of an existing file
    async fn update_json(&self, file_id: &str, body: &Value) -> Result<(), Error>;

    /// Download the full content of a file and parse it as JSON
    async fn read_json(&self, file_id: &str) -> Result<Value, Error>;
}
