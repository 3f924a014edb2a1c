//! Google Drive v3 file-store backend
//!
//! Thin wrapper over the Drive REST API: OAuth2 refresh-token grant,
//! search by query string, metadata create plus media upload, and
//! alt=media download. Transient remote failures are not retried; they
//! surface as internal errors.

use actix_web::Error;
use actix_web::error::ErrorInternalServerError;
use async_trait::async_trait;
use log::{debug, error, info};
use serde::Deserialize;
use serde_json::Value;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

use crate::config::DriveConfig;
use crate::drive::{FileStore, RemoteFile};

const FILES_URL: &str = "https://www.googleapis.com/drive/v3/files";
const UPLOAD_URL: &str = "https://www.googleapis.com/upload/drive/v3/files";
const LIST_FIELDS: &str = "files(id, name, md5Checksum)";

// Refresh this long before the reported expiry so a token never dies
// mid-request.
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(60);

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

#[derive(Debug, Deserialize)]
struct FileResource {
    id: String,
    name: String,
    #[serde(rename = "md5Checksum")]
    md5_checksum: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FileList {
    #[serde(default)]
    files: Vec<FileResource>,
}

struct CachedToken {
    value: String,
    expires_at: Instant,
}

/// Google Drive implementation of the FileStore trait
pub struct DriveFileStore {
    http: reqwest::Client,
    client_id: String,
    client_secret: String,
    refresh_token: String,
    token_uri: String,
    token: Mutex<Option<CachedToken>>,
}

impl DriveFileStore {
    /// Create a new Drive store from the configured credentials
    pub fn new(config: &DriveConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            refresh_token: config.refresh_token.clone(),
            token_uri: config.token_uri.clone(),
            token: Mutex::new(None),
        }
    }

    /// Escape a value for embedding in a Drive search query string
    fn escape_query_value(value: &str) -> String {
        value.replace('\\', "\\\\").replace('\'', "\\'")
    }

    /// Current access token, refreshed through the OAuth2 refresh-token
    /// grant when the cached one is absent or about to expire
    async fn access_token(&self) -> Result<String, Error> {
        let mut guard = self.token.lock().await;
        if let Some(token) = guard.as_ref() {
            if token.expires_at > Instant::now() {
                return Ok(token.value.clone());
            }
        }

        debug!("Refreshing Drive access token");
        let params = [
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("refresh_token", self.refresh_token.as_str()),
            ("grant_type", "refresh_token"),
        ];
        let response = self
            .http
            .post(&self.token_uri)
            .form(&params)
            .send()
            .await
            .map_err(|e| {
                error!("Token refresh request failed: {}", e);
                ErrorInternalServerError("token refresh failed")
            })?;
        let token: TokenResponse = Self::parse_response(response, "token refresh").await?;

        let lifetime = Duration::from_secs(token.expires_in).saturating_sub(TOKEN_EXPIRY_MARGIN);
        *guard = Some(CachedToken {
            value: token.access_token.clone(),
            expires_at: Instant::now() + lifetime,
        });
        Ok(token.access_token)
    }

    /// Run a files.list query and map the resources into RemoteFile handles
    async fn list_query(&self, query: &str) -> Result<Vec<RemoteFile>, Error> {
        let token = self.access_token().await?;
        debug!("Drive files.list: {}", query);
        let response = self
            .http
            .get(FILES_URL)
            .bearer_auth(&token)
            .query(&[("q", query), ("fields", LIST_FIELDS)])
            .send()
            .await
            .map_err(|e| {
                error!("Drive files.list request failed: {}", e);
                ErrorInternalServerError("drive list failed")
            })?;
        let list: FileList = Self::parse_response(response, "files.list").await?;
        Ok(list
            .files
            .into_iter()
            .map(|f| RemoteFile {
                id: f.id,
                name: f.name,
                md5_checksum: f.md5_checksum,
            })
            .collect())
    }

    /// Check the status and deserialize the body, logging the remote error
    /// payload on failure
    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
        operation: &str,
    ) -> Result<T, Error> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Drive {} failed: {} {}", operation, status, body);
            return Err(ErrorInternalServerError(format!(
                "drive {} failed with status {}",
                operation, status
            )));
        }
        response.json::<T>().await.map_err(|e| {
            error!("Drive {} returned an invalid body: {}", operation, e);
            ErrorInternalServerError(format!("drive {} returned an invalid body", operation))
        })
    }
}

#[async_trait]
impl FileStore for DriveFileStore {
    async fn find_by_name(&self, folder_id: &str, name: &str) -> Result<Option<RemoteFile>, Error> {
        let query = format!(
            "name = '{}' and '{}' in parents and trashed = false",
            Self::escape_query_value(name),
            Self::escape_query_value(folder_id)
        );
        let mut files = self.list_query(&query).await?;
        if files.is_empty() {
            Ok(None)
        } else {
            Ok(Some(files.remove(0)))
        }
    }

    async fn list_json_files(&self, folder_id: &str) -> Result<Vec<RemoteFile>, Error> {
        let query = format!(
            "'{}' in parents and mimeType = 'application/json' and trashed = false",
            Self::escape_query_value(folder_id)
        );
        self.list_query(&query).await
    }

    async fn create_json(&self, folder_id: &str, name: &str, body: &Value) -> Result<RemoteFile, Error> {
        let token = self.access_token().await?;
        let metadata = serde_json::json!({
            "name": name,
            "parents": [folder_id],
            "mimeType": "application/json",
        });
        let response = self
            .http
            .post(FILES_URL)
            .bearer_auth(&token)
            .query(&[("fields", "id,name")])
            .json(&metadata)
            .send()
            .await
            .map_err(|e| {
                error!("Drive files.create request failed: {}", e);
                ErrorInternalServerError("drive create failed")
            })?;
        let created: FileResource = Self::parse_response(response, "files.create").await?;
        let file = RemoteFile {
            id: created.id,
            name: created.name,
            md5_checksum: created.md5_checksum,
        };

        // Content goes up in a second call over the fresh file id
        self.update_json(&file.id, body).await?;
        info!("Created {} as file id {}", name, file.id);
        Ok(file)
    }

    async fn update_json(&self, file_id: &str, body: &Value) -> Result<(), Error> {
        let token = self.access_token().await?;
        let payload = serde_json::to_vec(body).map_err(ErrorInternalServerError)?;
        let response = self
            .http
            .patch(format!("{}/{}", UPLOAD_URL, file_id))
            .bearer_auth(&token)
            .query(&[("uploadType", "media"), ("fields", "id,name")])
            .header("Content-Type", "application/json")
            .body(payload)
            .send()
            .await
            .map_err(|e| {
                error!("Drive media upload request failed: {}", e);
                ErrorInternalServerError("drive upload failed")
            })?;
        let _: Value = Self::parse_response(response, "files.update").await?;
        Ok(())
    }

    async fn read_json(&self, file_id: &str) -> Result<Value, Error> {
        let token = self.access_token().await?;
        let response = self
            .http
            .get(format!("{}/{}", FILES_URL, file_id))
            .bearer_auth(&token)
            .query(&[("alt", "media")])
            .send()
            .await
            .map_err(|e| {
                error!("Drive download request failed: {}", e);
                ErrorInternalServerError("drive download failed")
            })?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Drive download of {} failed: {} {}", file_id, status, body);
            return Err(ErrorInternalServerError(format!(
                "drive download failed with status {}",
                status
            )));
        }
        let content: bytes::Bytes = response.bytes().await.map_err(|e| {
            error!("Drive download of {} was cut short: {}", file_id, e);
            ErrorInternalServerError("drive download failed")
        })?;
        serde_json::from_slice(&content).map_err(|e| {
            error!("File {} is not valid JSON: {}", file_id, e);
            ErrorInternalServerError("stored file is not valid JSON")
        })
    }
}
