//! Application State Management
//!
//! This module provides the application state that contains the log
//! service and its store backend, following the dependency injection
//! pattern.

use std::sync::Arc;
use log::info;

use crate::config::{AppConfig, StoreBackend};
use crate::drive::FileStore;
use crate::drive::client::DriveFileStore;
use crate::drive::mock_store::MockFileStore;
use crate::service::log_service::LogService;

/// Application state containing the log service and its dependencies
#[derive(Clone)]
pub struct AppState {
    pub log_service: Arc<LogService>,
    pub config: AppConfig,
}

impl AppState {
    /// Create application state from configuration
    pub fn from_config(config: AppConfig) -> Self {
        info!("Initializing application state");

        let store: Arc<dyn FileStore> = match config.drive.backend {
            StoreBackend::Drive => {
                info!("Using Google Drive backend with folder id: {}", config.drive.folder_id);
                Arc::new(DriveFileStore::new(&config.drive))
            }
            StoreBackend::Mock => {
                info!("Using mock file-store backend");
                Arc::new(MockFileStore::new())
            }
        };

        let log_service = Arc::new(LogService::new(store, config.drive.folder_id.clone()));

        Self { log_service, config }
    }

    /// Create application state for testing with a mock backend
    pub fn new_for_testing() -> Self {
        Self::new_for_testing_with_store(Arc::new(MockFileStore::new()))
    }

    /// Create application state for testing over a caller-provided store,
    /// so tests can seed files directly
    pub fn new_for_testing_with_store(store: Arc<dyn FileStore>) -> Self {
        let mut config = AppConfig::default();
        config.drive.backend = StoreBackend::Mock;
        config.drive.folder_id = "test-folder".to_string();
        config.auth.api_key = "test-api-key".to_string();

        let log_service = Arc::new(LogService::new(store, config.drive.folder_id.clone()));

        Self { log_service, config }
    }
}
