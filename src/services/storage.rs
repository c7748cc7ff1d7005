//! Document storage client (Appwrite-compatible bucket API)

use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;
use tracing::info;

use crate::error::{ApiError, Result};
use crate::services::config_loader::StorageConfig;
use crate::services::http::{FileUpload, HttpClient};

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StoredFile {
    #[serde(rename = "$id")]
    pub id: String,
}

pub struct DocumentStorage {
    http: Arc<dyn HttpClient>,
    endpoint: String,
    project_id: String,
    bucket_id: String,
    allowed_extensions: Vec<String>,
}

impl DocumentStorage {
    pub fn new(config: &StorageConfig, allowed_extensions: &[String], http: Arc<dyn HttpClient>) -> Self {
        Self {
            http,
            endpoint: config.endpoint.trim().trim_end_matches('/').to_string(),
            project_id: config.project_id.clone(),
            bucket_id: config.bucket_id.clone(),
            allowed_extensions: allowed_extensions
                .iter()
                .map(|ext| ext.trim().trim_start_matches('.').to_lowercase())
                .filter(|ext| !ext.is_empty())
                .collect(),
        }
    }

    pub fn allowed_extensions(&self) -> &[String] {
        &self.allowed_extensions
    }

    fn files_url(&self) -> String {
        format!("{}/storage/buckets/{}/files", self.endpoint, self.bucket_id)
    }

    pub fn preview_url(&self, file_id: &str) -> String {
        format!(
            "{}/{}/view?project={}",
            self.files_url(),
            file_id,
            self.project_id
        )
    }

    /// Rejects anything but the configured document types before touching the network.
    pub fn check_document(&self, path: &Path) -> Result<()> {
        let ext = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();
        if self.allowed_extensions.iter().any(|allowed| *allowed == ext) {
            return Ok(());
        }
        Err(ApiError::Validation {
            status: 0,
            message: format!(
                "Only {} files can be uploaded",
                self.allowed_extensions.join(", ")
            ),
        })
    }

    pub async fn upload(&self, path: &Path) -> Result<StoredFile> {
        self.check_document(path)?;

        let bytes = std::fs::read(path)
            .map_err(|e| ApiError::Network(format!("Failed to read {}: {e}", path.display())))?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document".to_string());
        let upload = FileUpload {
            mime: mime_guess::from_path(path)
                .first_or_octet_stream()
                .essence_str()
                .to_string(),
            file_name,
            bytes,
        };

        let response = self
            .http
            .post_multipart(
                &self.files_url(),
                &[("X-Appwrite-Project", self.project_id.as_str())],
                &[("fileId", "unique()")],
                upload,
            )
            .await?;
        if !response.is_success() {
            return Err(ApiError::from_status(response.status, &response.body));
        }

        let stored: StoredFile = serde_json::from_str(&response.body).map_err(ApiError::decode)?;
        info!("Uploaded {} as {}", path.display(), stored.id);
        Ok(stored)
    }
}
