use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::info;

use crate::models::{FieldKind, FieldTypeMap, SelectOption};

pub const CONFIG_PATH_ENV: &str = "REGDESK_CONFIG";
pub const API_URL_ENV: &str = "NEXT_PUBLIC_API_URL";

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_api_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_api_url(),
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds.max(1))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_storage_endpoint")]
    pub endpoint: String,
    #[serde(default)]
    pub project_id: String,
    #[serde(default = "default_bucket_id")]
    pub bucket_id: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            endpoint: default_storage_endpoint(),
            project_id: String::new(),
            bucket_id: default_bucket_id(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FormConfig {
    /// Options offered by every select-kind additional field.
    #[serde(default = "default_select_options")]
    pub select_options: Vec<SelectOption>,
    /// Extra backend type identifiers on top of the built-in table.
    #[serde(default)]
    pub field_types: HashMap<String, FieldKind>,
    #[serde(default = "default_document_extensions")]
    pub document_extensions: Vec<String>,
}

impl Default for FormConfig {
    fn default() -> Self {
        Self {
            select_options: default_select_options(),
            field_types: HashMap::new(),
            document_extensions: default_document_extensions(),
        }
    }
}

impl FormConfig {
    pub fn field_type_map(&self) -> FieldTypeMap {
        FieldTypeMap::with_overrides(&self.field_types)
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct RegdeskConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub form: FormConfig,
    /// Where the `accessToken` cookie file lives.
    #[serde(default)]
    pub session_file: Option<PathBuf>,
}

impl RegdeskConfig {
    pub fn session_path(&self) -> PathBuf {
        self.session_file
            .clone()
            .unwrap_or_else(|| PathBuf::from(".regdesk").join("session"))
    }

    /// Environment values win over the file.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(API_URL_ENV).filter(|url| !url.trim().is_empty()) {
            info!("API base URL overridden by {}", API_URL_ENV);
            self.api.base_url = url.trim().to_string();
        }
    }
}

fn default_api_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_timeout_seconds() -> u64 {
    30
}

fn default_storage_endpoint() -> String {
    "http://localhost/v1".to_string()
}

fn default_bucket_id() -> String {
    "participant-documents".to_string()
}

fn default_select_options() -> Vec<SelectOption> {
    vec![
        SelectOption::new("smart-city", "Smart City"),
        SelectOption::new("health", "Health"),
        SelectOption::new("education", "Education"),
        SelectOption::new("environment", "Environment"),
        SelectOption::new("finance", "Finance"),
    ]
}

fn default_document_extensions() -> Vec<String> {
    vec!["pdf".to_string()]
}

pub fn default_config_path() -> PathBuf {
    std::env::var(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("regdesk.toml"))
}

pub fn load_regdesk_config(config_path: &Path) -> Result<RegdeskConfig> {
    if !config_path.exists() {
        info!(
            "{} not found, using defaults",
            config_path.display()
        );
        return Ok(RegdeskConfig::default());
    }

    let raw = fs::read_to_string(config_path)
        .with_context(|| format!("Failed to read {}", config_path.display()))?;

    toml::from_str::<RegdeskConfig>(&raw)
        .with_context(|| format!("Failed to parse {}", config_path.display()))
}
