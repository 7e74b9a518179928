//! Configuration Management
//!
//! Base URL, default headers and registered record types, with persistent
//! storage in the user config directory.

use crate::network::Headers;
use crate::store::{Store, TypeDescriptor, TypeRegistry};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Media type of JSON:API documents
pub const JSONAPI_MEDIA_TYPE: &str = "application/vnd.api+json";

fn default_base_url() -> String {
    "/".to_string()
}

fn default_headers() -> Headers {
    Headers::from([("content-type".to_string(), JSONAPI_MEDIA_TYPE.to_string())])
}

/// Client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Prefix for relative request URLs
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Headers sent with every request
    #[serde(default = "default_headers")]
    pub default_headers: Headers,
    /// Record types known to stores built from this config
    #[serde(default)]
    pub types: Vec<TypeDescriptor>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            default_headers: default_headers(),
            types: Vec::new(),
        }
    }
}

impl Config {
    /// Get the config file path
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("jsonapi-store").join("config.json"))
    }

    /// Load configuration from disk
    pub fn load() -> Self {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    /// Load configuration from a specific file, falling back to defaults
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                tracing::warn!("Ignoring invalid config {:?}: {}", path, e);
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        let Some(path) = Self::config_path() else {
            return Ok(());
        };
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Create parent directory
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {:?}", parent))?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content).with_context(|| format!("Failed to write {:?}", path))?;

        Ok(())
    }

    /// Set base URL and save
    pub fn set_base_url(&mut self, base_url: &str) -> Result<()> {
        self.base_url = base_url.to_string();
        self.save()
    }

    /// Add or replace a default header
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.default_headers
            .insert(name.to_lowercase(), value.to_string());
        self
    }

    /// Registry built from the configured types
    pub fn registry(&self) -> TypeRegistry {
        self.types.iter().cloned().collect()
    }

    /// Empty store knowing the configured types
    pub fn store(&self) -> Store {
        Store::with_registry(self.registry())
    }

    /// Prefix a relative URL with the base URL; absolute URLs pass through
    pub fn prefix_url(&self, url: &str) -> String {
        if url::Url::parse(url).is_ok() {
            return url.to_string();
        }

        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            url.trim_start_matches('/')
        )
    }
}
