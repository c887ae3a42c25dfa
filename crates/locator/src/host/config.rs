// ABOUTME: Serde model of a `.host.config` file: base URL, rating, item and display pages.
// ABOUTME: Only shape is checked here; SearchableHost validates paths and the trust model.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, Web2ApiError};
use crate::path::ParseMode;

pub const DEFAULT_CACHE_LIMIT: u64 = 0;
pub const DEFAULT_CACHE_TIMEOUT: f64 = 0.0;

/// One host configuration file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostConfig {
    pub base_url: String,
    /// Cache size in MB.
    #[serde(default)]
    pub cache_limit: u64,
    /// Cache entry lifetime in seconds.
    #[serde(default)]
    pub cache_timeout: f64,
    #[serde(default)]
    pub path_mode: ParseMode,
    /// Trust model parameters, validated when the host is built.
    pub rating: serde_json::Value,
    pub item_pages: Vec<ItemPageConfig>,
    pub display_pages: Vec<DisplayPageConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemPageConfig {
    pub id: String,
    pub pathname: String,
    /// Field name to locator path.
    pub elements: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayPageConfig {
    pub id: String,
    pub action: String,
    #[serde(default = "default_method")]
    pub method: String,
    /// Query string for GET, form body for POST.
    #[serde(default)]
    pub args: String,
    pub item_uri: String,
    pub next_uri: String,
    /// Item page used for the listed links.
    pub item_id: String,
}

fn default_method() -> String {
    "GET".to_string()
}

impl HostConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| Web2ApiError::invalid_config("host config", "ParseConfig", Some(e.into())))
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            Web2ApiError::io(path.display().to_string(), "ReadConfig", Some(e.into()))
        })?;
        serde_json::from_str(&json).map_err(|e| {
            Web2ApiError::invalid_config(path.display().to_string(), "ParseConfig", Some(e.into()))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_fill_optional_keys() {
        let config = HostConfig::from_json(
            r#"{
                "base_url": "shop.example.com",
                "rating": {"depth_decay": 1.0},
                "item_pages": [],
                "display_pages": [{
                    "id": "search",
                    "action": "/search",
                    "item_uri": "<href><a>,result",
                    "next_uri": "<href><a>next,",
                    "item_id": "product"
                }]
            }"#,
        )
        .unwrap();
        assert_eq!(config.cache_limit, DEFAULT_CACHE_LIMIT);
        assert_eq!(config.cache_timeout, DEFAULT_CACHE_TIMEOUT);
        assert_eq!(config.path_mode, ParseMode::Permissive);
        assert_eq!(config.display_pages[0].method, "GET");
        assert_eq!(config.display_pages[0].args, "");
    }

    #[test]
    fn missing_required_key_is_invalid_config() {
        let err = HostConfig::from_json(r#"{"base_url": "x", "item_pages": [], "display_pages": []}"#)
            .unwrap_err();
        assert!(err.is_invalid_config());
        assert!(err.to_string().contains("rating"), "{}", err);
    }

    #[test]
    fn unreadable_file_is_io() {
        let dir = tempfile::tempdir().unwrap();
        let err = HostConfig::from_file(&dir.path().join("absent.host.config")).unwrap_err();
        assert!(err.is_io());
    }
}
