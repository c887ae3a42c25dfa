// ABOUTME: HostRegistry: loads `.host.config` files from a directory and routes requests by domain.
// ABOUTME: Invalid files are logged and skipped; duplicate domains keep the first host loaded.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use url::Url;

use crate::error::{Result, Web2ApiError};
use crate::host::{HostConfig, QueryResult, SearchableHost};
use crate::session::Session;

/// File extension of host configuration files.
pub const DEFAULT_HOST_FILE_EXT: &str = ".host.config";

/// A page query: which site, which page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    /// Host name or URL of the site, e.g. `shop.example.com`.
    pub hostname: String,
    /// Page id within the host.
    pub id: String,
}

impl Request {
    pub fn new(hostname: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            id: id.into(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct HostRegistry {
    hosts: HashMap<String, SearchableHost>,
}

impl HostRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads every file in `dir` whose name ends in `ext`. Returns the number
    /// of hosts added.
    pub fn load_dir(&mut self, dir: &Path, ext: &str) -> Result<usize> {
        let entries = fs::read_dir(dir).map_err(|e| {
            Web2ApiError::io(dir.display().to_string(), "LoadHosts", Some(e.into()))
        })?;

        let mut paths: Vec<_> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.is_file())
            .filter(|p| {
                p.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.ends_with(ext))
            })
            .collect();
        paths.sort();

        let mut added = 0;
        for path in paths {
            match HostConfig::from_file(&path).and_then(SearchableHost::from_config) {
                Ok(host) => {
                    if self.insert(host) {
                        added += 1;
                    }
                }
                Err(err) => {
                    error!(file = %path.display(), error = %err, "skipping host config");
                }
            }
        }

        info!(dir = %dir.display(), added, total = self.hosts.len(), "loaded host configs");
        Ok(added)
    }

    /// Adds `host` unless its domain is already registered. Returns whether
    /// it was added.
    pub fn insert(&mut self, host: SearchableHost) -> bool {
        let domain = host.domain().to_string();
        if self.hosts.contains_key(&domain) {
            warn!(domain = %domain, "duplicate host config, keeping the first");
            return false;
        }
        self.hosts.insert(domain, host);
        true
    }

    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }

    /// Host registered for `hostname`, which may be a bare host or a URL.
    pub fn host(&self, hostname: &str) -> Result<&SearchableHost> {
        if self.hosts.is_empty() {
            return Err(Web2ApiError::no_host(
                hostname,
                "Lookup",
                Some(anyhow::anyhow!("no hosts loaded")),
            ));
        }
        let domain = domain_of(hostname).ok_or_else(|| {
            Web2ApiError::no_host(hostname, "Lookup", Some(anyhow::anyhow!("not a host name")))
        })?;
        self.hosts
            .get(&domain)
            .ok_or_else(|| Web2ApiError::no_host(domain, "Lookup", None))
    }

    pub async fn query(&self, session: &Session, request: &Request) -> Result<QueryResult> {
        let host = self.host(&request.hostname)?;
        info!(domain = %host.domain(), page = %request.id, "found host for request");
        host.query(session, &request.id).await
    }
}

fn domain_of(hostname: &str) -> Option<String> {
    let hostname = hostname.trim();
    let url = if hostname.contains("://") {
        Url::parse(hostname)
    } else {
        Url::parse(&format!("http://{}", hostname))
    };
    url.ok()?.host_str().map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn host(base_url: &str) -> SearchableHost {
        SearchableHost::from_json(&format!(
            r#"{{
                "base_url": "{}",
                "rating": {{"depth_decay": 1.0, "id_weight": 0.5, "class_weight": 0.5,
                            "rampup_span": 1.0, "accept_threshold": 0.1}},
                "item_pages": [],
                "display_pages": []
            }}"#,
            base_url
        ))
        .unwrap()
    }

    #[test]
    fn empty_registry_has_no_host() {
        let registry = HostRegistry::new();
        assert!(registry.host("shop.example.com").unwrap_err().is_no_host());
    }

    #[test]
    fn lookup_accepts_bare_hosts_and_urls() {
        let mut registry = HostRegistry::new();
        assert!(registry.insert(host("shop.example.com")));
        assert!(registry.host("shop.example.com").is_ok());
        assert!(registry.host("https://SHOP.example.com/search?q=1").is_ok());
        assert!(registry.host("other.example.com").unwrap_err().is_no_host());
    }

    #[test]
    fn duplicate_domains_keep_the_first() {
        let mut registry = HostRegistry::new();
        assert!(registry.insert(host("http://shop.example.com")));
        assert!(!registry.insert(host("https://shop.example.com/v2")));
        assert_eq!(registry.len(), 1);
        assert_eq!(
            registry.host("shop.example.com").unwrap().base_url(),
            "http://shop.example.com"
        );
    }

    #[test]
    fn unreadable_dir_is_io() {
        let dir = tempfile::tempdir().unwrap();
        let err = HostRegistry::new()
            .load_dir(&dir.path().join("missing"), DEFAULT_HOST_FILE_EXT)
            .unwrap_err();
        assert!(err.is_io());
    }
}
