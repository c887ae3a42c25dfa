// ABOUTME: SearchableHost: one configured site with its trust model, item pages and display pages.
// ABOUTME: Answers page queries by fetching (or taking) HTML and running the locator paths on it.

pub mod config;

pub use config::{DisplayPageConfig, HostConfig, ItemPageConfig};

use std::collections::{BTreeMap, HashMap};

use reqwest::Method;
use serde::Serialize;
use tracing::{debug, info, warn};
use url::Url;

use crate::dom::HtmlTree;
use crate::error::{Result, Web2ApiError};
use crate::group::{ElementGroup, FieldError, FieldValue};
use crate::matcher::{MatchResult, PathMatcher};
use crate::path::{LocatorPath, ParseMode};
use crate::session::Session;
use crate::trust::TrustModel;

/// A page holding one item's fields.
#[derive(Debug, Clone)]
struct ItemPage {
    pathname: String,
    group: ElementGroup,
}

/// A page listing links to items, with an optional next-page link.
#[derive(Debug, Clone)]
struct DisplayPage {
    action: String,
    method: Method,
    args: String,
    item_uri: LocatorPath,
    next_uri: LocatorPath,
    item_id: String,
}

#[derive(Debug, Clone)]
enum Page {
    Item(ItemPage),
    Display(DisplayPage),
}

/// Fields extracted from an item page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemRecord {
    pub page: String,
    pub url: String,
    pub fields: BTreeMap<String, Vec<FieldValue>>,
    pub errors: Vec<FieldError>,
}

/// Links extracted from a display page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplayListing {
    pub page: String,
    pub url: String,
    /// Item page the listed links lead to.
    pub item_page: String,
    pub items: Vec<String>,
    pub next_page: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QueryResult {
    Item(ItemRecord),
    Display(DisplayListing),
}

/// A configured site.
#[derive(Debug, Clone)]
pub struct SearchableHost {
    base_url: String,
    domain: String,
    cache_limit: u64,
    cache_timeout: f64,
    model: TrustModel,
    pages: HashMap<String, Page>,
}

impl SearchableHost {
    pub fn from_config(config: HostConfig) -> Result<Self> {
        let base_url = normalize_base_url(&config.base_url);
        let domain = Url::parse(&base_url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
            .ok_or_else(|| {
                Web2ApiError::invalid_config(
                    &config.base_url,
                    "BuildHost",
                    Some(anyhow::anyhow!("base_url has no host")),
                )
            })?;
        let model = TrustModel::from_value(&config.rating)?;

        let mut pages = HashMap::new();
        for item in config.item_pages {
            let group = ElementGroup::from_raw(&item.id, item.elements, config.path_mode);
            let page = Page::Item(ItemPage {
                pathname: item.pathname,
                group,
            });
            insert_page(&domain, &mut pages, item.id, page);
        }
        for display in config.display_pages {
            let page = Page::Display(DisplayPage {
                method: parse_method(&display)?,
                item_uri: parse_display_path(&display, &display.item_uri, config.path_mode)?,
                next_uri: parse_display_path(&display, &display.next_uri, config.path_mode)?,
                action: display.action,
                args: display.args,
                item_id: display.item_id,
            });
            insert_page(&domain, &mut pages, display.id, page);
        }

        info!(domain = %domain, pages = pages.len(), "loaded host");
        Ok(Self {
            base_url,
            domain,
            cache_limit: config.cache_limit,
            cache_timeout: config.cache_timeout,
            model,
            pages,
        })
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Self::from_config(HostConfig::from_json(json)?)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn cache_limit(&self) -> u64 {
        self.cache_limit
    }

    pub fn cache_timeout(&self) -> f64 {
        self.cache_timeout
    }

    pub fn model(&self) -> &TrustModel {
        &self.model
    }

    /// Ids of every page this host answers for, sorted.
    pub fn page_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.pages.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// Fetches page `page_id` and extracts from it.
    pub async fn query(&self, session: &Session, page_id: &str) -> Result<QueryResult> {
        let page = self.page(page_id)?;
        let (method, url, form) = match page {
            Page::Item(item) => (Method::GET, join_url(&self.base_url, &item.pathname), None),
            Page::Display(display) => {
                let url = join_url(&self.base_url, &display.action);
                if display.method == Method::POST {
                    (Method::POST, url, Some(display.args.as_str()))
                } else {
                    (Method::GET, with_query(url, &display.args), None)
                }
            }
        };

        debug!(domain = %self.domain, page = page_id, url = %url, "querying page");
        let response = session.fetch(method, &url, form).await?;
        self.query_html(page_id, &response.final_url, &response.text())
    }

    /// Extracts from already fetched HTML. `page_url` is the address the HTML
    /// came from and resolves relative links.
    pub fn query_html(&self, page_id: &str, page_url: &str, html: &str) -> Result<QueryResult> {
        let page = self.page(page_id)?;
        let tree = HtmlTree::parse_document(html);
        let matcher = PathMatcher::new(&self.model);

        let result = match page {
            Page::Item(item) => {
                let extraction = item.group.extract(&tree, &matcher);
                QueryResult::Item(ItemRecord {
                    page: page_id.to_string(),
                    url: page_url.to_string(),
                    fields: extraction.resolve(&tree, &item.group),
                    errors: extraction.errors,
                })
            }
            Page::Display(display) => {
                let base = Url::parse(page_url).ok();
                let link = |m: &MatchResult, path: &LocatorPath| {
                    let value = tree.resolve(m.node, path.target())?;
                    if is_attribute_target(path.target()) {
                        Some(absolutize(base.as_ref(), value))
                    } else {
                        Some(value)
                    }
                };

                let items = matcher
                    .find_all(&tree, &display.item_uri)
                    .iter()
                    .filter_map(|m| link(m, &display.item_uri))
                    .collect();
                let next_page = best_match(&matcher.find_all(&tree, &display.next_uri))
                    .and_then(|m| link(m, &display.next_uri));

                QueryResult::Display(DisplayListing {
                    page: page_id.to_string(),
                    url: page_url.to_string(),
                    item_page: display.item_id.clone(),
                    items,
                    next_page,
                })
            }
        };
        Ok(result)
    }

    fn page(&self, page_id: &str) -> Result<&Page> {
        self.pages.get(page_id).ok_or_else(|| {
            Web2ApiError::unknown_page(
                page_id,
                "Query",
                Some(anyhow::anyhow!("host {} has no such page", self.domain)),
            )
        })
    }
}

fn insert_page(domain: &str, pages: &mut HashMap<String, Page>, id: String, page: Page) {
    if pages.contains_key(&id) {
        warn!(domain = %domain, page = %id, "duplicate page id, keeping the first");
        return;
    }
    pages.insert(id, page);
}

fn parse_method(display: &DisplayPageConfig) -> Result<Method> {
    match display.method.to_ascii_uppercase().as_str() {
        "GET" => Ok(Method::GET),
        "POST" => Ok(Method::POST),
        other => Err(Web2ApiError::invalid_config(
            &display.id,
            "BuildHost",
            Some(anyhow::anyhow!("unsupported method {}", other)),
        )),
    }
}

fn parse_display_path(
    display: &DisplayPageConfig,
    raw: &str,
    mode: ParseMode,
) -> Result<LocatorPath> {
    LocatorPath::parse_with(raw, mode)
        .map_err(|e| Web2ApiError::invalid_config(&display.id, "BuildHost", Some(e.into())))
}

fn normalize_base_url(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("http://{}", trimmed)
    }
}

fn join_url(base: &str, path: &str) -> String {
    if path.is_empty() || path.starts_with('/') {
        format!("{}{}", base, path)
    } else {
        format!("{}/{}", base, path)
    }
}

fn with_query(url: String, args: &str) -> String {
    let args = args.trim_start_matches('?');
    if args.is_empty() {
        url
    } else if url.contains('?') {
        format!("{}&{}", url, args)
    } else {
        format!("{}?{}", url, args)
    }
}

/// Only attribute values (`href`, `src`, ...) can be links; `text` and
/// `html` targets, and a missing target, are kept as extracted.
fn is_attribute_target(target: Option<&str>) -> bool {
    matches!(target, Some(t) if t != "text" && t != "html")
}

fn absolutize(base: Option<&Url>, value: String) -> String {
    match base.map(|b| b.join(&value)) {
        Some(Ok(joined)) => joined.to_string(),
        _ => value,
    }
}

/// Highest-trust match; the earliest in document order wins ties.
fn best_match(matches: &[MatchResult]) -> Option<&MatchResult> {
    matches.iter().fold(None, |best: Option<&MatchResult>, m| match best {
        Some(b) if b.trust >= m.trust => Some(b),
        _ => Some(m),
    })
}
