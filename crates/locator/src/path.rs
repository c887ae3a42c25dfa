// ABOUTME: Locator path grammar: parses `<target><tag>id,class<tag>id,class...` strings.
// ABOUTME: Provides LocatorPath, PathSegment and the strict/permissive ParseMode switch.

//! Locator paths.
//!
//! A locator path describes an element by its own tag, id and class and by
//! those of its ancestors, nearest first:
//!
//! ```text
//! <href><a>,product-link<li>,item<ul>results,list
//! ```
//!
//! The optional leading `<href>` is the *target*: what to pull out of the
//! matched element (an attribute name, or `text` / `html`). Every following
//! `<tag>id,class` is one [`PathSegment`]. Segment 0 is the anchor.
//!
//! A leading bracketed token counts as a target only when it is directly
//! followed by another `<` or by the end of input. Paths recorded from a live
//! page carry no target at all, so `<div>item-title,` is a single segment.

use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Result, Web2ApiError};

static TARGET_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^<([A-Za-z0-9_:-]+)>").unwrap());
static SEGMENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^<([A-Za-z0-9-]*)>([^<,]*),([^<]*)").unwrap());

/// How tolerant path parsing is.
///
/// `Permissive` never fails: anything it cannot classify ends the parse and is
/// dropped. `Strict` rejects empty input, unclassifiable leading content and
/// trailing text after the last segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseMode {
    #[default]
    Permissive,
    Strict,
}

/// One ancestor level of a locator path.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PathSegment {
    pub tag: String,
    pub id_pattern: String,
    pub class_pattern: String,
}

impl PathSegment {
    pub fn new(
        tag: impl Into<String>,
        id_pattern: impl Into<String>,
        class_pattern: impl Into<String>,
    ) -> Self {
        Self {
            tag: tag.into(),
            id_pattern: id_pattern.into(),
            class_pattern: class_pattern.into(),
        }
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>{},{}", self.tag, self.id_pattern, self.class_pattern)
    }
}

/// A parsed locator path. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LocatorPath {
    target: Option<String>,
    segments: Vec<PathSegment>,
}

impl LocatorPath {
    /// Builds a path from already-split parts.
    pub fn new(target: Option<String>, segments: Vec<PathSegment>) -> Self {
        Self { target, segments }
    }

    /// Parses a path permissively.
    pub fn parse(input: &str) -> Self {
        match Self::parse_with(input, ParseMode::Permissive) {
            Ok(path) => path,
            // permissive parsing has no failure branch
            Err(_) => Self::default(),
        }
    }

    /// Parses a path in the given mode.
    pub fn parse_with(input: &str, mode: ParseMode) -> Result<Self> {
        let mut rest = input;
        let mut target = None;

        if let Some(caps) = TARGET_RE.captures(rest) {
            let end = caps.get(0).map_or(0, |m| m.end());
            let after = &rest[end..];
            if after.is_empty() || after.starts_with('<') {
                target = Some(caps[1].to_string());
                rest = after;
            }
        }

        let mut segments = Vec::new();
        while let Some(caps) = SEGMENT_RE.captures(rest) {
            let end = caps.get(0).map_or(rest.len(), |m| m.end());
            segments.push(PathSegment::new(&caps[1], &caps[2], &caps[3]));
            rest = &rest[end..];
        }

        if mode == ParseMode::Strict {
            if input.is_empty() {
                return Err(Web2ApiError::malformed_path(
                    input,
                    "ParsePath",
                    Some(anyhow::anyhow!("empty path")),
                ));
            }
            if target.is_none() && segments.is_empty() {
                return Err(Web2ApiError::malformed_path(
                    input,
                    "ParsePath",
                    Some(anyhow::anyhow!(
                        "leading content is neither a target nor a segment"
                    )),
                ));
            }
            if !rest.is_empty() {
                let offset = input.len() - rest.len();
                return Err(Web2ApiError::malformed_path(
                    input,
                    "ParsePath",
                    Some(anyhow::anyhow!("unparsed text at offset {}", offset)),
                ));
            }
        }

        Ok(Self { target, segments })
    }

    /// What the path extracts, if it names anything.
    pub fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }

    /// Segments, anchor first.
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// The segment closest to the target.
    pub fn anchor(&self) -> Option<&PathSegment> {
        self.segments.first()
    }

    /// Number of segments; the depth the path expects.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// True if the path has no segments and can never match.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

impl fmt::Display for LocatorPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ref target) = self.target {
            write!(f, "<{}>", target)?;
        }
        for segment in &self.segments {
            write!(f, "{}", segment)?;
        }
        Ok(())
    }
}

impl FromStr for LocatorPath {
    type Err = Web2ApiError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse_with(s, ParseMode::Permissive)
    }
}
