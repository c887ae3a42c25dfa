// ABOUTME: Element groups: named sets of field -> LocatorPath applied together to one document.
// ABOUTME: Field failures are recorded per field; extraction itself never fails.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use tracing::warn;

use crate::dom::HtmlTree;
use crate::error::{ErrorCode, Web2ApiError};
use crate::matcher::{MatchResult, PathMatcher};
use crate::path::{LocatorPath, ParseMode};
use crate::similarity::Similarity;

/// A field whose definition could not be used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub code: ErrorCode,
    pub message: String,
}

impl FieldError {
    fn from_error(field: &str, err: &Web2ApiError) -> Self {
        Self {
            field: field.to_string(),
            code: err.code,
            message: err.to_string(),
        }
    }
}

/// A named mapping of field name to locator path (an "item page").
#[derive(Debug, Clone, Default)]
pub struct ElementGroup {
    id: String,
    fields: HashMap<String, LocatorPath>,
    errors: Vec<FieldError>,
}

impl ElementGroup {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    /// Builds a group from raw path strings. Paths rejected by `mode` are
    /// kept as field errors; the other fields are unaffected.
    pub fn from_raw<I, K, V>(id: impl Into<String>, raw: I, mode: ParseMode) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: AsRef<str>,
    {
        let mut group = Self::new(id);
        for (field, path) in raw {
            let field = field.into();
            match LocatorPath::parse_with(path.as_ref(), mode) {
                Ok(path) => group.insert(field, path),
                Err(err) => {
                    warn!(group = %group.id, field = %field, error = %err, "skipping field");
                    group.errors.push(FieldError::from_error(&field, &err));
                }
            }
        }
        group
    }

    pub fn insert(&mut self, field: impl Into<String>, path: LocatorPath) {
        self.fields.insert(field.into(), path);
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn path(&self, field: &str) -> Option<&LocatorPath> {
        self.fields.get(field)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &LocatorPath)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Field definitions that failed to build.
    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    /// Runs every field's path against `tree`.
    pub fn extract<S: Similarity>(
        &self,
        tree: &HtmlTree,
        matcher: &PathMatcher<'_, S>,
    ) -> Extraction {
        let fields = self
            .fields
            .iter()
            .map(|(name, path)| (name.clone(), matcher.find_all(tree, path)))
            .collect();
        Extraction {
            fields,
            errors: self.errors.clone(),
        }
    }
}

/// Per-field matches from one document plus the group's field errors.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Extraction {
    pub fields: HashMap<String, Vec<MatchResult>>,
    pub errors: Vec<FieldError>,
}

/// A resolved field value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldValue {
    pub value: Option<String>,
    pub trust: f64,
}

impl Extraction {
    pub fn matches(&self, field: &str) -> &[MatchResult] {
        self.fields.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Resolves each match to its field's target value. Fields are ordered
    /// by name; matches keep document order.
    pub fn resolve(
        &self,
        tree: &HtmlTree,
        group: &ElementGroup,
    ) -> BTreeMap<String, Vec<FieldValue>> {
        self.fields
            .iter()
            .map(|(name, matches)| {
                let target = group.path(name).and_then(LocatorPath::target);
                let values = matches
                    .iter()
                    .map(|m| FieldValue {
                        value: tree.resolve(m.node, target),
                        trust: m.trust,
                    })
                    .collect();
                (name.clone(), values)
            })
            .collect()
    }
}
