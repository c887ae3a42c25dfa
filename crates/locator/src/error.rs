// ABOUTME: Error types for web2api including the ErrorCode enum and the Web2ApiError struct.
// ABOUTME: Provides categorized errors with convenience constructors and boolean helpers.

use std::fmt;

/// Error codes representing the categories of failure.
///
/// Only configuration, lookup and transport problems are errors. A match that
/// finds nothing is an empty result, never an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    MalformedPath,
    InvalidTrustModel,
    InvalidConfig,
    NoHost,
    UnknownPage,
    Fetch,
    Io,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorCode::MalformedPath => "malformed locator path",
            ErrorCode::InvalidTrustModel => "invalid trust model",
            ErrorCode::InvalidConfig => "invalid host config",
            ErrorCode::NoHost => "no host found",
            ErrorCode::UnknownPage => "unknown page",
            ErrorCode::Fetch => "fetch error",
            ErrorCode::Io => "io error",
        };
        write!(f, "{}", s)
    }
}

/// The main error type.
///
/// `subject` names what the operation was applied to: a path string, a file,
/// a domain or a URL depending on the code.
#[derive(Debug, thiserror::Error)]
pub struct Web2ApiError {
    pub code: ErrorCode,
    pub subject: String,
    pub op: String,
    #[source]
    pub source: Option<anyhow::Error>,
}

impl fmt::Display for Web2ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "web2api: {} {}: {}", self.op, self.subject, self.code)?;
        if let Some(ref src) = self.source {
            write!(f, ": {}", src)?;
        }
        Ok(())
    }
}

pub type Result<T, E = Web2ApiError> = std::result::Result<T, E>;

impl Web2ApiError {
    fn new(
        code: ErrorCode,
        subject: impl Into<String>,
        op: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self {
            code,
            subject: subject.into(),
            op: op.into(),
            source,
        }
    }

    /// Create a MalformedPath error.
    pub fn malformed_path(
        path: impl Into<String>,
        op: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self::new(ErrorCode::MalformedPath, path, op, source)
    }

    /// Create an InvalidTrustModel error.
    pub fn invalid_trust_model(op: impl Into<String>, source: Option<anyhow::Error>) -> Self {
        Self::new(ErrorCode::InvalidTrustModel, "rating", op, source)
    }

    /// Create an InvalidConfig error.
    pub fn invalid_config(
        subject: impl Into<String>,
        op: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self::new(ErrorCode::InvalidConfig, subject, op, source)
    }

    /// Create a NoHost error.
    pub fn no_host(
        domain: impl Into<String>,
        op: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self::new(ErrorCode::NoHost, domain, op, source)
    }

    /// Create an UnknownPage error.
    pub fn unknown_page(
        page_id: impl Into<String>,
        op: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self::new(ErrorCode::UnknownPage, page_id, op, source)
    }

    /// Create a Fetch error.
    pub fn fetch(
        url: impl Into<String>,
        op: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self::new(ErrorCode::Fetch, url, op, source)
    }

    /// Create an Io error.
    pub fn io(
        path: impl Into<String>,
        op: impl Into<String>,
        source: Option<anyhow::Error>,
    ) -> Self {
        Self::new(ErrorCode::Io, path, op, source)
    }

    /// Returns true if this is a MalformedPath error.
    pub fn is_malformed_path(&self) -> bool {
        self.code == ErrorCode::MalformedPath
    }

    /// Returns true if this is an InvalidTrustModel error.
    pub fn is_invalid_trust_model(&self) -> bool {
        self.code == ErrorCode::InvalidTrustModel
    }

    /// Returns true if this is an InvalidConfig error.
    pub fn is_invalid_config(&self) -> bool {
        self.code == ErrorCode::InvalidConfig
    }

    /// Returns true if this is a NoHost error.
    pub fn is_no_host(&self) -> bool {
        self.code == ErrorCode::NoHost
    }

    /// Returns true if this is an UnknownPage error.
    pub fn is_unknown_page(&self) -> bool {
        self.code == ErrorCode::UnknownPage
    }

    /// Returns true if this is a Fetch error.
    pub fn is_fetch(&self) -> bool {
        self.code == ErrorCode::Fetch
    }

    /// Returns true if this is an Io error.
    pub fn is_io(&self) -> bool {
        self.code == ErrorCode::Io
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_op_subject_code_and_source() {
        let err = Web2ApiError::malformed_path(
            "garbage",
            "ParsePath",
            Some(anyhow::anyhow!("no segment at offset 0")),
        );
        assert_eq!(
            err.to_string(),
            "web2api: ParsePath garbage: malformed locator path: no segment at offset 0"
        );
    }

    #[test]
    fn display_without_source() {
        let err = Web2ApiError::no_host("example.com", "Query", None);
        assert_eq!(err.to_string(), "web2api: Query example.com: no host found");
    }

    #[test]
    fn predicates_follow_code() {
        assert!(Web2ApiError::invalid_trust_model("Build", None).is_invalid_trust_model());
        assert!(Web2ApiError::invalid_config("a.host.config", "Load", None).is_invalid_config());
        assert!(Web2ApiError::unknown_page("p", "Query", None).is_unknown_page());
        assert!(Web2ApiError::fetch("http://x", "Fetch", None).is_fetch());
        assert!(Web2ApiError::io("/tmp", "ReadDir", None).is_io());
        assert!(!Web2ApiError::io("/tmp", "ReadDir", None).is_fetch());
    }
}
