// ABOUTME: HTTP session used to fetch host pages: cookies, basic auth, headers and timeouts.
// ABOUTME: SessionBuilder provides a fluent API for constructing Session instances.

use std::collections::HashMap;
use std::time::Duration;

use reqwest::Method;

use crate::error::{Result, Web2ApiError};
use crate::resource::{fetch, FetchRequest, FetchResult};

/// Configuration options for a [`Session`].
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub timeout: Duration,
    pub user_agent: String,
    pub headers: HashMap<String, String>,
    pub basic_auth: Option<(String, Option<String>)>,
    pub http_client: Option<reqwest::Client>,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: "web2api/0.1".to_string(),
            headers: HashMap::new(),
            basic_auth: None,
            http_client: None,
        }
    }
}

/// Builder for constructing Session instances with custom configuration.
#[derive(Debug, Clone, Default)]
pub struct SessionBuilder {
    opts: SessionOptions,
}

impl SessionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.opts.timeout = timeout;
        self
    }

    /// Set the User-Agent header.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.opts.user_agent = user_agent.into();
        self
    }

    /// Add a custom header to all requests.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.opts.headers.insert(key.into(), value.into());
        self
    }

    /// Authenticate every request with HTTP basic auth.
    pub fn basic_auth(mut self, user: impl Into<String>, password: Option<String>) -> Self {
        self.opts.basic_auth = Some((user.into(), password));
        self
    }

    /// Use a custom HTTP client; timeout and user agent are then the
    /// client's own.
    pub fn http_client(mut self, client: reqwest::Client) -> Self {
        self.opts.http_client = Some(client);
        self
    }

    pub fn build(self) -> Result<Session> {
        Session::new(self.opts)
    }
}

/// A cookie-keeping HTTP session shared by all queries of a process.
#[derive(Debug, Clone)]
pub struct Session {
    opts: SessionOptions,
    client: reqwest::Client,
}

impl Session {
    pub fn builder() -> SessionBuilder {
        SessionBuilder::new()
    }

    pub fn new(opts: SessionOptions) -> Result<Self> {
        let client = match opts.http_client.clone() {
            Some(client) => client,
            None => reqwest::Client::builder()
                .user_agent(&opts.user_agent)
                .timeout(opts.timeout)
                .cookie_store(true)
                .gzip(true)
                .brotli(true)
                .deflate(true)
                .build()
                .map_err(|e| Web2ApiError::fetch("", "BuildSession", Some(e.into())))?,
        };
        Ok(Self { opts, client })
    }

    pub fn options(&self) -> &SessionOptions {
        &self.opts
    }

    /// Fetches `url` with GET and returns the decoded body.
    pub async fn get(&self, url: &str) -> Result<String> {
        self.send(Method::GET, url, None).await
    }

    /// Sends a request and returns the decoded body. `form` becomes an
    /// urlencoded body.
    pub async fn send(&self, method: Method, url: &str, form: Option<&str>) -> Result<String> {
        Ok(self.fetch(method, url, form).await?.text())
    }

    /// Like [`Session::send`] but keeps the raw response, including the
    /// address reached after redirects.
    pub async fn fetch(
        &self,
        method: Method,
        url: &str,
        form: Option<&str>,
    ) -> Result<FetchResult> {
        let req = FetchRequest {
            method,
            url: url.to_string(),
            form: form.map(str::to_string),
            headers: self.opts.headers.clone(),
            basic_auth: self.opts.basic_auth.clone(),
        };
        fetch(&self.client, &req).await
    }
}
