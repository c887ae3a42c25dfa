// ABOUTME: Resource fetching for host pages: sends the HTTP request and decodes the body.
// ABOUTME: Enforces a content-length limit, rejects non-200 statuses and decodes by charset.

use std::collections::HashMap;

use bytes::Bytes;
use reqwest::Method;
use tracing::debug;

use crate::error::{Result, Web2ApiError};

/// Maximum allowed content length (10 MB).
pub const MAX_CONTENT_LENGTH: usize = 10 * 1024 * 1024;

/// One request to send.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub method: Method,
    pub url: String,
    /// Sent as an `application/x-www-form-urlencoded` body when present.
    pub form: Option<String>,
    pub headers: HashMap<String, String>,
    /// HTTP basic auth user and optional password.
    pub basic_auth: Option<(String, Option<String>)>,
}

impl FetchRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            url: url.into(),
            form: None,
            headers: HashMap::new(),
            basic_auth: None,
        }
    }
}

/// Result of a successful fetch operation.
#[derive(Debug, Clone)]
pub struct FetchResult {
    /// Address after redirects; relative links resolve against it.
    pub final_url: String,
    pub content_type: Option<String>,
    pub body: Bytes,
}

impl FetchResult {
    /// Decode the body as text, using the content-type charset or detection.
    pub fn text(&self) -> String {
        decode_body(&self.body, self.content_type.as_deref())
    }
}

/// Decode body bytes to a String using charset from content-type header or detection.
fn decode_body(body: &[u8], content_type: Option<&str>) -> String {
    if let Some(ct) = content_type {
        if let Some(charset) = extract_charset(ct) {
            if let Some(encoding) = encoding_rs::Encoding::for_label(charset.as_bytes()) {
                let (decoded, _, _) = encoding.decode(body);
                return decoded.into_owned();
            }
        }
    }

    let mut detector = chardetng::EncodingDetector::new();
    detector.feed(body, true);
    let encoding = detector.guess(None, true);
    let (decoded, _, _) = encoding.decode(body);
    decoded.into_owned()
}

/// Extract charset value from Content-Type header.
fn extract_charset(content_type: &str) -> Option<String> {
    let lower = content_type.to_lowercase();
    for part in lower.split(';') {
        let trimmed = part.trim();
        if let Some(charset) = trimmed.strip_prefix("charset=") {
            let charset = charset.trim_matches('"').trim_matches('\'');
            return Some(charset.to_string());
        }
    }
    None
}

/// Sends `req` and returns the body of a 200 response.
pub async fn fetch(client: &reqwest::Client, req: &FetchRequest) -> Result<FetchResult> {
    let url = req.url.as_str();
    let parsed_url = url::Url::parse(url).map_err(|e| {
        Web2ApiError::fetch(url, "Fetch", Some(anyhow::anyhow!("invalid URL: {}", e)))
    })?;

    let scheme = parsed_url.scheme();
    if scheme != "http" && scheme != "https" {
        return Err(Web2ApiError::fetch(
            url,
            "Fetch",
            Some(anyhow::anyhow!("scheme must be http or https")),
        ));
    }

    let mut request = client.request(req.method.clone(), parsed_url);
    for (key, value) in &req.headers {
        request = request.header(key, value);
    }
    if let Some((ref user, ref password)) = req.basic_auth {
        request = request.basic_auth(user, password.as_ref());
    }
    if let Some(ref form) = req.form {
        request = request
            .header(
                reqwest::header::CONTENT_TYPE,
                "application/x-www-form-urlencoded",
            )
            .body(form.clone());
    }

    debug!(method = %req.method, url, "fetching page");
    let response = request.send().await.map_err(|e| {
        Web2ApiError::fetch(url, "Fetch", Some(anyhow::anyhow!("request failed: {}", e)))
    })?;

    if let Some(len) = response.content_length() {
        if len as usize > MAX_CONTENT_LENGTH {
            return Err(Web2ApiError::fetch(
                url,
                "Fetch",
                Some(anyhow::anyhow!("content too large")),
            ));
        }
    }

    let status = response.status().as_u16();
    let final_url = response.url().to_string();
    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_lowercase());

    let body = response.bytes().await.map_err(|e| {
        Web2ApiError::fetch(
            url,
            "Fetch",
            Some(anyhow::anyhow!("failed to read body: {}", e)),
        )
    })?;

    if body.len() > MAX_CONTENT_LENGTH {
        return Err(Web2ApiError::fetch(
            url,
            "Fetch",
            Some(anyhow::anyhow!("content too large")),
        ));
    }

    if status != 200 {
        return Err(Web2ApiError::fetch(
            url,
            "Fetch",
            Some(anyhow::anyhow!("HTTP status {}", status)),
        ));
    }

    Ok(FetchResult {
        final_url,
        content_type,
        body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn create_test_client() -> reqwest::Client {
        reqwest::Client::builder()
            .user_agent("test-agent")
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_fetch_ok_utf8() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/item");
            then.status(200)
                .header("content-type", "text/html; charset=utf-8")
                .body("<p>hello</p>");
        });

        let result = fetch(&create_test_client(), &FetchRequest::get(server.url("/item"))).await;
        mock.assert();

        let result = result.expect("fetch should succeed");
        assert_eq!(result.final_url, server.url("/item"));
        assert_eq!(result.text(), "<p>hello</p>");
    }

    #[tokio::test]
    async fn test_fetch_posts_form_body() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/search")
                .header("content-type", "application/x-www-form-urlencoded")
                .body("q=kettle");
            then.status(200).body("results");
        });

        let req = FetchRequest {
            method: Method::POST,
            form: Some("q=kettle".to_string()),
            ..FetchRequest::get(server.url("/search"))
        };
        let result = fetch(&create_test_client(), &req).await;
        mock.assert();
        assert_eq!(result.unwrap().text(), "results");
    }

    #[tokio::test]
    async fn test_fetch_non_200_rejected() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/notfound");
            then.status(404).body("not found");
        });

        let result = fetch(&create_test_client(), &FetchRequest::get(server.url("/notfound"))).await;
        mock.assert();

        let err = result.expect_err("should fail on 404");
        assert!(err.is_fetch());
    }

    #[tokio::test]
    async fn test_fetch_rejects_non_http_scheme() {
        let err = fetch(&create_test_client(), &FetchRequest::get("ftp://example.com/x"))
            .await
            .expect_err("ftp is not fetched");
        assert!(err.is_fetch());
    }

    #[test]
    fn test_max_content_length_constant() {
        assert_eq!(MAX_CONTENT_LENGTH, 10 * 1024 * 1024);
    }

    #[test]
    fn test_decode_iso_8859_1_with_header() {
        let iso_bytes: &[u8] = &[0x63, 0x61, 0x66, 0xe9];
        let decoded = decode_body(iso_bytes, Some("text/html; charset=ISO-8859-1"));
        assert_eq!(decoded, "café");
    }

    #[test]
    fn test_extract_charset() {
        assert_eq!(
            extract_charset("text/html; charset=utf-8"),
            Some("utf-8".to_string())
        );
        assert_eq!(
            extract_charset("text/html; charset=\"utf-8\""),
            Some("utf-8".to_string())
        );
        assert_eq!(extract_charset("text/html"), None);
    }

    #[test]
    fn test_decode_body_with_charset() {
        let body = "hello world".as_bytes();
        let decoded = decode_body(body, Some("text/plain; charset=utf-8"));
        assert_eq!(decoded, "hello world");
    }
}
