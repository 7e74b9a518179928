//! HTTP transport
//!
//! The request pipeline behind every CRUD call: merge headers, send through
//! an injectable [`Fetch`], parse the body, classify the status. Failures are
//! captured in the returned [`RawResult`] instead of being raised.

use crate::error::{TransportError, TransportResult};
use anyhow::{Context, Result};
use futures::future::{BoxFuture, FutureExt};
use reqwest::Client;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Header map; keys are lowercased when merged
pub type Headers = BTreeMap<String, String>;

/// Maximum length of response body to log (to avoid logging sensitive data)
const MAX_LOG_BODY_LENGTH: usize = 200;

/// Sanitize response body for logging
/// Truncates long responses and strips control characters
fn sanitize_for_log(body: &str) -> String {
    let truncated = if body.len() > MAX_LOG_BODY_LENGTH {
        let mut end = MAX_LOG_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... [truncated, {} bytes total]", &body[..end], body.len())
    } else {
        body.to_string()
    };

    truncated.replace(|c: char| c.is_control(), "")
}

/// HTTP verbs used by the client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Patch,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Patch => reqwest::Method::PATCH,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

/// A fully prepared request handed to a [`Fetch`] implementation
#[derive(Debug, Clone, PartialEq)]
pub struct FetchRequest {
    pub method: Method,
    pub url: String,
    pub headers: Headers,
    pub body: Option<String>,
}

/// What a [`Fetch`] implementation hands back: status, headers and raw body
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawResponse {
    pub status: u16,
    pub headers: Headers,
    pub body: String,
}

/// Pluggable network call. Swap it to route requests elsewhere (tests,
/// custom clients, proxies).
pub trait Fetch: Send + Sync {
    fn fetch(&self, request: FetchRequest) -> BoxFuture<'_, TransportResult<RawResponse>>;
}

/// Outcome of the request pipeline before it is turned into an envelope
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawResult {
    /// Parsed body; kept on error for diagnostics
    pub body: Option<Value>,
    pub status: Option<u16>,
    pub headers: Headers,
    pub request_headers: Headers,
    pub error: Option<TransportError>,
}

/// Default [`Fetch`] backed by reqwest
#[derive(Clone)]
pub struct HttpFetch {
    client: Client,
}

impl HttpFetch {
    /// Create a new HTTP client
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("jsonapi-store/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client })
    }

    /// Wrap an already configured reqwest client
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

impl Fetch for HttpFetch {
    fn fetch(&self, request: FetchRequest) -> BoxFuture<'_, TransportResult<RawResponse>> {
        async move {
            let mut builder = self.client.request(request.method.into(), &request.url);
            for (name, value) in &request.headers {
                builder = builder.header(name.as_str(), value.as_str());
            }
            if let Some(body) = request.body {
                builder = builder.body(body);
            }

            let response = builder.send().await?;

            let status = response.status().as_u16();
            let headers = response
                .headers()
                .iter()
                .filter_map(|(name, value)| {
                    value
                        .to_str()
                        .ok()
                        .map(|v| (name.as_str().to_string(), v.to_string()))
                })
                .collect();
            let body = response.text().await?;

            Ok(RawResponse {
                status,
                headers,
                body,
            })
        }
        .boxed()
    }
}

/// Overlay `overrides` on `defaults`, lowercasing names so the override wins
/// regardless of case
pub fn merge_headers(defaults: &Headers, overrides: Option<&Headers>) -> Headers {
    defaults
        .iter()
        .chain(overrides.into_iter().flatten())
        .map(|(name, value)| (name.to_lowercase(), value.clone()))
        .collect()
}

/// Run one request through the pipeline.
///
/// Statuses >= 400 become [`TransportError::Status`] while the parsed body is
/// kept; network and parse failures keep whatever status/headers are known.
pub async fn base_fetch(
    fetch: &dyn Fetch,
    default_headers: &Headers,
    method: Method,
    url: &str,
    body: Option<&Value>,
    headers: Option<&Headers>,
) -> RawResult {
    tracing::debug!("{} {}", method, url);

    let request_headers = merge_headers(default_headers, headers);
    let mut result = RawResult {
        request_headers: request_headers.clone(),
        ..RawResult::default()
    };

    let body = match body.map(serde_json::to_string).transpose() {
        Ok(body) => body,
        Err(e) => {
            result.error = Some(e.into());
            return result;
        }
    };

    let request = FetchRequest {
        method,
        url: url.to_string(),
        headers: request_headers,
        body,
    };

    let response = match fetch.fetch(request).await {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!("{} {} failed: {}", method, url, e);
            result.error = Some(e);
            return result;
        }
    };

    result.status = Some(response.status);
    result.headers = response.headers;

    // Empty bodies (204, DELETE) parse as null
    let parsed = if response.body.trim().is_empty() {
        Ok(Value::Null)
    } else {
        serde_json::from_str::<Value>(&response.body)
    };

    if response.status >= 400 {
        // Security: Only log sanitized/truncated error body to avoid leaking sensitive data
        tracing::error!(
            "API error: {} - {}",
            response.status,
            sanitize_for_log(&response.body)
        );
        result.body = parsed.ok();
        result.error = Some(TransportError::status(response.status));
        return result;
    }

    match parsed {
        Ok(value) => result.body = Some(value),
        Err(e) => {
            tracing::warn!("{} {}: invalid JSON body: {}", method, url, e);
            result.error = Some(e.into());
        }
    }

    result
}
