//! Request view used for route matching.
//!
//! # Responsibilities
//! - Extract routing-relevant information (method, path, headers)
//! - Merge query-string and form-encoded body parameters
//! - Attach a unique request ID for tracing
//!
//! # Design Decisions
//! - Body parameters take precedence over query parameters
//! - The path is percent-decoded once; routes compare against the decoded form
//! - Unreadable or oversized bodies degrade to "no form parameters"

use axum::body::Body;
use axum::http::{header, HeaderMap, HeaderValue, Method, Request, Uri};
use percent_encoding::percent_decode_str;
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::Uuid;

/// Header carrying the request ID.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Generates a UUID v4 request ID for every request.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidRequestId;

impl MakeRequestId for UuidRequestId {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// Merged query/form parameters, in precedence order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params(Vec<(String, String)>);

impl Params {
    pub fn from_query(query: Option<&str>) -> Self {
        Self(parse_urlencoded(query.unwrap_or_default().as_bytes()))
    }

    /// First value for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Put `body` pairs ahead of what is already there.
    fn prepend_form(&mut self, body: &[u8]) {
        let mut merged = parse_urlencoded(body);
        merged.append(&mut self.0);
        self.0 = merged;
    }
}

fn parse_urlencoded(input: &[u8]) -> Vec<(String, String)> {
    url::form_urlencoded::parse(input)
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

/// Everything a route can match on.
#[derive(Debug, Clone)]
pub struct IncomingRequest {
    pub method: Method,
    pub uri: Uri,
    pub headers: HeaderMap,
    pub params: Params,
    /// `uri.path()` with percent escapes decoded.
    path: String,
}

impl IncomingRequest {
    /// A request with query parameters only.
    pub fn new(method: Method, uri: Uri, headers: HeaderMap) -> Self {
        let params = Params::from_query(uri.query());
        let path = percent_decode_str(uri.path()).decode_utf8_lossy().into_owned();
        Self {
            method,
            uri,
            headers,
            params,
            path,
        }
    }

    /// Add form-encoded body parameters; they shadow query parameters.
    pub fn with_form(mut self, body: &[u8]) -> Self {
        self.params.prepend_form(body);
        self
    }

    /// Build the view from a live request, reading a form body if present.
    pub async fn from_request(request: Request<Body>, max_body_size: usize) -> Self {
        let (parts, body) = request.into_parts();
        let has_form = carries_form(&parts.method, &parts.headers);
        let incoming = Self::new(parts.method, parts.uri, parts.headers);
        if !has_form {
            return incoming;
        }

        match axum::body::to_bytes(body, max_body_size).await {
            Ok(bytes) => incoming.with_form(&bytes),
            Err(e) => {
                tracing::warn!(
                    path = %incoming.path(),
                    error = %e,
                    "Failed to read form body, matching on query parameters only"
                );
                incoming
            }
        }
    }

    /// Decoded request path.
    pub fn path(&self) -> &str {
        &self.path
    }
}

fn carries_form(method: &Method, headers: &HeaderMap) -> bool {
    if !matches!(*method, Method::POST | Method::PUT | Method::PATCH) {
        return false;
    }
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .is_some_and(|mime| mime.trim().eq_ignore_ascii_case("application/x-www-form-urlencoded"))
}
