//! Endless redirect chain.
//!
//! Every request under [`SENTINEL_PREFIX`] is answered with a 301 to the
//! same prefix and the next counter, so the chain never repeats a URL and
//! never ends. Anything unparseable starts over at 1.

use axum::body::Body;
use axum::http::{header, HeaderValue, Method, Response, StatusCode};

/// Reserved path prefix of the redirect chain.
pub const SENTINEL_PREFIX: &str = "/_infinite_redirector";

/// Whether `path` is the sentinel prefix or below it.
pub fn is_sentinel(path: &str) -> bool {
    path.strip_prefix(SENTINEL_PREFIX)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}

/// Where a request for `path` is sent next.
pub fn next_location(path: &str) -> String {
    let next = if is_sentinel(path) {
        path.rsplit('/')
            .next()
            .and_then(|segment| segment.parse::<u64>().ok())
            .and_then(|count| count.checked_add(1))
            .unwrap_or(1)
    } else {
        1
    };
    format!("{SENTINEL_PREFIX}/{next}")
}

/// Answer with the next hop of the chain.
pub fn redirect_endlessly(method: &Method, path: &str) -> Response<Body> {
    let location = next_location(path);
    tracing::debug!(from = %path, to = %location, "Redirecting endlessly");

    let body = if *method == Method::GET || *method == Method::HEAD {
        Body::from(format!("<a href=\"{location}\">Moved Permanently</a>.\n\n"))
    } else {
        Body::empty()
    };

    let mut response = Response::new(body);
    *response.status_mut() = StatusCode::MOVED_PERMANENTLY;
    if let Ok(value) = HeaderValue::from_str(&location) {
        response.headers_mut().insert(header::LOCATION, value);
    }
    if *method == Method::GET || *method == Method::HEAD {
        response.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("text/html; charset=utf-8"),
        );
    }
    response
}
