//! The normal write: status, merged headers, body.

use axum::body::Body;
use axum::http::{header, HeaderMap, HeaderValue, Response, StatusCode};
use axum::response::IntoResponse;

use crate::config::schema::{Directive, ResponseSpec};
use crate::config::validation::{Checker, ValidationError};

/// A response with its headers and status compiled once at startup.
///
/// The body spec stays raw; it is resolved per request.
#[derive(Debug, Clone, Default)]
pub struct PreparedResponse {
    pub status: Option<StatusCode>,
    pub headers: HeaderMap,
    pub body: String,
    pub directive: Directive,
}

impl PreparedResponse {
    /// Compile `spec`, or report every invalid header/status in it.
    pub fn from_spec(spec: &ResponseSpec) -> Result<Self, Vec<ValidationError>> {
        let mut errors = Vec::new();
        let prepared = Self::prepare(spec, &mut Checker::new(0, "", &mut errors));
        if errors.is_empty() {
            Ok(prepared)
        } else {
            Err(errors)
        }
    }

    /// Explicit headers first, then the content-type and cookie shortcuts,
    /// all appended so they coexist.
    pub(crate) fn prepare(spec: &ResponseSpec, checker: &mut Checker<'_>) -> Self {
        let mut headers = HeaderMap::new();

        for (name, values) in &spec.headers {
            let Some(header_name) = checker.header_name(name) else {
                continue;
            };
            for value in values {
                if let Some(value) = checker.header_value(name, value) {
                    headers.append(header_name.clone(), value);
                }
            }
        }

        if !spec.content_type.is_empty() {
            if let Some(value) = checker.header_value("Content-Type", &spec.content_type) {
                headers.append(header::CONTENT_TYPE, value);
            }
        }

        for (name, value) in &spec.set_cookie {
            if !checker.cookie_name(name) {
                continue;
            }
            if let Some(value) = checker.header_value("Set-Cookie", &cookie_header(name, value)) {
                headers.append(header::SET_COOKIE, value);
            }
        }

        let status = checker.status(spec.status_code).unwrap_or(None);

        Self {
            status,
            headers,
            body: spec.body.clone(),
            directive: spec.directive,
        }
    }

    /// Build the response around `body`. Headers are in place before the
    /// status is fixed, nothing changes afterwards.
    pub fn response(&self, body: Body) -> Response<Body> {
        let mut response = Response::new(body);
        *response.headers_mut() = self.headers.clone();
        if let Some(status) = self.status {
            *response.status_mut() = status;
        }
        response
    }
}

/// `Set-Cookie` value for a plain name/value pair.
///
/// Bytes a cookie value cannot carry are dropped, then values containing
/// spaces or commas are quoted.
pub fn cookie_header(name: &str, value: &str) -> String {
    let clean: String = value.chars().filter(|&c| valid_cookie_char(c)).collect();
    if clean.len() != value.len() {
        tracing::warn!(cookie = %name, value = %value, "Dropping invalid bytes from cookie value");
    }
    if clean.contains(|c: char| c == ' ' || c == ',') {
        format!("{name}=\"{clean}\"")
    } else {
        format!("{name}={clean}")
    }
}

/// Printable ASCII except `"`, `;` and `\`.
fn valid_cookie_char(c: char) -> bool {
    matches!(c, ' '..='~') && !matches!(c, '"' | ';' | '\\')
}

/// A short `text/plain` error answer.
pub fn plain_error(status: StatusCode, message: &str) -> Response<Body> {
    (
        status,
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("text/plain; charset=utf-8")),
            (header::X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff")),
        ],
        format!("{message}\n"),
    )
        .into_response()
}
