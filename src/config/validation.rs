//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Reject header names/values the HTTP stack cannot carry
//! - Reject status codes outside the three-digit range
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Runs while the route table is compiled, before any request is served

use axum::http::{HeaderName, HeaderValue, StatusCode};
use thiserror::Error;

/// A semantic problem in one route of the route file.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("route #{index} ({url}): invalid header name {name:?}")]
    HeaderName {
        index: usize,
        url: String,
        name: String,
    },

    #[error("route #{index} ({url}): invalid value {value:?} for header {name}")]
    HeaderValue {
        index: usize,
        url: String,
        name: String,
        value: String,
    },

    #[error("route #{index} ({url}): {status} is not a valid status code")]
    Status {
        index: usize,
        url: String,
        status: u16,
    },

    #[error("route #{index} ({url}): cookie name must not be empty")]
    CookieName { index: usize, url: String },
}

/// Collects validation errors while one route is compiled.
pub(crate) struct Checker<'a> {
    index: usize,
    url: &'a str,
    errors: &'a mut Vec<ValidationError>,
}

impl<'a> Checker<'a> {
    pub(crate) fn new(index: usize, url: &'a str, errors: &'a mut Vec<ValidationError>) -> Self {
        Self { index, url, errors }
    }

    pub(crate) fn header_name(&mut self, raw: &str) -> Option<HeaderName> {
        match HeaderName::from_bytes(raw.as_bytes()) {
            Ok(name) => Some(name),
            Err(_) => {
                self.errors.push(ValidationError::HeaderName {
                    index: self.index,
                    url: self.url.to_string(),
                    name: raw.to_string(),
                });
                None
            }
        }
    }

    pub(crate) fn header_value(&mut self, name: &str, raw: &str) -> Option<HeaderValue> {
        match HeaderValue::from_str(raw) {
            Ok(value) => Some(value),
            Err(_) => {
                self.errors.push(ValidationError::HeaderValue {
                    index: self.index,
                    url: self.url.to_string(),
                    name: name.to_string(),
                    value: raw.to_string(),
                });
                None
            }
        }
    }

    /// `Ok(None)` for the unset status 0.
    pub(crate) fn status(&mut self, code: u16) -> Result<Option<StatusCode>, ()> {
        if code == 0 {
            return Ok(None);
        }
        StatusCode::from_u16(code).map(Some).map_err(|_| {
            self.errors.push(ValidationError::Status {
                index: self.index,
                url: self.url.to_string(),
                status: code,
            });
        })
    }

    pub(crate) fn cookie_name(&mut self, name: &str) -> bool {
        if name.is_empty() {
            self.errors.push(ValidationError::CookieName {
                index: self.index,
                url: self.url.to_string(),
            });
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collects_every_error() {
        let mut errors = Vec::new();
        let mut checker = Checker::new(3, "/x", &mut errors);
        assert!(checker.header_name("bad header").is_none());
        assert!(checker.header_value("X-Test", "line\nbreak").is_none());
        assert!(checker.status(42).is_err());
        assert!(!checker.cookie_name(""));
        assert_eq!(errors.len(), 4);
        assert_eq!(
            errors[2].to_string(),
            "route #3 (/x): 42 is not a valid status code"
        );
    }

    #[test]
    fn accepts_valid_values() {
        let mut errors = Vec::new();
        let mut checker = Checker::new(0, "/", &mut errors);
        assert_eq!(checker.header_name("Accept"), Some(HeaderName::from_static("accept")));
        assert!(checker.header_value("Accept", "application/json").is_some());
        assert_eq!(checker.status(0), Ok(None));
        assert_eq!(checker.status(201), Ok(Some(StatusCode::CREATED)));
        assert!(errors.is_empty());
    }
}
