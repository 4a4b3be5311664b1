//! Route matching logic.
//!
//! # Responsibilities
//! - Match request path and method (exact, case-sensitive)
//! - Match required header values (containment)
//! - Match required query/form parameters (equality)
//! - Combine conditions with AND semantics
//!
//! # Design Decisions
//! - Header names are case-insensitive (per HTTP spec), values are not
//! - A request may carry extra headers, values and parameters
//! - Paths compare percent-decoded; no other normalization, no wildcards, no regex

use axum::http::HeaderName;

use crate::http::request::IncomingRequest;

/// Trait for matching requests against conditions.
pub trait Matcher: Send + Sync + std::fmt::Debug {
    /// Returns true if the request matches this condition.
    fn matches(&self, req: &IncomingRequest) -> bool;
}

/// Matches the decoded request path exactly.
#[derive(Debug, Clone)]
pub struct PathMatcher {
    path: String,
}

impl PathMatcher {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

impl Matcher for PathMatcher {
    fn matches(&self, req: &IncomingRequest) -> bool {
        req.path() == self.path
    }
}

/// Matches the request method exactly.
#[derive(Debug, Clone)]
pub struct MethodMatcher {
    method: String,
}

impl MethodMatcher {
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            method: method.into(),
        }
    }
}

impl Matcher for MethodMatcher {
    fn matches(&self, req: &IncomingRequest) -> bool {
        req.method.as_str() == self.method
    }
}

/// Requires a header carrying every one of `values`.
#[derive(Debug, Clone)]
pub struct HeaderMatcher {
    name: HeaderName,
    values: Vec<String>,
}

impl HeaderMatcher {
    pub fn new(name: HeaderName, values: Vec<String>) -> Self {
        Self { name, values }
    }
}

impl Matcher for HeaderMatcher {
    fn matches(&self, req: &IncomingRequest) -> bool {
        let present: Vec<&[u8]> = req
            .headers
            .get_all(&self.name)
            .iter()
            .map(|v| v.as_bytes())
            .collect();
        if present.is_empty() {
            return false;
        }
        self.values
            .iter()
            .all(|wanted| present.contains(&wanted.as_bytes()))
    }
}

/// Requires a parameter with exactly this value.
#[derive(Debug, Clone)]
pub struct ParamMatcher {
    key: String,
    value: String,
}

impl ParamMatcher {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

impl Matcher for ParamMatcher {
    fn matches(&self, req: &IncomingRequest) -> bool {
        req.params.get(&self.key) == Some(self.value.as_str())
    }
}

/// Combines multiple matchers with AND semantics.
#[derive(Debug)]
pub struct AndMatcher {
    matchers: Vec<Box<dyn Matcher>>,
}

impl AndMatcher {
    pub fn new(matchers: Vec<Box<dyn Matcher>>) -> Self {
        Self { matchers }
    }
}

impl Matcher for AndMatcher {
    fn matches(&self, req: &IncomingRequest) -> bool {
        self.matchers.iter().all(|m| m.matches(req))
    }
}
