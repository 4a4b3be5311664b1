//! Route lookup.
//!
//! # Responsibilities
//! - Compile configured routes into matchers and prepared responses
//! - Look up the first route matching a request
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - O(n) scan in declared order; position is priority
//! - Explicit `None` for no match rather than a silent default

use crate::config::schema::Route;
use crate::config::validation::{Checker, ValidationError};
use crate::dispatch::PreparedResponse;
use crate::http::request::IncomingRequest;

use super::matcher::{AndMatcher, HeaderMatcher, Matcher, MethodMatcher, ParamMatcher, PathMatcher};

/// A route with its criteria and response compiled.
#[derive(Debug)]
pub struct CompiledRoute {
    pub route: Route,
    pub matcher: AndMatcher,
    pub response: PreparedResponse,
}

impl CompiledRoute {
    fn compile(index: usize, route: Route, errors: &mut Vec<ValidationError>) -> Self {
        let mut checker = Checker::new(index, &route.url, errors);

        let mut matchers: Vec<Box<dyn Matcher>> = vec![
            Box::new(PathMatcher::new(route.url.as_str())),
            Box::new(MethodMatcher::new(route.method.as_str())),
        ];
        for (name, values) in &route.headers {
            if let Some(name) = checker.header_name(name) {
                matchers.push(Box::new(HeaderMatcher::new(name, values.clone())));
            }
        }
        for (key, value) in &route.params {
            matchers.push(Box::new(ParamMatcher::new(key.as_str(), value.as_str())));
        }

        let response = PreparedResponse::prepare(&route.response, &mut checker);

        Self {
            matcher: AndMatcher::new(matchers),
            response,
            route,
        }
    }
}

/// The ordered, immutable set of routes.
#[derive(Debug, Default)]
pub struct RouteTable {
    routes: Vec<CompiledRoute>,
}

impl RouteTable {
    /// Compile `routes`, keeping their order.
    ///
    /// Every invalid header or status in the table is reported, not just
    /// the first.
    pub fn new(routes: Vec<Route>) -> Result<Self, Vec<ValidationError>> {
        let mut errors = Vec::new();
        let routes: Vec<_> = routes
            .into_iter()
            .enumerate()
            .map(|(index, route)| CompiledRoute::compile(index, route, &mut errors))
            .collect();

        if errors.is_empty() {
            Ok(Self { routes })
        } else {
            Err(errors)
        }
    }

    /// First route, in declared order, matching `request`.
    pub fn match_request(&self, request: &IncomingRequest) -> Option<&CompiledRoute> {
        self.routes.iter().find(|r| r.matcher.matches(request))
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CompiledRoute> {
        self.routes.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderMap, HeaderValue, Method, StatusCode};
    use std::collections::BTreeMap;

    fn route(url: &str, method: &str, body: &str) -> Route {
        let mut route = Route {
            url: url.to_string(),
            method: method.to_string(),
            ..Default::default()
        };
        route.response.body = body.to_string();
        route
    }

    fn get(uri: &str) -> IncomingRequest {
        IncomingRequest::new(Method::GET, uri.parse().unwrap(), HeaderMap::new())
    }

    #[test]
    fn first_declared_match_wins() {
        let mut specific = route("/a", "GET", "specific");
        specific.params.insert("x".into(), "1".into());
        let table = RouteTable::new(vec![
            specific,
            route("/a", "GET", "general"),
            route("/a", "GET", "shadowed"),
        ])
        .unwrap();

        assert_eq!(table.len(), 3);
        assert_eq!(table.match_request(&get("/a?x=1")).unwrap().response.body, "specific");
        assert_eq!(table.match_request(&get("/a?x=2")).unwrap().response.body, "general");
        assert_eq!(table.match_request(&get("/a")).unwrap().response.body, "general");
    }

    #[test]
    fn no_match_is_explicit() {
        let table = RouteTable::new(vec![route("/a", "POST", "")]).unwrap();
        assert!(table.match_request(&get("/a")).is_none());
        assert!(table.match_request(&get("/b")).is_none());
        assert!(RouteTable::default().is_empty());
    }

    #[test]
    fn header_criteria_are_compiled() {
        let mut r = route("/h", "GET", "ok");
        r.headers.insert("X-Token".into(), vec!["secret".into()]);
        let table = RouteTable::new(vec![r]).unwrap();

        let mut headers = HeaderMap::new();
        headers.insert("x-token", HeaderValue::from_static("secret"));
        let request = IncomingRequest::new(Method::GET, "/h".parse().unwrap(), headers);
        assert!(table.match_request(&request).is_some());
        assert!(table.match_request(&get("/h")).is_none());
    }

    #[test]
    fn response_is_prepared_once() {
        let mut r = route("/s", "GET", "x");
        r.response.status_code = 418;
        r.response.content_type = "text/plain".into();
        let table = RouteTable::new(vec![r]).unwrap();
        let compiled = table.iter().next().unwrap();
        assert_eq!(compiled.response.status, Some(StatusCode::IM_A_TEAPOT));
        assert_eq!(compiled.response.headers.len(), 1);
    }

    #[test]
    fn every_problem_is_reported_with_its_route() {
        let mut bad_header = route("/one", "GET", "");
        bad_header.headers.insert("bad header".into(), vec!["v".into()]);
        let mut bad_status = route("/two", "GET", "");
        bad_status.response.status_code = 42;
        let mut bad_cookie = route("/three", "GET", "");
        bad_cookie.response.set_cookie = BTreeMap::from([(String::new(), "v".to_string())]);

        let errors = RouteTable::new(vec![bad_header, bad_status, bad_cookie]).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(errors[0].to_string().starts_with("route #0 (/one)"));
        assert!(errors[1].to_string().starts_with("route #1 (/two)"));
        assert!(errors[2].to_string().starts_with("route #2 (/three)"));
    }
}
