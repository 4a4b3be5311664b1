//! Configuration schema definitions.
//!
//! Two documents are described here:
//! - the route file (JSON with `//` comments), deserialized into [`Route`]s
//! - the optional server settings file (TOML), deserialized into [`ServerConfig`]
//!
//! Every field has a default so minimal documents stay minimal.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;

/// Header name → values. Used both for request criteria and response headers.
pub type HeaderValues = BTreeMap<String, Vec<String>>;

/// A declarative rule pairing request criteria with a canned response.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Route {
    /// Exact request path.
    pub url: String,

    /// Exact request method (case-sensitive).
    pub method: String,

    /// Headers the request must carry; every listed value must be present.
    pub headers: HeaderValues,

    /// Query/form parameters the request must carry with exactly this value.
    pub params: BTreeMap<String, String>,

    /// What to send back when this route matches.
    pub response: ResponseSpec,
}

/// The canned response of a [`Route`].
///
/// `content_type` and `cookies` are shortcuts appended after `headers`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ResponseSpec {
    /// Explicit headers, multiple values per name kept in order.
    pub headers: HeaderValues,

    /// `Content-Type` shortcut.
    #[serde(rename = "content-type")]
    pub content_type: String,

    /// Status code, 0 means "use the default".
    #[serde(rename = "status")]
    pub status_code: u16,

    /// `Set-Cookie` shortcut, cookie name → value.
    #[serde(rename = "cookies")]
    pub set_cookie: BTreeMap<String, String>,

    /// Literal body, or `!file:<path>`.
    pub body: String,

    /// Abnormal connection handling.
    #[serde(rename = "!directive")]
    pub directive: Directive,
}

/// Flags selecting abnormal connection handling for a response.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Directive {
    /// Milliseconds. 0 = none, > 0 = delay, < 0 = never answer.
    #[serde(rename = "delay")]
    pub delay_millis: i64,

    /// Truncate the body and drop the connection.
    pub partial: bool,

    /// Stream forever.
    pub firehose: bool,

    /// Fail at random.
    pub flaky: bool,

    /// Redirect endlessly.
    #[serde(rename = "loop")]
    pub redirect_loop: bool,
}

/// Root configuration for the server process.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ServerConfig {
    /// Listener configuration (bind address, connection limit).
    pub listener: ListenerConfig,

    /// HTTP handling limits.
    pub http: HttpConfig,

    /// Tunables of the abnormal response directives.
    pub directives: DirectiveConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8989").
    pub bind_address: String,

    /// Maximum concurrent connections (backpressure).
    pub max_connections: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8989".to_string(),
            max_connections: 10_000,
        }
    }
}

/// HTTP handling limits.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Largest request body read when collecting form parameters.
    pub max_body_size: usize,

    /// How long shutdown waits for open connections before giving up.
    pub drain_timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            max_body_size: 2 * 1024 * 1024, // 2MB
            drain_timeout_secs: 5,
        }
    }
}

impl HttpConfig {
    pub fn drain_timeout(&self) -> Duration {
        Duration::from_secs(self.drain_timeout_secs)
    }
}

/// Probability of a flaky response failing.
pub const FLAKY_THRESHOLD: f64 = 0.4;

/// Pause between two firehose chunks.
pub const FIREHOSE_INTERVAL_MS: u64 = 5;

/// How long a negative delay hangs (one year).
pub const HANG_SECS: u64 = 365 * 24 * 60 * 60;

/// Bodies this long or shorter are never truncated by `partial`.
pub const PARTIAL_MIN_LENGTH: usize = 2;

/// Tunables of the abnormal response directives.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq)]
#[serde(default)]
pub struct DirectiveConfig {
    /// A flaky draw below this value fails the request.
    pub flaky_threshold: f64,

    /// Milliseconds between firehose chunks.
    pub firehose_interval_ms: u64,

    /// Seconds a negative delay hangs for. Bounded so the timer stays valid.
    pub hang_secs: u64,

    /// Bodies of at most this many bytes are sent whole by `partial`.
    pub partial_min_length: usize,
}

impl Default for DirectiveConfig {
    fn default() -> Self {
        Self {
            flaky_threshold: FLAKY_THRESHOLD,
            firehose_interval_ms: FIREHOSE_INTERVAL_MS,
            hang_secs: HANG_SECS,
            partial_min_length: PARTIAL_MIN_LENGTH,
        }
    }
}

impl DirectiveConfig {
    pub fn firehose_interval(&self) -> Duration {
        Duration::from_millis(self.firehose_interval_ms.max(1))
    }

    pub fn hang_duration(&self) -> Duration {
        Duration::from_secs(self.hang_secs)
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn route_defaults_for_missing_fields() {
        let routes: Vec<Route> = serde_json::from_str(r#"[{"url": "/ping", "method": "GET"}]"#).unwrap();
        assert_eq!(routes.len(), 1);
        assert!(routes[0].headers.is_empty());
        assert!(routes[0].params.is_empty());
        assert_eq!(routes[0].response, ResponseSpec::default());
    }

    #[test]
    fn response_uses_wire_names() {
        let json = r#"{
            "content-type": "text/plain",
            "status": 201,
            "cookies": {"session": "abc"},
            "body": "!file:body.txt",
            "!directive": {"delay": -1, "partial": true, "firehose": true, "flaky": true, "loop": true}
        }"#;
        let response: ResponseSpec = serde_json::from_str(json).unwrap();
        assert_eq!(response.content_type, "text/plain");
        assert_eq!(response.status_code, 201);
        assert_eq!(response.set_cookie.get("session").map(String::as_str), Some("abc"));
        assert_eq!(response.body, "!file:body.txt");
        assert_eq!(
            response.directive,
            Directive {
                delay_millis: -1,
                partial: true,
                firehose: true,
                flaky: true,
                redirect_loop: true,
            }
        );
    }

    #[test]
    fn server_config_from_partial_toml() {
        let config: ServerConfig = toml::from_str(
            r#"
            [listener]
            bind_address = "127.0.0.1:9000"

            [directives]
            flaky_threshold = 0.9
            "#,
        )
        .unwrap();
        assert_eq!(config.listener.bind_address, "127.0.0.1:9000");
        assert_eq!(config.listener.max_connections, 10_000);
        assert_eq!(config.directives.flaky_threshold, 0.9);
        assert_eq!(config.directives.firehose_interval_ms, FIREHOSE_INTERVAL_MS);
        assert!(!config.observability.metrics_enabled);
    }
}
