//! Response dispatch subsystem.
//!
//! # Data Flow
//! ```text
//! Matched route + request
//!     → Branch::select (directive priority)
//!     → delay | hang | partial | redirect | firehose | flaky | normal
//!     → body.rs resolves the body spec where one is sent
//! ```
//!
//! # Design Decisions
//! - Exactly one branch runs per request; a delay or hang always ends in
//!   the normal write, never in another directive
//! - Randomness is injected so the flaky and partial branches are testable

pub mod body;
pub mod random;
pub mod redirect;
pub mod stream;
pub mod write;

use std::sync::Arc;
use std::time::Duration;

use axum::body::{Body, Bytes};
use axum::http::{Method, Response, StatusCode};

use crate::config::schema::{Directive, DirectiveConfig};
use crate::http::request::IncomingRequest;
use crate::net::Hijacker;

pub use random::{FixedRandom, RandomSource, ThreadRandom};
pub use write::PreparedResponse;

const FLAKY_MESSAGE: &str = "Server Error: I'm being flaky!";
const NO_HIJACK_MESSAGE: &str = "Hijacking not supported, cannot do partial responses";

/// The single path a response takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Branch {
    Delay(Duration),
    Hang,
    Partial,
    RedirectLoop,
    Firehose,
    Flaky,
    Normal,
}

impl Branch {
    /// Pick the branch for `directive`. The first applicable one wins.
    pub fn select(directive: &Directive) -> Self {
        match directive.delay_millis {
            d if d > 0 => return Branch::Delay(Duration::from_millis(d.unsigned_abs())),
            d if d < 0 => return Branch::Hang,
            _ => {}
        }
        if directive.partial {
            Branch::Partial
        } else if directive.redirect_loop {
            Branch::RedirectLoop
        } else if directive.firehose {
            Branch::Firehose
        } else if directive.flaky {
            Branch::Flaky
        } else {
            Branch::Normal
        }
    }

    /// Label used in logs and metrics.
    pub fn name(&self) -> &'static str {
        match self {
            Branch::Delay(_) => "delay",
            Branch::Hang => "hang",
            Branch::Partial => "partial",
            Branch::RedirectLoop => "redirect_loop",
            Branch::Firehose => "firehose",
            Branch::Flaky => "flaky",
            Branch::Normal => "normal",
        }
    }
}

/// Turns a matched route into a response.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    settings: DirectiveConfig,
    random: Arc<dyn RandomSource>,
}

impl Dispatcher {
    pub fn new(settings: DirectiveConfig) -> Self {
        Self::with_random(settings, Arc::new(ThreadRandom))
    }

    pub fn with_random(settings: DirectiveConfig, random: Arc<dyn RandomSource>) -> Self {
        Self { settings, random }
    }

    pub fn settings(&self) -> DirectiveConfig {
        self.settings
    }

    /// Produce the response for `prepared`.
    ///
    /// `hijacker` is only needed by the partial branch; without one the
    /// partial branch answers 500.
    pub async fn dispatch(
        &self,
        prepared: &PreparedResponse,
        request: &IncomingRequest,
        hijacker: Option<Hijacker>,
    ) -> Response<Body> {
        let branch = Branch::select(&prepared.directive);
        tracing::debug!(branch = branch.name(), path = %request.path(), "Dispatching");

        match branch {
            Branch::Delay(delay) => {
                tokio::time::sleep(delay).await;
                self.write(prepared).await
            }
            Branch::Hang => {
                tokio::time::sleep(self.settings.hang_duration()).await;
                self.write(prepared).await
            }
            Branch::Partial => self.partial(prepared, request, hijacker).await,
            Branch::RedirectLoop => redirect::redirect_endlessly(&request.method, request.path()),
            Branch::Firehose => {
                prepared.response(stream::firehose(self.settings.firehose_interval()))
            }
            Branch::Flaky => self.flaky(prepared).await,
            Branch::Normal => self.write(prepared).await,
        }
    }

    async fn write(&self, prepared: &PreparedResponse) -> Response<Body> {
        let body = body::resolve(&prepared.body).await;
        prepared.response(Body::from(body))
    }

    async fn partial(
        &self,
        prepared: &PreparedResponse,
        request: &IncomingRequest,
        hijacker: Option<Hijacker>,
    ) -> Response<Body> {
        let Some(hijacker) = hijacker else {
            tracing::warn!("Partial response requested on a connection that cannot be hijacked");
            return write::plain_error(StatusCode::INTERNAL_SERVER_ERROR, NO_HIJACK_MESSAGE);
        };

        let full = body::resolve(&prepared.body).await;
        let head = self.truncate(full);
        tracing::debug!(
            connection_id = %hijacker.connection_id(),
            sent = head.len(),
            "Sending partial response"
        );

        let status = prepared.status.unwrap_or(StatusCode::OK);
        if !carries_body(&request.method, status) {
            stream::cut_after_head(hijacker);
            return prepared.response(Body::from(head));
        }
        prepared.response(stream::partial(head, hijacker))
    }

    /// Keep a random strict prefix of bodies long enough to cut.
    fn truncate(&self, mut full: Bytes) -> Bytes {
        let len = full.len();
        if len > self.settings.partial_min_length {
            let keep = self.random.between(1, len - 1);
            full.truncate(keep);
        }
        full
    }

    async fn flaky(&self, prepared: &PreparedResponse) -> Response<Body> {
        if self.random.unit() >= self.settings.flaky_threshold {
            return self.write(prepared).await;
        }
        tracing::debug!("Being flaky");
        write::plain_error(StatusCode::INTERNAL_SERVER_ERROR, FLAKY_MESSAGE)
    }
}

/// Whether the connection will ever poll a body for this response.
fn carries_body(method: &Method, status: StatusCode) -> bool {
    *method != Method::HEAD
        && !status.is_informational()
        && status != StatusCode::NO_CONTENT
        && status != StatusCode::NOT_MODIFIED
}
