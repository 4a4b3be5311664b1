//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the stub handler
//! - Wire up middleware (tracing, request ID)
//! - Serve HTTP/1.1 connections from our own accept loop
//! - Hand every request a [`Hijacker`] for its connection
//! - Drain connections on shutdown

use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    response::Response,
    Router,
};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use tokio::net::TcpStream;
use tokio::sync::broadcast;
use tower::ServiceExt;
use tower_http::{
    request_id::SetRequestIdLayer,
    trace::TraceLayer,
};

use crate::config::ServerConfig;
use crate::dispatch::{redirect, write::plain_error, Branch, Dispatcher, RandomSource};
use crate::http::request::{IncomingRequest, UuidRequestId, X_REQUEST_ID};
use crate::net::listener::ConnectionPermit;
use crate::net::{ConnectionTracker, Hijacker, Listener, ListenerError};
use crate::observability::metrics;
use crate::routing::RouteTable;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub routes: Arc<RouteTable>,
    pub dispatcher: Arc<Dispatcher>,
    pub max_body_size: usize,
}

/// HTTP server for the stub routes.
pub struct HttpServer {
    state: AppState,
    drain_timeout: Duration,
    connections: ConnectionTracker,
}

impl HttpServer {
    /// Create a new HTTP server serving `routes`.
    pub fn new(config: &ServerConfig, routes: RouteTable) -> Self {
        let state = AppState {
            routes: Arc::new(routes),
            dispatcher: Arc::new(Dispatcher::new(config.directives)),
            max_body_size: config.http.max_body_size,
        };
        Self {
            state,
            drain_timeout: config.http.drain_timeout(),
            connections: ConnectionTracker::new(),
        }
    }

    /// Replace the randomness behind the flaky and partial directives.
    pub fn with_random_source(mut self, random: Arc<dyn RandomSource>) -> Self {
        let settings = self.state.dispatcher.settings();
        self.state.dispatcher = Arc::new(Dispatcher::with_random(settings, random));
        self
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// The router works on any transport, but only connections accepted by
    /// [`HttpServer::run`] can be hijacked.
    pub fn router(&self) -> Router {
        Router::new()
            .fallback(stub_handler)
            .with_state(self.state.clone())
            .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                let request_id = request
                    .headers()
                    .get(X_REQUEST_ID)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("unknown");
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = %request_id,
                )
            }))
            .layer(SetRequestIdLayer::x_request_id(UuidRequestId))
    }

    /// Live connection tracking, shared with the accept loop.
    pub fn connections(&self) -> ConnectionTracker {
        self.connections.clone()
    }

    /// Run the server, accepting connections on the given listener until
    /// `shutdown` fires.
    pub async fn run(
        self,
        listener: Listener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, routes = self.state.routes.len(), "HTTP server starting");

        let router = self.router();
        loop {
            tokio::select! {
                _ = shutdown.recv() => {
                    tracing::info!("Shutdown signal received, no longer accepting");
                    break;
                }
                accepted = listener.accept() => match accepted {
                    Ok((stream, peer, permit)) => {
                        tracing::debug!(peer_addr = %peer, "Serving connection");
                        self.spawn_connection(stream, permit, router.clone());
                    }
                    Err(ListenerError::Closed) => break,
                    Err(e) => tracing::warn!(error = %e, "Accept failed"),
                },
            }
        }

        self.connections.begin_draining();
        match tokio::time::timeout(self.drain_timeout, self.connections.wait_for_shutdown()).await {
            Ok(()) => tracing::info!("All connections drained"),
            Err(_) => tracing::warn!(
                remaining = self.connections.active_count(),
                "Drain timeout elapsed, abandoning open connections"
            ),
        }

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    fn spawn_connection(&self, stream: TcpStream, permit: ConnectionPermit, router: Router) {
        // Partial bodies must reach the client before the socket is dropped.
        if let Err(e) = stream.set_nodelay(true) {
            tracing::debug!(error = %e, "Failed to set TCP_NODELAY");
        }

        let guard = self.connections.track();
        let mut drain = self.connections.drain_signal();
        let (hijacker, mut takeover) = Hijacker::pair(guard.id());

        tokio::spawn(async move {
            let _permit = permit;
            let _guard = guard;

            let service = service_fn(move |mut request: Request<Incoming>| {
                request.extensions_mut().insert(hijacker.clone());
                router.clone().oneshot(request)
            });
            let conn = http1::Builder::new().serve_connection(TokioIo::new(stream), service);
            tokio::pin!(conn);

            tokio::select! {
                result = conn.as_mut() => log_connection_end(result),
                Ok(()) = &mut takeover => tracing::debug!("Dropping hijacked connection"),
                _ = drain.wait() => {
                    conn.as_mut().graceful_shutdown();
                    tokio::select! {
                        result = conn.as_mut() => log_connection_end(result),
                        Ok(()) = &mut takeover => tracing::debug!("Dropping hijacked connection"),
                    }
                }
            }
        });
    }
}

fn log_connection_end(result: Result<(), hyper::Error>) {
    if let Err(e) = result {
        tracing::debug!(error = %e, "Connection ended with error");
    }
}

/// Answers every request: the redirect chain first, then the route table.
async fn stub_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start = Instant::now();
    let method = request.method().clone();

    if redirect::is_sentinel(request.uri().path()) {
        let response = redirect::redirect_endlessly(&method, request.uri().path());
        metrics::record_request(method.as_str(), "redirect_loop", response.status().as_u16(), start);
        return response;
    }

    let hijacker = request.extensions().get::<Hijacker>().cloned();
    let incoming = IncomingRequest::from_request(request, state.max_body_size).await;

    let Some(route) = state.routes.match_request(&incoming) else {
        tracing::warn!(method = %incoming.method, url = %incoming.uri, "Unmatched request");
        let response = plain_error(StatusCode::NOT_FOUND, "404 page not found");
        metrics::record_request(method.as_str(), "unmatched", response.status().as_u16(), start);
        return response;
    };

    let branch = Branch::select(&route.response.directive);
    let response = state.dispatcher.dispatch(&route.response, &incoming, hijacker).await;
    metrics::record_request(method.as_str(), branch.name(), response.status().as_u16(), start);
    response
}
