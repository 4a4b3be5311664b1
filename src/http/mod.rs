//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection (net::Listener)
//!     → server.rs (hyper HTTP/1.1, Axum router, request ID, hijack capability)
//!     → request.rs (method, path, headers, merged parameters)
//!     → routing::RouteTable (first match)
//!     → dispatch::Dispatcher (write the response, or misbehave)
//!     → Send to client
//! ```

pub mod request;
pub mod server;

pub use request::{IncomingRequest, Params, UuidRequestId, X_REQUEST_ID};
pub use server::HttpServer;
