//! Configurable HTTP stub server library.
//!
//! Routes are declared in a commented JSON file; each pairs request
//! criteria with a canned response, optionally with a directive that makes
//! the connection misbehave (delay, hang, partial body, endless redirect,
//! endless stream, random failure).

pub mod config;
pub mod dispatch;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod routing;

pub use config::schema::ServerConfig;
pub use dispatch::Dispatcher;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use routing::RouteTable;
