//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! route file (JSON with // comments)
//!     → preprocess.rs (blank comments, join multi-line strings)
//!     → loader.rs (deserialize, map errors to original lines)
//!     → validation.rs (semantic checks while compiling)
//!     → RouteTable (validated, immutable)
//!
//! settings file (TOML, optional)
//!     → loader.rs
//!     → ServerConfig
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod preprocess;
pub mod schema;
pub mod validation;

pub use loader::{load_routes, load_settings, parse_routes, ConfigError};
pub use schema::{Directive, ListenerConfig, ResponseSpec, Route, ServerConfig};
