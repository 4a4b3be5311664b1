//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (path, method, headers, params)
//!     → router.rs (ordered scan)
//!     → matcher.rs (evaluate match conditions)
//!     → Return: first matching route or None
//!
//! Route Compilation (at startup):
//!     Route[]
//!     → Validate header names/values and status codes
//!     → Compile matchers and prepared responses
//!     → Freeze as immutable RouteTable
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - Exact comparisons only, no regex or wildcards
//! - Deterministic: same input always matches same route
//! - First match wins (declared order)

pub mod matcher;
pub mod router;

pub use router::{CompiledRoute, RouteTable};
