//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → listener.rs (accept loop, connection limits)
//!     → connection.rs (lifecycle tracking, hijack capability)
//!     → Hand off to HTTP layer
//!
//! Connection States:
//!     Accepting → Active → Draining → Closed
//!                    └──→ Hijacked (dropped mid-response)
//! ```
//!
//! # Design Decisions
//! - Bounded accept queue prevents resource exhaustion
//! - Each connection tracked for graceful shutdown
//! - Takeover is a capability object, not a downcast of the transport

pub mod connection;
pub mod listener;

pub use connection::{ConnectionTracker, HijackError, Hijacker};
pub use listener::{Listener, ListenerError};
