//! Connection lifecycle tracking and takeover.
//!
//! # Responsibilities
//! - Generate unique connection IDs for tracing
//! - Count live connections and signal draining on shutdown
//! - Offer the hijack capability: drop a connection mid-response
//!
//! # Design Decisions
//! - A [`Hijacker`] only exists for connections served by our own accept
//!   loop; handlers reached through any other transport see `None`

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;
use tokio::sync::{oneshot, watch};

/// Global atomic counter for connection IDs.
/// Using relaxed ordering is sufficient since we only need uniqueness, not synchronization.
static CONNECTION_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Generate a new unique connection ID.
    pub fn new() -> Self {
        Self(CONNECTION_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Tracks active connections for graceful shutdown.
///
/// Uses a watch channel to tell connections to drain.
#[derive(Debug, Clone)]
pub struct ConnectionTracker {
    /// Current count of active connections.
    active_count: Arc<AtomicU64>,
    /// Flipped to `true` once the server stops accepting.
    drain_tx: Arc<watch::Sender<bool>>,
}

impl ConnectionTracker {
    /// Create a new connection tracker.
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self {
            active_count: Arc::new(AtomicU64::new(0)),
            drain_tx: Arc::new(tx),
        }
    }

    /// Record a new active connection. Returns a guard that decrements on drop.
    pub fn track(&self) -> ConnectionGuard {
        self.active_count.fetch_add(1, Ordering::SeqCst);
        ConnectionGuard {
            active_count: Arc::clone(&self.active_count),
            id: ConnectionId::new(),
        }
    }

    /// Get current active connection count.
    pub fn active_count(&self) -> u64 {
        self.active_count.load(Ordering::SeqCst)
    }

    /// Ask every connection to finish its current response and close.
    pub fn begin_draining(&self) {
        self.drain_tx.send_replace(true);
    }

    /// A signal that resolves once draining has begun.
    pub fn drain_signal(&self) -> DrainSignal {
        DrainSignal(self.drain_tx.subscribe())
    }

    /// Wait until all connections are closed.
    pub async fn wait_for_shutdown(&self) {
        while self.active_count.load(Ordering::SeqCst) > 0 {
            tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;
        }
    }
}

impl Default for ConnectionTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolves when the owning [`ConnectionTracker`] starts draining.
#[derive(Debug)]
pub struct DrainSignal(watch::Receiver<bool>);

impl DrainSignal {
    pub async fn wait(&mut self) {
        loop {
            let draining = *self.0.borrow_and_update();
            if draining {
                return;
            }
            if self.0.changed().await.is_err() {
                // Tracker gone: nobody will ever ask us to drain.
                std::future::pending::<()>().await;
            }
        }
    }
}

/// Guard that tracks a connection's lifetime.
/// Decrements active count when dropped.
#[derive(Debug)]
pub struct ConnectionGuard {
    active_count: Arc<AtomicU64>,
    id: ConnectionId,
}

impl ConnectionGuard {
    /// Get this connection's ID.
    pub fn id(&self) -> ConnectionId {
        self.id
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.active_count.fetch_sub(1, Ordering::SeqCst);
        tracing::trace!(connection_id = %self.id, "Connection closed");
    }
}

/// Why a takeover did not happen.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HijackError {
    #[error("connection was already taken over")]
    AlreadyTaken,

    #[error("connection is already closed")]
    Closed,
}

/// Capability to take a connection away from the HTTP protocol layer.
///
/// Inserted into request extensions by the connection loop. Calling
/// [`Hijacker::hijack`] makes the connection task drop the connection and
/// its socket at once, without finishing the response framing.
#[derive(Debug, Clone)]
pub struct Hijacker {
    id: ConnectionId,
    takeover: Arc<Mutex<Option<oneshot::Sender<()>>>>,
}

/// The connection task's end of a [`Hijacker`].
pub type Takeover = oneshot::Receiver<()>;

impl Hijacker {
    /// Create the capability for connection `id` and the receiver its task waits on.
    pub fn pair(id: ConnectionId) -> (Self, Takeover) {
        let (tx, rx) = oneshot::channel();
        (
            Self {
                id,
                takeover: Arc::new(Mutex::new(Some(tx))),
            },
            rx,
        )
    }

    pub fn connection_id(&self) -> ConnectionId {
        self.id
    }

    /// Take the connection over and close it.
    pub fn hijack(&self) -> Result<(), HijackError> {
        let sender = self
            .takeover
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .ok_or(HijackError::AlreadyTaken)?;
        sender.send(()).map_err(|()| HijackError::Closed)?;
        tracing::debug!(connection_id = %self.id, "Connection hijacked");
        Ok(())
    }
}
