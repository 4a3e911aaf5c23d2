//! In-process transport.
//!
//! Records every write and lets the caller inject inbound buffers, standing
//! in for a radio during tests and demos.

// ============================================================================
// Imports
// ============================================================================

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::debug;

use crate::error::{Error, Result};
use crate::identifiers::PeerHandle;

use super::Transport;

// ============================================================================
// MemoryTransport
// ============================================================================

/// Loopback transport with a fixed set of advertised peers.
#[derive(Debug, Default)]
pub struct MemoryTransport {
    /// Advertised peer names.
    peers: Vec<String>,
    /// Frames written, in order.
    written: Mutex<Vec<Vec<u8>>>,
    /// Sender side of the active subscription.
    inbound: Mutex<Option<mpsc::Sender<Vec<u8>>>>,
    /// Next handle id.
    next_id: AtomicU64,
    /// Fail every write when set.
    fail_writes: AtomicBool,
    /// Fail every subscription when set.
    fail_subscribe: AtomicBool,
    /// Peers connected and not yet disconnected.
    active_peers: AtomicUsize,
}

impl MemoryTransport {
    /// Creates a transport advertising the given peer names.
    #[must_use]
    pub fn new<I, S>(peers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            peers: peers.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Delivers an inbound buffer to the subscriber.
    ///
    /// # Errors
    ///
    /// [`Error::ConnectionClosed`] if nobody is subscribed.
    pub async fn inject(&self, bytes: impl Into<Vec<u8>>) -> Result<()> {
        let sender = self.inbound.lock().clone();
        let sender = sender.ok_or(Error::ConnectionClosed)?;
        sender
            .send(bytes.into())
            .await
            .map_err(|_| Error::ConnectionClosed)
    }

    /// Ends the inbound stream, as if the peer dropped.
    pub fn drop_peer(&self) {
        self.inbound.lock().take();
    }

    /// Makes subsequent writes fail.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Makes subsequent subscriptions fail.
    pub fn set_fail_subscribe(&self, fail: bool) {
        self.fail_subscribe.store(fail, Ordering::SeqCst);
    }

    /// Number of peers connected and not yet disconnected.
    #[must_use]
    pub fn active_peers(&self) -> usize {
        self.active_peers.load(Ordering::SeqCst)
    }

    /// Frames written so far.
    #[must_use]
    pub fn written(&self) -> Vec<Vec<u8>> {
        self.written.lock().clone()
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn connect(&self, name_prefix: Option<&str>) -> Result<PeerHandle> {
        let name = self
            .peers
            .iter()
            .find(|name| name_prefix.is_none_or(|prefix| name.starts_with(prefix)))
            .ok_or_else(|| Error::transport("no matching peer advertised"))?;

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.active_peers.fetch_add(1, Ordering::SeqCst);
        debug!(id, name = %name, "Memory peer connected");
        Ok(PeerHandle::new(id, name.clone()))
    }

    async fn disconnect(&self, peer: &PeerHandle) -> Result<()> {
        debug!(id = peer.id(), "Memory peer disconnected");
        let _ = self
            .active_peers
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        self.drop_peer();
        Ok(())
    }

    async fn write(&self, _peer: &PeerHandle, bytes: &[u8]) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Error::transport("write rejected"));
        }
        self.written.lock().push(bytes.to_vec());
        Ok(())
    }

    async fn subscribe(
        &self,
        _peer: &PeerHandle,
        capacity: usize,
    ) -> Result<mpsc::Receiver<Vec<u8>>> {
        if self.fail_subscribe.load(Ordering::SeqCst) {
            return Err(Error::transport("notifications unavailable"));
        }
        let (tx, rx) = mpsc::channel(capacity);
        *self.inbound.lock() = Some(tx);
        Ok(rx)
    }
}

// ============================================================================
// Tests
// ============================================================================
