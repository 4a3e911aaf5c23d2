//! Transport seam and the async session link.
//!
//! The wireless link itself (discovery, GATT writes, notifications) lives
//! outside this crate behind the [`Transport`] trait. [`Link`] drives a
//! [`SessionController`](crate::SessionController) over any transport.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐   Command    ┌──────────────┐    bytes     ┌──────────────┐
//! │   Caller     │─────────────►│  Link task   │─────────────►│  Transport   │
//! │              │◄─────────────│  (owns the   │◄─────────────│  (BLE, etc.) │
//! │              │ InboundEvent │  controller) │ notifications│              │
//! └──────────────┘              └──────────────┘              └──────────────┘
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `link` | Session task serializing inbound and outbound traffic |
//! | `memory` | In-process transport for tests and demos |

// ============================================================================
// Imports
// ============================================================================

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::Result;
use crate::identifiers::PeerHandle;

// ============================================================================
// Submodules
// ============================================================================

/// Session task over a transport.
pub mod link;

/// In-process transport.
pub mod memory;

// ============================================================================
// Re-exports
// ============================================================================

pub use link::{Link, LinkSnapshot};
pub use memory::MemoryTransport;

// ============================================================================
// Transport
// ============================================================================

/// Byte-level link to a hub.
///
/// Implementations own connection, cancellation and timeouts of the
/// underlying radio. Inbound buffers must be delivered in arrival order.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Connects to a peer, optionally restricted by name prefix.
    async fn connect(&self, name_prefix: Option<&str>) -> Result<PeerHandle>;

    /// Disconnects from a peer.
    async fn disconnect(&self, peer: &PeerHandle) -> Result<()>;

    /// Writes one encoded frame.
    async fn write(&self, peer: &PeerHandle, bytes: &[u8]) -> Result<()>;

    /// Subscribes to inbound notifications.
    ///
    /// `capacity` bounds the queue between the transport and the session.
    async fn subscribe(
        &self,
        peer: &PeerHandle,
        capacity: usize,
    ) -> Result<mpsc::Receiver<Vec<u8>>>;
}
