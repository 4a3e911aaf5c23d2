//! Session controller.
//!
//! Owns the session state, evaluation history and scan registry, and is the
//! only thing that mutates them. Outbound commands are gated on the
//! connection state and framed here; inbound buffers are decoded,
//! classified, and their side effects applied before the event is returned.
//!
//! # Example
//!
//! ```
//! use vibecue_session::{Command, DeviceType, InboundEvent, SessionController, SessionOptions};
//!
//! let mut session = SessionController::new(SessionOptions::new());
//! session.connect("VibeCue-Hub");
//!
//! let frame = session.send(&Command::device_type(DeviceType::Two))?;
//! assert_eq!(frame, b"$DM:TYPE:2\r\n");
//!
//! let event = session.on_receive(b"#EVAL:STOP:STOP_OK:12,14,5\r\n");
//! assert!(matches!(event, InboundEvent::EvaluationStop { .. }));
//! assert_eq!(session.history().len(), 1);
//! # Ok::<(), vibecue_session::Error>(())
//! ```

// ============================================================================
// Imports
// ============================================================================

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, trace, warn};

use crate::error::{Error, Result};
use crate::protocol::{Command, InboundEvent, frame};

use super::history::EvaluationHistory;
use super::options::SessionOptions;
use super::scan::ScanRegistry;

// ============================================================================
// SessionState
// ============================================================================

/// Connection state of the single active session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SessionState {
    /// No peer connected; sending is rejected.
    #[default]
    Disconnected,
    /// Connected to a peer.
    Connected {
        /// Display name of the peer.
        peer_name: String,
    },
}

impl SessionState {
    /// Returns `true` if a peer is connected.
    #[inline]
    #[must_use]
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected { .. })
    }
}

// ============================================================================
// SessionController
// ============================================================================

/// Single-session protocol engine.
///
/// Processing is strictly sequential: each inbound buffer is handled to
/// completion before the next call. Callers sharing a controller across
/// tasks must serialize access (see [`Link`](crate::transport::Link)).
#[derive(Debug, Default)]
pub struct SessionController {
    options: SessionOptions,
    state: SessionState,
    history: EvaluationHistory,
    scans: ScanRegistry,
}

impl SessionController {
    /// Creates a disconnected session with empty history and registry.
    #[must_use]
    pub fn new(options: SessionOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Marks the session connected to `peer_name`.
    pub fn connect(&mut self, peer_name: impl Into<String>) {
        let peer_name = peer_name.into();
        info!(peer = %peer_name, "Session connected");
        self.state = SessionState::Connected { peer_name };
    }

    /// Marks the session disconnected. History and scan results are kept.
    pub fn disconnect(&mut self) {
        if let SessionState::Connected { peer_name } = &self.state {
            info!(peer = %peer_name, "Session disconnected");
        }
        self.state = SessionState::Disconnected;
    }

    /// Clears evaluation history and scan results.
    pub fn reset(&mut self) {
        debug!(
            history = self.history.len(),
            scans = self.scans.len(),
            "Session reset"
        );
        self.history.reset();
        self.scans.clear();
    }

    /// Disconnects and drops all accumulated state.
    pub fn dispose(&mut self) {
        self.disconnect();
        self.reset();
    }

    // ========================================================================
    // Outbound
    // ========================================================================

    /// Frames a command for transmission.
    ///
    /// # Errors
    ///
    /// - [`Error::NotConnected`] if no peer is connected
    /// - [`Error::PayloadTooLong`] if the framed line exceeds 64 bytes
    pub fn send(&self, command: &Command) -> Result<Vec<u8>> {
        if !self.state.is_connected() {
            warn!(command = %command, "Send rejected: not connected");
            return Err(Error::NotConnected);
        }

        let bytes = frame::encode(&command.to_line())?;
        if self.options.log_raw_frames {
            debug!(line = %command.to_line(), "TX");
        }
        Ok(bytes)
    }

    // ========================================================================
    // Inbound
    // ========================================================================

    /// Handles one inbound buffer, stamping any summary with the current time.
    pub fn on_receive(&mut self, raw: &[u8]) -> InboundEvent {
        self.on_receive_at(raw, Utc::now())
    }

    /// Handles one inbound buffer with an explicit capture time.
    pub fn on_receive_at(&mut self, raw: &[u8], captured_at: DateTime<Utc>) -> InboundEvent {
        let line = frame::decode(raw);
        if self.options.log_raw_frames {
            debug!(line = %line, "RX");
        }

        let event = InboundEvent::classify(&line);
        trace!(event = event.name(), "Classified inbound line");

        self.apply(&event, captured_at);
        event
    }

    /// Applies the state changes implied by an event.
    fn apply(&mut self, event: &InboundEvent, captured_at: DateTime<Utc>) {
        match event {
            InboundEvent::ScanFound {
                id,
                display_name,
                signal_strength,
            } => self.scans.upsert(id, *signal_strength, display_name),

            InboundEvent::GenericSuccess {
                scan_reset: true, ..
            } => self.scans.clear(),

            InboundEvent::EvaluationStop { summary } => {
                self.history.record(*summary, captured_at);
                debug!(
                    layout = ?summary.layout(),
                    count = self.history.len(),
                    "Evaluation recorded"
                );
            }

            InboundEvent::Unrecognized { raw } => {
                debug!(line = %raw, "Unrecognized inbound line");
            }

            _ => {}
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Current connection state.
    #[inline]
    #[must_use]
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Returns `true` if a peer is connected.
    #[inline]
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.state.is_connected()
    }

    /// Recorded evaluation summaries.
    #[inline]
    #[must_use]
    pub fn history(&self) -> &EvaluationHistory {
        &self.history
    }

    /// Discovered peers.
    #[inline]
    #[must_use]
    pub fn scan_registry(&self) -> &ScanRegistry {
        &self.scans
    }

    /// Active configuration.
    #[inline]
    #[must_use]
    pub fn options(&self) -> &SessionOptions {
        &self.options
    }
}

// ============================================================================
// Tests
// ============================================================================
