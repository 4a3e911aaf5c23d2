//! Session link and event loop.
//!
//! A [`Link`] owns a spawned tokio task that holds the
//! [`SessionController`]. Inbound notifications and outbound commands are
//! both handled inside that task, so line N is fully processed (decoded,
//! classified, applied) before line N+1 and history order matches arrival
//! order.
//!
//! # Event Loop
//!
//! The task selects over:
//!
//! - Inbound buffers from the transport subscription
//! - Commands from [`Link`] handles (send, reset, snapshot, close)

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tokio::time::timeout;
use tracing::{debug, error, warn};

use crate::error::{Error, Result};
use crate::identifiers::PeerHandle;
use crate::protocol::{Command, InboundEvent, LineBuffer};
use crate::session::{
    EvaluationHistory, ScanRecord, SessionController, SessionOptions, SessionState,
};

use super::Transport;

// ============================================================================
// LinkSnapshot
// ============================================================================

/// Point-in-time copy of the session state.
#[derive(Debug, Clone)]
pub struct LinkSnapshot {
    /// Connection state.
    pub state: SessionState,
    /// Evaluation history.
    pub history: EvaluationHistory,
    /// Scan results in insertion order.
    pub scans: Vec<ScanRecord>,
}

// ============================================================================
// LinkCommand
// ============================================================================

/// Internal commands for the event loop.
enum LinkCommand {
    /// Frame and write a command.
    Send {
        command: Command,
        response_tx: oneshot::Sender<Result<()>>,
    },
    /// Clear history and scan results.
    Reset,
    /// Copy out the current state.
    Snapshot(oneshot::Sender<LinkSnapshot>),
    /// Disconnect and stop the task.
    Close(oneshot::Sender<Result<()>>),
}

// ============================================================================
// Link
// ============================================================================

/// Handle to a running session over a [`Transport`].
///
/// Cheap to clone; every clone talks to the same task.
#[derive(Clone)]
pub struct Link {
    /// Channel for sending commands to the event loop.
    command_tx: mpsc::UnboundedSender<LinkCommand>,
    /// Display name of the connected peer.
    peer_name: String,
}

impl Link {
    /// Connects through `transport` and starts the session task.
    ///
    /// Returns the handle and the stream of classified inbound events. The
    /// stream ends when the peer's inbound stream does.
    ///
    /// The event stream holds at most `queue_capacity` events. While it is
    /// full the task stops reading inbound notifications and handling
    /// commands, so keep draining the receiver.
    ///
    /// If the subscription fails the peer is disconnected before the error
    /// is returned.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if `options` are invalid
    /// - Any error from [`Transport::connect`] or [`Transport::subscribe`]
    pub async fn open(
        transport: Arc<dyn Transport>,
        options: SessionOptions,
    ) -> Result<(Self, mpsc::Receiver<InboundEvent>)> {
        options.validate()?;

        let peer = transport
            .connect(options.peer_name_prefix.as_deref())
            .await?;
        let inbound = match transport.subscribe(&peer, options.queue_capacity).await {
            Ok(inbound) => inbound,
            Err(e) => {
                error!(error = %e, peer = %peer.name(), "Subscribe failed");
                if let Err(disconnect_err) = transport.disconnect(&peer).await {
                    warn!(error = %disconnect_err, "Disconnect after failed subscribe failed");
                }
                return Err(e);
            }
        };

        let (event_tx, event_rx) = mpsc::channel(options.queue_capacity);
        let mut controller = SessionController::new(options);
        controller.connect(peer.name());

        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let peer_name = peer.name().to_string();

        let task = LinkTask {
            transport,
            peer,
            controller,
            lines: LineBuffer::new(),
            event_tx: Some(event_tx),
        };
        tokio::spawn(task.run(inbound, command_rx));

        Ok((
            Self {
                command_tx,
                peer_name,
            },
            event_rx,
        ))
    }

    /// Display name of the connected peer.
    #[inline]
    #[must_use]
    pub fn peer_name(&self) -> &str {
        &self.peer_name
    }

    /// Frames and writes a command.
    ///
    /// # Errors
    ///
    /// - [`Error::NotConnected`] if the peer has gone away
    /// - [`Error::PayloadTooLong`] if the frame exceeds 64 bytes
    /// - [`Error::Timeout`] if the write exceeds the configured deadline
    /// - [`Error::ConnectionClosed`] if the link was closed
    pub async fn send(&self, command: Command) -> Result<()> {
        let (response_tx, response_rx) = oneshot::channel();
        self.command_tx
            .send(LinkCommand::Send {
                command,
                response_tx,
            })
            .map_err(|_| Error::ConnectionClosed)?;

        response_rx.await.map_err(|_| Error::ConnectionClosed)?
    }

    /// Clears evaluation history and scan results.
    ///
    /// # Errors
    ///
    /// [`Error::ConnectionClosed`] if the link was closed.
    pub fn reset(&self) -> Result<()> {
        self.command_tx
            .send(LinkCommand::Reset)
            .map_err(|_| Error::ConnectionClosed)
    }

    /// Copies the current session state.
    ///
    /// # Errors
    ///
    /// [`Error::ConnectionClosed`] if the link was closed.
    pub async fn snapshot(&self) -> Result<LinkSnapshot> {
        let (tx, rx) = oneshot::channel();
        self.command_tx
            .send(LinkCommand::Snapshot(tx))
            .map_err(|_| Error::ConnectionClosed)?;
        rx.await.map_err(|_| Error::ConnectionClosed)
    }

    /// Disconnects from the peer and stops the task.
    ///
    /// # Errors
    ///
    /// - [`Error::ConnectionClosed`] if the link was already closed
    /// - Any error from [`Transport::disconnect`]
    pub async fn close(&self) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        self.command_tx
            .send(LinkCommand::Close(tx))
            .map_err(|_| Error::ConnectionClosed)?;
        rx.await.map_err(|_| Error::ConnectionClosed)?
    }
}

// ============================================================================
// LinkTask
// ============================================================================

/// State owned by the event loop.
struct LinkTask {
    transport: Arc<dyn Transport>,
    peer: PeerHandle,
    controller: SessionController,
    lines: LineBuffer,
    /// Dropped when the inbound stream ends, closing the event stream.
    event_tx: Option<mpsc::Sender<InboundEvent>>,
}

impl LinkTask {
    /// Event loop serializing inbound and outbound traffic.
    async fn run(
        mut self,
        mut inbound: mpsc::Receiver<Vec<u8>>,
        mut command_rx: mpsc::UnboundedReceiver<LinkCommand>,
    ) {
        let mut inbound_open = true;

        loop {
            tokio::select! {
                // Notifications from the transport
                chunk = inbound.recv(), if inbound_open => {
                    match chunk {
                        Some(chunk) => self.handle_inbound(&chunk).await,
                        None => {
                            warn!(peer = %self.peer.name(), "Inbound stream ended");
                            inbound_open = false;
                            self.flush_partial_line().await;
                            self.controller.disconnect();
                            self.event_tx = None;
                        }
                    }
                }

                // Commands from Link handles
                command = command_rx.recv() => {
                    match command {
                        Some(LinkCommand::Send { command, response_tx }) => {
                            let result = self.handle_send(&command).await;
                            let _ = response_tx.send(result);
                        }

                        Some(LinkCommand::Reset) => self.controller.reset(),

                        Some(LinkCommand::Snapshot(tx)) => {
                            let _ = tx.send(self.snapshot());
                        }

                        Some(LinkCommand::Close(tx)) => {
                            let result = self.transport.disconnect(&self.peer).await;
                            self.controller.dispose();
                            let _ = tx.send(result);
                            break;
                        }

                        None => {
                            debug!("All link handles dropped");
                            if self.controller.is_connected()
                                && let Err(e) = self.transport.disconnect(&self.peer).await
                            {
                                warn!(error = %e, "Disconnect failed");
                            }
                            break;
                        }
                    }
                }
            }
        }

        debug!("Link event loop terminated");
    }

    /// Splits a notification into lines and processes each in order.
    async fn handle_inbound(&mut self, chunk: &[u8]) {
        if self.controller.options().reassemble_lines {
            for line in self.lines.push(chunk) {
                self.process_line(&line).await;
            }
        } else {
            self.process_line(chunk).await;
        }
    }

    /// Processes whatever was left unterminated when the stream ended.
    async fn flush_partial_line(&mut self) {
        if let Some(line) = self.lines.flush() {
            self.process_line(&line).await;
        }
    }

    async fn process_line(&mut self, line: &[u8]) {
        let event = self.controller.on_receive(line);
        // A dropped receiver only means nobody is listening.
        if let Some(event_tx) = &self.event_tx {
            let _ = event_tx.send(event).await;
        }
    }

    async fn handle_send(&mut self, command: &Command) -> Result<()> {
        let bytes = self.controller.send(command)?;
        let write_timeout = self.controller.options().write_timeout();

        match timeout(write_timeout, self.transport.write(&self.peer, &bytes)).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => {
                error!(error = %e, command = %command, "Transport write failed");
                Err(e)
            }
            Err(_) => Err(Error::timeout(
                format!("write {command}"),
                self.controller.options().write_timeout_ms,
            )),
        }
    }

    fn snapshot(&self) -> LinkSnapshot {
        LinkSnapshot {
            state: self.controller.state().clone(),
            history: self.controller.history().clone(),
            scans: self.controller.scan_registry().list(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use crate::protocol::{DeviceType, EvaluationSummary};
    use crate::transport::MemoryTransport;

    async fn open(
        options: SessionOptions,
    ) -> (
        Arc<MemoryTransport>,
        Link,
        mpsc::Receiver<InboundEvent>,
    ) {
        let transport = Arc::new(MemoryTransport::new(["Headphones", "VibeCue-Hub"]));
        let (link, events) = Link::open(transport.clone(), options)
            .await
            .expect("open link");
        (transport, link, events)
    }

    #[tokio::test]
    async fn test_open_uses_prefix_filter() {
        let options = SessionOptions::new().with_peer_name_prefix("VibeCue");
        let (_transport, link, _events) = open(options).await;
        assert_eq!(link.peer_name(), "VibeCue-Hub");
    }

    #[tokio::test]
    async fn test_open_rejects_invalid_options() {
        let transport = Arc::new(MemoryTransport::new(["VibeCue-Hub"]));
        let result = Link::open(transport, SessionOptions::new().with_queue_capacity(0)).await;
        assert!(matches!(result, Err(Error::Config { .. })));
    }

    #[tokio::test]
    async fn test_open_disconnects_when_subscribe_fails() {
        let transport = Arc::new(MemoryTransport::new(["VibeCue-Hub"]));
        transport.set_fail_subscribe(true);

        let result = Link::open(transport.clone(), SessionOptions::new()).await;

        assert!(matches!(result, Err(Error::Transport { .. })));
        assert_eq!(transport.active_peers(), 0);
    }

    #[tokio::test]
    async fn test_event_stream_is_bounded_and_lossless() {
        let (transport, link, mut events) =
            open(SessionOptions::new().with_queue_capacity(1)).await;

        for line in ["#MAN:TIMEOUT", "#ERR:BAD", "#MAN:START_OK"] {
            transport.inject(line.as_bytes().to_vec()).await.expect("inject");
        }

        assert_eq!(events.recv().await, Some(InboundEvent::EvaluationTimeout));
        assert!(matches!(
            events.recv().await,
            Some(InboundEvent::GenericError { .. })
        ));
        assert!(matches!(
            events.recv().await,
            Some(InboundEvent::GenericSuccess { .. })
        ));

        link.snapshot().await.expect("snapshot");
    }

    #[tokio::test]
    async fn test_send_writes_frame() {
        let (transport, link, _events) = open(SessionOptions::new()).await;

        link.send(Command::device_type(DeviceType::Two))
            .await
            .expect("send");

        assert_eq!(transport.written(), vec![b"$DM:TYPE:2\r\n".to_vec()]);
    }

    #[tokio::test]
    async fn test_send_oversize_writes_nothing() {
        let (transport, link, _events) = open(SessionOptions::new()).await;

        let command = Command::freeform(&"Z".repeat(80)).expect("command");
        let err = link.send(command).await.unwrap_err();

        assert!(matches!(err, Error::PayloadTooLong { .. }));
        assert!(transport.written().is_empty());
    }

    #[tokio::test]
    async fn test_write_failure_surfaces() {
        let (transport, link, _events) = open(SessionOptions::new()).await;
        transport.set_fail_writes(true);

        let err = link
            .send(Command::device_type(DeviceType::One))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Transport { .. }));
    }

    #[tokio::test]
    async fn test_inbound_events_in_order() {
        let (transport, link, mut events) = open(SessionOptions::new()).await;

        transport
            .inject(b"#DM:SCAN:FOUND:AABBCCDDEEFF,Sensor1,-65\r\n".to_vec())
            .await
            .expect("inject");
        transport
            .inject(b"#EVAL:STOP:STOP_OK:120,118,45,47,3\r\n".to_vec())
            .await
            .expect("inject");
        transport
            .inject(b"#EVAL:STOP:STOP_OK:12,14,5\r\n".to_vec())
            .await
            .expect("inject");

        let first = events.recv().await.expect("event");
        assert!(matches!(first, InboundEvent::ScanFound { .. }));
        let second = events.recv().await.expect("event");
        assert!(matches!(second, InboundEvent::EvaluationStop { .. }));
        let third = events.recv().await.expect("event");
        assert!(matches!(third, InboundEvent::EvaluationStop { .. }));

        let snapshot = link.snapshot().await.expect("snapshot");
        assert_eq!(snapshot.scans.len(), 1);
        let layouts: Vec<_> = snapshot
            .history
            .iter()
            .map(|entry| matches!(entry.summary, EvaluationSummary::Foot { .. }))
            .collect();
        assert_eq!(layouts, [true, false]);
    }

    #[tokio::test]
    async fn test_line_reassembly() {
        let (transport, _link, mut events) =
            open(SessionOptions::new().with_line_reassembly()).await;

        transport
            .inject(b"#MAN:TIME".to_vec())
            .await
            .expect("inject");
        transport
            .inject(b"OUT\r\n#ERR:BAD\r\n".to_vec())
            .await
            .expect("inject");

        assert_eq!(events.recv().await, Some(InboundEvent::EvaluationTimeout));
        assert!(matches!(
            events.recv().await,
            Some(InboundEvent::GenericError { .. })
        ));
    }

    #[tokio::test]
    async fn test_reset_clears_state() {
        let (transport, link, mut events) = open(SessionOptions::new()).await;

        transport
            .inject(b"#EVAL:STOP:STOP_OK:12,14,5".to_vec())
            .await
            .expect("inject");
        events.recv().await.expect("event");

        link.reset().expect("reset");
        let snapshot = link.snapshot().await.expect("snapshot");
        assert!(snapshot.history.is_empty());
    }

    #[tokio::test]
    async fn test_peer_drop_disconnects_session() {
        let (transport, link, mut events) = open(SessionOptions::new()).await;

        transport.drop_peer();
        assert_eq!(events.recv().await, None);

        let err = link
            .send(Command::device_type(DeviceType::One))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotConnected));
    }

    #[tokio::test]
    async fn test_close_stops_task() {
        let (_transport, link, _events) = open(SessionOptions::new()).await;

        link.close().await.expect("close");

        let err = link
            .send(Command::device_type(DeviceType::One))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ConnectionClosed));
    }
}
