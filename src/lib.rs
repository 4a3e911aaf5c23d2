//! VibeCue session engine.
//!
//! Protocol core for a diagnostic client talking to a VibeCue sensor hub
//! over a short-range wireless link using CRLF-terminated text lines.
//!
//! # Architecture
//!
//! - **Outbound**: [`Command`] builders validate operator input, the
//!   [`SessionController`] adds the `$` sigil and frames the line
//! - **Inbound**: buffers are decoded, classified into an [`InboundEvent`],
//!   and the controller applies scan and evaluation side effects
//! - **Transport**: the radio sits behind the [`Transport`] trait; [`Link`]
//!   runs a controller over any transport in a tokio task
//!
//! # Quick Start
//!
//! ```
//! use vibecue_session::{Command, InboundEvent, SessionController, SessionOptions};
//!
//! let mut session = SessionController::new(SessionOptions::new());
//! session.connect("VibeCue-Hub");
//!
//! let frame = session.send(&Command::connect("5C:F2:86:47:73:59", "L1")?)?;
//! assert_eq!(frame, b"$DM:CONN:5CF286477359:L1\r\n");
//!
//! match session.on_receive(b"#DM:TYPE_FULL:2:4\r\n") {
//!     InboundEvent::DeviceTypeFull { device_type, max } => {
//!         assert_eq!((device_type.as_str(), max.as_str()), ("2", "4"));
//!     }
//!     other => panic!("unexpected event: {other:?}"),
//! }
//! # Ok::<(), vibecue_session::Error>(())
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`error`] | Error types and [`Result`] alias |
//! | [`identifiers`] | Validated MAC and peer handle types |
//! | [`protocol`] | Framing, command grammar, response classification |
//! | [`session`] | Controller, history, scan registry, options, export |
//! | [`transport`] | Transport trait, async link, memory transport |

// ============================================================================
// Modules
// ============================================================================

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Type-safe identifiers.
pub mod identifiers;

/// Line protocol: framing, commands, inbound events.
pub mod protocol;

/// Session state and its owners.
pub mod session;

/// Transport seam and async link.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Error types
pub use error::{Error, Result};

// Identifier types
pub use identifiers::{MacAddress, PeerHandle};

// Protocol types
pub use protocol::{
    Command, DeviceType, EvaluationSummary, InboundEvent, LineBuffer, ManualStart, RawKind,
    SensorLayout,
};

// Session types
pub use session::{
    EvaluationEntry, EvaluationHistory, ScanRecord, ScanRegistry, SessionController,
    SessionOptions, SessionState,
};

// Transport types
pub use transport::{Link, LinkSnapshot, MemoryTransport, Transport};
