//! VibeCue line protocol.
//!
//! This module defines the text protocol spoken between the client and the
//! hub over the wireless link.
//!
//! # Protocol Overview
//!
//! | Message | Direction | Shape |
//! |---------|-----------|-------|
//! | Command | Client → Hub | `$` + body + CRLF |
//! | Response | Hub → Client | `#` + body + CRLF |
//!
//! Frames are at most 64 bytes including the terminator. There is no
//! header, length prefix or checksum.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `command` | Outbound command builders |
//! | `event` | Inbound line classification |
//! | `frame` | Line encoding, decoding and reassembly |

// ============================================================================
// Submodules
// ============================================================================

/// Outbound command builders.
pub mod command;

/// Inbound line classification.
pub mod event;

/// Line framing.
pub mod frame;

// ============================================================================
// Re-exports
// ============================================================================

pub use command::{Command, DeviceType, ManualStart};
pub use event::{EvaluationSummary, InboundEvent, RawKind, SensorLayout};
pub use frame::{LineBuffer, MAX_FRAME_LEN};
