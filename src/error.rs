//! Error types for the VibeCue session engine.
//!
//! Every fallible operation in the crate returns [`Result<T>`] which uses
//! [`Error`]. Inbound lines never produce errors: anything the classifier
//! cannot make sense of becomes [`InboundEvent::Unrecognized`].
//!
//! [`InboundEvent::Unrecognized`]: crate::protocol::InboundEvent::Unrecognized
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Command input | [`Error::InvalidMac`], [`Error::MissingField`], [`Error::EmptyCommand`], [`Error::InvalidArgument`] |
//! | Framing | [`Error::PayloadTooLong`] |
//! | Session | [`Error::NotConnected`], [`Error::Config`] |
//! | Transport | [`Error::Transport`], [`Error::ConnectionClosed`], [`Error::Timeout`] |
//! | External | [`Error::Json`] |

// ============================================================================
// Imports
// ============================================================================

use std::result::Result as StdResult;

use thiserror::Error;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Command Input Errors
    // ========================================================================
    /// MAC address is not 12 hex digits once separators are removed.
    #[error("Invalid MAC address: {input:?}")]
    InvalidMac {
        /// The raw operator input.
        input: String,
    },

    /// A required command field was absent or blank.
    #[error("Missing field: {field}")]
    MissingField {
        /// Name of the missing field.
        field: &'static str,
    },

    /// Free-form command was blank after trimming.
    #[error("Empty command")]
    EmptyCommand,

    /// Argument outside its allowed range.
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Description of the invalid argument.
        message: String,
    },

    // ========================================================================
    // Framing Errors
    // ========================================================================
    /// Encoded frame exceeds the link's line limit.
    ///
    /// Nothing is transmitted when this is returned.
    #[error("Payload too long: {len} bytes (max {max})")]
    PayloadTooLong {
        /// Encoded length including the terminator.
        len: usize,
        /// Maximum allowed length.
        max: usize,
    },

    // ========================================================================
    // Session Errors
    // ========================================================================
    /// Send attempted without an active connection.
    #[error("Not connected")]
    NotConnected,

    /// Invalid session configuration.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    // ========================================================================
    // Transport Errors
    // ========================================================================
    /// Transport collaborator reported a failure.
    #[error("Transport error: {message}")]
    Transport {
        /// Description of the transport failure.
        message: String,
    },

    /// Link closed while an operation was in flight.
    #[error("Connection closed")]
    ConnectionClosed,

    /// Operation exceeded its deadline.
    #[error("Timeout after {timeout_ms}ms: {operation}")]
    Timeout {
        /// Description of the operation that timed out.
        operation: String,
        /// Milliseconds waited before timeout.
        timeout_ms: u64,
    },

    // ========================================================================
    // External Errors
    // ========================================================================
    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates an invalid MAC error.
    #[inline]
    pub fn invalid_mac(input: impl Into<String>) -> Self {
        Self::InvalidMac {
            input: input.into(),
        }
    }

    /// Creates a missing field error.
    #[inline]
    pub fn missing_field(field: &'static str) -> Self {
        Self::MissingField { field }
    }

    /// Creates an invalid argument error.
    #[inline]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Creates a payload too long error.
    #[inline]
    pub fn payload_too_long(len: usize, max: usize) -> Self {
        Self::PayloadTooLong { len, max }
    }

    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a transport error.
    #[inline]
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Creates a timeout error.
    #[inline]
    pub fn timeout(operation: impl Into<String>, timeout_ms: u64) -> Self {
        Self::Timeout {
            operation: operation.into(),
            timeout_ms,
        }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if the error was caused by operator input.
    ///
    /// These are rejected before anything is built or sent.
    #[inline]
    #[must_use]
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidMac { .. }
                | Self::MissingField { .. }
                | Self::EmptyCommand
                | Self::InvalidArgument { .. }
                | Self::PayloadTooLong { .. }
        )
    }

    /// Returns `true` if this is a connection error.
    #[inline]
    #[must_use]
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            Self::NotConnected | Self::Transport { .. } | Self::ConnectionClosed
        )
    }

    /// Returns `true` if this is a timeout error.
    #[inline]
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

// ============================================================================
// Tests
// ============================================================================
