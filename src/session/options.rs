//! Session configuration.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use vibecue_session::SessionOptions;
//!
//! let options = SessionOptions::new()
//!     .with_peer_name_prefix("VibeCue")
//!     .with_write_timeout(Duration::from_secs(2));
//!
//! assert!(options.validate().is_ok());
//! ```
//!
//! Options can also be loaded from JSON; absent keys keep their defaults:
//!
//! ```
//! use vibecue_session::SessionOptions;
//!
//! let options = SessionOptions::from_json(r#"{ "write_timeout_ms": 500 }"#)?;
//! assert_eq!(options.write_timeout_ms, 500);
//! # Ok::<(), vibecue_session::Error>(())
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Default write deadline in milliseconds.
const DEFAULT_WRITE_TIMEOUT_MS: u64 = 5_000;

/// Default inbound queue depth.
const DEFAULT_QUEUE_CAPACITY: usize = 256;

// ============================================================================
// SessionOptions
// ============================================================================

/// Session and link configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionOptions {
    /// Deadline for a single transport write, in milliseconds.
    pub write_timeout_ms: u64,

    /// Depth of the inbound buffer queue feeding the session task.
    pub queue_capacity: usize,

    /// Only peers whose name starts with this prefix are offered on connect.
    pub peer_name_prefix: Option<String>,

    /// Log every inbound and outbound frame at debug level.
    pub log_raw_frames: bool,

    /// Reassemble lines split across notifications.
    ///
    /// When off, every notification is treated as one whole line.
    pub reassemble_lines: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Constructors
// ============================================================================

impl SessionOptions {
    /// Creates options with default settings.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            write_timeout_ms: DEFAULT_WRITE_TIMEOUT_MS,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            peer_name_prefix: None,
            log_raw_frames: false,
            reassemble_lines: false,
        }
    }

    /// Parses options from a JSON document.
    ///
    /// # Errors
    ///
    /// - [`Error::Json`] if the document is malformed
    /// - [`Error::Config`] if a value is out of range
    pub fn from_json(json: &str) -> Result<Self> {
        let options: Self = serde_json::from_str(json)?;
        options.validate()?;
        Ok(options)
    }
}

// ============================================================================
// Builder Methods
// ============================================================================

impl SessionOptions {
    /// Sets the write deadline.
    #[inline]
    #[must_use]
    pub fn with_write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Sets the inbound queue depth.
    #[inline]
    #[must_use]
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    /// Restricts connect to peers with this name prefix.
    #[inline]
    #[must_use]
    pub fn with_peer_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.peer_name_prefix = Some(prefix.into());
        self
    }

    /// Enables per-frame debug logging.
    #[inline]
    #[must_use]
    pub fn with_raw_frame_logging(mut self) -> Self {
        self.log_raw_frames = true;
        self
    }

    /// Buffers notifications until a line terminator arrives.
    #[inline]
    #[must_use]
    pub fn with_line_reassembly(mut self) -> Self {
        self.reassemble_lines = true;
        self
    }
}

// ============================================================================
// Accessors
// ============================================================================

impl SessionOptions {
    /// Write deadline as a [`Duration`].
    #[inline]
    #[must_use]
    pub fn write_timeout(&self) -> Duration {
        Duration::from_millis(self.write_timeout_ms)
    }

    /// Checks every value is usable.
    ///
    /// # Errors
    ///
    /// [`Error::Config`] naming the first invalid value.
    pub fn validate(&self) -> Result<()> {
        if self.write_timeout_ms == 0 {
            return Err(Error::config("write_timeout_ms must be greater than 0"));
        }
        if self.queue_capacity == 0 {
            return Err(Error::config("queue_capacity must be greater than 0"));
        }
        if self
            .peer_name_prefix
            .as_deref()
            .is_some_and(|prefix| prefix.trim().is_empty())
        {
            return Err(Error::config("peer_name_prefix must not be blank"));
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
