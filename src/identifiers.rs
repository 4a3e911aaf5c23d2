//! Type-safe identifiers for devices and peers.
//!
//! Newtype wrappers keep validated values apart from raw operator input.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Twelve uppercase hex digits, no separators.
static MAC_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9A-F]{12}$").expect("valid MAC pattern"));

// ============================================================================
// MacAddress
// ============================================================================

/// Normalized device MAC address.
///
/// Always 12 uppercase hex characters without `:` or `-` separators.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MacAddress(String);

impl MacAddress {
    /// Parses operator input into a normalized address.
    ///
    /// Separators `:` and `-` are stripped and letters uppercased before
    /// validation, so `5c:f2:86:47:73:59` and `5CF286477359` are equal.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidMac`] unless exactly 12 hex digits remain.
    pub fn parse(raw: &str) -> Result<Self> {
        let normalized: String = raw
            .trim()
            .chars()
            .filter(|c| !matches!(c, ':' | '-'))
            .collect::<String>()
            .to_ascii_uppercase();

        if MAC_PATTERN.is_match(&normalized) {
            Ok(Self(normalized))
        } else {
            Err(Error::invalid_mac(raw))
        }
    }

    /// Returns the normalized string form.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for MacAddress {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<MacAddress> for String {
    fn from(mac: MacAddress) -> Self {
        mac.0
    }
}

// ============================================================================
// PeerHandle
// ============================================================================

/// Opaque handle to a connected peer, issued by a transport.
///
/// The session only ever reads the display name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PeerHandle {
    id: u64,
    name: String,
}

impl PeerHandle {
    /// Creates a new handle.
    #[inline]
    #[must_use]
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }

    /// Transport-assigned identifier.
    #[inline]
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Display name of the peer.
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

// ============================================================================
// Tests
// ============================================================================
