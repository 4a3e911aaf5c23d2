//! Outbound command grammar.
//!
//! Commands are built and validated here, then framed by the session
//! controller. The builder never adds the `$` sigil or the terminator.
//!
//! # Grammar
//!
//! | Command | Body |
//! |---------|------|
//! | Device type | `DM:TYPE:{1..4}` |
//! | Connect | `DM:CONN:{MAC}:{location}` |
//! | Manual start | `MAN:START:{freq},{intensity},{minutes},{loc1}[,{loc2}...]` |
//! | Free-form | any non-blank text |

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::identifiers::MacAddress;
use crate::session::ScanRecord;

use super::frame::OUTBOUND_SIGIL;

// ============================================================================
// DeviceType
// ============================================================================

/// Sensor layout family the hub should manage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum DeviceType {
    /// Type 1.
    One = 1,
    /// Type 2.
    Two = 2,
    /// Type 3.
    Three = 3,
    /// Type 4.
    Four = 4,
}

impl DeviceType {
    /// Wire code of the device type.
    #[inline]
    #[must_use]
    pub const fn code(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for DeviceType {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            1 => Ok(Self::One),
            2 => Ok(Self::Two),
            3 => Ok(Self::Three),
            4 => Ok(Self::Four),
            other => Err(Error::invalid_argument(format!(
                "device type must be 1-4, got {other}"
            ))),
        }
    }
}

impl From<DeviceType> for u8 {
    fn from(value: DeviceType) -> Self {
        value.code()
    }
}

// ============================================================================
// Command
// ============================================================================

/// A validated protocol command body.
///
/// Immutable once built. Use the constructors below; there is no way to
/// produce a `Command` that skipped validation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Command {
    body: String,
}

impl Command {
    /// Selects the device type: `DM:TYPE:{type}`.
    #[must_use]
    pub fn device_type(device_type: DeviceType) -> Self {
        Self {
            body: format!("DM:TYPE:{}", device_type.code()),
        }
    }

    /// Connects a sensor by MAC to a location: `DM:CONN:{mac}:{location}`.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidMac`] if the MAC is not 12 hex digits after
    ///   removing `:`/`-` separators
    /// - [`Error::MissingField`] if the location is blank
    /// - [`Error::InvalidArgument`] if the location contains a separator
    pub fn connect(raw_mac: &str, location: &str) -> Result<Self> {
        let mac = MacAddress::parse(raw_mac)?;
        let location = location_code(location)?;

        Ok(Self {
            body: format!("DM:CONN:{mac}:{location}"),
        })
    }

    /// Connects a discovered peer to a location.
    ///
    /// # Errors
    ///
    /// Same as [`Command::connect`].
    pub fn scan_select(record: &ScanRecord, location: &str) -> Result<Self> {
        Self::connect(&record.id, location)
    }

    /// Starts building a manual stimulation command.
    #[inline]
    #[must_use]
    pub fn manual_start() -> ManualStart {
        ManualStart::default()
    }

    /// Sends operator text unchanged apart from trimming.
    ///
    /// # Errors
    ///
    /// [`Error::EmptyCommand`] if the text is blank.
    pub fn freeform(text: &str) -> Result<Self> {
        let text = text.trim();
        if text.is_empty() {
            return Err(Error::EmptyCommand);
        }

        Ok(Self {
            body: text.to_string(),
        })
    }

    /// Command body without sigil or terminator.
    #[inline]
    #[must_use]
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Body with the outbound `$` sigil, ready for framing.
    #[must_use]
    pub fn to_line(&self) -> String {
        let mut line = String::with_capacity(self.body.len() + 1);
        line.push(OUTBOUND_SIGIL);
        line.push_str(&self.body);
        line
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.body)
    }
}

// ============================================================================
// ManualStart
// ============================================================================

/// Builder for `MAN:START:{freq},{intensity},{minutes},{locations}`.
///
/// Every numeric field is required and at least one location must be
/// selected. Locations keep their selection order; repeats are ignored.
#[derive(Debug, Default, Clone)]
pub struct ManualStart {
    frequency: Option<u32>,
    intensity: Option<u32>,
    duration_minutes: Option<u32>,
    locations: Vec<String>,
}

impl ManualStart {
    /// Sets the stimulation frequency.
    #[inline]
    #[must_use]
    pub fn frequency(mut self, value: u32) -> Self {
        self.frequency = Some(value);
        self
    }

    /// Sets the stimulation intensity.
    #[inline]
    #[must_use]
    pub fn intensity(mut self, value: u32) -> Self {
        self.intensity = Some(value);
        self
    }

    /// Sets the session duration in minutes.
    #[inline]
    #[must_use]
    pub fn duration_minutes(mut self, value: u32) -> Self {
        self.duration_minutes = Some(value);
        self
    }

    /// Adds a location to the selection.
    #[must_use]
    pub fn location(mut self, code: impl Into<String>) -> Self {
        let code = code.into().trim().to_string();
        if !self.locations.contains(&code) {
            self.locations.push(code);
        }
        self
    }

    /// Adds several locations in order.
    #[must_use]
    pub fn locations<I, S>(self, codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        codes
            .into_iter()
            .fold(self, |builder, code| builder.location(code))
    }

    /// Validates and builds the command.
    ///
    /// # Errors
    ///
    /// - [`Error::MissingField`] if a numeric field is unset or no
    ///   location was selected
    /// - [`Error::InvalidArgument`] if a location contains a separator
    pub fn build(self) -> Result<Command> {
        let frequency = self.frequency.ok_or_else(|| Error::missing_field("frequency"))?;
        let intensity = self.intensity.ok_or_else(|| Error::missing_field("intensity"))?;
        let minutes = self
            .duration_minutes
            .ok_or_else(|| Error::missing_field("duration_minutes"))?;

        let locations = self
            .locations
            .iter()
            .map(|code| location_code(code))
            .collect::<Result<Vec<_>>>()?;
        if locations.is_empty() {
            return Err(Error::missing_field("locations"));
        }

        Ok(Command {
            body: format!(
                "MAN:START:{frequency},{intensity},{minutes},{}",
                locations.join(",")
            ),
        })
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Trims a location code and rejects grammar separators.
fn location_code(raw: &str) -> Result<&str> {
    let code = raw.trim();
    if code.is_empty() {
        return Err(Error::missing_field("location"));
    }
    if code.contains([':', ',']) || code.contains(char::is_whitespace) {
        return Err(Error::invalid_argument(format!(
            "location code {code:?} contains a separator"
        )));
    }
    Ok(code)
}

// ============================================================================
// Tests
// ============================================================================
