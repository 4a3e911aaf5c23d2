//! Discovered peer registry.
//!
//! Scan results keyed by peer id, kept in first-seen order. No ordering by
//! signal strength is implied.

// ============================================================================
// Imports
// ============================================================================

use indexmap::IndexMap;
use rustc_hash::FxBuildHasher;
use serde::Serialize;
use tracing::debug;

// ============================================================================
// ScanRecord
// ============================================================================

/// A peer seen during a scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanRecord {
    /// Peer identifier (MAC).
    pub id: String,
    /// Most recent RSSI in dBm.
    pub signal_strength: i32,
    /// Name from the first observation.
    pub display_name: String,
}

// ============================================================================
// ScanRegistry
// ============================================================================

/// Deduplicated scan results.
#[derive(Debug, Default, Clone)]
pub struct ScanRegistry {
    records: IndexMap<String, ScanRecord, FxBuildHasher>,
}

impl ScanRegistry {
    /// Creates an empty registry.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a new peer or refreshes a known one.
    ///
    /// A known peer only has its signal strength updated; the display name
    /// stays as first recorded.
    pub fn upsert(&mut self, id: &str, signal_strength: i32, display_name: &str) {
        if let Some(record) = self.records.get_mut(id) {
            record.signal_strength = signal_strength;
            debug!(id, signal_strength, "Scan record updated");
            return;
        }

        self.records.insert(
            id.to_string(),
            ScanRecord {
                id: id.to_string(),
                signal_strength,
                display_name: display_name.to_string(),
            },
        );
        debug!(id, signal_strength, display_name, "Scan record added");
    }

    /// Removes every record.
    pub fn clear(&mut self) {
        if !self.records.is_empty() {
            debug!(count = self.records.len(), "Scan registry cleared");
        }
        self.records.clear();
    }

    /// Records in insertion order.
    #[must_use]
    pub fn list(&self) -> Vec<ScanRecord> {
        self.records.values().cloned().collect()
    }

    /// Looks up a record by id.
    #[inline]
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&ScanRecord> {
        self.records.get(id)
    }

    /// Number of records.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if no peers are known.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

// ============================================================================
// Tests
// ============================================================================
