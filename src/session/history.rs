//! Evaluation history.
//!
//! Append-only record of evaluation summaries in arrival order, each
//! stamped when it was recorded. Entries are never edited; the history is
//! only appended to or cleared as a whole.

// ============================================================================
// Imports
// ============================================================================

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::protocol::{EvaluationSummary, SensorLayout};

// ============================================================================
// EvaluationEntry
// ============================================================================

/// A summary and the time it was captured.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EvaluationEntry {
    /// Capture time.
    pub captured_at: DateTime<Utc>,
    /// Reported averages.
    pub summary: EvaluationSummary,
}

// ============================================================================
// EvaluationHistory
// ============================================================================

/// Ordered evaluation summaries for the current session.
#[derive(Debug, Default, Clone, Serialize)]
pub struct EvaluationHistory {
    entries: Vec<EvaluationEntry>,
}

impl EvaluationHistory {
    /// Creates an empty history.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a summary. No deduplication or cap is applied.
    pub fn record(&mut self, summary: EvaluationSummary, captured_at: DateTime<Utc>) {
        self.entries.push(EvaluationEntry {
            captured_at,
            summary,
        });
    }

    /// Drops every entry.
    pub fn reset(&mut self) {
        self.entries = Vec::new();
    }

    /// Entries in arrival order.
    pub fn iter(&self) -> impl Iterator<Item = &EvaluationEntry> {
        self.entries.iter()
    }

    /// Entries as a slice.
    #[inline]
    #[must_use]
    pub fn entries(&self) -> &[EvaluationEntry] {
        &self.entries
    }

    /// Most recent entry.
    #[inline]
    #[must_use]
    pub fn latest(&self) -> Option<&EvaluationEntry> {
        self.entries.last()
    }

    /// Layout of the leading entry, which decides the export columns.
    #[must_use]
    pub fn layout(&self) -> Option<SensorLayout> {
        self.entries.first().map(|entry| entry.summary.layout())
    }

    /// Number of entries.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing has been recorded.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ============================================================================
// Tests
// ============================================================================
