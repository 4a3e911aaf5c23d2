//! Session state and its owners.
//!
//! # Components
//!
//! | Type | Description |
//! |------|-------------|
//! | [`SessionController`] | Owns all session state, frames and classifies |
//! | [`EvaluationHistory`] | Append-only evaluation summaries |
//! | [`ScanRegistry`] | Deduplicated scan results |
//! | [`SessionOptions`] | Configuration |

// ============================================================================
// Submodules
// ============================================================================

/// Session controller and state.
pub mod controller;

/// CSV export of evaluation history.
pub mod export;

/// Evaluation history.
pub mod history;

/// Session configuration.
pub mod options;

/// Scan result registry.
pub mod scan;

// ============================================================================
// Re-exports
// ============================================================================

pub use controller::{SessionController, SessionState};
pub use history::{EvaluationEntry, EvaluationHistory};
pub use options::SessionOptions;
pub use scan::{ScanRecord, ScanRegistry};
