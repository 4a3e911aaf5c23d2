//! Delimited-text export of evaluation history.
//!
//! The column set follows the layout of the first entry. Entries recorded
//! with the other layout do not fit those columns and are skipped.

// ============================================================================
// Imports
// ============================================================================

use chrono::SecondsFormat;

use crate::protocol::{EvaluationSummary, SensorLayout};

use super::history::EvaluationHistory;

// ============================================================================
// Constants
// ============================================================================

const FOOT_HEADER: &str =
    "timestamp,left_avg_distance,right_avg_distance,left_avg_speed,right_avg_speed,asymmetry_pct";

const BACK_HEADER: &str = "timestamp,left_avg_tilt,right_avg_tilt,asymmetry_pct";

// ============================================================================
// Export
// ============================================================================

/// Renders the history as CSV with a header row.
///
/// Returns an empty string for an empty history.
#[must_use]
pub fn to_csv(history: &EvaluationHistory) -> String {
    let Some(layout) = history.layout() else {
        return String::new();
    };

    let mut out = String::new();
    out.push_str(match layout {
        SensorLayout::Foot => FOOT_HEADER,
        SensorLayout::Back => BACK_HEADER,
    });
    out.push('\n');

    for entry in history.iter() {
        let timestamp = entry.captured_at.to_rfc3339_opts(SecondsFormat::Secs, true);
        let row = match entry.summary {
            EvaluationSummary::Foot {
                left_avg_distance,
                right_avg_distance,
                left_avg_speed,
                right_avg_speed,
                asymmetry_pct,
            } if layout == SensorLayout::Foot => format!(
                "{timestamp},{left_avg_distance},{right_avg_distance},{left_avg_speed},{right_avg_speed},{asymmetry_pct}"
            ),
            EvaluationSummary::Back {
                left_avg_tilt,
                right_avg_tilt,
                asymmetry_pct,
            } if layout == SensorLayout::Back => {
                format!("{timestamp},{left_avg_tilt},{right_avg_tilt},{asymmetry_pct}")
            }
            _ => continue,
        };
        out.push_str(&row);
        out.push('\n');
    }

    out
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::{TimeZone, Utc};

    #[test]
    fn test_empty_history() {
        assert_eq!(to_csv(&EvaluationHistory::new()), "");
    }

    #[test]
    fn test_foot_columns_skip_back_entries() {
        let at = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();
        let mut history = EvaluationHistory::new();
        history.record(
            EvaluationSummary::Foot {
                left_avg_distance: 120,
                right_avg_distance: 118,
                left_avg_speed: 45,
                right_avg_speed: 47,
                asymmetry_pct: 3,
            },
            at,
        );
        history.record(
            EvaluationSummary::Back {
                left_avg_tilt: 1,
                right_avg_tilt: 2,
                asymmetry_pct: 3,
            },
            at,
        );

        let csv = to_csv(&history);
        let lines: Vec<_> = csv.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], FOOT_HEADER);
        assert_eq!(lines[1], "2026-01-02T03:04:05Z,120,118,45,47,3");
    }

    #[test]
    fn test_back_columns() {
        let at = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();
        let mut history = EvaluationHistory::new();
        history.record(
            EvaluationSummary::Back {
                left_avg_tilt: 12,
                right_avg_tilt: -14,
                asymmetry_pct: 5,
            },
            at,
        );

        assert_eq!(
            to_csv(&history),
            format!("{BACK_HEADER}\n2026-01-02T03:04:05Z,12,-14,5\n")
        );
    }

    #[test]
    fn test_rows_resume_after_skipped_entry() {
        let at = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();
        let back = |tilt| EvaluationSummary::Back {
            left_avg_tilt: tilt,
            right_avg_tilt: tilt,
            asymmetry_pct: 0,
        };
        let mut history = EvaluationHistory::new();
        history.record(back(1), at);
        history.record(
            EvaluationSummary::Foot {
                left_avg_distance: 1,
                right_avg_distance: 1,
                left_avg_speed: 1,
                right_avg_speed: 1,
                asymmetry_pct: 0,
            },
            at,
        );
        history.record(back(2), at);

        assert_eq!(
            to_csv(&history),
            format!(
                "{BACK_HEADER}\n2026-01-02T03:04:05Z,1,1,0\n2026-01-02T03:04:05Z,2,2,0\n"
            )
        );
    }
}
