//! Inbound response classification.
//!
//! Every line received from the hub maps to exactly one [`InboundEvent`].
//! Classification is total and pure: malformed input becomes
//! [`InboundEvent::Unrecognized`] and nothing here touches session state.
//!
//! # Rule Order
//!
//! Marker tokens overlap, so rules are evaluated in a fixed order and the
//! first match wins:
//!
//! | # | Match | Event |
//! |---|-------|-------|
//! | 1 | prefix `#BLE:RAW:` | `RawTransportEvent` |
//! | 2 | prefix `#DM:SCAN:FOUND:` | `ScanFound` |
//! | 3 | contains `INIT_OK` / `SCAN_STARTED` | `GenericSuccess` (scan reset) |
//! | 4 | contains `DUP_MAC:` | `DuplicateIdentifier` |
//! | 5 | contains `DUP_LOC:` | `DuplicateSlot` |
//! | 6 | contains `LOC_NOT_ALLOWED:` | `SlotNotAllowed` |
//! | 7 | contains `TYPE_FULL:` | `DeviceTypeFull` |
//! | 8 | contains `NO_TYPE` | `NoDeviceTypeSet` |
//! | 9 | contains `SLOT_FULL:` | `SlotCapacityExceeded` |
//! | 10 | prefix `#EVAL:STOP:STOP_OK:` | `EvaluationStop` |
//! | 11 | prefix `#MAN:TIMEOUT` | `EvaluationTimeout` |
//! | 12 | prefix `#ERR` | `GenericError` |
//! | 13 | prefix `#` | `GenericSuccess` |
//! | 14 | anything else | `Unrecognized` |
//!
//! Marker fields are read by index from the whole line split on `:`, so
//! `#DM:TYPE_FULL:2:4` yields device type `"2"` and max `"4"`.

// ============================================================================
// Imports
// ============================================================================

use serde::Serialize;
use tracing::{trace, warn};

// ============================================================================
// Constants
// ============================================================================

const RAW_PREFIX: &str = "#BLE:RAW:";
const SCAN_FOUND_PREFIX: &str = "#DM:SCAN:FOUND:";
const EVAL_STOP_PREFIX: &str = "#EVAL:STOP:STOP_OK:";
const TIMEOUT_PREFIX: &str = "#MAN:TIMEOUT";
const ERROR_PREFIX: &str = "#ERR";

/// Placeholder for missing identifier/slot segments.
const UNKNOWN_FIELD: &str = "unknown";

/// Placeholder for a missing device-type capacity.
const UNKNOWN_MAX: &str = "?";

/// Placeholder for a missing slot capacity.
const DEFAULT_SLOT_MAX: &str = "8";

// ============================================================================
// RawKind
// ============================================================================

/// Status reported by the hub's radio module in a `#BLE:RAW:` line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RawKind {
    /// `+OK`
    Ok,
    /// `+READY`
    Ready,
    /// `+MULTI`
    Multi,
    /// `+CONN...`
    Connected,
    /// `+DISCONN...`
    Disconnected,
    /// Anything else.
    Unknown,
}

impl RawKind {
    /// Derives the kind from the text after `#BLE:RAW:`.
    #[must_use]
    pub fn from_status(status: &str) -> Self {
        match status.trim() {
            "+OK" => Self::Ok,
            "+READY" => Self::Ready,
            "+MULTI" => Self::Multi,
            s if s.starts_with("+CONN") => Self::Connected,
            s if s.starts_with("+DISCONN") => Self::Disconnected,
            _ => Self::Unknown,
        }
    }
}

// ============================================================================
// EvaluationSummary
// ============================================================================

/// Sensor layout an evaluation was captured with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorLayout {
    /// Left/right foot sensors.
    Foot,
    /// Left/right back sensors.
    Back,
}

/// Averages reported when an evaluation stops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "layout", rename_all = "snake_case")]
pub enum EvaluationSummary {
    /// Five-field foot summary.
    Foot {
        /// Left average stride distance.
        left_avg_distance: i32,
        /// Right average stride distance.
        right_avg_distance: i32,
        /// Left average speed.
        left_avg_speed: i32,
        /// Right average speed.
        right_avg_speed: i32,
        /// Left/right asymmetry percentage.
        asymmetry_pct: i32,
    },

    /// Three-field back summary.
    Back {
        /// Left average tilt.
        left_avg_tilt: i32,
        /// Right average tilt.
        right_avg_tilt: i32,
        /// Left/right asymmetry percentage.
        asymmetry_pct: i32,
    },
}

impl EvaluationSummary {
    /// Builds a summary from its numeric fields.
    ///
    /// Returns `None` unless there are exactly 5 (foot) or 3 (back) values.
    #[must_use]
    pub fn from_fields(fields: &[i32]) -> Option<Self> {
        match *fields {
            [
                left_avg_distance,
                right_avg_distance,
                left_avg_speed,
                right_avg_speed,
                asymmetry_pct,
            ] => Some(Self::Foot {
                left_avg_distance,
                right_avg_distance,
                left_avg_speed,
                right_avg_speed,
                asymmetry_pct,
            }),
            [left_avg_tilt, right_avg_tilt, asymmetry_pct] => Some(Self::Back {
                left_avg_tilt,
                right_avg_tilt,
                asymmetry_pct,
            }),
            _ => None,
        }
    }

    /// Layout the summary belongs to.
    #[inline]
    #[must_use]
    pub fn layout(&self) -> SensorLayout {
        match self {
            Self::Foot { .. } => SensorLayout::Foot,
            Self::Back { .. } => SensorLayout::Back,
        }
    }

    /// Asymmetry percentage, present in both layouts.
    #[inline]
    #[must_use]
    pub fn asymmetry_pct(&self) -> i32 {
        match self {
            Self::Foot { asymmetry_pct, .. } | Self::Back { asymmetry_pct, .. } => *asymmetry_pct,
        }
    }
}

// ============================================================================
// InboundEvent
// ============================================================================

/// Typed result of classifying one inbound line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundEvent {
    /// Pass-through status from the hub's radio module.
    RawTransportEvent {
        /// Derived status kind.
        kind: RawKind,
        /// Text after `#BLE:RAW:`.
        raw: String,
    },

    /// A peer was discovered during a scan.
    ScanFound {
        /// Peer identifier (MAC).
        id: String,
        /// Advertised name.
        display_name: String,
        /// RSSI in dBm.
        signal_strength: i32,
    },

    /// The MAC is already assigned to another slot.
    DuplicateIdentifier {
        /// Rejected identifier.
        id: String,
        /// Slot already holding it.
        existing_slot: String,
    },

    /// The slot is already taken by another sensor.
    DuplicateSlot {
        /// Rejected slot.
        slot: String,
        /// Identifier already in the slot.
        existing_id: String,
    },

    /// The slot is not valid for the current device type.
    SlotNotAllowed {
        /// Rejected slot.
        slot: String,
        /// Active device type.
        device_type: String,
    },

    /// No more sensors of this device type may be connected.
    DeviceTypeFull {
        /// Device type.
        device_type: String,
        /// Capacity for the type.
        max: String,
    },

    /// A connect was attempted before selecting a device type.
    NoDeviceTypeSet,

    /// Hub slot capacity reached.
    SlotCapacityExceeded {
        /// Slot capacity.
        max: String,
    },

    /// Evaluation stopped with a summary.
    EvaluationStop {
        /// Reported averages.
        summary: EvaluationSummary,
    },

    /// Manual session timed out on the device.
    EvaluationTimeout,

    /// Device reported an error.
    GenericError {
        /// Full line.
        raw: String,
    },

    /// Device acknowledged a command.
    GenericSuccess {
        /// Full line.
        raw: String,
        /// `true` for `INIT_OK`/`SCAN_STARTED`, which invalidate scan results.
        scan_reset: bool,
    },

    /// Line matched no rule or failed to parse.
    Unrecognized {
        /// Full line.
        raw: String,
    },
}

impl InboundEvent {
    /// Classifies a decoded line. Never fails.
    #[must_use]
    pub fn classify(line: &str) -> Self {
        for rule in RULES {
            if (rule.matches)(line) {
                trace!(rule = rule.name, "Line matched");
                return (rule.extract)(line).unwrap_or_else(|| Self::unrecognized(line));
            }
        }
        Self::unrecognized(line)
    }

    /// Returns `true` if the device rejected a request or failed.
    #[must_use]
    pub fn is_error(&self) -> bool {
        matches!(
            self,
            Self::DuplicateIdentifier { .. }
                | Self::DuplicateSlot { .. }
                | Self::SlotNotAllowed { .. }
                | Self::DeviceTypeFull { .. }
                | Self::NoDeviceTypeSet
                | Self::SlotCapacityExceeded { .. }
                | Self::EvaluationTimeout
                | Self::GenericError { .. }
        )
    }

    /// Short name of the variant, for logs.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::RawTransportEvent { .. } => "raw_transport_event",
            Self::ScanFound { .. } => "scan_found",
            Self::DuplicateIdentifier { .. } => "duplicate_identifier",
            Self::DuplicateSlot { .. } => "duplicate_slot",
            Self::SlotNotAllowed { .. } => "slot_not_allowed",
            Self::DeviceTypeFull { .. } => "device_type_full",
            Self::NoDeviceTypeSet => "no_device_type_set",
            Self::SlotCapacityExceeded { .. } => "slot_capacity_exceeded",
            Self::EvaluationStop { .. } => "evaluation_stop",
            Self::EvaluationTimeout => "evaluation_timeout",
            Self::GenericError { .. } => "generic_error",
            Self::GenericSuccess { .. } => "generic_success",
            Self::Unrecognized { .. } => "unrecognized",
        }
    }

    fn unrecognized(line: &str) -> Self {
        Self::Unrecognized {
            raw: line.to_string(),
        }
    }
}

// ============================================================================
// Rule Table
// ============================================================================

/// One classification rule: predicate plus extractor.
///
/// An extractor returning `None` means the line matched but failed to parse;
/// it becomes `Unrecognized` rather than falling through to later rules.
struct Rule {
    name: &'static str,
    matches: fn(&str) -> bool,
    extract: fn(&str) -> Option<InboundEvent>,
}

static RULES: &[Rule] = &[
    Rule {
        name: "raw",
        matches: |line| line.starts_with(RAW_PREFIX),
        extract: extract_raw,
    },
    Rule {
        name: "scan_found",
        matches: |line| line.starts_with(SCAN_FOUND_PREFIX),
        extract: extract_scan_found,
    },
    Rule {
        name: "scan_reset",
        matches: |line| line.contains("INIT_OK") || line.contains("SCAN_STARTED"),
        extract: |line| {
            Some(InboundEvent::GenericSuccess {
                raw: line.to_string(),
                scan_reset: true,
            })
        },
    },
    Rule {
        name: "dup_mac",
        matches: |line| line.contains("DUP_MAC:"),
        extract: |line| {
            Some(InboundEvent::DuplicateIdentifier {
                id: segment(line, 2, UNKNOWN_FIELD),
                existing_slot: segment(line, 3, UNKNOWN_FIELD),
            })
        },
    },
    Rule {
        name: "dup_loc",
        matches: |line| line.contains("DUP_LOC:"),
        extract: |line| {
            Some(InboundEvent::DuplicateSlot {
                slot: segment(line, 2, UNKNOWN_FIELD),
                existing_id: segment(line, 3, UNKNOWN_FIELD),
            })
        },
    },
    Rule {
        name: "loc_not_allowed",
        matches: |line| line.contains("LOC_NOT_ALLOWED:"),
        extract: |line| {
            Some(InboundEvent::SlotNotAllowed {
                slot: segment(line, 2, UNKNOWN_FIELD),
                device_type: segment(line, 3, UNKNOWN_FIELD),
            })
        },
    },
    Rule {
        name: "type_full",
        matches: |line| line.contains("TYPE_FULL:"),
        extract: |line| {
            Some(InboundEvent::DeviceTypeFull {
                device_type: segment(line, 2, UNKNOWN_MAX),
                max: segment(line, 3, UNKNOWN_MAX),
            })
        },
    },
    Rule {
        name: "no_type",
        matches: |line| line.contains("NO_TYPE"),
        extract: |_| Some(InboundEvent::NoDeviceTypeSet),
    },
    Rule {
        name: "slot_full",
        matches: |line| line.contains("SLOT_FULL:"),
        extract: |line| {
            Some(InboundEvent::SlotCapacityExceeded {
                max: segment(line, 2, DEFAULT_SLOT_MAX),
            })
        },
    },
    Rule {
        name: "eval_stop",
        matches: |line| line.starts_with(EVAL_STOP_PREFIX),
        extract: extract_eval_stop,
    },
    Rule {
        name: "timeout",
        matches: |line| line.starts_with(TIMEOUT_PREFIX),
        extract: |_| Some(InboundEvent::EvaluationTimeout),
    },
    Rule {
        name: "error",
        matches: |line| line.starts_with(ERROR_PREFIX),
        extract: |line| {
            Some(InboundEvent::GenericError {
                raw: line.to_string(),
            })
        },
    },
    Rule {
        name: "success",
        matches: |line| line.starts_with('#'),
        extract: |line| {
            Some(InboundEvent::GenericSuccess {
                raw: line.to_string(),
                scan_reset: false,
            })
        },
    },
];

// ============================================================================
// Extractors
// ============================================================================

/// Colon segment `index` of the whole line, or `default` if absent or empty.
fn segment(line: &str, index: usize, default: &str) -> String {
    line.split(':')
        .nth(index)
        .filter(|s| !s.is_empty())
        .unwrap_or(default)
        .to_string()
}

fn extract_raw(line: &str) -> Option<InboundEvent> {
    let status = line.strip_prefix(RAW_PREFIX)?;
    Some(InboundEvent::RawTransportEvent {
        kind: RawKind::from_status(status),
        raw: status.to_string(),
    })
}

/// `<mac>,<name>,<rssi>`; the name may itself contain commas.
fn extract_scan_found(line: &str) -> Option<InboundEvent> {
    let payload = line.strip_prefix(SCAN_FOUND_PREFIX)?;
    let (id, rest) = payload.split_once(',')?;
    let (display_name, rssi) = rest.rsplit_once(',')?;

    let Ok(signal_strength) = rssi.trim().parse::<i32>() else {
        warn!(line, "Malformed RSSI in scan result");
        return None;
    };

    Some(InboundEvent::ScanFound {
        id: id.trim().to_string(),
        display_name: display_name.trim().to_string(),
        signal_strength,
    })
}

fn extract_eval_stop(line: &str) -> Option<InboundEvent> {
    let payload = line.strip_prefix(EVAL_STOP_PREFIX)?;

    let fields: Result<Vec<i32>, _> = payload
        .split(',')
        .map(|field| field.trim().parse::<i32>())
        .collect();

    let summary = fields
        .ok()
        .and_then(|fields| EvaluationSummary::from_fields(&fields));

    if summary.is_none() {
        warn!(line, "Evaluation summary did not parse as 3 or 5 integers");
    }

    summary.map(|summary| InboundEvent::EvaluationStop { summary })
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;

    #[test]
    fn test_raw_kinds() {
        let cases = [
            ("#BLE:RAW:+OK", RawKind::Ok),
            ("#BLE:RAW:+READY", RawKind::Ready),
            ("#BLE:RAW:+MULTI", RawKind::Multi),
            ("#BLE:RAW:+CONNECTED:1", RawKind::Connected),
            ("#BLE:RAW:+DISCONN:2", RawKind::Disconnected),
            ("#BLE:RAW:+WHAT", RawKind::Unknown),
        ];

        for (line, expected) in cases {
            match InboundEvent::classify(line) {
                InboundEvent::RawTransportEvent { kind, .. } => assert_eq!(kind, expected, "{line}"),
                other => panic!("unexpected event for {line}: {other:?}"),
            }
        }
    }

    #[test]
    fn test_raw_wins_over_markers() {
        let event = InboundEvent::classify("#BLE:RAW:+ERR:INIT_OK");
        assert!(matches!(event, InboundEvent::RawTransportEvent { kind: RawKind::Unknown, .. }));
    }

    #[test]
    fn test_scan_found() {
        let event = InboundEvent::classify("#DM:SCAN:FOUND:AABBCCDDEEFF,Sensor1,-65");
        assert_eq!(
            event,
            InboundEvent::ScanFound {
                id: "AABBCCDDEEFF".into(),
                display_name: "Sensor1".into(),
                signal_strength: -65,
            }
        );
    }

    #[test]
    fn test_scan_found_malformed_rssi() {
        let event = InboundEvent::classify("#DM:SCAN:FOUND:AABBCCDDEEFF,Sensor1,strong");
        assert!(matches!(event, InboundEvent::Unrecognized { .. }));

        let event = InboundEvent::classify("#DM:SCAN:FOUND:AABBCCDDEEFF");
        assert!(matches!(event, InboundEvent::Unrecognized { .. }));
    }

    #[test]
    fn test_scan_reset_markers() {
        for line in ["#DM:INIT_OK", "#DM:SCAN_STARTED", "#ERR:INIT_OK"] {
            let event = InboundEvent::classify(line);
            assert!(
                matches!(event, InboundEvent::GenericSuccess { scan_reset: true, .. }),
                "{line}"
            );
        }
    }

    #[test]
    fn test_duplicate_identifier() {
        let event = InboundEvent::classify("#ERR:DUP_MAC:AABBCCDDEEFF:L1");
        assert_eq!(
            event,
            InboundEvent::DuplicateIdentifier {
                id: "AABBCCDDEEFF".into(),
                existing_slot: "L1".into(),
            }
        );
    }

    #[test]
    fn test_duplicate_identifier_defaults() {
        let event = InboundEvent::classify("#ERR:DUP_MAC:");
        assert_eq!(
            event,
            InboundEvent::DuplicateIdentifier {
                id: UNKNOWN_FIELD.into(),
                existing_slot: UNKNOWN_FIELD.into(),
            }
        );
    }

    #[test]
    fn test_duplicate_slot_and_not_allowed() {
        assert_eq!(
            InboundEvent::classify("#ERR:DUP_LOC:L1:AABBCCDDEEFF"),
            InboundEvent::DuplicateSlot {
                slot: "L1".into(),
                existing_id: "AABBCCDDEEFF".into(),
            }
        );
        assert_eq!(
            InboundEvent::classify("#ERR:LOC_NOT_ALLOWED:R9:2"),
            InboundEvent::SlotNotAllowed {
                slot: "R9".into(),
                device_type: "2".into(),
            }
        );
    }

    #[test]
    fn test_type_full_uses_whole_line_indices() {
        assert_eq!(
            InboundEvent::classify("#DM:TYPE_FULL:2:4"),
            InboundEvent::DeviceTypeFull {
                device_type: "2".into(),
                max: "4".into(),
            }
        );
        assert_eq!(
            InboundEvent::classify("#DM:TYPE_FULL:2"),
            InboundEvent::DeviceTypeFull {
                device_type: "2".into(),
                max: "?".into(),
            }
        );
    }

    #[test]
    fn test_missing_segments_use_defaults() {
        assert_eq!(
            InboundEvent::classify("#ERR:DUP_LOC:"),
            InboundEvent::DuplicateSlot {
                slot: UNKNOWN_FIELD.into(),
                existing_id: UNKNOWN_FIELD.into(),
            }
        );
        assert_eq!(
            InboundEvent::classify("#ERR:DUP_LOC:L1"),
            InboundEvent::DuplicateSlot {
                slot: "L1".into(),
                existing_id: UNKNOWN_FIELD.into(),
            }
        );
        assert_eq!(
            InboundEvent::classify("#ERR:LOC_NOT_ALLOWED:"),
            InboundEvent::SlotNotAllowed {
                slot: UNKNOWN_FIELD.into(),
                device_type: UNKNOWN_FIELD.into(),
            }
        );
        assert_eq!(
            InboundEvent::classify("#DM:TYPE_FULL:"),
            InboundEvent::DeviceTypeFull {
                device_type: UNKNOWN_MAX.into(),
                max: UNKNOWN_MAX.into(),
            }
        );
    }

    #[test]
    fn test_no_type_and_slot_full() {
        assert_eq!(InboundEvent::classify("#ERR:NO_TYPE"), InboundEvent::NoDeviceTypeSet);
        assert_eq!(
            InboundEvent::classify("#ERR:SLOT_FULL:"),
            InboundEvent::SlotCapacityExceeded { max: "8".into() }
        );
        assert_eq!(
            InboundEvent::classify("#ERR:SLOT_FULL:6"),
            InboundEvent::SlotCapacityExceeded { max: "6".into() }
        );
    }

    #[test]
    fn test_eval_stop_foot() {
        let event = InboundEvent::classify("#EVAL:STOP:STOP_OK:120,118,45,47,3");
        assert_eq!(
            event,
            InboundEvent::EvaluationStop {
                summary: EvaluationSummary::Foot {
                    left_avg_distance: 120,
                    right_avg_distance: 118,
                    left_avg_speed: 45,
                    right_avg_speed: 47,
                    asymmetry_pct: 3,
                },
            }
        );
    }

    #[test]
    fn test_eval_stop_back() {
        let event = InboundEvent::classify("#EVAL:STOP:STOP_OK:12,14,5");
        assert_eq!(
            event,
            InboundEvent::EvaluationStop {
                summary: EvaluationSummary::Back {
                    left_avg_tilt: 12,
                    right_avg_tilt: 14,
                    asymmetry_pct: 5,
                },
            }
        );
    }

    #[test]
    fn test_eval_stop_wrong_arity() {
        for line in [
            "#EVAL:STOP:STOP_OK:1,2,3,4",
            "#EVAL:STOP:STOP_OK:1,2",
            "#EVAL:STOP:STOP_OK:",
            "#EVAL:STOP:STOP_OK:1,x,3",
        ] {
            assert!(
                matches!(InboundEvent::classify(line), InboundEvent::Unrecognized { .. }),
                "{line}"
            );
        }
    }

    #[test]
    fn test_timeout_error_success_fallbacks() {
        assert_eq!(InboundEvent::classify("#MAN:TIMEOUT"), InboundEvent::EvaluationTimeout);
        assert!(matches!(
            InboundEvent::classify("#ERR:BAD_CMD"),
            InboundEvent::GenericError { .. }
        ));
        assert!(matches!(
            InboundEvent::classify("#MAN:START_OK"),
            InboundEvent::GenericSuccess { scan_reset: false, .. }
        ));
        assert!(matches!(
            InboundEvent::classify("hello"),
            InboundEvent::Unrecognized { .. }
        ));
        assert!(matches!(InboundEvent::classify(""), InboundEvent::Unrecognized { .. }));
    }

    #[test]
    fn test_marker_priority() {
        // DUP_MAC is checked before NO_TYPE even when both appear.
        assert!(matches!(
            InboundEvent::classify("#ERR:DUP_MAC:A:NO_TYPE"),
            InboundEvent::DuplicateIdentifier { .. }
        ));
        // Substring markers match without a sigil.
        assert_eq!(InboundEvent::classify("NO_TYPE"), InboundEvent::NoDeviceTypeSet);
    }

    #[test]
    fn test_is_error() {
        assert!(InboundEvent::NoDeviceTypeSet.is_error());
        assert!(InboundEvent::EvaluationTimeout.is_error());
        assert!(!InboundEvent::classify("#MAN:START_OK").is_error());
    }

    #[test]
    fn test_event_serializes_tagged() {
        let json = serde_json::to_string(&InboundEvent::classify("#EVAL:STOP:STOP_OK:12,14,5"))
            .expect("serialize");
        assert!(json.contains("\"type\":\"evaluation_stop\""));
        assert!(json.contains("\"layout\":\"back\""));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(10_000))]

        #[test]
        fn prop_classify_is_total(bytes in proptest::collection::vec(any::<u8>(), 0..96)) {
            let line = String::from_utf8_lossy(&bytes);
            let _ = InboundEvent::classify(&line);
        }

        #[test]
        fn prop_classify_protocol_shaped(line in "#[A-Z_:,0-9+-]{0,60}") {
            let _ = InboundEvent::classify(&line);
        }
    }
}
