//! Priority and crosswalk-direction classification.
//!
//! The feed encodes a light's lamp sequence as free text
//! (`"적색-황색-녹색"`), the road type as `ROUTE_INFO`, and the signal head
//! type as `TFLGT_DIV`. Lights with more color phases sit on busier
//! junctions and get a more important (lower) rank.

use std::sync::LazyLock;

use regex::Regex;
use signal_map_signal_models::{
    AUDIO_SIGNAL_NOTE, CrosswalkDirection, INTERSECTION_FALLBACK, Priority, RawFacilityRecord,
};

/// Green, amber, and red lamp tokens.
static COLOR_PHASE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("녹색|황색|적색").expect("valid regex"));

/// `ROUTE_INFO` code for a two-way road.
const ROUTE_BIDIRECTIONAL: &str = "3";

/// `TFLGT_DIV` code for a vehicle signal head.
const SIGNAL_VEHICLE: &str = "1";

/// `TFLGT_DIV` code for a pedestrian signal head.
const SIGNAL_PEDESTRIAN: &str = "2";

/// Flag value marking an installed audio signal.
const AUDIO_SIGNAL_YES: &str = "Y";

/// Outcome of classifying a single facility record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    /// Priority rank.
    pub priority: Priority,
    /// Crosswalk direction.
    pub direction: CrosswalkDirection,
    /// Optional annotation.
    pub note: Option<&'static str>,
}

/// Classifies a facility record. Never fails; missing codes fall back to
/// [`Priority::Lowest`], [`CrosswalkDirection::Other`], and no note.
#[must_use]
pub fn classify(record: &RawFacilityRecord) -> Classification {
    Classification {
        priority: priority_from_lamp_order(record.lamp_order.as_deref()),
        direction: direction(record),
        note: note(record),
    }
}

/// Ranks a light by the number of color phases in its lamp order:
/// `clamp(6 - phases, 1, 5)`.
#[must_use]
pub fn priority_from_lamp_order(lamp_order: Option<&str>) -> Priority {
    let Some(order) = lamp_order else {
        return Priority::Lowest;
    };

    let phases = COLOR_PHASE_RE.find_iter(order).count();
    let phases = i64::try_from(phases).unwrap_or(i64::MAX);

    Priority::clamped(6_i64.saturating_sub(phases))
}

/// Derives the crosswalk direction from the route and signal type codes.
#[must_use]
pub fn direction(record: &RawFacilityRecord) -> CrosswalkDirection {
    if code_is(record.route_info.as_deref(), ROUTE_BIDIRECTIONAL) {
        CrosswalkDirection::Bidirectional
    } else if code_is(record.signal_div.as_deref(), SIGNAL_VEHICLE) {
        CrosswalkDirection::VehicleSignal
    } else if code_is(record.signal_div.as_deref(), SIGNAL_PEDESTRIAN) {
        CrosswalkDirection::PedestrianSignal
    } else {
        CrosswalkDirection::Other
    }
}

fn note(record: &RawFacilityRecord) -> Option<&'static str> {
    code_is(record.audio_signal.as_deref(), AUDIO_SIGNAL_YES).then_some(AUDIO_SIGNAL_NOTE)
}

fn code_is(value: Option<&str>, code: &str) -> bool {
    value.is_some_and(|v| v.trim() == code)
}

/// Builds the intersection name: city name followed directly by the road
/// name (or `교차로` when the road name is absent or blank), whitespace
/// collapsed.
#[must_use]
pub fn intersection_name(record: &RawFacilityRecord) -> String {
    let signgu = record.signgu_name().unwrap_or("");
    let route = record.route_name().unwrap_or(INTERSECTION_FALLBACK);

    crate::collapse_whitespace(&format!("{signgu}{route}"), " ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record_with_codes(
        route_info: Option<&str>,
        signal_div: Option<&str>,
        audio: Option<&str>,
    ) -> RawFacilityRecord {
        RawFacilityRecord {
            route_info: route_info.map(String::from),
            signal_div: signal_div.map(String::from),
            audio_signal: audio.map(String::from),
            ..RawFacilityRecord::default()
        }
    }

    #[test]
    fn three_phases_rank_three() {
        assert_eq!(
            priority_from_lamp_order(Some("적색-황색-녹색")),
            Priority::Medium
        );
    }

    #[test]
    fn repeated_phases_clamp_to_highest() {
        assert_eq!(
            priority_from_lamp_order(Some("녹색,황색,적색,녹색,황색,적색,녹색")),
            Priority::Highest
        );
    }

    #[test]
    fn missing_or_unrecognised_order_ranks_lowest() {
        assert_eq!(priority_from_lamp_order(None), Priority::Lowest);
        assert_eq!(priority_from_lamp_order(Some("")), Priority::Lowest);
        assert_eq!(
            priority_from_lamp_order(Some("green-amber-red")),
            Priority::Lowest
        );
    }

    #[test]
    fn priority_stays_in_range_for_any_phase_count() {
        for phases in 0..12 {
            let order = "녹색".repeat(phases);
            let rank = priority_from_lamp_order(Some(&order)).value();
            assert!((1..=5).contains(&rank), "{phases} phases gave rank {rank}");
        }
    }

    #[test]
    fn bidirectional_route_wins_over_signal_type() {
        let record = record_with_codes(Some("3"), Some("1"), None);
        assert_eq!(direction(&record), CrosswalkDirection::Bidirectional);
    }

    #[test]
    fn signal_type_codes_map_to_directions() {
        assert_eq!(
            direction(&record_with_codes(Some("1"), Some("1"), None)),
            CrosswalkDirection::VehicleSignal
        );
        assert_eq!(
            direction(&record_with_codes(None, Some("2"), None)),
            CrosswalkDirection::PedestrianSignal
        );
        assert_eq!(
            direction(&record_with_codes(None, Some("9"), None)),
            CrosswalkDirection::Other
        );
        assert_eq!(
            direction(&RawFacilityRecord::default()),
            CrosswalkDirection::Other
        );
    }

    #[test]
    fn audio_flag_adds_note() {
        let classified = classify(&record_with_codes(None, None, Some("Y")));
        assert_eq!(classified.note, Some(AUDIO_SIGNAL_NOTE));

        let classified = classify(&record_with_codes(None, None, Some("N")));
        assert_eq!(classified.note, None);
    }

    #[test]
    fn intersection_name_concatenates_city_and_road() {
        let record = RawFacilityRecord {
            signgu: Some("수원시".to_string()),
            route: Some("중부대로  123번길".to_string()),
            ..RawFacilityRecord::default()
        };
        assert_eq!(intersection_name(&record), "수원시중부대로 123번길");
    }

    #[test]
    fn intersection_name_falls_back_without_road() {
        let record = RawFacilityRecord {
            signgu: Some("성남시".to_string()),
            ..RawFacilityRecord::default()
        };
        assert_eq!(intersection_name(&record), "성남시교차로");
        assert_eq!(intersection_name(&RawFacilityRecord::default()), "교차로");
    }

    #[test]
    fn blank_road_name_counts_as_missing() {
        let record = RawFacilityRecord {
            signgu: Some("성남시".to_string()),
            route: Some("   ".to_string()),
            ..RawFacilityRecord::default()
        };
        assert_eq!(intersection_name(&record), "성남시교차로");
    }
}
