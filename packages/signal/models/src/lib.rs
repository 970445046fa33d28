#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Traffic-signal record types shared across the signal map toolchain.
//!
//! The raw provincial facility feed is read into [`RawFacilityRecord`],
//! annotated with geocoding results as a [`ProcessedRecord`] (the snapshot
//! row), and finally turned into a [`ClassifiedLight`] that the display
//! layer filters and groups into [`Intersection`]s.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Region used when a record carries no province name.
pub const DEFAULT_REGION: &str = "경기도";

/// Region label for records without a sub-region.
pub const OTHER_REGION: &str = "기타";

/// Intersection token used when a record has no route name.
pub const INTERSECTION_FALLBACK: &str = "교차로";

/// Note attached to lights fitted with an audio signal for the visually
/// impaired.
pub const AUDIO_SIGNAL_NOTE: &str = "음향신호기";

/// Marker color for lights without a known priority.
pub const DEFAULT_PRIORITY_COLOR: &str = "#888888";

/// A WGS84 coordinate pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    /// Latitude.
    pub lat: f64,
    /// Longitude.
    pub lng: f64,
}

/// One entry of the provincial traffic-signal facility feed.
///
/// Every field is optional. Code fields tolerate numbers as well as
/// strings, and any field this type doesn't name is kept in `extra` so it
/// round-trips into the output snapshot untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawFacilityRecord {
    /// Province name (시도명).
    #[serde(
        rename = "SIDO_NM",
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub sido: Option<String>,
    /// City / county name (시군구명).
    #[serde(
        rename = "SIGNGU_NM",
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub signgu: Option<String>,
    /// Road name.
    #[serde(
        rename = "ROUTE_NM",
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub route: Option<String>,
    /// Facility management number.
    #[serde(
        rename = "TFLGT_MANAGE_NO_INFO",
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub manage_no: Option<String>,
    /// Lamp order, e.g. `"적색-녹색-황색"`.
    #[serde(
        rename = "SGNL_LLGT_ORDR_INFO",
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub lamp_order: Option<String>,
    /// Route type code (`"3"` is bidirectional).
    #[serde(
        rename = "ROUTE_INFO",
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub route_info: Option<String>,
    /// Signal type code (`"1"` vehicle, `"2"` pedestrian).
    #[serde(
        rename = "TFLGT_DIV",
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub signal_div: Option<String>,
    /// Audio signal flag (`"Y"` when fitted).
    #[serde(
        rename = "BLINDPSN_SOUND_SGNAPP_EXTNO",
        default,
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub audio_signal: Option<String>,
    /// Fields not interpreted by the pipeline.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl RawFacilityRecord {
    /// Trimmed province name, `None` when absent or blank.
    #[must_use]
    pub fn sido_name(&self) -> Option<&str> {
        non_blank(self.sido.as_deref())
    }

    /// Trimmed city / county name, `None` when absent or blank.
    #[must_use]
    pub fn signgu_name(&self) -> Option<&str> {
        non_blank(self.signgu.as_deref())
    }

    /// Trimmed road name, `None` when absent or blank.
    #[must_use]
    pub fn route_name(&self) -> Option<&str> {
        non_blank(self.route.as_deref())
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

/// Accepts a string or a number; anything else reads as absent.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// How a record's coordinates were obtained.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeocodingInfo {
    /// The address that was sent to the geocoder, if one could be built.
    pub generated_address: Option<String>,
    /// Province name as it appeared in the input.
    pub original_sido: Option<String>,
    /// City / county name as it appeared in the input.
    pub original_signgu: Option<String>,
    /// Road name as it appeared in the input.
    pub original_route: Option<String>,
    /// Lot-number address matched by the geocoder.
    #[serde(
        default,
        alias = "kakao_address_name",
        skip_serializing_if = "Option::is_none"
    )]
    pub matched_address: Option<String>,
    /// Road address matched by the geocoder.
    #[serde(
        default,
        alias = "kakao_road_address",
        skip_serializing_if = "Option::is_none"
    )]
    pub matched_road_address: Option<String>,
    /// Set when no coordinate could be resolved.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub geocoding_failed: bool,
    /// When the record was processed.
    pub geocoded_at: DateTime<Utc>,
}

/// A snapshot row: the raw record plus its geocoding outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessedRecord {
    /// The input record, flattened back into the same JSON object.
    #[serde(flatten)]
    pub record: RawFacilityRecord,
    /// Resolved position; `null` when geocoding failed.
    #[serde(default)]
    pub coordinates: Option<Coordinates>,
    /// Geocoding provenance.
    #[serde(default)]
    pub geocoding_info: Option<GeocodingInfo>,
}

/// Signal priority from 1 (most important) to 5.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(into = "u8", try_from = "u8")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    /// Rank 1
    Highest = 1,
    /// Rank 2
    High = 2,
    /// Rank 3
    Medium = 3,
    /// Rank 4
    Low = 4,
    /// Rank 5, also the rank of lights with no lamp-order information
    Lowest = 5,
}

impl Priority {
    /// All ranks, most important first.
    pub const ALL: [Self; 5] = [
        Self::Highest,
        Self::High,
        Self::Medium,
        Self::Low,
        Self::Lowest,
    ];

    /// Returns the numeric rank.
    #[must_use]
    pub const fn value(self) -> u8 {
        self as u8
    }

    /// Creates a priority from its numeric rank.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not in the range 1-5.
    pub const fn from_value(value: u8) -> Result<Self, InvalidPriorityError> {
        match value {
            1 => Ok(Self::Highest),
            2 => Ok(Self::High),
            3 => Ok(Self::Medium),
            4 => Ok(Self::Low),
            5 => Ok(Self::Lowest),
            _ => Err(InvalidPriorityError { value }),
        }
    }

    /// Clamps an arbitrary rank into 1-5.
    #[must_use]
    pub const fn clamped(rank: i64) -> Self {
        match rank {
            i64::MIN..=1 => Self::Highest,
            2 => Self::High,
            3 => Self::Medium,
            4 => Self::Low,
            _ => Self::Lowest,
        }
    }

    /// Marker color for this rank.
    #[must_use]
    pub const fn color(self) -> &'static str {
        match self {
            Self::Highest => "#FF4444",
            Self::High => "#FF8800",
            Self::Medium => "#FFDD00",
            Self::Low => "#88DD00",
            Self::Lowest => "#0088DD",
        }
    }
}

/// Marker color for an optional priority, grey when unknown.
#[must_use]
pub const fn priority_color(priority: Option<Priority>) -> &'static str {
    match priority {
        Some(p) => p.color(),
        None => DEFAULT_PRIORITY_COLOR,
    }
}

impl From<Priority> for u8 {
    fn from(value: Priority) -> Self {
        value.value()
    }
}

impl TryFrom<u8> for Priority {
    type Error = InvalidPriorityError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::from_value(value)
    }
}

/// Error returned when a [`Priority`] is built from a value outside 1-5.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidPriorityError {
    /// The rejected value.
    pub value: u8,
}

impl std::fmt::Display for InvalidPriorityError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid priority value {}: expected 1-5", self.value)
    }
}

impl std::error::Error for InvalidPriorityError {}

/// Which way a light's crosswalk runs, as far as the feed codes tell.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum CrosswalkDirection {
    /// Route type code marks the road as two-way.
    #[serde(rename = "양방향")]
    #[strum(serialize = "양방향")]
    Bidirectional,
    /// Signal head for vehicles.
    #[serde(rename = "차량신호등")]
    #[strum(serialize = "차량신호등")]
    VehicleSignal,
    /// Signal head for pedestrians.
    #[serde(rename = "보행신호등")]
    #[strum(serialize = "보행신호등")]
    PedestrianSignal,
    /// Anything else.
    #[serde(rename = "기타")]
    #[strum(serialize = "기타")]
    Other,
}

/// A classified traffic light, ready for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassifiedLight {
    /// Facility management number, or `processed_<index>`.
    pub id: String,
    /// Display name, `<intersection>-<direction>`.
    pub name: String,
    /// Position; `None` when geocoding failed.
    pub location: Option<Coordinates>,
    /// Normalized intersection name.
    pub intersection: String,
    /// Signal priority.
    pub priority: Priority,
    /// Best available address label.
    pub address: String,
    /// City / county label.
    pub region: String,
    /// Crosswalk direction.
    pub crosswalk_direction: CrosswalkDirection,
    /// Free-form annotation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Lights sharing an intersection name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Intersection {
    /// `intersection_<name>` with whitespace replaced by underscores.
    pub id: String,
    /// Normalized intersection name.
    pub name: String,
    /// Mean position of the members that have one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Coordinates>,
    /// Members, most important first.
    pub traffic_lights: Vec<ClassifiedLight>,
    /// Number of members.
    pub total_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_record_reads_numeric_codes_and_keeps_unknown_fields() {
        let record: RawFacilityRecord = serde_json::from_value(serde_json::json!({
            "SIDO_NM": "경기도",
            "SIGNGU_NM": "수원시",
            "ROUTE_INFO": 3,
            "TFLGT_DIV": null,
            "INSTALL_YMD": "2019-04-01"
        }))
        .unwrap();

        assert_eq!(record.signgu_name(), Some("수원시"));
        assert_eq!(record.route_info.as_deref(), Some("3"));
        assert_eq!(record.signal_div, None);
        assert_eq!(
            record.extra.get("INSTALL_YMD"),
            Some(&serde_json::json!("2019-04-01"))
        );
    }

    #[test]
    fn blank_names_read_as_absent() {
        let record = RawFacilityRecord {
            route: Some("   ".to_string()),
            ..RawFacilityRecord::default()
        };
        assert_eq!(record.route_name(), None);
        assert_eq!(record.sido_name(), None);
    }

    #[test]
    fn processed_record_serializes_null_coordinates() {
        let processed = ProcessedRecord {
            record: RawFacilityRecord {
                signgu: Some("성남시".to_string()),
                ..RawFacilityRecord::default()
            },
            coordinates: None,
            geocoding_info: None,
        };
        let json = serde_json::to_value(&processed).unwrap();
        assert_eq!(json["SIGNGU_NM"], "성남시");
        assert!(json["coordinates"].is_null());
    }

    #[test]
    fn geocoding_info_reads_provider_labels() {
        let info: GeocodingInfo = serde_json::from_value(serde_json::json!({
            "generated_address": "경기도 수원시 중부대로",
            "original_sido": "경기도",
            "original_signgu": "수원시",
            "original_route": "중부대로",
            "kakao_address_name": "경기 수원시 팔달구 인계동",
            "geocoded_at": "2024-05-01T00:00:00Z"
        }))
        .unwrap();
        assert_eq!(
            info.matched_address.as_deref(),
            Some("경기 수원시 팔달구 인계동")
        );
        assert!(!info.geocoding_failed);
    }

    #[test]
    fn priority_round_trips_through_numbers() {
        assert_eq!(serde_json::to_value(Priority::High).unwrap(), 2);
        let parsed: Priority = serde_json::from_value(serde_json::json!(4)).unwrap();
        assert_eq!(parsed, Priority::Low);
        assert!(serde_json::from_value::<Priority>(serde_json::json!(9)).is_err());
    }

    #[test]
    fn priority_clamps_out_of_range_ranks() {
        assert_eq!(Priority::clamped(-3), Priority::Highest);
        assert_eq!(Priority::clamped(3), Priority::Medium);
        assert_eq!(Priority::clamped(6), Priority::Lowest);
    }

    #[test]
    fn priority_colors_cover_every_rank() {
        assert_eq!(priority_color(Some(Priority::Highest)), "#FF4444");
        assert_eq!(priority_color(Some(Priority::Lowest)), "#0088DD");
        assert_eq!(priority_color(None), DEFAULT_PRIORITY_COLOR);
    }

    #[test]
    fn direction_serializes_as_label() {
        assert_eq!(
            serde_json::to_value(CrosswalkDirection::PedestrianSignal).unwrap(),
            "보행신호등"
        );
        assert_eq!(CrosswalkDirection::Bidirectional.to_string(), "양방향");
    }
}
