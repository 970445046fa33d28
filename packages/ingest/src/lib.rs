#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Batch geocoding of traffic-signal facility records.
//!
//! Reads the facility feed (a JSON array), derives one address per record,
//! deduplicates addresses, resolves each unique address once through a
//! rate-limited [`Geocoder`], and writes a snapshot with one
//! [`ProcessedRecord`] per input record, in input order. Records that could
//! not be geocoded are kept with `coordinates: null`.

pub mod group;
pub mod interactive;
pub mod scheduler;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use signal_map_geocoder::address::AddressCandidateBuilder;
use signal_map_geocoder::kakao::{KakaoGeocoder, api_key_from_env};
use signal_map_geocoder::service_registry::{GeocodingService, enabled_services};
use signal_map_geocoder::{GeocodeError, Geocoder};
use signal_map_ingest_models::{GeocodeSummary, ProgressCallback, RegionStats};
use signal_map_signal_models::{DEFAULT_REGION, OTHER_REGION, ProcessedRecord, RawFacilityRecord};
use thiserror::Error;

use crate::group::{build_address_groups, fan_out};
use crate::scheduler::GeocodeScheduler;

/// Errors that abort an ingest run.
#[derive(Debug, Error)]
pub enum IngestError {
    /// The input file is not a JSON array of records.
    #[error("Failed to parse input {}: {source}", path.display())]
    InputParse {
        /// The input path.
        path: PathBuf,
        /// Underlying parse error.
        source: serde_json::Error,
    },

    /// Reading or writing a file failed.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// The file involved.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Serializing or deserializing a snapshot failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The provider's API key variable is unset or blank.
    #[error("Missing API key: set the {var} environment variable")]
    MissingApiKey {
        /// Environment variable that was read.
        var: String,
    },

    /// No enabled geocoding service is configured.
    #[error("No enabled geocoding service")]
    NoService,

    /// Setting up the geocoder failed.
    #[error(transparent)]
    Geocode(#[from] GeocodeError),
}

/// Knobs for one geocoding run.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Minimum spacing between provider requests.
    pub rate_limit: Duration,
    /// Only process the first `limit` records.
    pub limit: Option<usize>,
    /// Province used when a record has none.
    pub default_region: String,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            rate_limit: Duration::from_millis(150),
            limit: None,
            default_region: DEFAULT_REGION.to_string(),
        }
    }
}

/// Parses facility records from a JSON array.
///
/// # Errors
///
/// Returns [`serde_json::Error`] if `json` is not an array of objects.
pub fn parse_raw_records(json: &str) -> Result<Vec<RawFacilityRecord>, serde_json::Error> {
    serde_json::from_str(json)
}

/// Loads facility records from `path`.
///
/// # Errors
///
/// Returns [`IngestError::Io`] if the file can't be read, or
/// [`IngestError::InputParse`] if it isn't a JSON array of records.
pub fn load_raw_records(path: &Path) -> Result<Vec<RawFacilityRecord>, IngestError> {
    let json = read_file(path)?;
    let records = parse_raw_records(&json).map_err(|source| IngestError::InputParse {
        path: path.to_path_buf(),
        source,
    })?;
    log::info!("Loaded {} records from {}", records.len(), path.display());
    Ok(records)
}

/// Writes a snapshot as a pretty-printed JSON array.
///
/// # Errors
///
/// Returns [`IngestError`] if serialization or the write fails.
pub fn write_snapshot(path: &Path, records: &[ProcessedRecord]) -> Result<(), IngestError> {
    let json = serde_json::to_string_pretty(records)?;
    std::fs::write(path, json).map_err(|source| IngestError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    log::info!("Wrote {} records to {}", records.len(), path.display());
    Ok(())
}

/// Loads a snapshot written by [`write_snapshot`].
///
/// # Errors
///
/// Returns [`IngestError`] if the file can't be read or parsed.
pub fn load_snapshot(path: &Path) -> Result<Vec<ProcessedRecord>, IngestError> {
    let json = read_file(path)?;
    Ok(serde_json::from_str(&json)?)
}

fn read_file(path: &Path) -> Result<String, IngestError> {
    std::fs::read_to_string(path).map_err(|source| IngestError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Returns the highest-priority enabled geocoding service.
///
/// # Errors
///
/// Returns [`IngestError::NoService`] if every service is disabled.
pub fn default_service() -> Result<GeocodingService, IngestError> {
    enabled_services()
        .into_iter()
        .next()
        .ok_or(IngestError::NoService)
}

/// Builds the geocoder for `service`, reading its key from the environment.
///
/// # Errors
///
/// Returns [`IngestError::MissingApiKey`] if the key variable is unset or
/// blank, or [`IngestError::Geocode`] if the HTTP client can't be built.
pub fn geocoder_for(service: &GeocodingService) -> Result<KakaoGeocoder, IngestError> {
    let var = service.api_key_env();
    let api_key = api_key_from_env(var).ok_or_else(|| IngestError::MissingApiKey {
        var: var.to_string(),
    })?;
    Ok(KakaoGeocoder::from_service(service, api_key)?)
}

/// Geocodes `records` and returns the snapshot rows with a run summary.
///
/// Every input record yields exactly one output row, in input order.
pub async fn geocode_records(
    geocoder: &dyn Geocoder,
    records: Vec<RawFacilityRecord>,
    options: &PipelineOptions,
    progress: Arc<dyn ProgressCallback>,
) -> (Vec<ProcessedRecord>, GeocodeSummary) {
    let start = Instant::now();
    let builder = AddressCandidateBuilder::new(options.default_region.clone());

    let groups = build_address_groups(&builder, &records);
    let resolved = GeocodeScheduler::new(geocoder, options.rate_limit, progress)
        .resolve_all(&groups)
        .await;

    let processed = fan_out(records, &groups, &resolved, chrono::Utc::now());

    let geocoded = processed.iter().filter(|r| r.coordinates.is_some()).count();
    let address_failures = groups.unaddressable().len();
    let summary = GeocodeSummary {
        records: processed.len(),
        unique_addresses: groups.len(),
        geocoded,
        failed: processed.len() - geocoded - address_failures,
        address_failures,
        duration: start.elapsed(),
    };

    (processed, summary)
}

/// Runs the whole batch job: load, geocode, write, report.
///
/// The input is parsed before any request is made, so a malformed input
/// never produces an output file.
///
/// # Errors
///
/// Returns [`IngestError`] if the input can't be loaded or the snapshot
/// can't be written. Per-address geocoding failures are not errors.
pub async fn run_pipeline(
    input: &Path,
    output: &Path,
    geocoder: &dyn Geocoder,
    options: &PipelineOptions,
    progress: Arc<dyn ProgressCallback>,
) -> Result<GeocodeSummary, IngestError> {
    let mut records = load_raw_records(input)?;
    if let Some(limit) = options.limit
        && records.len() > limit
    {
        log::info!("Limiting run to the first {limit} of {} records", records.len());
        records.truncate(limit);
    }

    let (processed, summary) = geocode_records(geocoder, records, options, progress).await;
    write_snapshot(output, &processed)?;

    log_summary(&summary);
    for stats in region_stats(&processed) {
        log::info!(
            "  {}: {}/{} ({:.1}%)",
            stats.region,
            stats.with_coordinates,
            stats.total,
            stats.completion()
        );
    }

    Ok(summary)
}

/// Logs the end-of-run counts.
pub fn log_summary(summary: &GeocodeSummary) {
    log::info!(
        "Geocoding complete in {:.1}s: {}/{} records geocoded ({:.1}%), {} unique addresses",
        summary.duration.as_secs_f64(),
        summary.geocoded,
        summary.records,
        summary.success_rate(),
        summary.unique_addresses
    );
    if summary.failed > 0 || summary.address_failures > 0 {
        log::info!(
            "{} records failed lookup, {} had no usable address",
            summary.failed,
            summary.address_failures
        );
    }
}

/// Per-region totals and coordinate coverage, in first-seen order.
///
/// Records without a city or county count toward the catch-all region.
#[must_use]
pub fn region_stats(records: &[ProcessedRecord]) -> Vec<RegionStats> {
    let mut index: BTreeMap<&str, usize> = BTreeMap::new();
    let mut stats: Vec<RegionStats> = Vec::new();

    for processed in records {
        let region = processed.record.signgu_name().unwrap_or(OTHER_REGION);
        let slot = *index.entry(region).or_insert_with(|| {
            stats.push(RegionStats {
                region: region.to_string(),
                total: 0,
                with_coordinates: 0,
            });
            stats.len() - 1
        });

        stats[slot].total += 1;
        if processed.coordinates.is_some() {
            stats[slot].with_coordinates += 1;
        }
    }

    stats
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use signal_map_geocoder::{GeocodedAddress, GeocodingProvider};
    use signal_map_ingest_models::null_progress;

    use super::*;

    /// Fails every lookup and counts the calls.
    #[derive(Default)]
    struct FailingGeocoder {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Geocoder for FailingGeocoder {
        fn id(&self) -> &str {
            "failing"
        }

        async fn resolve(&self, _address: &str) -> Result<GeocodedAddress, GeocodeError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(GeocodeError::Status { status: 500 })
        }
    }

    /// Resolves every address to a fixed point and counts the calls.
    #[derive(Default)]
    struct FixedGeocoder {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Geocoder for FixedGeocoder {
        fn id(&self) -> &str {
            "fixed"
        }

        async fn resolve(&self, address: &str) -> Result<GeocodedAddress, GeocodeError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(GeocodedAddress {
                latitude: 37.2636,
                longitude: 127.0286,
                matched_address: Some(format!("{address} 1")),
                road_address: Some(format!("{address} 1-1")),
                provider: GeocodingProvider::Kakao,
            })
        }
    }

    const SAMPLE: &str = r#"[
        {
            "SIDO_NM": "경기도",
            "SIGNGU_NM": "수원시",
            "ROUTE_NM": "중부대로",
            "TFLGT_MANAGE_NO_INFO": "TL-1",
            "SGNL_LLGT_ORDR_INFO": "적색-황색-녹색",
            "TFLGT_DIV": "2"
        },
        {
            "SIGNGU_NM": "수원시",
            "ROUTE_NM": "중부대로",
            "TFLGT_MANAGE_NO_INFO": "TL-2"
        },
        {
            "SIGNGU_NM": "성남시",
            "ROUTE_NM": "판교역로",
            "TFLGT_MANAGE_NO_INFO": 3
        },
        {
            "ROUTE_NM": "국도1호선"
        }
    ]"#;

    fn fast() -> PipelineOptions {
        PipelineOptions {
            rate_limit: Duration::ZERO,
            ..PipelineOptions::default()
        }
    }

    #[tokio::test]
    async fn shared_address_is_geocoded_once() {
        let records = parse_raw_records(SAMPLE).unwrap();
        let geocoder = FixedGeocoder::default();

        let (processed, summary) =
            geocode_records(&geocoder, records, &fast(), null_progress()).await;

        assert_eq!(geocoder.calls.load(Ordering::SeqCst), 2);
        assert_eq!(summary.unique_addresses, 2);
        assert_eq!(summary.records, 4);
        assert_eq!(summary.geocoded, 3);
        assert_eq!(summary.failed, 0);
        assert_eq!(summary.address_failures, 1);

        assert_eq!(processed[0].coordinates, processed[1].coordinates);
        assert_eq!(processed[3].coordinates, None);
        assert_eq!(processed[2].record.manage_no.as_deref(), Some("3"));
    }

    #[tokio::test]
    async fn failing_geocoder_keeps_every_record() {
        let records = parse_raw_records(
            r#"[
                { "SIGNGU_NM": "수원시", "ROUTE_NM": "중부대로" },
                { "SIGNGU_NM": "수원시", "ROUTE_NM": "중부대로" }
            ]"#,
        )
        .unwrap();
        let geocoder = FailingGeocoder::default();

        let (processed, summary) =
            geocode_records(&geocoder, records, &fast(), null_progress()).await;

        assert_eq!(geocoder.calls.load(Ordering::SeqCst), 1);
        assert_eq!(processed.len(), 2);
        assert_eq!(summary.geocoded, 0);
        assert_eq!(summary.failed, 2);
        for row in &processed {
            assert_eq!(row.coordinates, None);
            let info = row.geocoding_info.as_ref().unwrap();
            assert!(info.geocoding_failed);
            assert_eq!(
                info.generated_address.as_deref(),
                Some("경기도 수원시 중부대로")
            );
        }

        let json = serde_json::to_value(&processed).unwrap();
        assert!(json[0]["coordinates"].is_null());
        assert_eq!(json[1]["geocoding_info"]["geocoding_failed"], true);
    }

    #[tokio::test]
    async fn pipeline_writes_snapshot_in_input_order() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("raw.json");
        let output = dir.path().join("processed.json");
        std::fs::write(&input, SAMPLE).unwrap();

        let summary = run_pipeline(
            &input,
            &output,
            &FixedGeocoder::default(),
            &fast(),
            null_progress(),
        )
        .await
        .unwrap();
        assert_eq!(summary.records, 4);

        let snapshot = load_snapshot(&output).unwrap();
        let ids: Vec<Option<&str>> = snapshot
            .iter()
            .map(|r| r.record.manage_no.as_deref())
            .collect();
        assert_eq!(ids, vec![Some("TL-1"), Some("TL-2"), Some("3"), None]);

        let text = std::fs::read_to_string(&output).unwrap();
        assert!(text.contains("\n  "), "snapshot should be pretty-printed");
        assert!(text.contains("\"SGNL_LLGT_ORDR_INFO\": \"적색-황색-녹색\""));
    }

    #[tokio::test]
    async fn limit_truncates_input() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("raw.json");
        let output = dir.path().join("processed.json");
        std::fs::write(&input, SAMPLE).unwrap();

        let options = PipelineOptions {
            limit: Some(1),
            ..fast()
        };
        let summary = run_pipeline(
            &input,
            &output,
            &FixedGeocoder::default(),
            &options,
            null_progress(),
        )
        .await
        .unwrap();

        assert_eq!(summary.records, 1);
        assert_eq!(load_snapshot(&output).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn malformed_input_is_fatal_and_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("raw.json");
        let output = dir.path().join("processed.json");
        std::fs::write(&input, r#"{ "not": "an array" }"#).unwrap();

        let geocoder = FixedGeocoder::default();
        let err = run_pipeline(&input, &output, &geocoder, &fast(), null_progress())
            .await
            .unwrap_err();

        assert!(matches!(err, IngestError::InputParse { .. }));
        assert_eq!(geocoder.calls.load(Ordering::SeqCst), 0);
        assert!(!output.exists());
    }

    #[test]
    fn missing_input_is_io_error_naming_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.json");
        let err = load_raw_records(&path).unwrap_err();
        assert!(matches!(err, IngestError::Io { .. }));
        assert!(err.to_string().starts_with("I/O error on "));
        assert!(err.to_string().contains(&path.display().to_string()));
    }

    #[test]
    fn parse_error_message_names_the_input() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("raw.json");
        std::fs::write(&path, "not json").unwrap();

        let err = load_raw_records(&path).unwrap_err();
        let message = err.to_string();
        assert!(message.starts_with("Failed to parse input "), "{message}");
        assert!(message.contains("raw.json"), "{message}");
    }

    #[test]
    fn region_stats_group_by_city_with_fallback() {
        let records = parse_raw_records(SAMPLE).unwrap();
        let mut processed: Vec<ProcessedRecord> = records
            .into_iter()
            .map(|record| ProcessedRecord {
                record,
                coordinates: None,
                geocoding_info: None,
            })
            .collect();
        processed[0].coordinates = Some(signal_map_signal_models::Coordinates {
            lat: 37.0,
            lng: 127.0,
        });

        let stats = region_stats(&processed);
        let rows: Vec<(&str, usize, usize)> = stats
            .iter()
            .map(|s| (s.region.as_str(), s.with_coordinates, s.total))
            .collect();
        assert_eq!(rows, vec![("수원시", 1, 2), ("성남시", 0, 1), ("기타", 0, 1)]);
        assert!((stats[0].completion() - 50.0).abs() < 1e-9);
    }

    #[test]
    fn registry_default_service_is_kakao() {
        let service = default_service().unwrap();
        assert_eq!(service.id, "kakao");
    }
}
