#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Progress reporting and result types for a geocoding run.
//!
//! Defines a [`ProgressCallback`] trait that decouples progress reporting
//! from any specific rendering backend (e.g., `indicatif` progress bars,
//! log-only reporting, or silence), plus the summary a run produces.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Trait for reporting progress from long-running operations.
///
/// Implementations must be `Send + Sync` to support use across spawned
/// tokio tasks and `Arc`-based sharing.
pub trait ProgressCallback: Send + Sync {
    /// Set the total expected units of work (enables percentage/ETA).
    fn set_total(&self, total: u64);

    /// Advance progress by `delta` units.
    fn inc(&self, delta: u64);

    /// Update the message displayed alongside the progress indicator.
    fn set_message(&self, msg: String);

    /// Mark progress as complete with a final message.
    fn finish(&self, msg: String);
}

/// A no-op implementation of [`ProgressCallback`] that silently ignores
/// all progress updates.
pub struct NullProgress;

impl ProgressCallback for NullProgress {
    fn set_total(&self, _total: u64) {}
    fn inc(&self, _delta: u64) {}
    fn set_message(&self, _msg: String) {}
    fn finish(&self, _msg: String) {}
}

/// Returns a shared [`NullProgress`] instance for convenient use.
#[must_use]
pub fn null_progress() -> Arc<dyn ProgressCallback> {
    Arc::new(NullProgress)
}

/// Outcome counts of a geocoding run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeocodeSummary {
    /// Records read from the input.
    pub records: usize,
    /// Distinct generated addresses sent to the provider.
    pub unique_addresses: usize,
    /// Records that received coordinates.
    pub geocoded: usize,
    /// Records whose address lookup failed.
    pub failed: usize,
    /// Records without any usable address.
    pub address_failures: usize,
    /// Wall time of the geocoding stage.
    pub duration: Duration,
}

impl GeocodeSummary {
    /// Share of records that received coordinates, in percent.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn success_rate(&self) -> f64 {
        if self.records == 0 {
            return 0.0;
        }
        self.geocoded as f64 / self.records as f64 * 100.0
    }
}

/// Geocoding completion for one region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionStats {
    /// Region label.
    pub region: String,
    /// Records in the region.
    pub total: usize,
    /// Records in the region that have coordinates.
    pub with_coordinates: usize,
}

impl RegionStats {
    /// Share of the region's records with coordinates, in percent.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn completion(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.with_coordinates as f64 / self.total as f64 * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_rate_of_empty_run_is_zero() {
        assert!(GeocodeSummary::default().success_rate().abs() < f64::EPSILON);
    }

    #[test]
    fn success_rate_counts_records_not_addresses() {
        let summary = GeocodeSummary {
            records: 4,
            unique_addresses: 2,
            geocoded: 3,
            failed: 1,
            ..GeocodeSummary::default()
        };
        assert!((summary.success_rate() - 75.0).abs() < 1e-9);
    }

    #[test]
    fn region_completion() {
        let stats = RegionStats {
            region: "수원시".to_string(),
            total: 3,
            with_coordinates: 1,
        };
        assert!((stats.completion() - 100.0 / 3.0).abs() < 1e-9);
        assert_eq!(
            serde_json::to_value(&stats).unwrap()["withCoordinates"],
            serde_json::json!(1)
        );
    }

    #[test]
    fn null_progress_accepts_everything() {
        let progress = null_progress();
        progress.set_total(10);
        progress.inc(3);
        progress.set_message("working".to_string());
        progress.finish("done".to_string());
    }
}
