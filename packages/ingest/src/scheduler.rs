//! Sequential, rate-limited resolution of address groups.
//!
//! Each unique address is sent to the provider exactly once, one request
//! at a time. After every request the scheduler pauses for a fixed
//! interval before issuing the next one, however long the request took.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use signal_map_geocoder::{GeocodeError, GeocodedAddress, Geocoder};
use signal_map_ingest_models::ProgressCallback;

use crate::group::AddressGroups;

/// Groups between two progress log lines.
const LOG_EVERY: usize = 10;

/// Pauses a fixed interval between consecutive calls.
#[derive(Debug)]
pub struct RateLimiter {
    interval: Duration,
    called: bool,
}

impl RateLimiter {
    /// Creates a limiter that waits `interval` after each call.
    #[must_use]
    pub const fn new(interval: Duration) -> Self {
        Self {
            interval,
            called: false,
        }
    }

    /// The configured pause.
    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Waits out the pause owed for the previous call, then records a new
    /// one.
    ///
    /// Callers acquire only once the previous call has returned, so the
    /// full interval always lies between the end of one call and the start
    /// of the next. The first call never waits, and nothing is waited after
    /// the last.
    pub async fn acquire(&mut self) {
        if self.called && !self.interval.is_zero() {
            tokio::time::sleep(self.interval).await;
        }
        self.called = true;
    }
}

/// Result of resolving one address group.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupOutcome {
    /// The provider's answer, or `None` when the lookup failed.
    pub geocoded: Option<GeocodedAddress>,
    /// When the provider answered.
    pub resolved_at: DateTime<Utc>,
}

/// Resolves address groups against a [`Geocoder`].
pub struct GeocodeScheduler<'a> {
    geocoder: &'a dyn Geocoder,
    limiter: RateLimiter,
    progress: Arc<dyn ProgressCallback>,
}

impl<'a> GeocodeScheduler<'a> {
    /// Creates a scheduler that pauses `interval` after each request.
    #[must_use]
    pub fn new(
        geocoder: &'a dyn Geocoder,
        interval: Duration,
        progress: Arc<dyn ProgressCallback>,
    ) -> Self {
        Self {
            geocoder,
            limiter: RateLimiter::new(interval),
            progress,
        }
    }

    /// Resolves every group in order, returning one outcome per group.
    ///
    /// Failures are logged and come back with `geocoded: None`; they never
    /// stop the run. Nothing is retried.
    pub async fn resolve_all(&mut self, groups: &AddressGroups) -> Vec<GroupOutcome> {
        let total = groups.len();
        self.progress.set_total(total as u64);

        log::info!(
            "Geocoding {total} unique addresses via {} ({}ms between requests)...",
            self.geocoder.id(),
            self.limiter.interval().as_millis()
        );

        let mut resolved = Vec::with_capacity(total);
        let mut successes = 0usize;

        for (done, group) in groups.groups().iter().enumerate() {
            self.limiter.acquire().await;

            let geocoded = match self.geocoder.resolve(&group.address).await {
                Ok(geocoded) => {
                    successes += 1;
                    Some(geocoded)
                }
                Err(GeocodeError::NoMatch) => {
                    log::warn!(
                        "No match for '{}' ({} records)",
                        group.address,
                        group.members.len()
                    );
                    None
                }
                Err(e) => {
                    log::warn!(
                        "Geocoding failed for '{}' ({} records): {e}",
                        group.address,
                        group.members.len()
                    );
                    None
                }
            };
            resolved.push(GroupOutcome {
                geocoded,
                resolved_at: Utc::now(),
            });

            let done = done + 1;
            self.progress.inc(1);
            self.progress.set_message(format!("{successes} geocoded"));
            if done % LOG_EVERY == 0 {
                log::info!("Progress: {done}/{total} addresses ({successes} geocoded)");
            }
        }

        self.progress
            .finish(format!("{successes}/{total} addresses geocoded"));

        resolved
    }
}
