#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Geocoding for traffic-signal facility records.
//!
//! Turns the administrative fields of a facility record into a queryable
//! address ([`address`]) and resolves that address to coordinates through
//! a provider configured via TOML files in `services/`
//! ([`service_registry`]). The only provider today is the Kakao Local
//! address search ([`kakao`]), which allows 10 requests per second per
//! key; pacing is the caller's job.
//!
//! Providers implement [`Geocoder`] so the batch scheduler can be driven
//! by any of them, including in-memory doubles in tests.

pub mod address;
pub mod kakao;
pub mod service_registry;

use async_trait::async_trait;
use thiserror::Error;

/// A geocoding result with coordinates and matched labels.
#[derive(Debug, Clone, PartialEq)]
pub struct GeocodedAddress {
    /// Latitude (WGS84).
    pub latitude: f64,
    /// Longitude (WGS84).
    pub longitude: f64,
    /// The lot-number address the provider matched.
    pub matched_address: Option<String>,
    /// The road-name address the provider matched, when it has one.
    pub road_address: Option<String>,
    /// Which provider resolved this address.
    pub provider: GeocodingProvider,
}

/// Which geocoding provider resolved an address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeocodingProvider {
    /// Kakao Local address search.
    Kakao,
}

/// Errors from geocoding operations.
///
/// Every variant is terminal for the address it was raised for; nothing in
/// this crate retries.
#[derive(Debug, Error)]
pub enum GeocodeError {
    /// HTTP request failed before a response arrived.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("HTTP status {status}")]
    Status {
        /// Response status code.
        status: u16,
    },

    /// The service answered 429.
    #[error("Rate limit exceeded")]
    RateLimited,

    /// The service returned no candidates.
    #[error("No match")]
    NoMatch,

    /// Response parsing failed.
    #[error("Parse error: {message}")]
    Parse {
        /// Description of the parsing failure.
        message: String,
    },
}

/// A single-address geocoding provider.
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Identifier of the backing service (e.g., `"kakao"`).
    fn id(&self) -> &str;

    /// Resolves one address with exactly one outbound request.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError`] on transport failure, a non-success
    /// status, an empty result set, or a malformed response.
    async fn resolve(&self, address: &str) -> Result<GeocodedAddress, GeocodeError>;
}
