//! Address derivation for facility records.
//!
//! The feed has no street address, only administrative names:
//! - Province (`SIDO_NM`), often missing: `"경기도"`
//! - City / county (`SIGNGU_NM`): `"수원시"`
//! - Road (`ROUTE_NM`): `"중부대로"`
//!
//! This module builds address strings from those, most specific first.

use signal_map_signal_models::{DEFAULT_REGION, RawFacilityRecord};
use thiserror::Error;

/// Errors from address derivation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    /// None of the candidate forms produced a non-blank address.
    #[error("address generation failed (signgu: {signgu:?}, route: {route:?})")]
    AddressGenerationFailed {
        /// City / county name as read.
        signgu: Option<String>,
        /// Road name as read.
        route: Option<String>,
    },
}

/// Builds ranked address candidates from facility records.
#[derive(Debug, Clone)]
pub struct AddressCandidateBuilder {
    default_region: String,
}

impl Default for AddressCandidateBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_REGION)
    }
}

impl AddressCandidateBuilder {
    /// Creates a builder that uses `default_region` for records without a
    /// province name.
    #[must_use]
    pub fn new(default_region: impl Into<String>) -> Self {
        Self {
            default_region: default_region.into(),
        }
    }

    /// Returns every candidate address for `record`, most specific first:
    ///
    /// 1. province + city + road (city and road present)
    /// 2. city + road (city and road present)
    /// 3. province + city (city present)
    ///
    /// Blank candidates are dropped, so the list may be empty.
    #[must_use]
    pub fn candidates(&self, record: &RawFacilityRecord) -> Vec<String> {
        let sido = record
            .sido_name()
            .unwrap_or_else(|| self.default_region.trim());
        let signgu = record.signgu_name();
        let route = record.route_name();

        let mut candidates = Vec::with_capacity(3);

        if let (Some(signgu), Some(route)) = (signgu, route) {
            candidates.push(join(&[sido, signgu, route]));
            candidates.push(join(&[signgu, route]));
        }

        if let Some(signgu) = signgu {
            candidates.push(join(&[sido, signgu]));
        }

        candidates.retain(|c| !c.is_empty());
        candidates
    }

    /// Returns the most specific candidate for `record`.
    ///
    /// # Errors
    ///
    /// Returns [`AddressError::AddressGenerationFailed`] when no candidate
    /// survives.
    pub fn build(&self, record: &RawFacilityRecord) -> Result<String, AddressError> {
        self.candidates(record).into_iter().next().ok_or_else(|| {
            AddressError::AddressGenerationFailed {
                signgu: record.signgu.clone(),
                route: record.route.clone(),
            }
        })
    }
}

fn join(parts: &[&str]) -> String {
    parts
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
