#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Classification, aggregation, and querying of geocoded traffic signals.
//!
//! Everything in this crate is pure and synchronous:
//!
//! - [`classify`] derives a priority rank, crosswalk direction, and note
//!   from the coded fields of a facility record.
//! - [`light`] turns snapshot rows into display-ready
//!   [`ClassifiedLight`](signal_map_signal_models::ClassifiedLight)s.
//! - [`aggregate`] groups lights into intersections with a centroid.
//! - [`query`] holds the order-preserving filters the display layer
//!   composes.

pub mod aggregate;
pub mod classify;
pub mod light;
pub mod query;

use std::sync::LazyLock;

use regex::Regex;

static WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Collapses whitespace runs into `replacement` and trims the result.
pub(crate) fn collapse_whitespace(value: &str, replacement: &str) -> String {
    WHITESPACE_RE
        .replace_all(value.trim(), replacement)
        .into_owned()
}
