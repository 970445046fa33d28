//! Order-preserving filters over classified lights.
//!
//! Each filter is a pure function of its inputs, so they can be composed
//! in any order and called concurrently over the same slice.

use geo::{Distance, Haversine, Point};
use signal_map_signal_models::{ClassifiedLight, Coordinates};

/// Region filter value that matches every light.
pub const ALL_REGIONS: &str = "all";

/// Keeps lights whose region equals `region` exactly. `None` and
/// [`ALL_REGIONS`] keep everything.
#[must_use]
pub fn filter_by_region(
    lights: &[ClassifiedLight],
    region: Option<&str>,
) -> Vec<ClassifiedLight> {
    match region {
        None | Some(ALL_REGIONS) => lights.to_vec(),
        Some(region) => lights
            .iter()
            .filter(|l| l.region == region)
            .cloned()
            .collect(),
    }
}

/// Keeps lights whose priority rank equals `priority`. `None` keeps
/// everything.
#[must_use]
pub fn filter_by_priority(
    lights: &[ClassifiedLight],
    priority: Option<u8>,
) -> Vec<ClassifiedLight> {
    let Some(priority) = priority else {
        return lights.to_vec();
    };

    lights
        .iter()
        .filter(|l| l.priority.value() == priority)
        .cloned()
        .collect()
}

/// Case-insensitive substring search over name, intersection, address,
/// and region. A blank query keeps everything.
#[must_use]
pub fn search(lights: &[ClassifiedLight], query: &str) -> Vec<ClassifiedLight> {
    let term = query.trim().to_lowercase();
    if term.is_empty() {
        return lights.to_vec();
    }

    lights
        .iter()
        .filter(|l| {
            [&l.name, &l.intersection, &l.address, &l.region]
                .iter()
                .any(|field| field.to_lowercase().contains(&term))
        })
        .cloned()
        .collect()
}

/// The filters a display layer applies together.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LightFilter {
    /// Region label, or [`ALL_REGIONS`].
    pub region: Option<String>,
    /// Priority rank.
    pub priority: Option<u8>,
    /// Free-text query.
    pub query: Option<String>,
}

impl LightFilter {
    /// Applies region, then priority, then search.
    #[must_use]
    pub fn apply(&self, lights: &[ClassifiedLight]) -> Vec<ClassifiedLight> {
        let filtered = filter_by_region(lights, self.region.as_deref());
        let filtered = filter_by_priority(&filtered, self.priority);
        match &self.query {
            Some(query) => search(&filtered, query),
            None => filtered,
        }
    }
}

/// Great-circle distance between two points in kilometres, on a sphere of
/// the Earth's mean radius.
#[must_use]
pub fn distance_km(from: Coordinates, to: Coordinates) -> f64 {
    Haversine.distance(to_point(from), to_point(to)) / 1000.0
}

fn to_point(at: Coordinates) -> Point<f64> {
    Point::new(at.lng, at.lat)
}

/// Keeps located lights within `radius_km` of `center`.
#[must_use]
pub fn within_radius(
    lights: &[ClassifiedLight],
    center: Coordinates,
    radius_km: f64,
) -> Vec<ClassifiedLight> {
    lights
        .iter()
        .filter(|l| {
            l.location
                .is_some_and(|at| distance_km(center, at) <= radius_km)
        })
        .cloned()
        .collect()
}

/// Light count per region, largest first. Regions with equal counts keep
/// the order they were first seen in.
#[must_use]
pub fn region_counts(lights: &[ClassifiedLight]) -> Vec<(String, usize)> {
    let mut counts: Vec<(String, usize)> = Vec::new();
    for light in lights {
        match counts.iter_mut().find(|(region, _)| *region == light.region) {
            Some((_, count)) => *count += 1,
            None => counts.push((light.region.clone(), 1)),
        }
    }
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
}
