//! Grouping of classified lights into intersections.

use std::collections::BTreeMap;

use signal_map_signal_models::{ClassifiedLight, Coordinates, Intersection};

/// Groups lights by intersection name.
///
/// Intersections come out in the order their name is first seen. Members
/// are sorted by priority with a stable sort, so equal ranks keep their
/// input order. The centroid averages only members that have a location;
/// an intersection where none do is still returned, without one.
#[must_use]
pub fn aggregate_intersections(lights: &[ClassifiedLight]) -> Vec<Intersection> {
    let mut index: BTreeMap<&str, usize> = BTreeMap::new();
    let mut groups: Vec<(&str, Vec<ClassifiedLight>)> = Vec::new();

    for light in lights {
        let name = light.intersection.as_str();
        if let Some(&slot) = index.get(name) {
            groups[slot].1.push(light.clone());
        } else {
            index.insert(name, groups.len());
            groups.push((name, vec![light.clone()]));
        }
    }

    groups
        .into_iter()
        .map(|(name, mut members)| {
            members.sort_by_key(|l| l.priority);
            Intersection {
                id: intersection_id(name),
                name: name.to_string(),
                location: centroid(&members),
                total_count: members.len(),
                traffic_lights: members,
            }
        })
        .collect()
}

/// Stable identifier for an intersection name.
#[must_use]
pub fn intersection_id(name: &str) -> String {
    format!("intersection_{}", crate::collapse_whitespace(name, "_"))
}

/// Mean position of the lights that have one.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn centroid(lights: &[ClassifiedLight]) -> Option<Coordinates> {
    let located: Vec<Coordinates> = lights.iter().filter_map(|l| l.location).collect();
    if located.is_empty() {
        return None;
    }

    let n = located.len() as f64;
    let (lat_sum, lng_sum) = located
        .iter()
        .fold((0.0, 0.0), |(lat, lng), c| (lat + c.lat, lng + c.lng));

    Some(Coordinates {
        lat: lat_sum / n,
        lng: lng_sum / n,
    })
}

/// Finds the intersection a light belongs to.
#[must_use]
pub fn intersection_containing<'a>(
    intersections: &'a [Intersection],
    light_id: &str,
) -> Option<&'a Intersection> {
    intersections
        .iter()
        .find(|i| i.traffic_lights.iter().any(|l| l.id == light_id))
}
