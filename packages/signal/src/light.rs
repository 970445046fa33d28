//! Conversion of snapshot rows into display-ready lights.

use signal_map_signal_models::{ClassifiedLight, OTHER_REGION, ProcessedRecord};

use crate::classify::{classify, intersection_name};

/// Classifies one snapshot row. `index` is the row's position in the
/// snapshot and only used when the record has no management number.
#[must_use]
pub fn classify_light(index: usize, processed: &ProcessedRecord) -> ClassifiedLight {
    let record = &processed.record;
    let classification = classify(record);
    let intersection = intersection_name(record);

    let id = record
        .manage_no
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map_or_else(|| format!("processed_{index}"), String::from);

    let address = processed
        .geocoding_info
        .as_ref()
        .and_then(|info| {
            info.matched_road_address
                .clone()
                .or_else(|| info.matched_address.clone())
                .or_else(|| info.generated_address.clone())
        })
        .unwrap_or_default();

    ClassifiedLight {
        id,
        name: format!("{intersection}-{}", classification.direction),
        location: processed.coordinates,
        intersection,
        priority: classification.priority,
        address,
        region: record.signgu_name().unwrap_or(OTHER_REGION).to_string(),
        crosswalk_direction: classification.direction,
        notes: classification.note.map(String::from),
    }
}

/// Classifies every row of a snapshot, keeping rows without coordinates.
#[must_use]
pub fn classify_snapshot(records: &[ProcessedRecord]) -> Vec<ClassifiedLight> {
    let lights: Vec<ClassifiedLight> = records
        .iter()
        .enumerate()
        .map(|(index, processed)| classify_light(index, processed))
        .collect();

    let located = lights.iter().filter(|l| l.location.is_some()).count();
    log::info!(
        "Classified {} lights ({located} with coordinates)",
        lights.len()
    );

    lights
}
