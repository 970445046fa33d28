//! Address deduplication and result fan-out.
//!
//! Records that share a generated address are geocoded once. Groups keep
//! the order their address first appears in, and each group remembers the
//! input positions of its members so results land back in input order.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use signal_map_geocoder::address::AddressCandidateBuilder;
use signal_map_signal_models::{Coordinates, GeocodingInfo, ProcessedRecord, RawFacilityRecord};

use crate::scheduler::GroupOutcome;

/// Records sharing one generated address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressGroup {
    /// The generated address sent to the provider.
    pub address: String,
    /// Input positions of the member records, ascending.
    pub members: Vec<usize>,
}

/// Every geocodable record grouped by address, plus the records that had
/// no usable address.
#[derive(Debug, Clone, Default)]
pub struct AddressGroups {
    groups: Vec<AddressGroup>,
    index: BTreeMap<String, usize>,
    unaddressable: Vec<usize>,
}

impl AddressGroups {
    /// Groups in first-occurrence order.
    #[must_use]
    pub fn groups(&self) -> &[AddressGroup] {
        &self.groups
    }

    /// Number of distinct addresses.
    #[must_use]
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Whether no record produced an address.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Input positions of records without any usable address.
    #[must_use]
    pub fn unaddressable(&self) -> &[usize] {
        &self.unaddressable
    }

    /// Looks up the group for a generated address.
    #[must_use]
    pub fn get(&self, address: &str) -> Option<&AddressGroup> {
        self.index.get(address).map(|&slot| &self.groups[slot])
    }

    fn push(&mut self, address: String, position: usize) {
        if let Some(&slot) = self.index.get(&address) {
            self.groups[slot].members.push(position);
        } else {
            self.index.insert(address.clone(), self.groups.len());
            self.groups.push(AddressGroup {
                address,
                members: vec![position],
            });
        }
    }
}

/// Builds the address index for `records`.
///
/// Records for which `builder` yields no candidate are logged and set
/// aside; they are still emitted later, without coordinates.
#[must_use]
pub fn build_address_groups(
    builder: &AddressCandidateBuilder,
    records: &[RawFacilityRecord],
) -> AddressGroups {
    let mut groups = AddressGroups::default();

    for (position, record) in records.iter().enumerate() {
        match builder.build(record) {
            Ok(address) => groups.push(address, position),
            Err(e) => {
                log::warn!("Record {position} skipped for geocoding: {e}");
                groups.unaddressable.push(position);
            }
        }
    }

    log::info!(
        "Deduplicated to {} unique addresses from {} records ({} without an address)",
        groups.len(),
        records.len(),
        groups.unaddressable.len()
    );

    groups
}

/// Joins geocoding results back onto the input records.
///
/// `resolved[i]` is the outcome for `groups.groups()[i]`. Every group member
/// gets the same coordinates, annotation, and resolution time. Records
/// that had no address are stamped with `finished_at`. The output has one
/// row per input record, in input order.
#[must_use]
pub fn fan_out(
    records: Vec<RawFacilityRecord>,
    groups: &AddressGroups,
    resolved: &[GroupOutcome],
    finished_at: DateTime<Utc>,
) -> Vec<ProcessedRecord> {
    let mut slots: Vec<Option<(&str, &GroupOutcome)>> = vec![None; records.len()];

    for (group, outcome) in groups.groups().iter().zip(resolved) {
        for &position in &group.members {
            slots[position] = Some((group.address.as_str(), outcome));
        }
    }

    records
        .into_iter()
        .zip(slots)
        .map(|(record, slot)| {
            let address = slot.map(|(address, _)| address);
            let geocoded = slot.and_then(|(_, outcome)| outcome.geocoded.as_ref());
            let info = GeocodingInfo {
                generated_address: address.map(String::from),
                original_sido: record.sido.clone(),
                original_signgu: record.signgu.clone(),
                original_route: record.route.clone(),
                matched_address: geocoded.and_then(|g| g.matched_address.clone()),
                matched_road_address: geocoded.and_then(|g| g.road_address.clone()),
                geocoding_failed: geocoded.is_none(),
                geocoded_at: slot.map_or(finished_at, |(_, outcome)| outcome.resolved_at),
            };

            ProcessedRecord {
                coordinates: geocoded.map(|g| Coordinates {
                    lat: g.latitude,
                    lng: g.longitude,
                }),
                geocoding_info: Some(info),
                record,
            }
        })
        .collect()
}
