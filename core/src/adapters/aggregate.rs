//! Derived counts for library views.
//!
//! Counts are always recomputed from normalized entities when the detail
//! arrays are available. Server totals are used only when they are the sole
//! source, and then every breakdown is zero rather than a guess.

use std::collections::BTreeMap;

use crate::dto::RawTotals;
use crate::types::{
    AggregateMetadata, CountSource, DigitalLocation, ItemCounts, LocationCounts, PhysicalLocation,
};

pub fn recompute(physical: &[PhysicalLocation], digital: &[DigitalLocation]) -> AggregateMetadata {
    let mut by_location = BTreeMap::new();
    let mut physical_items = 0;
    let mut sublocations = 0;
    for location in physical {
        let stored = location.stored_items();
        physical_items += stored;
        sublocations += location.sublocations.len();
        *by_location.entry(location.id.clone()).or_insert(0) += stored;
    }

    let mut digital_items = 0;
    for location in digital {
        digital_items += location.items.len();
        *by_location.entry(location.id.clone()).or_insert(0) += location.items.len();
    }

    AggregateMetadata {
        locations: LocationCounts {
            physical: physical.len(),
            digital: digital.len(),
            sublocations,
            total: physical.len() + digital.len(),
        },
        items: ItemCounts {
            physical: physical_items,
            digital: digital_items,
            total: physical_items + digital_items,
            by_location,
        },
        source: CountSource::Recomputed,
    }
}

pub(crate) fn server_reported(totals: RawTotals) -> AggregateMetadata {
    let count = |n: Option<u64>| n.and_then(|n| usize::try_from(n).ok()).unwrap_or(0);
    AggregateMetadata {
        locations: LocationCounts {
            total: count(totals.locations),
            ..LocationCounts::default()
        },
        items: ItemCounts {
            total: count(totals.items),
            ..ItemCounts::default()
        },
        source: CountSource::ServerReported,
    }
}
