//! Physical locations and their sublocations.
//!
//! Sublocations arrive either nested under their location or as a parallel
//! flat array. Both are resolved against the locations of the same batch by
//! `parentLocationId`; a sublocation whose parent is not in the batch is not
//! a valid entity and is dropped with an `OrphanedSublocation` notice.

use std::collections::{HashMap, HashSet};

use url::Url;

use crate::dto::{RawPhysicalLocation, RawSublocation};
use crate::types::{
    ItemOwner, MapCoordinates, PhysicalBatch, PhysicalLocation, PhysicalLocationType, Sublocation,
    SublocationType,
};

use super::items::{adapt_items, Ownership};
use super::tags::{map_optional_tag, map_tag};
use super::{parse_timestamp, AdapterNotice, Notices};

const MAP_SEARCH_URL: &str = "https://www.google.com/maps/search/";

pub(crate) fn adapt_physical(
    raw_locations: &[RawPhysicalLocation],
    raw_sublocations: &[RawSublocation],
    ownership: &mut Ownership,
    notices: &mut Notices,
) -> PhysicalBatch {
    let mut locations: Vec<PhysicalLocation> = Vec::with_capacity(raw_locations.len());
    let mut index: HashMap<&str, usize> = HashMap::with_capacity(raw_locations.len());

    for raw in raw_locations {
        if index.contains_key(raw.id.as_str()) {
            notices.push(AdapterNotice::DuplicateLocation { id: raw.id.clone() });
            continue;
        }
        index.insert(raw.id.as_str(), locations.len());
        locations.push(adapt_location(raw, notices));
    }

    let nested = raw_locations.iter().flat_map(|location| {
        location
            .sublocations
            .iter()
            .map(move |sub| (sub, Some(location.id.as_str())))
    });
    let flat = raw_sublocations.iter().map(|sub| (sub, None));

    let mut seen: HashSet<&str> = HashSet::new();
    let mut sublocations = Vec::with_capacity(raw_sublocations.len());
    for (raw, nested_under) in nested.chain(flat) {
        if !seen.insert(raw.id.as_str()) {
            continue;
        }
        let parent_id = raw.parent_location_id.as_deref().or(nested_under);
        let Some(&slot) = parent_id.and_then(|id| index.get(id)) else {
            notices.push(AdapterNotice::OrphanedSublocation {
                sublocation_id: raw.id.clone(),
                parent_location_id: raw.parent_location_id.clone(),
            });
            continue;
        };

        let sublocation = adapt_sublocation(raw, &locations[slot], ownership, notices);
        locations[slot].sublocations.push(sublocation.clone());
        sublocations.push(sublocation);
    }

    PhysicalBatch {
        locations,
        sublocations,
    }
}

fn adapt_location(raw: &RawPhysicalLocation, notices: &mut Notices) -> PhysicalLocation {
    PhysicalLocation {
        id: raw.id.clone(),
        name: raw.name.clone(),
        location_type: map_tag::<PhysicalLocationType>(raw.location_type.as_deref(), notices),
        coordinates: map_coordinates(raw.map_coordinates.as_deref()),
        color: map_optional_tag(raw.bg_color.as_deref(), notices),
        sublocations: Vec::new(),
        created_at: parse_timestamp(raw.created_at.as_deref()),
        updated_at: parse_timestamp(raw.updated_at.as_deref()),
    }
}

/// Build a sublocation, copying display fields from its resolved parent.
fn adapt_sublocation(
    raw: &RawSublocation,
    parent: &PhysicalLocation,
    ownership: &mut Ownership,
    notices: &mut Notices,
) -> Sublocation {
    let owner = ItemOwner::Sublocation {
        location_id: parent.id.clone(),
        sublocation_id: raw.id.clone(),
    };
    let items = raw
        .items
        .as_deref()
        .map(|items| adapt_items(items, &owner, ownership, notices));
    let stored_items = match &items {
        Some(items) => items.len(),
        None => raw
            .stored_items
            .and_then(|n| usize::try_from(n).ok())
            .unwrap_or(0),
    };
    let own_color = map_optional_tag(raw.bg_color.as_deref(), notices);

    Sublocation {
        id: raw.id.clone(),
        name: raw.name.clone(),
        sublocation_type: map_tag::<SublocationType>(raw.location_type.as_deref(), notices),
        parent_location_id: parent.id.clone(),
        parent_name: parent.name.clone(),
        parent_location_type: parent.location_type,
        parent_color: parent.color,
        notes: raw
            .description
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string),
        color: own_color.or(parent.color),
        stored_items,
        items: items.unwrap_or_default(),
        created_at: parse_timestamp(raw.created_at.as_deref()),
        updated_at: parse_timestamp(raw.updated_at.as_deref()),
    }
}

/// Keep the raw text; add a map link when it reads as `lat, lng`.
fn map_coordinates(raw: Option<&str>) -> Option<MapCoordinates> {
    let raw = raw.map(str::trim).filter(|s| !s.is_empty())?;
    Some(MapCoordinates {
        raw: raw.to_string(),
        link: map_link(raw),
    })
}

fn map_link(raw: &str) -> Option<String> {
    let (lat, lng) = raw.split_once(',')?;
    let lat: f64 = lat.trim().parse().ok()?;
    let lng: f64 = lng.trim().parse().ok()?;
    if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
        return None;
    }
    let url = Url::parse_with_params(
        MAP_SEARCH_URL,
        &[("api", "1".to_string()), ("query", format!("{lat},{lng}"))],
    )
    .ok()?;
    Some(url.into())
}
