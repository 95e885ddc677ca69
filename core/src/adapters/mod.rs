//! Domain adapters: raw (already `camelCase`) payloads to normalized entities.
//!
//! # Design
//! Every adapter is a pure, synchronous function of its input. Nothing is
//! cached between calls, hash maps are used for lookups only, and output
//! order follows input order, so adapting the same payload twice yields
//! equal results.
//!
//! Unexpected server data never fails an adapter. Unknown enum text falls
//! back to a documented default, orphaned sublocations and duplicate items
//! are dropped, and each such recovery is returned as an `AdapterNotice`
//! next to the value so the caller can forward it to telemetry.

mod aggregate;
mod digital;
mod items;
mod physical;
mod tags;

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::dto::{
    RawDigitalLocation, RawLibraryAggregate, RawPhysicalAggregate, RawPhysicalLocation,
};
use crate::error::SyncError;
use crate::types::{DigitalLocation, LibrarySnapshot, PhysicalBatch, PhysicalLocation};

pub use aggregate::recompute as recompute_metadata;
pub use items::slugify;

use items::Ownership;

/// A local recovery an adapter made instead of failing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdapterNotice {
    /// Free text not in the lookup table; the default tag was used.
    UnknownTag {
        field: &'static str,
        raw: String,
        fallback: String,
    },
    /// Sublocation whose parent is not in the batch; dropped.
    OrphanedSublocation {
        sublocation_id: String,
        parent_location_id: Option<String>,
    },
    /// Location id repeated in one batch; later copies dropped.
    DuplicateLocation { id: String },
    /// Item listed under more than one location; kept at the first.
    DuplicateItem {
        item_id: String,
        kept_under: String,
        dropped_under: String,
    },
}

impl fmt::Display for AdapterNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdapterNotice::UnknownTag { field, raw, fallback } => {
                write!(f, "unknown {field} {raw:?}, using {fallback}")
            }
            AdapterNotice::OrphanedSublocation {
                sublocation_id,
                parent_location_id: Some(parent),
            } => write!(f, "dropped sublocation {sublocation_id}: parent {parent} not in batch"),
            AdapterNotice::OrphanedSublocation { sublocation_id, .. } => {
                write!(f, "dropped sublocation {sublocation_id}: no parent id")
            }
            AdapterNotice::DuplicateLocation { id } => write!(f, "dropped duplicate location {id}"),
            AdapterNotice::DuplicateItem {
                item_id,
                kept_under,
                dropped_under,
            } => write!(
                f,
                "item {item_id} listed under {kept_under} and {dropped_under}; kept under {kept_under}"
            ),
        }
    }
}

/// Notices collected while adapting one payload.
#[derive(Debug, Default)]
pub(crate) struct Notices(Vec<AdapterNotice>);

impl Notices {
    pub(crate) fn push(&mut self, notice: AdapterNotice) {
        self.0.push(notice);
    }

    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.0.len()
    }

    pub(crate) fn into_vec(self) -> Vec<AdapterNotice> {
        self.0
    }
}

/// Adapter output plus the recoveries made while producing it.
#[derive(Debug, Clone, PartialEq)]
pub struct Adapted<T> {
    pub value: T,
    pub notices: Vec<AdapterNotice>,
}

impl<T> Adapted<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Adapted<U> {
        Adapted {
            value: f(self.value),
            notices: self.notices,
        }
    }
}

fn decode<T: DeserializeOwned>(data: &Value) -> Result<T, SyncError> {
    T::deserialize(data).map_err(|e| SyncError::decode(e.to_string()))
}

fn finish<T>(value: T, notices: Notices) -> Adapted<T> {
    Adapted {
        value,
        notices: notices.into_vec(),
    }
}

/// Adapt the physical-locations aggregate (`physicalLocations` +
/// `sublocations` parallel arrays).
pub fn adapt_physical_aggregate(data: &Value) -> Result<Adapted<PhysicalBatch>, SyncError> {
    let raw: RawPhysicalAggregate = decode(data)?;
    let mut notices = Notices::default();
    let batch = physical::adapt_physical(
        raw.physical_locations.as_deref().unwrap_or_default(),
        raw.sublocations.as_deref().unwrap_or_default(),
        &mut Ownership::default(),
        &mut notices,
    );
    Ok(finish(batch, notices))
}

/// Adapt a single physical location with nested sublocations.
pub fn adapt_physical_location(data: &Value) -> Result<Adapted<PhysicalLocation>, SyncError> {
    let raw: RawPhysicalLocation = decode(data)?;
    let mut notices = Notices::default();
    let batch = physical::adapt_physical(
        std::slice::from_ref(&raw),
        &[],
        &mut Ownership::default(),
        &mut notices,
    );
    let location = batch
        .locations
        .into_iter()
        .next()
        .ok_or_else(|| SyncError::decode("physical location missing from reply"))?;
    Ok(finish(location, notices))
}

pub fn adapt_digital_locations(data: &Value) -> Result<Adapted<Vec<DigitalLocation>>, SyncError> {
    let raw: Vec<RawDigitalLocation> = decode(data)?;
    let mut notices = Notices::default();
    let locations = digital::adapt_digital(&raw, &mut Ownership::default(), &mut notices);
    Ok(finish(locations, notices))
}

pub fn adapt_digital_location(data: &Value) -> Result<Adapted<DigitalLocation>, SyncError> {
    let raw: RawDigitalLocation = decode(data)?;
    let mut notices = Notices::default();
    let location = digital::adapt_location(&raw, &mut Ownership::default(), &mut notices);
    Ok(finish(location, notices))
}

/// Adapt the whole-library aggregate.
///
/// Counts are recomputed when both `physicalLocations` and `sublocations`
/// are present; otherwise the server's totals are reported as-is with zero
/// breakdowns. Items are claimed by physical sublocations first, then by
/// digital locations.
pub fn adapt_library(data: &Value) -> Result<Adapted<LibrarySnapshot>, SyncError> {
    let raw: RawLibraryAggregate = decode(data)?;
    let mut notices = Notices::default();
    let mut ownership = Ownership::default();

    let batch = physical::adapt_physical(
        raw.physical_locations.as_deref().unwrap_or_default(),
        raw.sublocations.as_deref().unwrap_or_default(),
        &mut ownership,
        &mut notices,
    );
    let digital = digital::adapt_digital(
        raw.digital_locations.as_deref().unwrap_or_default(),
        &mut ownership,
        &mut notices,
    );

    let details_complete = raw.physical_locations.is_some() && raw.sublocations.is_some();
    let metadata = if details_complete {
        aggregate::recompute(&batch.locations, &digital)
    } else {
        aggregate::server_reported(raw.totals.unwrap_or_default())
    };

    Ok(finish(
        LibrarySnapshot {
            physical: batch.locations,
            digital,
            metadata,
        },
        notices,
    ))
}

/// RFC 3339, naive `YYYY-MM-DD HH:MM:SS` (taken as UTC), or a bare date at
/// midnight UTC. Anything else is absent.
pub(crate) fn parse_timestamp(raw: Option<&str>) -> Option<DateTime<Utc>> {
    let text = raw.map(str::trim).filter(|s| !s.is_empty())?;
    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Some(parsed.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

pub(crate) fn parse_date(raw: Option<&str>) -> Option<NaiveDate> {
    let text = raw.map(str::trim).filter(|s| !s.is_empty())?;
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .or_else(|| parse_timestamp(Some(text)).map(|ts| ts.date_naive()))
}
