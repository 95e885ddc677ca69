//! Typed fetchers and mutators consumed by the query cache.
//!
//! # Design
//! `LibraryApi` composes the transport with the adapters: a fetcher sends
//! one request, adapts the unwrapped data and forwards adapter notices to
//! telemetry. Mutators encode their input as internal `camelCase` JSON (the
//! transport converts it to wire casing) and return a `Mutation` carrying
//! the cache keys the caller should invalidate.

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::Value;
use url::form_urlencoded;

use crate::adapters::{
    adapt_digital_location, adapt_digital_locations, adapt_library, adapt_physical_aggregate,
    adapt_physical_location, Adapted,
};
use crate::client::{ApiClient, ApiRequest};
use crate::dto::RawEntityRef;
use crate::error::SyncError;
use crate::types::{
    BillingCycle, DigitalLocation, DigitalPlatform, IconColor, LibrarySnapshot, PaymentMethod,
    PhysicalBatch, PhysicalLocation, PhysicalLocationType, SublocationType,
};

const PHYSICAL: &str = "/v1/locations/physical";
const PHYSICAL_BFF: &str = "/v1/locations/physical/bff";
const SUBLOCATIONS: &str = "/v1/locations/sublocations";
const DIGITAL: &str = "/v1/locations/digital";
const LIBRARY_BFF: &str = "/v1/library/bff";

/// Named query-cache entry a mutation may make stale.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    PhysicalLocations,
    PhysicalLocation(String),
    DigitalLocations,
    DigitalLocation(String),
    Library,
}

impl CacheKey {
    /// Hierarchical key segments, e.g. `["locations", "physical", "p1"]`.
    pub fn segments(&self) -> Vec<&str> {
        match self {
            CacheKey::PhysicalLocations => vec!["locations", "physical"],
            CacheKey::PhysicalLocation(id) => vec!["locations", "physical", id.as_str()],
            CacheKey::DigitalLocations => vec!["locations", "digital"],
            CacheKey::DigitalLocation(id) => vec!["locations", "digital", id.as_str()],
            CacheKey::Library => vec!["library"],
        }
    }
}

/// Result of a mutator: the new value plus the keys to invalidate.
#[derive(Debug, Clone, PartialEq)]
pub struct Mutation<T> {
    pub value: T,
    pub invalidates: Vec<CacheKey>,
}

/// Identifying fields of a created or deleted entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityRef {
    pub id: String,
    pub parent_location_id: Option<String>,
}

/// Server confirmation that an entity is gone.
pub type DeleteConfirmation = EntityRef;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPhysicalLocation {
    pub name: String,
    pub location_type: PhysicalLocationType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub map_coordinates: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bg_color: Option<IconColor>,
}

/// Only the fields that are `Some` are sent; the rest stay unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PhysicalLocationUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location_type: Option<PhysicalLocationType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub map_coordinates: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bg_color: Option<IconColor>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSublocation {
    pub name: String,
    pub location_type: SublocationType,
    pub parent_location_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bg_color: Option<IconColor>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDigitalLocation {
    pub name: String,
    #[serde(rename = "locationType")]
    pub platform: DigitalPlatform,
    pub is_subscription: bool,
    pub is_active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monthly_cost: Option<f64>,
    pub billing_cycle: BillingCycle,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_payment_date: Option<NaiveDate>,
    pub payment_method: PaymentMethod,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DigitalLocationUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "locationType", skip_serializing_if = "Option::is_none")]
    pub platform: Option<DigitalPlatform>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_subscription: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monthly_cost: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub billing_cycle: Option<BillingCycle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_payment_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<PaymentMethod>,
}

/// Fetchers and mutators over one `ApiClient`.
#[derive(Debug, Clone)]
pub struct LibraryApi {
    client: ApiClient,
}

impl LibraryApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    // -- fetchers -----------------------------------------------------------

    pub async fn physical_locations_bff(&self) -> Result<PhysicalBatch, SyncError> {
        let data = self.client.send(ApiRequest::get(PHYSICAL_BFF)).await?;
        Ok(self.report(adapt_physical_aggregate(&data)?))
    }

    pub async fn physical_location(&self, id: &str) -> Result<PhysicalLocation, SyncError> {
        let data = self
            .client
            .send(ApiRequest::get(entity_path(PHYSICAL, id)?))
            .await?;
        Ok(self.report(adapt_physical_location(&data)?))
    }

    pub async fn digital_locations(&self) -> Result<Vec<DigitalLocation>, SyncError> {
        let data = self.client.send(ApiRequest::get(DIGITAL)).await?;
        Ok(self.report(adapt_digital_locations(&data)?))
    }

    pub async fn digital_location(&self, id: &str) -> Result<DigitalLocation, SyncError> {
        let data = self
            .client
            .send(ApiRequest::get(entity_path(DIGITAL, id)?))
            .await?;
        Ok(self.report(adapt_digital_location(&data)?))
    }

    pub async fn library_snapshot(&self) -> Result<LibrarySnapshot, SyncError> {
        let data = self.client.send(ApiRequest::get(LIBRARY_BFF)).await?;
        Ok(self.report(adapt_library(&data)?))
    }

    // -- mutators -----------------------------------------------------------

    pub async fn create_physical_location(
        &self,
        input: &NewPhysicalLocation,
    ) -> Result<Mutation<PhysicalLocation>, SyncError> {
        let data = self.client.send(ApiRequest::post(PHYSICAL).json(encode(input)?)).await?;
        let location = self.report(adapt_physical_location(&data)?);
        let invalidates = physical_keys(&location.id);
        Ok(Mutation { value: location, invalidates })
    }

    pub async fn update_physical_location(
        &self,
        id: &str,
        update: &PhysicalLocationUpdate,
    ) -> Result<Mutation<PhysicalLocation>, SyncError> {
        let request = ApiRequest::patch(entity_path(PHYSICAL, id)?).json(encode(update)?);
        let data = self.client.send(request).await?;
        let location = self.report(adapt_physical_location(&data)?);
        Ok(Mutation {
            value: location,
            invalidates: physical_keys(id),
        })
    }

    /// Sublocations go with their location server-side; no client cascade.
    pub async fn delete_physical_location(
        &self,
        id: &str,
    ) -> Result<Mutation<DeleteConfirmation>, SyncError> {
        let data = self
            .client
            .send(ApiRequest::delete(entity_path(PHYSICAL, id)?))
            .await?;
        let confirmation = confirm_delete(&data, id)?;
        Ok(Mutation {
            value: confirmation,
            invalidates: physical_keys(id),
        })
    }

    /// Returns the new sublocation's id and parent; the caller refetches
    /// the parent to get the adapted entity.
    pub async fn create_sublocation(
        &self,
        input: &NewSublocation,
    ) -> Result<Mutation<EntityRef>, SyncError> {
        let data = self
            .client
            .send(ApiRequest::post(SUBLOCATIONS).json(encode(input)?))
            .await?;
        let mut created = entity_ref(&data)?;
        let parent = created
            .parent_location_id
            .get_or_insert_with(|| input.parent_location_id.clone())
            .clone();
        Ok(Mutation {
            value: created,
            invalidates: physical_keys(&parent),
        })
    }

    pub async fn delete_sublocation(
        &self,
        id: &str,
        parent_location_id: &str,
    ) -> Result<Mutation<DeleteConfirmation>, SyncError> {
        let data = self
            .client
            .send(ApiRequest::delete(entity_path(SUBLOCATIONS, id)?))
            .await?;
        let mut confirmation = confirm_delete(&data, id)?;
        let parent = confirmation
            .parent_location_id
            .get_or_insert_with(|| parent_location_id.to_string())
            .clone();
        Ok(Mutation {
            value: confirmation,
            invalidates: physical_keys(&parent),
        })
    }

    pub async fn create_digital_location(
        &self,
        input: &NewDigitalLocation,
    ) -> Result<Mutation<DigitalLocation>, SyncError> {
        let data = self.client.send(ApiRequest::post(DIGITAL).json(encode(input)?)).await?;
        let location = self.report(adapt_digital_location(&data)?);
        let invalidates = digital_keys(&location.id);
        Ok(Mutation { value: location, invalidates })
    }

    pub async fn update_digital_location(
        &self,
        id: &str,
        update: &DigitalLocationUpdate,
    ) -> Result<Mutation<DigitalLocation>, SyncError> {
        let request = ApiRequest::patch(entity_path(DIGITAL, id)?).json(encode(update)?);
        let data = self.client.send(request).await?;
        let location = self.report(adapt_digital_location(&data)?);
        Ok(Mutation {
            value: location,
            invalidates: digital_keys(id),
        })
    }

    pub async fn delete_digital_location(
        &self,
        id: &str,
    ) -> Result<Mutation<DeleteConfirmation>, SyncError> {
        let data = self
            .client
            .send(ApiRequest::delete(entity_path(DIGITAL, id)?))
            .await?;
        let confirmation = confirm_delete(&data, id)?;
        Ok(Mutation {
            value: confirmation,
            invalidates: digital_keys(id),
        })
    }

    fn report<T>(&self, adapted: Adapted<T>) -> T {
        for notice in &adapted.notices {
            self.client.telemetry().record_adapter_notice(notice);
        }
        adapted.value
    }
}

fn encode<T: Serialize>(input: &T) -> Result<Value, SyncError> {
    serde_json::to_value(input).map_err(|e| SyncError::Serialization { message: e.to_string() })
}

fn entity_ref(data: &Value) -> Result<EntityRef, SyncError> {
    let raw: RawEntityRef =
        serde_json::from_value(data.clone()).map_err(|e| SyncError::decode(e.to_string()))?;
    let id = raw
        .id
        .ok_or_else(|| SyncError::decode("reply has no entity id"))?;
    Ok(EntityRef {
        id,
        parent_location_id: raw.parent_location_id,
    })
}

/// A delete is recognized when the reply names no id or the requested one.
fn confirm_delete(data: &Value, requested: &str) -> Result<DeleteConfirmation, SyncError> {
    let raw: RawEntityRef =
        serde_json::from_value(data.clone()).map_err(|e| SyncError::decode(e.to_string()))?;
    match raw.id {
        Some(id) if id != requested => Err(SyncError::protocol(format!(
            "delete of {requested} confirmed {id}"
        ))),
        _ => Ok(DeleteConfirmation {
            id: requested.to_string(),
            parent_location_id: raw.parent_location_id,
        }),
    }
}

/// `collection/<id>`, with `id` percent-encoded as exactly one path segment.
///
/// Empty, `.` and `..` ids are refused because URL parsers resolve them as
/// dot segments even when encoded.
fn entity_path(collection: &str, id: &str) -> Result<String, SyncError> {
    if matches!(id, "" | "." | "..") {
        return Err(SyncError::Serialization {
            message: format!("invalid entity id {id:?}"),
        });
    }
    let segment = form_urlencoded::byte_serialize(id.as_bytes())
        .collect::<String>()
        .replace('+', "%20");
    Ok(format!("{collection}/{segment}"))
}

fn physical_keys(id: &str) -> Vec<CacheKey> {
    vec![
        CacheKey::PhysicalLocation(id.to_string()),
        CacheKey::PhysicalLocations,
        CacheKey::Library,
    ]
}

fn digital_keys(id: &str) -> Vec<CacheKey> {
    vec![
        CacheKey::DigitalLocation(id.to_string()),
        CacheKey::DigitalLocations,
        CacheKey::Library,
    ]
}
