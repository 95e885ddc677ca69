//! Raw payload shapes, after envelope unwrapping and `camelCase` conversion.
//!
//! Every field the server may omit is optional and unknown fields are
//! ignored, so schema additions on the backend do not break decoding. Free
//! text that maps to closed tags stays a `String` here; the adapters own the
//! mapping.

use serde::{Deserialize, Deserializer};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPhysicalLocation {
    pub id: String,
    pub name: String,
    pub location_type: Option<String>,
    pub map_coordinates: Option<String>,
    #[serde(alias = "color")]
    pub bg_color: Option<String>,
    /// Present on single-location replies; BFF aggregates send them flat.
    #[serde(default)]
    pub sublocations: Vec<RawSublocation>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSublocation {
    pub id: String,
    pub name: String,
    #[serde(alias = "sublocationType")]
    pub location_type: Option<String>,
    pub parent_location_id: Option<String>,
    #[serde(alias = "notes")]
    pub description: Option<String>,
    #[serde(alias = "color")]
    pub bg_color: Option<String>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub stored_items: Option<u64>,
    pub items: Option<Vec<RawGameItem>>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawGameItem {
    pub id: String,
    pub name: String,
    #[serde(alias = "platform")]
    pub platform_name: Option<String>,
    #[serde(alias = "acquisitionDate")]
    pub acquired_date: Option<String>,
    pub condition: Option<String>,
    pub has_original_case: Option<bool>,
    pub has_manual: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawDigitalLocation {
    pub id: String,
    pub name: String,
    #[serde(alias = "platform")]
    pub location_type: Option<String>,
    pub is_subscription: Option<bool>,
    pub is_active: Option<bool>,
    #[serde(default, alias = "cost", deserialize_with = "lenient_amount")]
    pub monthly_cost: Option<f64>,
    #[serde(alias = "paymentDate")]
    pub next_payment_date: Option<String>,
    pub billing_cycle: Option<String>,
    pub payment_method: Option<String>,
    #[serde(default)]
    pub items: Vec<RawGameItem>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

/// Physical-locations BFF aggregate: parallel arrays.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPhysicalAggregate {
    pub physical_locations: Option<Vec<RawPhysicalLocation>>,
    pub sublocations: Option<Vec<RawSublocation>>,
}

/// Server-reported totals, used only when the detail arrays are incomplete.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTotals {
    #[serde(default, alias = "totalLocations", deserialize_with = "lenient_count")]
    pub locations: Option<u64>,
    #[serde(default, alias = "totalItems", deserialize_with = "lenient_count")]
    pub items: Option<u64>,
}

/// Whole-library BFF aggregate.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawLibraryAggregate {
    pub physical_locations: Option<Vec<RawPhysicalLocation>>,
    pub sublocations: Option<Vec<RawSublocation>>,
    pub digital_locations: Option<Vec<RawDigitalLocation>>,
    #[serde(alias = "meta")]
    pub totals: Option<RawTotals>,
}

/// Identifying fields of a mutation reply.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawEntityRef {
    pub id: Option<String>,
    pub parent_location_id: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrText {
    Number(f64),
    Text(String),
}

/// Accept `9.99` and `"9.99"`; anything unparsable becomes `None`.
fn lenient_amount<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    let raw = Option::<NumberOrText>::deserialize(deserializer)?;
    let amount = raw.and_then(|value| match value {
        NumberOrText::Number(n) => Some(n),
        NumberOrText::Text(text) => text.trim().parse::<f64>().ok(),
    });
    Ok(amount.filter(|n| n.is_finite()))
}

/// Accept `3` and `"3"`; negatives and garbage become `None`.
fn lenient_count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u64>, D::Error> {
    let raw = Option::<NumberOrText>::deserialize(deserializer)?;
    Ok(raw.and_then(|value| match value {
        NumberOrText::Number(n) if n >= 0.0 && n.fract() == 0.0 => Some(n as u64),
        NumberOrText::Number(_) => None,
        NumberOrText::Text(text) => text.trim().parse().ok(),
    }))
}
