//! Normalized domain entities handed to the UI layer.
//!
//! # Design
//! These are the only shapes the rest of the application sees. They are
//! produced exclusively by the adapters from decoded server payloads and are
//! replaced wholesale on every fetch; nothing here is patched in place.
//! Closed tag enums serialize as `snake_case` so the same names work as wire
//! values for mutations.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Kind of physical place that holds media.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhysicalLocationType {
    House,
    Apartment,
    Office,
    Warehouse,
    Vehicle,
    StorageUnit,
}

/// Kind of storage spot inside a physical location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SublocationType {
    Shelf,
    Console,
    Cabinet,
    Closet,
    Drawer,
    Box,
    Device,
}

/// Digital storefront or subscription service.
///
/// `Steam` is first and is the fallback for unrecognized server text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DigitalPlatform {
    Steam,
    EpicGames,
    Gog,
    PlaystationNetwork,
    XboxLive,
    NintendoEshop,
    EaApp,
    UbisoftConnect,
    BattleNet,
    AmazonLuna,
    AppleArcade,
    GooglePlay,
}

/// Payment method icon tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Generic,
    Visa,
    Mastercard,
    Amex,
    Discover,
    Paypal,
    ApplePay,
    GooglePay,
    AmazonPay,
    Alipay,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillingCycle {
    Monthly,
    Quarterly,
    Annually,
}

/// Icon colour tag shared by locations and sublocations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IconColor {
    Red,
    Green,
    Blue,
    Gold,
    Purple,
    Orange,
    Brown,
    Gray,
}

/// Raw coordinate text plus a map-service link when it parses as `lat, lng`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapCoordinates {
    pub raw: String,
    pub link: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PhysicalLocation {
    pub id: String,
    pub name: String,
    pub location_type: PhysicalLocationType,
    pub coordinates: Option<MapCoordinates>,
    pub color: Option<IconColor>,
    /// Owned sublocations, in server order.
    pub sublocations: Vec<Sublocation>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl PhysicalLocation {
    /// Items stored across all sublocations.
    pub fn stored_items(&self) -> usize {
        self.sublocations.iter().map(|s| s.stored_items).sum()
    }
}

/// Storage spot inside a `PhysicalLocation`.
///
/// The `parent_*` fields are copied from the parent when the payload is
/// adapted. They do not follow later edits to the parent until the next
/// fetch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sublocation {
    pub id: String,
    pub name: String,
    pub sublocation_type: SublocationType,
    pub parent_location_id: String,
    pub parent_name: String,
    pub parent_location_type: PhysicalLocationType,
    pub parent_color: Option<IconColor>,
    pub notes: Option<String>,
    /// Own colour, or the parent's when the sublocation has none.
    pub color: Option<IconColor>,
    /// `items.len()` when the server sent the list, otherwise its count.
    pub stored_items: usize,
    pub items: Vec<GameItem>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Subscription and billing attributes of a digital location.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Billing {
    pub is_subscription: bool,
    /// Cost per billing cycle.
    pub cost: Option<f64>,
    pub cycle: BillingCycle,
    pub next_payment_date: Option<NaiveDate>,
    pub payment_method: PaymentMethod,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DigitalLocation {
    pub id: String,
    pub name: String,
    pub platform: DigitalPlatform,
    pub is_active: bool,
    pub billing: Billing,
    pub items: Vec<GameItem>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Which single location owns a `GameItem` in the normalized model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ItemOwner {
    Sublocation {
        location_id: String,
        sublocation_id: String,
    },
    Digital {
        location_id: String,
    },
}

impl ItemOwner {
    /// Id of the top-level location, physical or digital.
    pub fn location_id(&self) -> &str {
        match self {
            ItemOwner::Sublocation { location_id, .. } | ItemOwner::Digital { location_id } => {
                location_id
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PhysicalMedia {
    pub condition: Option<String>,
    pub has_original_case: Option<bool>,
    pub has_manual: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameItem {
    pub id: String,
    pub name: String,
    /// URL-safe label derived from `name`.
    pub slug: String,
    pub platform: Option<String>,
    pub acquired_date: Option<NaiveDate>,
    pub media: Option<PhysicalMedia>,
    pub owner: ItemOwner,
}

/// Result of adapting a physical-locations BFF aggregate.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PhysicalBatch {
    pub locations: Vec<PhysicalLocation>,
    /// Every resolved sublocation across all locations, in server order.
    pub sublocations: Vec<Sublocation>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LocationCounts {
    pub physical: usize,
    pub digital: usize,
    pub sublocations: usize,
    pub total: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ItemCounts {
    pub physical: usize,
    pub digital: usize,
    pub total: usize,
    /// Keyed by top-level location id.
    pub by_location: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CountSource {
    /// Counted from the normalized entities.
    #[default]
    Recomputed,
    /// Only server totals were available; breakdowns are zero.
    ServerReported,
}

/// Derived counts for a library view. Never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AggregateMetadata {
    pub locations: LocationCounts,
    pub items: ItemCounts,
    pub source: CountSource,
}

/// Whole-library view: both location kinds and their counts.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LibrarySnapshot {
    pub physical: Vec<PhysicalLocation>,
    pub digital: Vec<DigitalLocation>,
    pub metadata: AggregateMetadata,
}
