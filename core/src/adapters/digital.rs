//! Digital locations: storefronts and subscriptions.

use crate::dto::RawDigitalLocation;
use crate::types::{Billing, BillingCycle, DigitalLocation, DigitalPlatform, ItemOwner, PaymentMethod};

use super::items::{adapt_items, Ownership};
use super::tags::map_tag;
use super::{parse_date, parse_timestamp, AdapterNotice, Notices};

pub(crate) fn adapt_digital(
    raw: &[RawDigitalLocation],
    ownership: &mut Ownership,
    notices: &mut Notices,
) -> Vec<DigitalLocation> {
    let mut locations: Vec<DigitalLocation> = Vec::with_capacity(raw.len());
    for location in raw {
        if locations.iter().any(|kept| kept.id == location.id) {
            notices.push(AdapterNotice::DuplicateLocation {
                id: location.id.clone(),
            });
            continue;
        }
        locations.push(adapt_location(location, ownership, notices));
    }
    locations
}

pub(crate) fn adapt_location(
    raw: &RawDigitalLocation,
    ownership: &mut Ownership,
    notices: &mut Notices,
) -> DigitalLocation {
    let owner = ItemOwner::Digital {
        location_id: raw.id.clone(),
    };

    DigitalLocation {
        id: raw.id.clone(),
        name: raw.name.clone(),
        platform: map_tag::<DigitalPlatform>(raw.location_type.as_deref(), notices),
        is_active: raw.is_active.unwrap_or(true),
        billing: Billing {
            is_subscription: raw.is_subscription.unwrap_or(false),
            cost: raw.monthly_cost,
            cycle: map_tag::<BillingCycle>(raw.billing_cycle.as_deref(), notices),
            next_payment_date: parse_date(raw.next_payment_date.as_deref()),
            payment_method: map_tag::<PaymentMethod>(raw.payment_method.as_deref(), notices),
        },
        items: adapt_items(&raw.items, &owner, ownership, notices),
        created_at: parse_timestamp(raw.created_at.as_deref()),
        updated_at: parse_timestamp(raw.updated_at.as_deref()),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn adapt(value: serde_json::Value) -> (Vec<DigitalLocation>, Vec<AdapterNotice>) {
        let raw: Vec<RawDigitalLocation> = serde_json::from_value(value).unwrap();
        let mut notices = Notices::default();
        let locations = adapt_digital(&raw, &mut Ownership::default(), &mut notices);
        (locations, notices.into_vec())
    }

    #[test]
    fn unknown_vendor_gets_default_platform() {
        let (locations, notices) = adapt(json!([
            { "id": "d1", "name": "Mystery Store", "locationType": "unknown-vendor" }
        ]));

        assert_eq!(locations[0].platform, DigitalPlatform::Steam);
        assert!(matches!(
            &notices[..],
            [AdapterNotice::UnknownTag { field: "platform", .. }]
        ));
    }

    #[test]
    fn subscription_fields_are_mapped() {
        let (locations, notices) = adapt(json!([{
            "id": "d2",
            "name": "Game Pass",
            "locationType": "Xbox Game Pass",
            "isSubscription": true,
            "monthlyCost": 16.99,
            "billingCycle": "1 month",
            "paymentDate": "2024-07-15",
            "paymentMethod": "Visa",
            "isActive": false,
            "items": [{ "id": "g7", "name": "Starfield", "platformName": "PC" }]
        }]));

        assert!(notices.is_empty());
        let location = &locations[0];
        assert_eq!(location.platform, DigitalPlatform::XboxLive);
        assert!(!location.is_active);
        assert!(location.billing.is_subscription);
        assert_eq!(location.billing.cost, Some(16.99));
        assert_eq!(location.billing.cycle, BillingCycle::Monthly);
        assert_eq!(location.billing.payment_method, PaymentMethod::Visa);
        assert_eq!(
            location.billing.next_payment_date.map(|d| d.to_string()).as_deref(),
            Some("2024-07-15")
        );
        assert_eq!(location.items[0].slug, "starfield");
        assert_eq!(location.items[0].owner.location_id(), "d2");
    }

    #[test]
    fn missing_billing_fields_use_defaults() {
        let (locations, notices) = adapt(json!([{ "id": "d3", "name": "GOG", "locationType": "gog" }]));

        assert!(notices.is_empty());
        let billing = &locations[0].billing;
        assert!(!billing.is_subscription);
        assert_eq!(billing.cost, None);
        assert_eq!(billing.payment_method, PaymentMethod::Generic);
        assert!(locations[0].is_active);
    }

    #[test]
    fn unknown_payment_method_is_generic_with_notice() {
        let (locations, notices) = adapt(json!([
            { "id": "d4", "name": "Steam", "locationType": "steam", "paymentMethod": "store credit" }
        ]));

        assert_eq!(locations[0].billing.payment_method, PaymentMethod::Generic);
        assert_eq!(notices.len(), 1);
    }
}
