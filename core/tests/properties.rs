use library_sync::adapters::adapt_library;
use library_sync::case::{to_internal, to_wire};
use proptest::prelude::*;
use proptest::test_runner::Config;
use serde_json::{json, Map, Value};

/// `[a-z][a-zA-Z0-9]*` with no two uppercase letters in a row.
fn camel_key() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9]{0,4}([A-Z][a-z0-9]{1,4}){0,3}[A-Z]?"
}

fn camel_json() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::from),
        "[a-z_ ]{0,8}".prop_map(Value::from),
    ];
    leaf.prop_recursive(4, 48, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::btree_map(camel_key(), inner, 0..4)
                .prop_map(|fields| Value::Object(fields.into_iter().collect::<Map<_, _>>())),
        ]
    })
}

fn tag(choices: &[&'static str]) -> impl Strategy<Value = Option<&'static str>> {
    prop::option::of(prop::sample::select(choices.to_vec()))
}

fn item() -> impl Strategy<Value = Value> {
    ("g[0-4]", "[A-Za-z ]{1,12}", prop::option::of("2024-0[1-9]-1[0-9]")).prop_map(
        |(id, name, acquired)| json!({ "id": id, "name": name, "acquiredDate": acquired }),
    )
}

// Small id pools so duplicates and orphans show up often.
fn physical_location() -> impl Strategy<Value = Value> {
    (
        "p[0-2]",
        tag(&["house", "Office", "storage_unit", "moon base"]),
        tag(&["red", "grey", "#123456"]),
        prop::option::of(prop_oneof![
            Just("40.7128, -74.0060".to_string()),
            Just("behind the garage".to_string()),
        ]),
    )
        .prop_map(|(id, kind, color, coordinates)| {
            json!({
                "id": id,
                "name": format!("Location {id}"),
                "locationType": kind,
                "bgColor": color,
                "mapCoordinates": coordinates,
            })
        })
}

fn sublocation() -> impl Strategy<Value = Value> {
    (
        "s[0-3]",
        prop::option::of(prop::sample::select(vec!["p0", "p1", "p2", "p9"])),
        tag(&["shelf", "TV Stand", "crate"]),
        prop::option::of(prop::collection::vec(item(), 0..3)),
        prop::option::of(0_u64..20),
    )
        .prop_map(|(id, parent, kind, items, stored)| {
            json!({
                "id": id,
                "name": format!("Sub {id}"),
                "parentLocationId": parent,
                "locationType": kind,
                "items": items,
                "storedItems": stored,
            })
        })
}

fn digital_location() -> impl Strategy<Value = Value> {
    (
        "d[0-2]",
        tag(&["steam", "xbox_live", "unknown-vendor"]),
        tag(&["Visa", "barter"]),
        tag(&["monthly", "fortnightly"]),
        prop::collection::vec(item(), 0..3),
    )
        .prop_map(|(id, platform, payment, cycle, items)| {
            json!({
                "id": id,
                "name": format!("Store {id}"),
                "locationType": platform,
                "paymentMethod": payment,
                "billingCycle": cycle,
                "items": items,
            })
        })
}

fn library() -> impl Strategy<Value = Value> {
    (
        prop::collection::vec(physical_location(), 0..4),
        prop::option::of(prop::collection::vec(sublocation(), 0..5)),
        prop::collection::vec(digital_location(), 0..3),
        prop::option::of((0_u64..50, 0_u64..500)),
    )
        .prop_map(|(physical, sublocations, digital, totals)| {
            let mut data = json!({
                "physicalLocations": physical,
                "digitalLocations": digital,
            });
            if let Some(sublocations) = sublocations {
                data["sublocations"] = json!(sublocations);
            }
            if let Some((locations, items)) = totals {
                data["totals"] = json!({ "locations": locations, "items": items });
            }
            data
        })
}

proptest! {
    #![proptest_config(Config::with_cases(128))]

    #[test]
    fn camel_values_round_trip_through_the_wire(value in camel_json()) {
        prop_assert_eq!(to_internal(&to_wire(&value)), value);
    }

    #[test]
    fn adapting_a_library_twice_is_deep_equal(data in library()) {
        let first = adapt_library(&data);
        let second = adapt_library(&data);
        prop_assert!(first.is_ok());
        prop_assert_eq!(first, second);
    }
}
