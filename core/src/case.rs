//! Deep key-casing conversion between the wire format and the internal format.
//!
//! # Design
//! The backend speaks `snake_case`; everything above the transport speaks
//! `camelCase`. Both directions walk a `serde_json::Value` recursively,
//! rewriting object keys and leaving every scalar untouched. Unknown keys are
//! rewritten by the same rule and passed through, so newer servers do not
//! break older clients.
//!
//! The two key rules are inverses only for keys made of ASCII letters and
//! digits with single inner underscores. Leading, trailing or doubled
//! underscores and non-ASCII keys do not round-trip.

use serde_json::{Map, Value};

/// Convert a wire (`snake_case`) value into the internal (`camelCase`) shape.
pub fn to_internal(value: &Value) -> Value {
    transcode(value, &snake_to_camel)
}

/// Convert an internal (`camelCase`) value into the wire (`snake_case`) shape.
pub fn to_wire(value: &Value) -> Value {
    transcode(value, &camel_to_snake)
}

fn transcode(value: &Value, rewrite: &dyn Fn(&str) -> String) -> Value {
    match value {
        Value::Array(items) => Value::Array(items.iter().map(|item| transcode(item, rewrite)).collect()),
        Value::Object(fields) => {
            let mut out = Map::with_capacity(fields.len());
            for (key, inner) in fields {
                out.insert(rewrite(key), transcode(inner, rewrite));
            }
            Value::Object(out)
        }
        scalar => scalar.clone(),
    }
}

/// Replace every `_x` (lowercase ASCII `x`) with `X`.
///
/// An underscore not followed by a lowercase letter is kept as-is, so
/// `item_1` stays `item_1` and `__a` becomes `_A`.
pub fn snake_to_camel(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    let mut chars = key.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '_' {
            if let Some(next) = chars.peek().copied().filter(char::is_ascii_lowercase) {
                out.push(next.to_ascii_uppercase());
                chars.next();
                continue;
            }
        }
        out.push(c);
    }
    out
}

/// Replace every uppercase ASCII letter `X` with `_x`.
pub fn camel_to_snake(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    for c in key.chars() {
        if c.is_ascii_uppercase() {
            out.push('_');
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case("location_type", "locationType")]
    #[case("parent_location_id", "parentLocationId")]
    #[case("id", "id")]
    #[case("item_1", "item_1")]
    #[case("already_Upper", "already_Upper")]
    fn snake_keys_become_camel(#[case] wire: &str, #[case] internal: &str) {
        assert_eq!(snake_to_camel(wire), internal);
    }

    #[rstest]
    #[case("locationType", "location_type")]
    #[case("parentLocationId", "parent_location_id")]
    #[case("id", "id")]
    #[case("mapURL", "map_u_r_l")]
    fn camel_keys_become_snake(#[case] internal: &str, #[case] wire: &str) {
        assert_eq!(camel_to_snake(internal), wire);
    }

    #[test]
    fn nested_objects_and_arrays_are_rewritten() {
        let wire = json!({
            "physical_locations": [
                { "location_type": "house", "sub_locations": [{ "bg_color": "red" }] }
            ],
            "total_count": 3
        });
        let internal = to_internal(&wire);
        assert_eq!(
            internal,
            json!({
                "physicalLocations": [
                    { "locationType": "house", "subLocations": [{ "bgColor": "red" }] }
                ],
                "totalCount": 3
            })
        );
    }

    #[test]
    fn string_values_are_not_rewritten() {
        let wire = json!({ "location_type": "game_room", "tags": ["snake_case_tag"] });
        let internal = to_internal(&wire);
        assert_eq!(internal["locationType"], "game_room");
        assert_eq!(internal["tags"][0], "snake_case_tag");
    }

    #[test]
    fn scalars_pass_through() {
        for scalar in [json!(null), json!(true), json!(4.5), json!("created_at")] {
            assert_eq!(to_internal(&scalar), scalar);
            assert_eq!(to_wire(&scalar), scalar);
        }
    }

    #[test]
    fn array_order_and_length_are_preserved() {
        let internal = json!([{ "aB": 1 }, 2, [{ "cD": 3 }]]);
        let wire = to_wire(&internal);
        assert_eq!(wire, json!([{ "a_b": 1 }, 2, [{ "c_d": 3 }]]));
    }

    #[test]
    fn camel_values_round_trip_through_the_wire() {
        let internal = json!({
            "parentLocationId": "p1",
            "isSubscription": true,
            "items": [{ "acquiredDate": "2024-01-01", "hasManual": false }],
            "meta": { "totalItems2": 4 }
        });
        assert_eq!(to_internal(&to_wire(&internal)), internal);
    }

    #[test]
    fn uppercase_wire_keys_do_not_round_trip() {
        assert_eq!(snake_to_camel("a__b"), "a_B");
        let internal = snake_to_camel("legacy_Key");
        assert_eq!(internal, "legacy_Key");
        assert_eq!(camel_to_snake(&internal), "legacy__key");
    }
}
