//! Fixed lookup tables from free-text server enums to closed tags.
//!
//! Lookups ignore case, surrounding whitespace, and treat `-`, `_` and runs
//! of spaces as one space. Text that is not in a table never fails: it maps
//! to the tag's documented default and leaves an `UnknownTag` notice.

use crate::types::{
    BillingCycle, DigitalPlatform, IconColor, PaymentMethod, PhysicalLocationType, SublocationType,
};

use super::{AdapterNotice, Notices};

pub(crate) trait Tag: Copy + 'static {
    /// Field name reported in notices.
    const FIELD: &'static str;
    const TABLE: &'static [(&'static str, Self)];

    fn as_str(self) -> &'static str;
}

/// Tag with a fallback for unrecognized input.
pub(crate) trait DefaultTag: Tag {
    const DEFAULT: Self;
}

/// Map `raw` through the table. Missing input takes the default silently.
pub(crate) fn map_tag<T: DefaultTag>(raw: Option<&str>, notices: &mut Notices) -> T {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => T::DEFAULT,
        Some(text) => lookup::<T>(text).unwrap_or_else(|| {
            notices.push(AdapterNotice::UnknownTag {
                field: T::FIELD,
                raw: text.to_string(),
                fallback: T::DEFAULT.as_str().to_string(),
            });
            T::DEFAULT
        }),
    }
}

/// Like `map_tag`, for tags where "none" is the fallback.
pub(crate) fn map_optional_tag<T: Tag>(raw: Option<&str>, notices: &mut Notices) -> Option<T> {
    let text = raw.map(str::trim).filter(|s| !s.is_empty())?;
    let tag = lookup::<T>(text);
    if tag.is_none() {
        notices.push(AdapterNotice::UnknownTag {
            field: T::FIELD,
            raw: text.to_string(),
            fallback: "none".to_string(),
        });
    }
    tag
}

fn lookup<T: Tag>(text: &str) -> Option<T> {
    let key = normalize(text);
    T::TABLE
        .iter()
        .find(|(name, _)| *name == key)
        .map(|(_, tag)| *tag)
}

fn normalize(text: &str) -> String {
    text.to_lowercase()
        .replace(['-', '_'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

impl Tag for PhysicalLocationType {
    const FIELD: &'static str = "location_type";
    const TABLE: &'static [(&'static str, Self)] = &[
        ("house", Self::House),
        ("home", Self::House),
        ("apartment", Self::Apartment),
        ("flat", Self::Apartment),
        ("condo", Self::Apartment),
        ("office", Self::Office),
        ("work", Self::Office),
        ("warehouse", Self::Warehouse),
        ("vehicle", Self::Vehicle),
        ("car", Self::Vehicle),
        ("storage unit", Self::StorageUnit),
        ("storage", Self::StorageUnit),
    ];

    fn as_str(self) -> &'static str {
        match self {
            Self::House => "house",
            Self::Apartment => "apartment",
            Self::Office => "office",
            Self::Warehouse => "warehouse",
            Self::Vehicle => "vehicle",
            Self::StorageUnit => "storage_unit",
        }
    }
}

impl DefaultTag for PhysicalLocationType {
    const DEFAULT: Self = Self::House;
}

impl Tag for SublocationType {
    const FIELD: &'static str = "sublocation_type";
    const TABLE: &'static [(&'static str, Self)] = &[
        ("shelf", Self::Shelf),
        ("bookshelf", Self::Shelf),
        ("console", Self::Console),
        ("cabinet", Self::Cabinet),
        ("tv stand", Self::Cabinet),
        ("closet", Self::Closet),
        ("drawer", Self::Drawer),
        ("box", Self::Box),
        ("bin", Self::Box),
        ("device", Self::Device),
    ];

    fn as_str(self) -> &'static str {
        match self {
            Self::Shelf => "shelf",
            Self::Console => "console",
            Self::Cabinet => "cabinet",
            Self::Closet => "closet",
            Self::Drawer => "drawer",
            Self::Box => "box",
            Self::Device => "device",
        }
    }
}

impl DefaultTag for SublocationType {
    const DEFAULT: Self = Self::Shelf;
}

impl Tag for DigitalPlatform {
    const FIELD: &'static str = "platform";
    const TABLE: &'static [(&'static str, Self)] = &[
        ("steam", Self::Steam),
        ("valve", Self::Steam),
        ("epic", Self::EpicGames),
        ("epic games", Self::EpicGames),
        ("epic games store", Self::EpicGames),
        ("egs", Self::EpicGames),
        ("gog", Self::Gog),
        ("gog.com", Self::Gog),
        ("good old games", Self::Gog),
        ("playstation", Self::PlaystationNetwork),
        ("playstation network", Self::PlaystationNetwork),
        ("playstation plus", Self::PlaystationNetwork),
        ("psn", Self::PlaystationNetwork),
        ("ps plus", Self::PlaystationNetwork),
        ("xbox", Self::XboxLive),
        ("xbox live", Self::XboxLive),
        ("xbox game pass", Self::XboxLive),
        ("game pass", Self::XboxLive),
        ("microsoft store", Self::XboxLive),
        ("nintendo", Self::NintendoEshop),
        ("nintendo eshop", Self::NintendoEshop),
        ("eshop", Self::NintendoEshop),
        ("nintendo switch online", Self::NintendoEshop),
        ("ea", Self::EaApp),
        ("ea app", Self::EaApp),
        ("ea play", Self::EaApp),
        ("origin", Self::EaApp),
        ("ubisoft", Self::UbisoftConnect),
        ("ubisoft connect", Self::UbisoftConnect),
        ("ubisoft+", Self::UbisoftConnect),
        ("uplay", Self::UbisoftConnect),
        ("battle.net", Self::BattleNet),
        ("battle net", Self::BattleNet),
        ("battlenet", Self::BattleNet),
        ("blizzard", Self::BattleNet),
        ("amazon", Self::AmazonLuna),
        ("amazon luna", Self::AmazonLuna),
        ("luna", Self::AmazonLuna),
        ("prime gaming", Self::AmazonLuna),
        ("apple arcade", Self::AppleArcade),
        ("google play", Self::GooglePlay),
        ("google play pass", Self::GooglePlay),
    ];

    fn as_str(self) -> &'static str {
        match self {
            Self::Steam => "steam",
            Self::EpicGames => "epic_games",
            Self::Gog => "gog",
            Self::PlaystationNetwork => "playstation_network",
            Self::XboxLive => "xbox_live",
            Self::NintendoEshop => "nintendo_eshop",
            Self::EaApp => "ea_app",
            Self::UbisoftConnect => "ubisoft_connect",
            Self::BattleNet => "battle_net",
            Self::AmazonLuna => "amazon_luna",
            Self::AppleArcade => "apple_arcade",
            Self::GooglePlay => "google_play",
        }
    }
}

impl DefaultTag for DigitalPlatform {
    const DEFAULT: Self = Self::Steam;
}

impl Tag for PaymentMethod {
    const FIELD: &'static str = "payment_method";
    const TABLE: &'static [(&'static str, Self)] = &[
        ("generic", Self::Generic),
        ("card", Self::Generic),
        ("visa", Self::Visa),
        ("mastercard", Self::Mastercard),
        ("master card", Self::Mastercard),
        ("mc", Self::Mastercard),
        ("amex", Self::Amex),
        ("american express", Self::Amex),
        ("discover", Self::Discover),
        ("paypal", Self::Paypal),
        ("apple pay", Self::ApplePay),
        ("applepay", Self::ApplePay),
        ("google pay", Self::GooglePay),
        ("gpay", Self::GooglePay),
        ("amazon pay", Self::AmazonPay),
        ("alipay", Self::Alipay),
    ];

    fn as_str(self) -> &'static str {
        match self {
            Self::Generic => "generic",
            Self::Visa => "visa",
            Self::Mastercard => "mastercard",
            Self::Amex => "amex",
            Self::Discover => "discover",
            Self::Paypal => "paypal",
            Self::ApplePay => "apple_pay",
            Self::GooglePay => "google_pay",
            Self::AmazonPay => "amazon_pay",
            Self::Alipay => "alipay",
        }
    }
}

impl DefaultTag for PaymentMethod {
    const DEFAULT: Self = Self::Generic;
}

impl Tag for BillingCycle {
    const FIELD: &'static str = "billing_cycle";
    const TABLE: &'static [(&'static str, Self)] = &[
        ("monthly", Self::Monthly),
        ("month", Self::Monthly),
        ("1 month", Self::Monthly),
        ("quarterly", Self::Quarterly),
        ("quarter", Self::Quarterly),
        ("3 month", Self::Quarterly),
        ("3 months", Self::Quarterly),
        ("annually", Self::Annually),
        ("annual", Self::Annually),
        ("yearly", Self::Annually),
        ("year", Self::Annually),
        ("1 year", Self::Annually),
        ("12 months", Self::Annually),
    ];

    fn as_str(self) -> &'static str {
        match self {
            Self::Monthly => "monthly",
            Self::Quarterly => "quarterly",
            Self::Annually => "annually",
        }
    }
}

impl DefaultTag for BillingCycle {
    const DEFAULT: Self = Self::Monthly;
}

impl Tag for IconColor {
    const FIELD: &'static str = "color";
    const TABLE: &'static [(&'static str, Self)] = &[
        ("red", Self::Red),
        ("green", Self::Green),
        ("blue", Self::Blue),
        ("gold", Self::Gold),
        ("yellow", Self::Gold),
        ("purple", Self::Purple),
        ("violet", Self::Purple),
        ("orange", Self::Orange),
        ("brown", Self::Brown),
        ("gray", Self::Gray),
        ("grey", Self::Gray),
    ];

    fn as_str(self) -> &'static str {
        match self {
            Self::Red => "red",
            Self::Green => "green",
            Self::Blue => "blue",
            Self::Gold => "gold",
            Self::Purple => "purple",
            Self::Orange => "orange",
            Self::Brown => "brown",
            Self::Gray => "gray",
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("Steam", DigitalPlatform::Steam)]
    #[case("  EPIC-games ", DigitalPlatform::EpicGames)]
    #[case("battle.net", DigitalPlatform::BattleNet)]
    #[case("xbox_game_pass", DigitalPlatform::XboxLive)]
    #[case("PSN", DigitalPlatform::PlaystationNetwork)]
    fn known_platforms_map_without_notice(#[case] raw: &str, #[case] expected: DigitalPlatform) {
        let mut notices = Notices::default();
        assert_eq!(map_tag::<DigitalPlatform>(Some(raw), &mut notices), expected);
        assert!(notices.is_empty());
    }

    #[test]
    fn unknown_platform_falls_back_to_first_supported() {
        let mut notices = Notices::default();
        let platform = map_tag::<DigitalPlatform>(Some("unknown-vendor"), &mut notices);
        assert_eq!(platform, DigitalPlatform::Steam);
        assert_eq!(
            notices.into_vec(),
            vec![AdapterNotice::UnknownTag {
                field: "platform",
                raw: "unknown-vendor".to_string(),
                fallback: "steam".to_string(),
            }]
        );
    }

    #[test]
    fn unknown_payment_method_is_generic() {
        let mut notices = Notices::default();
        assert_eq!(
            map_tag::<PaymentMethod>(Some("carrier billing"), &mut notices),
            PaymentMethod::Generic
        );
        assert_eq!(notices.len(), 1);
    }

    #[test]
    fn missing_values_take_default_silently() {
        let mut notices = Notices::default();
        assert_eq!(map_tag::<BillingCycle>(None, &mut notices), BillingCycle::Monthly);
        assert_eq!(map_tag::<SublocationType>(Some("  "), &mut notices), SublocationType::Shelf);
        assert!(notices.is_empty());
    }

    #[test]
    fn unknown_colour_is_none() {
        let mut notices = Notices::default();
        assert_eq!(map_optional_tag::<IconColor>(Some("Grey"), &mut notices), Some(IconColor::Gray));
        assert_eq!(map_optional_tag::<IconColor>(Some("#ff00ff"), &mut notices), None);
        assert_eq!(map_optional_tag::<IconColor>(None, &mut notices), None);
        assert_eq!(notices.len(), 1);
    }

    fn assert_names_read_back<T>()
    where
        T: Tag + PartialEq + std::fmt::Debug + serde::Serialize,
    {
        for (_, tag) in T::TABLE {
            assert_eq!(serde_json::to_value(tag).unwrap(), tag.as_str());
            assert_eq!(lookup::<T>(tag.as_str()), Some(*tag), "{}", tag.as_str());
        }
    }

    #[test]
    fn written_names_map_back_to_the_same_tag() {
        assert_names_read_back::<PhysicalLocationType>();
        assert_names_read_back::<SublocationType>();
        assert_names_read_back::<DigitalPlatform>();
        assert_names_read_back::<PaymentMethod>();
        assert_names_read_back::<BillingCycle>();
        assert_names_read_back::<IconColor>();
    }
}
