//! Game item normalization and single-owner bookkeeping.

use std::collections::HashMap;

use crate::dto::RawGameItem;
use crate::types::{GameItem, ItemOwner, PhysicalMedia};

use super::{parse_date, AdapterNotice, Notices};

/// Tracks which location claimed each item id first.
///
/// The aggregate may list one item under several paths; the normalized
/// model gives it exactly one owner.
#[derive(Debug, Default)]
pub(crate) struct Ownership {
    claimed: HashMap<String, String>,
}

impl Ownership {
    fn claim(&mut self, item_id: &str, owner: &ItemOwner, notices: &mut Notices) -> bool {
        if let Some(kept_under) = self.claimed.get(item_id) {
            notices.push(AdapterNotice::DuplicateItem {
                item_id: item_id.to_string(),
                kept_under: kept_under.clone(),
                dropped_under: owner.location_id().to_string(),
            });
            return false;
        }
        self.claimed
            .insert(item_id.to_string(), owner.location_id().to_string());
        true
    }
}

pub(crate) fn adapt_items(
    raw: &[RawGameItem],
    owner: &ItemOwner,
    ownership: &mut Ownership,
    notices: &mut Notices,
) -> Vec<GameItem> {
    raw.iter()
        .filter(|item| ownership.claim(&item.id, owner, notices))
        .map(|item| adapt_item(item, owner.clone()))
        .collect()
}

fn adapt_item(raw: &RawGameItem, owner: ItemOwner) -> GameItem {
    let media = PhysicalMedia {
        condition: raw
            .condition
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string),
        has_original_case: raw.has_original_case,
        has_manual: raw.has_manual,
    };

    GameItem {
        id: raw.id.clone(),
        name: raw.name.clone(),
        slug: slugify(&raw.name),
        platform: raw.platform_name.clone(),
        acquired_date: parse_date(raw.acquired_date.as_deref()),
        media: (media != PhysicalMedia::default()).then_some(media),
        owner,
    }
}

/// Lowercase ASCII alphanumerics joined by single hyphens.
///
/// Non-ASCII letters are dropped, so `"Pokémon Red"` becomes `"pokmon-red"`.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else if c.is_whitespace() || c.is_ascii_punctuation() {
            pending_dash = true;
        }
    }
    slug
}
