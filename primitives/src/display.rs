//! The public projection of eligible ads: a sorted, paginated list of
//! [`AdItem`]s, built fresh for every request.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ad::Advertisement;
use crate::util::serde::ts_milliseconds_str;

/// The only two advertisement fields exposed publicly; everything else is
/// intake-only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AdItem {
    pub title: String,
    #[serde(with = "ts_milliseconds_str")]
    pub end_at: DateTime<Utc>,
}

impl From<&Advertisement> for AdItem {
    fn from(ad: &Advertisement) -> Self {
        Self {
            title: ad.title.clone(),
            end_at: ad.end_at,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DisplayAds {
    pub items: Vec<AdItem>,
}

/// The requested result window.
///
/// Both fields are parsed tolerantly: a missing or malformed `offset` falls
/// back to `0`, a missing, malformed or negative `limit` means "all remaining
/// items". Neither is ever a request error.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Pagination {
    pub offset: usize,
    pub limit: Option<usize>,
}

impl Pagination {
    pub fn from_query(offset: Option<&str>, limit: Option<&str>) -> Self {
        Self {
            offset: offset.and_then(|raw| raw.parse().ok()).unwrap_or_default(),
            limit: limit.and_then(|raw| raw.parse().ok()),
        }
    }
}

impl DisplayAds {
    /// Projects the eligible ads, sorts them soonest-expiring first and
    /// applies the pagination window.
    ///
    /// The sort is stable, ties on `endAt` keep the catalog order. The result
    /// always carries an `items` list, empty when nothing is left to show.
    pub fn assemble(eligible: Vec<Advertisement>, pagination: Pagination) -> Self {
        let mut items: Vec<AdItem> = eligible.iter().map(AdItem::from).collect();
        items.sort_by_key(|item| item.end_at);

        let Pagination { offset, limit } = pagination;
        if offset >= items.len() {
            return Self::default();
        }

        let end = limit.map_or(items.len(), |limit| {
            offset.saturating_add(limit).min(items.len())
        });

        Self {
            items: items[offset..end].to_vec(),
        }
    }
}
