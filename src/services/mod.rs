//! Business logic services.

pub mod auth;
pub mod booking;
pub mod clock;
pub mod dashboard;
pub mod identity;
pub mod order;
pub mod page_cache;
pub mod product;
pub mod review;
pub mod therapist;
pub mod user;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;

use crate::db::Document;
use crate::models::decode_record;

/// Decode a collection listing, skipping documents that cannot be decoded.
pub(crate) fn decode_all<T: DeserializeOwned>(
    collection: &str,
    id_field: &str,
    docs: &[Document],
) -> Vec<T> {
    docs.iter()
        .filter_map(|doc| decode_record(collection, id_field, doc))
        .collect()
}

/// Stable sort, newest first; records without a date go last.
pub(crate) fn sort_newest_first<T>(items: &mut [T], date: impl Fn(&T) -> Option<DateTime<Utc>>) {
    items.sort_by(|a, b| date(b).cmp(&date(a)));
}

/// Whether a `search` query parameter is present and non-blank.
pub(crate) fn search_term(search: &Option<String>) -> Option<&str> {
    search.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn newest_first_puts_undated_last() {
        let day = |d| Some(Utc.with_ymd_and_hms(2024, 1, d, 0, 0, 0).unwrap());
        let mut items = vec![("a", day(1)), ("b", None), ("c", day(3)), ("d", day(2))];
        sort_newest_first(&mut items, |item| item.1);
        let order: Vec<_> = items.iter().map(|i| i.0).collect();
        assert_eq!(order, vec!["c", "d", "a", "b"]);
    }

    #[test]
    fn blank_search_is_ignored() {
        assert_eq!(search_term(&Some("  ".to_string())), None);
        assert_eq!(search_term(&Some(" rao ".to_string())), Some("rao"));
        assert_eq!(search_term(&None), None);
    }
}
