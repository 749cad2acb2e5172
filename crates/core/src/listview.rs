//! In-memory search, sort, and pagination for list views.
//!
//! These are pure functions over the last fetched result set, recomputed
//! on every interaction. At list sizes this facility sees there is no
//! need for debouncing or indexing.

use crate::models::{Card, StorageEntry, UserProfile};

/// Default page size for list views.
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Entities expose a fixed set of searchable fields.
pub trait Searchable {
    /// The values substring search runs over.
    fn haystacks(&self) -> Vec<String>;
}

impl Searchable for Card {
    fn haystacks(&self) -> Vec<String> {
        vec![
            self.uuid.to_string(),
            self.name_on_card.clone(),
            self.user_name.clone().unwrap_or_default(),
            self.user_phone.clone().unwrap_or_default(),
        ]
    }
}

impl Searchable for UserProfile {
    fn haystacks(&self) -> Vec<String> {
        vec![
            self.first_name.clone(),
            self.last_name.clone(),
            self.phone.clone(),
            self.address.clone(),
        ]
    }
}

impl Searchable for StorageEntry {
    fn haystacks(&self) -> Vec<String> {
        vec![
            self.uuid.to_string(),
            self.commodity.clone(),
            self.user_name.clone().unwrap_or_default(),
            self.user_phone.clone().unwrap_or_default(),
        ]
    }
}

/// Case-insensitive substring filter. A pure function of `(items, term)`:
/// the same inputs always yield the same ordered result, and order is
/// preserved from the input.
pub fn filter<T: Searchable + Clone>(items: &[T], term: &str) -> Vec<T> {
    let needle = term.trim().to_lowercase();
    if needle.is_empty() {
        return items.to_vec();
    }
    items
        .iter()
        .filter(|item| {
            item.haystacks()
                .iter()
                .any(|haystack| haystack.to_lowercase().contains(&needle))
        })
        .cloned()
        .collect()
}

/// Sort direction for list views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// Smallest first.
    #[default]
    Ascending,
    /// Largest first.
    Descending,
}

impl SortOrder {
    /// Flip the direction.
    pub fn toggled(self) -> Self {
        match self {
            SortOrder::Ascending => SortOrder::Descending,
            SortOrder::Descending => SortOrder::Ascending,
        }
    }
}

/// Stable sort by a declared key in the given order.
pub fn sort_by_key<T, K: Ord>(items: &mut [T], order: SortOrder, key: impl Fn(&T) -> K) {
    items.sort_by(|a, b| {
        let ordering = key(a).cmp(&key(b));
        match order {
            SortOrder::Ascending => ordering,
            SortOrder::Descending => ordering.reverse(),
        }
    });
}

/// One page of a list view.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    /// Items on this page.
    pub items: Vec<T>,
    /// Zero-based page index, clamped into range.
    pub page: usize,
    /// Total page count; zero for an empty list.
    pub pages: usize,
    /// Total item count before paging.
    pub total: usize,
}

impl<T> Page<T> {
    /// Whether the underlying list is empty (render the empty state and
    /// hide the pagination controls).
    pub fn is_empty(&self) -> bool {
        self.total == 0
    }
}

/// Slice out the requested page, clamping the index into range.
pub fn paginate<T: Clone>(items: &[T], page: usize, page_size: usize) -> Page<T> {
    let page_size = page_size.max(1);
    let total = items.len();
    let pages = total.div_ceil(page_size);
    let page = if pages == 0 { 0 } else { page.min(pages - 1) };
    let start = page * page_size;
    let items = items.iter().skip(start).take(page_size).cloned().collect();
    Page {
        items,
        page,
        pages,
        total,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn user(first: &str, last: &str, phone: &str) -> UserProfile {
        serde_json::from_value(json!({
            "uuid": "7f8a1c9e-1111-4222-8333-444455556666",
            "first_name": first,
            "last_name": last,
            "phone": phone,
            "address": "12 Harbour Rd",
            "user_type": "USER"
        }))
        .unwrap()
    }

    fn sample_users() -> Vec<UserProfile> {
        vec![
            user("Ada", "Obi", "08011111111"),
            user("Bola", "Ade", "08022222222"),
            user("Chidi", "Okafor", "08033333333"),
        ]
    }

    #[test]
    fn filter_is_case_insensitive() {
        let users = sample_users();
        let hits = filter(&users, "ADA");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].first_name, "Ada");
    }

    #[test]
    fn filter_is_a_pure_function_of_its_inputs() {
        let users = sample_users();
        let first = filter(&users, "ob");
        let second = filter(&users, "ob");
        let names_first: Vec<&str> = first.iter().map(|u| u.first_name.as_str()).collect();
        let names_second: Vec<&str> = second.iter().map(|u| u.first_name.as_str()).collect();
        assert_eq!(names_first, names_second);
    }

    #[test]
    fn empty_term_returns_everything_in_order() {
        let users = sample_users();
        let hits = filter(&users, "   ");
        assert_eq!(hits.len(), 3);
        assert_eq!(hits[0].first_name, "Ada");
        assert_eq!(hits[2].first_name, "Chidi");
    }

    #[test]
    fn unmatched_term_yields_the_empty_state() {
        let users = sample_users();
        let hits = filter(&users, "zzz");
        let page = paginate(&hits, 0, DEFAULT_PAGE_SIZE);
        assert!(page.is_empty());
        assert_eq!(page.pages, 0);
        assert!(page.items.is_empty());
    }

    #[test]
    fn sort_toggles_between_directions() {
        let mut users = sample_users();
        sort_by_key(&mut users, SortOrder::Descending, |u| u.first_name.clone());
        assert_eq!(users[0].first_name, "Chidi");
        sort_by_key(&mut users, SortOrder::Descending.toggled(), |u| {
            u.first_name.clone()
        });
        assert_eq!(users[0].first_name, "Ada");
    }

    #[test]
    fn pagination_clamps_out_of_range_pages() {
        let items: Vec<i32> = (0..25).collect();
        let page = paginate(&items, 99, 10);
        assert_eq!(page.page, 2);
        assert_eq!(page.pages, 3);
        assert_eq!(page.items, vec![20, 21, 22, 23, 24]);
        assert_eq!(page.total, 25);
    }

    #[test]
    fn exact_multiple_has_no_trailing_page() {
        let items: Vec<i32> = (0..20).collect();
        assert_eq!(paginate(&items, 0, 10).pages, 2);
    }
}
