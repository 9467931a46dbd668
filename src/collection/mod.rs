//! Client-side collection view model
//!
//! Every list screen fetches the whole collection once and derives what to
//! show from it:
//!
//! ```text
//! source ──→ search ──→ filter ──→ sort (stable) ──→ paginate ──→ CollectionView
//! ```
//!
//! `view` is pure. Same source and state always give the same page.

mod state;

pub use state::{CollectionState, SortDirection, SortSpec, DEFAULT_PAGE_SIZE};

use chrono::{DateTime, Utc};
use std::borrow::Cow;
use std::cmp::Ordering;
use std::fmt;

/// A field as the view model sees it
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue<'a> {
    Text(Cow<'a, str>),
    Number(f64),
    Date(DateTime<Utc>),
}

impl FieldValue<'_> {
    fn as_text(&self) -> Cow<'_, str> {
        match self {
            Self::Text(text) => Cow::Borrowed(text.as_ref()),
            Self::Number(n) => Cow::Owned(n.to_string()),
            Self::Date(date) => Cow::Owned(date.to_rfc3339()),
        }
    }

    /// Exact match, case-insensitive. Numbers compare by value (`5` matches
    /// `5.0`). Dates match their calendar day (`2024-03-01`) or full RFC 3339
    /// form.
    fn matches(&self, expected: &str) -> bool {
        match self {
            Self::Text(text) => text.to_lowercase() == expected.to_lowercase(),
            Self::Number(n) => expected
                .trim()
                .parse::<f64>()
                .is_ok_and(|expected| (n - expected).abs() < f64::EPSILON),
            Self::Date(date) => {
                date.format("%Y-%m-%d").to_string() == expected
                    || date.to_rfc3339().eq_ignore_ascii_case(expected)
            }
        }
    }
}

impl fmt::Display for FieldValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.write_str(text),
            Self::Number(n) => write!(f, "{}", n),
            Self::Date(date) => write!(f, "{}", date.format("%Y-%m-%d %H:%M")),
        }
    }
}

/// Entities that can be listed
pub trait Record {
    /// Fields the search box looks at
    const SEARCH_FIELDS: &'static [&'static str];

    /// Value of `key`, or None if the entity has no such field (or it is empty)
    fn field(&self, key: &str) -> Option<FieldValue<'_>>;
}

/// One computed page plus pagination metadata
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionView<'a, T> {
    pub page: Vec<&'a T>,
    pub total_pages: usize,
    /// Items left after search and filters
    pub total_count: usize,
    /// The page actually shown, after clamping
    pub current_page: usize,
}

pub fn view<'a, T: Record>(source: &'a [T], state: &CollectionState) -> CollectionView<'a, T> {
    let needle = state.search_text.trim().to_lowercase();

    let mut items: Vec<&T> = source
        .iter()
        .filter(|item| needle.is_empty() || matches_search(*item, &needle))
        .filter(|item| {
            state.filters.iter().all(|(field, expected)| {
                item.field(field)
                    .is_some_and(|value| value.matches(expected))
            })
        })
        .collect();

    if let Some(sort) = &state.sort {
        // sort_by is stable, so ties keep their source order either way
        items.sort_by(|a, b| {
            let ordering = compare_fields(a.field(&sort.key), b.field(&sort.key));
            match sort.direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            }
        });
    }

    let page_size = state.page_size.max(1);
    let total_count = items.len();
    let total_pages = total_count.div_ceil(page_size);
    let current_page = state.current_page.clamp(1, total_pages.max(1));

    let page = items
        .into_iter()
        .skip((current_page - 1) * page_size)
        .take(page_size)
        .collect();

    CollectionView {
        page,
        total_pages,
        total_count,
        current_page,
    }
}

fn matches_search<T: Record>(item: &T, needle: &str) -> bool {
    T::SEARCH_FIELDS.iter().any(|key| match item.field(key) {
        Some(FieldValue::Text(text)) => text.to_lowercase().contains(needle),
        _ => false,
    })
}

/// Dates chronologically, numbers numerically, everything else as
/// case-insensitive text.
/// Missing values sort first.
fn compare_fields(a: Option<FieldValue<'_>>, b: Option<FieldValue<'_>>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(FieldValue::Date(a)), Some(FieldValue::Date(b))) => a.cmp(&b),
        (Some(FieldValue::Number(a)), Some(FieldValue::Number(b))) => a.total_cmp(&b),
        (Some(a), Some(b)) => a.as_text().to_lowercase().cmp(&b.as_text().to_lowercase()),
    }
}
