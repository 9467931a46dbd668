// Collection view state - what the user asked to see
//
// Only the inputs live here. The visible page is always derived by `view()`.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn flipped(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Asc => write!(f, "asc"),
            Self::Desc => write!(f, "desc"),
        }
    }
}

impl FromStr for SortDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(Self::Asc),
            "desc" | "descending" => Ok(Self::Desc),
            other => Err(format!("Unknown sort direction '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    pub key: String,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn new(key: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            key: key.into(),
            direction,
        }
    }
}

/// Search text, filters, sort and page for one list screen.
///
/// Pages are 1-based. Changing what is selected (search, filters, page size)
/// goes back to page 1; sorting keeps the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionState {
    pub search_text: String,
    pub filters: BTreeMap<String, String>,
    pub sort: Option<SortSpec>,
    pub current_page: usize,
    pub page_size: usize,
}

impl Default for CollectionState {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

pub const DEFAULT_PAGE_SIZE: usize = 6;

impl CollectionState {
    pub fn new(page_size: usize) -> Self {
        Self {
            search_text: String::new(),
            filters: BTreeMap::new(),
            sort: None,
            current_page: 1,
            page_size: page_size.max(1),
        }
    }

    pub fn set_search(&mut self, text: impl Into<String>) {
        self.search_text = text.into();
        self.current_page = 1;
    }

    /// Set a filter; an empty value removes it
    pub fn set_filter(&mut self, field: impl Into<String>, value: impl Into<String>) {
        let field = field.into();
        let value = value.into();
        if value.is_empty() {
            self.filters.remove(&field);
        } else {
            self.filters.insert(field, value);
        }
        self.current_page = 1;
    }

    pub fn set_sort(&mut self, key: impl Into<String>, direction: SortDirection) {
        self.sort = Some(SortSpec::new(key, direction));
    }

    /// Column-header behaviour: same key flips direction, new key sorts ascending
    pub fn toggle_sort(&mut self, key: &str) {
        self.sort = match self.sort.take() {
            Some(spec) if spec.key == key => Some(SortSpec::new(key, spec.direction.flipped())),
            _ => Some(SortSpec::new(key, SortDirection::Asc)),
        };
    }

    pub fn go_to_page(&mut self, page: usize) {
        self.current_page = page.max(1);
    }

    /// Pull `current_page` back into `[1, total_pages]`
    pub fn clamp_page(&mut self, total_pages: usize) {
        self.current_page = self.current_page.clamp(1, total_pages.max(1));
    }
}
