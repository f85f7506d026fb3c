use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Facet value meaning "no filter on this facet"
pub const ALL_FACET_VALUE: &str = "all";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn toggled(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

/// Search text, facet selections and sort order of one list page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryState {
    /// What the search box shows right now
    pub raw_text: String,
    /// What filtering uses; follows `raw_text` once input settles
    pub debounced_text: String,
    pub facets: BTreeMap<String, String>,
    pub sort_key: Option<String>,
    pub sort_direction: SortDirection,
}

impl QueryState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sort(mut self, key: &str, direction: SortDirection) -> Self {
        self.sort_key = Some(key.to_string());
        self.sort_direction = direction;
        self
    }

    pub fn with_facet(mut self, name: &str, value: &str) -> Self {
        self.set_facet(name, value);
        self
    }

    pub fn with_text(mut self, text: &str) -> Self {
        self.raw_text = text.to_string();
        self.debounced_text = text.to_string();
        self
    }

    /// Select a facet value. Selecting "all" (or blank) removes the facet.
    pub fn set_facet(&mut self, name: &str, value: &str) {
        let value = value.trim();
        if value.is_empty() || value.eq_ignore_ascii_case(ALL_FACET_VALUE) {
            self.facets.remove(name);
        } else {
            self.facets.insert(name.to_string(), value.to_string());
        }
    }

    /// Facets that actually filter
    pub fn active_facets(&self) -> impl Iterator<Item = (&str, &str)> {
        self.facets
            .iter()
            .filter(|(_, v)| !v.eq_ignore_ascii_case(ALL_FACET_VALUE))
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn clear_filters(&mut self) {
        self.raw_text.clear();
        self.debounced_text.clear();
        self.facets.clear();
    }
}
