//! Coffee listing filters.
//!
//! [`FilterState`] is the set of active criteria for the `/coffees` listing.
//! The [`codec`] maps it to and from the listing query string, and the
//! [`controller`] is the only place pending state is edited and committed.

pub mod codec;
pub mod controller;

use serde::Serialize;

pub use codec::{decode, encode, listing_location, LISTING_PATH};
pub use controller::{FilterController, Navigator};

/// Highest rating a coffee can have.
pub const MAX_RATING: f64 = 5.0;

/// Rating thresholds offered by the filter panel.
pub const RATING_THRESHOLDS: [f64; 3] = [0.0, 4.0, 4.5];

/// Listing sort order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortBy {
    #[default]
    Rating,
    Reviews,
    Recent,
    Name,
}

impl SortBy {
    pub const ALL: [SortBy; 4] = [SortBy::Rating, SortBy::Reviews, SortBy::Recent, SortBy::Name];

    /// Name used in query strings and forms.
    pub fn as_str(&self) -> &'static str {
        match self {
            SortBy::Rating => "rating",
            SortBy::Reviews => "reviews",
            SortBy::Recent => "recent",
            SortBy::Name => "name",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_str() == value)
    }

    pub fn label(&self) -> &'static str {
        match self {
            SortBy::Rating => "Best rated",
            SortBy::Reviews => "Most reviewed",
            SortBy::Recent => "Most recent",
            SortBy::Name => "Name (A-Z)",
        }
    }
}

/// A multi-valued filter field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterFacet {
    Origins,
    Roasters,
    Notes,
    Processes,
}

impl FilterFacet {
    pub const ALL: [FilterFacet; 4] = [
        FilterFacet::Origins,
        FilterFacet::Roasters,
        FilterFacet::Notes,
        FilterFacet::Processes,
    ];

    /// Query parameter repeated once per selected value.
    pub fn param_name(&self) -> &'static str {
        match self {
            FilterFacet::Origins => "origin",
            FilterFacet::Roasters => "roaster",
            FilterFacet::Notes => "note",
            FilterFacet::Processes => "process",
        }
    }

    /// Field name, as used by panel forms.
    pub fn field_name(&self) -> &'static str {
        match self {
            FilterFacet::Origins => "origins",
            FilterFacet::Roasters => "roasters",
            FilterFacet::Notes => "notes",
            FilterFacet::Processes => "processes",
        }
    }

    pub fn from_param(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.param_name() == name)
    }

    /// Accepts either the field name or the query parameter name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|f| f.field_name() == name || f.param_name() == name)
    }

    pub fn label(&self) -> &'static str {
        match self {
            FilterFacet::Origins => "Origin",
            FilterFacet::Roasters => "Roaster",
            FilterFacet::Notes => "Tasting notes",
            FilterFacet::Processes => "Process",
        }
    }
}

/// Replacement of a single-valued filter field.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterUpdate {
    Search(String),
    MinRating(f64),
    SortBy(SortBy),
}

/// Active search and sort criteria of the coffee listing.
///
/// Multi-valued fields keep insertion order and never hold duplicates.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct FilterState {
    search: String,
    origins: Vec<String>,
    roasters: Vec<String>,
    notes: Vec<String>,
    processes: Vec<String>,
    min_rating: f64,
    sort_by: SortBy,
}

impl FilterState {
    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn min_rating(&self) -> f64 {
        self.min_rating
    }

    pub fn sort_by(&self) -> SortBy {
        self.sort_by
    }

    pub fn origins(&self) -> &[String] {
        &self.origins
    }

    pub fn roasters(&self) -> &[String] {
        &self.roasters
    }

    pub fn notes(&self) -> &[String] {
        &self.notes
    }

    pub fn processes(&self) -> &[String] {
        &self.processes
    }

    pub fn values(&self, facet: FilterFacet) -> &[String] {
        match facet {
            FilterFacet::Origins => &self.origins,
            FilterFacet::Roasters => &self.roasters,
            FilterFacet::Notes => &self.notes,
            FilterFacet::Processes => &self.processes,
        }
    }

    fn values_mut(&mut self, facet: FilterFacet) -> &mut Vec<String> {
        match facet {
            FilterFacet::Origins => &mut self.origins,
            FilterFacet::Roasters => &mut self.roasters,
            FilterFacet::Notes => &mut self.notes,
            FilterFacet::Processes => &mut self.processes,
        }
    }

    pub fn contains(&self, facet: FilterFacet, value: &str) -> bool {
        self.values(facet).iter().any(|v| v == value)
    }

    /// Appends `value` unless empty or already selected. Returns true if
    /// inserted.
    pub fn insert(&mut self, facet: FilterFacet, value: impl Into<String>) -> bool {
        let value = value.into();
        if value.is_empty() || self.contains(facet, &value) {
            return false;
        }
        self.values_mut(facet).push(value);
        true
    }

    /// Returns true if `value` was selected.
    pub fn remove(&mut self, facet: FilterFacet, value: &str) -> bool {
        let values = self.values_mut(facet);
        let before = values.len();
        values.retain(|v| v != value);
        values.len() != before
    }

    /// Empty values are never selected, so toggling one is a no-op.
    pub fn toggle(&mut self, facet: FilterFacet, value: &str) {
        if !self.remove(facet, value) {
            self.insert(facet, value);
        }
    }

    pub fn update(&mut self, update: FilterUpdate) {
        match update {
            FilterUpdate::Search(search) => self.search = search,
            FilterUpdate::MinRating(rating) => self.min_rating = rating,
            FilterUpdate::SortBy(sort_by) => self.sort_by = sort_by,
        }
    }

    /// Number of active facets. Each selected value counts once, as do a
    /// rating threshold and a non-default sort order. Search is not counted.
    pub fn active_count(&self) -> usize {
        let values: usize = FilterFacet::ALL.iter().map(|f| self.values(*f).len()).sum();
        values + usize::from(self.min_rating > 0.0) + usize::from(self.sort_by != SortBy::default())
    }

    pub fn is_default(&self) -> bool {
        *self == FilterState::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_state_is_empty() {
        let state = FilterState::default();
        assert_eq!(state.search(), "");
        assert_eq!(state.min_rating(), 0.0);
        assert_eq!(state.sort_by(), SortBy::Rating);
        assert_eq!(state.active_count(), 0);
        assert!(state.is_default());
    }

    #[test]
    fn test_insert_rejects_duplicates() {
        let mut state = FilterState::default();
        assert!(state.insert(FilterFacet::Origins, "Kenya"));
        assert!(!state.insert(FilterFacet::Origins, "Kenya"));
        assert_eq!(state.origins(), ["Kenya"]);
    }

    #[test]
    fn test_toggle_preserves_insertion_order() {
        let mut state = FilterState::default();
        state.toggle(FilterFacet::Notes, "Jasmine");
        state.toggle(FilterFacet::Notes, "Bergamot");
        state.toggle(FilterFacet::Notes, "Peach");
        state.toggle(FilterFacet::Notes, "Bergamot");
        assert_eq!(state.notes(), ["Jasmine", "Peach"]);
    }

    #[test]
    fn test_active_count() {
        let mut state = FilterState::default();
        state.insert(FilterFacet::Origins, "Kenya");
        state.insert(FilterFacet::Origins, "Brazil");
        state.insert(FilterFacet::Roasters, "Belleville");
        state.insert(FilterFacet::Processes, "Washed");
        state.update(FilterUpdate::Search("geisha".to_string()));
        assert_eq!(state.active_count(), 4);

        state.update(FilterUpdate::MinRating(4.5));
        state.update(FilterUpdate::SortBy(SortBy::Name));
        assert_eq!(state.active_count(), 6);
    }

    #[test]
    fn test_insert_rejects_empty_values() {
        let mut state = FilterState::default();
        assert!(!state.insert(FilterFacet::Roasters, ""));
        state.toggle(FilterFacet::Processes, "");
        assert!(state.is_default());
    }

    #[test]
    fn test_sort_by_parse() {
        for sort in SortBy::ALL {
            assert_eq!(SortBy::parse(sort.as_str()), Some(sort));
        }
        assert_eq!(SortBy::parse("bogus"), None);
        assert_eq!(SortBy::parse("Rating"), None);
    }

    #[test]
    fn test_facet_names() {
        assert_eq!(FilterFacet::from_name("origins"), Some(FilterFacet::Origins));
        assert_eq!(FilterFacet::from_name("process"), Some(FilterFacet::Processes));
        assert_eq!(FilterFacet::from_param("notes"), None);
        assert_eq!(FilterFacet::from_name("rating"), None);
    }
}
