use super::codec::{listing_location, LISTING_PATH};
use super::{FilterFacet, FilterState, FilterUpdate};

/// Destination for committed filters.
///
/// Navigation is fire-and-forget: the controller never waits for it and a
/// later call supersedes an earlier one.
pub trait Navigator {
    fn navigate(&mut self, location: &str);
}

impl<N: Navigator + ?Sized> Navigator for &mut N {
    fn navigate(&mut self, location: &str) {
        (**self).navigate(location)
    }
}

/// Owns the pending filters of the listing and commits them to the URL.
///
/// Mutations only touch the pending state. [`apply_filters`] and
/// [`reset_filters`] are the only operations that navigate, so several
/// changes can be collected before a single listing query runs.
///
/// [`apply_filters`]: FilterController::apply_filters
/// [`reset_filters`]: FilterController::reset_filters
#[derive(Debug)]
pub struct FilterController<N> {
    pending: FilterState,
    panel_open: bool,
    navigator: N,
}

impl<N: Navigator> FilterController<N> {
    pub fn new(pending: FilterState, navigator: N) -> Self {
        Self {
            pending,
            panel_open: false,
            navigator,
        }
    }

    /// Start from the filters committed in a listing query string.
    pub fn from_query(query: &str, navigator: N) -> Self {
        Self::new(super::codec::decode(query), navigator)
    }

    pub fn filters(&self) -> &FilterState {
        &self.pending
    }

    pub fn update_filter(&mut self, update: FilterUpdate) {
        self.pending.update(update);
    }

    pub fn toggle_filter_value(&mut self, facet: FilterFacet, value: &str) {
        self.pending.toggle(facet, value);
    }

    pub fn add_filter_value(&mut self, facet: FilterFacet, value: &str) {
        self.pending.insert(facet, value);
    }

    pub fn remove_filter_value(&mut self, facet: FilterFacet, value: &str) {
        self.pending.remove(facet, value);
    }

    /// Commit the pending filters to the listing URL.
    pub fn apply_filters(&mut self) {
        let location = listing_location(&self.pending);
        tracing::debug!("Applying filters: {}", location);
        self.navigator.navigate(&location);
        self.panel_open = false;
    }

    /// Drop every filter and go back to the bare listing.
    pub fn reset_filters(&mut self) {
        self.pending = FilterState::default();
        self.navigator.navigate(LISTING_PATH);
        self.panel_open = false;
    }

    pub fn active_filters_count(&self) -> usize {
        self.pending.active_count()
    }

    pub fn has_active_filters(&self) -> bool {
        self.active_filters_count() > 0
    }

    pub fn open_panel(&mut self) {
        self.panel_open = true;
    }

    pub fn close_panel(&mut self) {
        self.panel_open = false;
    }

    pub fn is_panel_open(&self) -> bool {
        self.panel_open
    }

    pub fn navigator(&self) -> &N {
        &self.navigator
    }

    pub fn into_parts(self) -> (FilterState, N) {
        (self.pending, self.navigator)
    }
}
