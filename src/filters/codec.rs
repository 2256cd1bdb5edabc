//! Query-string representation of [`FilterState`].
//!
//! Fields at their default value are omitted, so an unfiltered listing is
//! always the bare `/coffees` URL. Decoding never fails: anything malformed
//! falls back to the field default.

use url::form_urlencoded;

use super::{FilterFacet, FilterState, SortBy, MAX_RATING};

/// Route of the coffee listing.
pub const LISTING_PATH: &str = "/coffees";

const SEARCH_PARAM: &str = "search";
const MIN_RATING_PARAM: &str = "minRating";
const SORT_BY_PARAM: &str = "sortBy";

/// Encode filters as a query string, without the leading `?`.
pub fn encode(state: &FilterState) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());

    if !state.search.is_empty() {
        serializer.append_pair(SEARCH_PARAM, &state.search);
    }
    for facet in FilterFacet::ALL {
        for value in state.values(facet) {
            serializer.append_pair(facet.param_name(), value);
        }
    }
    if state.min_rating > 0.0 {
        serializer.append_pair(MIN_RATING_PARAM, &state.min_rating.to_string());
    }
    if state.sort_by != SortBy::default() {
        serializer.append_pair(SORT_BY_PARAM, state.sort_by.as_str());
    }

    serializer.finish()
}

/// Decode filters from a query string. A leading `?` is accepted and
/// parameters unrelated to filters are ignored.
pub fn decode(query: &str) -> FilterState {
    let query = query.strip_prefix('?').unwrap_or(query);
    let mut state = FilterState::default();
    let mut search = None;
    let mut min_rating = None;
    let mut sort_by = None;

    for (key, value) in form_urlencoded::parse(query.as_bytes()) {
        match key.as_ref() {
            SEARCH_PARAM => {
                search.get_or_insert_with(|| value.into_owned());
            }
            MIN_RATING_PARAM => {
                min_rating.get_or_insert_with(|| parse_rating(&value));
            }
            SORT_BY_PARAM => {
                sort_by.get_or_insert_with(|| SortBy::parse(&value).unwrap_or_default());
            }
            other => {
                if let Some(facet) = FilterFacet::from_param(other) {
                    if !value.is_empty() {
                        state.insert(facet, value.into_owned());
                    }
                }
            }
        }
    }

    state.search = search.unwrap_or_default();
    state.min_rating = min_rating.unwrap_or_default();
    state.sort_by = sort_by.unwrap_or_default();
    state
}

/// Listing URL for the given filters.
pub fn listing_location(state: &FilterState) -> String {
    let query = encode(state);
    if query.is_empty() {
        LISTING_PATH.to_string()
    } else {
        format!("{}?{}", LISTING_PATH, query)
    }
}

fn parse_rating(value: &str) -> f64 {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|r| r.is_finite() && (0.0..=MAX_RATING).contains(r))
        .unwrap_or(0.0)
}
