pub mod admin;
pub mod api;
pub mod pages;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post, put},
    Router,
};
use url::form_urlencoded;

use crate::models::PageQuery;
use crate::state::AppState;

pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Listing pages
        .route("/", get(pages::index))
        .route("/coffees", get(pages::listing))
        .route("/coffees/filters", post(pages::filter_panel))
        // API endpoints
        .route("/api/coffees", get(api::list_coffees))
        .route("/api/coffees/{id}", get(api::get_coffee))
        .route("/api/roasters", get(api::list_roasters))
        .route("/api/notes", get(api::list_notes))
        .route("/api/filters", get(api::filter_options))
        .route("/api/import", post(api::import_batch))
        // Moderation
        .route("/api/admin/coffees/pending", get(admin::pending_coffees))
        .route("/api/admin/coffees/{id}/approve", put(admin::approve_coffee))
        .route("/api/admin/coffees/{id}/reject", put(admin::reject_coffee))
        // Health check
        .route("/health", get(health))
        .route("/ready", get(ready))
        .with_state(state)
}

async fn health() -> &'static str {
    "OK"
}

async fn ready(State(state): State<AppState>) -> (StatusCode, &'static str) {
    match sqlx::query("SELECT 1").execute(&state.pool).await {
        Ok(_) => (StatusCode::OK, "OK"),
        Err(e) => {
            tracing::error!("Readiness check failed: {}", e);
            (StatusCode::SERVICE_UNAVAILABLE, "Database unavailable")
        }
    }
}

/// Paging parameters from a listing query. Unparsable values are dropped.
pub(crate) fn page_query(query: &str) -> PageQuery {
    let mut paging = PageQuery::default();
    for (key, value) in form_urlencoded::parse(query.as_bytes()) {
        match key.as_ref() {
            "page" if paging.page.is_none() => paging.page = value.parse().ok(),
            "limit" if paging.limit.is_none() => paging.limit = value.parse().ok(),
            _ => {}
        }
    }
    paging
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_query() {
        let paging = page_query("origin=Kenya&page=3&limit=20&page=9");
        assert_eq!(paging.page, Some(3));
        assert_eq!(paging.limit, Some(20));

        let paging = page_query("page=abc&limit=-1");
        assert_eq!(paging.page, None);
        assert_eq!(paging.limit, None);
    }
}
