use axum::{
    extract::{Path, RawQuery, State},
    Json,
};

use crate::db;
use crate::error::AppError;
use crate::filters::{decode, FilterState};
use crate::import;
use crate::models::{
    BatchImportRequest, Coffee, CoffeeSearch, FilterOptions, ImportResponse, Note, PageResponse,
    Pagination, Roaster,
};
use crate::state::AppState;

use super::page_query;

/// Run the catalog search for committed filters.
pub(crate) async fn search_listing(
    state: &AppState,
    filters: &FilterState,
    page: u32,
    limit: u32,
) -> Result<PageResponse<Coffee>, AppError> {
    let roasters = db::list_roasters(&state.pool).await?;
    let notes = db::list_notes(&state.pool).await?;
    let search = CoffeeSearch::from_filters(filters, &roasters, &notes, page, limit);

    let (data, total) = db::search_coffees(&state.pool, &search).await?;
    Ok(PageResponse {
        data,
        pagination: Pagination::new(search.page, search.limit, total),
    })
}

/// GET /api/coffees?<filters>&page=...&limit=... - Search approved coffees.
pub async fn list_coffees(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> Result<Json<PageResponse<Coffee>>, AppError> {
    let query = query.unwrap_or_default();
    let filters = decode(&query);
    let paging = page_query(&query);

    let response = search_listing(
        &state,
        &filters,
        paging.page.unwrap_or(1),
        paging.limit.unwrap_or(state.page_size),
    )
    .await?;
    Ok(Json(response))
}

/// GET /api/coffees/{id} - One approved coffee.
pub async fn get_coffee(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Coffee>, AppError> {
    db::get_coffee(&state.pool, id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Coffee not found".to_string()))
}

/// GET /api/roasters
pub async fn list_roasters(State(state): State<AppState>) -> Result<Json<Vec<Roaster>>, AppError> {
    Ok(Json(db::list_roasters(&state.pool).await?))
}

/// GET /api/notes
pub async fn list_notes(State(state): State<AppState>) -> Result<Json<Vec<Note>>, AppError> {
    Ok(Json(db::list_notes(&state.pool).await?))
}

/// GET /api/filters - Values offered by the filter panel.
pub async fn filter_options(State(state): State<AppState>) -> Result<Json<FilterOptions>, AppError> {
    Ok(Json(load_filter_options(&state).await?))
}

pub(crate) async fn load_filter_options(state: &AppState) -> Result<FilterOptions, sqlx::Error> {
    Ok(FilterOptions {
        origins: db::list_origins(&state.pool).await?,
        roasters: db::list_roasters(&state.pool)
            .await?
            .into_iter()
            .map(|r| r.name)
            .collect(),
        notes: db::list_notes(&state.pool)
            .await?
            .into_iter()
            .map(|n| n.name)
            .collect(),
        processes: db::list_processes(&state.pool).await?,
    })
}

/// POST /api/import - Batch import notes, roasters and coffees.
pub async fn import_batch(
    State(state): State<AppState>,
    Json(request): Json<BatchImportRequest>,
) -> Json<ImportResponse> {
    Json(import::batch_import(&state.pool, request).await)
}
