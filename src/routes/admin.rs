//! Moderation of submitted coffees.

use axum::{
    extract::{Path, RawQuery, State},
    Json,
};

use crate::db;
use crate::error::AppError;
use crate::models::{
    Coffee, CoffeeStatus, ModerateCoffeeRequest, PageResponse, Pagination, MAX_PAGE_SIZE,
};
use crate::state::AppState;

use super::page_query;

const MODERATION_PAGE_SIZE: u32 = 10;
const MAX_ADMIN_NOTES_LEN: usize = 500;

/// GET /api/admin/coffees/pending?page=...&limit=... - Coffees awaiting moderation.
pub async fn pending_coffees(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> Result<Json<PageResponse<Coffee>>, AppError> {
    let paging = page_query(query.as_deref().unwrap_or_default());
    let page = paging.page.unwrap_or(1).max(1);
    let limit = paging
        .limit
        .unwrap_or(MODERATION_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);

    let (data, total) =
        db::list_coffees_by_status(&state.pool, CoffeeStatus::Pending, page, limit).await?;
    Ok(Json(PageResponse {
        data,
        pagination: Pagination::new(page, limit, total),
    }))
}

/// PUT /api/admin/coffees/{id}/approve
pub async fn approve_coffee(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Coffee>, AppError> {
    tracing::info!("Approving coffee: {}", id);
    moderate(&state, id, CoffeeStatus::Approved, None).await
}

/// PUT /api/admin/coffees/{id}/reject - Reject with optional notes.
pub async fn reject_coffee(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<ModerateCoffeeRequest>,
) -> Result<Json<Coffee>, AppError> {
    let reason = request
        .admin_notes
        .as_deref()
        .map(str::trim)
        .filter(|notes| !notes.is_empty());
    if reason.is_some_and(|notes| notes.chars().count() > MAX_ADMIN_NOTES_LEN) {
        return Err(AppError::BadRequest(format!(
            "Admin notes must not exceed {} characters",
            MAX_ADMIN_NOTES_LEN
        )));
    }

    tracing::info!("Rejecting coffee: {}", id);
    moderate(&state, id, CoffeeStatus::Rejected, reason).await
}

async fn moderate(
    state: &AppState,
    id: i64,
    status: CoffeeStatus,
    reason: Option<&str>,
) -> Result<Json<Coffee>, AppError> {
    let not_found = || AppError::NotFound("Coffee not found".to_string());

    if !db::set_coffee_status(&state.pool, id, status, reason, &db::current_timestamp()).await? {
        return Err(not_found());
    }
    db::find_coffee(&state.pool, id)
        .await?
        .map(Json)
        .ok_or_else(not_found)
}
