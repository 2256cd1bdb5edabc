use serde::{Deserialize, Serialize};

use crate::filters::{FilterState, SortBy};

/// Default number of coffees per listing page.
pub const DEFAULT_PAGE_SIZE: u32 = 12;

/// Largest page a client may ask for.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Moderation status of a coffee. Only approved coffees are listed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum CoffeeStatus {
    Pending,
    Approved,
    Rejected,
}

/// A coffee roasting company.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Roaster {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub website: Option<String>,
    pub created_at: String,
}

/// A tasting note.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Note {
    pub id: i64,
    pub name: String,
    pub category: Option<String>,
}

/// A coffee as stored, joined with its roaster name.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CoffeeRow {
    pub id: i64,
    pub name: String,
    pub roaster_id: i64,
    pub roaster_name: String,
    pub origin: Option<String>,
    pub process: Option<String>,
    pub variety: Option<String>,
    pub altitude_min: Option<i64>,
    pub altitude_max: Option<i64>,
    pub harvest_year: Option<i64>,
    pub price_range: Option<String>,
    pub description: Option<String>,
    pub average_rating: Option<f64>,
    pub review_count: i64,
    pub status: CoffeeStatus,
    pub moderation_reason: Option<String>,
    pub moderated_at: Option<String>,
    pub created_at: String,
}

/// A coffee with its tasting notes, as served to clients.
#[derive(Debug, Clone, Serialize)]
pub struct Coffee {
    pub id: i64,
    pub name: String,
    pub roaster: RoasterSummary,
    pub origin: Option<String>,
    pub process: Option<String>,
    pub variety: Option<String>,
    pub altitude_min: Option<i64>,
    pub altitude_max: Option<i64>,
    pub harvest_year: Option<i64>,
    pub price_range: Option<String>,
    pub description: Option<String>,
    pub average_rating: Option<f64>,
    pub review_count: i64,
    pub status: CoffeeStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub moderation_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub moderated_at: Option<String>,
    pub created_at: String,
    pub notes: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RoasterSummary {
    pub id: i64,
    pub name: String,
}

impl Coffee {
    pub fn from_row(row: CoffeeRow, notes: Vec<String>) -> Self {
        Self {
            id: row.id,
            name: row.name,
            roaster: RoasterSummary {
                id: row.roaster_id,
                name: row.roaster_name,
            },
            origin: row.origin,
            process: row.process,
            variety: row.variety,
            altitude_min: row.altitude_min,
            altitude_max: row.altitude_max,
            harvest_year: row.harvest_year,
            price_range: row.price_range,
            description: row.description,
            average_rating: row.average_rating,
            review_count: row.review_count,
            status: row.status,
            moderation_reason: row.moderation_reason,
            moderated_at: row.moderated_at,
            created_at: row.created_at,
            notes,
        }
    }
}

/// Catalog query built from committed listing filters.
///
/// Roaster and note names are resolved to catalog ids here. A name with no
/// match resolves to id 0, which matches no coffee.
#[derive(Debug, Clone, PartialEq)]
pub struct CoffeeSearch {
    pub search: String,
    pub origins: Vec<String>,
    pub roaster_ids: Vec<i64>,
    pub note_ids: Vec<i64>,
    pub processes: Vec<String>,
    pub min_rating: Option<f64>,
    pub sort_by: SortBy,
    pub page: u32,
    pub limit: u32,
}

impl CoffeeSearch {
    pub fn from_filters(
        filters: &FilterState,
        roasters: &[Roaster],
        notes: &[Note],
        page: u32,
        limit: u32,
    ) -> Self {
        let roaster_ids = filters
            .roasters()
            .iter()
            .map(|name| roasters.iter().find(|r| &r.name == name).map_or(0, |r| r.id))
            .collect();
        let note_ids = filters
            .notes()
            .iter()
            .map(|name| notes.iter().find(|n| &n.name == name).map_or(0, |n| n.id))
            .collect();

        Self {
            search: filters.search().trim().to_string(),
            origins: filters.origins().to_vec(),
            roaster_ids,
            note_ids,
            processes: filters.processes().to_vec(),
            min_rating: (filters.min_rating() > 0.0).then_some(filters.min_rating()),
            sort_by: filters.sort_by(),
            page: page.max(1),
            limit: limit.clamp(1, MAX_PAGE_SIZE),
        }
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.page - 1) * i64::from(self.limit)
    }
}

/// Paging query parameters, read alongside the filters.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

/// A page of results.
#[derive(Debug, Serialize)]
pub struct PageResponse<T> {
    pub data: Vec<T>,
    pub pagination: Pagination,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: i64,
    pub total_pages: u32,
    pub has_next: bool,
    pub has_prev: bool,
}

impl Pagination {
    pub fn new(page: u32, limit: u32, total: i64) -> Self {
        let limit = limit.max(1);
        let total_pages = (total.max(0) as u64).div_ceil(u64::from(limit)) as u32;
        Self {
            page,
            limit,
            total,
            total_pages,
            has_next: page < total_pages,
            has_prev: page > 1,
        }
    }
}

/// Body of a moderation decision.
#[derive(Debug, Default, Deserialize)]
pub struct ModerateCoffeeRequest {
    #[serde(default)]
    pub admin_notes: Option<String>,
}

/// Values a filter panel can offer.
#[derive(Debug, Default, Serialize)]
pub struct FilterOptions {
    pub origins: Vec<String>,
    pub roasters: Vec<String>,
    pub notes: Vec<String>,
    pub processes: Vec<String>,
}

/// A batch of catalog data to import.
#[derive(Debug, Deserialize)]
pub struct BatchImportRequest {
    #[serde(default)]
    pub notes: Vec<ImportNote>,
    #[serde(default)]
    pub roasters: Vec<ImportRoaster>,
    #[serde(default)]
    pub coffees: Vec<ImportCoffee>,
    #[serde(default = "default_true")]
    pub continue_on_error: bool,
    #[serde(default)]
    pub auto_approve: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImportNote {
    pub name: String,
    pub category: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImportRoaster {
    pub name: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub website: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImportCoffee {
    pub name: String,
    pub roaster_id: Option<i64>,
    pub roaster_name: Option<String>,
    pub origin: Option<String>,
    pub process: Option<String>,
    pub variety: Option<String>,
    pub altitude_min: Option<i64>,
    pub altitude_max: Option<i64>,
    pub harvest_year: Option<i64>,
    pub price_range: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub note_names: Vec<String>,
    pub average_rating: Option<f64>,
    pub review_count: Option<i64>,
    pub auto_approve: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityType {
    Note,
    Roaster,
    Coffee,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportOperation {
    Create,
    Skip,
    Error,
}

/// Outcome of importing one item.
#[derive(Debug, Clone, Serialize)]
pub struct ImportResult {
    pub entity_type: EntityType,
    pub operation: ImportOperation,
    pub entity_id: Option<i64>,
    pub entity_name: String,
    pub success: bool,
    pub error_message: Option<String>,
}

impl ImportResult {
    pub fn created(entity_type: EntityType, id: i64, name: &str) -> Self {
        Self::success(entity_type, ImportOperation::Create, id, name)
    }

    pub fn skipped(entity_type: EntityType, id: i64, name: &str) -> Self {
        Self::success(entity_type, ImportOperation::Skip, id, name)
    }

    fn success(entity_type: EntityType, operation: ImportOperation, id: i64, name: &str) -> Self {
        Self {
            entity_type,
            operation,
            entity_id: Some(id),
            entity_name: name.to_string(),
            success: true,
            error_message: None,
        }
    }

    pub fn error(entity_type: EntityType, name: &str, message: impl Into<String>) -> Self {
        Self {
            entity_type,
            operation: ImportOperation::Error,
            entity_id: None,
            entity_name: name.to_string(),
            success: false,
            error_message: Some(message.into()),
        }
    }
}

/// Summary of a batch import.
#[derive(Debug, Default, Serialize)]
pub struct ImportResponse {
    pub total_processed: usize,
    pub success_count: usize,
    pub error_count: usize,
    pub skip_count: usize,
    pub create_count: usize,
    pub results: Vec<ImportResult>,
    pub message: String,
}

impl ImportResponse {
    pub fn push(&mut self, result: ImportResult) {
        self.total_processed += 1;
        if result.success {
            self.success_count += 1;
        } else {
            self.error_count += 1;
        }
        match result.operation {
            ImportOperation::Create => self.create_count += 1,
            ImportOperation::Skip => self.skip_count += 1,
            ImportOperation::Error => {}
        }
        self.results.push(result);
    }

    pub fn finish(mut self) -> Self {
        self.message = format!(
            "Import completed: {} total, {} created, {} errors, {} skipped",
            self.total_processed, self.create_count, self.error_count, self.skip_count
        );
        self
    }
}
