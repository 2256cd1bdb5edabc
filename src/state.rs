use sqlx::SqlitePool;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    /// Coffees per listing page.
    pub page_size: u32,
}

impl AppState {
    pub fn new(pool: SqlitePool, page_size: u32) -> Self {
        Self { pool, page_size }
    }
}
