pub mod config;
pub mod db;
pub mod error;
pub mod filters;
pub mod import;
pub mod models;
pub mod routes;
pub mod state;
pub mod validation;

pub use config::Config;
pub use db::{current_timestamp, init_pool, run_migrations};
pub use error::{AppError, ValidationError};
pub use filters::{FilterController, FilterFacet, FilterState, FilterUpdate, Navigator, SortBy};
pub use import::batch_import;
pub use models::{BatchImportRequest, Coffee, ImportResponse};
pub use routes::create_router;
pub use state::AppState;
