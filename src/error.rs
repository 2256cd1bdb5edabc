use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Errors returned by request handlers.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg).into_response(),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg).into_response(),
            AppError::Database(e) => {
                tracing::error!("Database error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Database error").into_response()
            }
        }
    }
}

/// Rejected import item.
#[derive(Error, Debug, PartialEq)]
pub enum ValidationError {
    #[error("{0} name is required")]
    NameRequired(&'static str),

    #[error("{field} must not exceed {max} characters")]
    TooLong { field: &'static str, max: usize },

    #[error("Coffee name must be between 3 and 255 characters")]
    CoffeeNameLength,

    #[error("Altitude {0} must be between 0 and 5000")]
    InvalidAltitude(i64),

    #[error("Minimum altitude must not exceed maximum altitude")]
    AltitudeRange,

    #[error("Harvest year must be >= 2000")]
    InvalidHarvestYear(i64),

    #[error("Price range must be €, €€, €€€, or €€€€")]
    InvalidPriceRange,

    #[error("Must provide between 1 and 10 notes")]
    NoteCount(usize),

    #[error("Average rating {0} must be between 0 and 5")]
    InvalidRating(f64),

    #[error("Review count must be >= 0")]
    InvalidReviewCount(i64),

    #[error("Roaster ID or roaster name is required")]
    RoasterRequired,
}
