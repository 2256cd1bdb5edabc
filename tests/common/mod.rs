#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use tower::ServiceExt;

use sipzy::{batch_import, create_router, init_pool, run_migrations, AppState, BatchImportRequest};

/// Three approved coffees and one pending, ids 1 to 4 in this order.
pub const SEED: &str = r#"{
    "auto_approve": true,
    "notes": [
        { "name": "Blackcurrant", "category": "Fruity" },
        { "name": "Cocoa", "category": "Chocolate" },
        { "name": "Jasmine", "category": "Floral" }
    ],
    "roasters": [
        { "name": "Belleville", "location": "Paris" },
        { "name": "Coutume", "location": "Paris" }
    ],
    "coffees": [
        {
            "name": "Yirgacheffe Konga",
            "roaster_name": "Belleville",
            "origin": "Ethiopia",
            "process": "Washed",
            "note_names": ["Jasmine", "Blackcurrant"],
            "average_rating": 4.6,
            "review_count": 31
        },
        {
            "name": "Kiambu AA",
            "roaster_name": "Coutume",
            "origin": "Kenya",
            "process": "Washed",
            "note_names": ["Blackcurrant"],
            "average_rating": 4.3,
            "review_count": 18
        },
        {
            "name": "Cerrado Mineiro",
            "roaster_name": "Belleville",
            "origin": "Brazil",
            "process": "Natural",
            "note_names": ["Cocoa"],
            "average_rating": 3.9,
            "review_count": 42
        },
        {
            "name": "Secret Lot",
            "roaster_name": "Coutume",
            "origin": "Panama",
            "process": "Honey",
            "note_names": ["Jasmine"],
            "average_rating": 5.0,
            "review_count": 2,
            "auto_approve": false
        }
    ]
}"#;

/// Create a test app with an in-memory, seeded database.
pub async fn create_test_app(page_size: u32) -> Router {
    let pool = init_pool("sqlite::memory:").await.unwrap();
    run_migrations(&pool).await.unwrap();

    let batch: BatchImportRequest = serde_json::from_str(SEED).unwrap();
    let response = batch_import(&pool, batch).await;
    assert_eq!(response.error_count, 0, "{:?}", response.results);

    create_router(AppState::new(pool, page_size))
}

/// Helper to get response body as string.
pub async fn body_string(body: Body) -> String {
    let bytes = body.collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub async fn get(app: &Router, uri: &str) -> (StatusCode, String) {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    (status, body_string(response.into_body()).await)
}

pub async fn get_json(app: &Router, uri: &str) -> serde_json::Value {
    let (status, body) = get(app, uri).await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    serde_json::from_str(&body).unwrap()
}

/// POST a filter panel form. Returns the status, the `Location` header and the body.
pub async fn post_panel(app: &Router, fields: &[(&str, &str)]) -> (StatusCode, Option<String>, String) {
    let body = url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(fields)
        .finish();
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/coffees/filters")
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let location = response
        .headers()
        .get(header::LOCATION)
        .map(|v| v.to_str().unwrap().to_string());
    (status, location, body_string(response.into_body()).await)
}
