mod common;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use tower::ServiceExt;

use common::{body_string, create_test_app, get, get_json};

fn names(json: &serde_json::Value) -> Vec<String> {
    json["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["name"].as_str().unwrap().to_string())
        .collect()
}

// ============================================================================
// Health endpoint tests
// ============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let app = create_test_app(12).await;

    let (status, body) = get(&app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "OK");
}

#[tokio::test]
async fn test_ready_endpoint() {
    let app = create_test_app(12).await;

    let (status, body) = get(&app, "/ready").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "OK");
}

// ============================================================================
// Coffee search tests
// ============================================================================

#[tokio::test]
async fn test_list_coffees_defaults() {
    let app = create_test_app(12).await;

    let json = get_json(&app, "/api/coffees").await;

    // Best rated first, pending coffees are never listed
    assert_eq!(
        names(&json),
        ["Yirgacheffe Konga", "Kiambu AA", "Cerrado Mineiro"]
    );
    assert_eq!(json["pagination"]["total"], 3);
    assert_eq!(json["pagination"]["limit"], 12);
    assert_eq!(json["data"][0]["roaster"]["name"], "Belleville");
    assert_eq!(
        json["data"][0]["notes"],
        serde_json::json!(["Blackcurrant", "Jasmine"])
    );
}

#[tokio::test]
async fn test_list_coffees_with_filters() {
    let app = create_test_app(12).await;

    let json = get_json(&app, "/api/coffees?origin=Ethiopia&origin=Kenya&minRating=4").await;
    assert_eq!(names(&json), ["Yirgacheffe Konga", "Kiambu AA"]);

    let json = get_json(&app, "/api/coffees?minRating=4.5").await;
    assert_eq!(names(&json), ["Yirgacheffe Konga"]);

    let json = get_json(&app, "/api/coffees?note=Cocoa&note=Jasmine&sortBy=name").await;
    assert_eq!(names(&json), ["Cerrado Mineiro", "Yirgacheffe Konga"]);

    let json = get_json(&app, "/api/coffees?roaster=Coutume").await;
    assert_eq!(names(&json), ["Kiambu AA"]);

    let json = get_json(&app, "/api/coffees?process=Washed&sortBy=reviews").await;
    assert_eq!(names(&json), ["Yirgacheffe Konga", "Kiambu AA"]);
}

#[tokio::test]
async fn test_list_coffees_search_text() {
    let app = create_test_app(12).await;

    let json = get_json(&app, "/api/coffees?search=kiambu").await;
    assert_eq!(names(&json), ["Kiambu AA"]);

    // Matches the roaster name too
    let json = get_json(&app, "/api/coffees?search=belle&sortBy=name").await;
    assert_eq!(names(&json), ["Cerrado Mineiro", "Yirgacheffe Konga"]);
}

#[tokio::test]
async fn test_unknown_filter_values_match_nothing() {
    let app = create_test_app(12).await;

    let json = get_json(&app, "/api/coffees?roaster=Nobody").await;
    assert_eq!(json["pagination"]["total"], 0);

    let json = get_json(&app, "/api/coffees?note=Tobacco").await;
    assert_eq!(json["pagination"]["total"], 0);
}

#[tokio::test]
async fn test_malformed_filters_fall_back_to_defaults() {
    let app = create_test_app(12).await;

    let json = get_json(&app, "/api/coffees?sortBy=price&minRating=lots&page=abc").await;
    assert_eq!(
        names(&json),
        ["Yirgacheffe Konga", "Kiambu AA", "Cerrado Mineiro"]
    );
    assert_eq!(json["pagination"]["page"], 1);
}

#[tokio::test]
async fn test_list_coffees_pagination() {
    let app = create_test_app(12).await;

    let json = get_json(&app, "/api/coffees?limit=2&page=2").await;
    assert_eq!(names(&json), ["Cerrado Mineiro"]);
    assert_eq!(
        json["pagination"],
        serde_json::json!({
            "page": 2,
            "limit": 2,
            "total": 3,
            "total_pages": 2,
            "has_next": false,
            "has_prev": true
        })
    );

    let json = get_json(&app, "/api/coffees?limit=1000&page=0").await;
    assert_eq!(json["pagination"]["limit"], 100);
    assert_eq!(json["pagination"]["page"], 1);
}

#[tokio::test]
async fn test_get_coffee() {
    let app = create_test_app(12).await;

    let json = get_json(&app, "/api/coffees/2").await;
    assert_eq!(json["name"], "Kiambu AA");
    assert_eq!(json["status"], "approved");

    // Pending
    let (status, _) = get(&app, "/api/coffees/4").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = get(&app, "/api/coffees/999").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, "Coffee not found");

    let (status, _) = get(&app, "/api/coffees/abc").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ============================================================================
// Filter option tests
// ============================================================================

#[tokio::test]
async fn test_filter_options() {
    let app = create_test_app(12).await;

    let json = get_json(&app, "/api/filters").await;
    assert_eq!(
        json,
        serde_json::json!({
            "origins": ["Brazil", "Ethiopia", "Kenya"],
            "roasters": ["Belleville", "Coutume"],
            "notes": ["Blackcurrant", "Cocoa", "Jasmine"],
            "processes": ["Natural", "Washed"]
        })
    );
}

#[tokio::test]
async fn test_roasters_and_notes() {
    let app = create_test_app(12).await;

    let roasters = get_json(&app, "/api/roasters").await;
    assert_eq!(roasters.as_array().unwrap().len(), 2);
    assert_eq!(roasters[0]["location"], "Paris");

    let notes = get_json(&app, "/api/notes").await;
    assert_eq!(notes[1]["name"], "Cocoa");
    assert_eq!(notes[1]["category"], "Chocolate");
}

// ============================================================================
// Import endpoint tests
// ============================================================================

#[tokio::test]
async fn test_import_endpoint() {
    let app = create_test_app(12).await;

    let request = serde_json::json!({
        "auto_approve": true,
        "roasters": [{ "name": "Belleville" }, { "name": "Kawa" }],
        "coffees": [
            { "name": "Huila Supremo", "roaster_name": "Kawa", "origin": "Colombia", "note_names": ["Cocoa"] },
            { "name": "Bad Altitude", "roaster_name": "Kawa", "altitude_min": 9000, "note_names": ["Cocoa"] }
        ]
    });

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/import")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(request.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json: serde_json::Value =
        serde_json::from_str(&body_string(response.into_body()).await).unwrap();
    assert_eq!(
        json["message"],
        "Import completed: 4 total, 2 created, 1 errors, 1 skipped"
    );
    assert_eq!(json["results"][0]["operation"], "skip");
    assert_eq!(json["results"][3]["operation"], "error");
    assert_eq!(json["results"][3]["entity_type"], "coffee");

    let listed = get_json(&app, "/api/coffees?origin=Colombia").await;
    assert_eq!(names(&listed), ["Huila Supremo"]);
}

#[tokio::test]
async fn test_import_rejects_malformed_json() {
    let app = create_test_app(12).await;

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/import")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{ not json"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert!(response.status().is_client_error());
}

// ============================================================================
// Moderation endpoint tests
// ============================================================================

async fn put_json(
    app: &axum::Router,
    uri: &str,
    body: serde_json::Value,
) -> (StatusCode, String) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    (status, body_string(response.into_body()).await)
}

#[tokio::test]
async fn test_pending_coffees() {
    let app = create_test_app(12).await;

    let json = get_json(&app, "/api/admin/coffees/pending").await;
    assert_eq!(names(&json), ["Secret Lot"]);
    assert_eq!(json["data"][0]["status"], "pending");
    assert_eq!(json["pagination"]["total"], 1);
    assert_eq!(json["pagination"]["limit"], 10);

    let json = get_json(&app, "/api/admin/coffees/pending?page=2&limit=0").await;
    assert_eq!(json["data"].as_array().unwrap().len(), 0);
    assert_eq!(json["pagination"]["limit"], 1);
}

#[tokio::test]
async fn test_approve_coffee() {
    let app = create_test_app(12).await;

    let (status, body) = put_json(&app, "/api/admin/coffees/4/approve", serde_json::json!({})).await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["name"], "Secret Lot");
    assert_eq!(json["status"], "approved");
    assert!(json["moderated_at"].is_string());

    let json = get_json(&app, "/api/coffees/4").await;
    assert_eq!(json["status"], "approved");

    let pending = get_json(&app, "/api/admin/coffees/pending").await;
    assert_eq!(pending["pagination"]["total"], 0);
}

#[tokio::test]
async fn test_reject_coffee() {
    let app = create_test_app(12).await;

    let (status, body) = put_json(
        &app,
        "/api/admin/coffees/4/reject",
        serde_json::json!({ "admin_notes": "  Duplicate  " }),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["status"], "rejected");
    assert_eq!(json["moderation_reason"], "Duplicate");

    let (status, _) = get(&app, "/api/coffees/4").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Blank notes record no reason
    let (status, body) = put_json(
        &app,
        "/api/admin/coffees/1/reject",
        serde_json::json!({ "admin_notes": "   " }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert!(json.get("moderation_reason").is_none());
}

#[tokio::test]
async fn test_moderation_errors() {
    let app = create_test_app(12).await;

    let (status, body) = put_json(&app, "/api/admin/coffees/999/approve", serde_json::json!({})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, "Coffee not found");

    let (status, _) = put_json(&app, "/api/admin/coffees/999/reject", serde_json::json!({})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = put_json(
        &app,
        "/api/admin/coffees/4/reject",
        serde_json::json!({ "admin_notes": "x".repeat(501) }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, "Admin notes must not exceed 500 characters");

    // Still pending
    let pending = get_json(&app, "/api/admin/coffees/pending").await;
    assert_eq!(names(&pending), ["Secret Lot"]);
}
