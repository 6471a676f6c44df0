mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::{create_category, create_entry, json_request, signup_user};

#[tokio::test]
async fn create_list_update_delete_entry() {
    let app = common::setup_test_app().await.expect("setup");
    let cookie = signup_user(&app, "entries@example.com").await.expect("signup");
    let category_id = create_category(&app, &cookie, "Consulting", "income").await;

    let (status, created) = json_request(
        &app,
        "POST",
        "/api/entries",
        &cookie,
        Some(json!({
            "date": "2024-03-15",
            "product_or_service": "  Strategy session ",
            "revenue": 500.0,
            "cost": 120.5,
            "category_id": category_id,
            "notes": "   ",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", created);
    assert_eq!(created["product_or_service"], "Strategy session");
    assert!(created["notes"].is_null());
    let entry_id = created["id"].as_str().expect("id").to_string();

    let (status, listed) = json_request(&app, "GET", "/api/entries", &cookie, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed["total_count"], 1);
    assert_eq!(listed["entries"][0]["id"], entry_id.as_str());

    let (status, updated) = json_request(
        &app,
        "PUT",
        &format!("/api/entries/{}", entry_id),
        &cookie,
        Some(json!({ "cost": 20.0, "notes": "Paid upfront" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", updated);
    assert_eq!(updated["cost"], 20.0);
    assert_eq!(updated["revenue"], 500.0);
    assert_eq!(updated["notes"], "Paid upfront");

    let (status, _) = json_request(
        &app,
        "DELETE",
        &format!("/api/entries/{}", entry_id),
        &cookie,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = json_request(
        &app,
        "DELETE",
        &format!("/api/entries/{}", entry_id),
        &cookie,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, "Entry not found");
}

#[tokio::test]
async fn rejects_invalid_entries() {
    let app = common::setup_test_app().await.expect("setup");
    let cookie = signup_user(&app, "invalid@example.com").await.expect("signup");
    let category_id = create_category(&app, &cookie, "Design", "income").await;

    let base = json!({
        "date": "2024-03-15",
        "product_or_service": "Logo",
        "revenue": 100.0,
        "cost": 10.0,
        "category_id": category_id,
    });

    let cases = [
        ("date", json!("15/03/2024")),
        ("revenue", json!(-5.0)),
        ("cost", json!(-0.01)),
        ("product_or_service", json!("   ")),
        ("category_id", json!("no-such-category")),
    ];
    for (field, value) in cases {
        let mut payload = base.clone();
        payload[field] = value;
        let (status, body) = json_request(&app, "POST", "/api/entries", &cookie, Some(payload)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{} -> {}", field, body);
    }

    let mut payload = base.clone();
    payload["category_id"] = json!("no-such-category");
    let (_, body) = json_request(&app, "POST", "/api/entries", &cookie, Some(payload)).await;
    assert_eq!(body, "Category does not exist");
}

#[tokio::test]
async fn entries_are_scoped_to_their_owner() {
    let app = common::setup_test_app().await.expect("setup");
    let alice = signup_user(&app, "alice@example.com").await.expect("signup");
    let bob = signup_user(&app, "bob@example.com").await.expect("signup");

    let alice_category = create_category(&app, &alice, "Consulting", "income").await;
    let entry_id = create_entry(&app, &alice, "2024-02-01", 100.0, 0.0, &alice_category).await;

    let (status, listed) = json_request(&app, "GET", "/api/entries", &bob, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed["total_count"], 0);

    let (status, _) = json_request(
        &app,
        "PUT",
        &format!("/api/entries/{}", entry_id),
        &bob,
        Some(json!({ "revenue": 1.0 })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = json_request(
        &app,
        "DELETE",
        &format!("/api/entries/{}", entry_id),
        &bob,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Bob cannot file an entry under Alice's category either.
    let (status, _) = json_request(
        &app,
        "POST",
        "/api/entries",
        &bob,
        Some(json!({
            "date": "2024-02-02",
            "product_or_service": "Sneaky",
            "revenue": 1.0,
            "cost": 0.0,
            "category_id": alice_category,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn listing_filters_and_paginates() {
    let app = common::setup_test_app().await.expect("setup");
    let cookie = signup_user(&app, "filters@example.com").await.expect("signup");
    let design = create_category(&app, &cookie, "Design", "income").await;
    let hosting = create_category(&app, &cookie, "Hosting", "expense").await;

    create_entry(&app, &cookie, "2024-01-10", 100.0, 0.0, &design).await;
    create_entry(&app, &cookie, "2024-02-10", 200.0, 0.0, &design).await;
    create_entry(&app, &cookie, "2024-03-10", 0.0, 50.0, &hosting).await;
    create_entry(&app, &cookie, "2024-04-10", 300.0, 0.0, &design).await;

    let (_, listed) = json_request(&app, "GET", "/api/entries", &cookie, None).await;
    let dates: Vec<&str> = listed["entries"]
        .as_array()
        .expect("entries")
        .iter()
        .filter_map(|e| e["date"].as_str())
        .collect();
    assert_eq!(dates, vec!["2024-04-10", "2024-03-10", "2024-02-10", "2024-01-10"]);

    let (_, ranged) = json_request(
        &app,
        "GET",
        "/api/entries?start_date=2024-02-01&end_date=2024-03-31",
        &cookie,
        None,
    )
    .await;
    assert_eq!(ranged["total_count"], 2);

    let (_, by_category) = json_request(
        &app,
        "GET",
        &format!("/api/entries?category_id={}", hosting),
        &cookie,
        None,
    )
    .await;
    assert_eq!(by_category["total_count"], 1);
    assert_eq!(by_category["entries"][0]["cost"], 50.0);

    let (_, page) = json_request(&app, "GET", "/api/entries?limit=2&offset=1", &cookie, None).await;
    assert_eq!(page["total_count"], 4);
    assert_eq!(page["entries"].as_array().map(Vec::len), Some(2));
    assert_eq!(page["entries"][0]["date"], "2024-03-10");

    let (_, transactions) = json_request(&app, "GET", "/api/transactions", &cookie, None).await;
    assert_eq!(transactions["total_count"], 4);
}

#[tokio::test]
async fn listing_rejects_bad_parameters() {
    let app = common::setup_test_app().await.expect("setup");
    let cookie = signup_user(&app, "params@example.com").await.expect("signup");

    for uri in [
        "/api/entries?limit=0",
        "/api/entries?limit=1001",
        "/api/entries?offset=1000001",
        "/api/entries?start_date=yesterday",
        "/api/entries?start_date=2024-05-01&end_date=2024-04-01",
    ] {
        let (status, body) = json_request(&app, "GET", uri, &cookie, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{} -> {}", uri, body);
    }
}

#[tokio::test]
async fn entries_require_a_session() {
    let app = common::setup_test_app().await.expect("setup");
    let (status, _, _) = common::send(&app, "GET", "/api/entries", None, None)
        .await
        .expect("request");
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
