mod common;

use axum::http::StatusCode;
use serde_json::{Value, json};

use common::{TestApp, json_request, signup_user};

async fn create_item(app: &TestApp, cookie: &str, payload: Value) -> Value {
    let (status, body) = json_request(app, "POST", "/api/debts-credits", cookie, Some(payload)).await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    body
}

fn receivable(name: &str, amount: f64) -> Value {
    json!({
        "name": name,
        "amount": amount,
        "reason": "Website development project",
        "date": "2024-01-15",
        "due_date": "2024-02-15",
        "type": "receivable",
    })
}

#[tokio::test]
async fn create_defaults_to_unpaid_and_totals_unpaid_rows() {
    let app = common::setup_test_app().await.expect("setup");
    let cookie = signup_user(&app, "debts@example.com").await.expect("signup");

    let created = create_item(&app, &cookie, receivable("ABC Corp", 2500.0)).await;
    assert_eq!(created["status"], "unpaid");
    assert_eq!(created["type"], "receivable");

    let mut paid = receivable("John Smith", 800.0);
    paid["status"] = json!("paid");
    create_item(&app, &cookie, paid).await;

    create_item(
        &app,
        &cookie,
        json!({
            "name": "Software Vendor",
            "amount": 299.0,
            "reason": "Annual software license",
            "date": "2024-01-10",
            "due_date": "2024-02-10",
            "type": "payable",
        }),
    )
    .await;

    let (status, listed) = json_request(&app, "GET", "/api/debts-credits", &cookie, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed["items"].as_array().map(Vec::len), Some(3));
    assert_eq!(listed["total_receivable"], 2500.0);
    assert_eq!(listed["total_payable"], 299.0);
    assert_eq!(listed["items"][0]["name"], "Software Vendor");
}

#[tokio::test]
async fn filters_do_not_change_totals() {
    let app = common::setup_test_app().await.expect("setup");
    let cookie = signup_user(&app, "filter@example.com").await.expect("signup");
    create_item(&app, &cookie, receivable("ABC Corp", 100.0)).await;
    create_item(&app, &cookie, receivable("Globex", 50.0)).await;

    let (_, filtered) = json_request(
        &app,
        "GET",
        "/api/debts-credits?type=receivable&status=unpaid&search=globex",
        &cookie,
        None,
    )
    .await;
    assert_eq!(filtered["items"].as_array().map(Vec::len), Some(1));
    assert_eq!(filtered["items"][0]["name"], "Globex");
    assert_eq!(filtered["total_receivable"], 150.0);

    let (_, payables) =
        json_request(&app, "GET", "/api/debts-credits?type=payable", &cookie, None).await;
    assert_eq!(payables["items"].as_array().map(Vec::len), Some(0));
}

#[tokio::test]
async fn toggle_flips_status_both_ways() {
    let app = common::setup_test_app().await.expect("setup");
    let cookie = signup_user(&app, "toggle@example.com").await.expect("signup");
    let created = create_item(&app, &cookie, receivable("ABC Corp", 100.0)).await;
    let uri = format!("/api/debts-credits/{}/status", created["id"].as_str().expect("id"));

    let (status, toggled) = json_request(&app, "PUT", &uri, &cookie, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(toggled["status"], "paid");

    let (_, listed) = json_request(&app, "GET", "/api/debts-credits", &cookie, None).await;
    assert_eq!(listed["total_receivable"], 0.0);

    let (_, toggled) = json_request(&app, "PUT", &uri, &cookie, None).await;
    assert_eq!(toggled["status"], "unpaid");
}

#[tokio::test]
async fn update_and_delete() {
    let app = common::setup_test_app().await.expect("setup");
    let cookie = signup_user(&app, "update@example.com").await.expect("signup");
    let created = create_item(&app, &cookie, receivable("ABC Corp", 100.0)).await;
    let uri = format!("/api/debts-credits/{}", created["id"].as_str().expect("id"));

    let (status, updated) = json_request(
        &app,
        "PUT",
        &uri,
        &cookie,
        Some(json!({ "amount": 175.5, "type": "payable" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", updated);
    assert_eq!(updated["amount"], 175.5);
    assert_eq!(updated["type"], "payable");
    assert_eq!(updated["name"], "ABC Corp");

    let (status, _) = json_request(&app, "PUT", &uri, &cookie, Some(json!({ "amount": 0.0 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = json_request(&app, "DELETE", &uri, &cookie, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = json_request(&app, "DELETE", &uri, &cookie, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, "Debt/credit not found");
}

#[tokio::test]
async fn rejects_invalid_items() {
    let app = common::setup_test_app().await.expect("setup");
    let cookie = signup_user(&app, "invalid-debt@example.com").await.expect("signup");

    for (field, value) in [
        ("amount", json!(-10.0)),
        ("amount", json!(0.0)),
        ("name", json!("  ")),
        ("reason", json!("")),
        ("due_date", json!("next week")),
    ] {
        let mut payload = receivable("ABC Corp", 100.0);
        payload[field] = value;
        let (status, body) =
            json_request(&app, "POST", "/api/debts-credits", &cookie, Some(payload)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{} -> {}", field, body);
    }
}

#[tokio::test]
async fn items_are_scoped_to_their_owner() {
    let app = common::setup_test_app().await.expect("setup");
    let owner = signup_user(&app, "lender@example.com").await.expect("signup");
    let other = signup_user(&app, "borrower@example.com").await.expect("signup");
    let created = create_item(&app, &owner, receivable("ABC Corp", 100.0)).await;
    let id = created["id"].as_str().expect("id");

    let (_, listed) = json_request(&app, "GET", "/api/debts-credits", &other, None).await;
    assert_eq!(listed["items"].as_array().map(Vec::len), Some(0));
    assert_eq!(listed["total_receivable"], 0.0);

    let (status, _) = json_request(
        &app,
        "PUT",
        &format!("/api/debts-credits/{}/status", id),
        &other,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
