#![allow(dead_code)]

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use rieno_server::{AppState, LocalStore, SessionSigner, Store, database, router};
use serde_json::Value;
use tower::util::ServiceExt;

pub const TEST_SECRET: &str = "test_secret_key_at_least_64_chars_long_test_secret_key_at_least_64_";
pub const TEST_PASSWORD: &str = "password123";

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub store: LocalStore,
    _data_dir: tempfile::TempDir,
}

pub async fn setup_test_app() -> anyhow::Result<TestApp> {
    let data_dir = tempfile::tempdir()?;
    let data_path = data_dir.path().to_string_lossy().to_string();

    let db = database::init_local_db(&data_path)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to initialize local database: {}", e))?;
    let store = LocalStore::new(db);

    let sessions = SessionSigner::new(TEST_SECRET, false).map_err(anyhow::Error::msg)?;
    let state = AppState::new(Store::Local(store.clone()), sessions);

    Ok(TestApp {
        router: router(state.clone()),
        state,
        store,
        _data_dir: data_dir,
    })
}

pub async fn send(
    app: &TestApp,
    method: &str,
    uri: &str,
    cookie: Option<&str>,
    body: Option<Value>,
) -> anyhow::Result<(StatusCode, axum::http::HeaderMap, String)> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(cookie) = cookie {
        builder = builder.header("cookie", cookie);
    }
    let request = builder
        .body(match body {
            Some(value) => Body::from(value.to_string()),
            None => Body::empty(),
        })
        .map_err(|e| anyhow::anyhow!("Failed to build request: {}", e))?;

    let response = app
        .router
        .clone()
        .oneshot(request)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to execute request: {}", e))?;

    let status = response.status();
    let headers = response.headers().clone();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to read response body: {}", e))?;
    Ok((status, headers, String::from_utf8(body.to_vec())?))
}

/// Sends a request and parses the body as JSON, falling back to a string value.
pub async fn json_request(
    app: &TestApp,
    method: &str,
    uri: &str,
    cookie: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let (status, _, text) = send(app, method, uri, Some(cookie), body)
        .await
        .expect("execute request");
    let value = serde_json::from_str(&text).unwrap_or(Value::String(text));
    (status, value)
}

/// `auth_token=<value>` pair from a response's `Set-Cookie` header.
pub fn session_cookie(headers: &axum::http::HeaderMap) -> Option<String> {
    headers
        .get("set-cookie")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(|pair| pair.trim().to_string())
}

pub async fn signup_user(app: &TestApp, email: &str) -> anyhow::Result<String> {
    let payload = serde_json::json!({ "email": email, "password": TEST_PASSWORD });
    let (status, headers, body) = send(app, "POST", "/auth/signup", None, Some(payload)).await?;
    if status != StatusCode::CREATED {
        anyhow::bail!("signup failed with {}: {}", status, body);
    }
    session_cookie(&headers).ok_or_else(|| anyhow::anyhow!("No session cookie in response"))
}

pub async fn create_category(app: &TestApp, cookie: &str, name: &str, kind: &str) -> String {
    let (status, body) = json_request(
        app,
        "POST",
        "/api/categories",
        cookie,
        Some(serde_json::json!({ "name": name, "type": kind })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "create category: {}", body);
    body["id"].as_str().expect("category id").to_string()
}

pub async fn create_entry(
    app: &TestApp,
    cookie: &str,
    date: &str,
    revenue: f64,
    cost: f64,
    category_id: &str,
) -> String {
    let (status, body) = json_request(
        app,
        "POST",
        "/api/entries",
        cookie,
        Some(serde_json::json!({
            "date": date,
            "product_or_service": format!("Work on {}", date),
            "revenue": revenue,
            "cost": cost,
            "category_id": category_id,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "create entry: {}", body);
    body["id"].as_str().expect("entry id").to_string()
}
