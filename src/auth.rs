use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode, header},
};
use serde_json::{Value, json};
use tracing::{info, warn};

use crate::AppState;
use crate::constants::*;
use crate::models::{CredentialsPayload, PublicUser};
use crate::session::SessionClaims;
use crate::store::{StoreError, store_error};
use crate::utils::bad_request;

type CookieResponse<T> = (StatusCode, [(header::HeaderName, String); 1], Json<T>);

/// Verified claims of the caller, or 401/403 when the cookie is missing or bad.
pub fn require_session(
    app_state: &AppState,
    headers: &HeaderMap,
) -> Result<SessionClaims, (StatusCode, String)> {
    app_state.sessions.authenticate(headers).map_err(Into::into)
}

/// Validated, normalised credentials.
#[derive(Debug, PartialEq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

pub fn validate_credentials(
    payload: CredentialsPayload,
    min_password_length: usize,
) -> Result<Credentials, (StatusCode, String)> {
    let email = payload
        .email
        .as_deref()
        .map(str::trim)
        .filter(|e| !e.is_empty());
    let password = payload.password.filter(|p| !p.is_empty());

    let (Some(email), Some(password)) = (email, password) else {
        return Err(bad_request("Email and password are required"));
    };

    if email.len() > MAX_EMAIL_LENGTH || !email.contains('@') {
        return Err(bad_request("Invalid email address"));
    }
    if password.len() < min_password_length {
        return Err(bad_request(format!(
            "Password must be at least {} characters",
            min_password_length
        )));
    }

    Ok(Credentials {
        email: email.to_lowercase(),
        password,
    })
}

fn issue_session(
    app_state: &AppState,
    status: StatusCode,
    user: PublicUser,
) -> CookieResponse<PublicUser> {
    let token = app_state.sessions.mint(&user.id, &user.email);
    let cookie = app_state.sessions.session_cookie(token);
    (status, [(header::SET_COOKIE, cookie)], Json(user))
}

pub async fn signup(
    State(app_state): State<AppState>,
    Json(payload): Json<CredentialsPayload>,
) -> Result<CookieResponse<PublicUser>, (StatusCode, String)> {
    let credentials = validate_credentials(payload, MIN_PASSWORD_LENGTH)?;

    let user = app_state
        .store
        .sign_up(&credentials.email, &credentials.password)
        .await
        .map_err(|e| {
            if matches!(e, StoreError::AlreadyRegistered) {
                info!(email = %credentials.email, "signup for existing account");
            }
            <(StatusCode, String)>::from(e)
        })?;

    info!(user_id = %user.id, "user signed up");
    Ok(issue_session(&app_state, StatusCode::CREATED, user))
}

pub async fn login(
    State(app_state): State<AppState>,
    Json(payload): Json<CredentialsPayload>,
) -> Result<CookieResponse<PublicUser>, (StatusCode, String)> {
    let credentials = validate_credentials(payload, 1)?;

    let user = app_state
        .store
        .sign_in(&credentials.email, &credentials.password)
        .await
        .map_err(|e| {
            if matches!(e, StoreError::InvalidCredentials) {
                warn!(email = %credentials.email, "failed login attempt");
            }
            <(StatusCode, String)>::from(e)
        })?;

    info!(user_id = %user.id, "user logged in");
    Ok(issue_session(&app_state, StatusCode::OK, user))
}

pub async fn logout(State(app_state): State<AppState>) -> CookieResponse<Value> {
    (
        StatusCode::OK,
        [(header::SET_COOKIE, app_state.sessions.removal_cookie())],
        Json(json!({ "message": "Logged out successfully" })),
    )
}

pub async fn me(
    State(app_state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<PublicUser>, (StatusCode, String)> {
    let claims = require_session(&app_state, &headers)?;
    let user = app_state
        .store
        .get_user(&claims.sub)
        .await
        .map_err(store_error("User"))?;
    Ok(Json(user))
}
