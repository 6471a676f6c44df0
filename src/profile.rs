use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode},
};

use crate::AppState;
use crate::auth::require_session;
use crate::models::{EntryFilter, ProfileResponse};
use crate::store::store_error;

pub async fn get_profile(
    State(app_state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ProfileResponse>, (StatusCode, String)> {
    let claims = require_session(&app_state, &headers)?;
    let store = &app_state.store;
    let filter = EntryFilter::default();

    let (user, entries, categories, debts_credits) = tokio::try_join!(
        store.get_user(&claims.sub),
        store.list_entries(&claims.sub, &filter),
        store.list_categories(&claims.sub),
        store.list_debts_credits(&claims.sub),
    )
    .map_err(store_error("User"))?;

    Ok(Json(ProfileResponse {
        user,
        entry_count: entries.len(),
        category_count: categories.len(),
        debt_credit_count: debts_credits.len(),
    }))
}
