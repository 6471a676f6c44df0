use axum::{
    Json,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
};
use tracing::info;

use crate::AppState;
use crate::auth::require_session;
use crate::constants::*;
use crate::models::{
    Category, CreateCategoryPayload, GetCategoriesQuery, GetCategoriesResponse,
    UpdateCategoryPayload,
};
use crate::store::{CategoryDraft, store_error};
use crate::utils::{validate_color, validate_string_length};

pub fn validate_category_name(name: &str) -> Result<(), (StatusCode, String)> {
    validate_string_length(name, "Category name", MAX_CATEGORY_NAME_LENGTH)
}

/// 409 when another of the user's categories already has `name`, ignoring case.
async fn ensure_name_available(
    app_state: &AppState,
    user_id: &str,
    name: &str,
    except_id: Option<&str>,
) -> Result<(), (StatusCode, String)> {
    let existing = app_state
        .store
        .list_categories(user_id)
        .await
        .map_err(store_error("Category"))?;

    let lowered = name.to_lowercase();
    let taken = existing
        .iter()
        .any(|c| Some(c.id.as_str()) != except_id && c.name.to_lowercase() == lowered);
    if taken {
        return Err((
            StatusCode::CONFLICT,
            "Category name already exists (case-insensitive)".to_string(),
        ));
    }
    Ok(())
}

pub async fn create_category(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<CreateCategoryPayload>,
) -> Result<(StatusCode, Json<Category>), (StatusCode, String)> {
    let claims = require_session(&app_state, &headers)?;
    validate_category_name(&payload.name)?;
    let color = payload
        .color
        .map(|c| c.trim().to_string())
        .unwrap_or_else(|| DEFAULT_CATEGORY_COLOR.to_string());
    validate_color(&color)?;

    let draft = CategoryDraft {
        name: payload.name.trim().to_string(),
        kind: payload.kind,
        color: Some(color),
    };
    ensure_name_available(&app_state, &claims.sub, &draft.name, None).await?;

    let category = app_state
        .store
        .create_category(&claims.sub, &draft)
        .await
        .map_err(store_error("Category"))?;

    info!(user_id = %claims.sub, category_id = %category.id, "category created");
    Ok((StatusCode::CREATED, Json(category)))
}

pub async fn get_categories(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<GetCategoriesQuery>,
) -> Result<(StatusCode, Json<GetCategoriesResponse>), (StatusCode, String)> {
    let claims = require_session(&app_state, &headers)?;

    let categories: Vec<Category> = app_state
        .store
        .list_categories(&claims.sub)
        .await
        .map_err(store_error("Category"))?
        .into_iter()
        .filter(|c| query.kind.is_none_or(|kind| c.kind == kind))
        .collect();

    Ok((
        StatusCode::OK,
        Json(GetCategoriesResponse {
            total_count: categories.len() as u32,
            categories,
        }),
    ))
}

pub async fn update_category(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    Path(category_id): Path<String>,
    Json(payload): Json<UpdateCategoryPayload>,
) -> Result<(StatusCode, Json<Category>), (StatusCode, String)> {
    let claims = require_session(&app_state, &headers)?;

    let existing = app_state
        .store
        .get_category(&claims.sub, &category_id)
        .await
        .map_err(store_error("Category"))?;

    let mut draft = CategoryDraft::from(&existing);
    if let Some(name) = payload.name {
        validate_category_name(&name)?;
        draft.name = name.trim().to_string();
    }
    if let Some(kind) = payload.kind {
        draft.kind = kind;
    }
    if let Some(color) = payload.color {
        let color = color.trim().to_string();
        validate_color(&color)?;
        draft.color = Some(color);
    }

    if !draft.name.eq_ignore_ascii_case(&existing.name) {
        ensure_name_available(&app_state, &claims.sub, &draft.name, Some(&category_id)).await?;
    }

    let category = app_state
        .store
        .update_category(&claims.sub, &category_id, &draft)
        .await
        .map_err(store_error("Category"))?;

    Ok((StatusCode::OK, Json(category)))
}

/// Entries pointing at a deleted category are reported as uncategorized.
pub async fn delete_category(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    Path(category_id): Path<String>,
) -> Result<StatusCode, (StatusCode, String)> {
    let claims = require_session(&app_state, &headers)?;

    app_state
        .store
        .delete_category(&claims.sub, &category_id)
        .await
        .map_err(store_error("Category"))?;

    info!(user_id = %claims.sub, category_id = %category_id, "category deleted");
    Ok(StatusCode::NO_CONTENT)
}
