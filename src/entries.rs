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
    CreateEntryPayload, Entry, EntryFilter, GetEntriesQuery, GetEntriesResponse,
    UpdateEntryPayload,
};
use crate::store::{EntryDraft, StoreError, store_error};
use crate::utils::{
    bad_request, non_blank, validate_amount, validate_date, validate_limit, validate_offset,
    validate_string_length,
};

pub fn validate_product_name(name: &str) -> Result<(), (StatusCode, String)> {
    validate_string_length(name, "Product or service", MAX_PRODUCT_NAME_LENGTH)
}

pub fn validate_notes(notes: Option<&str>) -> Result<(), (StatusCode, String)> {
    if let Some(notes) = notes
        && notes.len() > MAX_NOTES_LENGTH
    {
        return Err(bad_request(format!(
            "Notes must be less than {} characters",
            MAX_NOTES_LENGTH
        )));
    }
    Ok(())
}

pub fn validate_entry_draft(draft: &EntryDraft) -> Result<(), (StatusCode, String)> {
    validate_date(&draft.date, "Date")?;
    validate_product_name(&draft.product_or_service)?;
    validate_amount(draft.revenue, "Revenue")?;
    validate_amount(draft.cost, "Cost")?;
    if draft.category_id.trim().is_empty() {
        return Err(bad_request("Category is required"));
    }
    validate_notes(draft.notes.as_deref())
}

/// Rejects category ids that do not belong to the caller.
async fn ensure_category_exists(
    app_state: &AppState,
    user_id: &str,
    category_id: &str,
) -> Result<(), (StatusCode, String)> {
    match app_state.store.get_category(user_id, category_id).await {
        Ok(_) => Ok(()),
        Err(StoreError::NotFound) => Err(bad_request("Category does not exist")),
        Err(e) => Err(e.into()),
    }
}

pub async fn create_entry(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<CreateEntryPayload>,
) -> Result<(StatusCode, Json<Entry>), (StatusCode, String)> {
    let claims = require_session(&app_state, &headers)?;

    let draft = EntryDraft {
        date: payload.date.trim().to_string(),
        product_or_service: payload.product_or_service.trim().to_string(),
        revenue: payload.revenue,
        cost: payload.cost,
        category_id: payload.category_id.trim().to_string(),
        notes: non_blank(payload.notes.as_deref()),
    };
    validate_entry_draft(&draft)?;
    ensure_category_exists(&app_state, &claims.sub, &draft.category_id).await?;

    let entry = app_state
        .store
        .create_entry(&claims.sub, &draft)
        .await
        .map_err(store_error("Entry"))?;

    info!(user_id = %claims.sub, entry_id = %entry.id, "entry created");
    Ok((StatusCode::CREATED, Json(entry)))
}

pub async fn get_entries(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<GetEntriesQuery>,
) -> Result<(StatusCode, Json<GetEntriesResponse>), (StatusCode, String)> {
    let claims = require_session(&app_state, &headers)?;
    let limit = validate_limit(query.limit, DEFAULT_ENTRIES_LIMIT)?;
    let offset = validate_offset(query.offset)?;

    let start_date = non_blank(query.start_date.as_deref());
    let end_date = non_blank(query.end_date.as_deref());
    if let Some(start) = &start_date {
        validate_date(start, "Start date")?;
    }
    if let Some(end) = &end_date {
        validate_date(end, "End date")?;
    }
    if let (Some(start), Some(end)) = (&start_date, &end_date)
        && start > end
    {
        return Err(bad_request("Start date must not be after end date"));
    }

    let filter = EntryFilter {
        start_date,
        end_date,
        category_id: non_blank(query.category_id.as_deref()),
    };

    let all = app_state
        .store
        .list_entries(&claims.sub, &filter)
        .await
        .map_err(store_error("Entry"))?;

    let total_count = all.len() as u32;
    let entries = all
        .into_iter()
        .skip(offset as usize)
        .take(limit as usize)
        .collect();

    Ok((
        StatusCode::OK,
        Json(GetEntriesResponse {
            entries,
            total_count,
        }),
    ))
}

pub async fn update_entry(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    Path(entry_id): Path<String>,
    Json(payload): Json<UpdateEntryPayload>,
) -> Result<(StatusCode, Json<Entry>), (StatusCode, String)> {
    let claims = require_session(&app_state, &headers)?;

    let existing = app_state
        .store
        .get_entry(&claims.sub, &entry_id)
        .await
        .map_err(store_error("Entry"))?;

    let mut draft = EntryDraft::from(&existing);
    if let Some(date) = payload.date {
        draft.date = date.trim().to_string();
    }
    if let Some(name) = payload.product_or_service {
        draft.product_or_service = name.trim().to_string();
    }
    if let Some(revenue) = payload.revenue {
        draft.revenue = revenue;
    }
    if let Some(cost) = payload.cost {
        draft.cost = cost;
    }
    if let Some(category_id) = payload.category_id {
        draft.category_id = category_id.trim().to_string();
    }
    if let Some(notes) = payload.notes {
        draft.notes = non_blank(Some(&notes));
    }
    validate_entry_draft(&draft)?;

    if draft.category_id != existing.category_id {
        ensure_category_exists(&app_state, &claims.sub, &draft.category_id).await?;
    }

    let entry = app_state
        .store
        .update_entry(&claims.sub, &entry_id, &draft)
        .await
        .map_err(store_error("Entry"))?;

    Ok((StatusCode::OK, Json(entry)))
}

pub async fn delete_entry(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    Path(entry_id): Path<String>,
) -> Result<StatusCode, (StatusCode, String)> {
    let claims = require_session(&app_state, &headers)?;

    app_state
        .store
        .delete_entry(&claims.sub, &entry_id)
        .await
        .map_err(store_error("Entry"))?;

    info!(user_id = %claims.sub, entry_id = %entry_id, "entry deleted");
    Ok(StatusCode::NO_CONTENT)
}
