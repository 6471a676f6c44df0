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
    CreateDebtCreditPayload, DebtCredit, DebtStatus, DebtType, GetDebtsCreditsQuery,
    GetDebtsCreditsResponse, UpdateDebtCreditPayload,
};
use crate::store::{DebtCreditDraft, store_error};
use crate::utils::{bad_request, non_blank, validate_date, validate_string_length};

pub fn validate_debt_credit_draft(draft: &DebtCreditDraft) -> Result<(), (StatusCode, String)> {
    validate_string_length(&draft.name, "Name", MAX_DEBT_NAME_LENGTH)?;
    validate_string_length(&draft.reason, "Reason", MAX_DEBT_REASON_LENGTH)?;
    if !draft.amount.is_finite() || draft.amount <= 0.0 {
        return Err(bad_request("Amount must be greater than 0"));
    }
    validate_date(&draft.date, "Date")?;
    validate_date(&draft.due_date, "Due date")
}

/// Sum of unpaid amounts of one kind.
pub fn unpaid_total(items: &[DebtCredit], kind: DebtType) -> f64 {
    items
        .iter()
        .filter(|d| d.kind == kind && d.status == DebtStatus::Unpaid)
        .fold(0.0, |total, d| total + d.amount)
}

fn matches_query(item: &DebtCredit, query: &GetDebtsCreditsQuery, search: Option<&str>) -> bool {
    if query.kind.is_some_and(|kind| item.kind != kind) {
        return false;
    }
    if query.status.is_some_and(|status| item.status != status) {
        return false;
    }
    match search {
        Some(term) => {
            item.name.to_lowercase().contains(term) || item.reason.to_lowercase().contains(term)
        }
        None => true,
    }
}

pub async fn create_debt_credit(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<CreateDebtCreditPayload>,
) -> Result<(StatusCode, Json<DebtCredit>), (StatusCode, String)> {
    let claims = require_session(&app_state, &headers)?;

    let draft = DebtCreditDraft {
        name: payload.name.trim().to_string(),
        amount: payload.amount,
        reason: payload.reason.trim().to_string(),
        date: payload.date.trim().to_string(),
        due_date: payload.due_date.trim().to_string(),
        status: payload.status.unwrap_or(DebtStatus::Unpaid),
        kind: payload.kind,
    };
    validate_debt_credit_draft(&draft)?;

    let item = app_state
        .store
        .create_debt_credit(&claims.sub, &draft)
        .await
        .map_err(store_error("Debt/credit"))?;

    info!(user_id = %claims.sub, debt_credit_id = %item.id, kind = item.kind.as_str(), "debt/credit created");
    Ok((StatusCode::CREATED, Json(item)))
}

pub async fn get_debts_credits(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<GetDebtsCreditsQuery>,
) -> Result<(StatusCode, Json<GetDebtsCreditsResponse>), (StatusCode, String)> {
    let claims = require_session(&app_state, &headers)?;

    let search = non_blank(query.search.as_deref());
    if let Some(term) = &search {
        validate_string_length(term, "Search term", MAX_SEARCH_TERM_LENGTH)?;
    }
    let search = search.map(|term| term.to_lowercase());

    let all = app_state
        .store
        .list_debts_credits(&claims.sub)
        .await
        .map_err(store_error("Debt/credit"))?;

    let total_receivable = unpaid_total(&all, DebtType::Receivable);
    let total_payable = unpaid_total(&all, DebtType::Payable);
    let items = all
        .into_iter()
        .filter(|item| matches_query(item, &query, search.as_deref()))
        .collect();

    Ok((
        StatusCode::OK,
        Json(GetDebtsCreditsResponse {
            items,
            total_receivable,
            total_payable,
        }),
    ))
}

pub async fn update_debt_credit(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(payload): Json<UpdateDebtCreditPayload>,
) -> Result<(StatusCode, Json<DebtCredit>), (StatusCode, String)> {
    let claims = require_session(&app_state, &headers)?;

    let existing = app_state
        .store
        .get_debt_credit(&claims.sub, &id)
        .await
        .map_err(store_error("Debt/credit"))?;

    let mut draft = DebtCreditDraft::from(&existing);
    if let Some(name) = payload.name {
        draft.name = name.trim().to_string();
    }
    if let Some(amount) = payload.amount {
        draft.amount = amount;
    }
    if let Some(reason) = payload.reason {
        draft.reason = reason.trim().to_string();
    }
    if let Some(date) = payload.date {
        draft.date = date.trim().to_string();
    }
    if let Some(due_date) = payload.due_date {
        draft.due_date = due_date.trim().to_string();
    }
    if let Some(status) = payload.status {
        draft.status = status;
    }
    if let Some(kind) = payload.kind {
        draft.kind = kind;
    }
    validate_debt_credit_draft(&draft)?;

    let item = app_state
        .store
        .update_debt_credit(&claims.sub, &id, &draft)
        .await
        .map_err(store_error("Debt/credit"))?;

    Ok((StatusCode::OK, Json(item)))
}

/// Flips paid/unpaid.
pub async fn toggle_status(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<(StatusCode, Json<DebtCredit>), (StatusCode, String)> {
    let claims = require_session(&app_state, &headers)?;

    let existing = app_state
        .store
        .get_debt_credit(&claims.sub, &id)
        .await
        .map_err(store_error("Debt/credit"))?;

    let mut draft = DebtCreditDraft::from(&existing);
    draft.status = existing.status.toggled();

    let item = app_state
        .store
        .update_debt_credit(&claims.sub, &id, &draft)
        .await
        .map_err(store_error("Debt/credit"))?;

    info!(user_id = %claims.sub, debt_credit_id = %id, status = item.status.as_str(), "debt/credit status changed");
    Ok((StatusCode::OK, Json(item)))
}

pub async fn delete_debt_credit(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<StatusCode, (StatusCode, String)> {
    let claims = require_session(&app_state, &headers)?;

    app_state
        .store
        .delete_debt_credit(&claims.sub, &id)
        .await
        .map_err(store_error("Debt/credit"))?;

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(name: &str, amount: f64, status: DebtStatus, kind: DebtType) -> DebtCredit {
        DebtCredit {
            id: name.to_lowercase(),
            name: name.to_string(),
            amount,
            reason: format!("{} invoice", name),
            date: "2024-01-01".to_string(),
            due_date: "2024-02-01".to_string(),
            status,
            kind,
            user_id: "u1".to_string(),
            created_at: "2024-01-01T00:00:00Z".to_string(),
        }
    }

    #[test]
    fn unpaid_totals_ignore_paid_rows() {
        let items = vec![
            item("Acme", 100.0, DebtStatus::Unpaid, DebtType::Receivable),
            item("Bolt", 50.0, DebtStatus::Paid, DebtType::Receivable),
            item("Crane", 30.0, DebtStatus::Unpaid, DebtType::Payable),
        ];
        assert_eq!(unpaid_total(&items, DebtType::Receivable), 100.0);
        assert_eq!(unpaid_total(&items, DebtType::Payable), 30.0);
    }

    #[test]
    fn query_filters_by_kind_status_and_search() {
        let acme = item("Acme", 100.0, DebtStatus::Unpaid, DebtType::Receivable);
        let query = GetDebtsCreditsQuery {
            kind: Some(DebtType::Payable),
            ..Default::default()
        };
        assert!(!matches_query(&acme, &query, None));

        let query = GetDebtsCreditsQuery {
            status: Some(DebtStatus::Unpaid),
            ..Default::default()
        };
        assert!(matches_query(&acme, &query, Some("invoice")));
        assert!(!matches_query(&acme, &query, Some("zzz")));
    }

    #[test]
    fn amount_must_be_positive() {
        let mut draft = DebtCreditDraft::from(&item(
            "Acme",
            100.0,
            DebtStatus::Unpaid,
            DebtType::Receivable,
        ));
        assert!(validate_debt_credit_draft(&draft).is_ok());
        draft.amount = 0.0;
        assert!(validate_debt_credit_draft(&draft).is_err());
        draft.amount = 10.0;
        draft.due_date = "tomorrow".to_string();
        assert!(validate_debt_credit_draft(&draft).is_err());
    }
}
