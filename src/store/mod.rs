//! Persistence and authentication backends.
//!
//! The relay talks to exactly one backend, picked from [`crate::config::Mode`]
//! at startup: the local libsql store used for demo mode, or Supabase.

mod demo_data;
mod local;
mod supabase;

use axum::http::StatusCode;
use thiserror::Error;
use tracing::error;

pub use local::LocalStore;
pub use supabase::SupabaseStore;

use crate::constants::*;
use crate::database::TransactionError;
use crate::models::{Category, DebtCredit, Entry, EntryFilter, PublicUser};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("user already registered")]
    AlreadyRegistered,
    #[error("record not found")]
    NotFound,
    #[error("remote service returned {status}: {message}")]
    Remote { status: u16, message: String },
    #[error("remote request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected payload: {0}")]
    Decode(String),
    #[error("database error: {0}")]
    Database(#[from] libsql::Error),
    #[error("password hashing failed: {0}")]
    PasswordHash(String),
    #[error("transaction failed: {0:?}")]
    Transaction(TransactionError),
}

impl From<TransactionError> for StoreError {
    fn from(e: TransactionError) -> Self {
        StoreError::Transaction(e)
    }
}

impl From<StoreError> for (StatusCode, String) {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                ERR_INVALID_CREDENTIALS.to_string(),
            ),
            StoreError::AlreadyRegistered => {
                (StatusCode::CONFLICT, ERR_ALREADY_REGISTERED.to_string())
            }
            StoreError::NotFound => (StatusCode::NOT_FOUND, "Not found".to_string()),
            StoreError::Remote { .. } | StoreError::Http(_) => {
                error!(error = %e, "remote service call failed");
                (StatusCode::INTERNAL_SERVER_ERROR, ERR_INTERNAL.to_string())
            }
            StoreError::Decode(_)
            | StoreError::Database(_)
            | StoreError::PasswordHash(_)
            | StoreError::Transaction(_) => {
                error!(error = %e, "store operation failed");
                (StatusCode::INTERNAL_SERVER_ERROR, ERR_INTERNAL.to_string())
            }
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Maps a store failure to a handler error, naming `what` when it was missing.
pub fn store_error(what: &'static str) -> impl FnOnce(StoreError) -> (StatusCode, String) {
    move |e| match e {
        StoreError::NotFound => (StatusCode::NOT_FOUND, format!("{} not found", what)),
        other => other.into(),
    }
}

/// Category fields written by create and update.
#[derive(Debug, Clone)]
pub struct CategoryDraft {
    pub name: String,
    pub kind: crate::models::CategoryType,
    pub color: Option<String>,
}

#[derive(Debug, Clone)]
pub struct EntryDraft {
    pub date: String,
    pub product_or_service: String,
    pub revenue: f64,
    pub cost: f64,
    pub category_id: String,
    pub notes: Option<String>,
}

#[derive(Debug, Clone)]
pub struct DebtCreditDraft {
    pub name: String,
    pub amount: f64,
    pub reason: String,
    pub date: String,
    pub due_date: String,
    pub status: crate::models::DebtStatus,
    pub kind: crate::models::DebtType,
}

impl From<&Category> for CategoryDraft {
    fn from(c: &Category) -> Self {
        Self {
            name: c.name.clone(),
            kind: c.kind,
            color: c.color.clone(),
        }
    }
}

impl From<&Entry> for EntryDraft {
    fn from(e: &Entry) -> Self {
        Self {
            date: e.date.clone(),
            product_or_service: e.product_or_service.clone(),
            revenue: e.revenue,
            cost: e.cost,
            category_id: e.category_id.clone(),
            notes: e.notes.clone(),
        }
    }
}

impl From<&DebtCredit> for DebtCreditDraft {
    fn from(d: &DebtCredit) -> Self {
        Self {
            name: d.name.clone(),
            amount: d.amount,
            reason: d.reason.clone(),
            date: d.date.clone(),
            due_date: d.due_date.clone(),
            status: d.status,
            kind: d.kind,
        }
    }
}

#[derive(Clone)]
pub enum Store {
    Local(LocalStore),
    Supabase(SupabaseStore),
}

macro_rules! dispatch {
    ($self:ident, $method:ident($($arg:expr),*)) => {
        match $self {
            Store::Local(store) => store.$method($($arg),*).await,
            Store::Supabase(store) => store.$method($($arg),*).await,
        }
    };
}

impl Store {
    pub fn mode_name(&self) -> &'static str {
        match self {
            Store::Local(_) => "demo",
            Store::Supabase(_) => "live",
        }
    }

    pub async fn sign_up(&self, email: &str, password: &str) -> StoreResult<PublicUser> {
        dispatch!(self, sign_up(email, password))
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> StoreResult<PublicUser> {
        dispatch!(self, sign_in(email, password))
    }

    pub async fn get_user(&self, user_id: &str) -> StoreResult<PublicUser> {
        dispatch!(self, get_user(user_id))
    }

    pub async fn list_categories(&self, user_id: &str) -> StoreResult<Vec<Category>> {
        dispatch!(self, list_categories(user_id))
    }

    pub async fn get_category(&self, user_id: &str, id: &str) -> StoreResult<Category> {
        dispatch!(self, get_category(user_id, id))
    }

    pub async fn create_category(
        &self,
        user_id: &str,
        draft: &CategoryDraft,
    ) -> StoreResult<Category> {
        dispatch!(self, create_category(user_id, draft))
    }

    pub async fn update_category(
        &self,
        user_id: &str,
        id: &str,
        draft: &CategoryDraft,
    ) -> StoreResult<Category> {
        dispatch!(self, update_category(user_id, id, draft))
    }

    pub async fn delete_category(&self, user_id: &str, id: &str) -> StoreResult<()> {
        dispatch!(self, delete_category(user_id, id))
    }

    /// Entries matching `filter`, newest date first.
    pub async fn list_entries(&self, user_id: &str, filter: &EntryFilter) -> StoreResult<Vec<Entry>> {
        dispatch!(self, list_entries(user_id, filter))
    }

    pub async fn get_entry(&self, user_id: &str, id: &str) -> StoreResult<Entry> {
        dispatch!(self, get_entry(user_id, id))
    }

    pub async fn create_entry(&self, user_id: &str, draft: &EntryDraft) -> StoreResult<Entry> {
        dispatch!(self, create_entry(user_id, draft))
    }

    pub async fn update_entry(
        &self,
        user_id: &str,
        id: &str,
        draft: &EntryDraft,
    ) -> StoreResult<Entry> {
        dispatch!(self, update_entry(user_id, id, draft))
    }

    pub async fn delete_entry(&self, user_id: &str, id: &str) -> StoreResult<()> {
        dispatch!(self, delete_entry(user_id, id))
    }

    /// Debts and credits ordered by due date.
    pub async fn list_debts_credits(&self, user_id: &str) -> StoreResult<Vec<DebtCredit>> {
        dispatch!(self, list_debts_credits(user_id))
    }

    pub async fn get_debt_credit(&self, user_id: &str, id: &str) -> StoreResult<DebtCredit> {
        dispatch!(self, get_debt_credit(user_id, id))
    }

    pub async fn create_debt_credit(
        &self,
        user_id: &str,
        draft: &DebtCreditDraft,
    ) -> StoreResult<DebtCredit> {
        dispatch!(self, create_debt_credit(user_id, draft))
    }

    pub async fn update_debt_credit(
        &self,
        user_id: &str,
        id: &str,
        draft: &DebtCreditDraft,
    ) -> StoreResult<DebtCredit> {
        dispatch!(self, update_debt_credit(user_id, id, draft))
    }

    pub async fn delete_debt_credit(&self, user_id: &str, id: &str) -> StoreResult<()> {
        dispatch!(self, delete_debt_credit(user_id, id))
    }
}
