use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::{Value, json};
use tracing::{debug, warn};

use super::{CategoryDraft, DebtCreditDraft, EntryDraft, StoreError, StoreResult};
use crate::models::{Category, DebtCredit, Entry, EntryFilter, PublicUser};

const CATEGORIES_TABLE: &str = "categories";
const ENTRIES_TABLE: &str = "entries";
const DEBTS_CREDITS_TABLE: &str = "debts_credits";

/// Supabase auth (GoTrue) and REST (PostgREST) client authenticated with the
/// service-role key. Row ownership is enforced here with `user_id` filters.
#[derive(Clone)]
pub struct SupabaseStore {
    http: Client,
    base_url: String,
    service_role_key: String,
}

#[derive(Deserialize)]
struct AuthUser {
    id: String,
    email: Option<String>,
    created_at: Option<String>,
}

impl From<AuthUser> for PublicUser {
    fn from(user: AuthUser) -> Self {
        PublicUser {
            id: user.id,
            email: user.email.unwrap_or_default(),
            created_at: user.created_at.unwrap_or_default(),
        }
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    user: AuthUser,
}

#[derive(Serialize)]
struct CategoryRow<'a> {
    name: &'a str,
    #[serde(rename = "type")]
    kind: &'static str,
    color: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_id: Option<&'a str>,
}

#[derive(Serialize)]
struct EntryRow<'a> {
    date: &'a str,
    product_or_service: &'a str,
    revenue: f64,
    cost: f64,
    category_id: &'a str,
    notes: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_id: Option<&'a str>,
}

#[derive(Serialize)]
struct DebtCreditRow<'a> {
    name: &'a str,
    amount: f64,
    reason: &'a str,
    date: &'a str,
    due_date: &'a str,
    status: &'static str,
    #[serde(rename = "type")]
    kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_id: Option<&'a str>,
}

fn category_row<'a>(draft: &'a CategoryDraft, user_id: Option<&'a str>) -> CategoryRow<'a> {
    CategoryRow {
        name: &draft.name,
        kind: draft.kind.as_str(),
        color: draft.color.as_deref(),
        user_id,
    }
}

fn entry_row<'a>(draft: &'a EntryDraft, user_id: Option<&'a str>) -> EntryRow<'a> {
    EntryRow {
        date: &draft.date,
        product_or_service: &draft.product_or_service,
        revenue: draft.revenue,
        cost: draft.cost,
        category_id: &draft.category_id,
        notes: draft.notes.as_deref(),
        user_id,
    }
}

fn debt_credit_row<'a>(draft: &'a DebtCreditDraft, user_id: Option<&'a str>) -> DebtCreditRow<'a> {
    DebtCreditRow {
        name: &draft.name,
        amount: draft.amount,
        reason: &draft.reason,
        date: &draft.date,
        due_date: &draft.due_date,
        status: draft.status.as_str(),
        kind: draft.kind.as_str(),
        user_id,
    }
}

/// Pulls a human-readable message out of a GoTrue or PostgREST error body.
fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| {
            ["msg", "message", "error_description", "error"]
                .iter()
                .find_map(|key| value.get(*key).and_then(Value::as_str).map(str::to_string))
        })
        .unwrap_or_else(|| body.to_string())
}

async fn remote_error(response: Response) -> StoreError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    StoreError::Remote {
        status,
        message: error_message(&body),
    }
}

fn eq(value: &str) -> String {
    format!("eq.{}", value)
}

impl SupabaseStore {
    pub fn new(http: Client, base_url: &str, service_role_key: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            service_role_key: service_role_key.to_string(),
        }
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("apikey", &self.service_role_key)
            .bearer_auth(&self.service_role_key)
    }

    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.base_url, path)
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> StoreResult<T> {
        if !response.status().is_success() {
            return Err(remote_error(response).await);
        }
        response
            .json()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))
    }

    /// Expects a `return=representation` body holding exactly one row.
    async fn single_row<T: DeserializeOwned>(response: Response) -> StoreResult<T> {
        let rows: Vec<T> = Self::decode(response).await?;
        rows.into_iter().next().ok_or(StoreError::NotFound)
    }

    pub async fn sign_up(&self, email: &str, password: &str) -> StoreResult<PublicUser> {
        let response = self
            .authorized(self.http.post(self.auth_url("signup")))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;

        if !response.status().is_success() {
            let err = remote_error(response).await;
            if let StoreError::Remote { message, .. } = &err
                && message.to_lowercase().contains("already registered")
            {
                return Err(StoreError::AlreadyRegistered);
            }
            return Err(err);
        }

        // With email confirmation on, signup returns the bare user instead of a session.
        let mut body: Value = response
            .json()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))?;
        let user_value = if body.get("user").is_some() {
            body["user"].take()
        } else {
            body
        };
        let user: AuthUser =
            serde_json::from_value(user_value).map_err(|e| StoreError::Decode(e.to_string()))?;
        debug!(user_id = %user.id, "remote signup succeeded");
        Ok(user.into())
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> StoreResult<PublicUser> {
        let response = self
            .authorized(self.http.post(self.auth_url("token")))
            .query(&[("grant_type", "password")])
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;

        match response.status() {
            StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED => {
                let err = remote_error(response).await;
                warn!(error = %err, "remote sign-in rejected");
                Err(StoreError::InvalidCredentials)
            }
            _ => {
                let token: TokenResponse = Self::decode(response).await?;
                Ok(token.user.into())
            }
        }
    }

    pub async fn get_user(&self, user_id: &str) -> StoreResult<PublicUser> {
        let response = self
            .authorized(
                self.http
                    .get(self.auth_url(&format!("admin/users/{}", user_id))),
            )
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(StoreError::NotFound);
        }
        let user: AuthUser = Self::decode(response).await?;
        Ok(user.into())
    }

    async fn list_rows<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &[(&str, String)],
    ) -> StoreResult<Vec<T>> {
        let response = self
            .authorized(self.http.get(self.table_url(table)))
            .query(&[("select", "*")])
            .query(query)
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn get_row<T: DeserializeOwned>(&self, table: &str, user_id: &str, id: &str) -> StoreResult<T> {
        let rows: Vec<T> = self
            .list_rows(table, &[("id", eq(id)), ("user_id", eq(user_id))])
            .await?;
        rows.into_iter().next().ok_or(StoreError::NotFound)
    }

    async fn insert_row<B: Serialize, T: DeserializeOwned>(&self, table: &str, row: &B) -> StoreResult<T> {
        let response = self
            .authorized(self.http.post(self.table_url(table)))
            .header("Prefer", "return=representation")
            .json(row)
            .send()
            .await?;
        Self::single_row(response).await
    }

    async fn update_row<B: Serialize, T: DeserializeOwned>(
        &self,
        table: &str,
        user_id: &str,
        id: &str,
        row: &B,
    ) -> StoreResult<T> {
        let response = self
            .authorized(self.http.patch(self.table_url(table)))
            .query(&[("id", eq(id)), ("user_id", eq(user_id))])
            .header("Prefer", "return=representation")
            .json(row)
            .send()
            .await?;
        Self::single_row(response).await
    }

    async fn delete_row(&self, table: &str, user_id: &str, id: &str) -> StoreResult<()> {
        let response = self
            .authorized(self.http.delete(self.table_url(table)))
            .query(&[("id", eq(id)), ("user_id", eq(user_id))])
            .header("Prefer", "return=representation")
            .send()
            .await?;
        let _: Value = Self::single_row(response).await?;
        Ok(())
    }

    pub async fn list_categories(&self, user_id: &str) -> StoreResult<Vec<Category>> {
        self.list_rows(
            CATEGORIES_TABLE,
            &[("user_id", eq(user_id)), ("order", "name.asc".to_string())],
        )
        .await
    }

    pub async fn get_category(&self, user_id: &str, id: &str) -> StoreResult<Category> {
        self.get_row(CATEGORIES_TABLE, user_id, id).await
    }

    pub async fn create_category(&self, user_id: &str, draft: &CategoryDraft) -> StoreResult<Category> {
        self.insert_row(CATEGORIES_TABLE, &category_row(draft, Some(user_id)))
            .await
    }

    pub async fn update_category(
        &self,
        user_id: &str,
        id: &str,
        draft: &CategoryDraft,
    ) -> StoreResult<Category> {
        self.update_row(CATEGORIES_TABLE, user_id, id, &category_row(draft, None))
            .await
    }

    pub async fn delete_category(&self, user_id: &str, id: &str) -> StoreResult<()> {
        self.delete_row(CATEGORIES_TABLE, user_id, id).await
    }

    pub async fn list_entries(&self, user_id: &str, filter: &EntryFilter) -> StoreResult<Vec<Entry>> {
        let mut query = vec![
            ("user_id", eq(user_id)),
            ("order", "date.desc,created_at.desc".to_string()),
        ];
        if let Some(start_date) = &filter.start_date {
            query.push(("date", format!("gte.{}", start_date)));
        }
        if let Some(end_date) = &filter.end_date {
            query.push(("date", format!("lte.{}", end_date)));
        }
        if let Some(category_id) = &filter.category_id {
            query.push(("category_id", eq(category_id)));
        }
        self.list_rows(ENTRIES_TABLE, &query).await
    }

    pub async fn get_entry(&self, user_id: &str, id: &str) -> StoreResult<Entry> {
        self.get_row(ENTRIES_TABLE, user_id, id).await
    }

    pub async fn create_entry(&self, user_id: &str, draft: &EntryDraft) -> StoreResult<Entry> {
        self.insert_row(ENTRIES_TABLE, &entry_row(draft, Some(user_id)))
            .await
    }

    pub async fn update_entry(&self, user_id: &str, id: &str, draft: &EntryDraft) -> StoreResult<Entry> {
        self.update_row(ENTRIES_TABLE, user_id, id, &entry_row(draft, None))
            .await
    }

    pub async fn delete_entry(&self, user_id: &str, id: &str) -> StoreResult<()> {
        self.delete_row(ENTRIES_TABLE, user_id, id).await
    }

    pub async fn list_debts_credits(&self, user_id: &str) -> StoreResult<Vec<DebtCredit>> {
        self.list_rows(
            DEBTS_CREDITS_TABLE,
            &[
                ("user_id", eq(user_id)),
                ("order", "due_date.asc,created_at.asc".to_string()),
            ],
        )
        .await
    }

    pub async fn get_debt_credit(&self, user_id: &str, id: &str) -> StoreResult<DebtCredit> {
        self.get_row(DEBTS_CREDITS_TABLE, user_id, id).await
    }

    pub async fn create_debt_credit(
        &self,
        user_id: &str,
        draft: &DebtCreditDraft,
    ) -> StoreResult<DebtCredit> {
        self.insert_row(DEBTS_CREDITS_TABLE, &debt_credit_row(draft, Some(user_id)))
            .await
    }

    pub async fn update_debt_credit(
        &self,
        user_id: &str,
        id: &str,
        draft: &DebtCreditDraft,
    ) -> StoreResult<DebtCredit> {
        self.update_row(DEBTS_CREDITS_TABLE, user_id, id, &debt_credit_row(draft, None))
            .await
    }

    pub async fn delete_debt_credit(&self, user_id: &str, id: &str) -> StoreResult<()> {
        self.delete_row(DEBTS_CREDITS_TABLE, user_id, id).await
    }
}
