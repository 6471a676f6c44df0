use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
};
use password_hash::rand_core::OsRng;
use tracing::info;
use uuid::Uuid;

use super::{CategoryDraft, DebtCreditDraft, EntryDraft, StoreError, StoreResult, demo_data};
use crate::constants::DEMO_USER_EMAIL;
use crate::database::{Db, with_transaction};
use crate::models::{
    Category, CategoryType, DebtCredit, DebtStatus, DebtType, Entry, EntryFilter, PublicUser,
};
use crate::utils::now_timestamp;

const CATEGORY_COLUMNS: &str = "id, name, type, color, user_id, created_at";
const ENTRY_COLUMNS: &str =
    "id, date, product_or_service, revenue, cost, category_id, notes, user_id, created_at";
const DEBT_CREDIT_COLUMNS: &str =
    "id, name, amount, reason, date, due_date, status, type, user_id, created_at";

/// libsql-backed store; every query is scoped by `user_id`.
#[derive(Clone)]
pub struct LocalStore {
    db: Db,
}

fn decode_error(what: &str) -> StoreError {
    StoreError::Decode(format!("invalid {} data", what))
}

fn extract_user_from_row(row: libsql::Row) -> StoreResult<(PublicUser, String)> {
    let id: String = row.get(0)?;
    let email: String = row.get(1)?;
    let password_hash: String = row.get(2)?;
    let created_at: String = row.get(3)?;
    Ok((
        PublicUser {
            id,
            email,
            created_at,
        },
        password_hash,
    ))
}

fn extract_category_from_row(row: libsql::Row) -> StoreResult<Category> {
    let kind: String = row.get(2)?;
    Ok(Category {
        id: row.get(0)?,
        name: row.get(1)?,
        kind: CategoryType::parse(&kind).ok_or_else(|| decode_error("category"))?,
        color: row.get(3)?,
        user_id: row.get(4)?,
        created_at: row.get(5)?,
    })
}

fn extract_entry_from_row(row: libsql::Row) -> StoreResult<Entry> {
    Ok(Entry {
        id: row.get(0)?,
        date: row.get(1)?,
        product_or_service: row.get(2)?,
        revenue: row.get(3)?,
        cost: row.get(4)?,
        category_id: row.get(5)?,
        notes: row.get(6)?,
        user_id: row.get(7)?,
        created_at: row.get(8)?,
    })
}

fn extract_debt_credit_from_row(row: libsql::Row) -> StoreResult<DebtCredit> {
    let status: String = row.get(6)?;
    let kind: String = row.get(7)?;
    Ok(DebtCredit {
        id: row.get(0)?,
        name: row.get(1)?,
        amount: row.get(2)?,
        reason: row.get(3)?,
        date: row.get(4)?,
        due_date: row.get(5)?,
        status: DebtStatus::parse(&status).ok_or_else(|| decode_error("debt/credit"))?,
        kind: DebtType::parse(&kind).ok_or_else(|| decode_error("debt/credit"))?,
        user_id: row.get(8)?,
        created_at: row.get(9)?,
    })
}

fn hash_password(password: &str) -> StoreResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| StoreError::PasswordHash(e.to_string()))
}

fn verify_password(password: &str, hash: &str) -> StoreResult<bool> {
    let parsed = PasswordHash::new(hash).map_err(|e| StoreError::PasswordHash(e.to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

impl LocalStore {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// Creates the demo account and fills in its sample rows when it has none.
    pub async fn seed_demo(&self, password: &str) -> StoreResult<PublicUser> {
        let user = match self.find_user_by_email(DEMO_USER_EMAIL).await? {
            Some((user, _)) => {
                if !self.list_categories(&user.id).await?.is_empty() {
                    return Ok(user);
                }
                user
            }
            None => self.sign_up(DEMO_USER_EMAIL, password).await?,
        };
        let user_id = user.id.clone();
        let created_at = now_timestamp();

        with_transaction(&self.db, |conn| {
            Box::pin(async move {
                let mut category_ids = Vec::new();
                for seed in demo_data::categories() {
                    let id = Uuid::new_v4().to_string();
                    conn.execute(
                        "INSERT INTO categories (id, name, type, color, user_id, created_at) VALUES (?, ?, ?, ?, ?, ?)",
                        (
                            id.as_str(),
                            seed.name,
                            seed.kind.as_str(),
                            seed.color,
                            user_id.as_str(),
                            created_at.as_str(),
                        ),
                    )
                    .await?;
                    category_ids.push(id);
                }

                for seed in demo_data::entries(crate::utils::today()) {
                    conn.execute(
                        "INSERT INTO entries (id, date, product_or_service, revenue, cost, category_id, notes, user_id, created_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
                        (
                            Uuid::new_v4().to_string(),
                            seed.date,
                            seed.product_or_service,
                            seed.revenue,
                            seed.cost,
                            category_ids[seed.category_index].as_str(),
                            seed.notes,
                            user_id.as_str(),
                            created_at.as_str(),
                        ),
                    )
                    .await?;
                }

                for seed in demo_data::debts_credits() {
                    conn.execute(
                        "INSERT INTO debts_credits (id, name, amount, reason, date, due_date, status, type, user_id, created_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                        (
                            Uuid::new_v4().to_string(),
                            seed.name,
                            seed.amount,
                            seed.reason,
                            seed.date,
                            seed.due_date,
                            seed.status.as_str(),
                            seed.kind.as_str(),
                            user_id.as_str(),
                            created_at.as_str(),
                        ),
                    )
                    .await?;
                }

                Ok::<(), StoreError>(())
            })
        })
        .await?;

        info!(email = %user.email, "seeded demo account");
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<(PublicUser, String)>> {
        let conn = self.db.read().await;
        let mut rows = conn
            .query(
                "SELECT id, email, password_hash, created_at FROM users WHERE email = ?",
                [email],
            )
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(extract_user_from_row(row)?)),
            None => Ok(None),
        }
    }

    pub async fn sign_up(&self, email: &str, password: &str) -> StoreResult<PublicUser> {
        if self.find_user_by_email(email).await?.is_some() {
            return Err(StoreError::AlreadyRegistered);
        }

        let password_hash = hash_password(password)?;
        let user = PublicUser {
            id: Uuid::new_v4().to_string(),
            email: email.to_string(),
            created_at: now_timestamp(),
        };

        let conn = self.db.write().await;
        conn.execute(
            "INSERT INTO users (id, email, password_hash, created_at) VALUES (?, ?, ?, ?)",
            (
                user.id.as_str(),
                user.email.as_str(),
                password_hash.as_str(),
                user.created_at.as_str(),
            ),
        )
        .await
        .map_err(|e| {
            // Lost a race with a concurrent signup for the same email.
            if e.to_string().contains("UNIQUE") {
                StoreError::AlreadyRegistered
            } else {
                StoreError::Database(e)
            }
        })?;

        Ok(user)
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> StoreResult<PublicUser> {
        let (user, password_hash) = self
            .find_user_by_email(email)
            .await?
            .ok_or(StoreError::InvalidCredentials)?;

        if !verify_password(password, &password_hash)? {
            return Err(StoreError::InvalidCredentials);
        }
        Ok(user)
    }

    pub async fn get_user(&self, user_id: &str) -> StoreResult<PublicUser> {
        let conn = self.db.read().await;
        let mut rows = conn
            .query(
                "SELECT id, email, password_hash, created_at FROM users WHERE id = ?",
                [user_id],
            )
            .await?;
        let row = rows.next().await?.ok_or(StoreError::NotFound)?;
        Ok(extract_user_from_row(row)?.0)
    }

    pub async fn list_categories(&self, user_id: &str) -> StoreResult<Vec<Category>> {
        let conn = self.db.read().await;
        let mut rows = conn
            .query(
                &format!(
                    "SELECT {} FROM categories WHERE user_id = ? ORDER BY name COLLATE NOCASE ASC",
                    CATEGORY_COLUMNS
                ),
                [user_id],
            )
            .await?;

        let mut categories = Vec::new();
        while let Some(row) = rows.next().await? {
            categories.push(extract_category_from_row(row)?);
        }
        Ok(categories)
    }

    pub async fn get_category(&self, user_id: &str, id: &str) -> StoreResult<Category> {
        let conn = self.db.read().await;
        let mut rows = conn
            .query(
                &format!(
                    "SELECT {} FROM categories WHERE id = ? AND user_id = ?",
                    CATEGORY_COLUMNS
                ),
                (id, user_id),
            )
            .await?;
        let row = rows.next().await?.ok_or(StoreError::NotFound)?;
        extract_category_from_row(row)
    }

    pub async fn create_category(
        &self,
        user_id: &str,
        draft: &CategoryDraft,
    ) -> StoreResult<Category> {
        let category = Category {
            id: Uuid::new_v4().to_string(),
            name: draft.name.clone(),
            kind: draft.kind,
            color: draft.color.clone(),
            user_id: user_id.to_string(),
            created_at: now_timestamp(),
        };

        let conn = self.db.write().await;
        conn.execute(
            "INSERT INTO categories (id, name, type, color, user_id, created_at) VALUES (?, ?, ?, ?, ?, ?)",
            (
                category.id.as_str(),
                category.name.as_str(),
                category.kind.as_str(),
                category.color.as_deref(),
                category.user_id.as_str(),
                category.created_at.as_str(),
            ),
        )
        .await?;

        Ok(category)
    }

    pub async fn update_category(
        &self,
        user_id: &str,
        id: &str,
        draft: &CategoryDraft,
    ) -> StoreResult<Category> {
        let affected_rows = {
            let conn = self.db.write().await;
            conn.execute(
                "UPDATE categories SET name = ?, type = ?, color = ? WHERE id = ? AND user_id = ?",
                (
                    draft.name.as_str(),
                    draft.kind.as_str(),
                    draft.color.as_deref(),
                    id,
                    user_id,
                ),
            )
            .await?
        };

        if affected_rows == 0 {
            return Err(StoreError::NotFound);
        }
        self.get_category(user_id, id).await
    }

    pub async fn delete_category(&self, user_id: &str, id: &str) -> StoreResult<()> {
        let conn = self.db.write().await;
        let affected_rows = conn
            .execute(
                "DELETE FROM categories WHERE id = ? AND user_id = ?",
                (id, user_id),
            )
            .await?;

        if affected_rows == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    pub async fn list_entries(&self, user_id: &str, filter: &EntryFilter) -> StoreResult<Vec<Entry>> {
        let start_date = filter.start_date.as_deref().unwrap_or("0000-01-01");
        let end_date = filter.end_date.as_deref().unwrap_or("9999-12-31");

        let conn = self.db.read().await;
        let mut rows = match filter.category_id.as_deref() {
            Some(category_id) => {
                conn.query(
                    &format!(
                        "SELECT {} FROM entries WHERE user_id = ? AND date BETWEEN ? AND ? AND category_id = ? ORDER BY date DESC, created_at DESC",
                        ENTRY_COLUMNS
                    ),
                    (user_id, start_date, end_date, category_id),
                )
                .await?
            }
            None => {
                conn.query(
                    &format!(
                        "SELECT {} FROM entries WHERE user_id = ? AND date BETWEEN ? AND ? ORDER BY date DESC, created_at DESC",
                        ENTRY_COLUMNS
                    ),
                    (user_id, start_date, end_date),
                )
                .await?
            }
        };

        let mut entries = Vec::new();
        while let Some(row) = rows.next().await? {
            entries.push(extract_entry_from_row(row)?);
        }
        Ok(entries)
    }

    pub async fn get_entry(&self, user_id: &str, id: &str) -> StoreResult<Entry> {
        let conn = self.db.read().await;
        let mut rows = conn
            .query(
                &format!(
                    "SELECT {} FROM entries WHERE id = ? AND user_id = ?",
                    ENTRY_COLUMNS
                ),
                (id, user_id),
            )
            .await?;
        let row = rows.next().await?.ok_or(StoreError::NotFound)?;
        extract_entry_from_row(row)
    }

    pub async fn create_entry(&self, user_id: &str, draft: &EntryDraft) -> StoreResult<Entry> {
        let entry = Entry {
            id: Uuid::new_v4().to_string(),
            date: draft.date.clone(),
            product_or_service: draft.product_or_service.clone(),
            revenue: draft.revenue,
            cost: draft.cost,
            category_id: draft.category_id.clone(),
            notes: draft.notes.clone(),
            user_id: user_id.to_string(),
            created_at: now_timestamp(),
        };

        let conn = self.db.write().await;
        conn.execute(
            "INSERT INTO entries (id, date, product_or_service, revenue, cost, category_id, notes, user_id, created_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
            (
                entry.id.as_str(),
                entry.date.as_str(),
                entry.product_or_service.as_str(),
                entry.revenue,
                entry.cost,
                entry.category_id.as_str(),
                entry.notes.as_deref(),
                entry.user_id.as_str(),
                entry.created_at.as_str(),
            ),
        )
        .await?;

        Ok(entry)
    }

    pub async fn update_entry(
        &self,
        user_id: &str,
        id: &str,
        draft: &EntryDraft,
    ) -> StoreResult<Entry> {
        let affected_rows = {
            let conn = self.db.write().await;
            conn.execute(
                "UPDATE entries SET date = ?, product_or_service = ?, revenue = ?, cost = ?, category_id = ?, notes = ? WHERE id = ? AND user_id = ?",
                (
                    draft.date.as_str(),
                    draft.product_or_service.as_str(),
                    draft.revenue,
                    draft.cost,
                    draft.category_id.as_str(),
                    draft.notes.as_deref(),
                    id,
                    user_id,
                ),
            )
            .await?
        };

        if affected_rows == 0 {
            return Err(StoreError::NotFound);
        }
        self.get_entry(user_id, id).await
    }

    pub async fn delete_entry(&self, user_id: &str, id: &str) -> StoreResult<()> {
        let conn = self.db.write().await;
        let affected_rows = conn
            .execute("DELETE FROM entries WHERE id = ? AND user_id = ?", (id, user_id))
            .await?;

        if affected_rows == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    pub async fn list_debts_credits(&self, user_id: &str) -> StoreResult<Vec<DebtCredit>> {
        let conn = self.db.read().await;
        let mut rows = conn
            .query(
                &format!(
                    "SELECT {} FROM debts_credits WHERE user_id = ? ORDER BY due_date ASC, created_at ASC",
                    DEBT_CREDIT_COLUMNS
                ),
                [user_id],
            )
            .await?;

        let mut items = Vec::new();
        while let Some(row) = rows.next().await? {
            items.push(extract_debt_credit_from_row(row)?);
        }
        Ok(items)
    }

    pub async fn get_debt_credit(&self, user_id: &str, id: &str) -> StoreResult<DebtCredit> {
        let conn = self.db.read().await;
        let mut rows = conn
            .query(
                &format!(
                    "SELECT {} FROM debts_credits WHERE id = ? AND user_id = ?",
                    DEBT_CREDIT_COLUMNS
                ),
                (id, user_id),
            )
            .await?;
        let row = rows.next().await?.ok_or(StoreError::NotFound)?;
        extract_debt_credit_from_row(row)
    }

    pub async fn create_debt_credit(
        &self,
        user_id: &str,
        draft: &DebtCreditDraft,
    ) -> StoreResult<DebtCredit> {
        let item = DebtCredit {
            id: Uuid::new_v4().to_string(),
            name: draft.name.clone(),
            amount: draft.amount,
            reason: draft.reason.clone(),
            date: draft.date.clone(),
            due_date: draft.due_date.clone(),
            status: draft.status,
            kind: draft.kind,
            user_id: user_id.to_string(),
            created_at: now_timestamp(),
        };

        let conn = self.db.write().await;
        conn.execute(
            "INSERT INTO debts_credits (id, name, amount, reason, date, due_date, status, type, user_id, created_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            (
                item.id.as_str(),
                item.name.as_str(),
                item.amount,
                item.reason.as_str(),
                item.date.as_str(),
                item.due_date.as_str(),
                item.status.as_str(),
                item.kind.as_str(),
                item.user_id.as_str(),
                item.created_at.as_str(),
            ),
        )
        .await?;

        Ok(item)
    }

    pub async fn update_debt_credit(
        &self,
        user_id: &str,
        id: &str,
        draft: &DebtCreditDraft,
    ) -> StoreResult<DebtCredit> {
        let affected_rows = {
            let conn = self.db.write().await;
            conn.execute(
                "UPDATE debts_credits SET name = ?, amount = ?, reason = ?, date = ?, due_date = ?, status = ?, type = ? WHERE id = ? AND user_id = ?",
                (
                    draft.name.as_str(),
                    draft.amount,
                    draft.reason.as_str(),
                    draft.date.as_str(),
                    draft.due_date.as_str(),
                    draft.status.as_str(),
                    draft.kind.as_str(),
                    id,
                    user_id,
                ),
            )
            .await?
        };

        if affected_rows == 0 {
            return Err(StoreError::NotFound);
        }
        self.get_debt_credit(user_id, id).await
    }

    pub async fn delete_debt_credit(&self, user_id: &str, id: &str) -> StoreResult<()> {
        let conn = self.db.write().await;
        let affected_rows = conn
            .execute(
                "DELETE FROM debts_credits WHERE id = ? AND user_id = ?",
                (id, user_id),
            )
            .await?;

        if affected_rows == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}
