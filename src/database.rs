use anyhow::Result;
use libsql::{Builder, Connection};
use std::future::Future;
use std::pin::Pin;
use std::{path::Path, sync::Arc};
use tokio::sync::RwLock;

use crate::constants::LOCAL_DB_FILE;

const CREATE_USERS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id             TEXT    PRIMARY KEY,
    email          TEXT    UNIQUE NOT NULL COLLATE NOCASE,
    password_hash  TEXT    NOT NULL,
    created_at     TEXT    NOT NULL
);
"#;

const CREATE_CATEGORIES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS categories (
    id          TEXT    PRIMARY KEY,
    user_id     TEXT    NOT NULL,
    name        TEXT    NOT NULL,
    type        TEXT    NOT NULL CHECK (type IN ('income', 'expense')),
    color       TEXT,
    created_at  TEXT    NOT NULL,
    FOREIGN KEY (user_id) REFERENCES users(id)
);
"#;

const CREATE_ENTRIES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS entries (
    id                  TEXT    PRIMARY KEY,
    user_id             TEXT    NOT NULL,
    date                TEXT    NOT NULL,
    product_or_service  TEXT    NOT NULL,
    revenue             REAL    NOT NULL DEFAULT 0,
    cost                REAL    NOT NULL DEFAULT 0,
    category_id         TEXT    NOT NULL,
    notes               TEXT,
    created_at          TEXT    NOT NULL,
    FOREIGN KEY (user_id) REFERENCES users(id)
);
"#;

const CREATE_DEBTS_CREDITS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS debts_credits (
    id          TEXT    PRIMARY KEY,
    user_id     TEXT    NOT NULL,
    name        TEXT    NOT NULL,
    amount      REAL    NOT NULL,
    reason      TEXT    NOT NULL,
    date        TEXT    NOT NULL,
    due_date    TEXT    NOT NULL,
    status      TEXT    NOT NULL CHECK (status IN ('paid', 'unpaid')),
    type        TEXT    NOT NULL CHECK (type IN ('receivable', 'payable')),
    created_at  TEXT    NOT NULL,
    FOREIGN KEY (user_id) REFERENCES users(id)
);
"#;

const CREATE_ENTRIES_INDEX: &str = r#"
CREATE INDEX IF NOT EXISTS idx_entries_user_date ON entries(user_id, date);
"#;

const CREATE_CATEGORIES_INDEX: &str = r#"
CREATE INDEX IF NOT EXISTS idx_categories_user ON categories(user_id);
"#;

const CREATE_DEBTS_CREDITS_INDEX: &str = r#"
CREATE INDEX IF NOT EXISTS idx_debts_credits_user ON debts_credits(user_id);
"#;

pub type Db = Arc<RwLock<Connection>>;

/// Opens (creating if needed) the local store under `data_dir`.
pub async fn init_local_db(data_dir: &str) -> Result<Db> {
    tokio::fs::create_dir_all(data_dir).await?;
    let path = Path::new(data_dir).join(LOCAL_DB_FILE);
    let db = Builder::new_local(path).build().await?;
    let conn = db.connect()?;

    conn.execute(CREATE_USERS_TABLE, ()).await?;
    conn.execute(CREATE_CATEGORIES_TABLE, ()).await?;
    conn.execute(CREATE_ENTRIES_TABLE, ()).await?;
    conn.execute(CREATE_DEBTS_CREDITS_TABLE, ()).await?;
    conn.execute(CREATE_ENTRIES_INDEX, ()).await?;
    conn.execute(CREATE_CATEGORIES_INDEX, ()).await?;
    conn.execute(CREATE_DEBTS_CREDITS_INDEX, ()).await?;

    Ok(Arc::new(RwLock::new(conn)))
}

/// Runs `f` inside a transaction, committing on `Ok` and rolling back on `Err`.
///
/// The closure must return a boxed future to handle lifetime issues with async closures.
pub async fn with_transaction<F, T, E>(db: &Db, f: F) -> Result<T, E>
where
    F: for<'a> FnOnce(&'a Connection) -> Pin<Box<dyn Future<Output = Result<T, E>> + Send + 'a>>,
    E: From<TransactionError>,
{
    let conn = db.write().await;

    conn.execute("BEGIN TRANSACTION", ())
        .await
        .map_err(|_| TransactionError::Begin)?;

    match f(&*conn).await {
        Ok(result) => {
            conn.execute("COMMIT", ())
                .await
                .map_err(|_| TransactionError::Commit)?;
            Ok(result)
        }
        Err(e) => {
            let _ = conn.execute("ROLLBACK", ()).await;
            Err(e)
        }
    }
}

/// Errors that can occur during transaction management
#[derive(Debug)]
pub enum TransactionError {
    Begin,
    Commit,
}
