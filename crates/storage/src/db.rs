use contabia_core::{AuditLogEntry, NewAuditEntry, Record};
use sqlx::{sqlite::SqlitePoolOptions, Pool, Sqlite};
use std::path::Path;

use crate::audit;
use crate::store::{Store, StoreError};

pub type DbPool = Pool<Sqlite>;

pub async fn create_db(path: &Path) -> Result<DbPool, sqlx::Error> {
    connect(&format!("sqlite:{}?mode=rwc", path.display())).await
}

pub async fn connect(url: &str) -> Result<DbPool, sqlx::Error> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect(url)
        .await?;

    sqlx::query("PRAGMA journal_mode = WAL")
        .execute(&pool)
        .await?;
    sqlx::query("PRAGMA synchronous = NORMAL")
        .execute(&pool)
        .await?;
    sqlx::query("PRAGMA busy_timeout = 5000")
        .execute(&pool)
        .await?;

    run_migrations(&pool).await?;

    Ok(pool)
}

async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::Error> {
    // `seq` fixes each record's position at first insert; upserts keep it.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS records (
            seq INTEGER PRIMARY KEY AUTOINCREMENT,
            collection TEXT NOT NULL,
            id TEXT NOT NULL,
            body TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE (collection, id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS audit_log (
            seq INTEGER PRIMARY KEY AUTOINCREMENT,
            id TEXT NOT NULL UNIQUE,
            entity TEXT NOT NULL,
            entity_id TEXT NOT NULL,
            action TEXT NOT NULL,
            hash TEXT NOT NULL,
            body TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// SQLite-backed store keeping each record as a JSON document.
#[derive(Clone)]
pub struct SqliteStore {
    pool: DbPool,
}

impl SqliteStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn open(path: &Path) -> Result<Self, StoreError> {
        Ok(Self::new(create_db(path).await?))
    }
}

impl Store for SqliteStore {
    async fn get_all<R: Record>(&self) -> Result<Vec<R>, StoreError> {
        let rows = sqlx::query_as::<_, (String,)>(
            "SELECT body FROM records WHERE collection = ? ORDER BY seq",
        )
        .bind(R::COLLECTION)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|(body,)| serde_json::from_str(&body).map_err(StoreError::from))
            .collect()
    }

    async fn save<R: Record>(&self, record: &R) -> Result<(), StoreError> {
        let body = serde_json::to_string(record)?;
        sqlx::query(
            r#"
            INSERT INTO records (collection, id, body) VALUES (?, ?, ?)
            ON CONFLICT (collection, id)
            DO UPDATE SET body = excluded.body, updated_at = datetime('now')
            "#,
        )
        .bind(R::COLLECTION)
        .bind(record.record_id())
        .bind(body)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn append_audit(&self, entry: NewAuditEntry) -> Result<AuditLogEntry, StoreError> {
        let mut tx = self.pool.begin().await?;

        let prev = sqlx::query_as::<_, (String,)>("SELECT hash FROM audit_log ORDER BY seq DESC LIMIT 1")
            .fetch_optional(&mut *tx)
            .await?;
        let sealed = audit::seal(entry, prev.as_ref().map(|(h,)| h.as_str()));

        sqlx::query(
            "INSERT INTO audit_log (id, entity, entity_id, action, hash, body) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&sealed.id)
        .bind(&sealed.entity)
        .bind(&sealed.entity_id)
        .bind(sealed.action.to_string())
        .bind(&sealed.hash)
        .bind(serde_json::to_string(&sealed)?)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        tracing::debug!(entity = %sealed.entity, entity_id = %sealed.entity_id, action = %sealed.action, "audit appended");
        Ok(sealed)
    }

    async fn audit_log(&self) -> Result<Vec<AuditLogEntry>, StoreError> {
        let rows = sqlx::query_as::<_, (String,)>("SELECT body FROM audit_log ORDER BY seq")
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter()
            .map(|(body,)| serde_json::from_str(&body).map_err(StoreError::from))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contabia_core::{Client, ClientId, TaxRegime};
    use serde_json::json;

    async fn open_temp() -> (tempfile::TempDir, SqliteStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::open(&dir.path().join("ledger.db")).await.unwrap();
        (dir, store)
    }

    #[tokio::test]
    async fn upsert_replaces_body_and_keeps_order() {
        let (_dir, store) = open_temp().await;
        let mut a = Client::new(ClientId::from("a"), "Alpha", "1", TaxRegime::Mei);
        let b = Client::new(ClientId::from("b"), "Beta", "2", TaxRegime::Real);
        store.save(&a).await.unwrap();
        store.save(&b).await.unwrap();
        a.legal_name = "Alpha Ltda".to_string();
        store.save(&a).await.unwrap();

        let all: Vec<Client> = store.get_all().await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].legal_name, "Alpha Ltda");
        assert_eq!(all[1].id, ClientId::from("b"));
    }

    #[tokio::test]
    async fn audit_log_persists_chain() {
        let (dir, store) = open_temp().await;
        store
            .append_audit(NewAuditEntry::created("client", "a", json!({"name": "Alpha"})))
            .await
            .unwrap();
        store
            .append_audit(NewAuditEntry::created("client", "b", json!({"name": "Beta"})))
            .await
            .unwrap();
        drop(store);

        let reopened = SqliteStore::open(&dir.path().join("ledger.db")).await.unwrap();
        let log = reopened.audit_log().await.unwrap();
        assert_eq!(log.len(), 2);
        assert!(audit::verify_chain(&log));
    }
}
