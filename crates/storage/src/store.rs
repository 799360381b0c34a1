use contabia_core::{AuditLogEntry, NewAuditEntry, Record};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Generic collection-of-records persistence. Records are upserted by id and
/// come back in first-insertion order; the audit log is append-only.
#[allow(async_fn_in_trait)]
pub trait Store {
    async fn get_all<R: Record>(&self) -> Result<Vec<R>, StoreError>;

    async fn save<R: Record>(&self, record: &R) -> Result<(), StoreError>;

    async fn append_audit(&self, entry: NewAuditEntry) -> Result<AuditLogEntry, StoreError>;

    async fn audit_log(&self) -> Result<Vec<AuditLogEntry>, StoreError>;

    async fn save_all<R: Record>(&self, records: &[R]) -> Result<(), StoreError> {
        for record in records {
            self.save(record).await?;
        }
        Ok(())
    }
}

pub async fn find_by_id<R: Record, S: Store>(store: &S, id: &str) -> Result<Option<R>, StoreError> {
    Ok(store
        .get_all::<R>()
        .await?
        .into_iter()
        .find(|r| r.record_id() == id))
}
