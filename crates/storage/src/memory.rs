use std::collections::HashMap;

use contabia_core::{AuditLogEntry, NewAuditEntry, Record};
use serde_json::Value;
use tokio::sync::Mutex;

use crate::audit;
use crate::store::{Store, StoreError};

#[derive(Default)]
struct Inner {
    collections: HashMap<&'static str, Vec<(String, Value)>>,
    audit: Vec<AuditLogEntry>,
}

/// Process-local store, for tests and one-shot runs.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Store for MemoryStore {
    async fn get_all<R: Record>(&self) -> Result<Vec<R>, StoreError> {
        let inner = self.inner.lock().await;
        let Some(records) = inner.collections.get(R::COLLECTION) else {
            return Ok(Vec::new());
        };
        records
            .iter()
            .map(|(_, body)| serde_json::from_value(body.clone()).map_err(StoreError::from))
            .collect()
    }

    async fn save<R: Record>(&self, record: &R) -> Result<(), StoreError> {
        let body = serde_json::to_value(record)?;
        let id = record.record_id().to_string();
        let mut inner = self.inner.lock().await;
        let records = inner.collections.entry(R::COLLECTION).or_default();
        match records.iter_mut().find(|(existing, _)| *existing == id) {
            Some(slot) => slot.1 = body,
            None => records.push((id, body)),
        }
        Ok(())
    }

    async fn append_audit(&self, entry: NewAuditEntry) -> Result<AuditLogEntry, StoreError> {
        let mut inner = self.inner.lock().await;
        let sealed = audit::seal(entry, inner.audit.last().map(|e| e.hash.as_str()));
        inner.audit.push(sealed.clone());
        Ok(sealed)
    }

    async fn audit_log(&self) -> Result<Vec<AuditLogEntry>, StoreError> {
        Ok(self.inner.lock().await.audit.clone())
    }
}
