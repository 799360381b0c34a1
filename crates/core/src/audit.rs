use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Create,
    Update,
    Delete,
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuditAction::Create => write!(f, "create"),
            AuditAction::Update => write!(f, "update"),
            AuditAction::Delete => write!(f, "delete"),
        }
    }
}

/// What a mutating operation hands to the audit sink. The sink stamps the
/// id, timestamp and hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAuditEntry {
    pub entity: String,
    pub entity_id: String,
    pub action: AuditAction,
    pub before: Option<Value>,
    pub after: Value,
}

impl NewAuditEntry {
    pub fn created(entity: &str, entity_id: &str, after: Value) -> Self {
        NewAuditEntry {
            entity: entity.to_string(),
            entity_id: entity_id.to_string(),
            action: AuditAction::Create,
            before: None,
            after,
        }
    }

    pub fn updated(entity: &str, entity_id: &str, before: Value, after: Value) -> Self {
        NewAuditEntry {
            entity: entity.to_string(),
            entity_id: entity_id.to_string(),
            action: AuditAction::Update,
            before: Some(before),
            after,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditLogEntry {
    pub id: String,
    pub at: DateTime<Utc>,
    pub entity: String,
    pub entity_id: String,
    pub action: AuditAction,
    pub before: Option<Value>,
    pub after: Value,
    pub hash: String,
}
