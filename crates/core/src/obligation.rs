use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::ids::{ClientId, ObligationId};
use crate::period::Competence;
use crate::record::Record;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObligationStatus {
    Pending,
    Sent,
    Late,
}

/// An accessory filing (DCTF, EFD, DEFIS...) owed for a competence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Obligation {
    pub id: ObligationId,
    pub client_id: ClientId,
    pub name: String,
    pub competence: Competence,
    pub due_date: NaiveDate,
    pub status: ObligationStatus,
    #[serde(default)]
    pub notes: String,
}

impl Obligation {
    pub fn new(client_id: ClientId, name: &str, competence: Competence, due_date: NaiveDate) -> Self {
        Obligation {
            id: ObligationId::generate(),
            client_id,
            name: name.to_string(),
            competence,
            due_date,
            status: ObligationStatus::Pending,
            notes: String::new(),
        }
    }

    pub fn is_sent(&self) -> bool {
        self.status == ObligationStatus::Sent
    }
}

impl Record for Obligation {
    const COLLECTION: &'static str = "obligations";

    fn record_id(&self) -> &str {
        self.id.as_str()
    }
}
