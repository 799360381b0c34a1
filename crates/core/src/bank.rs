use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{BankAccountId, BankTransactionId, ClientId, EntryId};
use crate::money::Money;
use crate::record::Record;

/// One bank statement line as persisted after import. Match metadata is set
/// once at import time and never recomputed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BankTransaction {
    pub id: BankTransactionId,
    pub client_id: ClientId,
    pub bank_account_id: Option<BankAccountId>,
    pub date: NaiveDate,
    pub description: String,
    /// Positive for inflows, negative for outflows.
    pub amount: Money,
    pub matched: bool,
    pub match_entry_id: Option<EntryId>,
    /// 0–99.
    pub match_confidence: u8,
    pub imported_from: String,
    pub created_at: DateTime<Utc>,
}

impl Record for BankTransaction {
    const COLLECTION: &'static str = "transactions";

    fn record_id(&self) -> &str {
        self.id.as_str()
    }
}
