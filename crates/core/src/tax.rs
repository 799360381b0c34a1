use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ids::{ClientId, DocumentId, TaxItemId, TaxPeriodId};
use crate::money::Money;
use crate::period::Competence;
use crate::record::Record;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TaxType {
    Das,
    Iss,
    Icms,
    Irpj,
    Csll,
    Pis,
    Cofins,
    #[serde(rename = "withholding")]
    Withholding,
}

impl fmt::Display for TaxType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaxType::Das => write!(f, "DAS"),
            TaxType::Iss => write!(f, "ISS"),
            TaxType::Icms => write!(f, "ICMS"),
            TaxType::Irpj => write!(f, "IRPJ"),
            TaxType::Csll => write!(f, "CSLL"),
            TaxType::Pis => write!(f, "PIS"),
            TaxType::Cofins => write!(f, "COFINS"),
            TaxType::Withholding => write!(f, "Withholding"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaxPeriodStatus {
    ToCompute,
    Computed,
    Paid,
    Late,
}

impl fmt::Display for TaxPeriodStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaxPeriodStatus::ToCompute => write!(f, "to_compute"),
            TaxPeriodStatus::Computed => write!(f, "computed"),
            TaxPeriodStatus::Paid => write!(f, "paid"),
            TaxPeriodStatus::Late => write!(f, "late"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxItem {
    pub id: TaxItemId,
    pub tax_type: TaxType,
    pub value: Money,
    pub due_date: NaiveDate,
    pub paid: bool,
    /// Supporting payment guide or receipt.
    pub guide_doc_id: Option<DocumentId>,
}

/// The tax obligations of one client for one competence. At most one exists
/// per (client, competence).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxPeriod {
    pub id: TaxPeriodId,
    pub client_id: ClientId,
    pub competence: Competence,
    pub status: TaxPeriodStatus,
    pub items: Vec<TaxItem>,
}

impl TaxPeriod {
    pub fn total(&self) -> Money {
        self.items.iter().map(|i| i.value).sum()
    }

    pub fn all_paid(&self) -> bool {
        !self.items.is_empty() && self.items.iter().all(|i| i.paid)
    }

    pub fn unpaid_items(&self) -> impl Iterator<Item = &TaxItem> {
        self.items.iter().filter(|i| !i.paid)
    }

    pub fn item_mut(&mut self, item_id: &TaxItemId) -> Option<&mut TaxItem> {
        self.items.iter_mut().find(|i| &i.id == item_id)
    }
}

impl Record for TaxPeriod {
    const COLLECTION: &'static str = "tax_periods";

    fn record_id(&self) -> &str {
        self.id.as_str()
    }
}
