use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::account::{default_account_name, AccountClass};
use crate::ids::{ClientId, DocumentId, EntryId};
use crate::money::Money;
use crate::period::Competence;
use crate::record::Record;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalLine {
    pub account_code: String,
    #[serde(default)]
    pub account_name: String,
    pub debit: Money,
    pub credit: Money,
    #[serde(default)]
    pub document_id: Option<DocumentId>,
}

impl JournalLine {
    pub fn debit(account_code: &str, amount: Money) -> Self {
        JournalLine {
            account_code: account_code.to_string(),
            account_name: default_account_name(account_code).unwrap_or_default().to_string(),
            debit: amount,
            credit: Money::zero(),
            document_id: None,
        }
    }

    pub fn credit(account_code: &str, amount: Money) -> Self {
        JournalLine {
            account_code: account_code.to_string(),
            account_name: default_account_name(account_code).unwrap_or_default().to_string(),
            debit: Money::zero(),
            credit: amount,
            document_id: None,
        }
    }

    pub fn with_document(mut self, document_id: DocumentId) -> Self {
        self.document_id = Some(document_id);
        self
    }

    pub fn class(&self) -> Option<AccountClass> {
        AccountClass::of_code(&self.account_code)
    }
}

/// A double-entry posting. Balance is expected but not enforced: the ledger
/// reports imbalance instead of rejecting the entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalEntry {
    pub id: EntryId,
    pub client_id: ClientId,
    pub date: NaiveDate,
    pub competence: Competence,
    pub memo: String,
    pub lines: Vec<JournalLine>,
    pub created_at: DateTime<Utc>,
}

impl JournalEntry {
    pub fn new(
        client_id: ClientId,
        date: NaiveDate,
        competence: Competence,
        memo: &str,
        lines: Vec<JournalLine>,
    ) -> Self {
        JournalEntry {
            id: EntryId::generate(),
            client_id,
            date,
            competence,
            memo: memo.trim().to_string(),
            lines,
            created_at: Utc::now(),
        }
    }

    pub fn total_debits(&self) -> Money {
        self.lines.iter().map(|l| l.debit).sum()
    }

    pub fn total_credits(&self) -> Money {
        self.lines.iter().map(|l| l.credit).sum()
    }

    /// Debits minus credits; zero for a balanced entry.
    pub fn imbalance(&self) -> Money {
        self.total_debits() - self.total_credits()
    }

    pub fn is_balanced(&self) -> bool {
        self.imbalance().is_zero()
    }

    pub fn has_document(&self) -> bool {
        self.lines.iter().any(|l| l.document_id.is_some())
    }
}

impl Record for JournalEntry {
    const COLLECTION: &'static str = "entries";

    fn record_id(&self) -> &str {
        self.id.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn entry(lines: Vec<JournalLine>) -> JournalEntry {
        JournalEntry::new(
            ClientId::from("c1"),
            date(2025, 1, 15),
            "2025-01".parse().unwrap(),
            "  Test  ",
            lines,
        )
    }

    #[test]
    fn balanced_entry() {
        let e = entry(vec![
            JournalLine::debit("1.1.3", Money::from_cents(5000)),
            JournalLine::credit("4.1", Money::from_cents(5000)),
        ]);
        assert!(e.is_balanced());
        assert_eq!(e.total_debits(), Money::from_cents(5000));
        assert_eq!(e.memo, "Test");
    }

    #[test]
    fn unbalanced_entry_reports_difference() {
        let e = entry(vec![
            JournalLine::debit("5.1.1", Money::from_cents(500)),
            JournalLine::credit("1.1.2", Money::from_cents(400)),
        ]);
        assert!(!e.is_balanced());
        assert_eq!(e.imbalance(), Money::from_cents(100));
    }

    #[test]
    fn split_entry() {
        let e = entry(vec![
            JournalLine::debit("5.1.1", Money::from_cents(300)),
            JournalLine::debit("5.1.2", Money::from_cents(200)),
            JournalLine::credit("1.1.2", Money::from_cents(500)),
        ]);
        assert!(e.is_balanced());
        assert_eq!(e.total_credits(), Money::from_cents(500));
    }

    #[test]
    fn line_constructors_fill_chart_names() {
        let d = JournalLine::debit("1.1.3", Money::from_cents(100));
        assert_eq!(d.account_name, "Clientes a Receber");
        assert_eq!(d.credit, Money::zero());
        assert_eq!(d.class(), Some(AccountClass::Asset));

        let c = JournalLine::credit("9.9", Money::from_cents(100)).with_document(DocumentId::from("d1"));
        assert_eq!(c.account_name, "");
        assert_eq!(c.debit, Money::zero());
        assert!(c.document_id.is_some());
    }

    #[test]
    fn document_support() {
        let mut e = entry(vec![JournalLine::debit("1.1.2", Money::from_cents(1))]);
        assert!(!e.has_document());
        e.lines[0].document_id = Some(DocumentId::from("doc"));
        assert!(e.has_document());
    }
}
