pub mod account;
pub mod audit;
pub mod bank;
pub mod client;
pub mod closing;
pub mod document;
pub mod ids;
pub mod journal;
pub mod ledger;
pub mod money;
pub mod obligation;
pub mod period;
pub mod record;
pub mod report;
pub mod tax;

pub use account::{default_account_name, AccountClass, DEFAULT_CHART};
pub use audit::{AuditAction, AuditLogEntry, NewAuditEntry};
pub use bank::BankTransaction;
pub use client::{BankAccount, BankAccountKind, Client, TaxRegime};
pub use closing::{closing_checklist, CheckCategory, CheckItem, ClosingChecklist, ClosingInputs, Severity};
pub use document::{Document, DocumentKind, OcrStatus};
pub use ids::{
    BankAccountId, BankTransactionId, ClientId, DocumentId, EntryId, ObligationId, TaxItemId, TaxPeriodId,
};
pub use journal::{JournalEntry, JournalLine};
pub use ledger::{Ledger, Movement};
pub use money::{Money, MoneyError};
pub use obligation::{Obligation, ObligationStatus};
pub use period::{Competence, CompetenceError};
pub use record::Record;
pub use report::{income_statement, trial_balance, IncomeStatement, TrialBalance};
pub use tax::{TaxItem, TaxPeriod, TaxPeriodStatus, TaxType};
