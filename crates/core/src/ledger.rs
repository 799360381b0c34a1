use crate::account::AccountClass;
use crate::ids::ClientId;
use crate::journal::{JournalEntry, JournalLine};
use crate::money::Money;
use crate::period::Competence;

/// Debit and credit movement over a set of lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Movement {
    pub debit: Money,
    pub credit: Money,
}

impl Movement {
    fn add_line(mut self, line: &JournalLine) -> Self {
        self.debit += line.debit;
        self.credit += line.credit;
        self
    }
}

/// Read-only aggregation over a snapshot of journal entries.
#[derive(Debug, Clone, Copy)]
pub struct Ledger<'a> {
    entries: &'a [JournalEntry],
}

impl<'a> Ledger<'a> {
    pub fn new(entries: &'a [JournalEntry]) -> Self {
        Ledger { entries }
    }

    /// Movement on lines of `class` for one client and competence.
    pub fn movement(&self, client_id: &ClientId, competence: Competence, class: AccountClass) -> Movement {
        self.entries
            .iter()
            .filter(|e| &e.client_id == client_id && e.competence == competence)
            .flat_map(|e| e.lines.iter())
            .filter(|l| l.class() == Some(class))
            .fold(Movement::default(), Movement::add_line)
    }

    /// Credits posted to revenue ("4…") accounts.
    pub fn revenue_total(&self, client_id: &ClientId, competence: Competence) -> Money {
        self.movement(client_id, competence, AccountClass::Revenue).credit
    }

    /// Debits posted to expense ("5…") accounts.
    pub fn expense_total(&self, client_id: &ClientId, competence: Competence) -> Money {
        self.movement(client_id, competence, AccountClass::Expense).debit
    }

    /// Twelve times the competence's revenue, standing in for a trailing
    /// twelve-month sum. Bracket lookups depend on this exact figure.
    pub fn annualized_revenue_approx(&self, client_id: &ClientId, competence: Competence) -> Money {
        let monthly = self.revenue_total(client_id, competence);
        Money::from_decimal(monthly.as_decimal() * rust_decimal::Decimal::from(12))
    }
}
