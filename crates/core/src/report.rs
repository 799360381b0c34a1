//! Income statement and trial balance over the entries of one competence.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::account::{code_level, AccountClass};
use crate::journal::JournalEntry;
use crate::money::Money;
use crate::period::Competence;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncomeStatementLine {
    pub code: String,
    pub name: String,
    pub value: Money,
    pub level: usize,
    pub is_total: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncomeStatement {
    pub competence: Competence,
    pub lines: Vec<IncomeStatementLine>,
    pub total_revenue: Money,
    pub total_expense: Money,
    pub result: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialBalanceLine {
    pub code: String,
    pub name: String,
    pub debit_movement: Money,
    pub credit_movement: Money,
    pub debit_balance: Money,
    pub credit_balance: Money,
    pub level: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialBalance {
    pub competence: Competence,
    pub lines: Vec<TrialBalanceLine>,
    pub total_debit: Money,
    pub total_credit: Money,
}

impl TrialBalance {
    pub fn is_balanced(&self) -> bool {
        self.total_debit == self.total_credit
    }
}

#[derive(Debug, Default)]
struct AccountTotals {
    name: String,
    debit: Money,
    credit: Money,
}

/// Per-account movement for the competence, ordered by code.
fn group_by_account<'a, I>(entries: I, competence: Competence) -> BTreeMap<String, AccountTotals>
where
    I: IntoIterator<Item = &'a JournalEntry>,
{
    let mut accounts: BTreeMap<String, AccountTotals> = BTreeMap::new();
    for line in entries
        .into_iter()
        .filter(|e| e.competence == competence)
        .flat_map(|e| e.lines.iter())
    {
        let totals = accounts.entry(line.account_code.clone()).or_default();
        if totals.name.is_empty() {
            totals.name = line.account_name.clone();
        }
        totals.debit += line.debit;
        totals.credit += line.credit;
    }
    accounts
}

pub fn income_statement<'a, I>(entries: I, competence: Competence) -> IncomeStatement
where
    I: IntoIterator<Item = &'a JournalEntry>,
{
    let accounts = group_by_account(entries, competence);

    let section = |class: AccountClass| -> Vec<IncomeStatementLine> {
        accounts
            .iter()
            .filter(|(code, _)| AccountClass::of_code(code) == Some(class))
            .map(|(code, acc)| IncomeStatementLine {
                code: code.clone(),
                name: acc.name.clone(),
                value: match class {
                    AccountClass::Revenue => acc.credit - acc.debit,
                    _ => acc.debit - acc.credit,
                },
                level: 2,
                is_total: false,
            })
            .collect()
    };

    let revenue = section(AccountClass::Revenue);
    let expense = section(AccountClass::Expense);
    let total_revenue: Money = revenue.iter().map(|l| l.value).sum();
    let total_expense: Money = expense.iter().map(|l| l.value).sum();
    let result = total_revenue - total_expense;

    let header = |code: &str, name: &str, value: Money| IncomeStatementLine {
        code: code.to_string(),
        name: name.to_string(),
        value,
        level: 1,
        is_total: true,
    };

    let mut lines = Vec::with_capacity(revenue.len() + expense.len() + 3);
    lines.push(header(AccountClass::Revenue.prefix(), "RECEITAS", total_revenue));
    lines.extend(revenue);
    lines.push(header(AccountClass::Expense.prefix(), "DESPESAS", total_expense));
    lines.extend(expense);
    lines.push(header("", "RESULTADO DO EXERCÍCIO", result));

    IncomeStatement {
        competence,
        lines,
        total_revenue,
        total_expense,
        result,
    }
}

/// Per-account movement and one-sided balance across every account class.
/// Totals are reported as computed; an unbalanced ledger shows up as
/// `total_debit != total_credit`.
pub fn trial_balance<'a, I>(entries: I, competence: Competence) -> TrialBalance
where
    I: IntoIterator<Item = &'a JournalEntry>,
{
    let lines: Vec<TrialBalanceLine> = group_by_account(entries, competence)
        .into_iter()
        .map(|(code, acc)| {
            let (debit_balance, credit_balance) = if acc.debit > acc.credit {
                (acc.debit - acc.credit, Money::zero())
            } else if acc.credit > acc.debit {
                (Money::zero(), acc.credit - acc.debit)
            } else {
                (Money::zero(), Money::zero())
            };
            TrialBalanceLine {
                level: code_level(&code),
                code,
                name: acc.name,
                debit_movement: acc.debit,
                credit_movement: acc.credit,
                debit_balance,
                credit_balance,
            }
        })
        .collect();

    let total_debit = lines.iter().map(|l| l.debit_balance).sum();
    let total_credit = lines.iter().map(|l| l.credit_balance).sum();

    TrialBalance {
        competence,
        lines,
        total_debit,
        total_credit,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::ClientId;
    use crate::journal::JournalLine;
    use chrono::NaiveDate;

    fn entry(competence: &str, lines: Vec<JournalLine>) -> JournalEntry {
        JournalEntry::new(
            ClientId::from("c1"),
            NaiveDate::from_ymd_opt(2025, 1, 10).unwrap(),
            competence.parse().unwrap(),
            "memo",
            lines,
        )
    }

    fn jan() -> Competence {
        "2025-01".parse().unwrap()
    }

    fn fixture() -> Vec<JournalEntry> {
        vec![
            entry(
                "2025-01",
                vec![
                    JournalLine::debit("1.1.3", Money::from_cents(1_500_000)),
                    JournalLine::credit("4.1", Money::from_cents(1_500_000)),
                ],
            ),
            entry(
                "2025-01",
                vec![
                    JournalLine::debit("1.1.2", Money::from_cents(1_500_000)),
                    JournalLine::credit("1.1.3", Money::from_cents(1_500_000)),
                ],
            ),
            entry(
                "2025-01",
                vec![
                    JournalLine::debit("5.1.1", Money::from_cents(350_000)),
                    JournalLine::debit("5.1.3", Money::from_cents(25_000)),
                    JournalLine::credit("1.1.2", Money::from_cents(375_000)),
                ],
            ),
            entry(
                "2025-02",
                vec![
                    JournalLine::debit("1.1.3", Money::from_cents(800_000)),
                    JournalLine::credit("4.2", Money::from_cents(800_000)),
                ],
            ),
        ]
    }

    #[test]
    fn income_statement_rolls_up_revenue_and_expense() {
        let entries = fixture();
        let dre = income_statement(&entries, jan());
        assert_eq!(dre.total_revenue, Money::from_cents(1_500_000));
        assert_eq!(dre.total_expense, Money::from_cents(375_000));
        assert_eq!(dre.result, Money::from_cents(1_125_000));

        let codes: Vec<&str> = dre.lines.iter().map(|l| l.code.as_str()).collect();
        assert_eq!(codes, vec!["4", "4.1", "5", "5.1.1", "5.1.3", ""]);
        assert_eq!(dre.lines[0].value, dre.total_revenue);
        assert_eq!(dre.lines[2].value, dre.total_expense);
        assert_eq!(dre.lines[1].name, "Receita de Serviços");
    }

    #[test]
    fn income_statement_of_empty_competence() {
        let entries = fixture();
        let dre = income_statement(&entries, "2025-06".parse().unwrap());
        assert_eq!(dre.result, Money::zero());
        assert_eq!(dre.lines.len(), 3);
    }

    #[test]
    fn trial_balance_is_symmetric_for_balanced_entries() {
        let entries = fixture();
        let tb = trial_balance(&entries, jan());
        assert!(tb.is_balanced());
        assert_eq!(tb.total_debit, Money::from_cents(1_500_000));

        let receivable = tb.lines.iter().find(|l| l.code == "1.1.3").unwrap();
        assert_eq!(receivable.debit_balance, Money::zero());
        assert_eq!(receivable.credit_balance, Money::zero());
        assert_eq!(receivable.level, 3);

        for line in &tb.lines {
            assert!(line.debit_balance.is_zero() || line.credit_balance.is_zero());
        }
    }

    #[test]
    fn trial_balance_exposes_unbalanced_entries() {
        let mut entries = fixture();
        entries.push(entry(
            "2025-01",
            vec![
                JournalLine::debit("5.1.2", Money::from_cents(10_000)),
                JournalLine::credit("1.1.2", Money::from_cents(9_000)),
            ],
        ));
        let tb = trial_balance(&entries, jan());
        assert!(!tb.is_balanced());
        assert_eq!(tb.total_debit - tb.total_credit, Money::from_cents(1_000));
    }

    #[test]
    fn lines_are_sorted_by_code() {
        let entries = fixture();
        let tb = trial_balance(&entries, jan());
        let codes: Vec<&str> = tb.lines.iter().map(|l| l.code.as_str()).collect();
        let mut sorted = codes.clone();
        sorted.sort();
        assert_eq!(codes, sorted);
    }
}
