//! Bank statement CSV reader. Produces the normalized `{date, description,
//! amount}` rows the matcher consumes and counts the rows it had to drop.

use std::io::Read;
use std::str::FromStr;
use std::sync::OnceLock;

use chrono::NaiveDate;
use contabia_core::Money;
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

macro_rules! re {
    ($name:ident, $pat:expr) => {
        fn $name() -> &'static Regex {
            static R: OnceLock<Regex> = OnceLock::new();
            R.get_or_init(|| Regex::new($pat).expect("invalid regex"))
        }
    };
}

re!(re_date_br, r"^(\d{1,2})[/\-.](\d{1,2})[/\-.](\d{4})$");
re!(re_date_iso, r"^(\d{4})-(\d{2})-(\d{2})");

#[derive(Error, Debug)]
pub enum StatementError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Statement has no header row")]
    NoHeader,
    #[error("No column mapped for {0}")]
    MissingColumn(&'static str),
    #[error("Column '{0}' not present in header")]
    UnknownColumn(String),
    #[error("No valid transactions in statement")]
    NoDataRows,
}

/// Header names to read each field from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMapping {
    pub date: Option<String>,
    pub description: Option<String>,
    pub amount: Option<String>,
}

impl ColumnMapping {
    /// Guesses columns from common Portuguese and English header names.
    /// The first matching header wins for each field.
    pub fn detect(headers: &[String]) -> Self {
        let mut mapping = ColumnMapping::default();
        for header in headers {
            let lower = header.to_lowercase();
            if mapping.date.is_none() && (lower.contains("data") || lower == "date") {
                mapping.date = Some(header.clone());
            }
            if mapping.description.is_none()
                && (lower.contains("descri")
                    || lower.contains("histori")
                    || lower.contains("históri")
                    || lower == "memo")
            {
                mapping.description = Some(header.clone());
            }
            if mapping.amount.is_none()
                && (lower.contains("valor")
                    || lower.contains("amount")
                    || lower.contains("saldo")
                    || lower.contains("value"))
            {
                mapping.amount = Some(header.clone());
            }
        }
        mapping
    }

    /// Fills unset fields from `other`.
    pub fn or(self, other: ColumnMapping) -> Self {
        ColumnMapping {
            date: self.date.or(other.date),
            description: self.description.or(other.description),
            amount: self.amount.or(other.amount),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatementProfile {
    pub delimiter: u8,
    /// Explicit columns; anything left unset is auto-detected.
    pub mapping: ColumnMapping,
}

impl Default for StatementProfile {
    fn default() -> Self {
        Self {
            delimiter: b';',
            mapping: ColumnMapping::default(),
        }
    }
}

impl StatementProfile {
    pub fn with_delimiter(delimiter: u8) -> Self {
        Self {
            delimiter,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatementRow {
    pub date: NaiveDate,
    pub description: String,
    /// Positive for credits, negative for debits.
    pub amount: Money,
}

#[derive(Debug, Clone)]
pub struct ParsedStatement {
    pub headers: Vec<String>,
    pub mapping: ColumnMapping,
    pub rows: Vec<StatementRow>,
    /// Rows dropped for an unparseable date or amount, or a blank description.
    pub skipped: usize,
}

pub fn read_statement<R: Read>(data: R, profile: &StatementProfile) -> Result<ParsedStatement, StatementError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .delimiter(profile.delimiter)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(data);

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim_matches(|c| c == '"' || c == '\'').to_string())
        .collect();
    if headers.iter().all(|h| h.is_empty()) {
        return Err(StatementError::NoHeader);
    }

    let mapping = profile.mapping.clone().or(ColumnMapping::detect(&headers));
    let position = |field: &'static str, column: &Option<String>| -> Result<usize, StatementError> {
        let column = column.as_ref().ok_or(StatementError::MissingColumn(field))?;
        headers
            .iter()
            .position(|h| h == column)
            .ok_or_else(|| StatementError::UnknownColumn(column.clone()))
    };
    let date_col = position("date", &mapping.date)?;
    let desc_col = position("description", &mapping.description)?;
    let amount_col = position("amount", &mapping.amount)?;

    let mut rows = Vec::new();
    let mut skipped = 0;

    for result in reader.records() {
        let record = result?;
        if record.iter().all(|f| f.is_empty()) {
            continue;
        }

        let date = record.get(date_col).and_then(parse_date);
        let amount = record.get(amount_col).and_then(parse_amount);
        let description = record.get(desc_col).map(str::trim).unwrap_or_default();

        match (date, amount) {
            (Some(date), Some(amount)) if !description.is_empty() => rows.push(StatementRow {
                date,
                description: description.to_string(),
                amount,
            }),
            _ => {
                tracing::warn!(line = ?record.position().map(|p| p.line()), "skipping statement row");
                skipped += 1;
            }
        }
    }

    if rows.is_empty() {
        return Err(StatementError::NoDataRows);
    }

    Ok(ParsedStatement {
        headers,
        mapping,
        rows,
        skipped,
    })
}

/// `dd/mm/yyyy` (also `-` or `.` separated) or ISO `yyyy-mm-dd`.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if let Some(caps) = re_date_br().captures(s) {
        let day = caps[1].parse().ok()?;
        let month = caps[2].parse().ok()?;
        let year = caps[3].parse().ok()?;
        return NaiveDate::from_ymd_opt(year, month, day);
    }
    if let Some(caps) = re_date_iso().captures(s) {
        let year = caps[1].parse().ok()?;
        let month = caps[2].parse().ok()?;
        let day = caps[3].parse().ok()?;
        return NaiveDate::from_ymd_opt(year, month, day);
    }
    None
}

/// Accepts Brazilian `1.234,56`, `1234,56` and plain `1234.56` forms.
/// Amounts with fractions of a cent are rejected rather than rounded.
pub fn parse_amount(s: &str) -> Option<Money> {
    let cleaned: String = s
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    let cleaned = cleaned.replace("R$", "");

    let normalized = match (cleaned.rfind(','), cleaned.rfind('.')) {
        // Comma is the decimal separator; dots group thousands.
        (Some(comma), dot) if dot.map_or(true, |d| comma > d) => cleaned.replace('.', "").replace(',', "."),
        // Dot is the decimal separator; commas group thousands.
        (Some(_), Some(_)) => cleaned.replace(',', ""),
        _ => cleaned,
    };

    Decimal::from_str(&normalized).ok().and_then(Money::from_exact)
}
