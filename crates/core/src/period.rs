use chrono::{Datelike, Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CompetenceError {
    #[error("Invalid competence '{0}', expected YYYY-MM")]
    Invalid(String),
}

/// The accounting month a record belongs to, independent of its posting date.
///
/// Stored as the first day of the month so every derived date is valid by
/// construction. Serialized as `"YYYY-MM"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Competence(NaiveDate);

impl Competence {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(Competence)
    }

    /// The competence a calendar date falls in.
    pub fn of(date: NaiveDate) -> Self {
        Competence(date - Days::new(u64::from(date.day0())))
    }

    pub fn year(self) -> i32 {
        self.0.year()
    }

    pub fn month(self) -> u32 {
        self.0.month()
    }

    pub fn first_day(self) -> NaiveDate {
        self.0
    }

    pub fn last_day(self) -> NaiveDate {
        self.following().0 - Days::new(1)
    }

    pub fn following(self) -> Self {
        Competence(self.0 + Months::new(1))
    }

    pub fn contains(self, date: NaiveDate) -> bool {
        date >= self.first_day() && date <= self.last_day()
    }

    /// Due date on `day` of the following month. Days past the end of that
    /// month fall on its last day (day 30 in February becomes the 28th/29th).
    pub fn due_date(self, day: u32) -> NaiveDate {
        let next = self.following();
        let day = day.clamp(1, next.last_day().day());
        next.0 + Days::new(u64::from(day - 1))
    }
}

impl fmt::Display for Competence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year(), self.month())
    }
}

impl FromStr for Competence {
    type Err = CompetenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (year, month) = s
            .split_once('-')
            .ok_or_else(|| CompetenceError::Invalid(s.to_string()))?;
        if year.len() != 4 || month.len() != 2 {
            return Err(CompetenceError::Invalid(s.to_string()));
        }
        let year = year
            .parse::<i32>()
            .map_err(|_| CompetenceError::Invalid(s.to_string()))?;
        let month = month
            .parse::<u32>()
            .map_err(|_| CompetenceError::Invalid(s.to_string()))?;
        Competence::new(year, month).ok_or_else(|| CompetenceError::Invalid(s.to_string()))
    }
}

impl TryFrom<String> for Competence {
    type Error = CompetenceError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Competence> for String {
    fn from(c: Competence) -> Self {
        c.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn comp(s: &str) -> Competence {
        s.parse().unwrap()
    }

    #[test]
    fn parse_and_display() {
        assert_eq!(comp("2025-01").to_string(), "2025-01");
        assert_eq!(comp("2025-01").month(), 1);
        assert_eq!(comp("2025-12").year(), 2025);
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!("2025-13".parse::<Competence>().is_err());
        assert!("2025-1".parse::<Competence>().is_err());
        assert!("202501".parse::<Competence>().is_err());
        assert!("abcd-ef".parse::<Competence>().is_err());
    }

    #[test]
    fn following_rolls_over_year() {
        assert_eq!(comp("2025-12").following(), comp("2026-01"));
        assert_eq!(comp("2025-01").following(), comp("2025-02"));
    }

    #[test]
    fn of_date() {
        assert_eq!(Competence::of(date(2025, 1, 31)), comp("2025-01"));
        assert_eq!(Competence::of(date(2025, 2, 1)), comp("2025-02"));
    }

    #[test]
    fn bounds_and_contains() {
        let c = comp("2024-02");
        assert_eq!(c.first_day(), date(2024, 2, 1));
        assert_eq!(c.last_day(), date(2024, 2, 29));
        assert!(c.contains(date(2024, 2, 29)));
        assert!(!c.contains(date(2024, 3, 1)));
    }

    #[test]
    fn due_date_is_in_following_month() {
        assert_eq!(comp("2025-01").due_date(20), date(2025, 2, 20));
        assert_eq!(comp("2025-12").due_date(20), date(2026, 1, 20));
    }

    #[test]
    fn due_date_clamps_to_month_end() {
        assert_eq!(comp("2025-01").due_date(30), date(2025, 2, 28));
        assert_eq!(comp("2024-01").due_date(30), date(2024, 2, 29));
        assert_eq!(comp("2025-02").due_date(30), date(2025, 3, 30));
    }

    #[test]
    fn serde_as_string() {
        let json = serde_json::to_string(&comp("2025-03")).unwrap();
        assert_eq!(json, "\"2025-03\"");
        let back: Competence = serde_json::from_str(&json).unwrap();
        assert_eq!(back, comp("2025-03"));
        assert!(serde_json::from_str::<Competence>("\"2025-3\"").is_err());
    }
}
