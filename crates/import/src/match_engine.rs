use std::collections::{BTreeMap, HashSet};

use contabia_core::{EntryId, JournalEntry, Money};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::statement::StatementRow;

/// Candidates scoring below this are dropped from the match map.
pub const SUGGESTION_THRESHOLD: u8 = 40;
/// Candidates at or above this are reconciled without review.
pub const AUTO_RECONCILE_THRESHOLD: u8 = 60;
/// Scores are capped below 100: an automatic match is never certain.
pub const MAX_CONFIDENCE: u8 = 99;

const EXACT_AMOUNT_POINTS: u32 = 50;
const NEAR_AMOUNT_POINTS: u32 = 30;
const DESCRIPTION_POINTS_PER_WORD: u32 = 5;
const DESCRIPTION_POINTS_MAX: u32 = 20;
const MIN_WORD_LEN: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchCandidate {
    pub entry_id: EntryId,
    pub confidence: u8,
}

impl MatchCandidate {
    pub fn is_auto_reconciled(&self) -> bool {
        self.confidence >= AUTO_RECONCILE_THRESHOLD
    }
}

/// Statement row index → best candidate entry.
pub type MatchMap = BTreeMap<usize, MatchCandidate>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchPolicy {
    /// Each row picks its best entry independently; one entry may be the
    /// best match for several rows.
    #[default]
    Shared,
    /// Highest-confidence pairs are assigned first and an assigned entry is
    /// unavailable to the remaining rows.
    Exclusive,
}

#[derive(Debug, Clone, Default)]
pub struct AutoMatchEngine {
    pub policy: MatchPolicy,
}

impl AutoMatchEngine {
    pub fn new(policy: MatchPolicy) -> Self {
        Self { policy }
    }

    /// Scores every row against every eligible entry. Entries are visited in
    /// slice order and ties keep the first entry seen.
    pub fn find_matches(&self, rows: &[StatementRow], entries: &[JournalEntry]) -> MatchMap {
        match self.policy {
            MatchPolicy::Shared => rows
                .iter()
                .enumerate()
                .filter_map(|(idx, row)| {
                    best_candidate(row, entries)
                        .filter(|c| c.confidence >= SUGGESTION_THRESHOLD)
                        .map(|c| (idx, c))
                })
                .collect(),
            MatchPolicy::Exclusive => assign_exclusive(rows, entries),
        }
    }
}

fn best_candidate(row: &StatementRow, entries: &[JournalEntry]) -> Option<MatchCandidate> {
    let mut best: Option<MatchCandidate> = None;
    for entry in entries {
        let Some(confidence) = score_pair(row, entry) else {
            continue;
        };
        tracing::debug!(entry = %entry.id, confidence, description = %row.description, "scored candidate");
        if best.as_ref().map_or(true, |b| confidence > b.confidence) {
            best = Some(MatchCandidate {
                entry_id: entry.id.clone(),
                confidence,
            });
        }
    }
    best
}

fn assign_exclusive(rows: &[StatementRow], entries: &[JournalEntry]) -> MatchMap {
    let mut pairs: Vec<(u8, usize, usize)> = Vec::new();
    for (row_idx, row) in rows.iter().enumerate() {
        for (entry_idx, entry) in entries.iter().enumerate() {
            if let Some(confidence) = score_pair(row, entry) {
                if confidence >= SUGGESTION_THRESHOLD {
                    pairs.push((confidence, row_idx, entry_idx));
                }
            }
        }
    }
    // Highest confidence first; earlier rows, then earlier entries, on ties.
    pairs.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)).then(a.2.cmp(&b.2)));

    let mut matches = MatchMap::new();
    let mut claimed: HashSet<usize> = HashSet::new();
    for (confidence, row_idx, entry_idx) in pairs {
        if matches.contains_key(&row_idx) || claimed.contains(&entry_idx) {
            continue;
        }
        claimed.insert(entry_idx);
        matches.insert(
            row_idx,
            MatchCandidate {
                entry_id: entries[entry_idx].id.clone(),
                confidence,
            },
        );
    }
    matches
}

/// Confidence (0–99) that `entry` records `row`, or `None` when the amounts
/// are a dollar or more apart or the entry carries no debit at all.
pub fn score_pair(row: &StatementRow, entry: &JournalEntry) -> Option<u8> {
    let entry_amount = entry.total_debits();
    if entry_amount.is_zero() {
        return None;
    }

    let mut score = amount_points(row.amount.abs(), entry_amount)?;
    score += date_points((row.date - entry.date).num_days().unsigned_abs());
    score += description_points(&row.description, &entry.memo);

    Some(score.min(u32::from(MAX_CONFIDENCE)) as u8)
}

fn amount_points(tx_amount: Money, entry_amount: Money) -> Option<u32> {
    let diff = (tx_amount - entry_amount).abs().as_decimal();
    if diff < Decimal::new(1, 2) {
        Some(EXACT_AMOUNT_POINTS)
    } else if diff < Decimal::ONE {
        Some(NEAR_AMOUNT_POINTS)
    } else {
        None
    }
}

fn date_points(days_apart: u64) -> u32 {
    match days_apart {
        0 => 30,
        1 => 25,
        2..=3 => 15,
        4..=7 => 5,
        _ => 0,
    }
}

/// Five points per long word of the bank description that overlaps (as a
/// substring either way) some word of the entry memo, capped at twenty.
fn description_points(description: &str, memo: &str) -> u32 {
    let memo = memo.to_lowercase();
    let memo_words: Vec<&str> = memo.split_whitespace().collect();
    let description = description.to_lowercase();

    let common = description
        .split_whitespace()
        .filter(|w| w.chars().count() >= MIN_WORD_LEN)
        .filter(|w| memo_words.iter().any(|m| m.contains(w) || w.contains(m)))
        .count() as u32;

    (common * DESCRIPTION_POINTS_PER_WORD).min(DESCRIPTION_POINTS_MAX)
}
