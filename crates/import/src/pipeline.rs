use chrono::Utc;
use contabia_core::{
    BankAccountId, BankTransaction, BankTransactionId, Client, ClientId, NewAuditEntry,
};
use contabia_storage::{client_entries, find_by_id, Store, StoreError};
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;

use crate::match_engine::{AutoMatchEngine, MatchMap, MatchPolicy};
use crate::statement::StatementRow;

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
    #[error("Unknown client: {0}")]
    UnknownClient(ClientId),
}

#[derive(Debug, Clone)]
pub struct ImportRequest {
    pub client_id: ClientId,
    /// Defaults to the client's first bank account when absent.
    pub bank_account_id: Option<BankAccountId>,
    pub file_name: String,
    pub rows: Vec<StatementRow>,
    pub policy: MatchPolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportSummary {
    pub imported: usize,
    /// Rows reconciled automatically (confidence ≥ 60).
    pub matched: usize,
    /// Rows with a weak suggestion (40–59) left for review.
    pub suggested: usize,
    pub transactions: Vec<BankTransaction>,
    pub matches: MatchMap,
}

/// Runs the matcher over the client's existing entries, persists one
/// `BankTransaction` per row and appends a single `bank_import` audit entry.
pub async fn import_statement<S: Store>(store: &S, request: ImportRequest) -> Result<ImportSummary, ImportError> {
    let client: Client = find_by_id(store, request.client_id.as_str())
        .await?
        .ok_or_else(|| ImportError::UnknownClient(request.client_id.clone()))?;

    let entries = client_entries(store, &client.id).await?;

    let matches = AutoMatchEngine::new(request.policy).find_matches(&request.rows, &entries);

    let bank_account_id = request
        .bank_account_id
        .clone()
        .or_else(|| client.primary_bank_account().map(|a| a.id.clone()));
    let now = Utc::now();

    let transactions: Vec<BankTransaction> = request
        .rows
        .iter()
        .enumerate()
        .map(|(idx, row)| {
            let candidate = matches.get(&idx);
            let matched = candidate.is_some_and(|c| c.is_auto_reconciled());
            BankTransaction {
                id: BankTransactionId::generate(),
                client_id: client.id.clone(),
                bank_account_id: bank_account_id.clone(),
                date: row.date,
                description: row.description.clone(),
                amount: row.amount,
                matched,
                match_entry_id: candidate.filter(|_| matched).map(|c| c.entry_id.clone()),
                match_confidence: candidate.map_or(0, |c| c.confidence),
                imported_from: request.file_name.clone(),
                created_at: now,
            }
        })
        .collect();

    store.save_all(&transactions).await?;

    let matched = transactions.iter().filter(|t| t.matched).count();
    let suggested = matches.len() - matched;

    store
        .append_audit(NewAuditEntry::created(
            "bank_import",
            &request.file_name,
            json!({ "count": transactions.len(), "matched": matched }),
        ))
        .await?;

    tracing::info!(
        client = %client.id,
        file = %request.file_name,
        imported = transactions.len(),
        matched,
        suggested,
        "imported bank statement"
    );

    Ok(ImportSummary {
        imported: transactions.len(),
        matched,
        suggested,
        transactions,
        matches,
    })
}
