use anyhow::{bail, Context};
use chrono::NaiveDate;
use contabia_core::{
    income_statement, trial_balance, BankAccountId, Client, ClientId, ClosingChecklist, Competence, Document,
    DocumentId, DocumentKind, IncomeStatement, JournalEntry, JournalLine, Money, Obligation, ObligationId, OcrStatus,
    TaxItemId, TaxPeriod, TaxPeriodId, TaxRegime, TrialBalance,
};
use contabia_import::{import_statement, read_statement, ImportRequest, MatchPolicy, StatementProfile};
use contabia_storage::{
    audit, closing_review, post_entry, register_document, register_obligation, submit_obligation, Store,
};
use contabia_tax::{DueAlerts, TaxResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::config::AppConfig;

#[derive(Debug, Deserialize)]
pub struct EntryInput {
    pub client_id: String,
    pub date: NaiveDate,
    /// Defaults to the month of `date`.
    pub competence: Option<Competence>,
    pub memo: String,
    pub lines: Vec<EntryLineInput>,
}

#[derive(Debug, Deserialize)]
pub struct EntryLineInput {
    pub account_code: String,
    #[serde(default)]
    pub debit: Money,
    #[serde(default)]
    pub credit: Money,
    pub document_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PostedEntry {
    pub id: String,
    pub competence: Competence,
    pub total_debits: Money,
    pub imbalance: Money,
}

#[derive(Debug, Serialize)]
pub struct ImportOutput {
    pub file: String,
    pub imported: usize,
    pub matched: usize,
    pub suggested: usize,
    pub skipped: usize,
}

#[derive(Debug, Serialize)]
pub struct ApportionOutput {
    pub result: TaxResult,
    pub saved: Option<TaxPeriod>,
}

#[derive(Debug, Serialize)]
pub struct DeadlinesOutput {
    pub marked_late: usize,
    pub alerts: DueAlerts,
}

#[derive(Debug, Serialize)]
pub struct AuditOutput {
    pub entries: usize,
    pub chain_intact: bool,
}

pub async fn add_client<S: Store>(
    store: &S,
    id: &str,
    legal_name: &str,
    tax_id: &str,
    regime: TaxRegime,
) -> anyhow::Result<Client> {
    let client = Client::new(ClientId::from(id), legal_name, tax_id, regime);
    store.save(&client).await?;
    store
        .append_audit(contabia_core::NewAuditEntry::created(
            "client",
            client.id.as_str(),
            serde_json::to_value(&client)?,
        ))
        .await?;
    Ok(client)
}

pub async fn post<S: Store>(store: &S, input: EntryInput) -> anyhow::Result<PostedEntry> {
    if input.lines.is_empty() {
        bail!("entry has no lines");
    }
    let lines = input
        .lines
        .into_iter()
        .map(|l| {
            let mut line = JournalLine::debit(&l.account_code, l.debit);
            line.credit = l.credit;
            match l.document_id {
                Some(doc) => line.with_document(DocumentId(doc)),
                None => line,
            }
        })
        .collect();
    let competence = input.competence.unwrap_or_else(|| Competence::of(input.date));
    let entry = JournalEntry::new(ClientId(input.client_id), input.date, competence, &input.memo, lines);

    let imbalance = post_entry(store, &entry).await?;
    Ok(PostedEntry {
        id: entry.id.to_string(),
        competence,
        total_debits: entry.total_debits(),
        imbalance,
    })
}

pub async fn import<S: Store>(
    store: &S,
    config: &AppConfig,
    path: &Path,
    client_id: &str,
    bank_account_id: Option<&str>,
    exclusive: bool,
) -> anyhow::Result<ImportOutput> {
    let file = std::fs::File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let parsed = read_statement(file, &StatementProfile::with_delimiter(config.delimiter()))?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    let policy = if exclusive || config.import.exclusive_matching {
        MatchPolicy::Exclusive
    } else {
        MatchPolicy::Shared
    };
    let summary = import_statement(
        store,
        ImportRequest {
            client_id: ClientId::from(client_id),
            bank_account_id: bank_account_id.map(BankAccountId::from),
            file_name: file_name.clone(),
            rows: parsed.rows,
            policy,
        },
    )
    .await?;

    Ok(ImportOutput {
        file: file_name,
        imported: summary.imported,
        matched: summary.matched,
        suggested: summary.suggested,
        skipped: parsed.skipped,
    })
}

pub async fn apportion<S: Store>(
    store: &S,
    client_id: &str,
    competence: Competence,
    save: bool,
) -> anyhow::Result<ApportionOutput> {
    let client_id = ClientId::from(client_id);
    let Some(result) = contabia_tax::compute(store, &client_id, competence).await? else {
        bail!("cannot compute taxes: client {client_id} has no recognized tax regime");
    };
    let saved = if save {
        Some(contabia_tax::save_apportionment(store, &client_id, &result).await?)
    } else {
        None
    };
    Ok(ApportionOutput { result, saved })
}

pub async fn pay<S: Store>(store: &S, period_id: &str, item_id: &str) -> anyhow::Result<TaxPeriod> {
    Ok(contabia_tax::confirm_payment(store, &TaxPeriodId::from(period_id), &TaxItemId::from(item_id)).await?)
}

pub async fn link_guide<S: Store>(
    store: &S,
    period_id: &str,
    item_id: &str,
    document_id: &str,
) -> anyhow::Result<TaxPeriod> {
    Ok(contabia_tax::link_guide(
        store,
        &TaxPeriodId::from(period_id),
        &TaxItemId::from(item_id),
        &DocumentId::from(document_id),
    )
    .await?)
}

pub async fn deadlines<S: Store>(store: &S, today: NaiveDate, window_days: i64) -> anyhow::Result<DeadlinesOutput> {
    let marked_late = contabia_tax::refresh_overdue(store, today).await?.len();
    let periods: Vec<TaxPeriod> = store.get_all().await?;
    let obligations: Vec<Obligation> = store.get_all().await?;
    Ok(DeadlinesOutput {
        marked_late,
        alerts: contabia_tax::due_alerts(&periods, &obligations, today, window_days),
    })
}

pub struct DocumentInput<'a> {
    pub client_id: &'a str,
    pub kind: DocumentKind,
    pub competence: Competence,
    pub date: NaiveDate,
    pub value: Money,
    pub description: &'a str,
}

/// Files `path` as a supporting document; the content hash is stored with it.
pub async fn add_document<S: Store>(store: &S, path: &Path, input: DocumentInput<'_>) -> anyhow::Result<Document> {
    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let document = Document {
        id: DocumentId::generate(),
        client_id: ClientId::from(input.client_id),
        kind: input.kind,
        competence: input.competence,
        date: input.date,
        value: input.value,
        description: input.description.to_string(),
        file_name: path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string()),
        sha256: audit::file_digest(&bytes),
        ocr_status: OcrStatus::Pending,
    };
    register_document(store, &document).await?;
    Ok(document)
}

pub async fn add_obligation<S: Store>(
    store: &S,
    client_id: &str,
    name: &str,
    competence: Competence,
    due_date: NaiveDate,
) -> anyhow::Result<Obligation> {
    let obligation = Obligation::new(ClientId::from(client_id), name, competence, due_date);
    register_obligation(store, &obligation).await?;
    Ok(obligation)
}

pub async fn submit<S: Store>(store: &S, obligation_id: &str) -> anyhow::Result<Obligation> {
    submit_obligation(store, &ObligationId::from(obligation_id))
        .await?
        .with_context(|| format!("unknown obligation {obligation_id}"))
}

async fn report_entries<S: Store>(store: &S, client_id: Option<&str>) -> anyhow::Result<Vec<JournalEntry>> {
    let entries: Vec<JournalEntry> = store.get_all().await?;
    Ok(match client_id {
        Some(id) => entries.into_iter().filter(|e| e.client_id.as_str() == id).collect(),
        None => entries,
    })
}

pub async fn income<S: Store>(store: &S, competence: Competence, client_id: Option<&str>) -> anyhow::Result<IncomeStatement> {
    let entries = report_entries(store, client_id).await?;
    Ok(income_statement(&entries, competence))
}

pub async fn trial<S: Store>(store: &S, competence: Competence, client_id: Option<&str>) -> anyhow::Result<TrialBalance> {
    let entries = report_entries(store, client_id).await?;
    Ok(trial_balance(&entries, competence))
}

pub async fn close_check<S: Store>(store: &S, client_id: &str, competence: Competence) -> anyhow::Result<ClosingChecklist> {
    Ok(closing_review(store, &ClientId::from(client_id), competence).await?)
}

pub async fn audit_status<S: Store>(store: &S) -> anyhow::Result<AuditOutput> {
    let log = store.audit_log().await?;
    Ok(AuditOutput {
        entries: log.len(),
        chain_intact: audit::verify_chain(&log),
    })
}
