use chrono::NaiveDate;
use contabia_core::{
    Client, ClientId, Competence, DocumentId, JournalEntry, Ledger, NewAuditEntry, TaxItem, TaxItemId,
    TaxPeriod, TaxPeriodId, TaxPeriodStatus,
};
use contabia_storage::{find_by_id, Store, StoreError};
use thiserror::Error;

use crate::deadlines::is_overdue;
use crate::regime::{apportion, TaxResult};

const AUDIT_ENTITY: &str = "tax_period";

#[derive(Debug, Error)]
pub enum TaxError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("Unknown client: {0}")]
    UnknownClient(ClientId),
    #[error("Unknown tax period: {0}")]
    UnknownPeriod(TaxPeriodId),
    #[error("Tax item {item} not found in period {period}")]
    UnknownItem { period: TaxPeriodId, item: TaxItemId },
}

/// Apportions the client's taxes for `competence` from the stored ledger.
/// `Ok(None)` means the client has no recognized regime.
pub async fn compute<S: Store>(store: &S, client_id: &ClientId, competence: Competence) -> Result<Option<TaxResult>, TaxError> {
    let client: Client = find_by_id(store, client_id.as_str())
        .await?
        .ok_or_else(|| TaxError::UnknownClient(client_id.clone()))?;
    let entries: Vec<JournalEntry> = store.get_all().await?;

    let result = apportion(&Ledger::new(&entries), &client, competence);
    match &result {
        Some(r) => tracing::debug!(client = %client.id, %competence, regime = %r.regime, total = %r.total, "apportioned"),
        None => tracing::warn!(client = %client.id, %competence, "client has no recognized tax regime"),
    }
    Ok(result)
}

/// Stores `result` as the client's tax period for its competence. An existing
/// period keeps its id and has its items replaced.
pub async fn save_apportionment<S: Store>(
    store: &S,
    client_id: &ClientId,
    result: &TaxResult,
) -> Result<TaxPeriod, TaxError> {
    let existing = store
        .get_all::<TaxPeriod>()
        .await?
        .into_iter()
        .find(|p| &p.client_id == client_id && p.competence == result.competence);

    let period = TaxPeriod {
        id: existing.as_ref().map_or_else(TaxPeriodId::generate, |p| p.id.clone()),
        client_id: client_id.clone(),
        competence: result.competence,
        status: TaxPeriodStatus::Computed,
        items: result
            .items
            .iter()
            .map(|i| TaxItem {
                id: TaxItemId::generate(),
                tax_type: i.tax_type,
                value: i.value,
                due_date: i.due_date,
                paid: false,
                guide_doc_id: None,
            })
            .collect(),
    };
    store.save(&period).await?;

    let after = serde_json::to_value(&period)?;
    let audit = match &existing {
        Some(before) => NewAuditEntry::updated(AUDIT_ENTITY, period.id.as_str(), serde_json::to_value(before)?, after),
        None => NewAuditEntry::created(AUDIT_ENTITY, period.id.as_str(), after),
    };
    store.append_audit(audit).await?;

    tracing::info!(
        client = %client_id,
        competence = %period.competence,
        items = period.items.len(),
        total = %period.total(),
        replaced = existing.is_some(),
        "saved tax apportionment"
    );
    Ok(period)
}

/// Marks one item paid; the period becomes `Paid` once every item is.
pub async fn confirm_payment<S: Store>(
    store: &S,
    period_id: &TaxPeriodId,
    item_id: &TaxItemId,
) -> Result<TaxPeriod, TaxError> {
    update_item(store, period_id, item_id, |period, item_id| {
        if let Some(item) = period.item_mut(item_id) {
            item.paid = true;
        }
        if period.all_paid() {
            period.status = TaxPeriodStatus::Paid;
        }
    })
    .await
}

/// Attaches the payment guide or receipt to an item.
pub async fn link_guide<S: Store>(
    store: &S,
    period_id: &TaxPeriodId,
    item_id: &TaxItemId,
    document_id: &DocumentId,
) -> Result<TaxPeriod, TaxError> {
    update_item(store, period_id, item_id, |period, item_id| {
        if let Some(item) = period.item_mut(item_id) {
            item.guide_doc_id = Some(document_id.clone());
        }
    })
    .await
}

async fn update_item<S, F>(
    store: &S,
    period_id: &TaxPeriodId,
    item_id: &TaxItemId,
    apply: F,
) -> Result<TaxPeriod, TaxError>
where
    S: Store,
    F: FnOnce(&mut TaxPeriod, &TaxItemId),
{
    let before: TaxPeriod = find_by_id(store, period_id.as_str())
        .await?
        .ok_or_else(|| TaxError::UnknownPeriod(period_id.clone()))?;
    if !before.items.iter().any(|i| &i.id == item_id) {
        return Err(TaxError::UnknownItem {
            period: period_id.clone(),
            item: item_id.clone(),
        });
    }

    let mut period = before.clone();
    apply(&mut period, item_id);
    store.save(&period).await?;
    store
        .append_audit(NewAuditEntry::updated(
            AUDIT_ENTITY,
            period.id.as_str(),
            serde_json::to_value(&before)?,
            serde_json::to_value(&period)?,
        ))
        .await?;

    tracing::info!(period = %period.id, item = %item_id, status = %period.status, "updated tax item");
    Ok(period)
}

/// Flags every unpaid period with an item past due as `Late`. Returns the
/// periods that changed.
pub async fn refresh_overdue<S: Store>(store: &S, today: NaiveDate) -> Result<Vec<TaxPeriod>, TaxError> {
    let mut changed = Vec::new();
    for before in store.get_all::<TaxPeriod>().await? {
        if matches!(before.status, TaxPeriodStatus::Paid | TaxPeriodStatus::Late) || !is_overdue(&before, today) {
            continue;
        }
        let mut period = before.clone();
        period.status = TaxPeriodStatus::Late;
        store.save(&period).await?;
        store
            .append_audit(NewAuditEntry::updated(
                AUDIT_ENTITY,
                period.id.as_str(),
                serde_json::to_value(&before)?,
                serde_json::to_value(&period)?,
            ))
            .await?;
        changed.push(period);
    }
    if !changed.is_empty() {
        tracing::info!(count = changed.len(), %today, "marked tax periods late");
    }
    Ok(changed)
}
