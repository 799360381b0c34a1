use contabia_core::{
    closing_checklist, Client, ClientId, ClosingChecklist, ClosingInputs, Competence, Document, JournalEntry, Money,
    NewAuditEntry, Obligation, ObligationId, ObligationStatus, Record, TaxPeriod,
};

use crate::store::{find_by_id, Store, StoreError};

/// Persists a new journal entry and records its creation. The returned
/// imbalance (debits − credits) is informational: unbalanced entries are
/// stored all the same.
pub async fn post_entry<S: Store>(store: &S, entry: &JournalEntry) -> Result<Money, StoreError> {
    store.save(entry).await?;
    store
        .append_audit(NewAuditEntry::created(
            "journal_entry",
            entry.id.as_str(),
            serde_json::to_value(entry)?,
        ))
        .await?;

    let imbalance = entry.imbalance();
    if imbalance.is_zero() {
        tracing::info!(entry = %entry.id, client = %entry.client_id, competence = %entry.competence, "posted entry");
    } else {
        tracing::warn!(entry = %entry.id, %imbalance, "posted unbalanced entry");
    }
    Ok(imbalance)
}

pub async fn client_entries<S: Store>(store: &S, client_id: &ClientId) -> Result<Vec<JournalEntry>, StoreError> {
    Ok(store
        .get_all::<JournalEntry>()
        .await?
        .into_iter()
        .filter(|e| &e.client_id == client_id)
        .collect())
}

/// Files a supporting document and records its creation.
pub async fn register_document<S: Store>(store: &S, document: &Document) -> Result<(), StoreError> {
    store.save(document).await?;
    store
        .append_audit(NewAuditEntry::created("document", document.id.as_str(), serde_json::to_value(document)?))
        .await?;
    tracing::info!(document = %document.id, client = %document.client_id, competence = %document.competence, "registered document");
    Ok(())
}

pub async fn register_obligation<S: Store>(store: &S, obligation: &Obligation) -> Result<(), StoreError> {
    store.save(obligation).await?;
    store
        .append_audit(NewAuditEntry::created(
            "obligation",
            obligation.id.as_str(),
            serde_json::to_value(obligation)?,
        ))
        .await?;
    tracing::info!(obligation = %obligation.id, name = %obligation.name, due = %obligation.due_date, "registered obligation");
    Ok(())
}

/// Marks an obligation as filed. `Ok(None)` when no such obligation exists.
pub async fn submit_obligation<S: Store>(store: &S, id: &ObligationId) -> Result<Option<Obligation>, StoreError> {
    let Some(before) = find_by_id::<Obligation, S>(store, id.as_str()).await? else {
        return Ok(None);
    };
    let mut obligation = before.clone();
    obligation.status = ObligationStatus::Sent;
    store.save(&obligation).await?;
    store
        .append_audit(NewAuditEntry::updated(
            "obligation",
            obligation.id.as_str(),
            serde_json::to_value(&before)?,
            serde_json::to_value(&obligation)?,
        ))
        .await?;
    Ok(Some(obligation))
}

async fn owned_by<R, S, F>(store: &S, keep: F) -> Result<Vec<R>, StoreError>
where
    R: Record,
    S: Store,
    F: Fn(&R) -> bool,
{
    Ok(store.get_all::<R>().await?.into_iter().filter(|r| keep(r)).collect())
}

/// Month-close review of one client's stored records.
pub async fn closing_review<S: Store>(
    store: &S,
    client_id: &ClientId,
    competence: Competence,
) -> Result<ClosingChecklist, StoreError> {
    let clients: Vec<Client> = owned_by(store, |c: &Client| &c.id == client_id).await?;
    let documents: Vec<Document> = owned_by(store, |d: &Document| &d.client_id == client_id).await?;
    let entries = client_entries(store, client_id).await?;
    let tax_periods: Vec<TaxPeriod> = owned_by(store, |p: &TaxPeriod| &p.client_id == client_id).await?;
    let obligations: Vec<Obligation> = owned_by(store, |o: &Obligation| &o.client_id == client_id).await?;

    let inputs = ClosingInputs {
        clients: &clients,
        documents: &documents,
        entries: &entries,
        tax_periods: &tax_periods,
        obligations: &obligations,
    };
    Ok(closing_checklist(&inputs, competence))
}
