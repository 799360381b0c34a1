//! Month-close review: what still blocks closing a competence.

use serde::{Deserialize, Serialize};

use crate::client::Client;
use crate::document::{Document, OcrStatus};
use crate::journal::JournalEntry;
use crate::money::Money;
use crate::obligation::{Obligation, ObligationStatus};
use crate::period::Competence;
use crate::tax::{TaxPeriod, TaxPeriodStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckCategory {
    Documents,
    Entries,
    Taxes,
    Obligations,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckItem {
    pub id: String,
    pub category: CheckCategory,
    pub label: String,
    pub detail: String,
    pub ok: bool,
    pub severity: Severity,
}

impl CheckItem {
    fn new(id: &str, category: CheckCategory, ok: bool, severity: Severity, label: String, detail: String) -> Self {
        CheckItem {
            id: id.to_string(),
            category,
            label,
            detail,
            ok,
            severity,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClosingChecklist {
    pub competence: Competence,
    pub items: Vec<CheckItem>,
}

impl ClosingChecklist {
    /// No failing item at error severity.
    pub fn can_close(&self) -> bool {
        !self.items.iter().any(|i| !i.ok && i.severity == Severity::Error)
    }

    pub fn failures(&self) -> impl Iterator<Item = &CheckItem> {
        self.items.iter().filter(|i| !i.ok)
    }
}

/// Snapshot of everything the month-close review looks at.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClosingInputs<'a> {
    pub clients: &'a [Client],
    pub documents: &'a [Document],
    pub entries: &'a [JournalEntry],
    pub tax_periods: &'a [TaxPeriod],
    pub obligations: &'a [Obligation],
}

fn plural(n: usize, one: &str, many: &str) -> String {
    format!("{n} {}", if n == 1 { one } else { many })
}

pub fn closing_checklist(inputs: &ClosingInputs<'_>, competence: Competence) -> ClosingChecklist {
    let mut items = Vec::new();
    check_documents(&mut items, inputs, competence);
    check_entries(&mut items, inputs.entries, competence);
    check_taxes(&mut items, inputs.tax_periods, competence);
    check_obligations(&mut items, inputs.obligations, competence);
    ClosingChecklist { competence, items }
}

fn check_documents(items: &mut Vec<CheckItem>, inputs: &ClosingInputs<'_>, competence: Competence) {
    let docs: Vec<&Document> = inputs.documents.iter().filter(|d| d.competence == competence).collect();
    let count = docs.len();
    items.push(CheckItem::new(
        "doc_count",
        CheckCategory::Documents,
        count > 0,
        if count > 0 { Severity::Info } else { Severity::Warning },
        format!("{} in competence", plural(count, "document", "documents")),
        if count == 0 {
            "No documents filed for this month".to_string()
        } else {
            format!("{count} found")
        },
    ));

    let waiting = docs.iter().filter(|d| d.ocr_waiting()).count();
    if waiting > 0 {
        items.push(CheckItem::new(
            "doc_ocr_pending",
            CheckCategory::Documents,
            false,
            Severity::Warning,
            format!("{} awaiting OCR", plural(waiting, "document", "documents")),
            "Documents not yet processed".to_string(),
        ));
    }

    let failed = docs.iter().filter(|d| d.ocr_status == OcrStatus::Error).count();
    if failed > 0 {
        items.push(CheckItem::new(
            "doc_ocr_error",
            CheckCategory::Documents,
            false,
            Severity::Error,
            format!("{} with OCR errors", plural(failed, "document", "documents")),
            "Processing failed for these documents".to_string(),
        ));
    }

    for client in inputs.clients {
        if !docs.iter().any(|d| d.client_id == client.id && d.is_invoice()) {
            items.push(CheckItem::new(
                &format!("doc_nf_{}", client.id),
                CheckCategory::Documents,
                false,
                Severity::Warning,
                format!("{}: no invoice in competence", client.legal_name),
                "No incoming or outgoing invoice found".to_string(),
            ));
        }
    }
}

fn check_entries(items: &mut Vec<CheckItem>, entries: &[JournalEntry], competence: Competence) {
    let period_entries: Vec<&JournalEntry> = entries.iter().filter(|e| e.competence == competence).collect();

    let count = period_entries.len();
    items.push(CheckItem::new(
        "entry_count",
        CheckCategory::Entries,
        count > 0,
        if count > 0 { Severity::Info } else { Severity::Error },
        format!("{} in competence", plural(count, "journal entry", "journal entries")),
        if count == 0 {
            "No journal entries recorded".to_string()
        } else {
            format!("{count} posted")
        },
    ));

    let debits: Money = period_entries.iter().map(|e| e.total_debits()).sum();
    let credits: Money = period_entries.iter().map(|e| e.total_credits()).sum();
    let balanced = debits == credits;
    items.push(CheckItem::new(
        "entry_balance",
        CheckCategory::Entries,
        balanced,
        if balanced { Severity::Info } else { Severity::Error },
        if balanced {
            "Debits and credits balance".to_string()
        } else {
            "Debits and credits do not balance".to_string()
        },
        format!("Debits: {debits} | Credits: {credits}"),
    ));

    let undocumented = period_entries.iter().filter(|e| !e.has_document()).count();
    if undocumented > 0 {
        items.push(CheckItem::new(
            "entry_no_doc",
            CheckCategory::Entries,
            false,
            Severity::Warning,
            format!("{} without a supporting document", plural(undocumented, "entry", "entries")),
            "Entries should reference their source document".to_string(),
        ));
    }
}

fn check_taxes(items: &mut Vec<CheckItem>, tax_periods: &[TaxPeriod], competence: Competence) {
    let periods: Vec<&TaxPeriod> = tax_periods.iter().filter(|p| p.competence == competence).collect();
    if periods.is_empty() {
        items.push(CheckItem::new(
            "tax_not_computed",
            CheckCategory::Taxes,
            false,
            Severity::Error,
            "Taxes not computed for this competence".to_string(),
            "Run apportionment before closing the month".to_string(),
        ));
    }

    for period in periods {
        let unpaid = period.unpaid_items().count();
        items.push(CheckItem::new(
            &format!("tax_status_{}", period.id),
            CheckCategory::Taxes,
            unpaid == 0,
            if unpaid == 0 { Severity::Info } else { Severity::Error },
            if period.status == TaxPeriodStatus::Paid {
                format!("Taxes for {competence}: all paid")
            } else {
                format!("{unpaid} tax item(s) awaiting payment")
            },
            format!("Total: {}", period.total()),
        ));

        let without_guide = period.items.iter().filter(|i| i.guide_doc_id.is_none()).count();
        if without_guide > 0 {
            items.push(CheckItem::new(
                &format!("tax_guide_{}", period.id),
                CheckCategory::Taxes,
                false,
                Severity::Warning,
                format!("{without_guide} guide(s) without a linked receipt"),
                "Link payment receipts to their guides".to_string(),
            ));
        }
    }
}

fn check_obligations(items: &mut Vec<CheckItem>, obligations: &[Obligation], competence: Competence) {
    let period: Vec<&Obligation> = obligations.iter().filter(|o| o.competence == competence).collect();
    if period.is_empty() {
        items.push(CheckItem::new(
            "ob_none",
            CheckCategory::Obligations,
            false,
            Severity::Warning,
            "No accessory obligations in competence".to_string(),
            "Check which filings apply to the client's regime".to_string(),
        ));
        return;
    }

    let names = |status: ObligationStatus| -> Vec<&str> {
        period.iter().filter(|o| o.status == status).map(|o| o.name.as_str()).collect()
    };
    let sent = names(ObligationStatus::Sent);
    let pending = names(ObligationStatus::Pending);
    let late = names(ObligationStatus::Late);

    if sent.len() == period.len() {
        items.push(CheckItem::new(
            "ob_all_sent",
            CheckCategory::Obligations,
            true,
            Severity::Info,
            format!("All {} sent", plural(sent.len(), "obligation", "obligations")),
            "Accessory obligations up to date".to_string(),
        ));
    }
    if !pending.is_empty() {
        items.push(CheckItem::new(
            "ob_pending",
            CheckCategory::Obligations,
            false,
            Severity::Warning,
            format!("{} pending", plural(pending.len(), "obligation", "obligations")),
            pending.join(", "),
        ));
    }
    if !late.is_empty() {
        items.push(CheckItem::new(
            "ob_late",
            CheckCategory::Obligations,
            false,
            Severity::Error,
            format!("{} late", plural(late.len(), "obligation", "obligations")),
            late.join(", "),
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::TaxRegime;
    use crate::document::DocumentKind;
    use crate::ids::{ClientId, DocumentId, TaxItemId, TaxPeriodId};
    use crate::journal::JournalLine;
    use crate::tax::{TaxItem, TaxType};
    use chrono::NaiveDate;

    fn jan() -> Competence {
        "2025-01".parse().unwrap()
    }

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, d).unwrap()
    }

    fn entry(debit: i64, credit: i64, doc: bool) -> JournalEntry {
        let mut debit_line = JournalLine::debit("1.1.3", Money::from_cents(debit));
        if doc {
            debit_line = debit_line.with_document(DocumentId::from("doc"));
        }
        JournalEntry::new(
            ClientId::from("c1"),
            date(5),
            jan(),
            "memo",
            vec![debit_line, JournalLine::credit("4.1", Money::from_cents(credit))],
        )
    }

    fn period(paid: bool, guide: bool) -> TaxPeriod {
        TaxPeriod {
            id: TaxPeriodId::from("tp1"),
            client_id: ClientId::from("c1"),
            competence: jan(),
            status: if paid { TaxPeriodStatus::Paid } else { TaxPeriodStatus::Computed },
            items: vec![TaxItem {
                id: TaxItemId::generate(),
                tax_type: TaxType::Das,
                value: Money::from_cents(90_000),
                due_date: NaiveDate::from_ymd_opt(2025, 2, 20).unwrap(),
                paid,
                guide_doc_id: guide.then(|| DocumentId::from("guide")),
            }],
        }
    }

    fn document(id: &str, kind: DocumentKind, ocr: OcrStatus) -> Document {
        Document {
            id: DocumentId::from(id),
            client_id: ClientId::from("c1"),
            kind,
            competence: jan(),
            date: date(5),
            value: Money::from_cents(1_500_000),
            description: "NF 001".to_string(),
            file_name: format!("{id}.pdf"),
            sha256: String::new(),
            ocr_status: ocr,
        }
    }

    fn obligation(name: &str, status: ObligationStatus) -> Obligation {
        let mut ob = Obligation::new(ClientId::from("c1"), name, jan(), NaiveDate::from_ymd_opt(2025, 2, 15).unwrap());
        ob.status = status;
        ob
    }

    fn ids(checklist: &ClosingChecklist) -> Vec<&str> {
        checklist.failures().map(|i| i.id.as_str()).collect()
    }

    #[test]
    fn clean_month_can_close() {
        let clients = [Client::new(ClientId::from("c1"), "Tech Solutions Ltda", "0", TaxRegime::Simples)];
        let documents = [document("nf1", DocumentKind::NfSaida, OcrStatus::Done)];
        let entries = [entry(100, 100, true)];
        let periods = [period(true, true)];
        let obligations = [obligation("DCTFWeb", ObligationStatus::Sent)];
        let checklist = closing_checklist(
            &ClosingInputs {
                clients: &clients,
                documents: &documents,
                entries: &entries,
                tax_periods: &periods,
                obligations: &obligations,
            },
            jan(),
        );
        assert!(checklist.can_close());
        assert_eq!(checklist.failures().count(), 0);
        assert!(checklist.items.iter().any(|i| i.id == "ob_all_sent" && i.ok));
    }

    #[test]
    fn empty_month_blocks_close() {
        let checklist = closing_checklist(&ClosingInputs::default(), jan());
        assert!(!checklist.can_close());
        assert_eq!(ids(&checklist), vec!["doc_count", "entry_count", "tax_not_computed", "ob_none"]);
    }

    #[test]
    fn imbalance_and_missing_support_are_flagged() {
        let entries = [entry(100, 90, false)];
        let periods = [period(false, false)];
        let inputs = ClosingInputs {
            entries: &entries,
            tax_periods: &periods,
            ..ClosingInputs::default()
        };
        let checklist = closing_checklist(&inputs, jan());
        assert!(!checklist.can_close());
        let failing: Vec<&str> = checklist
            .failures()
            .filter(|i| matches!(i.category, CheckCategory::Entries | CheckCategory::Taxes))
            .map(|i| i.id.as_str())
            .collect();
        assert_eq!(failing, vec!["entry_balance", "entry_no_doc", "tax_status_tp1", "tax_guide_tp1"]);
    }

    #[test]
    fn document_checks() {
        let clients = [Client::new(ClientId::from("c1"), "Tech Solutions Ltda", "0", TaxRegime::Simples)];
        let documents = [
            document("boleto", DocumentKind::Boleto, OcrStatus::Pending),
            document("extrato", DocumentKind::Extrato, OcrStatus::Error),
        ];
        let inputs = ClosingInputs {
            clients: &clients,
            documents: &documents,
            ..ClosingInputs::default()
        };
        let checklist = closing_checklist(&inputs, jan());
        let docs: Vec<&CheckItem> = checklist
            .items
            .iter()
            .filter(|i| i.category == CheckCategory::Documents)
            .collect();
        let ids: Vec<&str> = docs.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["doc_count", "doc_ocr_pending", "doc_ocr_error", "doc_nf_c1"]);
        assert!(docs[0].ok);
        assert_eq!(docs[2].severity, Severity::Error);
        assert_eq!(docs[3].label, "Tech Solutions Ltda: no invoice in competence");
    }

    #[test]
    fn pending_and_late_obligations() {
        let obligations = [
            obligation("DCTFWeb", ObligationStatus::Pending),
            obligation("EFD-Reinf", ObligationStatus::Late),
            obligation("DEFIS", ObligationStatus::Sent),
        ];
        let inputs = ClosingInputs {
            obligations: &obligations,
            ..ClosingInputs::default()
        };
        let checklist = closing_checklist(&inputs, jan());
        let obs: Vec<&CheckItem> = checklist
            .items
            .iter()
            .filter(|i| i.category == CheckCategory::Obligations)
            .collect();
        assert_eq!(obs.len(), 2);
        assert_eq!(obs[0].id, "ob_pending");
        assert_eq!(obs[0].detail, "DCTFWeb");
        assert_eq!(obs[0].severity, Severity::Warning);
        assert_eq!(obs[1].id, "ob_late");
        assert_eq!(obs[1].detail, "EFD-Reinf");
        assert_eq!(obs[1].severity, Severity::Error);
    }

    #[test]
    fn other_competences_do_not_count() {
        let mut feb = obligation("DCTFWeb", ObligationStatus::Late);
        feb.competence = "2025-02".parse().unwrap();
        let obligations = [feb];
        let inputs = ClosingInputs {
            obligations: &obligations,
            ..ClosingInputs::default()
        };
        let checklist = closing_checklist(&inputs, jan());
        assert!(checklist.items.iter().any(|i| i.id == "ob_none"));
        assert!(!checklist.items.iter().any(|i| i.id == "ob_late"));
    }
}
