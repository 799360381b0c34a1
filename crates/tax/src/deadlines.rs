use chrono::NaiveDate;
use contabia_core::{ClientId, Competence, Money, Obligation, ObligationId, TaxItemId, TaxPeriod, TaxPeriodId, TaxType};
use serde::{Deserialize, Serialize};

pub const DEFAULT_WINDOW_DAYS: i64 = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DueAlert {
    pub period_id: TaxPeriodId,
    pub client_id: ClientId,
    pub competence: Competence,
    pub item_id: TaxItemId,
    pub tax_type: TaxType,
    pub value: Money,
    pub due_date: NaiveDate,
    /// Negative once the due date has passed.
    pub days_left: i64,
}

/// A filing not yet sent whose deadline is past or near.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObligationAlert {
    pub obligation_id: ObligationId,
    pub client_id: ClientId,
    pub competence: Competence,
    pub name: String,
    pub due_date: NaiveDate,
    pub days_left: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DueAlerts {
    pub overdue: Vec<DueAlert>,
    pub upcoming: Vec<DueAlert>,
    pub obligations: Vec<ObligationAlert>,
}

impl DueAlerts {
    pub fn is_empty(&self) -> bool {
        self.overdue.is_empty() && self.upcoming.is_empty() && self.obligations.is_empty()
    }
}

/// Unpaid items already past due or falling due within `window_days` of
/// `today`, plus unsent obligations under the same rule. Every list is
/// ordered by due date.
pub fn due_alerts(periods: &[TaxPeriod], obligations: &[Obligation], today: NaiveDate, window_days: i64) -> DueAlerts {
    let mut alerts = DueAlerts::default();
    for period in periods {
        for item in period.unpaid_items() {
            let days_left = (item.due_date - today).num_days();
            if days_left > window_days {
                continue;
            }
            let alert = DueAlert {
                period_id: period.id.clone(),
                client_id: period.client_id.clone(),
                competence: period.competence,
                item_id: item.id.clone(),
                tax_type: item.tax_type,
                value: item.value,
                due_date: item.due_date,
                days_left,
            };
            if days_left < 0 {
                alerts.overdue.push(alert);
            } else {
                alerts.upcoming.push(alert);
            }
        }
    }
    for ob in obligations.iter().filter(|o| !o.is_sent()) {
        let days_left = (ob.due_date - today).num_days();
        if days_left <= window_days {
            alerts.obligations.push(ObligationAlert {
                obligation_id: ob.id.clone(),
                client_id: ob.client_id.clone(),
                competence: ob.competence,
                name: ob.name.clone(),
                due_date: ob.due_date,
                days_left,
            });
        }
    }
    alerts.overdue.sort_by_key(|a| a.due_date);
    alerts.upcoming.sort_by_key(|a| a.due_date);
    alerts.obligations.sort_by_key(|a| a.due_date);
    alerts
}

/// Whether the period has an unpaid item past due on `today`.
pub fn is_overdue(period: &TaxPeriod, today: NaiveDate) -> bool {
    period.unpaid_items().any(|i| i.due_date < today)
}
