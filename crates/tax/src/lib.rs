pub mod deadlines;
pub mod regime;
pub mod service;

pub use deadlines::{due_alerts, is_overdue, DueAlert, DueAlerts, ObligationAlert, DEFAULT_WINDOW_DAYS};
pub use regime::{apportion, simples_bracket, AssessedTax, BreakdownLine, SimplesBracket, TaxResult, SIMPLES_ANEXO_III};
pub use service::{compute, confirm_payment, link_guide, refresh_overdue, save_apportionment, TaxError};
