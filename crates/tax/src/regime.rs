//! Regime-dependent monthly tax apportionment.
//!
//! Every regime reads the client's ledger for one competence and yields the
//! tax items owed, their due dates (in the following month) and a breakdown
//! of the computation meant to be shown to the user as-is.

use chrono::NaiveDate;
use contabia_core::{Client, Competence, Ledger, Money, TaxRegime, TaxType};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Fixed monthly DAS-MEI (INSS + ISS/ICMS).
pub const MEI_MONTHLY_DAS: Decimal = Decimal::from_parts(7590, 0, 0, false, 2);

/// Day of the following month on which each obligation falls due.
pub mod due_day {
    pub const DAS: u32 = 20;
    pub const IRPJ_CSLL: u32 = 30;
    pub const PIS_COFINS: u32 = 25;
    pub const ISS: u32 = 15;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimplesBracket {
    /// Upper bound of trailing twelve-month revenue, inclusive.
    pub ceiling: Decimal,
    /// Nominal rate, in percent.
    pub nominal_rate: Decimal,
    pub deduction: Decimal,
}

const fn bracket(ceiling: i64, rate_tenths: i64, deduction: i64) -> SimplesBracket {
    SimplesBracket {
        ceiling: Decimal::from_parts(ceiling as u32, 0, 0, false, 0),
        nominal_rate: Decimal::from_parts(rate_tenths as u32, 0, 0, false, 1),
        deduction: Decimal::from_parts(deduction as u32, 0, 0, false, 0),
    }
}

/// Simples Nacional, Anexo III (services), ascending by ceiling.
pub const SIMPLES_ANEXO_III: [SimplesBracket; 6] = [
    bracket(180_000, 60, 0),
    bracket(360_000, 112, 9_360),
    bracket(720_000, 135, 17_640),
    bracket(1_800_000, 160, 35_640),
    bracket(3_600_000, 210, 125_640),
    bracket(4_800_000, 330, 648_000),
];

/// Lucro Presumido rates. IRPJ and CSLL apply to the presumed base, the
/// rest to gross revenue.
pub mod presumido {
    use rust_decimal::Decimal;

    /// Presumed profit share of service revenue.
    pub const SERVICE_PRESUMPTION: Decimal = Decimal::from_parts(32, 0, 0, false, 2);
    pub const IRPJ: Decimal = Decimal::from_parts(15, 0, 0, false, 2);
    pub const CSLL: Decimal = Decimal::from_parts(9, 0, 0, false, 2);
    pub const PIS: Decimal = Decimal::from_parts(65, 0, 0, false, 4);
    pub const COFINS: Decimal = Decimal::from_parts(3, 0, 0, false, 2);
    pub const ISS: Decimal = Decimal::from_parts(5, 0, 0, false, 2);
}

/// Lucro Real rates. IRPJ and CSLL apply to profit, PIS and COFINS
/// (non-cumulative) to gross revenue.
pub mod real {
    use rust_decimal::Decimal;

    pub const IRPJ: Decimal = Decimal::from_parts(15, 0, 0, false, 2);
    pub const IRPJ_SURTAX: Decimal = Decimal::from_parts(10, 0, 0, false, 2);
    /// Monthly profit above which the surtax applies.
    pub const SURTAX_THRESHOLD: Decimal = Decimal::from_parts(20_000, 0, 0, false, 0);
    pub const CSLL: Decimal = Decimal::from_parts(9, 0, 0, false, 2);
    pub const PIS: Decimal = Decimal::from_parts(165, 0, 0, false, 4);
    pub const COFINS: Decimal = Decimal::from_parts(76, 0, 0, false, 3);
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessedTax {
    pub tax_type: TaxType,
    pub value: Money,
    pub due_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakdownLine {
    pub label: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxResult {
    pub regime: TaxRegime,
    pub competence: Competence,
    pub gross_revenue: Money,
    pub items: Vec<AssessedTax>,
    pub total: Money,
    /// Percent of gross revenue, two decimal places.
    pub effective_rate: Decimal,
    pub breakdown: Vec<BreakdownLine>,
}

/// Computes the client's obligations for `competence`, or `None` when the
/// client has no recognized regime.
pub fn apportion(ledger: &Ledger<'_>, client: &Client, competence: Competence) -> Option<TaxResult> {
    let regime = client.regime?;
    let revenue = ledger.revenue_total(&client.id, competence);

    let result = match regime {
        TaxRegime::Mei => mei(competence, revenue),
        TaxRegime::Simples => {
            let annualized = ledger.annualized_revenue_approx(&client.id, competence);
            simples(competence, revenue, annualized)
        }
        TaxRegime::Presumido => lucro_presumido(competence, revenue),
        TaxRegime::Real => {
            let expenses = ledger.expense_total(&client.id, competence);
            lucro_real(competence, revenue, expenses)
        }
    };
    Some(result)
}

fn mei(competence: Competence, revenue: Money) -> TaxResult {
    let das = Money::from_decimal(MEI_MONTHLY_DAS);
    let items = vec![assessed(TaxType::Das, das, competence, due_day::DAS)];
    let breakdown = vec![
        line("Receita Bruta", revenue),
        line("DAS-MEI (valor fixo)", das),
        line("Inclui", "INSS + ISS/ICMS"),
    ];
    finish(TaxRegime::Mei, competence, revenue, items, breakdown)
}

/// The first bracket whose ceiling covers `annual`, or the top bracket when
/// revenue exceeds them all.
pub fn simples_bracket(annual: Decimal) -> &'static SimplesBracket {
    SIMPLES_ANEXO_III
        .iter()
        .find(|b| annual <= b.ceiling)
        .unwrap_or(&SIMPLES_ANEXO_III[SIMPLES_ANEXO_III.len() - 1])
}

/// `(annual × nominal − deduction) / annual` as a fraction; zero revenue
/// gives a zero rate.
pub fn simples_effective_rate(annual: Decimal, bracket: &SimplesBracket) -> Decimal {
    if annual.is_zero() {
        return Decimal::ZERO;
    }
    (annual * bracket.nominal_rate / Decimal::ONE_HUNDRED - bracket.deduction) / annual
}

fn simples(competence: Competence, revenue: Money, annualized: Money) -> TaxResult {
    let annual = annualized.as_decimal();
    let bracket = simples_bracket(annual);
    let rate = simples_effective_rate(annual, bracket);
    let das = revenue * rate;

    let items = vec![assessed(TaxType::Das, das, competence, due_day::DAS)];
    let breakdown = vec![
        line("Receita Bruta Mensal", revenue),
        line("RBT12 (estimada)", annualized),
        line("Faixa Anexo III", format!("até R$ {}", thousands(bracket.ceiling))),
        line("Alíquota Nominal", percent(bracket.nominal_rate)),
        line("Dedução", format!("R$ {}", thousands(bracket.deduction))),
        line("Alíquota Efetiva", format!("{:.2}%", rate * Decimal::ONE_HUNDRED)),
        line("Valor DAS", das),
    ];
    let mut result = finish(TaxRegime::Simples, competence, revenue, items, breakdown);
    result.effective_rate = (rate * Decimal::ONE_HUNDRED).round_dp(2);
    result
}

fn lucro_presumido(competence: Competence, revenue: Money) -> TaxResult {
    let base = revenue * presumido::SERVICE_PRESUMPTION;
    let irpj = base * presumido::IRPJ;
    let csll = base * presumido::CSLL;
    let pis = revenue * presumido::PIS;
    let cofins = revenue * presumido::COFINS;
    let iss = revenue * presumido::ISS;

    let items = vec![
        assessed(TaxType::Irpj, irpj, competence, due_day::IRPJ_CSLL),
        assessed(TaxType::Csll, csll, competence, due_day::IRPJ_CSLL),
        assessed(TaxType::Pis, pis, competence, due_day::PIS_COFINS),
        assessed(TaxType::Cofins, cofins, competence, due_day::PIS_COFINS),
        assessed(TaxType::Iss, iss, competence, due_day::ISS),
    ];
    let breakdown = vec![
        line("Receita Bruta", revenue),
        line("Presunção Serviços", percent(presumido::SERVICE_PRESUMPTION * Decimal::ONE_HUNDRED)),
        line("Base Presumida", base),
        line("IRPJ (15% s/ base)", irpj),
        line("CSLL (9% s/ base)", csll),
        line("PIS (0,65% s/ fat.)", pis),
        line("COFINS (3% s/ fat.)", cofins),
        line("ISS (5% s/ fat.)", iss),
    ];
    finish(TaxRegime::Presumido, competence, revenue, items, breakdown)
}

fn lucro_real(competence: Competence, revenue: Money, expenses: Money) -> TaxResult {
    let profit = (revenue - expenses).floor_zero();
    let irpj = profit * real::IRPJ;
    let surtax = Money::from_decimal(profit.as_decimal() - real::SURTAX_THRESHOLD).floor_zero() * real::IRPJ_SURTAX;
    let csll = profit * real::CSLL;
    let pis = revenue * real::PIS;
    let cofins = revenue * real::COFINS;

    let items = vec![
        assessed(TaxType::Irpj, irpj + surtax, competence, due_day::IRPJ_CSLL),
        assessed(TaxType::Csll, csll, competence, due_day::IRPJ_CSLL),
        assessed(TaxType::Pis, pis, competence, due_day::PIS_COFINS),
        assessed(TaxType::Cofins, cofins, competence, due_day::PIS_COFINS),
    ];
    let breakdown = vec![
        line("Receita Bruta", revenue),
        line("Despesas Dedutíveis", expenses),
        line("Lucro Real", profit),
        line("IRPJ (15%)", irpj),
        line("IRPJ Adicional (10%)", surtax),
        line("CSLL (9%)", csll),
        line("PIS (1,65% não-cum.)", pis),
        line("COFINS (7,6% não-cum.)", cofins),
    ];
    finish(TaxRegime::Real, competence, revenue, items, breakdown)
}

fn assessed(tax_type: TaxType, value: Money, competence: Competence, day: u32) -> AssessedTax {
    AssessedTax {
        tax_type,
        value,
        due_date: competence.due_date(day),
    }
}

fn line(label: &str, value: impl ToString) -> BreakdownLine {
    BreakdownLine {
        label: label.to_string(),
        value: value.to_string(),
    }
}

fn finish(
    regime: TaxRegime,
    competence: Competence,
    gross_revenue: Money,
    items: Vec<AssessedTax>,
    breakdown: Vec<BreakdownLine>,
) -> TaxResult {
    let total: Money = items.iter().map(|i| i.value).sum();
    let effective_rate = if gross_revenue.is_zero() {
        Decimal::ZERO
    } else {
        (total.as_decimal() / gross_revenue.as_decimal() * Decimal::ONE_HUNDRED).round_dp(2)
    };
    TaxResult {
        regime,
        competence,
        gross_revenue,
        items,
        total,
        effective_rate,
        breakdown,
    }
}

fn percent(rate: Decimal) -> String {
    format!("{}%", rate.normalize())
}

/// Integer part grouped with dots, as in "1.800.000".
fn thousands(value: Decimal) -> String {
    let digits = value.trunc().abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push('.');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use contabia_core::{ClientId, JournalEntry, JournalLine};

    fn comp(s: &str) -> Competence {
        s.parse().unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn reais(n: i64) -> Money {
        Money::from_cents(n * 100)
    }

    fn revenue(amount: Money) -> JournalEntry {
        JournalEntry::new(
            ClientId::from("c1"),
            date(2025, 1, 10),
            comp("2025-01"),
            "Receita de serviços",
            vec![JournalLine::debit("1.1.2", amount), JournalLine::credit("4.1", amount)],
        )
    }

    fn expense(amount: Money) -> JournalEntry {
        JournalEntry::new(
            ClientId::from("c1"),
            date(2025, 1, 12),
            comp("2025-01"),
            "Aluguel",
            vec![JournalLine::debit("5.1.1", amount), JournalLine::credit("1.1.2", amount)],
        )
    }

    fn client(regime: TaxRegime) -> Client {
        Client::new(ClientId::from("c1"), "Tech Solutions Ltda", "12.345.678/0001-90", regime)
    }

    fn run(regime: TaxRegime, entries: &[JournalEntry]) -> TaxResult {
        apportion(&Ledger::new(entries), &client(regime), comp("2025-01")).unwrap()
    }

    #[test]
    fn simples_first_bracket() {
        let entries = vec![revenue(reais(15_000))];
        let result = run(TaxRegime::Simples, &entries);

        assert_eq!(result.items.len(), 1);
        let das = &result.items[0];
        assert_eq!(das.tax_type, TaxType::Das);
        assert_eq!(das.value, reais(900));
        assert_eq!(das.due_date, date(2025, 2, 20));
        assert_eq!(result.effective_rate, Decimal::new(600, 2));
        assert_eq!(result.breakdown[1].value, "R$ 180000.00");
        assert_eq!(result.breakdown[2].value, "até R$ 180.000");
        assert_eq!(result.breakdown[3].value, "6%");
        assert_eq!(result.breakdown[6].value, "R$ 900.00");
    }

    #[test]
    fn simples_second_bracket_applies_deduction() {
        // 25000 × 12 = 300000 → 11.2% with 9360 deduction
        let entries = vec![revenue(reais(25_000))];
        let result = run(TaxRegime::Simples, &entries);
        let rate = simples_effective_rate(Decimal::from(300_000), &SIMPLES_ANEXO_III[1]);
        assert_eq!(rate, Decimal::new(808, 4));
        assert_eq!(result.items[0].value, reais(2_020));
        assert_eq!(result.breakdown[3].value, "11.2%");
    }

    #[test]
    fn simples_bracket_monotonic_and_falls_back_to_top() {
        assert_eq!(simples_bracket(Decimal::from(180_000)).ceiling, Decimal::from(180_000));
        assert_eq!(simples_bracket(Decimal::from(180_001)).ceiling, Decimal::from(360_000));
        assert_eq!(simples_bracket(Decimal::from(9_000_000)).ceiling, Decimal::from(4_800_000));

        let mut last = Decimal::ZERO;
        for annual in [0i64, 100_000, 180_000, 500_000, 2_000_000, 4_800_000, 10_000_000] {
            let b = simples_bracket(Decimal::from(annual));
            assert!(b.ceiling >= last);
            last = b.ceiling;
        }
    }

    #[test]
    fn effective_rate_never_drops_across_bracket_boundary() {
        let just_over = Decimal::new(18_000_001, 2);
        let second = simples_bracket(just_over);
        assert_eq!(second, &SIMPLES_ANEXO_III[1]);
        assert_eq!(second.nominal_rate, Decimal::new(112, 1));
        assert_eq!(second.deduction, Decimal::from(9_360));

        for (at, over) in [
            (Decimal::from(180_000), just_over),
            (Decimal::from(360_000), Decimal::new(36_000_001, 2)),
        ] {
            let lower = simples_effective_rate(at, simples_bracket(at));
            let upper = simples_effective_rate(over, simples_bracket(over));
            assert!(upper >= lower, "rate fell from {lower} to {upper} past {at}");
        }
        assert_eq!(
            simples_effective_rate(Decimal::from(360_000), simples_bracket(Decimal::from(360_000))),
            Decimal::new(86, 3)
        );
    }

    #[test]
    fn simples_without_revenue_is_zero() {
        let result = run(TaxRegime::Simples, &[]);
        assert_eq!(result.items[0].value, Money::zero());
        assert_eq!(result.effective_rate, Decimal::ZERO);
    }

    #[test]
    fn mei_is_flat() {
        let entries = vec![revenue(reais(5_000))];
        let result = run(TaxRegime::Mei, &entries);
        assert_eq!(result.items.len(), 1);
        assert_eq!(result.items[0].value, Money::from_cents(7_590));
        assert_eq!(result.items[0].due_date, date(2025, 2, 20));
        assert_eq!(result.total, Money::from_cents(7_590));
        assert_eq!(result.effective_rate, Decimal::new(152, 2));
    }

    #[test]
    fn mei_without_revenue_still_owes_das() {
        let result = run(TaxRegime::Mei, &[]);
        assert_eq!(result.total, Money::from_cents(7_590));
        assert_eq!(result.effective_rate, Decimal::ZERO);
    }

    #[test]
    fn presumido_five_items() {
        let entries = vec![revenue(reais(100_000))];
        let result = run(TaxRegime::Presumido, &entries);

        let values: Vec<(TaxType, Money, NaiveDate)> =
            result.items.iter().map(|i| (i.tax_type, i.value, i.due_date)).collect();
        assert_eq!(
            values,
            vec![
                // Base 32000; February has no 30th.
                (TaxType::Irpj, reais(4_800), date(2025, 2, 28)),
                (TaxType::Csll, reais(2_880), date(2025, 2, 28)),
                (TaxType::Pis, reais(650), date(2025, 2, 25)),
                (TaxType::Cofins, reais(3_000), date(2025, 2, 25)),
                (TaxType::Iss, reais(5_000), date(2025, 2, 15)),
            ]
        );
        assert_eq!(result.total, reais(16_330));
        assert_eq!(result.effective_rate, Decimal::new(1633, 2));
        assert_eq!(result.breakdown[1].value, "32%");
        assert_eq!(result.breakdown[2].value, "R$ 32000.00");
    }

    #[test]
    fn real_loss_floors_to_zero() {
        let entries = vec![revenue(reais(10_000)), expense(reais(15_000))];
        let result = run(TaxRegime::Real, &entries);
        assert_eq!(result.items.len(), 4);
        assert_eq!(result.items[0].value, Money::zero());
        assert_eq!(result.items[1].value, Money::zero());
        assert_eq!(result.items[2].value, reais(165));
        assert_eq!(result.items[3].value, reais(760));
        assert_eq!(result.breakdown[2].value, "R$ 0.00");
    }

    #[test]
    fn real_surtax_above_threshold() {
        // Profit 50000: IRPJ 7500 + surtax 3000
        let entries = vec![revenue(reais(80_000)), expense(reais(30_000))];
        let result = run(TaxRegime::Real, &entries);
        assert_eq!(result.items[0].tax_type, TaxType::Irpj);
        assert_eq!(result.items[0].value, reais(10_500));
        assert_eq!(result.items[0].due_date, date(2025, 2, 28));
        assert_eq!(result.items[1].value, reais(4_500));
        assert_eq!(result.items[2].value, reais(1_320));
        assert_eq!(result.items[3].value, reais(6_080));
        assert_eq!(result.items[3].due_date, date(2025, 2, 25));
    }

    #[test]
    fn real_no_surtax_at_threshold() {
        let entries = vec![revenue(reais(20_000))];
        let result = run(TaxRegime::Real, &entries);
        assert_eq!(result.items[0].value, reais(3_000));
        assert_eq!(result.breakdown[4].value, "R$ 0.00");
    }

    #[test]
    fn unrecognized_regime_yields_none() {
        let mut c = client(TaxRegime::Mei);
        c.regime = None;
        assert!(apportion(&Ledger::new(&[]), &c, comp("2025-01")).is_none());
    }

    #[test]
    fn other_competences_are_ignored() {
        let mut feb = revenue(reais(40_000));
        feb.competence = comp("2025-02");
        let entries = vec![revenue(reais(15_000)), feb];
        let result = run(TaxRegime::Simples, &entries);
        assert_eq!(result.gross_revenue, reais(15_000));
    }

    #[test]
    fn thousands_grouping() {
        assert_eq!(thousands(Decimal::ZERO), "0");
        assert_eq!(thousands(Decimal::from(9_360)), "9.360");
        assert_eq!(thousands(Decimal::from(1_800_000)), "1.800.000");
    }
}
