use serde::{Deserialize, Serialize};
use std::fmt;

/// Classification of an account, derived from the first segment of its
/// hierarchical code ("5.1.1" is an expense).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AccountClass {
    Asset,
    Liability,
    Equity,
    Revenue,
    Expense,
}

impl AccountClass {
    pub fn of_code(code: &str) -> Option<Self> {
        match code.trim().chars().next()? {
            '1' => Some(AccountClass::Asset),
            '2' => Some(AccountClass::Liability),
            '3' => Some(AccountClass::Equity),
            '4' => Some(AccountClass::Revenue),
            '5' => Some(AccountClass::Expense),
            _ => None,
        }
    }

    pub fn prefix(self) -> &'static str {
        match self {
            AccountClass::Asset => "1",
            AccountClass::Liability => "2",
            AccountClass::Equity => "3",
            AccountClass::Revenue => "4",
            AccountClass::Expense => "5",
        }
    }
}

impl fmt::Display for AccountClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccountClass::Asset => write!(f, "Asset"),
            AccountClass::Liability => write!(f, "Liability"),
            AccountClass::Equity => write!(f, "Equity"),
            AccountClass::Revenue => write!(f, "Revenue"),
            AccountClass::Expense => write!(f, "Expense"),
        }
    }
}

/// Depth of a hierarchical code: "1" is 1, "1.1.3" is 3.
pub fn code_level(code: &str) -> usize {
    code.split('.').count()
}

/// Reference chart of accounts used to fill in names for bare codes.
pub const DEFAULT_CHART: &[(&str, &str)] = &[
    ("1", "ATIVO"),
    ("1.1", "Ativo Circulante"),
    ("1.1.1", "Caixa e Equivalentes"),
    ("1.1.2", "Bancos c/ Movimento"),
    ("1.1.3", "Clientes a Receber"),
    ("1.2", "Ativo Não Circulante"),
    ("1.2.1", "Imobilizado"),
    ("2", "PASSIVO"),
    ("2.1", "Passivo Circulante"),
    ("2.1.1", "Fornecedores"),
    ("2.1.2", "Impostos a Pagar"),
    ("2.1.3", "Salários a Pagar"),
    ("3", "PATRIMÔNIO LÍQUIDO"),
    ("3.1", "Capital Social"),
    ("4", "RECEITAS"),
    ("4.1", "Receita de Serviços"),
    ("4.2", "Receita de Vendas"),
    ("5", "DESPESAS"),
    ("5.1", "Despesas Operacionais"),
    ("5.1.1", "Aluguel"),
    ("5.1.2", "Energia Elétrica"),
    ("5.1.3", "Internet e Telefone"),
    ("5.1.4", "Material de Escritório"),
    ("5.2", "Despesas com Pessoal"),
    ("5.2.1", "Salários e Ordenados"),
    ("5.3", "Impostos e Taxas"),
];

pub fn default_account_name(code: &str) -> Option<&'static str> {
    DEFAULT_CHART
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, name)| *name)
}
