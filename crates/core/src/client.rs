use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::ids::{BankAccountId, ClientId};
use crate::record::Record;

/// The four mutually exclusive regimes a client's taxes are computed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaxRegime {
    #[serde(rename = "MEI")]
    Mei,
    Simples,
    Presumido,
    Real,
}

impl fmt::Display for TaxRegime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaxRegime::Mei => write!(f, "MEI"),
            TaxRegime::Simples => write!(f, "Simples Nacional"),
            TaxRegime::Presumido => write!(f, "Lucro Presumido"),
            TaxRegime::Real => write!(f, "Lucro Real"),
        }
    }
}

impl FromStr for TaxRegime {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "MEI" | "mei" => Ok(TaxRegime::Mei),
            "Simples" | "simples" => Ok(TaxRegime::Simples),
            "Presumido" | "presumido" => Ok(TaxRegime::Presumido),
            "Real" | "real" => Ok(TaxRegime::Real),
            other => Err(format!("Unknown tax regime: '{other}'")),
        }
    }
}

/// Reads a stored regime tag, mapping anything unrecognized to `None`
/// instead of failing the whole client record.
fn lenient_regime<'de, D>(deserializer: D) -> Result<Option<TaxRegime>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.and_then(|s| s.parse().ok()))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BankAccountKind {
    Checking,
    Savings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BankAccount {
    pub id: BankAccountId,
    pub bank: String,
    pub agency: String,
    pub account: String,
    pub kind: BankAccountKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Client {
    pub id: ClientId,
    pub legal_name: String,
    /// CNPJ or CPF.
    pub tax_id: String,
    #[serde(default, deserialize_with = "lenient_regime")]
    pub regime: Option<TaxRegime>,
    /// CNAE industry classification.
    #[serde(default)]
    pub industry: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub bank_accounts: Vec<BankAccount>,
}

impl Client {
    pub fn new(id: ClientId, legal_name: &str, tax_id: &str, regime: TaxRegime) -> Self {
        Client {
            id,
            legal_name: legal_name.to_string(),
            tax_id: tax_id.to_string(),
            regime: Some(regime),
            industry: String::new(),
            email: String::new(),
            phone: String::new(),
            address: String::new(),
            bank_accounts: Vec::new(),
        }
    }

    pub fn primary_bank_account(&self) -> Option<&BankAccount> {
        self.bank_accounts.first()
    }
}

impl Record for Client {
    const COLLECTION: &'static str = "clients";

    fn record_id(&self) -> &str {
        self.id.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn regime_parses_stored_tags() {
        assert_eq!("MEI".parse::<TaxRegime>(), Ok(TaxRegime::Mei));
        assert_eq!("Simples".parse::<TaxRegime>(), Ok(TaxRegime::Simples));
        assert!("Imune".parse::<TaxRegime>().is_err());
    }

    #[test]
    fn unknown_regime_deserializes_as_none() {
        let json = r#"{"id":"c1","legal_name":"Acme","tax_id":"1","regime":"Imune"}"#;
        let client: Client = serde_json::from_str(json).unwrap();
        assert_eq!(client.regime, None);
    }

    #[test]
    fn known_regime_round_trips() {
        let client = Client::new(ClientId::from("c1"), "Acme", "1", TaxRegime::Mei);
        let json = serde_json::to_string(&client).unwrap();
        assert!(json.contains("\"regime\":\"MEI\""));
        let back: Client = serde_json::from_str(&json).unwrap();
        assert_eq!(back.regime, Some(TaxRegime::Mei));
    }
}
