use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::ids::{ClientId, DocumentId};
use crate::money::Money;
use crate::period::Competence;
use crate::record::Record;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    /// Incoming invoice (NF de entrada).
    NfEntrada,
    /// Issued invoice (NF de saída).
    NfSaida,
    Extrato,
    Boleto,
    Guia,
    Contrato,
    Outro,
}

impl FromStr for DocumentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "nf_entrada" => Ok(DocumentKind::NfEntrada),
            "nf_saida" => Ok(DocumentKind::NfSaida),
            "extrato" => Ok(DocumentKind::Extrato),
            "boleto" => Ok(DocumentKind::Boleto),
            "guia" => Ok(DocumentKind::Guia),
            "contrato" => Ok(DocumentKind::Contrato),
            "outro" => Ok(DocumentKind::Outro),
            _ => Err(format!("Unknown document kind: '{}'", s.trim())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OcrStatus {
    Pending,
    Processing,
    Done,
    Error,
}

/// A supporting file (invoice, guide, statement) filed under a competence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,
    pub client_id: ClientId,
    pub kind: DocumentKind,
    pub competence: Competence,
    pub date: NaiveDate,
    pub value: Money,
    #[serde(default)]
    pub description: String,
    pub file_name: String,
    /// Hex SHA-256 of the file contents.
    #[serde(default)]
    pub sha256: String,
    pub ocr_status: OcrStatus,
}

impl Document {
    pub fn is_invoice(&self) -> bool {
        matches!(self.kind, DocumentKind::NfEntrada | DocumentKind::NfSaida)
    }

    pub fn ocr_waiting(&self) -> bool {
        matches!(self.ocr_status, OcrStatus::Pending | OcrStatus::Processing)
    }
}

impl Record for Document {
    const COLLECTION: &'static str = "documents";

    fn record_id(&self) -> &str {
        self.id.as_str()
    }
}
