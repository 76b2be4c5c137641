//! Canonical `(text, metadata)` rendering of a `Transaction` (spec §4.2).
//!
//! `text` is the single input fed to both `Embedder::embed_documents` and
//! the LLM context, so retrieval and generation never see a train/serve
//! mismatch.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::transaction::{PaymentMode, Transaction, TxnType};

/// Typed fields preserved alongside `Document::text` for post-retrieval
/// filtering, sorting, and display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionMetadata {
    pub txn_id: String,
    pub account_number: Option<String>,
    pub date: Option<NaiveDate>,
    pub amount: f64,
    pub txn_type: Option<TxnType>,
    pub mode: PaymentMode,
    pub narration: String,
    #[serde(default)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl TransactionMetadata {
    pub fn from_transaction(txn: &Transaction) -> Self {
        Self {
            txn_id: txn.txn_id.clone(),
            account_number: txn.account_number.clone(),
            date: txn.effective_date(),
            amount: txn.effective_amount(),
            txn_type: txn.effective_type(),
            mode: txn.effective_mode(),
            narration: txn.effective_narration().to_string(),
            extra: txn.extra.clone(),
        }
    }
}

/// The atomic unit of embedding and of LLM context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub text: String,
    pub metadata: TransactionMetadata,
}

/// Render a transaction to its canonical text, in the stable field order
/// spec §4.2 requires: txn id, account number, date, amount, type, mode,
/// narration, then any extra fields.
pub fn format_transaction(txn: &Transaction) -> Document {
    let metadata = TransactionMetadata::from_transaction(txn);
    let mut lines = Vec::with_capacity(8);

    lines.push(format!("Transaction ID: {}", metadata.txn_id));
    lines.push(format!(
        "Account Number: {}",
        metadata.account_number.as_deref().unwrap_or("unknown")
    ));
    lines.push(format!(
        "Date: {}",
        metadata
            .date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "unknown".to_string())
    ));
    lines.push(format!("Amount: \u{20B9}{:.2}", metadata.amount));
    lines.push(format!(
        "Type: {}",
        metadata
            .txn_type
            .map(|t| t.to_string())
            .unwrap_or_else(|| "UNKNOWN".to_string())
    ));
    lines.push(format!("Mode: {}", metadata.mode));
    lines.push(format!("Narration: {}", metadata.narration));

    for (key, value) in &metadata.extra {
        lines.push(format!("{key}: {value}"));
    }

    Document {
        text: lines.join("\n"),
        metadata,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transaction::Transaction;

    fn sample() -> Transaction {
        Transaction {
            txn_id: "T1".into(),
            account_number: Some("1234567890".into()),
            date: Some("2024-03-01".into()),
            amount: Some(500.0),
            txn_type: Some("DEBIT".into()),
            mode: Some("upi".into()),
            narration: Some("Zomato order".into()),
            ..Default::default()
        }
    }

    #[test]
    fn field_order_is_stable() {
        let doc = format_transaction(&sample());
        let idx = |label: &str| doc.text.find(label).unwrap();
        assert!(idx("Transaction ID") < idx("Account Number"));
        assert!(idx("Account Number") < idx("Date"));
        assert!(idx("Date") < idx("Amount"));
        assert!(idx("Amount") < idx("Type"));
        assert!(idx("Type") < idx("Mode"));
        assert!(idx("Mode") < idx("Narration"));
    }

    #[test]
    fn amount_has_rupee_symbol_and_two_decimals() {
        let doc = format_transaction(&sample());
        assert!(doc.text.contains("\u{20B9}500.00"));
    }

    #[test]
    fn format_round_trip_is_stable_for_repeated_formatting() {
        let doc1 = format_transaction(&sample());
        let doc2 = format_transaction(&sample());
        assert_eq!(doc1.text, doc2.text);
    }

    #[test]
    fn missing_fields_degrade_gracefully() {
        let bare = Transaction {
            txn_id: "T2".into(),
            ..Default::default()
        };
        let doc = format_transaction(&bare);
        assert!(doc.text.contains("unknown"));
    }
}
