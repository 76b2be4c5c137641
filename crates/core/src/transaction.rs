//! The raw, semi-structured `Transaction` record (spec §3) and the two
//! closed enums (`TxnType`, `PaymentMode`) it carries.

use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Credit or debit. Sign of cash-flow lives exclusively here, never on
/// `amount`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TxnType {
    Credit,
    Debit,
}

impl FromStr for TxnType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "CREDIT" => Ok(TxnType::Credit),
            "DEBIT" => Ok(TxnType::Debit),
            _ => Err(()),
        }
    }
}

impl std::fmt::Display for TxnType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TxnType::Credit => write!(f, "CREDIT"),
            TxnType::Debit => write!(f, "DEBIT"),
        }
    }
}

/// Payment rail. Unrecognized raw strings fold into `Others` rather than
/// erroring — the ingest path degrades gracefully per spec §3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PaymentMode {
    Upi,
    Ft,
    Neft,
    Imps,
    Rtgs,
    Cash,
    Card,
    Atm,
    Others,
}

impl FromStr for PaymentMode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_uppercase().as_str() {
            "UPI" => PaymentMode::Upi,
            "FT" => PaymentMode::Ft,
            "NEFT" => PaymentMode::Neft,
            "IMPS" => PaymentMode::Imps,
            "RTGS" => PaymentMode::Rtgs,
            "CASH" => PaymentMode::Cash,
            "CARD" => PaymentMode::Card,
            "ATM" => PaymentMode::Atm,
            _ => PaymentMode::Others,
        })
    }
}

impl std::fmt::Display for PaymentMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PaymentMode::Upi => "UPI",
            PaymentMode::Ft => "FT",
            PaymentMode::Neft => "NEFT",
            PaymentMode::Imps => "IMPS",
            PaymentMode::Rtgs => "RTGS",
            PaymentMode::Cash => "CASH",
            PaymentMode::Card => "CARD",
            PaymentMode::Atm => "ATM",
            PaymentMode::Others => "OTHERS",
        };
        write!(f, "{s}")
    }
}

/// Raw, semi-structured bank-transaction record as ingested. Any field may
/// be absent; callers read it through the `effective_*` accessors rather
/// than the raw fields directly, so a missing/odd-shaped source record
/// never panics the ingest path.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Transaction {
    #[serde(alias = "txnId")]
    pub txn_id: String,

    #[serde(default, alias = "accountId")]
    pub account_id: Option<String>,

    #[serde(default, alias = "accountNumber")]
    pub account_number: Option<String>,

    /// Raw date/datetime string, any of the ISO-8601 shapes spec §3 allows.
    #[serde(default, alias = "createdAt")]
    pub date: Option<String>,

    #[serde(default)]
    pub amount: Option<f64>,

    /// Direct `type` field, when the source conveys it that way.
    #[serde(default, rename = "type")]
    pub txn_type: Option<String>,

    /// Composite attribute carrying type indirectly, e.g. `"TYPE#CREDIT"`.
    #[serde(default, rename = "pk_GSI_1")]
    pub pk_gsi_1: Option<String>,

    #[serde(default)]
    pub mode: Option<String>,

    #[serde(default)]
    pub narration: Option<String>,

    /// Extra fields (balance, reference number, ...) preserved verbatim and
    /// appended to the rendered document per spec §4.2.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl Transaction {
    /// `type`, resolved either from the direct field or from the
    /// `pk_GSI_1 = "TYPE#CREDIT"` composite convention.
    pub fn effective_type(&self) -> Option<TxnType> {
        if let Some(t) = &self.txn_type {
            if let Ok(parsed) = t.parse() {
                return Some(parsed);
            }
        }
        if let Some(composite) = &self.pk_gsi_1 {
            if let Some(rest) = composite.split("TYPE#").nth(1) {
                if let Ok(parsed) = rest.parse() {
                    return Some(parsed);
                }
            }
        }
        None
    }

    /// `mode`, uppercased and folded into the closed set (spec §3: "`mode`
    /// values are uppercased before storage and comparison").
    pub fn effective_mode(&self) -> PaymentMode {
        self.mode
            .as_deref()
            .and_then(|m| m.parse().ok())
            .unwrap_or(PaymentMode::Others)
    }

    /// Amount, normalized to a non-negative value (the sign lives in
    /// `effective_type`, never here).
    pub fn effective_amount(&self) -> f64 {
        self.amount.unwrap_or(0.0).abs()
    }

    /// Best-effort parse of `date`/`createdAt` into a calendar date. Accepts
    /// a bare `YYYY-MM-DD` or an RFC-3339 timestamp; anything else yields
    /// `None` rather than an ingest failure.
    pub fn effective_date(&self) -> Option<NaiveDate> {
        let raw = self.date.as_deref()?;
        if let Ok(d) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
            return Some(d);
        }
        if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(raw) {
            return Some(dt.date_naive());
        }
        if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
            return Some(dt.date());
        }
        None
    }

    pub fn effective_narration(&self) -> &str {
        self.narration.as_deref().unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_from_composite_attribute() {
        let t = Transaction {
            txn_id: "T1".into(),
            pk_gsi_1: Some("TYPE#CREDIT".into()),
            ..Default::default()
        };
        assert_eq!(t.effective_type(), Some(TxnType::Credit));
    }

    #[test]
    fn mode_is_case_insensitive_and_unknown_folds_to_others() {
        let upi = Transaction {
            mode: Some("upi".into()),
            ..Default::default()
        };
        assert_eq!(upi.effective_mode(), PaymentMode::Upi);

        let weird = Transaction {
            mode: Some("cheque".into()),
            ..Default::default()
        };
        assert_eq!(weird.effective_mode(), PaymentMode::Others);
    }

    #[test]
    fn amount_never_negative() {
        let t = Transaction {
            amount: Some(-42.5),
            ..Default::default()
        };
        assert_eq!(t.effective_amount(), 42.5);
    }

    #[test]
    fn date_accepts_plain_and_rfc3339() {
        let plain = Transaction {
            date: Some("2024-03-05".into()),
            ..Default::default()
        };
        assert_eq!(
            plain.effective_date(),
            Some(NaiveDate::from_ymd_opt(2024, 3, 5).unwrap())
        );

        let rfc = Transaction {
            date: Some("2024-03-05T10:15:00Z".into()),
            ..Default::default()
        };
        assert_eq!(
            rfc.effective_date(),
            Some(NaiveDate::from_ymd_opt(2024, 3, 5).unwrap())
        );
    }
}
