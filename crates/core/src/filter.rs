//! `FilterSpec` (spec §3) and the predicate it compiles to.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::document::TransactionMetadata;
use crate::transaction::{PaymentMode, TxnType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortField {
    Amount,
    Date,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortOrder {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sort {
    pub field: SortField,
    pub order: SortOrder,
}

impl Default for Sort {
    fn default() -> Self {
        Sort {
            field: SortField::Date,
            order: SortOrder::Desc,
        }
    }
}

/// Structured value derived from a free-text prompt by the filter
/// extractor. Every field is conjunctive with the others; a set-valued
/// field (`type_in`, `mode_in`, ...) is disjunctive within itself.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterSpec {
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub amount_min: Option<f64>,
    pub amount_max: Option<f64>,
    pub type_in: BTreeSet<TxnType>,
    pub mode_in: BTreeSet<PaymentMode>,
    pub account_in: BTreeSet<String>,
    pub txn_id_in: BTreeSet<String>,
    pub top_n: Option<usize>,
    pub sort: Sort,
    pub free_text_keywords: Vec<String>,
}

impl FilterSpec {
    pub fn is_empty(&self) -> bool {
        self.date_from.is_none()
            && self.date_to.is_none()
            && self.amount_min.is_none()
            && self.amount_max.is_none()
            && self.type_in.is_empty()
            && self.mode_in.is_empty()
            && self.account_in.is_empty()
            && self.txn_id_in.is_empty()
            && self.top_n.is_none()
            && self.free_text_keywords.is_empty()
    }

    /// Conjunctive-across-fields, disjunctive-within-a-set predicate (spec
    /// §3 invariants; this is what spec §8 property 3, "filter soundness",
    /// is checked against).
    pub fn matches(&self, meta: &TransactionMetadata) -> bool {
        if let Some(from) = self.date_from {
            if meta.date.map(|d| d < from).unwrap_or(true) {
                return false;
            }
        }
        if let Some(to) = self.date_to {
            if meta.date.map(|d| d > to).unwrap_or(true) {
                return false;
            }
        }
        if let Some(min) = self.amount_min {
            if meta.amount < min {
                return false;
            }
        }
        if let Some(max) = self.amount_max {
            if meta.amount > max {
                return false;
            }
        }
        if !self.type_in.is_empty() {
            match meta.txn_type {
                Some(t) if self.type_in.contains(&t) => {}
                _ => return false,
            }
        }
        if !self.mode_in.is_empty() && !self.mode_in.contains(&meta.mode) {
            return false;
        }
        if !self.account_in.is_empty() {
            match &meta.account_number {
                Some(acc) if self.account_in.contains(acc) => {}
                _ => return false,
            }
        }
        if !self.txn_id_in.is_empty() && !self.txn_id_in.contains(&meta.txn_id) {
            return false;
        }
        true
    }

    /// Short bullet-list rendering for `RagResponse.filters_applied` / the
    /// prompt's applied-filters block (spec §4.8).
    pub fn describe(&self) -> Vec<String> {
        let mut out = Vec::new();
        match (self.date_from, self.date_to) {
            (Some(from), Some(to)) => out.push(format!("date between {from} and {to}")),
            (Some(from), None) => out.push(format!("date since {from}")),
            (None, Some(to)) => out.push(format!("date until {to}")),
            (None, None) => {}
        }
        match (self.amount_min, self.amount_max) {
            (Some(min), Some(max)) => out.push(format!("amount between \u{20B9}{min:.2} and \u{20B9}{max:.2}")),
            (Some(min), None) => out.push(format!("amount \u{2265} \u{20B9}{min:.2}")),
            (None, Some(max)) => out.push(format!("amount \u{2264} \u{20B9}{max:.2}")),
            (None, None) => {}
        }
        if !self.type_in.is_empty() {
            let types: Vec<String> = self.type_in.iter().map(|t| t.to_string()).collect();
            out.push(format!("type={}", types.join("|")));
        }
        if !self.mode_in.is_empty() {
            let modes: Vec<String> = self.mode_in.iter().map(|m| m.to_string()).collect();
            out.push(format!("mode={}", modes.join("|")));
        }
        if !self.account_in.is_empty() {
            out.push(format!("account in {{{}}}", self.account_in.iter().cloned().collect::<Vec<_>>().join(", ")));
        }
        if !self.txn_id_in.is_empty() {
            out.push(format!("txn id in {{{}}}", self.txn_id_in.iter().cloned().collect::<Vec<_>>().join(", ")));
        }
        if let Some(n) = self.top_n {
            out.push(format!("top {n}"));
        }
        out
    }
}

/// Tie-break comparator for sorting by amount/date (spec §4.6: "ties by
/// date descending, then by txnId ascending").
pub fn compare(a: &TransactionMetadata, b: &TransactionMetadata, sort: Sort) -> std::cmp::Ordering {
    use std::cmp::Ordering;

    let primary = match sort.field {
        SortField::Amount => a.amount.partial_cmp(&b.amount).unwrap_or(Ordering::Equal),
        SortField::Date => a.date.cmp(&b.date),
    };
    let primary = match sort.order {
        SortOrder::Asc => primary,
        SortOrder::Desc => primary.reverse(),
    };

    primary
        .then_with(|| b.date.cmp(&a.date))
        .then_with(|| a.txn_id.cmp(&b.txn_id))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(id: &str, amount: f64, date: &str, mode: PaymentMode, ty: TxnType) -> TransactionMetadata {
        TransactionMetadata {
            txn_id: id.into(),
            account_number: Some("111111".into()),
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").ok(),
            amount,
            txn_type: Some(ty),
            mode,
            narration: String::new(),
            extra: Default::default(),
        }
    }

    #[test]
    fn amount_range_is_conjunctive_with_mode() {
        let mut filter = FilterSpec::default();
        filter.amount_min = Some(1000.0);
        filter.mode_in.insert(PaymentMode::Upi);

        let hit = meta("T1", 5000.0, "2024-01-01", PaymentMode::Upi, TxnType::Credit);
        let wrong_mode = meta("T2", 5000.0, "2024-01-01", PaymentMode::Cash, TxnType::Credit);
        let too_small = meta("T3", 100.0, "2024-01-01", PaymentMode::Upi, TxnType::Credit);

        assert!(filter.matches(&hit));
        assert!(!filter.matches(&wrong_mode));
        assert!(!filter.matches(&too_small));
    }

    #[test]
    fn mode_set_is_disjunctive() {
        let mut filter = FilterSpec::default();
        filter.mode_in.insert(PaymentMode::Upi);
        filter.mode_in.insert(PaymentMode::Cash);

        let upi = meta("T1", 10.0, "2024-01-01", PaymentMode::Upi, TxnType::Debit);
        let cash = meta("T2", 10.0, "2024-01-01", PaymentMode::Cash, TxnType::Debit);
        let card = meta("T3", 10.0, "2024-01-01", PaymentMode::Card, TxnType::Debit);

        assert!(filter.matches(&upi));
        assert!(filter.matches(&cash));
        assert!(!filter.matches(&card));
    }

    #[test]
    fn tie_break_is_date_desc_then_txn_id_asc() {
        let a = meta("B", 100.0, "2024-01-01", PaymentMode::Upi, TxnType::Credit);
        let b = meta("A", 100.0, "2024-01-02", PaymentMode::Upi, TxnType::Credit);
        let sort = Sort { field: SortField::Amount, order: SortOrder::Desc };
        // Equal amount -> later date (b) sorts first.
        assert_eq!(compare(&a, &b, sort), std::cmp::Ordering::Greater);
    }
}
