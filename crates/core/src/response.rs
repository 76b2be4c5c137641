//! Wire-shape types returned from `/query`, `/prompt`, and streamed over
//! `/query/stream` (spec §6).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::document::Document;
use crate::mode::QueryMode;
use crate::transaction::{PaymentMode, TxnType};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pagination {
    pub page: usize,
    pub page_size: usize,
    pub total_items: usize,
    pub total_pages: usize,
    pub has_next: bool,
    pub has_prev: bool,
}

impl Pagination {
    /// `total_pages = ceil(total_items / page_size)` (spec §8 property 7).
    pub fn compute(page: usize, page_size: usize, total_items: usize) -> Self {
        let page_size = page_size.max(1);
        let total_pages = total_items.div_ceil(page_size).max(1);
        let page = page.clamp(1, total_pages);
        Pagination {
            page,
            page_size,
            total_items,
            total_pages,
            has_next: page < total_pages,
            has_prev: page > 1,
        }
    }

    /// Index range `[start, end)` of `documents` this page covers.
    pub fn slice_bounds(&self, len: usize) -> (usize, usize) {
        let start = (self.page - 1) * self.page_size;
        let end = (start + self.page_size).min(len);
        (start.min(len), end)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TypeBreakdown {
    pub count: usize,
    pub sum: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MonthlyBucket {
    pub count: usize,
    pub credit_sum: f64,
    pub debit_sum: f64,
    pub net: f64,
}

/// The statistics tuple every mode but `VECTOR_SEARCH` fills in (spec
/// §4.6). `by_type`/`by_mode`/`monthly` are populated only in `ANALYTICAL`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Statistics {
    pub count: usize,
    pub total: f64,
    pub average: f64,
    pub min: Option<f64>,
    pub max: Option<f64>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub by_type: BTreeMap<TxnType, TypeBreakdown>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub by_mode: BTreeMap<PaymentMode, TypeBreakdown>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub monthly: BTreeMap<String, MonthlyBucket>,
}

impl Statistics {
    /// Aggregate `(count, total, average, min, max)` over a slice of
    /// amounts. Used as the independent reference aggregation for spec §8
    /// property 5.
    pub fn from_amounts(amounts: &[f64]) -> Statistics {
        let count = amounts.len();
        let total: f64 = amounts.iter().sum();
        let average = if count > 0 { total / count as f64 } else { 0.0 };
        let min = amounts.iter().cloned().fold(None, |acc: Option<f64>, v| {
            Some(acc.map_or(v, |a| a.min(v)))
        });
        let max = amounts.iter().cloned().fold(None, |acc: Option<f64>, v| {
            Some(acc.map_or(v, |a| a.max(v)))
        });
        Statistics {
            count,
            total,
            average,
            min,
            max,
            by_type: BTreeMap::new(),
            by_mode: BTreeMap::new(),
            monthly: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagResponse {
    pub query_id: String,
    pub mode: QueryMode,
    pub answer: String,
    pub matching_transactions_count: usize,
    pub filters_applied: Vec<String>,
    pub transactions: Vec<Document>,
    pub pagination: Pagination,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub statistics: Option<Statistics>,
}
