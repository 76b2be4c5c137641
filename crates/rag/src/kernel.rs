//! Retrieval/aggregation kernel (spec §4.6): the per-mode logic every
//! classified query is dispatched into. One function per mode, all
//! operating over the same filtered-and-sorted index set so the modes stay
//! trivially comparable in tests.

use std::collections::BTreeMap;

use txrag_core::{
    compare, Document, Embedder, FilterSpec, MonthlyBucket, Pagination, QueryMode, Statistics,
    TransactionMetadata, TypeBreakdown,
};

use crate::user_store::UserCorpus;

/// Analytical/SmartFull never return more documents than this regardless
/// of how many transactions match — the LLM context has to stay bounded
/// no matter how large the underlying corpus is (spec §4.6).
const ANALYTICAL_SAMPLE_CAP: usize = 60;
const SMART_FULL_CAP: usize = 200;

pub struct KernelOutput {
    pub matching_transactions_count: usize,
    pub documents: Vec<Document>,
    pub pagination: Pagination,
    pub statistics: Option<Statistics>,
}

/// Indices into `corpus.metadata`/`corpus.documents` that satisfy
/// `filters`, sorted per `filters.sort`.
fn filtered_sorted_indices(corpus: &UserCorpus, filters: &FilterSpec) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..corpus.metadata.len())
        .filter(|&i| filters.matches(&corpus.metadata[i]))
        .collect();
    indices.sort_by(|&a, &b| compare(&corpus.metadata[a], &corpus.metadata[b], filters.sort));
    indices
}

fn full_breakdown(metas: &[&TransactionMetadata]) -> Statistics {
    let amounts: Vec<f64> = metas.iter().map(|m| m.amount).collect();
    let mut stats = Statistics::from_amounts(&amounts);

    let mut by_type: BTreeMap<_, TypeBreakdown> = BTreeMap::new();
    let mut by_mode: BTreeMap<_, TypeBreakdown> = BTreeMap::new();
    let mut monthly: BTreeMap<String, MonthlyBucket> = BTreeMap::new();

    for meta in metas {
        if let Some(t) = meta.txn_type {
            let entry = by_type.entry(t).or_default();
            entry.count += 1;
            entry.sum += meta.amount;
        }

        let entry = by_mode.entry(meta.mode).or_default();
        entry.count += 1;
        entry.sum += meta.amount;

        if let Some(date) = meta.date {
            let key = format!("{:04}-{:02}", date.format("%Y"), date.format("%m"));
            let bucket = monthly.entry(key).or_default();
            bucket.count += 1;
            match meta.txn_type {
                Some(txrag_core::TxnType::Credit) => bucket.credit_sum += meta.amount,
                Some(txrag_core::TxnType::Debit) => bucket.debit_sum += meta.amount,
                None => {}
            }
            bucket.net = bucket.credit_sum - bucket.debit_sum;
        }
    }

    stats.by_type = by_type;
    stats.by_mode = by_mode;
    stats.monthly = monthly;
    stats
}

fn paginate(documents: Vec<Document>, page: usize, page_size: usize) -> (Vec<Document>, Pagination) {
    let pagination = Pagination::compute(page, page_size, documents.len());
    let (start, end) = pagination.slice_bounds(documents.len());
    (documents[start..end].to_vec(), pagination)
}

fn run_vector_search(
    corpus: &UserCorpus,
    filters: &FilterSpec,
    embedder: &dyn Embedder,
    query: &str,
    top_k: usize,
    page: usize,
    page_size: usize,
) -> txrag_core::Result<KernelOutput> {
    let candidates = filtered_sorted_indices(corpus, filters);
    let matching_transactions_count = candidates.len();

    let query_embedding = embedder.embed_query(query)?;

    // Score the whole corpus once, then keep only the candidates that
    // already passed the filter — cheaper than re-deriving cosine
    // similarity by hand here.
    let ranked = corpus.vector_store.search(&query_embedding, corpus.len());
    let scores: std::collections::HashMap<usize, f32> =
        ranked.into_iter().map(|r| (r.index, r.score)).collect();

    let mut scored: Vec<(usize, f32)> = candidates
        .into_iter()
        .map(|i| (i, scores.get(&i).copied().unwrap_or(0.0)))
        .collect();

    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    scored.truncate(top_k);

    let documents: Vec<Document> = scored.iter().map(|&(i, _)| corpus.documents[i].clone()).collect();
    let (documents, pagination) = paginate(documents, page, page_size);

    Ok(KernelOutput {
        matching_transactions_count,
        documents,
        pagination,
        statistics: None,
    })
}

fn run_statistical(corpus: &UserCorpus, filters: &FilterSpec) -> KernelOutput {
    let indices = filtered_sorted_indices(corpus, filters);
    let matching_transactions_count = indices.len();
    let amounts: Vec<f64> = indices.iter().map(|&i| corpus.metadata[i].amount).collect();
    let statistics = Statistics::from_amounts(&amounts);

    KernelOutput {
        matching_transactions_count,
        documents: Vec::new(),
        pagination: Pagination::compute(1, 1, 0),
        statistics: Some(statistics),
    }
}

fn run_analytical(corpus: &UserCorpus, filters: &FilterSpec, page: usize, page_size: usize) -> KernelOutput {
    let indices = filtered_sorted_indices(corpus, filters);
    let matching_transactions_count = indices.len();

    let metas: Vec<&TransactionMetadata> = indices.iter().map(|&i| &corpus.metadata[i]).collect();
    let statistics = full_breakdown(&metas);

    let sample: Vec<Document> = indices
        .iter()
        .take(ANALYTICAL_SAMPLE_CAP)
        .map(|&i| corpus.documents[i].clone())
        .collect();
    let (documents, pagination) = paginate(sample, page, page_size);

    KernelOutput {
        matching_transactions_count,
        documents,
        pagination,
        statistics: Some(statistics),
    }
}

fn run_smart_full(corpus: &UserCorpus, filters: &FilterSpec, page: usize, page_size: usize) -> KernelOutput {
    let indices = filtered_sorted_indices(corpus, filters);
    let matching_transactions_count = indices.len();

    let metas: Vec<&TransactionMetadata> = indices.iter().map(|&i| &corpus.metadata[i]).collect();
    let statistics = full_breakdown(&metas);

    let capped: Vec<Document> = indices
        .iter()
        .take(SMART_FULL_CAP)
        .map(|&i| corpus.documents[i].clone())
        .collect();
    let (documents, pagination) = paginate(capped, page, page_size);

    KernelOutput {
        matching_transactions_count,
        documents,
        pagination,
        statistics: Some(statistics),
    }
}

#[allow(clippy::too_many_arguments)]
pub fn run_kernel(
    mode: QueryMode,
    filters: &FilterSpec,
    corpus: &UserCorpus,
    embedder: &dyn Embedder,
    query: &str,
    vector_top_k: usize,
    page: usize,
    page_size: usize,
) -> txrag_core::Result<KernelOutput> {
    Ok(match mode {
        QueryMode::VectorSearch => {
            run_vector_search(corpus, filters, embedder, query, vector_top_k, page, page_size)?
        }
        QueryMode::Statistical => run_statistical(corpus, filters),
        QueryMode::Analytical => run_analytical(corpus, filters, page, page_size),
        QueryMode::SmartFull => run_smart_full(corpus, filters, page, page_size),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::{DeterministicEmbedder, EmbeddingConfig};
    use crate::vector_store::{VectorStore, VectorStoreConfig};
    use chrono::NaiveDate;
    use txrag_core::{format_transaction, PaymentMode, Transaction, TxnType};

    fn sample_corpus() -> UserCorpus {
        let raw = vec![
            Transaction {
                txn_id: "T1".into(),
                amount: Some(500.0),
                txn_type: Some("DEBIT".into()),
                mode: Some("UPI".into()),
                date: Some("2024-01-05".into()),
                narration: Some("Zomato".into()),
                ..Default::default()
            },
            Transaction {
                txn_id: "T2".into(),
                amount: Some(20000.0),
                txn_type: Some("CREDIT".into()),
                mode: Some("NEFT".into()),
                date: Some("2024-01-10".into()),
                narration: Some("Salary".into()),
                ..Default::default()
            },
            Transaction {
                txn_id: "T3".into(),
                amount: Some(250.0),
                txn_type: Some("DEBIT".into()),
                mode: Some("CARD".into()),
                date: Some("2024-02-01".into()),
                narration: Some("Coffee".into()),
                ..Default::default()
            },
        ];
        let documents: Vec<Document> = raw.iter().map(format_transaction).collect();
        let metadata: Vec<TransactionMetadata> = documents.iter().map(|d| d.metadata.clone()).collect();

        let embedder = DeterministicEmbedder::new(EmbeddingConfig::default());
        let texts: Vec<String> = documents.iter().map(|d| d.text.clone()).collect();
        let embeddings = embedder.embed_documents(&texts).unwrap();
        let vector_store = VectorStore::build(VectorStoreConfig::default(), embeddings);

        UserCorpus::new(raw, metadata, documents, vector_store)
    }

    #[test]
    fn statistical_mode_returns_no_documents() {
        let corpus = sample_corpus();
        let out = run_statistical(&corpus, &FilterSpec::default());
        assert_eq!(out.matching_transactions_count, 3);
        assert!(out.documents.is_empty());
        assert_eq!(out.statistics.unwrap().count, 3);
    }

    #[test]
    fn analytical_mode_includes_monthly_buckets() {
        let corpus = sample_corpus();
        let out = run_analytical(&corpus, &FilterSpec::default(), 1, 10);
        let stats = out.statistics.unwrap();
        assert_eq!(stats.monthly.len(), 2);
        assert!(stats.by_mode.contains_key(&PaymentMode::Upi));
    }

    #[test]
    fn filters_narrow_the_matching_count() {
        let corpus = sample_corpus();
        let mut filters = FilterSpec::default();
        filters.type_in.insert(TxnType::Credit);
        let out = run_statistical(&corpus, &filters);
        assert_eq!(out.matching_transactions_count, 1);
    }

    #[test]
    fn date_filter_excludes_out_of_range_rows() {
        let corpus = sample_corpus();
        let mut filters = FilterSpec::default();
        filters.date_from = NaiveDate::from_ymd_opt(2024, 2, 1);
        let out = run_statistical(&corpus, &filters);
        assert_eq!(out.matching_transactions_count, 1);
    }
}
