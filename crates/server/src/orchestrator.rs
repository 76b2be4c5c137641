//! Query Orchestrator (spec §4.10): the shared pipeline behind `/query`,
//! `/prompt`, and `/query/stream` — resolve the user's corpus, extract
//! filters, detect language, classify the mode, run the kernel, generate
//! an answer, paginate, and append to chat history best-effort.

use std::convert::Infallible;
use std::sync::Arc;

use async_stream::stream;
use axum::response::sse::Event;
use chrono::Utc;
use futures::Stream;
use serde_json::json;
use tokio::sync::mpsc;

use txrag_core::{
    format_transaction, Document, Embedder, Error, QueryMode, RagResponse, Result as CoreResult,
    Transaction, TransactionMetadata,
};
use txrag_rag::{
    classify, detect_language, extract_filters, generate_answer, run_kernel, UserCorpus,
    VectorStore, VectorStoreConfig,
};

use crate::error::ServerError;
use crate::http::QueryRequest;
use crate::state::AppState;

const DEFAULT_PAGE_SIZE: usize = 20;

/// Builds a fresh, embedded `UserCorpus` from raw transactions — the same
/// path `/ingest` and an inline `context_data` query both go through
/// (spec §4.10 step 1: inline context is "ingested ephemerally for the
/// lifetime of the call").
pub fn build_corpus(
    embedder: &dyn Embedder,
    transactions: Vec<Transaction>,
    max_docs: usize,
) -> CoreResult<UserCorpus> {
    if transactions.len() > max_docs {
        return Err(Error::CorpusTooLarge(transactions.len()));
    }

    let documents: Vec<Document> = transactions.iter().map(format_transaction).collect();
    let metadata: Vec<TransactionMetadata> = documents.iter().map(|d| d.metadata.clone()).collect();

    let vector_store = if documents.is_empty() {
        VectorStore::build(VectorStoreConfig::default(), Vec::new())
    } else {
        let texts: Vec<String> = documents.iter().map(|d| d.text.clone()).collect();
        let embeddings = embedder.embed_documents(&texts)?;
        VectorStore::build(
            VectorStoreConfig { vector_dim: embedder.dim() },
            embeddings,
        )
    };

    Ok(UserCorpus::new(transactions, metadata, documents, vector_store))
}

/// Step 1: resolve the corpus to query against, either the user's
/// persisted store or an ephemeral one built from inline `context_data`.
async fn resolve_corpus(state: &AppState, req: &QueryRequest) -> Result<Arc<UserCorpus>, ServerError> {
    if let Some(context_data) = req.context_data.clone() {
        let corpus = build_corpus(state.embedder.as_ref(), context_data, state.config.rag.corpus_max_docs)
            .map_err(ServerError)?;
        return Ok(Arc::new(corpus));
    }

    state
        .stores
        .snapshot(&req.user_id)
        .ok_or(ServerError(Error::NotIngested))
}

fn effective_page_size(req: &QueryRequest, corpus_len: usize) -> usize {
    if req.show_all.unwrap_or(false) {
        corpus_len.max(1)
    } else {
        req.page_size.unwrap_or(DEFAULT_PAGE_SIZE).max(1)
    }
}

struct Classified {
    filters: txrag_core::FilterSpec,
    language: txrag_rag::Language,
    mode: QueryMode,
    page: usize,
    page_size: usize,
}

fn classify_query(req: &QueryRequest, corpus_len: usize) -> Classified {
    let filters = extract_filters(&req.prompt, Utc::now().date_naive());
    let language = detect_language(&req.prompt);
    let mode = classify(&req.prompt, &filters);
    let page = req.page.unwrap_or(1).max(1);
    let page_size = effective_page_size(req, corpus_len);
    Classified { filters, language, mode, page, page_size }
}

/// Steps 2–6 of the orchestrator for the unary `/query` and `/prompt`
/// endpoints. Chat-history append is best-effort: its failure is logged
/// and never turns into an error response (spec §5).
pub async fn run_query(state: &AppState, req: &QueryRequest) -> Result<RagResponse, ServerError> {
    let started = std::time::Instant::now();
    let prompt = req.prompt.trim();
    if prompt.is_empty() {
        return Err(ServerError(Error::EmptyPrompt));
    }

    let corpus = resolve_corpus(state, req).await?;
    let classified = classify_query(req, corpus.len());

    let kernel_out = run_kernel(
        classified.mode,
        &classified.filters,
        &corpus,
        state.embedder.as_ref(),
        prompt,
        state.config.rag.vector_top_k,
        classified.page,
        classified.page_size,
    )
    .map_err(ServerError)?;

    let answer = if classified.mode == QueryMode::Statistical {
        generate_answer(kernel_out.statistics.as_ref().expect("statistical mode always fills statistics"), classified.language)
    } else {
        let messages = state.prompt_assembler.assemble(
            prompt,
            classified.language,
            &classified.filters,
            kernel_out.statistics.as_ref(),
            &kernel_out.documents,
        );
        let result = state
            .llm
            .generate(&messages)
            .await
            .map_err(txrag_core::Error::from)
            .map_err(ServerError)?;
        result.text
    };

    let response = RagResponse {
        query_id: uuid::Uuid::new_v4().to_string(),
        mode: classified.mode,
        answer: answer.clone(),
        matching_transactions_count: kernel_out.matching_transactions_count,
        filters_applied: classified.filters.describe(),
        transactions: kernel_out.documents,
        pagination: kernel_out.pagination,
        statistics: kernel_out.statistics,
    };

    append_chat_history(state, &req.user_id, prompt, &answer).await;
    crate::telemetry::record_query(&classified.mode.to_string(), started.elapsed());

    Ok(response)
}

async fn append_chat_history(state: &AppState, user_id: &str, prompt: &str, answer: &str) {
    if let Err(e) = state.chat_history.append(user_id, prompt, answer, Utc::now()).await {
        tracing::warn!(error = %e, user_id, "chat history append failed, continuing");
    }
}

fn sse_error(err: ServerError) -> Event {
    crate::telemetry::record_error(err.0.error_kind());
    Event::default()
        .event("error")
        .json_data(json!({
            "error_kind": err.0.error_kind(),
            "message": err.0.to_string(),
        }))
        .unwrap_or_else(|_| Event::default().event("error").data("{\"error_kind\":\"INTERNAL\"}"))
}

/// The `/query/stream` pipeline (spec §4.10): a `metadata` event, then
/// `chunk` events as the model (or the statistical fast-path) produces
/// text, then `metadata_final`, then `done`. Any failure along the way
/// emits one `error` event and ends the stream.
pub fn run_query_stream(
    state: AppState,
    req: QueryRequest,
) -> impl Stream<Item = Result<Event, Infallible>> {
    stream! {
        let started = std::time::Instant::now();
        let prompt = req.prompt.trim().to_string();
        if prompt.is_empty() {
            yield Ok(sse_error(ServerError(Error::EmptyPrompt)));
            return;
        }

        let corpus = match resolve_corpus(&state, &req).await {
            Ok(c) => c,
            Err(e) => { yield Ok(sse_error(e)); return; }
        };
        let classified = classify_query(&req, corpus.len());

        let kernel_out = match run_kernel(
            classified.mode,
            &classified.filters,
            &corpus,
            state.embedder.as_ref(),
            &prompt,
            state.config.rag.vector_top_k,
            classified.page,
            classified.page_size,
        ) {
            Ok(k) => k,
            Err(e) => { yield Ok(sse_error(ServerError(e))); return; }
        };

        yield Ok(Event::default().event("metadata").json_data(json!({
            "mode": classified.mode.to_string(),
            "matching_transactions_count": kernel_out.matching_transactions_count,
            "filters_applied": classified.filters.describe(),
        })).unwrap());

        let mut full_answer = String::new();

        if classified.mode == QueryMode::Statistical {
            let answer = generate_answer(
                kernel_out.statistics.as_ref().expect("statistical mode always fills statistics"),
                classified.language,
            );
            full_answer.push_str(&answer);
            yield Ok(Event::default().event("chunk").json_data(json!({ "text": answer })).unwrap());
        } else {
            let messages = state.prompt_assembler.assemble(
                &prompt,
                classified.language,
                &classified.filters,
                kernel_out.statistics.as_ref(),
                &kernel_out.documents,
            );
            let (tx, mut rx) = mpsc::channel::<String>(32);
            let llm = state.llm.clone();
            let generation = tokio::spawn(async move { llm.generate_stream(&messages, tx).await });

            while let Some(piece) = rx.recv().await {
                full_answer.push_str(&piece);
                yield Ok(Event::default().event("chunk").json_data(json!({ "text": piece })).unwrap());
            }

            match generation.await {
                Ok(Ok(_)) => {}
                Ok(Err(e)) => {
                    yield Ok(sse_error(ServerError(txrag_core::Error::from(e))));
                    return;
                }
                Err(_) => {
                    yield Ok(sse_error(ServerError(Error::Internal("generation task panicked".to_string()))));
                    return;
                }
            }
        }

        yield Ok(Event::default().event("metadata_final").json_data(json!({
            "statistics": kernel_out.statistics,
            "pagination": kernel_out.pagination,
        })).unwrap());

        yield Ok(Event::default().event("done").json_data(json!({})).unwrap());

        append_chat_history(&state, &req.user_id, &prompt, &full_answer).await;
        crate::telemetry::record_query(&classified.mode.to_string(), started.elapsed());
    }
}
