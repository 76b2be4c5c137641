//! Crate-wide error type.
//!
//! Every variant carries a stable `error_kind` identifier (spec §7) so the
//! HTTP layer can surface it verbatim in the response body without each
//! call site re-deriving the string.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("no ingested corpus for this user and no inline context supplied")]
    NotIngested,

    #[error("prompt is missing or whitespace-only")]
    EmptyPrompt,

    #[error("ingest of {0} documents exceeds the configured corpus ceiling")]
    CorpusTooLarge(usize),

    #[error("upstream LLM provider failed: {0}")]
    UpstreamUnavailable(String),

    #[error("upstream LLM provider exceeded its deadline")]
    UpstreamTimeout,

    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Stable identifier returned in `RagResponse`-adjacent error bodies.
    pub fn error_kind(&self) -> &'static str {
        match self {
            Error::NotIngested => "NOT_INGESTED",
            Error::EmptyPrompt => "EMPTY_PROMPT",
            Error::CorpusTooLarge(_) => "CORPUS_TOO_LARGE",
            Error::UpstreamUnavailable(_) => "UPSTREAM_UNAVAILABLE",
            Error::UpstreamTimeout => "UPSTREAM_TIMEOUT",
            Error::Internal(_) => "INTERNAL",
        }
    }

    /// HTTP status code for this error kind (spec §7). Returned as a bare
    /// `u16` so this crate stays free of an `axum`/`http` dependency.
    pub fn http_status(&self) -> u16 {
        match self {
            Error::NotIngested | Error::EmptyPrompt => 400,
            Error::CorpusTooLarge(_) => 413,
            Error::UpstreamUnavailable(_) => 502,
            Error::UpstreamTimeout => 504,
            Error::Internal(_) => 500,
        }
    }
}
