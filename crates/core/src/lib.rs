//! Core types and traits shared across the transaction-RAG engine:
//! the `Transaction`/`Document` data model, `FilterSpec`, `QueryMode`, the
//! `RagResponse` wire shape, the crate-wide `Error`, and the `Embedder` /
//! `ChatHistoryStore` seams other crates implement.

pub mod chat_history;
pub mod document;
pub mod embedder;
pub mod error;
pub mod filter;
pub mod mode;
pub mod response;
pub mod transaction;

pub use chat_history::{ChatEvent, ChatHistoryStore};
pub use document::{format_transaction, Document, TransactionMetadata};
pub use embedder::Embedder;
pub use error::{Error, Result};
pub use filter::{compare, FilterSpec, Sort, SortField, SortOrder};
pub use mode::QueryMode;
pub use response::{MonthlyBucket, Pagination, RagResponse, Statistics, TypeBreakdown};
pub use transaction::{PaymentMode, Transaction, TxnType};
