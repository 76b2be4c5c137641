//! HTTP server for the transaction-RAG engine: wires `txrag-rag`'s
//! per-user stores and kernel, `txrag-llm`'s backend and prompt
//! assembler, and `txrag-persistence`'s chat history behind the routes
//! spec §6 defines.

pub mod error;
pub mod http;
pub mod orchestrator;
pub mod state;
pub mod telemetry;

pub use error::ServerError;
pub use http::create_router;
pub use state::AppState;
