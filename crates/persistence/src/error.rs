//! Persistence errors. Every fallible ScyllaDB call in this crate is
//! mapped into one of these at the call site rather than relying on a
//! blanket `From<scylla::...>` conversion, since the driver's own error
//! types are an implementation detail we don't want leaking through.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("failed to connect to ScyllaDB: {0}")]
    Connection(String),

    #[error("schema setup failed: {0}")]
    Schema(String),

    #[error("query failed: {0}")]
    Query(String),

    #[error("row did not match the expected shape: {0}")]
    InvalidData(String),
}

impl From<PersistenceError> for txrag_core::Error {
    fn from(err: PersistenceError) -> Self {
        txrag_core::Error::Internal(err.to_string())
    }
}
