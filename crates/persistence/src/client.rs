//! ScyllaDB client and connection management

use crate::error::PersistenceError;
use crate::schema;
use scylla::{Session, SessionBuilder};
use std::sync::Arc;

/// ScyllaDB configuration, parsed from `CHAT_HISTORY_URL` (spec §6): a
/// comma-separated host list, optionally followed by `/keyspace`.
#[derive(Debug, Clone)]
pub struct ScyllaConfig {
    pub hosts: Vec<String>,
    pub keyspace: String,
    pub replication_factor: u8,
}

impl ScyllaConfig {
    /// Parses `"host1:9042,host2:9042/keyspace"` into hosts + keyspace,
    /// defaulting the keyspace to `txrag` when the URL has no `/` suffix.
    pub fn from_url(url: &str) -> Self {
        let (hosts_part, keyspace) = match url.split_once('/') {
            Some((hosts, ks)) if !ks.is_empty() => (hosts, ks.to_string()),
            _ => (url, "txrag".to_string()),
        };

        let hosts = hosts_part.split(',').map(|h| h.trim().to_string()).collect();

        Self { hosts, keyspace, replication_factor: 1 }
    }
}

impl Default for ScyllaConfig {
    fn default() -> Self {
        Self {
            hosts: vec!["127.0.0.1:9042".to_string()],
            keyspace: "txrag".to_string(),
            replication_factor: 1,
        }
    }
}

/// ScyllaDB client wrapper
#[derive(Clone)]
pub struct ScyllaClient {
    session: Arc<Session>,
    config: ScyllaConfig,
}

impl ScyllaClient {
    /// Connect to ScyllaDB cluster
    pub async fn connect(config: ScyllaConfig) -> Result<Self, PersistenceError> {
        tracing::info!(hosts = ?config.hosts, keyspace = %config.keyspace, "connecting to ScyllaDB");

        let session = SessionBuilder::new()
            .known_nodes(&config.hosts)
            .build()
            .await
            .map_err(|e| PersistenceError::Connection(e.to_string()))?;

        let client = Self {
            session: Arc::new(session),
            config,
        };

        Ok(client)
    }

    /// Ensure keyspace and tables exist
    pub async fn ensure_schema(&self) -> Result<(), PersistenceError> {
        schema::create_keyspace(
            &self.session,
            &self.config.keyspace,
            self.config.replication_factor,
        )
        .await?;
        schema::create_tables(&self.session, &self.config.keyspace).await?;
        tracing::info!(keyspace = %self.config.keyspace, "Schema ensured");
        Ok(())
    }

    /// Get the underlying session
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Get keyspace name
    pub fn keyspace(&self) -> &str {
        &self.config.keyspace
    }
}
