//! ScyllaDB schema for the append-only chat history table.

use scylla::Session;

use crate::error::PersistenceError;

pub async fn create_keyspace(session: &Session, keyspace: &str, replication_factor: u8) -> Result<(), PersistenceError> {
    let query = format!(
        "CREATE KEYSPACE IF NOT EXISTS {} WITH replication = {{'class': 'SimpleStrategy', 'replication_factor': {}}}",
        keyspace, replication_factor
    );

    session
        .query_unpaged(query, &[])
        .await
        .map_err(|e| PersistenceError::Schema(format!("failed to create keyspace: {e}")))?;

    Ok(())
}

pub async fn create_tables(session: &Session, keyspace: &str) -> Result<(), PersistenceError> {
    let chat_history_table = format!(
        r#"
        CREATE TABLE IF NOT EXISTS {}.chat_history (
            user_id TEXT,
            ts TIMESTAMP,
            prompt TEXT,
            answer TEXT,
            PRIMARY KEY ((user_id), ts)
        ) WITH CLUSTERING ORDER BY (ts DESC)
        "#,
        keyspace
    );

    session
        .query_unpaged(chat_history_table, &[])
        .await
        .map_err(|e| PersistenceError::Schema(format!("failed to create chat_history table: {e}")))?;

    Ok(())
}
