//! LanceDB connection and table housekeeping.
use anyhow::Result;
use arrow_array::RecordBatchIterator;
use arrow_schema::Schema;
use lancedb::{connect, Connection, Table};
use std::sync::Arc;

pub async fn open_db(uri: &str) -> Result<Connection> {
    Ok(connect(uri).execute().await?)
}

pub async fn table_exists(conn: &Connection, name: &str) -> Result<bool> {
    Ok(conn.table_names().execute().await?.iter().any(|n| n == name))
}

/// Open `name`, or `None` when it has never been written.
pub async fn open_if_exists(conn: &Connection, name: &str) -> Result<Option<Table>> {
    if !table_exists(conn, name).await? {
        return Ok(None);
    }
    Ok(Some(conn.open_table(name).execute().await?))
}

/// Open `name`, creating it empty with `schema` first if needed.
pub async fn ensure_table(conn: &Connection, name: &str, schema: Arc<Schema>) -> Result<Table> {
    if let Some(table) = open_if_exists(conn, name).await? {
        return Ok(table);
    }
    tracing::info!(table = name, "creating table");
    let iter = RecordBatchIterator::new(vec![].into_iter(), schema);
    Ok(conn.create_table(name, Box::new(iter)).execute().await?)
}

/// SQL string literal with `'` doubled.
pub fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}
