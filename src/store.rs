//! Storage collaborator: the trait the provider talks to, and its SQLite implementation.

use crate::cursor::RowSet;
use crate::error::ProviderError;
use crate::sql::{self, QueryBuf, SqliteBindValue};
use async_trait::async_trait;
use serde_json::Value;
use sqlx::sqlite::{
    Sqlite, SqliteArguments, SqliteConnectOptions, SqliteJournalMode, SqlitePool,
    SqlitePoolOptions, SqliteRow, SqliteSynchronous,
};
use std::str::FromStr;
use std::time::Duration;

/// Primitives the provider needs from a SQL engine. Every method may fail with a
/// constraint violation (`ProviderError::Conflict`) or an engine error.
#[async_trait]
pub trait Storage: Send + Sync {
    async fn create_table(&self, ddl: &str) -> Result<(), ProviderError>;

    async fn drop_table(&self, table: &str) -> Result<(), ProviderError>;

    /// Version recorded by the last `set_schema_version`; 0 for a fresh store.
    async fn schema_version(&self) -> Result<i64, ProviderError>;

    async fn set_schema_version(&self, version: i64) -> Result<(), ProviderError>;

    /// Runs a SELECT whose result columns are exactly `columns`, in order.
    async fn select(&self, columns: &[&str], q: &QueryBuf) -> Result<RowSet, ProviderError>;

    /// Runs an INSERT and returns the new row id.
    async fn insert(&self, q: &QueryBuf) -> Result<i64, ProviderError>;

    /// Runs an UPDATE and returns the affected-row count.
    async fn update(&self, q: &QueryBuf) -> Result<u64, ProviderError>;

    /// Runs a DELETE and returns the affected-row count.
    async fn delete(&self, q: &QueryBuf) -> Result<u64, ProviderError>;

    async fn ping(&self) -> Result<(), ProviderError>;
}

#[derive(Clone)]
pub struct SqliteStorage {
    pool: SqlitePool,
}

impl SqliteStorage {
    /// Opens (creating if missing) a file database. `:memory:` urls go through [`Self::in_memory`].
    pub async fn connect(database_url: &str) -> Result<Self, ProviderError> {
        if database_url.contains(":memory:") {
            return Self::in_memory().await;
        }
        let connect_opts = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .busy_timeout(Duration::from_secs(5))
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(connect_opts)
            .await?;
        tracing::info!(database_url, "storage connected");
        Ok(SqliteStorage { pool })
    }

    /// Private in-memory database. The pool holds a single connection that is
    /// never recycled, since each SQLite memory connection is its own database.
    pub async fn in_memory() -> Result<Self, ProviderError> {
        let connect_opts = SqliteConnectOptions::from_str("sqlite::memory:")?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(connect_opts)
            .await?;
        Ok(SqliteStorage { pool })
    }
}

fn bind_all<'q>(sql: &'q str, params: &[Value]) -> sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>> {
    let mut query = sqlx::query(sql);
    for p in params {
        query = query.bind(SqliteBindValue::from_json(p));
    }
    query
}

#[async_trait]
impl Storage for SqliteStorage {
    async fn create_table(&self, ddl: &str) -> Result<(), ProviderError> {
        tracing::debug!(sql = %ddl, "ddl");
        sqlx::query(ddl).execute(&self.pool).await?;
        Ok(())
    }

    async fn drop_table(&self, table: &str) -> Result<(), ProviderError> {
        let ddl = sql::drop_table(table);
        tracing::debug!(sql = %ddl, "ddl");
        sqlx::query(&ddl).execute(&self.pool).await?;
        Ok(())
    }

    async fn schema_version(&self) -> Result<i64, ProviderError> {
        let v: i64 = sqlx::query_scalar("PRAGMA user_version")
            .fetch_one(&self.pool)
            .await?;
        Ok(v)
    }

    async fn set_schema_version(&self, version: i64) -> Result<(), ProviderError> {
        sqlx::query(&format!("PRAGMA user_version = {}", version))
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn select(&self, columns: &[&str], q: &QueryBuf) -> Result<RowSet, ProviderError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let rows = bind_all(&q.sql, &q.params).fetch_all(&self.pool).await?;
        let mut out = RowSet::new(columns.iter().map(|c| c.to_string()).collect());
        for row in &rows {
            out.push_row((0..columns.len()).map(|i| cell_to_value(row, i)).collect());
        }
        Ok(out)
    }

    async fn insert(&self, q: &QueryBuf) -> Result<i64, ProviderError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "insert");
        let res = bind_all(&q.sql, &q.params).execute(&self.pool).await?;
        Ok(res.last_insert_rowid())
    }

    async fn update(&self, q: &QueryBuf) -> Result<u64, ProviderError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "update");
        let res = bind_all(&q.sql, &q.params).execute(&self.pool).await?;
        Ok(res.rows_affected())
    }

    async fn delete(&self, q: &QueryBuf) -> Result<u64, ProviderError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "delete");
        let res = bind_all(&q.sql, &q.params).execute(&self.pool).await?;
        Ok(res.rows_affected())
    }

    async fn ping(&self) -> Result<(), ProviderError> {
        sqlx::query("SELECT 1").fetch_optional(&self.pool).await?;
        Ok(())
    }
}

fn cell_to_value(row: &SqliteRow, idx: usize) -> Value {
    use sqlx::Row;
    if let Ok(Some(n)) = row.try_get::<Option<i64>, _>(idx) {
        return Value::Number(n.into());
    }
    if let Ok(Some(n)) = row.try_get::<Option<f64>, _>(idx) {
        if let Some(n) = serde_json::Number::from_f64(n) {
            return Value::Number(n);
        }
    }
    if let Ok(Some(s)) = row.try_get::<Option<String>, _>(idx) {
        return Value::String(s);
    }
    Value::Null
}
