//! [`QueryExecutor`] over a single `tokio_postgres::Client`.
//!
//! Render with [`Dialect::Postgres`](crate::Dialect::Postgres) when using this
//! executor (for example via [`FlowClient::with_dialect`](crate::FlowClient::with_dialect)).

use crate::error::{FlowError, FlowResult};
use crate::executor::QueryExecutor;
use tokio_postgres::{Client, Row};

/// Executor backed by one PostgreSQL connection.
///
/// A single connection pipelines statements; wrap it in
/// [`Serialized`](crate::Serialized) if strict submission order matters.
pub struct PgExecutor {
    client: Client,
}

impl PgExecutor {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn into_inner(self) -> Client {
        self.client
    }
}

impl std::fmt::Debug for PgExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgExecutor").finish_non_exhaustive()
    }
}

impl QueryExecutor for PgExecutor {
    type Row = Row;

    async fn execute_count(&self, sql: &str) -> FlowResult<i64> {
        let row = self.client.query_one(sql, &[]).await?;
        read_count(&row)
    }

    async fn execute_range(&self, sql: &str) -> FlowResult<Vec<Row>> {
        Ok(self.client.query(sql, &[]).await?)
    }

    async fn execute_write(&self, sql: &str) -> FlowResult<u64> {
        Ok(self.client.execute(sql, &[]).await?)
    }
}

/// Read the first column of a `COUNT(*)` row.
pub(crate) fn read_count(row: &Row) -> FlowResult<i64> {
    row.try_get::<_, i64>(0)
        .map_err(|e| FlowError::load(format!("count column: {e}")))
}
