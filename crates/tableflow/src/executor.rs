//! Execution seam between composed statements and a database driver.

use crate::error::{FlowError, FlowResult};
use crate::ident::Dialect;
use crate::paging::{PagedQuerySource, PagedQuerySourceFactory, PagingConfig};
use crate::query::{QueryBuilder, StatementKind};
use crate::register::{ChangeAction, ChangeRegister};
use crate::table::TableId;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Runs rendered SQL.
///
/// Implementations own the connection (or pool) and the row type. Every
/// failure should surface as [`FlowError::Load`].
pub trait QueryExecutor: Send + Sync {
    /// Row type produced by range queries.
    type Row: Send;

    /// Run a `SELECT COUNT(*) ...` and return the single count.
    fn execute_count(&self, sql: &str) -> impl Future<Output = FlowResult<i64>> + Send;

    /// Run a windowed SELECT and return its rows.
    fn execute_range(&self, sql: &str) -> impl Future<Output = FlowResult<Vec<Self::Row>>> + Send;

    /// Run an UPDATE / DELETE / INSERT and return the affected row count.
    fn execute_write(&self, sql: &str) -> impl Future<Output = FlowResult<u64>> + Send;
}

impl<E: QueryExecutor> QueryExecutor for &E {
    type Row = E::Row;

    fn execute_count(&self, sql: &str) -> impl Future<Output = FlowResult<i64>> + Send {
        (**self).execute_count(sql)
    }

    fn execute_range(&self, sql: &str) -> impl Future<Output = FlowResult<Vec<Self::Row>>> + Send {
        (**self).execute_range(sql)
    }

    fn execute_write(&self, sql: &str) -> impl Future<Output = FlowResult<u64>> + Send {
        (**self).execute_write(sql)
    }
}

/// Runs operations one at a time, in submission order.
///
/// Wraps an executor whose connection cannot take concurrent statements.
/// Waiters are queued on a fair `tokio::sync::Mutex`.
#[derive(Debug, Default)]
pub struct Serialized<E> {
    inner: E,
    turn: Mutex<()>,
}

impl<E> Serialized<E> {
    pub fn new(inner: E) -> Self {
        Self {
            inner,
            turn: Mutex::new(()),
        }
    }

    pub fn inner(&self) -> &E {
        &self.inner
    }

    pub fn into_inner(self) -> E {
        self.inner
    }
}

impl<E: QueryExecutor> QueryExecutor for Serialized<E> {
    type Row = E::Row;

    async fn execute_count(&self, sql: &str) -> FlowResult<i64> {
        let _turn = self.turn.lock().await;
        self.inner.execute_count(sql).await
    }

    async fn execute_range(&self, sql: &str) -> FlowResult<Vec<Self::Row>> {
        let _turn = self.turn.lock().await;
        self.inner.execute_range(sql).await
    }

    async fn execute_write(&self, sql: &str) -> FlowResult<u64> {
        let _turn = self.turn.lock().await;
        self.inner.execute_write(sql).await
    }
}

/// Executor + change register + dialect.
///
/// Writes issued through the client notify the register once they succeed, so
/// paged sources over the written table are invalidated.
pub struct FlowClient<E> {
    executor: Arc<E>,
    register: Arc<ChangeRegister>,
    dialect: Dialect,
}

impl<E> Clone for FlowClient<E> {
    fn clone(&self) -> Self {
        Self {
            executor: Arc::clone(&self.executor),
            register: Arc::clone(&self.register),
            dialect: self.dialect,
        }
    }
}

impl<E> std::fmt::Debug for FlowClient<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlowClient")
            .field("register", &self.register)
            .field("dialect", &self.dialect)
            .finish_non_exhaustive()
    }
}

impl<E: QueryExecutor> FlowClient<E> {
    pub fn new(executor: E, register: Arc<ChangeRegister>) -> Self {
        Self::from_arc(Arc::new(executor), register)
    }

    pub fn from_arc(executor: Arc<E>, register: Arc<ChangeRegister>) -> Self {
        Self {
            executor,
            register,
            dialect: Dialect::default(),
        }
    }

    /// Render every statement in `dialect`.
    pub fn with_dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn executor(&self) -> &Arc<E> {
        &self.executor
    }

    pub fn register(&self) -> &Arc<ChangeRegister> {
        &self.register
    }

    fn localized(&self, query: &QueryBuilder) -> QueryBuilder {
        let mut query = query.clone();
        query.dialect(self.dialect);
        query
    }

    /// Run a SELECT and return all rows.
    pub async fn fetch(&self, query: &QueryBuilder) -> FlowResult<Vec<E::Row>> {
        require_select(query)?;
        let sql = query.render_with(self.dialect);
        self.executor.execute_range(&sql).await
    }

    /// Count the rows a SELECT would return.
    pub async fn count(&self, query: &QueryBuilder) -> FlowResult<i64> {
        let sql = self.localized(query).count_query()?;
        self.executor.execute_count(&sql).await
    }

    /// Run an UPDATE or DELETE, then notify its target table.
    pub async fn write(&self, query: &QueryBuilder) -> FlowResult<u64> {
        let action = query.primary_action().ok_or_else(|| {
            FlowError::configuration("write requires an UPDATE or DELETE statement")
        })?;
        let table = query
            .target_table()
            .ok_or_else(|| FlowError::configuration("write requires a table target"))?
            .clone();
        let sql = query.render_with(self.dialect);
        self.write_raw(&sql, &table, action).await
    }

    /// Run arbitrary write SQL, then notify `table` with `action`.
    pub async fn write_raw(&self, sql: &str, table: &TableId, action: ChangeAction) -> FlowResult<u64> {
        let affected = self.executor.execute_write(sql).await?;
        let reached = self.register.notify(table, action);
        tracing::debug!(
            target: "tableflow",
            %table,
            %action,
            affected,
            listeners = reached,
            "write committed"
        );
        Ok(affected)
    }

    /// Paged source over `query`, subscribed to this client's register.
    pub fn paged(&self, query: &QueryBuilder) -> FlowResult<PagedQuerySource<E>> {
        PagedQuerySource::new(self.localized(query), &self.register, Arc::clone(&self.executor))
    }

    pub fn paged_with_config(
        &self,
        query: &QueryBuilder,
        config: PagingConfig,
    ) -> FlowResult<PagedQuerySource<E>> {
        PagedQuerySource::with_config(
            self.localized(query),
            &self.register,
            Arc::clone(&self.executor),
            config,
        )
    }

    /// Factory producing a fresh paged source for `query` after each
    /// invalidation.
    pub fn paged_factory(&self, query: &QueryBuilder) -> FlowResult<PagedQuerySourceFactory<E>> {
        PagedQuerySourceFactory::new(self.localized(query), &self.register, Arc::clone(&self.executor))
    }
}

pub(crate) fn require_select(query: &QueryBuilder) -> FlowResult<()> {
    match query.kind() {
        StatementKind::Select => Ok(()),
        other => Err(FlowError::configuration(format!(
            "expected a SELECT statement, got {}",
            other.as_str()
        ))),
    }
}
