//! Paged loading over a SELECT, invalidated by table changes.
//!
//! A [`PagedQuerySource`] subscribes to every table its query reads. Each
//! notification bumps a generation counter and publishes it on a `watch`
//! channel; the consumer reacts by discarding the source and creating a new one
//! (see [`PagedQuerySourceFactory`]).
//!
//! Loads snapshot the generation before touching the executor and compare it
//! afterwards. A count/range pair that straddles an invalidation is discarded
//! and retried, so an [`InitialPage`] is always internally consistent.

use crate::error::{FlowError, FlowResult};
use crate::executor::{QueryExecutor, require_select};
use crate::query::QueryBuilder;
use crate::register::{ChangeAction, ChangeRegister, RegisteredListener, TableChangeListener};
use crate::table::TableId;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::watch;

const DEFAULT_MAX_RESTARTS: u32 = 3;

/// Configuration for a [`PagedQuerySource`].
#[derive(Debug, Clone)]
pub struct PagingConfig {
    /// How many times an initial load may restart after an invalidation
    /// before failing with [`FlowError::Stale`].
    pub max_restarts: u32,
}

impl Default for PagingConfig {
    fn default() -> Self {
        Self {
            max_restarts: DEFAULT_MAX_RESTARTS,
        }
    }
}

impl PagingConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the restart limit.
    pub fn max_restarts(mut self, max_restarts: u32) -> Self {
        self.max_restarts = max_restarts;
        self
    }
}

/// Result of [`PagedQuerySource::initial_load`].
#[derive(Debug, Clone, PartialEq)]
pub struct InitialPage<R> {
    pub items: Vec<R>,
    /// Offset of the first item.
    pub position: u64,
    /// Rows the query matched when the page was read.
    pub total_count: u64,
    /// Generation both queries ran under.
    pub generation: u64,
}

/// Result of [`PagedQuerySource::range_load`].
#[derive(Debug, Clone, PartialEq)]
pub struct Page<R> {
    pub items: Vec<R>,
    pub generation: u64,
}

struct Invalidation {
    generation: AtomicU64,
    tx: watch::Sender<u64>,
}

impl Invalidation {
    fn new() -> Self {
        let (tx, _) = watch::channel(0);
        Self {
            generation: AtomicU64::new(0),
            tx,
        }
    }

    fn current(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    fn bump(&self) -> u64 {
        let next = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        self.tx.send_replace(next);
        next
    }
}

impl TableChangeListener for Invalidation {
    fn on_change(&self, table: &TableId, action: ChangeAction) {
        let generation = self.bump();
        tracing::debug!(target: "tableflow", %table, %action, generation, "paged source invalidated");
    }
}

/// Paged reader over one SELECT.
pub struct PagedQuerySource<E> {
    query: QueryBuilder,
    count_sql: String,
    tables: BTreeSet<TableId>,
    executor: Arc<E>,
    config: PagingConfig,
    invalidation: Arc<Invalidation>,
    subscription: RegisteredListener,
    closed: AtomicBool,
}

impl<E> PagedQuerySource<E> {
    /// Unsubscribe from the register. Further loads fail with
    /// [`FlowError::Closed`]. Safe to call more than once.
    pub fn close(&self) {
        if !self.closed.swap(true, Ordering::AcqRel) {
            self.subscription.unsubscribe();
            tracing::debug!(target: "tableflow", tables = ?self.tables, "paged source closed");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Current invalidation generation.
    pub fn generation(&self) -> u64 {
        self.invalidation.current()
    }

    /// Receiver that observes every generation bump.
    pub fn invalidations(&self) -> watch::Receiver<u64> {
        self.invalidation.tx.subscribe()
    }

    /// Invalidate without a table change.
    pub fn invalidate(&self) -> u64 {
        self.invalidation.bump()
    }

    pub fn query(&self) -> &QueryBuilder {
        &self.query
    }

    /// Tables this source is subscribed to.
    pub fn associated_tables(&self) -> &BTreeSet<TableId> {
        &self.tables
    }

    pub fn config(&self) -> &PagingConfig {
        &self.config
    }

    fn ensure_open(&self) -> FlowResult<()> {
        if self.is_closed() {
            Err(FlowError::Closed)
        } else {
            Ok(())
        }
    }
}

impl<E: QueryExecutor> PagedQuerySource<E> {
    /// Create a source with the default [`PagingConfig`].
    pub fn new(
        query: QueryBuilder,
        register: &Arc<ChangeRegister>,
        executor: Arc<E>,
    ) -> FlowResult<Self> {
        Self::with_config(query, register, executor, PagingConfig::default())
    }

    /// Create a source and subscribe it to the query's tables.
    ///
    /// Fails with [`FlowError::Configuration`] unless `query` is a SELECT.
    pub fn with_config(
        query: QueryBuilder,
        register: &Arc<ChangeRegister>,
        executor: Arc<E>,
        config: PagingConfig,
    ) -> FlowResult<Self> {
        require_select(&query)?;
        let count_sql = query.count_query()?;
        let tables = query.associated_tables();
        let invalidation = Arc::new(Invalidation::new());
        let subscription = register.subscribe(
            tables.iter().cloned(),
            Arc::clone(&invalidation) as Arc<dyn TableChangeListener>,
        );

        Ok(Self {
            query,
            count_sql,
            tables,
            executor,
            config,
            invalidation,
            subscription,
            closed: AtomicBool::new(false),
        })
    }

    /// Count the rows, then read up to `size` of them starting at `start`.
    ///
    /// The count and the range are guaranteed to come from the same
    /// generation. If an invalidation lands in between, both are discarded and
    /// the load restarts, up to [`PagingConfig::max_restarts`] times.
    pub async fn initial_load(&self, start: u64, size: u64) -> FlowResult<InitialPage<E::Row>> {
        let mut attempts: u32 = 0;
        loop {
            self.ensure_open()?;
            attempts += 1;
            let generation = self.generation();

            let counted = self.executor.execute_count(&self.count_sql).await?;
            let total_count = u64::try_from(counted).unwrap_or(0);

            if self.generation() == generation {
                let len = if start >= total_count {
                    0
                } else {
                    size.min(total_count - start)
                };
                let items = if len > 0 {
                    let sql = self.query.constrain(start, len).render();
                    self.executor.execute_range(&sql).await?
                } else {
                    Vec::new()
                };

                if self.generation() == generation {
                    self.ensure_open()?;
                    return Ok(InitialPage {
                        items,
                        position: start,
                        total_count,
                        generation,
                    });
                }
            }

            if attempts > self.config.max_restarts {
                tracing::debug!(target: "tableflow", attempts, "initial load gave up");
                return Err(FlowError::Stale { attempts });
            }
            tracing::debug!(target: "tableflow", attempts, start, size, "initial load restarted");
        }
    }

    /// Read up to `size` rows starting at `start`, without counting.
    ///
    /// Fails with [`FlowError::Stale`] if the source was invalidated while the
    /// read was in flight.
    pub async fn range_load(&self, start: u64, size: u64) -> FlowResult<Page<E::Row>> {
        self.ensure_open()?;
        let generation = self.generation();
        if size == 0 {
            return Ok(Page {
                items: Vec::new(),
                generation,
            });
        }

        let sql = self.query.constrain(start, size).render();
        let items = self.executor.execute_range(&sql).await?;

        if self.generation() != generation {
            tracing::debug!(target: "tableflow", start, size, "range load discarded");
            return Err(FlowError::Stale { attempts: 1 });
        }
        self.ensure_open()?;
        Ok(Page { items, generation })
    }
}

impl<E> std::fmt::Debug for PagedQuerySource<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PagedQuerySource")
            .field("tables", &self.tables)
            .field("generation", &self.generation())
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

impl<E> Drop for PagedQuerySource<E> {
    fn drop(&mut self) {
        self.close();
    }
}

/// Creates fresh [`PagedQuerySource`]s for one query.
///
/// Hold one factory per list view; after an invalidation, drop the old source
/// and call [`create`](Self::create) again.
pub struct PagedQuerySourceFactory<E> {
    query: QueryBuilder,
    register: Arc<ChangeRegister>,
    executor: Arc<E>,
    config: PagingConfig,
}

impl<E: QueryExecutor> PagedQuerySourceFactory<E> {
    /// Fails with [`FlowError::Configuration`] unless `query` is a SELECT.
    pub fn new(
        query: QueryBuilder,
        register: &Arc<ChangeRegister>,
        executor: Arc<E>,
    ) -> FlowResult<Self> {
        require_select(&query)?;
        Ok(Self {
            query,
            register: Arc::clone(register),
            executor,
            config: PagingConfig::default(),
        })
    }

    pub fn config(mut self, config: PagingConfig) -> Self {
        self.config = config;
        self
    }

    pub fn create(&self) -> FlowResult<PagedQuerySource<E>> {
        PagedQuerySource::with_config(
            self.query.clone(),
            &self.register,
            Arc::clone(&self.executor),
            self.config.clone(),
        )
    }
}

impl<E> Clone for PagedQuerySourceFactory<E> {
    fn clone(&self) -> Self {
        Self {
            query: self.query.clone(),
            register: Arc::clone(&self.register),
            executor: Arc::clone(&self.executor),
            config: self.config.clone(),
        }
    }
}

impl<E> std::fmt::Debug for PagedQuerySourceFactory<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PagedQuerySourceFactory")
            .field("query", &self.query)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
