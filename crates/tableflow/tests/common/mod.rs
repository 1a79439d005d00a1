//! In-memory executor used by the integration tests.
//!
//! Rows are the integers `0..len`. Range queries are answered by reading the
//! trailing `LIMIT n OFFSET m` of the rendered SQL.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tableflow::{FlowError, FlowResult, QueryExecutor};

pub type Hook = Box<dyn Fn() + Send + Sync>;

#[derive(Default)]
pub struct MemoryExecutor {
    len: AtomicUsize,
    pub counts: AtomicUsize,
    pub ranges: AtomicUsize,
    pub writes: AtomicUsize,
    fail: AtomicBool,
    after_count: Mutex<Option<Hook>>,
    after_range: Mutex<Option<Hook>>,
    pub statements: Mutex<Vec<String>>,
}

impl MemoryExecutor {
    pub fn with_rows(len: usize) -> Arc<Self> {
        let executor = Self::default();
        executor.len.store(len, Ordering::SeqCst);
        Arc::new(executor)
    }

    pub fn set_len(&self, len: usize) {
        self.len.store(len, Ordering::SeqCst);
    }

    pub fn fail_next(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Run `hook` after every count query, before it returns.
    pub fn after_count(&self, hook: impl Fn() + Send + Sync + 'static) {
        *self.after_count.lock().unwrap() = Some(Box::new(hook));
    }

    /// Run `hook` after every range query, before it returns.
    pub fn after_range(&self, hook: impl Fn() + Send + Sync + 'static) {
        *self.after_range.lock().unwrap() = Some(Box::new(hook));
    }

    pub fn counts(&self) -> usize {
        self.counts.load(Ordering::SeqCst)
    }

    pub fn ranges(&self) -> usize {
        self.ranges.load(Ordering::SeqCst)
    }

    fn check_failure(&self) -> FlowResult<()> {
        if self.fail.swap(false, Ordering::SeqCst) {
            Err(FlowError::load("simulated failure"))
        } else {
            Ok(())
        }
    }

    fn run_hook(hook: &Mutex<Option<Hook>>) {
        if let Some(hook) = hook.lock().unwrap().as_ref() {
            hook();
        }
    }
}

/// Parse the trailing `LIMIT n OFFSET m` window.
pub fn window(sql: &str) -> (usize, usize) {
    let limit = number_after(sql, " LIMIT ").unwrap_or(usize::MAX);
    let offset = number_after(sql, " OFFSET ").unwrap_or(0);
    (offset, limit)
}

fn number_after(sql: &str, keyword: &str) -> Option<usize> {
    let start = sql.rfind(keyword)? + keyword.len();
    sql[start..]
        .split(' ')
        .next()
        .and_then(|n| n.parse().ok())
}

impl QueryExecutor for MemoryExecutor {
    type Row = i64;

    async fn execute_count(&self, sql: &str) -> FlowResult<i64> {
        self.statements.lock().unwrap().push(sql.to_string());
        self.counts.fetch_add(1, Ordering::SeqCst);
        self.check_failure()?;
        let len = self.len.load(Ordering::SeqCst);
        Self::run_hook(&self.after_count);
        Ok(len as i64)
    }

    async fn execute_range(&self, sql: &str) -> FlowResult<Vec<i64>> {
        self.statements.lock().unwrap().push(sql.to_string());
        self.ranges.fetch_add(1, Ordering::SeqCst);
        self.check_failure()?;
        let len = self.len.load(Ordering::SeqCst);
        let (offset, limit) = window(sql);
        let end = offset.saturating_add(limit).min(len);
        let rows = (offset.min(end)..end).map(|i| i as i64).collect();
        Self::run_hook(&self.after_range);
        Ok(rows)
    }

    async fn execute_write(&self, sql: &str) -> FlowResult<u64> {
        self.statements.lock().unwrap().push(sql.to_string());
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.check_failure()?;
        Ok(1)
    }
}
