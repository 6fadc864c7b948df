//! Recording connection pool for unit tests.
//!
//! Rows cannot be fabricated outside `tokio-postgres`, so queries always return an
//! empty row set. Row-returning paths are covered by the `DATABASE_URL` tests.

use crate::client::GenericClient;
use crate::error::{CrudError, CrudResult};
use crate::pool::ConnectionPool;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio_postgres::Row;
use tokio_postgres::types::ToSql;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Call {
    pub kind: &'static str,
    pub sql: String,
    pub params: Vec<String>,
}

#[derive(Debug, Default)]
struct State {
    calls: Mutex<Vec<Call>>,
    acquired: AtomicUsize,
    released: AtomicUsize,
    fail_on: Option<String>,
    affected: u64,
    exhausted: bool,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct MockPool {
    state: Arc<State>,
}

impl MockPool {
    pub fn new() -> Self {
        Self::default()
    }

    fn configure(self, f: impl FnOnce(&mut State)) -> Self {
        let mut state = Arc::try_unwrap(self.state).expect("configure before cloning");
        f(&mut state);
        Self {
            state: Arc::new(state),
        }
    }

    /// Fail any statement whose SQL contains `needle`.
    pub fn fail_on(self, needle: &str) -> Self {
        let needle = needle.to_string();
        self.configure(|s| s.fail_on = Some(needle))
    }

    /// Affected row count reported by `execute`.
    pub fn affected(self, n: u64) -> Self {
        self.configure(|s| s.affected = n)
    }

    /// Make every `acquire` fail.
    pub fn exhausted(self) -> Self {
        self.configure(|s| s.exhausted = true)
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.calls.lock().expect("calls lock").clone()
    }

    pub fn acquired(&self) -> usize {
        self.state.acquired.load(Ordering::SeqCst)
    }

    pub fn released(&self) -> usize {
        self.state.released.load(Ordering::SeqCst)
    }
}

pub(crate) struct MockConn {
    state: Arc<State>,
}

impl Drop for MockConn {
    fn drop(&mut self) {
        self.state.released.fetch_add(1, Ordering::SeqCst);
    }
}

impl MockConn {
    fn record(&self, kind: &'static str, sql: &str, params: &[&(dyn ToSql + Sync)]) -> CrudResult<()> {
        self.state.calls.lock().expect("calls lock").push(Call {
            kind,
            sql: sql.to_string(),
            params: params.iter().map(|p| format!("{p:?}")).collect(),
        });
        match &self.state.fail_on {
            Some(needle) if sql.contains(needle.as_str()) => {
                Err(CrudError::Connection(format!("mock failure on: {sql}")))
            }
            _ => Ok(()),
        }
    }
}

impl GenericClient for MockConn {
    async fn query(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> CrudResult<Vec<Row>> {
        self.record("query", sql, params)?;
        Ok(Vec::new())
    }

    async fn execute(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> CrudResult<u64> {
        self.record("execute", sql, params)?;
        Ok(self.state.affected)
    }

    async fn batch_execute(&self, sql: &str) -> CrudResult<()> {
        self.record("batch", sql, &[])
    }
}

impl ConnectionPool for MockPool {
    type Conn = MockConn;

    async fn acquire(&self) -> CrudResult<MockConn> {
        if self.state.exhausted {
            return Err(CrudError::Pool("mock pool exhausted".to_string()));
        }
        self.state.acquired.fetch_add(1, Ordering::SeqCst);
        Ok(MockConn {
            state: Arc::clone(&self.state),
        })
    }
}
