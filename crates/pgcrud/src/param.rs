//! Bound parameter values.

use std::fmt;
use std::sync::Arc;
use tokio_postgres::types::ToSql;

/// A bound parameter value.
///
/// Wraps any `ToSql` value behind an `Arc`, so requests and fragments stay cheap to
/// clone. The `Debug` output is the inner value's, which keeps logs and tests readable.
#[derive(Clone)]
pub struct Param(Arc<dyn ToSql + Send + Sync>);

impl Param {
    /// Wrap a value.
    pub fn new<T: ToSql + Send + Sync + 'static>(value: T) -> Self {
        Param(Arc::new(value))
    }

    /// The value as a `tokio-postgres` parameter reference.
    pub fn as_sql(&self) -> &(dyn ToSql + Sync) {
        &*self.0 as &(dyn ToSql + Sync)
    }
}

impl fmt::Debug for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

/// Collect parameter references for a driver call.
pub(crate) fn params_ref(params: &[Param]) -> Vec<&(dyn ToSql + Sync)> {
    params.iter().map(Param::as_sql).collect()
}
