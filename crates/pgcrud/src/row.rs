//! Row mapping traits and utilities

use crate::error::{CrudError, CrudResult};
use tokio_postgres::Row;
use tokio_postgres::types::Type;

/// Map a database row into a Rust value.
///
/// ```ignore
/// struct User { id: i64, name: String }
///
/// impl FromRow for User {
///     fn from_row(row: &Row) -> CrudResult<Self> {
///         Ok(Self { id: row.try_get_column("id")?, name: row.try_get_column("name")? })
///     }
/// }
/// ```
pub trait FromRow: Sized {
    /// Convert a database row into Self
    fn from_row(row: &Row) -> CrudResult<Self>;
}

/// Extension trait for Row to provide typed access
pub trait RowExt {
    /// Try to get a column value, returning CrudError::Decode on failure
    fn try_get_column<T>(&self, column: &str) -> CrudResult<T>
    where
        T: for<'a> tokio_postgres::types::FromSql<'a>;
}

impl RowExt for Row {
    fn try_get_column<T>(&self, column: &str) -> CrudResult<T>
    where
        T: for<'a> tokio_postgres::types::FromSql<'a>,
    {
        self.try_get(column)
            .map_err(|e| CrudError::decode(column, e.to_string()))
    }
}

/// Read an integer identifier from `column`, widening `int4`/`int2` to `i64`.
///
/// `None` when the row has no such column, the column is not an integer, or
/// the value is NULL.
pub(crate) fn generated_id(row: &Row, column: &str) -> Option<i64> {
    let idx = row.columns().iter().position(|c| c.name() == column)?;
    let ty = row.columns()[idx].type_();
    if *ty == Type::INT8 {
        row.try_get::<_, Option<i64>>(idx).ok().flatten()
    } else if *ty == Type::INT4 {
        row.try_get::<_, Option<i32>>(idx).ok().flatten().map(i64::from)
    } else if *ty == Type::INT2 {
        row.try_get::<_, Option<i16>>(idx).ok().flatten().map(i64::from)
    } else {
        None
    }
}
