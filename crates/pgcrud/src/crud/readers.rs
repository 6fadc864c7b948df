//! Single-row and existence reads built on `select`.

use super::{Db, SelectRequest};
use crate::error::CrudResult;
use crate::filter::Filter;
use crate::pool::ConnectionPool;
use crate::row::FromRow;
use tokio_postgres::Row;

impl<P: ConnectionPool> Db<P> {
    /// Fetch the first matching row.
    ///
    /// `LIMIT 1` is appended after the request's additions. Zero rows is `Ok(None)`.
    pub async fn get(&self, req: &SelectRequest) -> CrudResult<Option<Row>> {
        let mut stmt = req.build()?;
        stmt.push(" LIMIT 1");
        let rows = self
            .executor()
            .query(&stmt, self.target_schema(req.schema.as_deref()))
            .await?;
        Ok(rows.into_iter().next())
    }

    /// Fetch the first matching row mapped to `T`.
    pub async fn get_as<T: FromRow>(&self, req: &SelectRequest) -> CrudResult<Option<T>> {
        let row = self.get(req).await?;
        row.as_ref().map(T::from_row).transpose()
    }

    /// Whether any row of `table` satisfies `filter`.
    ///
    /// Only the configured id column is projected.
    pub async fn does_exist(
        &self,
        table: &str,
        filter: impl Into<Filter>,
        schema: Option<&str>,
    ) -> CrudResult<bool> {
        let mut req = SelectRequest::new(table)
            .fields([self.config().id_column.as_str()])
            .filter(filter);
        req.schema = schema.map(str::to_string);
        Ok(self.get(&req).await?.is_some())
    }
}
