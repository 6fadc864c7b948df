use super::{Db, Fields, table_name};
use crate::error::{CrudError, CrudResult};
use crate::ident::validate_identifier;
use crate::pool::ConnectionPool;
use crate::row::generated_id;
use crate::sql::Sql;
use tokio_postgres::types::ToSql;

/// `INSERT INTO <table> (c1, c2, ...) VALUES ($1, $2, ...) RETURNING *`
#[derive(Debug, Clone, Default)]
pub struct InsertRequest {
    pub table: String,
    pub data: Fields,
    pub schema: Option<String>,
}

impl InsertRequest {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            ..Self::default()
        }
    }

    pub fn set<T: ToSql + Send + Sync + 'static>(mut self, column: impl Into<String>, value: T) -> Self {
        self.data = self.data.set(column, value);
        self
    }

    pub fn data(mut self, data: Fields) -> Self {
        self.data = data;
        self
    }

    pub fn schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    /// Build the statement.
    ///
    /// The whole inserted row is returned, so tables without an id column insert too.
    pub fn build(&self) -> CrudResult<Sql> {
        let table = table_name(&self.table)?;
        if self.data.is_empty() {
            return Err(CrudError::validation(format!(
                "insert into '{table}' requires data"
            )));
        }

        let mut q = Sql::new("INSERT INTO ");
        q.push(table).push(" (");
        for (i, (column, _)) in self.data.iter().enumerate() {
            if i > 0 {
                q.push(", ");
            }
            q.push(validate_identifier(column)?);
        }
        q.push(") VALUES (");
        for (i, (_, value)) in self.data.iter().enumerate() {
            if i > 0 {
                q.push(", ");
            }
            q.push_param(value.clone());
        }
        q.push(") RETURNING *");
        Ok(q)
    }
}

impl<P: ConnectionPool> Db<P> {
    /// Insert one row and return its generated identifier.
    ///
    /// The identifier is the configured id column of the inserted row. It is
    /// `None` when the table has no such column or the column is not an
    /// integer; the row is inserted either way.
    pub async fn insert(&self, req: &InsertRequest) -> CrudResult<Option<i64>> {
        let stmt = req.build()?;
        let rows = self
            .executor()
            .query(&stmt, self.target_schema(req.schema.as_deref()))
            .await?;
        let id_column = self.config().id_column.as_str();
        Ok(rows.first().and_then(|row| generated_id(row, id_column)))
    }
}
