use super::{Db, OrderBy, push_additions, table_name};
use crate::error::CrudResult;
use crate::filter::Filter;
use crate::param::Param;
use crate::pool::ConnectionPool;
use crate::row::FromRow;
use crate::sql::Sql;
use tokio_postgres::Row;
use tokio_postgres::types::ToSql;

/// `SELECT <fields> FROM <table> [WHERE ...] [ORDER BY ...] [additions]`
#[derive(Debug, Clone, Default)]
pub struct SelectRequest {
    pub table: String,
    /// Projection; empty selects `*`. Entries are SQL expressions and are not escaped.
    pub fields: Vec<String>,
    pub filter: Filter,
    /// Values for `?` placeholders in a raw filter and in `additions`.
    pub params: Vec<Param>,
    pub order_by: OrderBy,
    /// Free-form SQL appended last (`LIMIT ?`, `FOR UPDATE`, ...).
    pub additions: String,
    pub schema: Option<String>,
}

impl SelectRequest {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            ..Self::default()
        }
    }

    pub fn fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn filter(mut self, filter: impl Into<Filter>) -> Self {
        self.filter = filter.into();
        self
    }

    /// Append an explicit parameter.
    pub fn bind<T: ToSql + Send + Sync + 'static>(mut self, value: T) -> Self {
        self.params.push(Param::new(value));
        self
    }

    /// Order by `column`; `None` means ascending.
    pub fn order_by(mut self, column: impl Into<String>, direction: Option<&str>) -> Self {
        self.order_by = self.order_by.add(column, direction);
        self
    }

    pub fn additions(mut self, additions: impl Into<String>) -> Self {
        self.additions = additions.into();
        self
    }

    pub fn schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    /// Build the statement without running it.
    pub fn build(&self) -> CrudResult<Sql> {
        let table = table_name(&self.table)?;

        let fields: Vec<&str> = self
            .fields
            .iter()
            .map(|f| f.trim())
            .filter(|f| !f.is_empty())
            .collect();

        let mut q = Sql::new("SELECT ");
        if fields.is_empty() {
            q.push("*");
        } else {
            q.push(&fields.join(", "));
        }
        q.push(" FROM ").push(table);

        self.filter.append_where(&mut q)?;
        self.order_by.append_to(&mut q)?;
        push_additions(&mut q, &self.additions)?;

        q.bind_slots(self.params.iter().cloned());
        q.validate()?;
        Ok(q)
    }
}

impl<P: ConnectionPool> Db<P> {
    /// Run a select and return the row set as-is.
    pub async fn select(&self, req: &SelectRequest) -> CrudResult<Vec<Row>> {
        let stmt = req.build()?;
        self.executor()
            .query(&stmt, self.target_schema(req.schema.as_deref()))
            .await
    }

    /// Run a select and map every row to `T`.
    pub async fn select_as<T: FromRow>(&self, req: &SelectRequest) -> CrudResult<Vec<T>> {
        let rows = self.select(req).await?;
        rows.iter().map(T::from_row).collect()
    }
}
