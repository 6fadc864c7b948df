//! ORDER BY rendering.

use crate::error::{CrudError, CrudResult};
use crate::ident::escape_identifier;
use crate::sql::Sql;

/// Sort direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl Direction {
    /// Parse a direction case-insensitively; blank means ascending.
    pub fn parse(s: &str) -> CrudResult<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "" | "ASC" => Ok(Direction::Asc),
            "DESC" => Ok(Direction::Desc),
            other => Err(CrudError::validation(format!(
                "invalid sort direction '{other}', expected ASC or DESC"
            ))),
        }
    }

    pub fn as_sql(self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        }
    }
}

/// Ordered column → direction pairs.
///
/// Column names are always identifier-escaped, since ORDER BY keys cannot be bound.
#[derive(Debug, Clone, Default)]
pub struct OrderBy {
    entries: Vec<(String, Option<String>)>,
}

impl OrderBy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a column; `None` sorts ascending.
    pub fn add(mut self, column: impl Into<String>, direction: Option<&str>) -> Self {
        self.entries
            .push((column.into(), direction.map(str::to_string)));
        self
    }

    pub fn asc(self, column: impl Into<String>) -> Self {
        self.add(column, Some("ASC"))
    }

    pub fn desc(self, column: impl Into<String>) -> Self {
        self.add(column, Some("DESC"))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Append ` ORDER BY ...`, or nothing when empty.
    pub(crate) fn append_to(&self, sql: &mut Sql) -> CrudResult<()> {
        if self.entries.is_empty() {
            return Ok(());
        }
        sql.push(" ORDER BY ");
        for (i, (column, direction)) in self.entries.iter().enumerate() {
            if i > 0 {
                sql.push(", ");
            }
            let direction = Direction::parse(direction.as_deref().unwrap_or_default())?;
            sql.push(&escape_identifier(column)?)
                .push(" ")
                .push(direction.as_sql());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(order: &OrderBy) -> CrudResult<String> {
        let mut q = Sql::empty();
        order.append_to(&mut q)?;
        Ok(q.to_sql())
    }

    #[test]
    fn missing_direction_defaults_to_ascending_and_escapes() {
        let order = OrderBy::new().add("name", None);
        assert_eq!(render(&order).unwrap(), r#" ORDER BY "name" ASC"#);
    }

    #[test]
    fn direction_is_upper_cased() {
        let order = OrderBy::new().add("created_at", Some("desc")).add("id", Some("Asc"));
        assert_eq!(
            render(&order).unwrap(),
            r#" ORDER BY "created_at" DESC, "id" ASC"#
        );
    }

    #[test]
    fn empty_order_renders_nothing() {
        assert_eq!(render(&OrderBy::new()).unwrap(), "");
    }

    #[test]
    fn rejects_injected_direction() {
        let order = OrderBy::new().add("id", Some("ASC; DROP TABLE users"));
        assert!(render(&order).unwrap_err().is_validation());
    }

    #[test]
    fn injected_column_stays_an_identifier() {
        let order = OrderBy::new().desc(r#"id" ; DROP TABLE users; --"#);
        assert_eq!(
            render(&order).unwrap(),
            r#" ORDER BY "id"" ; DROP TABLE users; --" DESC"#
        );
    }
}
