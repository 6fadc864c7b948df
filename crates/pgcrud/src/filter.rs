//! WHERE clause translation.
//!
//! A [`Filter`] is either a raw SQL condition, used verbatim, or a structured
//! [`WhereMap`] of column → predicate. Both shapes go through one translation
//! step that yields a SQL fragment plus its parameters in placeholder order.
//!
//! ```ignore
//! use pgcrud::{Filter, WhereMap};
//!
//! let by_owner = WhereMap::new().eq("owner_id", 7_i64).is_null("deleted_at");
//! let frag = Filter::from(by_owner).translate()?;
//! assert_eq!(frag.sql, "owner_id = $1 AND deleted_at IS NULL");
//! ```
//!
//! An empty `WhereMap` is rejected with [`CrudError::Validation`]. It never means
//! "match everything"; use an empty raw filter for that (where allowed).

use crate::error::{CrudError, CrudResult};
use crate::ident::validate_identifier;
use crate::param::Param;
use crate::sql::Sql;
use tokio_postgres::types::ToSql;

/// How the predicates of a [`WhereMap`] are joined.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Connective {
    #[default]
    And,
    Or,
}

impl Connective {
    fn as_sql(self) -> &'static str {
        match self {
            Connective::And => " AND ",
            Connective::Or => " OR ",
        }
    }
}

/// A single column predicate.
#[derive(Debug, Clone)]
pub enum Predicate {
    /// `col = $n`
    Eq(Param),
    /// `col <> $n`
    Ne(Param),
    /// `col IN ($n, ...)`; an empty list matches nothing
    In(Vec<Param>),
    /// `col IS NULL`
    IsNull,
    /// `col IS NOT NULL`
    IsNotNull,
}

/// An ordered column → predicate mapping.
#[derive(Debug, Clone, Default)]
pub struct WhereMap {
    entries: Vec<(String, Predicate)>,
    connective: Connective,
}

impl WhereMap {
    /// Create an empty mapping joined with `AND`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty mapping joined with `OR`.
    pub fn any() -> Self {
        Self::new().connective(Connective::Or)
    }

    /// Set the connective.
    pub fn connective(mut self, connective: Connective) -> Self {
        self.connective = connective;
        self
    }

    /// Add a predicate for `column`.
    pub fn predicate(mut self, column: impl Into<String>, predicate: Predicate) -> Self {
        self.entries.push((column.into(), predicate));
        self
    }

    /// `column = value`
    pub fn eq<T: ToSql + Send + Sync + 'static>(self, column: impl Into<String>, value: T) -> Self {
        self.predicate(column, Predicate::Eq(Param::new(value)))
    }

    /// `column <> value`
    pub fn ne<T: ToSql + Send + Sync + 'static>(self, column: impl Into<String>, value: T) -> Self {
        self.predicate(column, Predicate::Ne(Param::new(value)))
    }

    /// `column IN (values...)`
    pub fn in_list<T, I>(self, column: impl Into<String>, values: I) -> Self
    where
        T: ToSql + Send + Sync + 'static,
        I: IntoIterator<Item = T>,
    {
        let params = values.into_iter().map(Param::new).collect();
        self.predicate(column, Predicate::In(params))
    }

    /// `column IS NULL`
    pub fn is_null(self, column: impl Into<String>) -> Self {
        self.predicate(column, Predicate::IsNull)
    }

    /// `column IS NOT NULL`
    pub fn is_not_null(self, column: impl Into<String>) -> Self {
        self.predicate(column, Predicate::IsNotNull)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn append_to(&self, sql: &mut Sql) -> CrudResult<()> {
        if self.entries.is_empty() {
            return Err(CrudError::validation(
                "structured filter must contain at least one column",
            ));
        }
        let many = self.entries.len() > 1 && self.connective == Connective::Or;
        if many {
            sql.push("(");
        }
        for (i, (column, predicate)) in self.entries.iter().enumerate() {
            if i > 0 {
                sql.push(self.connective.as_sql());
            }
            sql.push(validate_identifier(column)?);
            match predicate {
                Predicate::Eq(v) => {
                    sql.push(" = ").push_param(v.clone());
                }
                Predicate::Ne(v) => {
                    sql.push(" <> ").push_param(v.clone());
                }
                Predicate::In(values) => {
                    sql.push(" IN (").push_param_list(values).push(")");
                }
                Predicate::IsNull => {
                    sql.push(" IS NULL");
                }
                Predicate::IsNotNull => {
                    sql.push(" IS NOT NULL");
                }
            }
        }
        if many {
            sql.push(")");
        }
        Ok(())
    }
}

/// A WHERE condition in one of its two call shapes.
#[derive(Debug, Clone)]
pub enum Filter {
    /// Caller-written condition; `?` placeholders are bound from explicit params.
    Raw(String),
    /// Column → predicate mapping, bound automatically.
    Structured(WhereMap),
}

impl Default for Filter {
    fn default() -> Self {
        Filter::Raw(String::new())
    }
}

impl From<&str> for Filter {
    fn from(s: &str) -> Self {
        Filter::Raw(s.to_string())
    }
}

impl From<String> for Filter {
    fn from(s: String) -> Self {
        Filter::Raw(s)
    }
}

impl From<WhereMap> for Filter {
    fn from(map: WhereMap) -> Self {
        Filter::Structured(map)
    }
}

/// The translated form of a [`Filter`].
#[derive(Debug, Clone)]
pub struct FilterFragment {
    /// Condition text with `$n` placeholders numbered from 1.
    pub sql: String,
    /// Values for the placeholders, in order.
    pub params: Vec<Param>,
}

impl Filter {
    /// No condition.
    pub fn none() -> Self {
        Filter::default()
    }

    /// True for a raw filter that is empty or only whitespace.
    ///
    /// A structured filter is never "empty" here; an empty mapping fails translation.
    pub fn is_empty(&self) -> bool {
        match self {
            Filter::Raw(s) => s.trim().is_empty(),
            Filter::Structured(_) => false,
        }
    }

    /// Translate into a standalone fragment.
    ///
    /// For raw filters the text is returned as written and `params` is empty; its
    /// `?` placeholders are filled from the caller's explicit params at build time.
    pub fn translate(&self) -> CrudResult<FilterFragment> {
        match self {
            Filter::Raw(s) => Ok(FilterFragment {
                sql: s.clone(),
                params: Vec::new(),
            }),
            Filter::Structured(map) => {
                let mut sql = Sql::empty();
                map.append_to(&mut sql)?;
                Ok(FilterFragment {
                    sql: sql.to_sql(),
                    params: sql.params(),
                })
            }
        }
    }

    /// Append ` WHERE <condition>` unless the filter is empty.
    ///
    /// Returns whether a WHERE clause was written.
    pub(crate) fn append_where(&self, sql: &mut Sql) -> CrudResult<bool> {
        match self {
            Filter::Raw(s) if s.trim().is_empty() => Ok(false),
            Filter::Raw(s) => {
                sql.push(" WHERE ");
                sql.push_fragment(s)?;
                Ok(true)
            }
            Filter::Structured(map) => {
                sql.push(" WHERE ");
                map.append_to(sql)?;
                Ok(true)
            }
        }
    }
}
