//! Finder request types.
//!
//! [`FindOptions`] carries the optional where/order/limit clauses of a
//! `find_all` call and renders them onto a model's select template.

use crate::error::{DbError, DbResult};
use crate::models::Value;
use serde::{Deserialize, Serialize};

/// Row cap for a finder: a plain count or an `(offset, count)` window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Limit {
    Count(i64),
    Range(i64, i64),
}

impl Limit {
    /// Reject negative bounds.
    pub fn validate(&self) -> DbResult<()> {
        match *self {
            Limit::Count(count) if count < 0 => Err(DbError::invalid_input(format!(
                "Invalid limit value: {count} (must be non-negative)"
            ))),
            Limit::Range(offset, count) if offset < 0 || count < 0 => {
                Err(DbError::invalid_input(format!(
                    "Invalid limit value: ({offset}, {count}) (offset and count must be non-negative)"
                )))
            }
            _ => Ok(()),
        }
    }

    /// Maximum number of rows this limit can return.
    pub fn count(&self) -> i64 {
        match *self {
            Limit::Count(count) | Limit::Range(_, count) => count,
        }
    }
}

impl From<i64> for Limit {
    fn from(count: i64) -> Self {
        Limit::Count(count)
    }
}

impl From<(i64, i64)> for Limit {
    fn from((offset, count): (i64, i64)) -> Self {
        Limit::Range(offset, count)
    }
}

/// A limit given as a slice must hold one or two elements.
impl TryFrom<&[i64]> for Limit {
    type Error = DbError;

    fn try_from(parts: &[i64]) -> Result<Self, Self::Error> {
        match *parts {
            [count] => Ok(Limit::Count(count)),
            [offset, count] => Ok(Limit::Range(offset, count)),
            _ => Err(DbError::invalid_input(format!(
                "Invalid limit value: {parts:?} (expected a count or an (offset, count) pair)"
            ))),
        }
    }
}

/// Optional clauses for `find_all`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FindOptions {
    /// Where clause using `?` placeholders, without the `where` keyword.
    #[serde(default)]
    pub filter: Option<String>,
    #[serde(default)]
    pub args: Vec<Value>,
    #[serde(default)]
    pub order_by: Option<String>,
    #[serde(default)]
    pub limit: Option<Limit>,
}

impl FindOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the where clause and its arguments.
    pub fn filter<I, V>(mut self, clause: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.filter = Some(clause.into());
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn order_by(mut self, order_by: impl Into<String>) -> Self {
        self.order_by = Some(order_by.into());
        self
    }

    pub fn limit(mut self, limit: impl Into<Limit>) -> Self {
        self.limit = Some(limit.into());
        self
    }

    /// Render the clauses after `select_sql`, returning the statement and its arguments.
    ///
    /// The limit is validated before anything else so a malformed request never
    /// reaches the database.
    pub fn to_sql(&self, select_sql: &str) -> DbResult<(String, Vec<Value>)> {
        if let Some(limit) = &self.limit {
            limit.validate()?;
        }

        let mut sql = vec![select_sql.to_string()];
        let mut args = self.args.clone();

        if let Some(filter) = self.filter.as_deref().filter(|f| !f.trim().is_empty()) {
            sql.push("where".to_string());
            sql.push(filter.to_string());
        }
        if let Some(order_by) = self.order_by.as_deref().filter(|o| !o.trim().is_empty()) {
            sql.push("order by".to_string());
            sql.push(order_by.to_string());
        }
        match self.limit {
            Some(Limit::Count(count)) => {
                sql.push("limit ?".to_string());
                args.push(Value::Int(count));
            }
            Some(Limit::Range(offset, count)) => {
                sql.push("limit ?, ?".to_string());
                args.push(Value::Int(offset));
                args.push(Value::Int(count));
            }
            None => {}
        }

        Ok((sql.join(" "), args))
    }
}
