//! Parameter binding utilities for database queries.
//!
//! This module binds positional [`Value`] arguments to database-specific
//! query objects, in placeholder order.

use crate::models::Value;
use sqlx::mysql::MySqlArguments;
use sqlx::sqlite::SqliteArguments;
use sqlx::{MySql, Sqlite};

pub(crate) type MySqlQuery<'q> = sqlx::query::Query<'q, MySql, MySqlArguments>;
pub(crate) type SqliteQuery<'q> = sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>>;

/// Build a MySQL query with every argument bound.
pub(crate) fn mysql_query<'q>(sql: &'q str, args: &'q [Value]) -> MySqlQuery<'q> {
    args.iter().fold(sqlx::query(sql), bind_mysql_param)
}

/// Build a SQLite query with every argument bound.
pub(crate) fn sqlite_query<'q>(sql: &'q str, args: &'q [Value]) -> SqliteQuery<'q> {
    args.iter().fold(sqlx::query(sql), bind_sqlite_param)
}

/// Bind a parameter to a MySQL query.
pub(crate) fn bind_mysql_param<'q>(query: MySqlQuery<'q>, param: &'q Value) -> MySqlQuery<'q> {
    match param {
        Value::Null => query.bind(None::<String>),
        Value::Bool(v) => query.bind(*v),
        Value::Int(v) => query.bind(*v),
        Value::Float(v) => query.bind(*v),
        Value::Text(v) => query.bind(v.as_str()),
        Value::Bytes(v) => query.bind(v.as_slice()),
    }
}

/// Bind a parameter to a SQLite query.
pub(crate) fn bind_sqlite_param<'q>(
    query: SqliteQuery<'q>,
    param: &'q Value,
) -> SqliteQuery<'q> {
    match param {
        Value::Null => query.bind(None::<String>),
        Value::Bool(v) => query.bind(*v),
        Value::Int(v) => query.bind(*v),
        Value::Float(v) => query.bind(*v),
        Value::Text(v) => query.bind(v.as_str()),
        Value::Bytes(v) => query.bind(v.as_slice()),
    }
}
