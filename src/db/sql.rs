//! SQL text helpers.
//!
//! Identifier quoting for generated statements, plus the placeholder check
//! and statement classification applied before a statement reaches the
//! driver. Both use [sqlparser](https://docs.rs/sqlparser/) with the dialect
//! of the target database, so quoting, escapes and comments follow the
//! server's lexical rules.

use crate::config::DatabaseType;
use crate::error::{DbError, DbResult};
use sqlparser::ast::{SetExpr, Statement};
use sqlparser::dialect::{Dialect, MySqlDialect, SQLiteDialect};
use sqlparser::parser::Parser;
use sqlparser::tokenizer::{Token, Tokenizer};
use std::borrow::Cow;

/// Quote an identifier with backticks, doubling any embedded backtick.
pub fn quote_ident(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

/// Comma-separated list of `count` placeholders: `?, ?, ?`.
pub fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

/// Get the appropriate SQL dialect for the given database type.
fn get_dialect(db_type: DatabaseType) -> Box<dyn Dialect> {
    match db_type {
        DatabaseType::MySQL => Box::new(MySqlDialect {}),
        DatabaseType::SQLite => Box::new(SQLiteDialect {}),
    }
}

/// Count `?` placeholders, ignoring string literals, quoted identifiers and comments.
pub fn count_placeholders(sql: &str, db_type: DatabaseType) -> DbResult<usize> {
    let dialect = get_dialect(db_type);
    let tokens = Tokenizer::new(dialect.as_ref(), sql)
        .tokenize()
        .map_err(|e| DbError::invalid_input(format!("Failed to tokenize SQL statement: {e}")))?;

    Ok(tokens
        .iter()
        .filter(|token| matches!(token, Token::Placeholder(p) if p.starts_with('?')))
        .count())
}

/// Map portable `?` placeholders to the driver's native marker.
///
/// Both supported drivers use `?` natively, so the statement passes through
/// unchanged once the placeholder count has been checked against `arg_count`.
pub fn to_native(sql: &str, db_type: DatabaseType, arg_count: usize) -> DbResult<Cow<'_, str>> {
    let expected = count_placeholders(sql, db_type)?;
    if expected != arg_count {
        return Err(DbError::invalid_input(format!(
            "Statement has {expected} placeholder(s) but {arg_count} argument(s) were given"
        )));
    }

    match db_type {
        DatabaseType::MySQL | DatabaseType::SQLite => Ok(Cow::Borrowed(sql)),
    }
}

/// True when every statement in `sql` produces a result set.
///
/// A batch that mixes reads and writes is reported as not returning rows, so
/// it takes the write path and its transaction handling.
pub fn returns_rows(sql: &str, db_type: DatabaseType) -> DbResult<bool> {
    let dialect = get_dialect(db_type);
    let statements = Parser::parse_sql(dialect.as_ref(), sql)
        .map_err(|e| DbError::invalid_input(format!("Failed to parse SQL statement: {e}")))?;

    if statements.is_empty() {
        return Err(DbError::invalid_input("Empty SQL statement"));
    }

    Ok(statements.iter().all(statement_returns_rows))
}

fn statement_returns_rows(stmt: &Statement) -> bool {
    match stmt {
        Statement::Query(query) => set_expr_returns_rows(&query.body),
        Statement::Insert(insert) => insert.returning.is_some(),
        Statement::Delete(delete) => delete.returning.is_some(),

        Statement::ShowTables { .. }
        | Statement::ShowColumns { .. }
        | Statement::ShowDatabases { .. }
        | Statement::ShowSchemas { .. }
        | Statement::ShowCreate { .. }
        | Statement::ShowFunctions { .. }
        | Statement::ShowVariable { .. }
        | Statement::ShowVariables { .. }
        | Statement::ShowStatus { .. }
        | Statement::ShowCollation { .. }
        | Statement::ExplainTable { .. }
        | Statement::Explain { .. }
        | Statement::Pragma { .. } => true,

        _ => false,
    }
}

/// A `with ... insert` parses as a query whose body is the write.
fn set_expr_returns_rows(body: &SetExpr) -> bool {
    match body {
        SetExpr::Select(_)
        | SetExpr::Query(_)
        | SetExpr::SetOperation { .. }
        | SetExpr::Values(_)
        | SetExpr::Table(_) => true,
        SetExpr::Insert(stmt) | SetExpr::Update(stmt) => statement_returns_rows(stmt),
        _ => false,
    }
}
