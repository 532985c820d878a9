//! tablemap Library
//!
//! A lightweight table mapper for MySQL and SQLite: models declare typed
//! fields, the schema registry derives the select/insert/update/delete
//! statements once per model type, and every model operation runs through a
//! pooled query executor.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod orm;
pub mod schema;

pub use config::{Config, PoolConfig, RowCountPolicy};
pub use db::{ConnectionPool, QueryExecutor};
pub use error::{DbError, DbResult};
pub use models::{FindOptions, Limit, Row, Value};
pub use orm::{Model, ModelOps, Record};
pub use schema::{Field, FieldDefault, ModelDecl, TableSchema};
