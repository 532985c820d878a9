//! Database access layer.
//!
//! This module provides database access functionality:
//! - Connection pool management
//! - Query execution with optional explicit transactions
//! - Placeholder and identifier helpers
//! - Type mappings
//! - Database dispatch macros for reducing code duplication

pub mod executor;
#[macro_use]
pub mod macros;
pub mod params;
pub mod pool;
pub mod sql;
pub mod types;

pub use executor::QueryExecutor;
pub use pool::{ConnectionPool, DbPool, PooledConnection};
