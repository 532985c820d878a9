//! Database dispatch macros for reducing code duplication.
//!
//! This module provides declarative macros that generate database-specific
//! match arms while maintaining linear readability. The macros expand at
//! compile time with zero runtime overhead.

/// Macro for generating backend dispatch match arms.
///
/// Matches any of the per-backend enums in [`crate::db::pool`] (`DbPool`,
/// `PooledConnection`), binding the inner value of each variant.
///
/// # Example
///
/// ```ignore
/// impl_db_dispatch!(DbPool, &pool, {
///     MySql(p) => do_mysql(p),
///     SQLite(p) => do_sqlite(p),
/// });
/// ```
#[macro_export]
macro_rules! impl_db_dispatch {
    ($kind:ident, $value:expr, { $($variant:ident($p:ident) => $body:expr),+ $(,)? }) => {
        match $value {
            $(
                $crate::db::pool::$kind::$variant($p) => $body,
            )+
        }
    };
}

pub use impl_db_dispatch;
