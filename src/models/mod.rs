//! Data types shared across tablemap.
//!
//! This module re-exports the value and request types used throughout the crate.

pub mod query;
pub mod value;

// Re-export commonly used types
pub use query::{FindOptions, Limit};
pub use value::{Row, Value};
