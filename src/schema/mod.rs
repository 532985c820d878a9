//! Model schemas.
//!
//! This module turns model declarations into table metadata:
//! - Field descriptors for the supported column kinds
//! - Declaration validation and statement generation
//! - The process-wide registry of built schemas

pub mod field;
pub mod registry;
pub mod table;

pub use field::{Field, FieldDefault, FieldKind};
pub use registry::register;
pub use table::{ModelDecl, TableSchema};
