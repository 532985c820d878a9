//! Process-wide schema registry.
//!
//! Each model type is built into a [`TableSchema`] on first use (or on an
//! explicit [`register`] call at startup) and cached for the rest of the
//! process. Failed declarations are not cached, so every later use reports
//! the same schema error.

use crate::error::DbResult;
use crate::orm::Model;
use crate::schema::table::TableSchema;
use std::any::TypeId;
use std::collections::HashMap;
use std::sync::{Arc, LazyLock, PoisonError, RwLock};
use tracing::debug;

type SchemaMap = HashMap<TypeId, Arc<TableSchema>>;

static REGISTRY: LazyLock<RwLock<SchemaMap>> = LazyLock::new(|| RwLock::new(HashMap::new()));

/// Build and cache the schema of `M`, or return the cached one.
pub fn register<M: Model>() -> DbResult<Arc<TableSchema>> {
    let type_id = TypeId::of::<M>();
    if let Some(schema) = lookup_id(type_id) {
        return Ok(schema);
    }

    let schema = Arc::new(M::declare().build()?);
    let mut registry = REGISTRY.write().unwrap_or_else(PoisonError::into_inner);
    let schema = registry.entry(type_id).or_insert(schema);
    debug!(
        model = %schema.model_name(),
        table = %schema.table_name(),
        "Registered model"
    );
    Ok(Arc::clone(schema))
}

/// Cached schema of `M`, if it has been registered.
pub fn lookup<M: Model>() -> Option<Arc<TableSchema>> {
    lookup_id(TypeId::of::<M>())
}

pub fn is_registered<M: Model>() -> bool {
    lookup::<M>().is_some()
}

fn lookup_id(type_id: TypeId) -> Option<Arc<TableSchema>> {
    REGISTRY
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(&type_id)
        .cloned()
}
