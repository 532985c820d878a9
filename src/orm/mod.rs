//! Model instances and their database operations.
//!
//! A model is any type implementing [`Model`]: it declares its table through
//! [`Model::declare`] and stores its attributes in a [`Record`]. Every model
//! gets the finders and mutators of [`ModelOps`].
//!
//! ```ignore
//! struct Account {
//!     record: Record,
//! }
//!
//! impl Model for Account {
//!     fn declare() -> ModelDecl {
//!         ModelDecl::new("Account")
//!             .table("accounts")
//!             .field("id", Field::integer().primary_key())
//!             .field("name", Field::string())
//!             .field("balance", Field::float())
//!     }
//!     fn from_record(record: Record) -> Self { Self { record } }
//!     fn record(&self) -> &Record { &self.record }
//!     fn record_mut(&mut self) -> &mut Record { &mut self.record }
//! }
//!
//! let mut account = Account::create([("id", Value::from(1)), ("name", Value::from("a"))])?;
//! account.save(&executor).await?;
//! let found = Account::find(&executor, 1).await?;
//! ```

pub mod record;

pub use record::Record;

use crate::db::QueryExecutor;
use crate::db::sql::quote_ident;
use crate::error::{DbError, DbResult};
use crate::models::{FindOptions, Value};
use crate::schema::{ModelDecl, TableSchema, registry};
use std::future::Future;
use std::sync::Arc;

/// A type mapped to a table.
pub trait Model: Send + Sync + Sized + 'static {
    /// Table name and attributes of this model.
    fn declare() -> ModelDecl;

    fn from_record(record: Record) -> Self;

    fn record(&self) -> &Record;

    fn record_mut(&mut self) -> &mut Record;
}

/// Finders and mutators available on every [`Model`].
pub trait ModelOps: Model {
    /// Registered schema, building it on first use.
    fn schema() -> DbResult<Arc<TableSchema>> {
        registry::register::<Self>()
    }

    /// New, unsaved instance. Attributes the model does not declare are rejected.
    fn create<I, K, V>(values: I) -> DbResult<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let schema = Self::schema()?;
        let record: Record = values.into_iter().collect();
        if let Some((attribute, _)) = record.iter().find(|(a, _)| schema.field(a).is_none()) {
            return Err(DbError::invalid_input(format!(
                "{} has no attribute '{}'",
                schema.model_name(),
                attribute
            )));
        }
        Ok(Self::from_record(record))
    }

    fn get(&self, attribute: &str) -> Option<&Value> {
        self.record().get(attribute)
    }

    /// Value of `attribute`, `Null` when unset.
    fn value(&self, attribute: &str) -> Value {
        self.record().value(attribute)
    }

    fn set(&mut self, attribute: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.record_mut().set(attribute, value)
    }

    /// Rows matching `options`, as instances.
    fn find_all(
        executor: &QueryExecutor,
        options: FindOptions,
    ) -> impl Future<Output = DbResult<Vec<Self>>> + Send {
        async move {
            let schema = Self::schema()?;
            let (sql, args) = options.to_sql(schema.select_sql())?;
            let rows = executor.select(&sql, &args, None).await?;
            Ok(rows
                .into_iter()
                .map(|row| Self::from_record(schema.record_from_row(row)))
                .collect())
        }
    }

    /// Single aggregate over the table, e.g. `count(id)`.
    ///
    /// Returns `None` when the query yields no row or a NULL, as `max` does
    /// over an empty table.
    fn find_number(
        executor: &QueryExecutor,
        select_expr: &str,
        filter: Option<&str>,
        args: &[Value],
    ) -> impl Future<Output = DbResult<Option<Value>>> + Send {
        async move {
            let schema = Self::schema()?;
            let mut sql = format!(
                "select {} _num_ from {}",
                select_expr,
                quote_ident(schema.table_name())
            );
            if let Some(filter) = filter.filter(|f| !f.trim().is_empty()) {
                sql.push_str(" where ");
                sql.push_str(filter);
            }
            let rows = executor.select(&sql, args, Some(1)).await?;
            Ok(rows
                .into_iter()
                .next()
                .and_then(|mut row| row.remove("_num_"))
                .filter(|value| !value.is_null()))
        }
    }

    /// Instance with primary key `pk`.
    fn find(
        executor: &QueryExecutor,
        pk: impl Into<Value>,
    ) -> impl Future<Output = DbResult<Option<Self>>> + Send {
        let pk = pk.into();
        async move {
            let schema = Self::schema()?;
            let rows = executor.select(&schema.find_sql(), &[pk], Some(1)).await?;
            Ok(rows
                .into_iter()
                .next()
                .map(|row| Self::from_record(schema.record_from_row(row))))
        }
    }

    /// Insert this instance; unset attributes take their field default.
    ///
    /// Returns the affected row count.
    fn save(&mut self, executor: &QueryExecutor) -> impl Future<Output = DbResult<u64>> + Send {
        async move {
            let schema = Self::schema()?;
            let mut args = Vec::with_capacity(schema.fields().len() + 1);
            for attribute in schema.argument_order() {
                let field = schema.field(attribute).ok_or_else(|| {
                    DbError::internal(format!("No field registered for '{attribute}'"))
                })?;
                args.push(self.record_mut().value_or_default(attribute, field));
            }
            let rows = executor.execute(schema.insert_sql(), &args).await?;
            executor.check_row_count("insert", rows)
        }
    }

    /// Write the current non-key values to the row with this primary key.
    ///
    /// Unset attributes are written as `NULL`.
    fn update(&self, executor: &QueryExecutor) -> impl Future<Output = DbResult<u64>> + Send {
        async move {
            let schema = Self::schema()?;
            let args: Vec<Value> = schema
                .argument_order()
                .map(|attribute| self.value(attribute))
                .collect();
            let rows = executor.execute(schema.update_sql(), &args).await?;
            executor.check_row_count("update", rows)
        }
    }

    /// Delete the row with this primary key.
    fn remove(&self, executor: &QueryExecutor) -> impl Future<Output = DbResult<u64>> + Send {
        async move {
            let schema = Self::schema()?;
            let args = [self.value(schema.primary_key())];
            let rows = executor.execute(schema.delete_sql(), &args).await?;
            executor.check_row_count("remove", rows)
        }
    }
}

impl<M: Model> ModelOps for M {}
