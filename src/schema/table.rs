//! Model declarations and the table schemas derived from them.
//!
//! A [`ModelDecl`] is the ordered list of attributes a model declares. Building
//! it validates the declaration and precomputes the four statements every
//! model needs:
//!
//! ```text
//! select `id`, `name`,`balance` from `accounts`
//! insert into `accounts` (`name`,`balance`, `id`) values (?, ?, ?)
//! update `accounts` set `name`=?,`balance`=? where `id`=?
//! delete from `accounts` where `id`=?
//! ```

use crate::db::sql::{placeholders, quote_ident};
use crate::error::{DbError, DbResult};
use crate::models::Row;
use crate::orm::Record;
use crate::schema::field::Field;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info};

/// Declaration of a model's table and attributes.
#[derive(Debug, Clone)]
pub struct ModelDecl {
    model: String,
    table: Option<String>,
    fields: Vec<(String, Field)>,
}

impl ModelDecl {
    /// Start a declaration for the model called `model`.
    ///
    /// The table name defaults to the model name.
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            table: None,
            fields: Vec::new(),
        }
    }

    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    /// Declare an attribute. Declaration order is column order.
    pub fn field(mut self, attribute: impl Into<String>, field: Field) -> Self {
        self.fields.push((attribute.into(), field));
        self
    }

    pub fn model_name(&self) -> &str {
        &self.model
    }

    /// Validate the declaration and generate the table schema.
    pub fn build(self) -> DbResult<TableSchema> {
        let model = self.model;
        let table_name = self
            .table
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| model.clone());
        info!("found model: {} (table: {})", model, table_name);

        let mut mappings = BTreeMap::new();
        let mut columns = HashMap::new();
        let mut fields = Vec::new();
        let mut primary_key: Option<String> = None;

        for (attribute, mut field) in self.fields {
            if field.sql_type().trim().is_empty() {
                return Err(DbError::schema(
                    format!("Empty SQL type for field: {attribute}"),
                    &model,
                ));
            }
            if mappings.contains_key(&attribute) {
                return Err(DbError::schema(
                    format!("Duplicate attribute: {attribute}"),
                    &model,
                ));
            }

            let column = field
                .column_name()
                .filter(|c| !c.is_empty())
                .unwrap_or(attribute.as_str())
                .to_string();
            if let Some(other) = columns.get(&column) {
                return Err(DbError::schema(
                    format!("Column `{column}` is mapped by both {other} and {attribute}"),
                    &model,
                ));
            }
            field.set_column_name(column.clone());
            debug!("  found mappings: {} ==> {}", attribute, field);

            if field.is_primary_key() {
                if !field.kind().can_be_primary_key() {
                    return Err(DbError::schema(
                        format!("{} cannot be a primary key: {attribute}", field.kind()),
                        &model,
                    ));
                }
                if primary_key.is_some() {
                    return Err(DbError::schema(
                        format!("Duplicate primary key for field: {attribute}"),
                        &model,
                    ));
                }
                primary_key = Some(attribute.clone());
            } else {
                fields.push(attribute.clone());
            }

            columns.insert(column, attribute.clone());
            mappings.insert(attribute, field);
        }

        let Some(primary_key) = primary_key else {
            return Err(DbError::schema("Primary key not found.", &model));
        };

        let mut schema = TableSchema {
            model,
            table_name,
            primary_key,
            fields,
            mappings,
            columns,
            select_sql: String::new(),
            insert_sql: String::new(),
            update_sql: String::new(),
            delete_sql: String::new(),
        };
        schema.generate_statements();
        Ok(schema)
    }
}

/// Immutable table metadata of a registered model.
#[derive(Debug)]
pub struct TableSchema {
    model: String,
    table_name: String,
    primary_key: String,
    fields: Vec<String>,
    mappings: BTreeMap<String, Field>,
    /// column name -> attribute name
    columns: HashMap<String, String>,
    select_sql: String,
    insert_sql: String,
    update_sql: String,
    delete_sql: String,
}

impl TableSchema {
    fn generate_statements(&mut self) {
        let table = quote_ident(&self.table_name);
        let key = quote_ident(self.column_of(&self.primary_key));
        let escaped: Vec<String> = self
            .fields
            .iter()
            .map(|attr| quote_ident(self.column_of(attr)))
            .collect();

        if escaped.is_empty() {
            self.select_sql = format!("select {key} from {table}");
            self.insert_sql = format!("insert into {table} ({key}) values (?)");
            self.update_sql = format!("update {table} set {key}={key} where {key}=?");
        } else {
            self.select_sql = format!("select {key}, {} from {table}", escaped.join(","));
            self.insert_sql = format!(
                "insert into {table} ({}, {key}) values ({})",
                escaped.join(","),
                placeholders(escaped.len() + 1)
            );
            let assignments: Vec<String> = escaped.iter().map(|c| format!("{c}=?")).collect();
            self.update_sql = format!(
                "update {table} set {} where {key}=?",
                assignments.join(",")
            );
        }
        self.delete_sql = format!("delete from {table} where {key}=?");
    }

    fn column_of<'a>(&'a self, attribute: &'a str) -> &'a str {
        self.mappings
            .get(attribute)
            .and_then(Field::column_name)
            .unwrap_or(attribute)
    }

    pub fn model_name(&self) -> &str {
        &self.model
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// Attribute name of the primary key.
    pub fn primary_key(&self) -> &str {
        &self.primary_key
    }

    /// Non-key attribute names in declaration order.
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Every declared attribute with its field.
    pub fn mappings(&self) -> &BTreeMap<String, Field> {
        &self.mappings
    }

    pub fn field(&self, attribute: &str) -> Option<&Field> {
        self.mappings.get(attribute)
    }

    /// Column backing `attribute`.
    pub fn column_name(&self, attribute: &str) -> Option<&str> {
        self.field(attribute).and_then(Field::column_name)
    }

    /// Attribute backed by `column`.
    pub fn attribute_for_column(&self, column: &str) -> Option<&str> {
        self.columns.get(column).map(String::as_str)
    }

    /// Attributes in insert/update argument order: non-key fields, then the key.
    pub fn argument_order(&self) -> impl Iterator<Item = &str> {
        self.fields
            .iter()
            .map(String::as_str)
            .chain(std::iter::once(self.primary_key.as_str()))
    }

    pub fn select_sql(&self) -> &str {
        &self.select_sql
    }

    pub fn insert_sql(&self) -> &str {
        &self.insert_sql
    }

    pub fn update_sql(&self) -> &str {
        &self.update_sql
    }

    pub fn delete_sql(&self) -> &str {
        &self.delete_sql
    }

    /// `<select> where `pk`=?`
    pub fn find_sql(&self) -> String {
        format!(
            "{} where {}=?",
            self.select_sql,
            quote_ident(self.column_of(&self.primary_key))
        )
    }

    /// `create table` statement built from the declared column types.
    pub fn create_table_sql(&self) -> String {
        let mut columns = Vec::with_capacity(self.mappings.len());
        for attr in std::iter::once(&self.primary_key).chain(&self.fields) {
            let Some(field) = self.mappings.get(attr) else {
                continue;
            };
            let mut column = format!("{} {}", quote_ident(self.column_of(attr)), field.sql_type());
            if *attr == self.primary_key {
                column.push_str(" not null primary key");
            }
            columns.push(column);
        }
        format!(
            "create table {} ({})",
            quote_ident(&self.table_name),
            columns.join(", ")
        )
    }

    /// Rename the columns of a fetched row to attribute names.
    ///
    /// Columns the model does not map keep their name.
    pub fn record_from_row(&self, row: Row) -> Record {
        row.into_iter()
            .map(|(column, value)| {
                let attribute = self
                    .attribute_for_column(&column)
                    .map(str::to_string)
                    .unwrap_or(column);
                (attribute, value)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Value;

    fn account() -> ModelDecl {
        ModelDecl::new("Account")
            .table("accounts")
            .field("id", Field::integer().primary_key())
            .field("name", Field::string())
            .field("balance", Field::float())
    }

    #[test]
    fn test_templates() {
        let schema = account().build().unwrap();
        assert_eq!(schema.table_name(), "accounts");
        assert_eq!(schema.primary_key(), "id");
        assert_eq!(schema.fields(), ["name", "balance"]);
        assert_eq!(
            schema.select_sql(),
            "select `id`, `name`,`balance` from `accounts`"
        );
        assert_eq!(
            schema.insert_sql(),
            "insert into `accounts` (`name`,`balance`, `id`) values (?, ?, ?)"
        );
        assert_eq!(
            schema.update_sql(),
            "update `accounts` set `name`=?,`balance`=? where `id`=?"
        );
        assert_eq!(schema.delete_sql(), "delete from `accounts` where `id`=?");
        assert_eq!(
            schema.find_sql(),
            "select `id`, `name`,`balance` from `accounts` where `id`=?"
        );
    }

    #[test]
    fn test_table_defaults_to_model_name() {
        let schema = ModelDecl::new("User")
            .field("id", Field::string().primary_key())
            .build()
            .unwrap();
        assert_eq!(schema.table_name(), "User");
        assert_eq!(schema.model_name(), "User");
    }

    #[test]
    fn test_key_only_model() {
        let schema = ModelDecl::new("Tag")
            .field("label", Field::string().primary_key())
            .build()
            .unwrap();
        assert!(schema.fields().is_empty());
        assert_eq!(schema.select_sql(), "select `label` from `Tag`");
        assert_eq!(schema.insert_sql(), "insert into `Tag` (`label`) values (?)");
        assert_eq!(
            schema.update_sql(),
            "update `Tag` set `label`=`label` where `label`=?"
        );
    }

    #[test]
    fn test_column_override_used_everywhere() {
        let schema = ModelDecl::new("User")
            .table("users")
            .field("id", Field::string().name("user_id").primary_key())
            .field("email", Field::string().name("email_address"))
            .build()
            .unwrap();
        assert_eq!(
            schema.select_sql(),
            "select `user_id`, `email_address` from `users`"
        );
        assert_eq!(
            schema.update_sql(),
            "update `users` set `email_address`=? where `user_id`=?"
        );
        assert_eq!(schema.column_name("email"), Some("email_address"));
        assert_eq!(schema.attribute_for_column("user_id"), Some("id"));

        let mut row = Row::new();
        row.insert("user_id".to_string(), Value::from("u1"));
        row.insert("email_address".to_string(), Value::from("a@b.c"));
        row.insert("_num_".to_string(), Value::Int(3));
        let record = schema.record_from_row(row);
        assert_eq!(record.get("id"), Some(&Value::from("u1")));
        assert_eq!(record.get("email"), Some(&Value::from("a@b.c")));
        assert_eq!(record.get("_num_"), Some(&Value::Int(3)));
    }

    #[test]
    fn test_registered_fields_carry_column_names() {
        let schema = account().build().unwrap();
        let field = schema.field("name").unwrap();
        assert_eq!(field.to_string(), "<StringField, varchar(100):name>");
    }

    #[test]
    fn test_missing_primary_key() {
        let err = ModelDecl::new("NoKey")
            .field("name", Field::string())
            .build()
            .unwrap_err();
        assert!(err.is_schema());
        assert!(err.to_string().contains("Primary key not found."));
    }

    #[test]
    fn test_duplicate_primary_key() {
        let err = ModelDecl::new("TwoKeys")
            .field("id", Field::integer().primary_key())
            .field("code", Field::string().primary_key())
            .build()
            .unwrap_err();
        assert!(err.is_schema());
        assert!(err.to_string().contains("Duplicate primary key for field: code"));
    }

    #[test]
    fn test_unkeyable_kinds_rejected() {
        for field in [Field::boolean(), Field::text()] {
            let err = ModelDecl::new("Flag")
                .field("flag", field.primary_key())
                .build()
                .unwrap_err();
            assert!(err.is_schema());
        }
    }

    #[test]
    fn test_empty_sql_type_rejected() {
        let err = ModelDecl::new("Blank")
            .field("id", Field::string().ddl(" ").primary_key())
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("Empty SQL type"));
    }

    #[test]
    fn test_duplicate_attribute_and_column_rejected() {
        let err = ModelDecl::new("Dup")
            .field("id", Field::integer().primary_key())
            .field("name", Field::string())
            .field("name", Field::text())
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("Duplicate attribute: name"));

        let err = ModelDecl::new("Dup")
            .field("id", Field::integer().primary_key())
            .field("name", Field::string())
            .field("alias", Field::string().name("name"))
            .build()
            .unwrap_err();
        assert!(err.is_schema());
    }

    #[test]
    fn test_create_table_sql() {
        let schema = account().build().unwrap();
        assert_eq!(
            schema.create_table_sql(),
            "create table `accounts` (`id` bigint not null primary key, `name` varchar(100), `balance` real)"
        );
    }

    #[test]
    fn test_argument_order() {
        let schema = account().build().unwrap();
        let order: Vec<&str> = schema.argument_order().collect();
        assert_eq!(order, ["name", "balance", "id"]);
    }
}
