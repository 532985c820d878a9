//! Field descriptors.
//!
//! A [`Field`] describes one column of a model: its logical kind, SQL type,
//! primary-key flag, optional column-name override and optional default.

use crate::models::Value;
use std::fmt;
use std::sync::Arc;

/// Logical column kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    String,
    Boolean,
    Integer,
    Float,
    Text,
}

impl FieldKind {
    /// Name used in diagnostics, e.g. `StringField`.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::String => "StringField",
            Self::Boolean => "BooleanField",
            Self::Integer => "IntegerField",
            Self::Float => "FloatField",
            Self::Text => "TextField",
        }
    }

    pub fn default_sql_type(&self) -> &'static str {
        match self {
            Self::String => "varchar(100)",
            Self::Boolean => "boolean",
            Self::Integer => "bigint",
            Self::Float => "real",
            Self::Text => "text",
        }
    }

    /// Boolean and text columns never serve as keys.
    pub fn can_be_primary_key(&self) -> bool {
        matches!(self, Self::String | Self::Integer | Self::Float)
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

/// Default used when a value is absent at save time.
#[derive(Clone)]
pub enum FieldDefault {
    Fixed(Value),
    /// Invoked at most once per instance; the result is cached on the instance.
    Computed(Arc<dyn Fn() -> Value + Send + Sync>),
}

impl FieldDefault {
    pub fn resolve(&self) -> Value {
        match self {
            Self::Fixed(value) => value.clone(),
            Self::Computed(f) => f(),
        }
    }
}

impl fmt::Debug for FieldDefault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed(value) => f.debug_tuple("Fixed").field(value).finish(),
            Self::Computed(_) => f.write_str("Computed(..)"),
        }
    }
}

/// One column of a model.
#[derive(Debug, Clone)]
pub struct Field {
    kind: FieldKind,
    name: Option<String>,
    sql_type: String,
    primary_key: bool,
    default: Option<FieldDefault>,
}

impl Field {
    fn of_kind(kind: FieldKind) -> Self {
        Self {
            kind,
            name: None,
            sql_type: kind.default_sql_type().to_string(),
            primary_key: false,
            default: None,
        }
    }

    /// `varchar(100)` column; see [`Field::ddl`] for other lengths.
    pub fn string() -> Self {
        Self::of_kind(FieldKind::String)
    }

    pub fn boolean() -> Self {
        Self::of_kind(FieldKind::Boolean)
    }

    /// `bigint` column defaulting to 0.
    pub fn integer() -> Self {
        Self::of_kind(FieldKind::Integer).default_value(0i64)
    }

    /// `real` column defaulting to 0.0.
    pub fn float() -> Self {
        Self::of_kind(FieldKind::Float).default_value(0.0)
    }

    pub fn text() -> Self {
        Self::of_kind(FieldKind::Text)
    }

    /// Column name, when it differs from the attribute name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Override the column type, e.g. `varchar(50)`.
    pub fn ddl(mut self, sql_type: impl Into<String>) -> Self {
        self.sql_type = sql_type.into();
        self
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(FieldDefault::Fixed(value.into()));
        self
    }

    pub fn default_with<F>(mut self, f: F) -> Self
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        self.default = Some(FieldDefault::Computed(Arc::new(f)));
        self
    }

    /// Remove any default, including the built-in one of integer and float fields.
    pub fn no_default(mut self) -> Self {
        self.default = None;
        self
    }

    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    pub fn column_name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn sql_type(&self) -> &str {
        &self.sql_type
    }

    pub fn is_primary_key(&self) -> bool {
        self.primary_key
    }

    pub fn default(&self) -> Option<&FieldDefault> {
        self.default.as_ref()
    }

    pub(crate) fn set_column_name(&mut self, name: String) {
        self.name = Some(name);
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<{}, {}:{}>",
            self.kind,
            self.sql_type,
            self.name.as_deref().unwrap_or_default()
        )
    }
}
