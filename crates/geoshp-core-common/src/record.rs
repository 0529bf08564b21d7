//! Feature records.

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use geo_types::Geometry;

/// A typed attribute value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Geometry(Geometry<f64>),
    Text(String),
    Integer(i64),
    Float(f64),
    Date(NaiveDate),
    Boolean(bool),
    Opaque(String),
}

impl Value {
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Short name of the value's kind, for error messages.
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Geometry(_) => "geometry",
            Self::Text(_) => "text",
            Self::Integer(_) => "integer",
            Self::Float(_) => "float",
            Self::Date(_) => "date",
            Self::Boolean(_) => "boolean",
            Self::Opaque(_) => "opaque",
        }
    }
}

impl From<Geometry<f64>> for Value {
    fn from(value: Geometry<f64>) -> Self {
        Self::Geometry(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<NaiveDate> for Value {
    fn from(value: NaiveDate) -> Self {
        Self::Date(value)
    }
}

/// One feature: an optional identifier plus a value per field name.
///
/// Records are assembled with [`Record::with_value`] and are read-only
/// afterwards; transformations build new records.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    id: Option<String>,
    values: BTreeMap<String, Value>,
}

impl Record {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    #[must_use]
    pub fn with_value(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }

    /// Reassembles a record from parts produced by [`Record::into_parts`].
    #[must_use]
    pub fn from_parts(id: Option<String>, values: BTreeMap<String, Value>) -> Self {
        Self { id, values }
    }

    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(name, value)| (name.as_str(), value))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[must_use]
    pub fn into_parts(self) -> (Option<String>, BTreeMap<String, Value>) {
        (self.id, self.values)
    }
}

/// Identifies a record in error reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordRef {
    /// The record's own identifier.
    Id(String),
    /// 0-based position in the input sequence.
    Position(usize),
}

impl RecordRef {
    /// Prefers the record's identifier, falling back to its position.
    #[must_use]
    pub fn for_record(id: Option<&str>, position: usize) -> Self {
        id.map_or(Self::Position(position), |id| Self::Id(id.to_string()))
    }
}

impl fmt::Display for RecordRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "feature '{id}'"),
            Self::Position(position) => write!(f, "record #{position}"),
        }
    }
}
