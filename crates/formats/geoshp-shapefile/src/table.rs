//! dBase attribute table layout.

use std::collections::HashMap;

use chrono::Datelike;
use geoshp_core_common::{Field, FieldKind, Record, RecordRef, Value};
use log::warn;
use shapefile::dbase::{self, FieldName, FieldValue, TableWriterBuilder};

use crate::error::{ShapefileResult, ShapefileWriteError};

/// Longest column name a dBase header can hold, in bytes.
pub const MAX_FIELD_NAME_LEN: usize = 10;

/// Widest dBase character column.
pub const MAX_CHARACTER_WIDTH: usize = 254;

const INTEGER_WIDTH: u8 = 18;
const FLOAT_WIDTH: u8 = 33;
const FLOAT_DECIMALS: u8 = 15;

/// Storage type of a dBase column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Character { width: u8 },
    Integer,
    Float,
    Logical,
    Date,
}

impl ColumnType {
    fn for_field(field: &Field, default_text_width: usize) -> ShapefileResult<Self> {
        Ok(match &field.kind {
            FieldKind::Text | FieldKind::Opaque(_) => {
                let width = field
                    .max_length
                    .unwrap_or(default_text_width)
                    .clamp(1, MAX_CHARACTER_WIDTH);
                Self::Character {
                    width: u8::try_from(width).unwrap_or(u8::MAX),
                }
            },
            FieldKind::Integer => Self::Integer,
            FieldKind::Float => Self::Float,
            FieldKind::Boolean => Self::Logical,
            FieldKind::Date => Self::Date,
            FieldKind::Geometry(_) => {
                return Err(ShapefileWriteError::UnsupportedLayout {
                    message: format!("'{}' is a second geometry field", field.name),
                });
            },
        })
    }

    fn name(self) -> &'static str {
        match self {
            Self::Character { .. } => "character",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Logical => "logical",
            Self::Date => "date",
        }
    }
}

/// One attribute column: the record field it reads and the dBase column it fills.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub source: String,
    pub name: String,
    pub column_type: ColumnType,
}

/// Columns of the attribute table, in schema order.
#[derive(Debug, Clone)]
pub struct TableLayout {
    columns: Vec<Column>,
    /// Columns whose values were already reported as truncated.
    truncation_reported: Vec<bool>,
}

impl TableLayout {
    /// Lays out `fields` (the schema minus its geometry field) as dBase columns.
    ///
    /// # Errors
    ///
    /// Fails on geometry-typed attributes and on names that collide once
    /// shortened to [`MAX_FIELD_NAME_LEN`] bytes.
    pub fn from_fields(fields: &[Field], default_text_width: usize) -> ShapefileResult<Self> {
        let mut columns = Vec::with_capacity(fields.len());
        let mut taken: HashMap<String, String> = HashMap::new();

        for field in fields {
            let name = truncate_name(&field.name);
            if let Some(first) = taken.insert(name.to_ascii_uppercase(), field.name.clone()) {
                return Err(ShapefileWriteError::FieldNameCollision {
                    first,
                    second: field.name.clone(),
                    column: name,
                });
            }
            if name != field.name {
                warn!(
                    "Field '{}' is stored as dBase column '{name}'",
                    field.name
                );
            }
            columns.push(Column {
                source: field.name.clone(),
                name,
                column_type: ColumnType::for_field(field, default_text_width)?,
            });
        }

        Ok(Self {
            truncation_reported: vec![false; columns.len()],
            columns,
        })
    }

    #[must_use]
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Builds the dBase header description for this layout.
    ///
    /// # Errors
    ///
    /// Fails if the dBase library rejects a column name.
    pub fn table_builder(&self) -> anyhow::Result<TableWriterBuilder> {
        let mut builder = TableWriterBuilder::new();
        for column in &self.columns {
            let name = FieldName::try_from(column.name.as_str()).map_err(|err| {
                anyhow::anyhow!("Invalid dBase column name '{}': {err:?}", column.name)
            })?;
            builder = match column.column_type {
                ColumnType::Character { width } => builder.add_character_field(name, width),
                ColumnType::Integer => builder.add_numeric_field(name, INTEGER_WIDTH, 0),
                ColumnType::Float => builder.add_numeric_field(name, FLOAT_WIDTH, FLOAT_DECIMALS),
                ColumnType::Logical => builder.add_logical_field(name),
                ColumnType::Date => builder.add_date_field(name),
            };
        }
        Ok(builder)
    }

    /// Converts the attribute values of `record` into a dBase row.
    ///
    /// Absent values are written as dBase nulls. Integers are stored as
    /// dBase numerics, which carry an `f64`.
    ///
    /// # Errors
    ///
    /// Fails when a value does not fit its column type.
    pub fn to_row(&mut self, record: &Record, record_ref: &RecordRef) -> ShapefileResult<dbase::Record> {
        let mut row = dbase::Record::default();
        for (idx, column) in self.columns.iter().enumerate() {
            let value = record.get(&column.source).unwrap_or(&Value::Null);
            let field_value = match (column.column_type, value) {
                (ColumnType::Character { .. }, Value::Null) => FieldValue::Character(None),
                (ColumnType::Character { width }, value) => {
                    let Some(text) = text_of(value) else {
                        return Err(type_error(record_ref, column, value));
                    };
                    let truncated = truncate_to_width(&text, usize::from(width));
                    if truncated.len() < text.len() && !self.truncation_reported[idx] {
                        warn!(
                            "Values of '{}' are truncated to {width} bytes, first at {record_ref}",
                            column.source
                        );
                        self.truncation_reported[idx] = true;
                    }
                    FieldValue::Character(Some(truncated.to_string()))
                },
                (ColumnType::Integer | ColumnType::Float, Value::Null) => FieldValue::Numeric(None),
                #[allow(clippy::cast_precision_loss)]
                (ColumnType::Integer | ColumnType::Float, Value::Integer(number)) => {
                    FieldValue::Numeric(Some(*number as f64))
                },
                (ColumnType::Float, Value::Float(number)) => FieldValue::Numeric(Some(*number)),
                (ColumnType::Logical, Value::Null) => FieldValue::Logical(None),
                (ColumnType::Logical, Value::Boolean(flag)) => FieldValue::Logical(Some(*flag)),
                (ColumnType::Date, Value::Null) => FieldValue::Date(None),
                (ColumnType::Date, Value::Date(date)) => FieldValue::Date(Some(dbase::Date::new(
                    date.day(),
                    date.month(),
                    u32::try_from(date.year()).map_err(|_| type_error(record_ref, column, value))?,
                ))),
                (_, value) => return Err(type_error(record_ref, column, value)),
            };
            row.insert(column.name.clone(), field_value);
        }
        Ok(row)
    }
}

fn text_of(value: &Value) -> Option<String> {
    match value {
        Value::Text(text) | Value::Opaque(text) => Some(text.clone()),
        Value::Integer(number) => Some(number.to_string()),
        Value::Float(number) => Some(number.to_string()),
        Value::Boolean(flag) => Some(flag.to_string()),
        Value::Date(date) => Some(date.format("%Y-%m-%d").to_string()),
        Value::Null | Value::Geometry(_) => None,
    }
}

fn type_error(record: &RecordRef, column: &Column, value: &Value) -> ShapefileWriteError {
    ShapefileWriteError::ValueType {
        record: record.clone(),
        field: column.source.clone(),
        expected: column.column_type.name(),
        found: value.kind_name(),
    }
}

/// Shortens `name` to [`MAX_FIELD_NAME_LEN`] bytes on a character boundary.
#[must_use]
pub fn truncate_name(name: &str) -> String {
    truncate_to_width(name, MAX_FIELD_NAME_LEN).to_string()
}

fn truncate_to_width(text: &str, width: usize) -> &str {
    if text.len() <= width {
        return text;
    }
    let mut end = width;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}
