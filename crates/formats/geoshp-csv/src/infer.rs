//! Column type inference and cell conversion.

use chrono::NaiveDate;
use geoshp_core_common::{FieldKind, Value};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Type inferred for a CSV column from its sampled cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ColumnType {
    Null,
    Integer,
    Float,
    Boolean,
    Date,
    Text,
}

impl ColumnType {
    fn of(cell: &str) -> Self {
        if cell.is_empty() {
            Self::Null
        } else if cell.parse::<i64>().is_ok() {
            Self::Integer
        } else if parse_float(cell).is_some() {
            Self::Float
        } else if parse_bool(cell).is_some() {
            Self::Boolean
        } else if NaiveDate::parse_from_str(cell, DATE_FORMAT).is_ok() {
            Self::Date
        } else {
            Self::Text
        }
    }

    fn widen(self, other: Self) -> Self {
        match (self, other) {
            (Self::Null, other) | (other, Self::Null) => other,
            (a, b) if a == b => a,
            (Self::Integer, Self::Float) | (Self::Float, Self::Integer) => Self::Float,
            _ => Self::Text,
        }
    }

    pub(crate) fn to_kind(self) -> FieldKind {
        match self {
            Self::Null | Self::Text => FieldKind::Text,
            Self::Integer => FieldKind::Integer,
            Self::Float => FieldKind::Float,
            Self::Boolean => FieldKind::Boolean,
            Self::Date => FieldKind::Date,
        }
    }
}

/// Running inference state for one column.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ColumnStats {
    pub column_type: ColumnType,
    /// Longest non-empty cell, in UTF-8 bytes.
    pub max_length: usize,
}

impl Default for ColumnStats {
    fn default() -> Self {
        Self {
            column_type: ColumnType::Null,
            max_length: 0,
        }
    }
}

impl ColumnStats {
    pub(crate) fn observe(&mut self, cell: &str) {
        self.column_type = self.column_type.widen(ColumnType::of(cell));
        self.max_length = self.max_length.max(cell.len());
    }
}

/// Finite floats only; words like `NaN` or `inf` are text.
fn parse_float(cell: &str) -> Option<f64> {
    cell.parse::<f64>().ok().filter(|value| value.is_finite())
}

fn parse_bool(cell: &str) -> Option<bool> {
    if cell.eq_ignore_ascii_case("true") {
        Some(true)
    } else if cell.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

/// Converts a cell to a value of `kind`.
///
/// Returns a description of the problem when the cell does not parse.
pub(crate) fn convert_cell(cell: &str, kind: &FieldKind) -> Result<Value, String> {
    if cell.is_empty() {
        return Ok(Value::Null);
    }
    match kind {
        FieldKind::Integer => cell
            .parse::<i64>()
            .map(Value::Integer)
            .map_err(|err| format!("'{cell}' is not an integer: {err}")),
        FieldKind::Float => parse_float(cell)
            .map(Value::Float)
            .ok_or_else(|| format!("'{cell}' is not a finite number")),
        FieldKind::Boolean => parse_bool(cell)
            .map(Value::Boolean)
            .ok_or_else(|| format!("'{cell}' is not a boolean")),
        FieldKind::Date => NaiveDate::parse_from_str(cell, DATE_FORMAT)
            .map(Value::Date)
            .map_err(|err| format!("'{cell}' is not a {DATE_FORMAT} date: {err}")),
        _ => Ok(Value::Text(cell.to_string())),
    }
}
