//! Schema Inference - Deterministic column typing for one batch of CSV text
//!
//! Each batch is typed on its own: a column is the narrowest of
//! `BigInt` → `Double` → `Boolean` → `Text` that accepts every non-missing
//! value in that batch. Configured date-time columns are always `Timestamp`.

use crate::error::{IngestError, Result};
use crate::ingestion::value::{self, CellValue};
use std::fmt;

/// Column type as created in the target table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColumnType {
    Boolean,
    BigInt,
    Double,
    Text,
    Timestamp,
}

impl ColumnType {
    pub fn sql_type(&self) -> &'static str {
        match self {
            ColumnType::Boolean => "BOOLEAN",
            ColumnType::BigInt => "BIGINT",
            ColumnType::Double => "DOUBLE PRECISION",
            ColumnType::Text => "TEXT",
            ColumnType::Timestamp => "TIMESTAMP WITHOUT TIME ZONE",
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.sql_type())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ColumnSpec {
    pub name: String,
    pub data_type: ColumnType,
}

/// Ordered column list of a batch, in source order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BatchSchema {
    pub columns: Vec<ColumnSpec>,
}

impl BatchSchema {
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }
}

pub struct SchemaInference;

impl SchemaInference {
    /// Infer the type of a non date-time column from its raw values.
    pub fn infer_column_type<'a, I>(values: I) -> ColumnType
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut all_int = true;
        let mut all_float = true;
        let mut all_bool = true;
        let mut seen = false;

        for raw in values {
            if value::is_missing(raw) {
                continue;
            }
            seen = true;
            if all_int && value::parse_int(raw).is_none() {
                all_int = false;
            }
            if all_float && value::parse_float(raw).is_none() {
                all_float = false;
            }
            if all_bool && value::parse_bool(raw).is_none() {
                all_bool = false;
            }
            if !all_int && !all_float && !all_bool {
                return ColumnType::Text;
            }
        }

        if !seen {
            ColumnType::Text
        } else if all_int {
            ColumnType::BigInt
        } else if all_float {
            ColumnType::Double
        } else if all_bool {
            ColumnType::Boolean
        } else {
            ColumnType::Text
        }
    }

    /// Convert one raw cell into the value of an already inferred column.
    pub fn coerce_cell(raw: &str, column: &ColumnSpec) -> Result<CellValue> {
        if value::is_missing(raw) {
            return Ok(CellValue::Null);
        }

        let coerced = match column.data_type {
            ColumnType::BigInt => value::parse_int(raw).map(CellValue::Int),
            ColumnType::Double => value::parse_float(raw).map(CellValue::Float),
            ColumnType::Boolean => value::parse_bool(raw).map(CellValue::Bool),
            ColumnType::Text => Some(CellValue::Text(raw.to_string())),
            ColumnType::Timestamp => value::parse_datetime(raw).map(CellValue::DateTime),
        };

        coerced.ok_or_else(|| {
            IngestError::SourceRead(format!(
                "value {:?} in column '{}' is not a valid {}",
                raw, column.name, column.data_type
            ))
        })
    }
}
