use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use indexmap::IndexMap;
use rust_decimal::{prelude::ToPrimitive, Decimal};
use serde::Serialize;
use sqlx::{
    postgres::{types::Oid, PgHasArrayType, PgRow},
    Column, Postgres, Row, TypeInfo, ValueRef,
};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// A single column value, tagged by the JSON shape it serializes to.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ColumnValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Timestamp(DateTime<Utc>),
    Json(serde_json::Value),
    Bytes(Vec<u8>),
    Array(Vec<ColumnValue>),
}

impl From<&str> for ColumnValue {
    fn from(value: &str) -> Self {
        ColumnValue::Text(value.to_string())
    }
}

impl From<i64> for ColumnValue {
    fn from(value: i64) -> Self {
        ColumnValue::Int(value)
    }
}

impl From<f64> for ColumnValue {
    fn from(value: f64) -> Self {
        ColumnValue::Float(value)
    }
}

impl From<bool> for ColumnValue {
    fn from(value: bool) -> Self {
        ColumnValue::Bool(value)
    }
}

/// One row of `products`, keyed by column name in the order the database
/// returned the columns. The shape belongs to the table, not to this service.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ProductRow(IndexMap<String, ColumnValue>);

impl ProductRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, column: impl Into<String>, value: ColumnValue) {
        self.0.insert(column.into(), value);
    }

    pub fn from_pg_row(row: &PgRow) -> AppResult<Self> {
        let mut out = ProductRow::new();
        for (idx, column) in row.columns().iter().enumerate() {
            let value = decode_column(row, idx, column.type_info().name())?;
            out.insert(column.name(), value);
        }
        Ok(out)
    }
}

impl<K: Into<String>> FromIterator<(K, ColumnValue)> for ProductRow {
    fn from_iter<I: IntoIterator<Item = (K, ColumnValue)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

fn decode_column(row: &PgRow, idx: usize, type_name: &str) -> AppResult<ColumnValue> {
    let raw = row.try_get_raw(idx).map_err(decode_error)?;
    if raw.is_null() {
        return Ok(ColumnValue::Null);
    }

    let value = match type_name {
        "BOOL" => ColumnValue::Bool(get::<bool>(row, idx)?),
        "INT2" => ColumnValue::Int(get::<i16>(row, idx)?.into()),
        "INT4" => ColumnValue::Int(get::<i32>(row, idx)?.into()),
        "INT8" => ColumnValue::Int(get::<i64>(row, idx)?),
        "OID" => ColumnValue::Int(get::<Oid>(row, idx)?.0.into()),
        "FLOAT4" => ColumnValue::Float(get::<f32>(row, idx)?.into()),
        "FLOAT8" => ColumnValue::Float(get::<f64>(row, idx)?),
        "NUMERIC" => numeric(get::<Decimal>(row, idx)?)?,
        "TEXT" | "VARCHAR" | "CHAR" | "BPCHAR" | "NAME" => ColumnValue::Text(get::<String>(row, idx)?),
        "UUID" => ColumnValue::Text(get::<Uuid>(row, idx)?.to_string()),
        "TIMESTAMPTZ" => ColumnValue::Timestamp(get::<DateTime<Utc>>(row, idx)?),
        "TIMESTAMP" => ColumnValue::Text(
            get::<NaiveDateTime>(row, idx)?
                .format("%Y-%m-%dT%H:%M:%S%.f")
                .to_string(),
        ),
        "DATE" => ColumnValue::Text(get::<NaiveDate>(row, idx)?.to_string()),
        "TIME" => ColumnValue::Text(get::<NaiveTime>(row, idx)?.to_string()),
        "JSON" | "JSONB" => ColumnValue::Json(get::<serde_json::Value>(row, idx)?),
        "BYTEA" => ColumnValue::Bytes(get::<Vec<u8>>(row, idx)?),

        "BOOL[]" => array::<bool>(row, idx, |v| Ok(ColumnValue::Bool(v)))?,
        "INT2[]" => array::<i16>(row, idx, |v| Ok(ColumnValue::Int(v.into())))?,
        "INT4[]" => array::<i32>(row, idx, |v| Ok(ColumnValue::Int(v.into())))?,
        "INT8[]" => array::<i64>(row, idx, |v| Ok(ColumnValue::Int(v)))?,
        "FLOAT4[]" => array::<f32>(row, idx, |v| Ok(ColumnValue::Float(v.into())))?,
        "FLOAT8[]" => array::<f64>(row, idx, |v| Ok(ColumnValue::Float(v)))?,
        "NUMERIC[]" => array::<Decimal>(row, idx, numeric)?,
        "TEXT[]" | "VARCHAR[]" | "CHAR[]" | "BPCHAR[]" | "NAME[]" => {
            array::<String>(row, idx, |v| Ok(ColumnValue::Text(v)))?
        }
        "UUID[]" => array::<Uuid>(row, idx, |v| Ok(ColumnValue::Text(v.to_string())))?,
        "TIMESTAMPTZ[]" => array::<DateTime<Utc>>(row, idx, |v| Ok(ColumnValue::Timestamp(v)))?,
        "JSON[]" | "JSONB[]" => array::<serde_json::Value>(row, idx, |v| Ok(ColumnValue::Json(v)))?,

        // Enums, domains over text, citext and the like arrive as UTF-8 text.
        other => fallback_text(row, idx, other).map_err(|err| {
            AppError::Serialization(format!("column {idx} has unsupported type {other}: {err}"))
        })?,
    };

    Ok(value)
}

fn numeric(decimal: Decimal) -> AppResult<ColumnValue> {
    decimal
        .to_f64()
        .map(ColumnValue::Float)
        .ok_or_else(|| AppError::Serialization(format!("numeric {decimal} does not fit in a JSON number")))
}

fn get<'r, T>(row: &'r PgRow, idx: usize) -> AppResult<T>
where
    T: sqlx::Decode<'r, Postgres> + sqlx::Type<Postgres>,
{
    row.try_get::<T, _>(idx).map_err(decode_error)
}

/// Decode a one-dimensional array, keeping SQL `NULL` elements as `null`.
fn array<T>(
    row: &PgRow,
    idx: usize,
    convert: impl Fn(T) -> AppResult<ColumnValue>,
) -> AppResult<ColumnValue>
where
    T: for<'a> sqlx::Decode<'a, Postgres> + sqlx::Type<Postgres> + PgHasArrayType,
{
    get::<Vec<Option<T>>>(row, idx)?
        .into_iter()
        .map(|item| item.map_or(Ok(ColumnValue::Null), &convert))
        .collect::<AppResult<Vec<_>>>()
        .map(ColumnValue::Array)
}

fn fallback_text(row: &PgRow, idx: usize, type_name: &str) -> Result<ColumnValue, sqlx::Error> {
    // sqlx names arrays of user-defined types either `name[]` or `_name`.
    if type_name.ends_with("[]") || type_name.starts_with('_') {
        let items = row.try_get_unchecked::<Vec<Option<String>>, _>(idx)?;
        return Ok(ColumnValue::Array(
            items
                .into_iter()
                .map(|item| item.map_or(ColumnValue::Null, ColumnValue::Text))
                .collect(),
        ));
    }
    row.try_get_unchecked::<String, _>(idx).map(ColumnValue::Text)
}

fn decode_error(err: sqlx::Error) -> AppError {
    AppError::Serialization(err.to_string())
}
