use std::fmt;

use anyhow::{Result, anyhow};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::schema::{ColumnMeta, ColumnType};

const DATETIME_DISPLAY_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Value {
    String(String),
    Integer(i64),
    Float(f64),
    DateTime(NaiveDateTime),
}

impl Value {
    pub fn as_display(&self) -> String {
        match self {
            Value::String(s) => s.clone(),
            Value::Integer(i) => i.to_string(),
            Value::Float(f) => f.to_string(),
            Value::DateTime(dt) => dt.format(DATETIME_DISPLAY_FORMAT).to_string(),
        }
    }

    pub fn column_type(&self) -> ColumnType {
        match self {
            Value::String(_) => ColumnType::String,
            Value::Integer(_) => ColumnType::Integer,
            Value::Float(_) => ColumnType::Float,
            Value::DateTime(_) => ColumnType::DateTime,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_datetime(&self) -> Option<NaiveDateTime> {
        match self {
            Value::DateTime(dt) => Some(*dt),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_display())
    }
}

/// A cell as read from a source file, before coercion.
#[derive(Debug, Clone, PartialEq)]
pub enum RawCell {
    Absent,
    Text(String),
    Json(serde_json::Value),
}

impl RawCell {
    pub fn render(&self) -> String {
        match self {
            RawCell::Absent => "<missing>".to_string(),
            RawCell::Text(s) => s.clone(),
            RawCell::Json(serde_json::Value::String(s)) => s.clone(),
            RawCell::Json(other) => other.to_string(),
        }
    }
}

pub fn parse_naive_datetime(value: &str) -> Result<NaiveDateTime> {
    const DATETIME_FORMATS: &[&str] = &[
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%m/%d/%Y %H:%M:%S",
        "%d/%m/%Y %H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M",
    ];
    const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];

    let trimmed = value.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(parsed.naive_utc());
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Ok(parsed);
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(parsed) = NaiveDate::parse_from_str(trimmed, fmt) {
            return Ok(parsed.and_time(chrono::NaiveTime::MIN));
        }
    }
    Err(anyhow!("Failed to parse '{value}' as datetime"))
}

/// Tokens that a CSV reader treats as an empty cell regardless of column type.
pub fn is_placeholder_token(value: &str) -> bool {
    let lowered = value.trim().to_ascii_lowercase();
    let stripped = lowered.trim_start_matches('#');
    matches!(
        stripped,
        "" | "na" | "n/a" | "n.a." | "nan" | "null" | "none" | "nat" | "<na>"
    ) || stripped.chars().all(|c| c == '-')
}

/// Coerces one source cell to the column's type. `None` is the missing marker.
pub fn coerce_cell(cell: &RawCell, column: &ColumnMeta) -> Option<Value> {
    let value = match cell {
        RawCell::Absent => None,
        RawCell::Text(text) => coerce_text(text, column.datatype),
        RawCell::Json(json) => coerce_json(json, column.datatype),
    }?;
    if column.positive && value.as_f64().is_some_and(|n| n <= 0.0) {
        return None;
    }
    Some(value)
}

pub fn coerce_text(value: &str, ty: ColumnType) -> Option<Value> {
    if is_placeholder_token(value) {
        return None;
    }
    match ty {
        ColumnType::String => Some(Value::String(value.to_string())),
        ColumnType::Integer => parse_integer(value.trim()).map(Value::Integer),
        ColumnType::Float => parse_float(value.trim()).map(Value::Float),
        ColumnType::DateTime => parse_naive_datetime(value).ok().map(Value::DateTime),
    }
}

pub fn coerce_json(value: &serde_json::Value, ty: ColumnType) -> Option<Value> {
    use serde_json::Value as Json;

    match (value, ty) {
        (Json::Null, _) | (Json::Array(_), _) | (Json::Object(_), _) => None,
        (Json::String(s), ColumnType::String) => Some(Value::String(s.clone())),
        (Json::Number(n), ColumnType::String) => Some(Value::String(n.to_string())),
        (Json::Bool(b), ColumnType::String) => Some(Value::String(b.to_string())),
        (Json::String(s), other) => coerce_text(s, other),
        (Json::Number(n), ColumnType::Integer) => match n.as_i64() {
            Some(i) => Some(Value::Integer(i)),
            None => n.as_f64().and_then(integral_f64).map(Value::Integer),
        },
        (Json::Number(n), ColumnType::Float) => {
            n.as_f64().filter(|f| f.is_finite()).map(Value::Float)
        }
        (Json::Number(n), ColumnType::DateTime) => n
            .as_i64()
            .and_then(DateTime::from_timestamp_millis)
            .map(|dt| Value::DateTime(dt.naive_utc())),
        (Json::Bool(_), _) => None,
    }
}

fn parse_integer(value: &str) -> Option<i64> {
    value
        .parse::<i64>()
        .ok()
        .or_else(|| parse_float(value).and_then(integral_f64))
}

fn parse_float(value: &str) -> Option<f64> {
    value.parse::<f64>().ok().filter(|f| f.is_finite())
}

fn integral_f64(value: f64) -> Option<i64> {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        Some(value as i64)
    } else {
        None
    }
}
