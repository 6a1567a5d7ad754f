//! Strongly typed records for each layout and the validated dataset that
//! holds them.

use std::path::PathBuf;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::{
    data::Value,
    schema::{Layout, Schema},
};

/// A record type backed by one layout's schema.
pub trait LayoutRecord: Sized {
    const LAYOUT: Layout;

    /// Builds the record from a fully validated row, in schema order.
    /// Returns `None` if the schema lacks a column the record needs.
    fn from_values(schema: &Schema, values: &[Value]) -> Option<Self>;
}

fn field<'a>(schema: &Schema, values: &'a [Value], name: &str) -> Option<&'a Value> {
    schema.column_index(name).and_then(|idx| values.get(idx))
}

fn string_field(schema: &Schema, values: &[Value], name: &str) -> Option<String> {
    field(schema, values, name)
        .and_then(Value::as_str)
        .map(str::to_string)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pharmacy {
    pub chain: String,
    pub npi: String,
}

impl LayoutRecord for Pharmacy {
    const LAYOUT: Layout = Layout::Pharmacies;

    fn from_values(schema: &Schema, values: &[Value]) -> Option<Self> {
        Some(Self {
            chain: string_field(schema, values, "chain")?,
            npi: string_field(schema, values, "npi")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claim {
    pub id: String,
    pub npi: String,
    pub ndc: String,
    pub price: f64,
    pub quantity: i64,
    pub timestamp: NaiveDateTime,
}

impl Claim {
    /// Price per dispensed unit. Quantity is validated positive on load.
    pub fn unit_price(&self) -> f64 {
        self.price / self.quantity as f64
    }
}

impl LayoutRecord for Claim {
    const LAYOUT: Layout = Layout::Claims;

    fn from_values(schema: &Schema, values: &[Value]) -> Option<Self> {
        Some(Self {
            id: string_field(schema, values, "id")?,
            npi: string_field(schema, values, "npi")?,
            ndc: string_field(schema, values, "ndc")?,
            price: field(schema, values, "price")?.as_f64()?,
            quantity: field(schema, values, "quantity")?.as_i64()?,
            timestamp: field(schema, values, "timestamp")?.as_datetime()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Revert {
    pub id: String,
    pub claim_id: String,
    pub timestamp: NaiveDateTime,
}

impl LayoutRecord for Revert {
    const LAYOUT: Layout = Layout::Reverts;

    fn from_values(schema: &Schema, values: &[Value]) -> Option<Self> {
        Some(Self {
            id: string_field(schema, values, "id")?,
            claim_id: string_field(schema, values, "claim_id")?,
            timestamp: field(schema, values, "timestamp")?.as_datetime()?,
        })
    }
}

/// Per-file load statistics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileSummary {
    pub path: PathBuf,
    pub rows_read: usize,
    pub valid_rows: usize,
}

impl FileSummary {
    pub fn quarantined_rows(&self) -> usize {
        self.rows_read - self.valid_rows
    }
}

/// Every record satisfies its layout's schema; built once by the loader.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset<R> {
    pub records: Vec<R>,
    pub files: Vec<FileSummary>,
}

impl<R> Dataset<R> {
    pub fn new(records: Vec<R>, files: Vec<FileSummary>) -> Self {
        Self { records, files }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new(), Vec::new())
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, R> {
        self.records.iter()
    }
}

impl<R> From<Vec<R>> for Dataset<R> {
    fn from(records: Vec<R>) -> Self {
        Self::new(records, Vec::new())
    }
}

/// The three validated datasets produced by `load_all`.
#[derive(Debug, Clone)]
pub struct SourceData {
    pub pharmacies: Dataset<Pharmacy>,
    pub claims: Dataset<Claim>,
    pub reverts: Dataset<Revert>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SchemaRegistry;

    #[test]
    fn claim_from_values_follows_schema_order() {
        let registry = SchemaRegistry::standard();
        let schema = registry.schema(Layout::Claims);
        let ts = NaiveDateTime::parse_from_str("2024-01-01 08:00:00", "%Y-%m-%d %H:%M:%S")
            .unwrap();
        let values = vec![
            Value::String("c1".into()),
            Value::String("p1".into()),
            Value::String("d1".into()),
            Value::Float(10.0),
            Value::Integer(4),
            Value::DateTime(ts),
        ];
        let claim = Claim::from_values(schema, &values).expect("claim");
        assert_eq!(claim.ndc, "d1");
        assert_eq!(claim.quantity, 4);
        assert_eq!(claim.unit_price(), 2.5);
    }

    #[test]
    fn from_values_rejects_mistyped_cells() {
        let registry = SchemaRegistry::standard();
        let schema = registry.schema(Layout::Pharmacies);
        let values = vec![Value::String("CVS".into()), Value::Integer(1)];
        assert!(Pharmacy::from_values(schema, &values).is_none());
    }
}
