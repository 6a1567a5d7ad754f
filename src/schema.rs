//! Schema registry for the three input layouts.
//!
//! A [`Schema`] is an ordered list of [`ColumnMeta`] entries; the
//! [`SchemaRegistry`] owns one schema per [`Layout`] and is built once at
//! startup with [`SchemaRegistry::standard()`], then handed to the loader.
//!
//! The registry serializes to YAML so the `schema --yaml` command can print
//! exactly what the loader validates against.

use std::{collections::BTreeMap, fmt, str::FromStr};

use anyhow::{Result, anyhow};
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ColumnType {
    String,
    Integer,
    Float,
    DateTime,
}

impl ColumnType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnType::String => "String",
            ColumnType::Integer => "Integer",
            ColumnType::Float => "Float",
            ColumnType::DateTime => "DateTime",
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ColumnType {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "string" | "str" => Ok(ColumnType::String),
            "integer" | "int" => Ok(ColumnType::Integer),
            "float" | "double" => Ok(ColumnType::Float),
            "datetime" | "timestamp" => Ok(ColumnType::DateTime),
            other => Err(anyhow!("Unknown column type '{other}'")),
        }
    }
}

impl Serialize for ColumnType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ColumnType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let token = String::deserialize(deserializer)?;
        ColumnType::from_str(&token).map_err(|err| de::Error::custom(err.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMeta {
    pub name: String,
    pub datatype: ColumnType,
    /// Numeric values must be strictly greater than zero.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub positive: bool,
}

impl ColumnMeta {
    pub fn new(name: &str, datatype: ColumnType) -> Self {
        Self {
            name: name.to_string(),
            datatype,
            positive: false,
        }
    }

    pub fn positive(mut self) -> Self {
        self.positive = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    pub columns: Vec<ColumnMeta>,
}

impl Schema {
    pub fn new(columns: Vec<ColumnMeta>) -> Self {
        Self { columns }
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn headers(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileFormat {
    Csv,
    Json,
}

impl FileFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            FileFormat::Csv => "csv",
            FileFormat::Json => "json",
        }
    }
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    Pharmacies,
    Claims,
    Reverts,
}

impl Layout {
    /// Subdirectory of the source root holding this layout's files.
    pub fn dir_name(&self) -> &'static str {
        match self {
            Layout::Pharmacies => "pharmacies",
            Layout::Claims => "claims",
            Layout::Reverts => "reverts",
        }
    }

    pub fn default_format(&self) -> FileFormat {
        match self {
            Layout::Pharmacies => FileFormat::Csv,
            Layout::Claims | Layout::Reverts => FileFormat::Json,
        }
    }
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaRegistry {
    schemas: BTreeMap<Layout, Schema>,
}

impl SchemaRegistry {
    pub fn standard() -> Self {
        let mut schemas = BTreeMap::new();
        schemas.insert(
            Layout::Pharmacies,
            Schema::new(vec![
                ColumnMeta::new("chain", ColumnType::String),
                ColumnMeta::new("npi", ColumnType::String),
            ]),
        );
        schemas.insert(
            Layout::Claims,
            Schema::new(vec![
                ColumnMeta::new("id", ColumnType::String),
                ColumnMeta::new("npi", ColumnType::String),
                ColumnMeta::new("ndc", ColumnType::String),
                ColumnMeta::new("price", ColumnType::Float),
                ColumnMeta::new("quantity", ColumnType::Integer).positive(),
                ColumnMeta::new("timestamp", ColumnType::DateTime),
            ]),
        );
        schemas.insert(
            Layout::Reverts,
            Schema::new(vec![
                ColumnMeta::new("id", ColumnType::String),
                ColumnMeta::new("claim_id", ColumnType::String),
                ColumnMeta::new("timestamp", ColumnType::DateTime),
            ]),
        );
        Self { schemas }
    }

    pub fn schema(&self, layout: Layout) -> &Schema {
        // `standard()` is the only constructor and covers every layout.
        &self.schemas[&layout]
    }

    pub fn layouts(&self) -> impl Iterator<Item = (Layout, &Schema)> {
        self.schemas.iter().map(|(layout, schema)| (*layout, schema))
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::standard()
    }
}
