#![deny(unsafe_code)]

use std::fmt;

use filing_model::TableKind;

/// Declared type of a schema property.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize)]
pub enum PropertyType {
    String,
    Integer,
    Float,
    Boolean,
    Date,
    DateTime,
    /// A type the loader does not interpret; completed with nulls.
    Other(String),
}

impl PropertyType {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "string" | "str" | "text" => PropertyType::String,
            "integer" | "int" | "long" => PropertyType::Integer,
            "float" | "double" | "decimal" => PropertyType::Float,
            "boolean" | "bool" => PropertyType::Boolean,
            "date" => PropertyType::Date,
            "datetime" | "timestamp" => PropertyType::DateTime,
            _ => PropertyType::Other(raw.trim().to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            PropertyType::String => "String",
            PropertyType::Integer => "Integer",
            PropertyType::Float => "Float",
            PropertyType::Boolean => "Boolean",
            PropertyType::Date => "Date",
            PropertyType::DateTime => "DateTime",
            PropertyType::Other(name) => name,
        }
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct PropertySchema {
    pub name: String,
    pub property_type: PropertyType,
    pub required: bool,
}

/// Canonical, ordered column set of one table kind.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct TableSchema {
    pub kind: TableKind,
    pub properties: Vec<PropertySchema>,
}

impl TableSchema {
    pub fn new(kind: TableKind) -> Self {
        Self {
            kind,
            properties: Vec::new(),
        }
    }

    pub fn property(&self, name: &str) -> Option<&PropertySchema> {
        self.properties.iter().find(|p| p.name == name)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.properties.iter().map(|p| p.name.as_str())
    }

    pub fn required_columns(&self) -> impl Iterator<Item = &str> {
        self.properties
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}
