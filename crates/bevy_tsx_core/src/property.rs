//! Custom properties attached to tilesets and tiles

use serde::{Deserialize, Serialize};

/// Declared type of a custom property
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyType {
    #[default]
    String,
    Int,
    Float,
    Bool,
    Color,
    File,
    Object,
}

impl PropertyType {
    /// Name as written in the `type` attribute
    pub fn as_str(&self) -> &'static str {
        match self {
            PropertyType::String => "string",
            PropertyType::Int => "int",
            PropertyType::Float => "float",
            PropertyType::Bool => "bool",
            PropertyType::Color => "color",
            PropertyType::File => "file",
            PropertyType::Object => "object",
        }
    }

    /// Parse a `type` attribute. Unknown types are read as strings.
    pub fn parse(name: &str) -> Self {
        match name {
            "int" => PropertyType::Int,
            "float" => PropertyType::Float,
            "bool" => PropertyType::Bool,
            "color" => PropertyType::Color,
            "file" => PropertyType::File,
            "object" => PropertyType::Object,
            _ => PropertyType::String,
        }
    }
}

/// A single named property. The value keeps its original text so files
/// round-trip unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    pub name: String,
    pub property_type: PropertyType,
    pub value: String,
}

impl Property {
    pub fn new(name: impl Into<String>, property_type: PropertyType, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            property_type,
            value: value.into(),
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self.property_type {
            PropertyType::Int | PropertyType::Object => self.value.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self.property_type {
            PropertyType::Float | PropertyType::Int => self.value.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match (self.property_type, self.value.trim()) {
            (PropertyType::Bool, "true") => Some(true),
            (PropertyType::Bool, "false") => Some(false),
            _ => None,
        }
    }
}

/// Ordered list of properties
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Properties(pub Vec<Property>);

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Property> {
        self.0.iter().find(|p| p.name == name)
    }

    /// Insert or replace a property by name
    pub fn set(&mut self, property: Property) {
        if let Some(existing) = self.0.iter_mut().find(|p| p.name == property.name) {
            *existing = property;
        } else {
            self.0.push(property);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Property> {
        self.0.iter()
    }
}
