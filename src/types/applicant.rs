//! Applicant data structures

use serde::ser::{Serialize, SerializeMap, Serializer};
use std::fmt;

/// A single typed cell of an applicant row.
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureValue {
    Float(f64),
    Integer(i64),
    Category(String),
}

impl FeatureValue {
    /// Numeric view of the value; categories have none until encoded.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FeatureValue::Float(v) => Some(*v),
            FeatureValue::Integer(v) => Some(*v as f64),
            FeatureValue::Category(_) => None,
        }
    }

    pub fn as_category(&self) -> Option<&str> {
        match self {
            FeatureValue::Category(v) => Some(v),
            _ => None,
        }
    }
}

impl fmt::Display for FeatureValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureValue::Float(v) => write!(f, "{}", v),
            FeatureValue::Integer(v) => write!(f, "{}", v),
            FeatureValue::Category(v) => f.write_str(v),
        }
    }
}

impl Serialize for FeatureValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FeatureValue::Float(v) => serializer.serialize_f64(*v),
            FeatureValue::Integer(v) => serializer.serialize_i64(*v),
            FeatureValue::Category(v) => serializer.serialize_str(v),
        }
    }
}

/// One applicant: feature columns in model input order with their values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Applicant {
    values: Vec<(String, FeatureValue)>,
}

impl Applicant {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a column; replaces the value if the column already exists.
    pub fn push(&mut self, column: impl Into<String>, value: FeatureValue) {
        let column = column.into();
        match self.values.iter_mut().find(|(c, _)| *c == column) {
            Some((_, slot)) => *slot = value,
            None => self.values.push((column, value)),
        }
    }

    pub fn with(mut self, column: impl Into<String>, value: FeatureValue) -> Self {
        self.push(column, value);
        self
    }

    pub fn get(&self, column: &str) -> Option<&FeatureValue> {
        self.values
            .iter()
            .find(|(c, _)| c == column)
            .map(|(_, v)| v)
    }

    /// Replace an existing column's value. Returns false if the column is absent.
    pub fn set(&mut self, column: &str, value: FeatureValue) -> bool {
        match self.values.iter_mut().find(|(c, _)| c == column) {
            Some((_, slot)) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FeatureValue)> {
        self.values.iter().map(|(c, v)| (c.as_str(), v))
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.values.iter().map(|(c, _)| c.as_str())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl Serialize for Applicant {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (column, value) in &self.values {
            map.serialize_entry(column, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_replaces_existing_column() {
        let mut applicant = Applicant::new()
            .with("Gender", FeatureValue::Category("a".to_string()))
            .with("Age", FeatureValue::Float(30.0));
        applicant.push("Age", FeatureValue::Float(41.5));

        assert_eq!(applicant.len(), 2);
        assert_eq!(applicant.get("Age"), Some(&FeatureValue::Float(41.5)));
        assert_eq!(applicant.columns().collect::<Vec<_>>(), vec!["Gender", "Age"]);
    }

    #[test]
    fn test_serializes_as_ordered_object() {
        let applicant = Applicant::new()
            .with("Gender", FeatureValue::Category("b".to_string()))
            .with("Age", FeatureValue::Float(30.5))
            .with("Income", FeatureValue::Integer(560));

        let json = serde_json::to_string(&applicant).unwrap();
        assert_eq!(json, r#"{"Gender":"b","Age":30.5,"Income":560}"#);
    }
}
