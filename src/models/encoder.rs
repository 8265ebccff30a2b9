//! Label encoders for categorical feature columns.
//!
//! Each encoder carries the class list it was fitted with; a value encodes
//! to its position in that list.

use crate::error::EncoderError;
use crate::types::applicant::{Applicant, FeatureValue};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

/// Encoder for one column.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LabelEncoder {
    classes: Vec<String>,
}

impl LabelEncoder {
    pub fn new<S: Into<String>>(classes: impl IntoIterator<Item = S>) -> Self {
        Self {
            classes: classes.into_iter().map(Into::into).collect(),
        }
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn transform(&self, value: &str) -> Option<usize> {
        self.classes.iter().position(|c| c == value)
    }

    pub fn inverse_transform(&self, index: usize) -> Option<&str> {
        self.classes.get(index).map(String::as_str)
    }

    /// Index of `value`, or an error naming `column` when it was never fitted.
    pub fn encode(&self, column: &str, value: &str) -> Result<usize, EncoderError> {
        match self.transform(value) {
            Some(index) => Ok(index),
            None => Err(EncoderError::UnseenLabel {
                column: column.to_string(),
                value: value.to_string(),
            }),
        }
    }

    fn validate(&self, column: &str) -> Result<(), EncoderError> {
        if self.classes.is_empty() {
            return Err(EncoderError::NoClasses {
                column: column.to_string(),
            });
        }
        for (i, class) in self.classes.iter().enumerate() {
            if self.classes[..i].contains(class) {
                return Err(EncoderError::DuplicateClass {
                    column: column.to_string(),
                    value: class.clone(),
                });
            }
        }
        Ok(())
    }
}

/// The stored encoder dictionary: column name to encoder.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct EncoderSet {
    encoders: BTreeMap<String, LabelEncoder>,
}

impl EncoderSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, column: impl Into<String>, encoder: LabelEncoder) {
        self.encoders.insert(column.into(), encoder);
    }

    pub fn with(mut self, column: impl Into<String>, encoder: LabelEncoder) -> Self {
        self.insert(column, encoder);
        self
    }

    /// Parse and validate an encoder dictionary document.
    pub fn from_json(json: &str) -> Result<Self> {
        let set: EncoderSet = serde_json::from_str(json)
            .context("Failed to parse label encoders")?;
        for (column, encoder) in &set.encoders {
            encoder.validate(column)?;
        }
        Ok(set)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .context(format!("Failed to read encoders from {:?}", path))?;
        Self::from_json(&json)
    }

    pub fn get(&self, column: &str) -> Option<&LabelEncoder> {
        self.encoders.get(column)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.encoders.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.encoders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.encoders.is_empty()
    }

    /// Encode every column that has an encoder; other columns pass through.
    pub fn apply(&self, applicant: &Applicant) -> Result<Applicant, EncoderError> {
        let mut encoded = Applicant::new();

        for (column, value) in applicant.iter() {
            let value = match (self.encoders.get(column), value) {
                (Some(encoder), FeatureValue::Category(label)) => {
                    FeatureValue::Integer(encoder.encode(column, label)? as i64)
                }
                (Some(encoder), numeric) => {
                    // Encoders fitted on numeric-looking labels match on text.
                    let label = numeric.to_string();
                    FeatureValue::Integer(encoder.encode(column, &label)? as i64)
                }
                (None, value) => value.clone(),
            };
            encoded.push(column, value);
        }

        debug!(columns = encoded.len(), "Applied label encoders");
        Ok(encoded)
    }

    /// Map an encoded index back to its label.
    pub fn decode(&self, column: &str, index: usize) -> Result<Option<&str>, EncoderError> {
        let encoder = match self.encoders.get(column) {
            Some(encoder) => encoder,
            None => return Ok(None),
        };
        match encoder.inverse_transform(index) {
            Some(label) => Ok(Some(label)),
            None => Err(EncoderError::IndexOutOfRange {
                column: column.to_string(),
                index,
                len: encoder.classes.len(),
            }),
        }
    }
}

/// Free-function form of [`EncoderSet::apply`].
pub fn apply_encoder(
    applicant: &Applicant,
    encoders: &EncoderSet,
) -> Result<Applicant, EncoderError> {
    encoders.apply(applicant)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoders() -> EncoderSet {
        EncoderSet::new()
            .with("Gender", LabelEncoder::new(["a", "b"]))
            .with("Ethnicity", LabelEncoder::new(["bb", "h", "v"]))
            .with("Citizen", LabelEncoder::new(["g", "p", "s"]))
    }

    #[test]
    fn test_apply_encodes_only_known_columns() {
        let applicant = Applicant::new()
            .with("Gender", FeatureValue::Category("b".to_string()))
            .with("Age", FeatureValue::Float(30.83))
            .with("Ethnicity", FeatureValue::Category("v".to_string()));

        let encoded = apply_encoder(&applicant, &encoders()).unwrap();

        assert_eq!(encoded.get("Gender"), Some(&FeatureValue::Integer(1)));
        assert_eq!(encoded.get("Age"), Some(&FeatureValue::Float(30.83)));
        assert_eq!(encoded.get("Ethnicity"), Some(&FeatureValue::Integer(2)));
        assert_eq!(
            encoded.columns().collect::<Vec<_>>(),
            vec!["Gender", "Age", "Ethnicity"]
        );
    }

    #[test]
    fn test_unseen_label_is_an_error() {
        let value = FeatureValue::Category("x".to_string());
        let applicant = Applicant::new().with("Gender", value);

        let err = encoders().apply(&applicant).unwrap_err();
        assert_eq!(
            err,
            EncoderError::UnseenLabel {
                column: "Gender".to_string(),
                value: "x".to_string(),
            }
        );
    }

    #[test]
    fn test_from_json_rejects_duplicates() {
        let duplicated = r#"{"Gender": {"classes": ["a", "a"]}}"#;
        let err = EncoderSet::from_json(duplicated).unwrap_err();
        assert!(err.to_string().contains("more than once"));

        let valid = r#"{"Gender": {"classes": ["a", "b"]}}"#;
        let set = EncoderSet::from_json(valid).unwrap();
        assert_eq!(set.len(), 1);
        assert_eq!(set.get("Gender").unwrap().transform("b"), Some(1));
    }

    #[test]
    fn test_decode() {
        let set = encoders();
        assert_eq!(set.decode("Citizen", 2).unwrap(), Some("s"));
        assert_eq!(set.decode("Age", 0).unwrap(), None);
        assert!(matches!(
            set.decode("Citizen", 7),
            Err(EncoderError::IndexOutOfRange { len: 3, .. })
        ));
    }
}
