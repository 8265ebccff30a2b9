//! Feature extraction for approval model inference.
//!
//! Turns an encoded applicant row into the numeric vector the classifier
//! was trained on, in the classifier's own column order.

use crate::error::ModelError;
use crate::types::applicant::{Applicant, FeatureValue};

/// Orders encoded applicant values into a model input vector.
pub struct FeatureExtractor {
    feature_names: Vec<String>,
}

impl FeatureExtractor {
    /// Create an extractor for a model's feature columns.
    pub fn new(feature_names: Vec<String>) -> Self {
        Self { feature_names }
    }

    /// Extract features from an already encoded applicant.
    ///
    /// Columns the model does not use are ignored. A categorical value that
    /// is still a label means its encoder was never applied.
    pub fn extract(&self, encoded: &Applicant) -> Result<Vec<f64>, ModelError> {
        let mut features = Vec::with_capacity(self.feature_names.len());

        for name in &self.feature_names {
            let value = encoded
                .get(name)
                .ok_or_else(|| ModelError::MissingFeature(name.clone()))?;
            match value {
                FeatureValue::Category(_) => return Err(ModelError::Unencoded(name.clone())),
                numeric => features.push(numeric.as_f64().unwrap_or_default()),
            }
        }

        Ok(features)
    }

    /// Get the number of features produced.
    pub fn feature_count(&self) -> usize {
        self.feature_names.len()
    }

    /// Get feature names in model order.
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor() -> FeatureExtractor {
        let names = ["Age", "Gender", "Income"];
        FeatureExtractor::new(names.iter().map(|n| n.to_string()).collect())
    }

    #[test]
    fn test_feature_extraction_follows_model_order() {
        let encoded = Applicant::new()
            .with("Gender", FeatureValue::Integer(1))
            .with("Income", FeatureValue::Integer(560))
            .with("Age", FeatureValue::Float(58.67))
            .with("Debt", FeatureValue::Float(4.46));

        let features = extractor().extract(&encoded).unwrap();

        assert_eq!(features, vec![58.67, 1.0, 560.0]);
        assert_eq!(features.len(), extractor().feature_count());
    }

    #[test]
    fn test_missing_and_unencoded_features() {
        let partial = Applicant::new().with("Age", FeatureValue::Float(30.0));
        assert_eq!(
            extractor().extract(&partial),
            Err(ModelError::MissingFeature("Gender".to_string()))
        );

        let raw = Applicant::new()
            .with("Age", FeatureValue::Float(30.0))
            .with("Gender", FeatureValue::Category("a".to_string()))
            .with("Income", FeatureValue::Integer(0));
        assert_eq!(
            extractor().extract(&raw),
            Err(ModelError::Unencoded("Gender".to_string()))
        );
    }
}
