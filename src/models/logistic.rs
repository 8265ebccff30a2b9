//! Exported logistic-regression classifier.

use crate::error::ModelError;
use crate::models::Classifier;
use serde::Deserialize;

/// Binary logistic regression with the coefficients of the second class.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LogisticRegression {
    pub feature_names: Vec<String>,
    pub coefficients: Vec<f64>,
    pub intercept: f64,
    /// Class labels in model order; the coefficients score `classes[1]`.
    pub classes: Vec<String>,
}

impl LogisticRegression {
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.coefficients.len() != self.feature_names.len() {
            return Err(ModelError::CoefficientMismatch {
                features: self.feature_names.len(),
                coefficients: self.coefficients.len(),
            });
        }
        if self.classes.len() != 2 {
            return Err(ModelError::ClassCount(self.classes.len()));
        }
        Ok(())
    }

    /// Signed distance to the decision boundary.
    pub fn decision_function(&self, features: &[f64]) -> Result<f64, ModelError> {
        if features.len() != self.coefficients.len() {
            return Err(ModelError::FeatureCount {
                expected: self.coefficients.len(),
                actual: features.len(),
            });
        }
        Ok(self.intercept
            + self
                .coefficients
                .iter()
                .zip(features)
                .map(|(c, x)| c * x)
                .sum::<f64>())
    }
}

pub fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

impl Classifier for LogisticRegression {
    fn name(&self) -> &str {
        "logistic_regression"
    }

    fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    fn classes(&self) -> &[String] {
        &self.classes
    }

    fn predict_proba(&self, features: &[f64]) -> Result<f64, ModelError> {
        self.decision_function(features).map(sigmoid)
    }

    fn coefficients(&self) -> Option<&[f64]> {
        Some(&self.coefficients)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model() -> LogisticRegression {
        LogisticRegression {
            feature_names: vec!["PriorDefault".to_string(), "Income".to_string()],
            coefficients: vec![3.0, 0.001],
            intercept: -2.0,
            classes: vec!["-".to_string(), "+".to_string()],
        }
    }

    #[test]
    fn test_predict_proba() {
        let model = model();

        let p = model.predict_proba(&[1.0, 0.0]).unwrap();
        assert!((p - sigmoid(1.0)).abs() < 1e-12);
        assert!((sigmoid(0.0) - 0.5).abs() < 1e-12);

        let p = model.predict_proba(&[0.0, 0.0]).unwrap();
        assert!(p < 0.5);
    }

    #[test]
    fn test_feature_count_is_checked() {
        let err = model().predict_proba(&[1.0]).unwrap_err();
        assert_eq!(
            err,
            ModelError::FeatureCount {
                expected: 2,
                actual: 1,
            }
        );
    }

    #[test]
    fn test_validate() {
        let mut bad = model();
        bad.coefficients.pop();
        assert!(matches!(
            bad.validate(),
            Err(ModelError::CoefficientMismatch { .. })
        ));

        let mut bad = model();
        bad.classes.push("?".to_string());
        assert_eq!(bad.validate(), Err(ModelError::ClassCount(3)));

        assert!(model().validate().is_ok());
    }
}
