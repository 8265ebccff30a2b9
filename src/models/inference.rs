//! Approval inference engine

use crate::config::{AppConfig, PredictionConfig};
use crate::feature_extractor::FeatureExtractor;
use crate::models::encoder::EncoderSet;
use crate::models::loader::load_artifacts;
use crate::models::Classifier;
use crate::types::applicant::Applicant;
use crate::types::decision::{Decision, Prediction};
use anyhow::{Context, Result};
use tracing::{debug, info};

/// Encodes applicants, runs the classifier and turns scores into decisions.
pub struct ApprovalEngine {
    model: Box<dyn Classifier>,
    encoders: EncoderSet,
    extractor: FeatureExtractor,
    /// Probability above which `classes[1]` is predicted
    threshold: f64,
    /// Label that means "approved"
    approved_label: String,
}

impl ApprovalEngine {
    /// Create an engine from loaded artifacts
    pub fn new(
        model: Box<dyn Classifier>,
        encoders: EncoderSet,
        prediction: &PredictionConfig,
    ) -> Self {
        let extractor = FeatureExtractor::new(model.feature_names().to_vec());

        info!(
            model = %model.name(),
            features = extractor.feature_count(),
            encoders = encoders.len(),
            threshold = prediction.threshold,
            approved_label = %prediction.approved_label,
            "Approval engine initialized"
        );

        Self {
            model,
            encoders,
            extractor,
            threshold: prediction.threshold,
            approved_label: prediction.approved_label.clone(),
        }
    }

    /// Load artifacts named in the configuration and build an engine
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let (model, encoders) = load_artifacts(&config.artifacts)?;
        Ok(Self::new(model, encoders, &config.prediction))
    }

    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    pub fn encoders(&self) -> &EncoderSet {
        &self.encoders
    }

    pub fn approved_label(&self) -> &str {
        &self.approved_label
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Encode an applicant and predict its class
    pub fn predict(&self, applicant: &Applicant) -> Result<Prediction> {
        let encoded = self
            .encoders
            .apply(applicant)
            .context("Failed to encode applicant")?;
        let features = self.extractor.extract(&encoded)?;
        let probability = self.model.predict_proba(&features)?;

        let class_index = usize::from(probability > self.threshold);
        let label = self
            .model
            .classes()
            .get(class_index)
            .cloned()
            .context("Model has fewer than two classes")?;
        let approved = label == self.approved_label;

        debug!(
            probability,
            label = %label,
            approved,
            "Prediction complete"
        );

        Ok(Prediction {
            probability,
            class_index,
            label,
            approved,
        })
    }

    /// Predict and wrap the result in a decision record
    pub fn decide(&self, applicant: &Applicant) -> Result<Decision> {
        let prediction = self.predict(applicant)?;
        Ok(Decision::new(prediction, applicant.clone()))
    }

    /// Run prediction on a batch of applicants
    pub fn predict_batch(&self, applicants: &[Applicant]) -> Vec<Result<Prediction>> {
        applicants.iter().map(|a| self.predict(a)).collect()
    }

    /// Feature names paired with the model's coefficients, if it has any
    pub fn feature_importance(&self) -> Option<Vec<(String, f64)>> {
        let coefficients = self.model.coefficients()?;
        Some(
            self.model
                .feature_names()
                .iter()
                .cloned()
                .zip(coefficients.iter().copied())
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::encoder::LabelEncoder;
    use crate::models::logistic::LogisticRegression;
    use crate::types::applicant::FeatureValue;

    fn engine(threshold: f64) -> ApprovalEngine {
        let model = LogisticRegression {
            feature_names: vec!["PriorDefault".to_string(), "Income".to_string()],
            coefficients: vec![3.0, 0.001],
            intercept: -2.0,
            classes: vec!["-".to_string(), "+".to_string()],
        };
        let prior_default = LabelEncoder::new(["f", "t"]);
        let encoders = EncoderSet::new().with("PriorDefault", prior_default);
        let prediction = PredictionConfig {
            threshold,
            approved_label: "+".to_string(),
        };
        ApprovalEngine::new(Box::new(model), encoders, &prediction)
    }

    fn applicant(prior_default: &str, income: i64) -> Applicant {
        Applicant::new()
            .with("PriorDefault", FeatureValue::Category(prior_default.to_string()))
            .with("Income", FeatureValue::Integer(income))
    }

    #[test]
    fn test_predict_approves_positive_class() {
        let prediction = engine(0.5).predict(&applicant("t", 0)).unwrap();

        // z = -2 + 3 = 1
        assert!((prediction.probability - 0.7310585786).abs() < 1e-9);
        assert_eq!(prediction.class_index, 1);
        assert_eq!(prediction.label, "+");
        assert!(prediction.approved);
    }

    #[test]
    fn test_predict_rejects_negative_class() {
        let prediction = engine(0.5).predict(&applicant("f", 500)).unwrap();

        assert!(prediction.probability < 0.5);
        assert_eq!(prediction.label, "-");
        assert!(!prediction.approved);
    }

    #[test]
    fn test_threshold_is_strict() {
        // z = -2 + 3 = 1, p = 0.731
        let prediction = engine(0.8).predict(&applicant("t", 0)).unwrap();
        assert!(!prediction.approved);
    }

    #[test]
    fn test_unseen_category_fails() {
        let err = engine(0.5).predict(&applicant("maybe", 0)).unwrap_err();
        assert!(format!("{:#}", err).contains("unseen label"));
    }

    #[test]
    fn test_feature_importance_pairs_names() {
        let importance = engine(0.5).feature_importance().unwrap();
        assert_eq!(
            importance,
            vec![
                ("PriorDefault".to_string(), 3.0),
                ("Income".to_string(), 0.001),
            ]
        );
    }

    #[test]
    fn test_decide_keeps_raw_applicant() {
        let decision = engine(0.5).decide(&applicant("t", 10)).unwrap();
        assert!(decision.approved());
        assert_eq!(
            decision.applicant.get("PriorDefault"),
            Some(&FeatureValue::Category("t".to_string()))
        );
    }
}
