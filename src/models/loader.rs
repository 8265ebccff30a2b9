//! Model and encoder artifact loader

use crate::config::{ArtifactsConfig, ModelBackend};
use crate::models::encoder::EncoderSet;
use crate::models::logistic::LogisticRegression;
use crate::models::Classifier;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::info;

/// On-disk classifier document, tagged by model kind.
#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelArtifact {
    LogisticRegression(LogisticRegression),
}

impl ModelArtifact {
    pub fn from_json(json: &str) -> Result<Self> {
        let artifact: ModelArtifact = serde_json::from_str(json)
            .context("Failed to parse model artifact")?;
        match &artifact {
            ModelArtifact::LogisticRegression(model) => model.validate()?,
        }
        Ok(artifact)
    }

    pub fn into_classifier(self) -> Box<dyn Classifier> {
        match self {
            ModelArtifact::LogisticRegression(model) => Box::new(model),
        }
    }
}

/// Load a JSON classifier artifact from file
pub fn load_model<P: AsRef<Path>>(path: P) -> Result<Box<dyn Classifier>> {
    let path = path.as_ref();

    info!(path = %path.display(), "Loading model artifact");

    let json = std::fs::read_to_string(path)
        .context(format!("Failed to load model from {:?}", path))?;
    let model = ModelArtifact::from_json(&json)?.into_classifier();

    info!(
        model = %model.name(),
        features = model.feature_names().len(),
        classes = ?model.classes(),
        "Model loaded successfully"
    );

    Ok(model)
}

/// Load the label-encoder dictionary from file
pub fn load_encoders<P: AsRef<Path>>(path: P) -> Result<EncoderSet> {
    let path = path.as_ref();
    let encoders = EncoderSet::from_path(path)?;

    info!(
        path = %path.display(),
        columns = ?encoders.columns().collect::<Vec<_>>(),
        "Label encoders loaded"
    );

    Ok(encoders)
}

/// Load the classifier for the configured backend together with its encoders.
pub fn load_artifacts(config: &ArtifactsConfig) -> Result<(Box<dyn Classifier>, EncoderSet)> {
    let model = match config.backend {
        ModelBackend::Logistic => load_model(&config.model_path)?,
        ModelBackend::Onnx => load_onnx(config)?,
    };
    let encoders = load_encoders(&config.encoders_path)?;
    Ok((model, encoders))
}

#[cfg(feature = "onnx")]
fn load_onnx(config: &ArtifactsConfig) -> Result<Box<dyn Classifier>> {
    use crate::models::onnx::OnnxClassifier;
    use crate::schema::FEATURE_COLUMNS;

    let model = OnnxClassifier::load(
        &config.model_path,
        config.onnx_threads,
        FEATURE_COLUMNS.iter().map(|c| c.to_string()).collect(),
        config.onnx_classes.clone(),
    )?;
    Ok(Box::new(model))
}

#[cfg(not(feature = "onnx"))]
fn load_onnx(_config: &ArtifactsConfig) -> Result<Box<dyn Classifier>> {
    anyhow::bail!("the onnx backend requires building with `--features onnx`")
}

#[cfg(test)]
mod tests {
    use super::*;

    const MODEL: &str = r#"{
        "kind": "logistic_regression",
        "feature_names": ["PriorDefault", "Income"],
        "coefficients": [3.0, 0.001],
        "intercept": -2.0,
        "classes": ["-", "+"]
    }"#;

    #[test]
    fn test_parse_logistic_artifact() {
        let model = ModelArtifact::from_json(MODEL).unwrap().into_classifier();
        assert_eq!(model.name(), "logistic_regression");
        assert_eq!(model.feature_names(), &["PriorDefault", "Income"]);
        assert_eq!(model.coefficients(), Some(&[3.0, 0.001][..]));
    }

    #[test]
    fn test_unknown_kind_is_rejected() {
        let json = MODEL.replace("logistic_regression", "random_forest");
        assert!(ModelArtifact::from_json(&json).is_err());
    }

    #[test]
    fn test_inconsistent_artifact_is_rejected() {
        let json = MODEL.replace("[3.0, 0.001]", "[3.0]");
        let err = ModelArtifact::from_json(&json).unwrap_err();
        assert!(err.to_string().contains("coefficients"));
    }

    #[test]
    fn test_load_from_files() {
        let dir = tempfile::tempdir().unwrap();
        let model_path = dir.path().join("model.json");
        let encoders_path = dir.path().join("encoders.json");
        std::fs::write(&model_path, MODEL).unwrap();
        let encoders = r#"{"PriorDefault": {"classes": ["f", "t"]}}"#;
        std::fs::write(&encoders_path, encoders).unwrap();

        let config = ArtifactsConfig {
            model_path: model_path.display().to_string(),
            encoders_path: encoders_path.display().to_string(),
            ..ArtifactsConfig::default()
        };
        let (model, encoders) = load_artifacts(&config).unwrap();
        assert_eq!(model.classes(), &["-", "+"]);
        assert_eq!(encoders.len(), 1);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        assert!(load_model("no/such/model.json").is_err());
    }
}
