//! ONNX classifier backend

use crate::error::ModelError;
use crate::models::Classifier;
use anyhow::{Context, Result};
use ort::memory::Allocator;
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::{DowncastableTarget, DynMapValueType, DynSequenceValueType, Tensor};
use std::path::Path;
use std::sync::RwLock;
use tracing::{debug, info, warn};

/// Binary classifier exported to ONNX
pub struct OnnxClassifier {
    session: RwLock<Session>,
    input_name: String,
    output_name: String,
    feature_names: Vec<String>,
    classes: Vec<String>,
}

impl OnnxClassifier {
    /// Load an ONNX model from file
    pub fn load<P: AsRef<Path>>(
        path: P,
        threads: usize,
        feature_names: Vec<String>,
        classes: Vec<String>,
    ) -> Result<Self> {
        let path = path.as_ref();

        ort::init().commit()?;
        info!(path = %path.display(), threads, "Loading ONNX model");

        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(threads)?
            .commit_from_file(path)
            .context(format!("Failed to load model from {:?}", path))?;

        let input_name = session
            .inputs
            .first()
            .map(|i| i.name.clone())
            .unwrap_or_else(|| "float_input".to_string());

        let output_name = session
            .outputs
            .iter()
            .find(|o| o.name.contains("prob"))
            .or_else(|| session.outputs.last())
            .map(|o| o.name.clone())
            .unwrap_or_else(|| "probabilities".to_string());

        info!(input = %input_name, output = %output_name, "ONNX model loaded");

        Ok(Self {
            session: RwLock::new(session),
            input_name,
            output_name,
            feature_names,
            classes,
        })
    }

    fn run(&self, features: &[f64]) -> Result<f64> {
        let shape = vec![1_i64, features.len() as i64];
        let data: Vec<f32> = features.iter().map(|&v| v as f32).collect();
        let input_tensor = Tensor::from_array((shape, data))
            .context("Failed to create input tensor")?;

        let mut session = self
            .session
            .write()
            .map_err(|e| anyhow::anyhow!("Lock error: {}", e))?;
        let outputs = session.run(ort::inputs![&self.input_name => input_tensor])?;

        if let Some(output) = outputs.get(self.output_name.as_str()) {
            if let Ok((shape, data)) = output.try_extract_tensor::<f32>() {
                let dims: Vec<i64> = shape.iter().copied().collect();
                return positive_from_tensor(&dims, data);
            }

            if DynSequenceValueType::can_downcast(&output.dtype()) {
                return positive_from_sequence_map(output);
            }
        }

        warn!(output = %self.output_name, "Could not extract probability");
        anyhow::bail!("no probability output named {}", self.output_name)
    }
}

/// Probability of class 1 from a `[1, n]` or `[n]` tensor.
fn positive_from_tensor(dims: &[i64], data: &[f32]) -> Result<f64> {
    let classes = dims.last().copied().unwrap_or(0);
    let value = if classes >= 2 {
        data.get(1)
    } else {
        data.first()
    };
    match value {
        Some(&p) => Ok(p as f64),
        None => anyhow::bail!("Empty probability tensor with shape {:?}", dims),
    }
}

/// Probability of class 1 from `seq(map(int64, float))`.
fn positive_from_sequence_map(output: &ort::value::DynValue) -> Result<f64> {
    let allocator = Allocator::default();

    let sequence = output
        .downcast_ref::<DynSequenceValueType>()
        .map_err(|e| anyhow::anyhow!("Failed to downcast to sequence: {}", e))?;
    let maps = sequence.try_extract_sequence::<DynMapValueType>(&allocator)?;
    let first = maps
        .first()
        .ok_or_else(|| anyhow::anyhow!("Empty sequence"))?;
    let pairs = first.try_extract_key_values::<i64, f32>()?;

    if let Some((_, p)) = pairs.iter().find(|(class, _)| *class == 1) {
        debug!(prob = *p, "Extracted from seq(map)");
        return Ok(*p as f64);
    }
    if let Some((_, p)) = pairs.iter().find(|(class, _)| *class == 0) {
        return Ok(1.0 - *p as f64);
    }
    anyhow::bail!("No probability found in map")
}

impl Classifier for OnnxClassifier {
    fn name(&self) -> &str {
        "onnx"
    }

    fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    fn classes(&self) -> &[String] {
        &self.classes
    }

    fn predict_proba(&self, features: &[f64]) -> Result<f64, ModelError> {
        if features.len() != self.feature_names.len() {
            return Err(ModelError::FeatureCount {
                expected: self.feature_names.len(),
                actual: features.len(),
            });
        }
        self.run(features)
            .map_err(|e| ModelError::Inference(e.to_string()))
    }
}
