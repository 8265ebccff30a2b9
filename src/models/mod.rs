//! Model artifacts and inference components

pub mod encoder;
pub mod inference;
pub mod loader;
pub mod logistic;
#[cfg(feature = "onnx")]
pub mod onnx;

pub use encoder::{apply_encoder, EncoderSet, LabelEncoder};
pub use inference::ApprovalEngine;
pub use loader::{load_artifacts, load_encoders, load_model};
pub use logistic::LogisticRegression;

use crate::error::ModelError;

/// A trained binary classifier over the encoded feature vector.
pub trait Classifier: Send + Sync {
    fn name(&self) -> &str;

    /// Input columns in the order the model expects them.
    fn feature_names(&self) -> &[String];

    /// The two class labels; index 1 is the class `predict_proba` scores.
    fn classes(&self) -> &[String];

    /// Probability of `classes()[1]`.
    fn predict_proba(&self, features: &[f64]) -> Result<f64, ModelError>;

    /// Per-feature coefficients, for models that have them.
    fn coefficients(&self) -> Option<&[f64]> {
        None
    }
}
