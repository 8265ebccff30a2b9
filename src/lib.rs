//! Credit Card Approval Library
//!
//! Loads a trained approval classifier and its label encoders, builds an
//! applicant form over the applications dataset, predicts approval for a
//! submitted applicant and describes the data with a few bar charts.

pub mod app;
pub mod charts;
pub mod config;
pub mod dataset;
pub mod error;
pub mod evaluation;
pub mod feature_extractor;
pub mod form;
pub mod metrics;
pub mod models;
pub mod schema;
pub mod types;

pub use app::ApprovalApp;
pub use config::AppConfig;
pub use dataset::{load_data, preprocess_data, Dataset, DatasetCache};
pub use feature_extractor::FeatureExtractor;
pub use form::ApplicantForm;
pub use models::{apply_encoder, ApprovalEngine, EncoderSet};
pub use types::{Applicant, Decision, FeatureValue};
