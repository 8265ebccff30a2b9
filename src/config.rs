//! Configuration management for the approval demo

use crate::schema::{column_kind, ColumnKind};
use anyhow::{bail, Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::Path;

/// Default configuration file, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "config/config.toml";

/// Prefix for environment overrides, e.g. `CREDIT_APPROVAL__DATA__PATH`.
pub const ENV_PREFIX: &str = "CREDIT_APPROVAL";

/// Which classifier implementation reads the model artifact
#[derive(Debug, Clone, Deserialize, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ModelBackend {
    /// JSON export of a logistic regression
    #[default]
    Logistic,
    /// ONNX graph run through ONNX Runtime (requires the `onnx` feature)
    Onnx,
}

/// Main application configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub data: DataConfig,
    pub artifacts: ArtifactsConfig,
    pub prediction: PredictionConfig,
    pub charts: ChartsConfig,
    pub logging: LoggingConfig,
}

/// Applications file configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Headerless CSV with the applications
    pub path: String,
    /// Token marking a missing value
    pub missing_token: String,
}

/// Model and encoder artifacts
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ArtifactsConfig {
    pub model_path: String,
    pub encoders_path: String,
    pub backend: ModelBackend,
    /// Intra-op threads for the ONNX backend
    pub onnx_threads: usize,
    /// Class labels of an ONNX model, which does not carry them itself
    pub onnx_classes: Vec<String>,
}

fn default_onnx_threads() -> usize {
    1
}

fn default_classes() -> Vec<String> {
    vec!["-".to_string(), "+".to_string()]
}

/// Decision configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PredictionConfig {
    /// Probability above which the second class is predicted
    pub threshold: f64,
    /// Dataset label that means the application was approved
    pub approved_label: String,
}

/// Chart configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ChartsConfig {
    /// Categorical columns to show approval ratios for
    pub group_columns: Vec<String>,
    /// Width of the longest bar in terminal cells
    pub bar_width: usize,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Log format (json, pretty)
    pub format: String,
}

impl AppConfig {
    /// Load defaults, then `config/config.toml` if present, then the environment.
    pub fn load() -> Result<Self> {
        Self::build(
            File::with_name(DEFAULT_CONFIG_PATH).required(false),
            environment(),
        )
    }

    /// Load configuration from a specific path, which must exist
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::build(File::from(path.as_ref()).required(true), environment())
    }

    fn build<S>(file: S, env: Environment) -> Result<Self>
    where
        S: config::Source + Send + Sync + 'static,
    {
        let config = Config::builder()
            .add_source(file)
            .add_source(env)
            .build()
            .context("Failed to build configuration")?;

        let config: AppConfig = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let threshold = self.prediction.threshold;
        if !(threshold > 0.0 && threshold < 1.0) {
            bail!("prediction.threshold must be in (0, 1), got {}", threshold);
        }
        if self.prediction.approved_label.is_empty() {
            bail!("prediction.approved_label must not be empty");
        }
        if self.charts.bar_width == 0 {
            bail!("charts.bar_width must be positive");
        }
        for column in &self.charts.group_columns {
            if column_kind(column) != Some(ColumnKind::Categorical) {
                bail!("charts.group_columns: {} is not a categorical feature", column);
            }
        }
        if self.artifacts.onnx_classes.len() != 2 {
            bail!("artifacts.onnx_classes must list exactly 2 labels");
        }
        Ok(())
    }
}

/// `CREDIT_APPROVAL__SECTION__KEY` overrides; list keys take comma-separated values.
fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .separator("__")
        .try_parsing(true)
        .list_separator(",")
        .with_list_parse_key("charts.group_columns")
        .with_list_parse_key("artifacts.onnx_classes")
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            path: "data/cc_approvals.data".to_string(),
            missing_token: "?".to_string(),
        }
    }
}

impl Default for ArtifactsConfig {
    fn default() -> Self {
        Self {
            model_path: "artifacts/cc_model.json".to_string(),
            encoders_path: "artifacts/cc_label_encoders.json".to_string(),
            backend: ModelBackend::Logistic,
            onnx_threads: default_onnx_threads(),
            onnx_classes: default_classes(),
        }
    }
}

impl Default for PredictionConfig {
    fn default() -> Self {
        Self {
            threshold: 0.5,
            approved_label: "+".to_string(),
        }
    }
}

impl Default for ChartsConfig {
    fn default() -> Self {
        Self {
            group_columns: vec!["Gender".to_string(), "Ethnicity".to_string()],
            bar_width: 40,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
