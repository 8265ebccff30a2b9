//! Error types for dataset loading, encoding, form filling and prediction.

use thiserror::Error;

/// Errors raised while reading or cleaning the applicant dataset.
#[derive(Error, Debug)]
pub enum DataError {
    /// The underlying CSV reader failed.
    #[error("failed to read dataset {path}: {source}")]
    Read {
        /// Path of the dataset file.
        path: String,
        #[source]
        source: csv::Error,
    },

    /// A record did not have one field per dataset column.
    #[error("line {line}: expected {expected} fields, got {actual}")]
    FieldCount {
        /// 1-based line number in the source file.
        line: usize,
        /// Number of columns in the schema.
        expected: usize,
        /// Number of fields found.
        actual: usize,
    },

    /// A numeric column held a value that does not parse.
    #[error("line {line}: column {column} has non-numeric value {value:?}")]
    NotNumeric {
        line: usize,
        column: String,
        value: String,
    },

    /// Grouping was requested over a column that is not categorical.
    #[error("column {column} is not a categorical feature")]
    NotCategorical { column: String },

    /// Every row had a missing value.
    #[error("dataset has no rows left after dropping missing values")]
    Empty,
}

/// Errors raised by label encoders.
#[derive(Error, Debug, PartialEq)]
pub enum EncoderError {
    /// The value was not among the classes the encoder was fitted on.
    #[error("column {column} contains previously unseen label {value:?}")]
    UnseenLabel { column: String, value: String },

    /// The encoder's class list repeats a label.
    #[error("encoder for column {column} lists class {value:?} more than once")]
    DuplicateClass { column: String, value: String },

    /// The encoder has no classes at all.
    #[error("encoder for column {column} has no classes")]
    NoClasses { column: String },

    /// Inverse transform with an index past the class list.
    #[error("column {column}: index {index} is out of range for {len} classes")]
    IndexOutOfRange {
        column: String,
        index: usize,
        len: usize,
    },
}

/// Errors raised while filling the applicant form.
#[derive(Error, Debug, PartialEq)]
pub enum FormError {
    /// Override did not look like `Column=value`.
    #[error("expected Column=value, got {0:?}")]
    MalformedOverride(String),

    /// The form has no field with this name.
    #[error("unknown form field {0:?}")]
    UnknownField(String),

    /// A numeric field received something that does not parse.
    #[error("{column}: {value:?} is not a valid number")]
    NotNumeric { column: String, value: String },

    /// A numeric field received a value outside its slider range.
    #[error("{column}: {value} is outside the allowed range [{min}, {max}]")]
    OutOfRange {
        column: String,
        value: f64,
        min: f64,
        max: f64,
    },

    /// A categorical field received a value that is not one of its options.
    #[error("{column}: {value:?} is not one of the available options")]
    UnknownOption { column: String, value: String },

    /// An applicant file was not a JSON object of field values.
    #[error("applicant must be a JSON object mapping columns to values")]
    NotAnObject,

    /// The terminal prompt failed.
    #[error("prompt failed: {0}")]
    Prompt(String),
}

/// Errors raised by classifiers and the feature extractor.
#[derive(Error, Debug, PartialEq)]
pub enum ModelError {
    /// Coefficient count differs from feature-name count.
    #[error("model lists {features} features but {coefficients} coefficients")]
    CoefficientMismatch {
        features: usize,
        coefficients: usize,
    },

    /// A binary classifier needs exactly two classes.
    #[error("expected 2 classes, got {0}")]
    ClassCount(usize),

    /// Feature vector length differs from what the model was trained on.
    #[error("expected {expected} features, got {actual}")]
    FeatureCount { expected: usize, actual: usize },

    /// The applicant row lacks a feature the model needs.
    #[error("applicant is missing feature {0:?}")]
    MissingFeature(String),

    /// A categorical feature reached the model without being encoded.
    #[error("feature {0:?} is categorical but no encoder was applied")]
    Unencoded(String),

    /// The inference backend failed.
    #[error("inference failed: {0}")]
    Inference(String),
}
