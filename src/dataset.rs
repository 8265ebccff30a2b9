//! Loading and cleaning of the credit card applications file.
//!
//! The file is headerless CSV with one column per entry in
//! [`COLUMN_NAMES`]. Cleaning keeps the feature columns, drops every row
//! where a feature holds the missing-value token and types the remaining
//! values per [`column_kind`].

use crate::error::DataError;
use crate::schema::{
    column_index, column_kind, ColumnKind, COLUMN_NAMES, FEATURE_COLUMNS, LABEL_COLUMN,
};
use crate::types::applicant::{Applicant, FeatureValue};
use std::collections::HashMap;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use tracing::{debug, info};

/// One untyped line of the data file.
#[derive(Debug, Clone)]
pub struct RawRecord {
    /// 1-based line number
    pub line: usize,
    pub fields: Vec<String>,
}

impl RawRecord {
    pub fn field(&self, column: &str) -> Option<&str> {
        column_index(column)
            .and_then(|i| self.fields.get(i))
            .map(String::as_str)
    }
}

/// The data file as read, before cleaning.
#[derive(Debug, Clone, Default)]
pub struct RawData {
    pub records: Vec<RawRecord>,
}

impl RawData {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Read the headerless data file at `path`.
pub fn load_data<P: AsRef<Path>>(path: P) -> Result<RawData, DataError> {
    let path = path.as_ref();
    let reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|source| DataError::Read {
            path: path.display().to_string(),
            source,
        })?;

    let raw = read_records(reader, &path.display().to_string())?;
    info!(path = %path.display(), records = raw.len(), "Loaded applications file");
    Ok(raw)
}

/// Read headerless records from any reader.
pub fn load_data_from_reader<R: Read>(reader: R) -> Result<RawData, DataError> {
    let reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);
    read_records(reader, "<reader>")
}

fn read_records<R: Read>(
    mut reader: csv::Reader<R>,
    source_name: &str,
) -> Result<RawData, DataError> {
    let mut records = Vec::new();

    for (i, result) in reader.records().enumerate() {
        let record = result.map_err(|source| DataError::Read {
            path: source_name.to_string(),
            source,
        })?;
        let line = record
            .position()
            .map(|p| p.line() as usize)
            .unwrap_or(i + 1);

        if record.len() != COLUMN_NAMES.len() {
            return Err(DataError::FieldCount {
                line,
                expected: COLUMN_NAMES.len(),
                actual: record.len(),
            });
        }

        records.push(RawRecord {
            line,
            fields: record.iter().map(str::to_string).collect(),
        });
    }

    Ok(RawData { records })
}

/// Cleaned feature rows with their approval labels.
#[derive(Debug, Clone)]
pub struct Dataset {
    rows: Vec<Applicant>,
    labels: Vec<String>,
    dropped: usize,
}

/// Select the feature columns, drop rows with missing features and type
/// the values. Labels keep their raw text.
pub fn preprocess_data(raw: &RawData, missing_token: &str) -> Result<Dataset, DataError> {
    let mut rows = Vec::with_capacity(raw.len());
    let mut labels = Vec::with_capacity(raw.len());
    let mut dropped = 0;

    for record in &raw.records {
        let has_missing = FEATURE_COLUMNS
            .iter()
            .any(|c| record.field(c).map_or(true, |v| v == missing_token));
        if has_missing {
            debug!(line = record.line, "Dropping row with missing values");
            dropped += 1;
            continue;
        }

        let mut applicant = Applicant::new();
        for column in FEATURE_COLUMNS {
            let value = record.field(column).unwrap_or_default();
            applicant.push(column, parse_value(column, value, record.line)?);
        }

        rows.push(applicant);
        labels.push(record.field(LABEL_COLUMN).unwrap_or_default().to_string());
    }

    if rows.is_empty() {
        return Err(DataError::Empty);
    }

    info!(rows = rows.len(), dropped, "Preprocessed applications");

    Ok(Dataset {
        rows,
        labels,
        dropped,
    })
}

fn parse_value(column: &str, value: &str, line: usize) -> Result<FeatureValue, DataError> {
    let not_numeric = || DataError::NotNumeric {
        line,
        column: column.to_string(),
        value: value.to_string(),
    };

    match column_kind(column) {
        Some(ColumnKind::Float) => value
            .parse::<f64>()
            .map(FeatureValue::Float)
            .map_err(|_| not_numeric()),
        Some(ColumnKind::Integer) => value
            .parse::<i64>()
            .map(FeatureValue::Integer)
            .map_err(|_| not_numeric()),
        _ => Ok(FeatureValue::Category(value.to_string())),
    }
}

/// Inclusive bounds of a numeric column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NumericRange {
    pub min: f64,
    pub max: f64,
}

impl NumericRange {
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

impl Dataset {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows removed because a feature was missing.
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    pub fn rows(&self) -> &[Applicant] {
        &self.rows
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Rows paired with their labels.
    pub fn records(&self) -> impl Iterator<Item = (&Applicant, &str)> {
        self.rows
            .iter()
            .zip(&self.labels)
            .map(|(row, label)| (row, label.as_str()))
    }

    /// First cleaned row, used as form defaults.
    pub fn first_row(&self) -> &Applicant {
        &self.rows[0]
    }

    /// Min and max of a numeric column.
    pub fn numeric_range(&self, column: &str) -> Option<NumericRange> {
        let mut values = self
            .rows
            .iter()
            .filter_map(|row| row.get(column).and_then(FeatureValue::as_f64));
        let first = values.next()?;
        let (min, max) = values.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v)));
        Some(NumericRange { min, max })
    }

    /// Distinct values of a categorical column in order of first appearance.
    pub fn unique_values(&self, column: &str) -> Vec<String> {
        let mut seen = Vec::new();
        for row in &self.rows {
            if let Some(value) = row.get(column).and_then(FeatureValue::as_category) {
                if !seen.iter().any(|s: &String| s == value) {
                    seen.push(value.to_string());
                }
            }
        }
        seen
    }
}

/// Process-wide memo of cleaned datasets keyed by path and missing token.
#[derive(Default)]
pub struct DatasetCache {
    entries: RwLock<HashMap<(PathBuf, String), Arc<Dataset>>>,
}

impl DatasetCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load and clean the file once per token; later calls return the same dataset.
    pub fn get_or_load<P: AsRef<Path>>(
        &self,
        path: P,
        missing_token: &str,
    ) -> Result<Arc<Dataset>, DataError> {
        let key = (path.as_ref().to_path_buf(), missing_token.to_string());

        if let Ok(entries) = self.entries.read() {
            if let Some(dataset) = entries.get(&key) {
                debug!(path = %key.0.display(), token = %key.1, "Dataset cache hit");
                return Ok(dataset.clone());
            }
        }

        let dataset = Arc::new(preprocess_data(&load_data(&key.0)?, missing_token)?);
        if let Ok(mut entries) = self.entries.write() {
            entries.insert(key, dataset.clone());
        }
        Ok(dataset)
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
