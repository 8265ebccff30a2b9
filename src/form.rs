//! Applicant input form.
//!
//! One field per feature column, built from the cleaned dataset: numeric
//! columns become bounded inputs over the observed range with the first
//! row as default, categorical columns become a choice among the observed
//! values. The form can be filled interactively on a terminal or from
//! `Column=value` overrides and JSON documents.

use crate::dataset::Dataset;
use crate::error::FormError;
use crate::schema::{column_kind, ColumnKind, FEATURE_COLUMNS};
use crate::types::applicant::{Applicant, FeatureValue};
use dialoguer::{Input, Select};
use serde_json::Value;
use tracing::debug;

/// Widget and bounds for one field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    Integer { min: i64, max: i64, default: i64 },
    Float { min: f64, max: f64, default: f64 },
    Choice {
        options: Vec<String>,
        default: usize,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct FormField {
    pub column: String,
    pub kind: FieldKind,
}

impl FormField {
    pub fn label(&self) -> String {
        format!("Please enter {} value for customer:", self.column)
    }

    pub fn default_value(&self) -> FeatureValue {
        match &self.kind {
            FieldKind::Integer { default, .. } => FeatureValue::Integer(*default),
            FieldKind::Float { default, .. } => FeatureValue::Float(*default),
            FieldKind::Choice { options, default } => {
                FeatureValue::Category(options.get(*default).cloned().unwrap_or_default())
            }
        }
    }

    /// Parse and validate text input for this field.
    pub fn parse(&self, raw: &str) -> Result<FeatureValue, FormError> {
        let raw = raw.trim();
        let not_numeric = || FormError::NotNumeric {
            column: self.column.clone(),
            value: raw.to_string(),
        };

        let value = match &self.kind {
            FieldKind::Integer { .. } => {
                FeatureValue::Integer(raw.parse::<i64>().map_err(|_| not_numeric())?)
            }
            FieldKind::Float { .. } => {
                FeatureValue::Float(raw.parse::<f64>().map_err(|_| not_numeric())?)
            }
            FieldKind::Choice { .. } => FeatureValue::Category(raw.to_string()),
        };
        self.validate(&value)?;
        Ok(value)
    }

    /// Parse a JSON value for this field.
    pub fn parse_json(&self, value: &Value) -> Result<FeatureValue, FormError> {
        let parsed = match (&self.kind, value) {
            (_, Value::String(s)) => return self.parse(s),
            (FieldKind::Integer { .. }, Value::Number(n)) => {
                FeatureValue::Integer(n.as_i64().ok_or_else(|| FormError::NotNumeric {
                    column: self.column.clone(),
                    value: n.to_string(),
                })?)
            }
            (FieldKind::Float { .. }, Value::Number(n)) => {
                FeatureValue::Float(n.as_f64().ok_or_else(|| FormError::NotNumeric {
                    column: self.column.clone(),
                    value: n.to_string(),
                })?)
            }
            (_, other) => return self.parse(&other.to_string()),
        };
        self.validate(&parsed)?;
        Ok(parsed)
    }

    pub fn validate(&self, value: &FeatureValue) -> Result<(), FormError> {
        match (&self.kind, value) {
            (FieldKind::Integer { min, max, .. }, FeatureValue::Integer(v)) => {
                if v < min || v > max {
                    return Err(self.out_of_range(*v as f64, *min as f64, *max as f64));
                }
            }
            (FieldKind::Float { min, max, .. }, FeatureValue::Float(v)) => {
                if !(v >= min && v <= max) {
                    return Err(self.out_of_range(*v, *min, *max));
                }
            }
            (FieldKind::Choice { options, .. }, FeatureValue::Category(v)) => {
                if !options.contains(v) {
                    return Err(FormError::UnknownOption {
                        column: self.column.clone(),
                        value: v.clone(),
                    });
                }
            }
            (_, other) => {
                return Err(FormError::NotNumeric {
                    column: self.column.clone(),
                    value: other.to_string(),
                })
            }
        }
        Ok(())
    }

    fn out_of_range(&self, value: f64, min: f64, max: f64) -> FormError {
        FormError::OutOfRange {
            column: self.column.clone(),
            value,
            min,
            max,
        }
    }

    /// Ask for this field on the terminal.
    fn prompt(&self) -> Result<FeatureValue, FormError> {
        let prompt_err = |e: dialoguer::Error| FormError::Prompt(e.to_string());

        match &self.kind {
            FieldKind::Integer { min, max, default } => {
                let (min, max) = (*min, *max);
                let value = Input::<i64>::new()
                    .with_prompt(format!("{} [{}-{}]", self.label(), min, max))
                    .default(*default)
                    .validate_with(|v: &i64| -> Result<(), String> {
                        if *v < min || *v > max {
                            return Err(format!("Enter a value between {} and {}", min, max));
                        }
                        Ok(())
                    })
                    .interact_text()
                    .map_err(prompt_err)?;
                Ok(FeatureValue::Integer(value))
            }
            FieldKind::Float { min, max, default } => {
                let (min, max) = (*min, *max);
                let value = Input::<f64>::new()
                    .with_prompt(format!("{} [{}-{}]", self.label(), min, max))
                    .default(*default)
                    .validate_with(|v: &f64| -> Result<(), String> {
                        if !(*v >= min && *v <= max) {
                            return Err(format!("Enter a value between {} and {}", min, max));
                        }
                        Ok(())
                    })
                    .interact_text()
                    .map_err(prompt_err)?;
                Ok(FeatureValue::Float(value))
            }
            FieldKind::Choice { options, default } => {
                let choice = Select::new()
                    .with_prompt(self.label())
                    .items(options)
                    .default(*default)
                    .interact()
                    .map_err(prompt_err)?;
                Ok(FeatureValue::Category(options[choice].clone()))
            }
        }
    }
}

/// The applicant form.
#[derive(Debug, Clone, PartialEq)]
pub struct ApplicantForm {
    fields: Vec<FormField>,
}

impl ApplicantForm {
    /// Build one field per feature column from the cleaned dataset.
    pub fn from_dataset(dataset: &Dataset) -> Self {
        let first = dataset.first_row();
        let mut fields = Vec::with_capacity(FEATURE_COLUMNS.len());

        for column in FEATURE_COLUMNS {
            let default = first.get(column).and_then(FeatureValue::as_f64);
            let kind = match (column_kind(column), dataset.numeric_range(column)) {
                (Some(ColumnKind::Integer), Some(range)) => FieldKind::Integer {
                    min: range.min as i64,
                    max: range.max as i64,
                    default: default.unwrap_or(range.min) as i64,
                },
                (Some(ColumnKind::Float), Some(range)) => FieldKind::Float {
                    min: range.min,
                    max: range.max,
                    default: default.unwrap_or(range.min),
                },
                _ => FieldKind::Choice {
                    options: dataset.unique_values(column),
                    default: 0,
                },
            };
            fields.push(FormField {
                column: column.to_string(),
                kind,
            });
        }

        debug!(fields = fields.len(), "Built applicant form");
        Self { fields }
    }

    pub fn fields(&self) -> &[FormField] {
        &self.fields
    }

    pub fn field(&self, column: &str) -> Option<&FormField> {
        self.fields.iter().find(|f| f.column == column)
    }

    /// The applicant the form shows before any input.
    pub fn defaults(&self) -> Applicant {
        let mut applicant = Applicant::new();
        for field in &self.fields {
            applicant.push(field.column.clone(), field.default_value());
        }
        applicant
    }

    /// Start from the defaults and apply `(column, value)` overrides.
    pub fn fill<K, V>(&self, overrides: &[(K, V)]) -> Result<Applicant, FormError>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut applicant = self.defaults();
        self.apply_overrides(&mut applicant, overrides)?;
        Ok(applicant)
    }

    /// Parse and set each `(column, value)` override on an existing applicant.
    pub fn apply_overrides<K, V>(
        &self,
        applicant: &mut Applicant,
        overrides: &[(K, V)],
    ) -> Result<(), FormError>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        for (column, raw) in overrides {
            let field = self.require(column.as_ref())?;
            applicant.set(&field.column, field.parse(raw.as_ref())?);
        }
        Ok(())
    }

    /// Start from the defaults and apply the fields of a JSON object.
    pub fn fill_from_json(&self, document: &Value) -> Result<Applicant, FormError> {
        let object = document.as_object().ok_or(FormError::NotAnObject)?;
        let mut applicant = self.defaults();
        for (column, value) in object {
            let field = self.require(column)?;
            applicant.set(&field.column, field.parse_json(value)?);
        }
        Ok(applicant)
    }

    /// Prompt for every field on the terminal.
    pub fn prompt(&self) -> Result<Applicant, FormError> {
        let mut applicant = Applicant::new();
        for field in &self.fields {
            applicant.push(field.column.clone(), field.prompt()?);
        }
        Ok(applicant)
    }

    fn require(&self, column: &str) -> Result<&FormField, FormError> {
        self.field(column)
            .ok_or_else(|| FormError::UnknownField(column.to_string()))
    }
}

/// Parse a `Column=value` override.
pub fn parse_override(raw: &str) -> Result<(String, String), FormError> {
    match raw.split_once('=') {
        Some((column, value)) if !column.trim().is_empty() => {
            Ok((column.trim().to_string(), value.trim().to_string()))
        }
        _ => Err(FormError::MalformedOverride(raw.to_string())),
    }
}
