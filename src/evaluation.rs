//! Scoring the loaded model against the labelled dataset.

use crate::dataset::Dataset;
use crate::models::inference::ApprovalEngine;
use anyhow::Result;
use std::fmt;
use tracing::{info, warn};

/// Precision, recall and F1 for one class.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassMetrics {
    pub label: String,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Averages {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

/// Per-class metrics with accuracy and averages.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationReport {
    pub classes: Vec<ClassMetrics>,
    pub accuracy: f64,
    pub macro_avg: Averages,
    pub weighted_avg: Averages,
    pub total: usize,
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

fn harmonic(precision: f64, recall: f64) -> f64 {
    if precision + recall == 0.0 {
        0.0
    } else {
        2.0 * precision * recall / (precision + recall)
    }
}

fn class_metrics(actual: &[String], predicted: &[String], label: &str) -> ClassMetrics {
    let mut true_positive = 0;
    let mut predicted_positive = 0;
    let mut support = 0;

    for (a, p) in actual.iter().zip(predicted) {
        let is_actual = a == label;
        let is_predicted = p == label;
        if is_actual {
            support += 1;
        }
        if is_predicted {
            predicted_positive += 1;
        }
        if is_actual && is_predicted {
            true_positive += 1;
        }
    }

    let precision = ratio(true_positive, predicted_positive);
    let recall = ratio(true_positive, support);
    ClassMetrics {
        label: label.to_string(),
        precision,
        recall,
        f1: harmonic(precision, recall),
        support,
    }
}

/// Build a report over `labels`; undefined ratios count as zero.
pub fn classification_report(
    actual: &[String],
    predicted: &[String],
    labels: &[String],
) -> ClassificationReport {
    let total = actual.len().min(predicted.len());
    let classes: Vec<ClassMetrics> = labels
        .iter()
        .map(|label| class_metrics(&actual[..total], &predicted[..total], label))
        .collect();

    let correct = actual.iter().zip(predicted).filter(|(a, p)| a == p).count();

    let n = classes.len().max(1) as f64;
    let macro_avg = Averages {
        precision: classes.iter().map(|c| c.precision).sum::<f64>() / n,
        recall: classes.iter().map(|c| c.recall).sum::<f64>() / n,
        f1: classes.iter().map(|c| c.f1).sum::<f64>() / n,
    };

    let support: usize = classes.iter().map(|c| c.support).sum();
    let weighted = |f: fn(&ClassMetrics) -> f64| {
        if support == 0 {
            0.0
        } else {
            let sum: f64 = classes.iter().map(|c| f(c) * c.support as f64).sum();
            sum / support as f64
        }
    };
    let weighted_avg = Averages {
        precision: weighted(|c| c.precision),
        recall: weighted(|c| c.recall),
        f1: weighted(|c| c.f1),
    };

    ClassificationReport {
        accuracy: ratio(correct, total),
        classes,
        macro_avg,
        weighted_avg,
        total,
    }
}

/// F1 score of the positive label.
pub fn f1_score(actual: &[String], predicted: &[String], positive: &str) -> f64 {
    class_metrics(actual, predicted, positive).f1
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:>14} {:>9} {:>9} {:>9} {:>9}",
            "", "precision", "recall", "f1-score", "support"
        )?;
        writeln!(f)?;
        for c in &self.classes {
            writeln!(
                f,
                "{:>14} {:>9.2} {:>9.2} {:>9.2} {:>9}",
                c.label, c.precision, c.recall, c.f1, c.support
            )?;
        }
        writeln!(f)?;
        writeln!(
            f,
            "{:>14} {:>9} {:>9} {:>9.2} {:>9}",
            "accuracy", "", "", self.accuracy, self.total
        )?;
        let averages = [
            ("macro avg", &self.macro_avg),
            ("weighted avg", &self.weighted_avg),
        ];
        for (name, avg) in averages {
            writeln!(
                f,
                "{:>14} {:>9.2} {:>9.2} {:>9.2} {:>9}",
                name, avg.precision, avg.recall, avg.f1, self.total
            )?;
        }
        Ok(())
    }
}

/// Result of scoring the whole dataset.
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub report: ClassificationReport,
    /// F1 of the approved label
    pub f1: f64,
    /// Rows the encoders or model could not handle
    pub skipped: usize,
}

/// Predict every row of the dataset and compare with its label.
pub fn evaluate(engine: &ApprovalEngine, dataset: &Dataset) -> Result<Evaluation> {
    let mut actual = Vec::with_capacity(dataset.len());
    let mut predicted = Vec::with_capacity(dataset.len());
    let mut skipped = 0;

    for (i, (row, label)) in dataset.records().enumerate() {
        match engine.predict(row) {
            Ok(prediction) => {
                actual.push(label.to_string());
                predicted.push(prediction.label);
            }
            Err(e) => {
                warn!(row = i, error = %format!("{:#}", e), "Skipping row");
                skipped += 1;
            }
        }
    }

    let mut labels: Vec<String> = actual.iter().chain(&predicted).cloned().collect();
    labels.sort();
    labels.dedup();

    let report = classification_report(&actual, &predicted, &labels);
    let f1 = f1_score(&actual, &predicted, engine.approved_label());

    info!(
        rows = report.total,
        skipped,
        accuracy = report.accuracy,
        f1,
        "Evaluation complete"
    );

    Ok(Evaluation {
        report,
        f1,
        skipped,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(raw: &str) -> Vec<String> {
        raw.chars().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_classification_report() {
        let actual = labels("+++++-----+");
        let predicted = labels("+++++-++--+");
        let report = classification_report(&actual, &predicted, &labels("+-"));

        let positive = &report.classes[0];
        assert_eq!(positive.support, 6);
        assert!((positive.precision - 0.75).abs() < 1e-12);
        assert!((positive.recall - 1.0).abs() < 1e-12);
        assert!((positive.f1 - 6.0 / 7.0).abs() < 1e-12);

        let negative = &report.classes[1];
        assert_eq!(negative.support, 5);
        assert!((negative.precision - 1.0).abs() < 1e-12);
        assert!((negative.recall - 0.6).abs() < 1e-12);

        assert!((report.accuracy - 9.0 / 11.0).abs() < 1e-12);
        assert!((report.macro_avg.recall - 0.8).abs() < 1e-12);
        assert_eq!(report.total, 11);
    }

    #[test]
    fn test_zero_division_counts_as_zero() {
        let actual = labels("--");
        let predicted = labels("--");
        assert_eq!(f1_score(&actual, &predicted, "+"), 0.0);
    }

    #[test]
    fn test_report_display() {
        let report = classification_report(&labels("+-"), &labels("+-"), &labels("+-"));
        let text = report.to_string();
        assert!(text.contains("precision"));
        assert!(text.contains("accuracy"));
        assert!(text.contains("weighted avg"));
    }
}
