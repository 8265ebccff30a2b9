//! End-to-end checks of the library against the bundled fixture data.

use credit_approval::config::AppConfig;
use credit_approval::dataset::DatasetCache;
use credit_approval::types::Verdict;
use credit_approval::{load_data, preprocess_data, ApprovalApp, FeatureValue};
use std::path::PathBuf;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn fixture_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.data.path = fixture("cc_approvals.data").display().to_string();
    config.artifacts.model_path = fixture("cc_model.json").display().to_string();
    config.artifacts.encoders_path = fixture("cc_label_encoders.json").display().to_string();
    config
}

fn fixture_app() -> ApprovalApp {
    let cache = DatasetCache::new();
    ApprovalApp::load(fixture_config(), &cache).unwrap()
}

#[test]
fn test_preprocess_drops_missing_feature_rows() {
    let raw = load_data(fixture("cc_approvals.data")).unwrap();
    assert_eq!(raw.len(), 14);

    let dataset = preprocess_data(&raw, "?").unwrap();
    // The row with '?' only in ZipCode survives.
    assert_eq!(dataset.len(), 11);
    assert_eq!(dataset.dropped(), 3);
    let age = dataset.first_row().get("Age");
    assert_eq!(age, Some(&FeatureValue::Float(30.83)));
}

#[test]
fn test_default_applicant_is_approved() {
    let app = fixture_app();
    let applicant = app.form().defaults();
    let decision = app.decide(&applicant).unwrap();

    assert!((decision.probability - 0.9298).abs() < 1e-3);
    assert_eq!(decision.verdict, Verdict::Approve);
    assert_eq!(decision.predicted_label, "+");
}

#[test]
fn test_prior_default_flip_rejects() {
    let app = fixture_app();
    let applicant = app.form().fill(&[("PriorDefault", "f")]).unwrap();
    let decision = app.decide(&applicant).unwrap();

    assert!(decision.probability < 0.5);
    assert_eq!(decision.verdict, Verdict::Reject);
    assert_eq!(app.metrics().rejections(), 1);
}

#[test]
fn test_form_rejects_unseen_option() {
    let app = fixture_app();
    assert!(app.form().fill(&[("Citizen", "s")]).is_err());
    assert!(app.form().fill(&[("Age", "99")]).is_err());
}

#[test]
fn test_group_charts() {
    let app = fixture_app();
    let group_charts = app.group_charts().unwrap();
    assert_eq!(group_charts.len(), 2);

    let gender = &group_charts[0];
    assert_eq!(gender.title, "Approval Ratio per Gender");
    assert_eq!(gender.bars.len(), 2);
    assert_eq!(gender.bars[0].label, "a");
    assert!((gender.bars[0].value - 0.75).abs() < 1e-12);
    assert!((gender.bars[1].value - 3.0 / 7.0).abs() < 1e-12);

    // 'bb' has no approved rows and is left out.
    let ethnicity = &group_charts[1];
    let labels: Vec<&str> = ethnicity.bars.iter().map(|b| b.label.as_str()).collect();
    assert_eq!(labels, vec!["h", "v"]);
}

#[test]
fn test_feature_importance_chart() {
    let app = fixture_app();
    let chart = app.importance_chart().unwrap();
    assert_eq!(chart.bars.len(), 14);
    assert_eq!(chart.bars[0].label, "PriorDefault");
    assert_eq!(chart.bars[13].label, "Married");
}

#[test]
fn test_evaluate_fixture() {
    let app = fixture_app();
    let result = app.evaluate().unwrap();

    assert_eq!(result.skipped, 0);
    assert_eq!(result.report.total, 11);
    assert!((result.report.accuracy - 9.0 / 11.0).abs() < 1e-9);
    assert!((result.f1 - 6.0 / 7.0).abs() < 1e-9);
}

#[test]
fn test_evaluate_skips_rows_with_unseen_categories() {
    let dir = tempfile::tempdir().unwrap();
    let encoders_path = dir.path().join("encoders.json");
    let source = fixture("cc_label_encoders.json");
    let text = std::fs::read_to_string(&source).unwrap();
    let mut encoders: serde_json::Value = serde_json::from_str(&text).unwrap();
    // Ethnicity without 'h'.
    let ethnicity = ["bb", "dd", "ff", "j", "n", "o", "v", "z"];
    encoders["Ethnicity"]["classes"] = serde_json::json!(ethnicity);
    std::fs::write(&encoders_path, encoders.to_string()).unwrap();

    let mut config = fixture_config();
    config.artifacts.encoders_path = encoders_path.display().to_string();
    let app = ApprovalApp::load(config, &DatasetCache::new()).unwrap();
    let result = app.evaluate().unwrap();

    // The four rows with Ethnicity 'h' cannot be encoded.
    assert_eq!(result.skipped, 4);
    assert_eq!(result.report.total, 7);
}

#[test]
fn test_sample_is_reproducible() {
    let app = fixture_app();
    let first: Vec<f64> = app
        .sample(4, Some(7))
        .unwrap()
        .iter()
        .map(|(d, _)| d.probability)
        .collect();
    let second: Vec<f64> = app
        .sample(4, Some(7))
        .unwrap()
        .iter()
        .map(|(d, _)| d.probability)
        .collect();

    assert_eq!(first.len(), 4);
    assert_eq!(first, second);
    assert_eq!(app.sample(50, Some(1)).unwrap().len(), 11);
}

#[test]
fn test_export_charts() {
    let app = fixture_app();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("figures.json");
    app.export_charts(&path).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    let figures: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(figures.as_array().unwrap().len(), 3);
    assert_eq!(
        figures[2]["layout"]["title"]["text"],
        "Feature Importance from Logistic Regression"
    );
}
