//! The approval demo: form, decision and data description.

use crate::charts::{self, BarChart};
use crate::config::AppConfig;
use crate::dataset::{Dataset, DatasetCache};
use crate::evaluation::{self, Evaluation};
use crate::form::ApplicantForm;
use crate::metrics::SessionMetrics;
use crate::models::inference::ApprovalEngine;
use crate::types::applicant::Applicant;
use crate::types::decision::Decision;
use anyhow::{Context, Result};
use dialoguer::Confirm;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Everything one run needs: cleaned data, the form over it and the engine.
pub struct ApprovalApp {
    config: AppConfig,
    dataset: Arc<Dataset>,
    form: ApplicantForm,
    engine: ApprovalEngine,
    metrics: SessionMetrics,
}

impl ApprovalApp {
    /// Load data and artifacts named in the configuration.
    pub fn load(config: AppConfig, cache: &DatasetCache) -> Result<Self> {
        let dataset = cache
            .get_or_load(&config.data.path, &config.data.missing_token)
            .context(format!("Failed to load dataset {}", config.data.path))?;
        let engine = ApprovalEngine::from_config(&config)?;
        let form = ApplicantForm::from_dataset(&dataset);

        info!(
            rows = dataset.len(),
            dropped = dataset.dropped(),
            fields = form.fields().len(),
            "Approval demo ready"
        );

        Ok(Self::new(config, dataset, form, engine))
    }

    pub fn new(
        config: AppConfig,
        dataset: Arc<Dataset>,
        form: ApplicantForm,
        engine: ApprovalEngine,
    ) -> Self {
        Self {
            config,
            dataset,
            form,
            engine,
            metrics: SessionMetrics::new(),
        }
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn form(&self) -> &ApplicantForm {
        &self.form
    }

    pub fn engine(&self) -> &ApprovalEngine {
        &self.engine
    }

    pub fn metrics(&self) -> &SessionMetrics {
        &self.metrics
    }

    /// Predict one applicant and record it in the session metrics.
    pub fn decide(&self, applicant: &Applicant) -> Result<Decision> {
        let start = Instant::now();
        let decision = self.engine.decide(applicant)?;
        self.metrics.record_decision(&decision, start.elapsed());

        info!(
            decision_id = %decision.decision_id,
            probability = decision.probability,
            verdict = %decision.verdict,
            "Applicant scored"
        );
        Ok(decision)
    }

    /// Approval-ratio charts for the configured columns.
    pub fn group_charts(&self) -> Result<Vec<BarChart>> {
        let mut out = Vec::with_capacity(self.config.charts.group_columns.len());
        for column in &self.config.charts.group_columns {
            out.push(charts::approval_ratio_by(
                &self.dataset,
                column,
                self.engine.approved_label(),
            )?);
        }
        Ok(out)
    }

    pub fn importance_chart(&self) -> Option<BarChart> {
        match self.engine.feature_importance() {
            Some(importance) => Some(charts::feature_importance(&importance)),
            None => {
                warn!(
                    model = %self.engine.model_name(),
                    "Model exposes no coefficients, skipping feature importance"
                );
                None
            }
        }
    }

    /// Every chart of the description section, in display order.
    pub fn charts(&self) -> Result<Vec<BarChart>> {
        let mut out = self.group_charts()?;
        out.extend(self.importance_chart());
        Ok(out)
    }

    pub fn evaluate(&self) -> Result<Evaluation> {
        evaluation::evaluate(&self.engine, &self.dataset)
    }

    /// Draw `count` distinct rows at random and score them.
    pub fn sample(&self, count: usize, seed: Option<u64>) -> Result<Vec<(Decision, String)>> {
        let mut rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let amount = count.min(self.dataset.len());
        let indices = rand::seq::index::sample(&mut rng, self.dataset.len(), amount);

        indices
            .iter()
            .map(|i| -> Result<(Decision, String)> {
                let decision = self.decide(&self.dataset.rows()[i])?;
                Ok((decision, self.dataset.labels()[i].clone()))
            })
            .collect()
    }

    /// Print the description section with every chart rendered as text.
    pub fn write_charts<W: Write>(&self, out: &mut W) -> Result<()> {
        let width = self.config.charts.bar_width;

        writeln!(out, "\n== Data Description ==\n")?;
        for chart in self.group_charts()? {
            writeln!(out, "{}", chart.render(width))?;
        }
        if let Some(chart) = self.importance_chart() {
            writeln!(out, "== Feature Importance ==\n")?;
            writeln!(out, "{}", chart.render(width))?;
        }
        Ok(())
    }

    /// Export charts as figure JSON.
    pub fn export_charts<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        charts::export_figures(&self.charts()?, path)
    }

    /// The interactive page on the terminal.
    pub fn run_interactive<W: Write>(&self, out: &mut W) -> Result<()> {
        self.run_session(out, &mut TerminalSource)
    }

    /// Score applicants from `source` until it declines or fails.
    ///
    /// The session summary is logged however the session ends.
    pub fn run_session<W, S>(&self, out: &mut W, source: &mut S) -> Result<()>
    where
        W: Write,
        S: ApplicantSource + ?Sized,
    {
        let result = self.session_loop(out, source);
        if let Err(e) = &result {
            warn!(error = %format!("{:#}", e), "Session ended early");
        }
        self.metrics.print_summary();
        result
    }

    fn session_loop<W, S>(&self, out: &mut W, source: &mut S) -> Result<()>
    where
        W: Write,
        S: ApplicantSource + ?Sized,
    {
        writeln!(out, "Credit Card Approval\n")?;
        loop {
            writeln!(out, "== Credit Card Approval Form ==")?;
            writeln!(out, "Please enter customer data:")?;
            out.flush()?;

            let applicant = source.next_applicant(&self.form)?;
            let decision = self.decide(&applicant)?;
            write_verdict(out, &decision)?;
            self.write_charts(out)?;
            out.flush()?;

            if !source.another()? {
                return Ok(());
            }
        }
    }
}

/// Where an interactive session gets its applicants.
pub trait ApplicantSource {
    fn next_applicant(&mut self, form: &ApplicantForm) -> Result<Applicant>;

    /// Whether to score one more applicant.
    fn another(&mut self) -> Result<bool>;
}

/// Prompts on the terminal.
pub struct TerminalSource;

impl ApplicantSource for TerminalSource {
    fn next_applicant(&mut self, form: &ApplicantForm) -> Result<Applicant> {
        Ok(form.prompt()?)
    }

    fn another(&mut self) -> Result<bool> {
        Confirm::new()
            .with_prompt("Score another applicant?")
            .default(false)
            .interact()
            .map_err(|e| anyhow::anyhow!("prompt failed: {}", e))
    }
}

/// Print the approval indicator.
pub fn write_verdict<W: Write>(out: &mut W, decision: &Decision) -> Result<()> {
    let marker = if decision.approved() { "✔" } else { "✘" };
    writeln!(
        out,
        "\n{} {}  (p = {:.3})",
        marker, decision.verdict, decision.probability
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FormError;
    use std::io;
    use std::path::PathBuf;
    use std::sync::atomic::Ordering;
    use std::sync::Mutex;

    fn fixture(name: &str) -> String {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("tests")
            .join("fixtures")
            .join(name)
            .display()
            .to_string()
    }

    fn app() -> ApprovalApp {
        let mut config = AppConfig::default();
        config.data.path = fixture("cc_approvals.data");
        config.artifacts.model_path = fixture("cc_model.json");
        config.artifacts.encoders_path = fixture("cc_label_encoders.json");
        ApprovalApp::load(config, &DatasetCache::new()).unwrap()
    }

    /// Hands out the form defaults a fixed number of times, then fails.
    struct Scripted {
        remaining: usize,
        more: bool,
    }

    impl ApplicantSource for Scripted {
        fn next_applicant(&mut self, form: &ApplicantForm) -> Result<Applicant> {
            if self.remaining == 0 {
                return Err(FormError::Prompt("interrupted".to_string()).into());
            }
            self.remaining -= 1;
            Ok(form.defaults())
        }

        fn another(&mut self) -> Result<bool> {
            Ok(self.more)
        }
    }

    #[derive(Clone, Default)]
    struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    impl io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl LogBuffer {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    /// Run a session with logs captured; returns (result, stdout, logs).
    fn run(app: &ApprovalApp, source: &mut Scripted) -> (Result<()>, String, String) {
        let logs = LogBuffer::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();

        let mut out = Vec::new();
        let result =
            tracing::subscriber::with_default(subscriber, || app.run_session(&mut out, source));
        let out = String::from_utf8_lossy(&out).into_owned();
        (result, out, logs.contents())
    }

    #[test]
    fn test_session_ends_when_declined() {
        let app = app();
        let mut source = Scripted {
            remaining: 1,
            more: false,
        };

        let (result, out, logs) = run(&app, &mut source);
        assert!(result.is_ok());
        assert!(out.contains("Approve"));
        assert!(out.contains("Approval Ratio per Gender"));
        assert_eq!(app.metrics().predictions.load(Ordering::Relaxed), 1);
        assert!(logs.contains("SESSION SUMMARY"));
    }

    #[test]
    fn test_summary_logged_when_prompt_fails() {
        let app = app();
        let mut source = Scripted {
            remaining: 2,
            more: true,
        };

        let (result, _, logs) = run(&app, &mut source);
        assert!(result.is_err());
        assert_eq!(app.metrics().predictions.load(Ordering::Relaxed), 2);
        assert!(logs.contains("Session ended early"));
        assert!(logs.contains("SESSION SUMMARY"));
    }
}
