//! Credit Card Approval - Main Entry Point
//!
//! Loads the applications file and model artifacts, then either runs the
//! interactive form or one of the scripted commands.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use credit_approval::{
    app::{write_verdict, ApprovalApp},
    config::{AppConfig, LoggingConfig},
    dataset::DatasetCache,
    form::parse_override,
};
use std::io::Write;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "credit-approval",
    about = "Credit card approval demo: applicant form, prediction and data description",
    version
)]
struct Cli {
    /// Configuration file (defaults to config/config.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fill the applicant form interactively (default)
    Form,
    /// Score one applicant given on the command line
    Predict {
        /// Override a form field, e.g. --set Age=31.5 (repeatable)
        #[arg(long = "set", value_name = "COLUMN=VALUE", value_parser = parse_override)]
        overrides: Vec<(String, String)>,
        /// JSON object with field values, applied before --set
        #[arg(long)]
        applicant: Option<PathBuf>,
        /// Print the decision as JSON
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Print the data description charts
    Charts {
        /// Also write plotly figure JSON to this file
        #[arg(long)]
        export: Option<PathBuf>,
    },
    /// Score the whole dataset and print a classification report
    Evaluate,
    /// Score applicants drawn at random from the dataset
    Sample {
        #[arg(long, default_value_t = 5)]
        count: usize,
        #[arg(long)]
        seed: Option<u64>,
    },
}

fn init_tracing(logging: &LoggingConfig, verbosity: u8) -> Result<()> {
    let level = match verbosity {
        0 => logging.level.as_str(),
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::from_default_env()
        .add_directive(format!("credit_approval={}", level).parse()?);

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if logging.format == "json" {
        builder.json().init();
    } else {
        builder.init();
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    init_tracing(&config.logging, cli.verbose)?;
    info!(
        data = %config.data.path,
        model = %config.artifacts.model_path,
        backend = ?config.artifacts.backend,
        threshold = config.prediction.threshold,
        "Configuration loaded"
    );

    let cache = DatasetCache::new();
    let app = ApprovalApp::load(config, &cache)?;
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match cli.command.unwrap_or(Command::Form) {
        Command::Form => app.run_interactive(&mut out)?,
        Command::Predict {
            overrides,
            applicant,
            json,
        } => {
            let mut filled = match applicant {
                Some(path) => {
                    let text = std::fs::read_to_string(&path)
                        .context(format!("Failed to read applicant from {:?}", path))?;
                    let document: serde_json::Value = serde_json::from_str(&text)
                        .context("Applicant file is not valid JSON")?;
                    app.form().fill_from_json(&document)?
                }
                None => app.form().defaults(),
            };
            app.form().apply_overrides(&mut filled, &overrides)?;

            let decision = app.decide(&filled)?;
            if json {
                writeln!(out, "{}", serde_json::to_string_pretty(&decision)?)?;
            } else {
                write_verdict(&mut out, &decision)?;
            }
        }
        Command::Charts { export } => {
            app.write_charts(&mut out)?;
            if let Some(path) = export {
                app.export_charts(&path)?;
                writeln!(out, "Figures written to {}", path.display())?;
            }
        }
        Command::Evaluate => {
            let evaluation = app.evaluate()?;
            writeln!(out, "{}", evaluation.report)?;
            writeln!(
                out,
                "F1 ({}): {:.4}   skipped rows: {}",
                app.engine().approved_label(),
                evaluation.f1,
                evaluation.skipped
            )?;
        }
        Command::Sample { count, seed } => {
            for (decision, actual) in app.sample(count, seed)? {
                writeln!(
                    out,
                    "{:<8} p={:.3}  predicted {}  actual {}",
                    decision.verdict.to_string(),
                    decision.probability,
                    decision.predicted_label,
                    actual
                )?;
            }
            app.metrics().print_summary();
        }
    }

    Ok(())
}
