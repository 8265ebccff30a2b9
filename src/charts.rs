//! Descriptive charts: approval ratio per group and feature importance.

use crate::dataset::Dataset;
use crate::error::DataError;
use crate::schema::{column_kind, ColumnKind};
use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bar {
    pub label: String,
    pub value: f64,
}

/// A vertical-category bar chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarChart {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub bars: Vec<Bar>,
    /// Give every bar its own colour (one trace per bar when exported)
    pub color_by_label: bool,
    /// Exported figure size in pixels, width then height
    pub size: Option<(u32, u32)>,
}

impl BarChart {
    pub fn new(
        title: impl Into<String>,
        x_label: impl Into<String>,
        y_label: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            x_label: x_label.into(),
            y_label: y_label.into(),
            bars: Vec::new(),
            color_by_label: false,
            size: None,
        }
    }

    pub fn push(&mut self, label: impl Into<String>, value: f64) {
        self.bars.push(Bar {
            label: label.into(),
            value,
        });
    }

    /// Render as horizontal text bars, the longest `width` cells wide.
    pub fn render(&self, width: usize) -> String {
        let mut out = format!("{}\n", self.title);
        if self.bars.is_empty() {
            out.push_str("  (no data)\n");
            return out;
        }

        let label_width = self
            .bars
            .iter()
            .map(|b| b.label.chars().count())
            .max()
            .unwrap_or(0);
        let scale = self
            .bars
            .iter()
            .map(|b| b.value.abs())
            .fold(0.0_f64, f64::max);

        for bar in &self.bars {
            let len = if scale > 0.0 {
                ((bar.value.abs() / scale) * width as f64).round() as usize
            } else {
                0
            };
            let glyph = if bar.value < 0.0 { "░" } else { "█" };
            out.push_str(&format!(
                "  {:<label_width$}  {:<width$}  {:.4}\n",
                bar.label,
                glyph.repeat(len),
                bar.value,
                label_width = label_width,
                width = width,
            ));
        }
        out
    }

    /// Plotly-style figure description.
    pub fn to_figure(&self) -> Value {
        let data: Vec<Value> = if self.color_by_label {
            self.bars
                .iter()
                .map(|b| json!({"type": "bar", "name": b.label, "x": [b.label], "y": [b.value]}))
                .collect()
        } else {
            vec![json!({
                "type": "bar",
                "x": self.bars.iter().map(|b| b.label.as_str()).collect::<Vec<_>>(),
                "y": self.bars.iter().map(|b| b.value).collect::<Vec<_>>(),
            })]
        };

        let mut layout = json!({
            "title": {"text": self.title},
            "xaxis": {"title": {"text": self.x_label}},
            "yaxis": {"title": {"text": self.y_label}},
        });
        if let Some((width, height)) = self.size {
            layout["width"] = json!(width);
            layout["height"] = json!(height);
        }

        json!({"data": data, "layout": layout})
    }
}

/// Share of approved rows per value of a categorical column.
///
/// Groups are ordered by value. A group without a single approved row has
/// no approved count to take a share of and is left out.
pub fn approval_ratio_by(
    dataset: &Dataset,
    column: &str,
    approved_label: &str,
) -> Result<BarChart, DataError> {
    if column_kind(column) != Some(ColumnKind::Categorical) {
        return Err(DataError::NotCategorical {
            column: column.to_string(),
        });
    }

    let mut groups: BTreeMap<&str, (usize, usize)> = BTreeMap::new();
    for (row, label) in dataset.records() {
        if let Some(group) = row.get(column).and_then(|v| v.as_category()) {
            let (approved, total) = groups.entry(group).or_insert((0, 0));
            *total += 1;
            if label == approved_label {
                *approved += 1;
            }
        }
    }

    let title = format!("Approval Ratio per {}", column);
    let mut chart = BarChart::new(title, column, "proportion");
    for (group, (approved, total)) in groups {
        if approved > 0 {
            chart.push(group, approved as f64 / total as f64);
        }
    }
    Ok(chart)
}

/// Features sorted by importance, highest first.
pub fn feature_importance(importance: &[(String, f64)]) -> BarChart {
    let mut sorted = importance.to_vec();
    sorted.sort_by(|a, b| b.1.total_cmp(&a.1));

    let mut chart = BarChart::new(
        "Feature Importance from Logistic Regression",
        "feature",
        "importance",
    );
    for (feature, value) in sorted {
        chart.push(feature, value);
    }
    chart.color_by_label = true;
    chart.size = Some((800, 600));
    chart
}

/// Write all charts as a JSON array of figures.
pub fn export_figures<P: AsRef<Path>>(charts: &[BarChart], path: P) -> Result<()> {
    let path = path.as_ref();
    let figures: Vec<Value> = charts.iter().map(BarChart::to_figure).collect();
    let json = serde_json::to_string_pretty(&figures)?;
    std::fs::write(path, json)
        .context(format!("Failed to write charts to {:?}", path))?;
    info!(path = %path.display(), charts = charts.len(), "Exported chart figures");
    Ok(())
}
