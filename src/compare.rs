//! Cross-model comparison of saved statistics files.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::format::{bar, thousands};
use crate::stats::{ModelReport, StatisticsSnapshot};
use crate::AnalysisError;

/// Default number of instructions in the cross-model table
pub const DEFAULT_TOP_N: usize = 20;

/// Instructions shown in the comparison chart
const CHART_INSTRUCTIONS: usize = 15;

/// Width of model columns; longer names are truncated
const MODEL_COLUMN: usize = 12;

/// Statistics of several models, in load order.
#[derive(Debug, Clone, Default)]
pub struct Comparison {
    models: Vec<(String, StatisticsSnapshot)>,
}

impl Comparison {
    /// Create an empty comparison
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a model. A model already present is replaced in its original slot.
    pub fn insert(&mut self, model: impl Into<String>, stats: StatisticsSnapshot) {
        let model = model.into();
        match self.models.iter_mut().find(|(name, _)| *name == model) {
            Some(slot) => slot.1 = stats,
            None => self.models.push((model, stats)),
        }
    }

    /// Load every readable report in `paths`.
    ///
    /// Missing or malformed files are warned about and skipped. The model key
    /// falls back to the file stem when the report has no name.
    pub fn load<P: AsRef<Path>>(paths: &[P]) -> Result<Self, AnalysisError> {
        let mut comparison = Self::new();

        for path in paths {
            let path = path.as_ref();
            if !path.exists() {
                warn!("File not found: {}", path.display());
                continue;
            }
            let report = match fs::read_to_string(path)
                .map_err(AnalysisError::from)
                .and_then(|json| ModelReport::from_json(&json))
            {
                Ok(report) => report,
                Err(e) => {
                    warn!("Error loading {}: {}", path.display(), e);
                    continue;
                }
            };

            let model = if report.model.is_empty() || report.model == "unknown" {
                file_stem(path)
            } else {
                report.model
            };
            comparison.insert(model, report.statistics);
        }

        if comparison.is_empty() {
            return Err(AnalysisError::NoReports(paths.len()));
        }
        if comparison.len() < 2 {
            warn!("Only one model loaded. Need at least 2 models for comparison.");
        }
        Ok(comparison)
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Models and their statistics, in insertion order
    pub fn models(&self) -> &[(String, StatisticsSnapshot)] {
        &self.models
    }

    /// Instructions by descending total across all models, ties by name
    pub fn instruction_totals(&self) -> Vec<(String, usize)> {
        let mut totals: BTreeMap<&str, usize> = BTreeMap::new();
        for (_, stats) in &self.models {
            for (instruction, count) in &stats.instruction_counts {
                *totals.entry(instruction.as_str()).or_insert(0) += count;
            }
        }

        let mut sorted: Vec<(String, usize)> =
            totals.into_iter().map(|(k, v)| (k.to_string(), v)).collect();
        sorted.sort_by(|a, b| b.1.cmp(&a.1));
        sorted
    }

    /// Summary and top-`top_n` instruction tables
    pub fn render(&self, top_n: usize) -> String {
        let heavy = "=".repeat(80);
        let light = "-".repeat(80);
        let mut out = String::new();

        out.push_str(&format!("{}\nRVV Instruction Usage Comparison\n{}\n\n", heavy, heavy));
        out.push_str(&format!("{:<20} {:<15} {:<15} {:<10}\n", "Model", "Total Instr", "RVV Instr", "RVV %"));
        out.push_str(&format!("{}\n", light));
        for (model, stats) in &self.models {
            out.push_str(&format!(
                "{:<20} {:<15} {:<15} {:<10.2}\n",
                model,
                thousands(stats.total_instructions),
                thousands(stats.target_instructions),
                stats.rvv_percentage().unwrap_or(0.0)
            ));
        }

        out.push_str(&format!("\n{}\nTop RVV Instructions Across All Models\n{}\n\n", heavy, heavy));
        let mut header = format!("{:<15} {:<10}", "Instruction", "Total");
        for (model, _) in &self.models {
            header.push_str(&format!("{:<width$}", truncate(model, MODEL_COLUMN), width = MODEL_COLUMN));
        }
        out.push_str(&header);
        out.push('\n');
        out.push_str(&format!("{}\n", light));

        for (instruction, total) in self.instruction_totals().into_iter().take(top_n) {
            let mut row = format!("{:<15} {:<10}", instruction, thousands(total));
            for (_, stats) in &self.models {
                let count = stats.instruction_counts.get(&instruction).copied().unwrap_or(0);
                row.push_str(&format!("{:<width$}", thousands(count), width = MODEL_COLUMN));
            }
            out.push_str(&row);
            out.push('\n');
        }

        out
    }

    /// Text chart of RVV usage per model and the leading instructions.
    ///
    /// Returns `None` with fewer than two models.
    pub fn render_chart(&self) -> Option<String> {
        if self.models.len() < 2 {
            return None;
        }

        let mut out = String::from("RVV Usage by Model\n");
        for (model, stats) in &self.models {
            let pct = stats.rvv_percentage().unwrap_or(0.0);
            // percent scaled to hundredths so the bar is proportional
            let cells = bar((pct * 100.0).round() as usize, 10_000);
            out.push_str(&format!("{:>20} | {} {:.2}%\n", truncate(model, 20), cells, pct));
        }

        let totals = self.instruction_totals();
        let top: Vec<_> = totals.iter().take(CHART_INSTRUCTIONS).collect();
        let max = self
            .models
            .iter()
            .flat_map(|(_, stats)| top.iter().map(move |(i, _)| stats.instruction_counts.get(i).copied().unwrap_or(0)))
            .max()
            .unwrap_or(0);

        out.push_str("\nRVV Instruction Usage Comparison Across Models\n");
        for (instruction, _) in top {
            out.push_str(&format!("{}\n", instruction));
            for (model, stats) in &self.models {
                let count = stats.instruction_counts.get(instruction).copied().unwrap_or(0);
                out.push_str(&format!("{:>20} | {} {}\n", truncate(model, 20), bar(count, max), count));
            }
        }

        Some(out)
    }

    /// Write the comparison chart as `model_comparison.txt` into `dir`
    pub fn write_chart<P: AsRef<Path>>(&self, dir: P) -> Result<Option<PathBuf>, AnalysisError> {
        let Some(chart) = self.render_chart() else {
            warn!("Need at least 2 models for comparison chart");
            return Ok(None);
        };

        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;
        let path = dir.join("model_comparison.txt");
        fs::write(&path, chart)?;
        info!("Model comparison chart saved to: {}", path.display());
        Ok(Some(path))
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.render(DEFAULT_TOP_N))
    }
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "unknown".to_string())
}
