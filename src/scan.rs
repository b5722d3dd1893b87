//! Batch analysis of a directory of compiled models.
//!
//! Expected layout, one level deep:
//!
//! ```text
//! models/
//! ├── Bird/
//! │   ├── bird.mlir
//! │   └── bird/OUTPUT/bird.adx
//! └── YOLOv5n/
//!     ├── yolov5n.tosa.mlir
//!     └── yolov5n.tosa/OUTPUT/yolov5n.tosa.adx
//! ```
//!
//! Each `.mlir` file marks a model; its binary is looked up next to it. Models
//! are analyzed in parallel, each with its own parser and counters. A model
//! that fails is recorded as skipped and the batch carries on.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use log::{info, warn};
use rayon::prelude::*;

use crate::format::write_model_chart;
use crate::objdump::ObjdumpConfig;
use crate::stats::{ModelReport, StatisticsSnapshot};
use crate::{analyze_binary, AnalysisError};

/// A model discovered in the scan directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelCandidate {
    /// Model name, the `.mlir` file stem
    pub name: String,
    /// The `.mlir` file that marked the model
    pub source: PathBuf,
    /// Expected location of the compiled binary
    pub binary: PathBuf,
}

impl ModelCandidate {
    /// Derive the candidate for `<dir>/<stem>.mlir`.
    pub fn from_source(source: &Path) -> Option<Self> {
        let name = source.file_stem()?.to_str()?.to_string();
        let dir = source.parent()?;
        let binary = dir.join(&name).join("OUTPUT").join(format!("{}.adx", name));
        Some(Self {
            name,
            source: source.to_path_buf(),
            binary,
        })
    }

    /// Where the statistics JSON for this model is written
    pub fn json_path(&self) -> PathBuf {
        self.output_dir().join(format!("{}_rvv_stats.json", self.name))
    }

    /// Directory holding the binary, used for all generated files
    pub fn output_dir(&self) -> PathBuf {
        self.binary
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

/// Options applied to every model in a batch
#[derive(Debug, Clone, Default)]
pub struct ScanOptions {
    /// Disassembler and section/function filters
    pub objdump: ObjdumpConfig,
    /// Write a chart next to each statistics file
    pub visualize: bool,
}

/// A successfully analyzed model.
#[derive(Debug, Clone)]
pub struct AnalyzedModel {
    pub name: String,
    pub binary: PathBuf,
    pub json_path: PathBuf,
    pub chart_path: Option<PathBuf>,
    pub statistics: StatisticsSnapshot,
}

/// A model that could not be analyzed, with the reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedModel {
    pub name: String,
    pub reason: String,
}

/// Outcome of a batch scan.
#[derive(Debug, Clone, Default)]
pub struct ScanSummary {
    /// Number of models discovered
    pub found: usize,
    pub analyzed: Vec<AnalyzedModel>,
    pub skipped: Vec<SkippedModel>,
}

impl fmt::Display for ScanSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "=".repeat(60);
        writeln!(f, "{}", rule)?;
        writeln!(f, "Batch Analysis Summary")?;
        writeln!(f, "{}", rule)?;
        writeln!(f, "Total models found:    {}", self.found)?;
        writeln!(f, "Successfully analyzed: {}", self.analyzed.len())?;
        writeln!(f, "Skipped:               {}", self.skipped.len())?;
        for skipped in &self.skipped {
            writeln!(f, "  - {}: {}", skipped.name, skipped.reason)?;
        }
        write!(f, "{}", rule)
    }
}

/// Find all model candidates directly below `root`, sorted by source path.
pub fn find_models<P: AsRef<Path>>(root: P) -> Result<Vec<ModelCandidate>, AnalysisError> {
    let root = root.as_ref();
    if !root.is_dir() {
        return Err(AnalysisError::InputNotFound(root.to_path_buf()));
    }

    let mut sources = Vec::new();
    for entry in fs::read_dir(root)? {
        let subdir = entry?.path();
        if !subdir.is_dir() {
            continue;
        }
        for file in fs::read_dir(&subdir)? {
            let path = file?.path();
            let is_mlir = path.extension().and_then(|e| e.to_str()) == Some("mlir");
            if is_mlir && path.is_file() {
                sources.push(path);
            }
        }
    }
    sources.sort();

    Ok(sources
        .iter()
        .filter_map(|source| ModelCandidate::from_source(source))
        .collect())
}

/// Analyze one model and persist its statistics.
pub fn analyze_model(
    candidate: &ModelCandidate,
    options: &ScanOptions,
) -> Result<AnalyzedModel, AnalysisError> {
    let statistics = analyze_binary(&candidate.binary, &options.objdump)?;
    let report = ModelReport::new(candidate.name.clone(), statistics);

    let json_path = candidate.json_path();
    report.save_json(&json_path)?;

    let chart_path = if options.visualize {
        write_model_chart(&report, candidate.output_dir())?
    } else {
        None
    };

    Ok(AnalyzedModel {
        name: candidate.name.clone(),
        binary: candidate.binary.clone(),
        json_path,
        chart_path,
        statistics: report.statistics,
    })
}

/// Scan `root` for models and analyze each of them.
pub fn scan_models<P: AsRef<Path>>(
    root: P,
    options: &ScanOptions,
) -> Result<ScanSummary, AnalysisError> {
    let start = Instant::now();
    let candidates = find_models(root.as_ref())?;

    if candidates.is_empty() {
        warn!("No .mlir files found in {}", root.as_ref().display());
        return Ok(ScanSummary::default());
    }
    info!("Found {} model(s) to analyze", candidates.len());

    let outcomes: Vec<Result<AnalyzedModel, SkippedModel>> = candidates
        .par_iter()
        .map(|candidate| {
            if !candidate.binary.exists() {
                warn!("Skipping {}: {} not found", candidate.name, candidate.binary.display());
                return Err(SkippedModel {
                    name: candidate.name.clone(),
                    reason: format!("binary not found: {}", candidate.binary.display()),
                });
            }

            info!("Analyzing {}: {}", candidate.name, candidate.binary.display());
            analyze_model(candidate, options).map_err(|e| {
                // objdump stderr usually ends in a newline
                let reason = e.to_string().trim_end().to_string();
                warn!("Error analyzing {}: {}", candidate.name, reason);
                SkippedModel {
                    name: candidate.name.clone(),
                    reason,
                }
            })
        })
        .collect();

    let mut summary = ScanSummary {
        found: candidates.len(),
        ..Default::default()
    };
    for outcome in outcomes {
        match outcome {
            Ok(model) => {
                info!(
                    "Complete: {} ({} RVV instructions)",
                    model.name, model.statistics.target_instructions
                );
                summary.analyzed.push(model);
            }
            Err(skipped) => summary.skipped.push(skipped),
        }
    }

    info!("Batch scan finished in {:?}", start.elapsed());
    Ok(summary)
}
