//! Instruction counters and the persisted per-model report.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use log::info;
use serde::{Deserialize, Serialize};

use crate::classifier::{self, InstructionFamily};
use crate::AnalysisError;

/// Aggregated result of one analysis run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatisticsSnapshot {
    /// Every recognized instruction line, vector and scalar
    pub total_instructions: usize,
    /// Instructions matching the RVV catalog
    #[serde(rename = "rvv_instructions")]
    pub target_instructions: usize,
    /// RVV mnemonic -> occurrences
    #[serde(default, alias = "instruction_stats")]
    pub instruction_counts: BTreeMap<String, usize>,
    /// Section name -> RVV occurrences
    #[serde(default, alias = "section_stats")]
    pub section_counts: BTreeMap<String, usize>,
}

impl StatisticsSnapshot {
    /// Share of RVV instructions in percent, or `None` for an empty stream
    pub fn rvv_percentage(&self) -> Option<f64> {
        if self.total_instructions == 0 {
            None
        } else {
            Some(self.target_instructions as f64 / self.total_instructions as f64 * 100.0)
        }
    }

    /// Mnemonics by descending count
    pub fn sorted_instructions(&self) -> Vec<(&str, usize)> {
        sort_by_count(&self.instruction_counts)
    }

    /// Sections by descending count
    pub fn sorted_sections(&self) -> Vec<(&str, usize)> {
        sort_by_count(&self.section_counts)
    }

    /// RVV occurrences grouped by instruction family.
    ///
    /// Mnemonics that no longer classify (e.g. from a hand-edited report) are
    /// left out.
    pub fn family_counts(&self) -> BTreeMap<InstructionFamily, usize> {
        let mut families = BTreeMap::new();
        for (mnemonic, count) in &self.instruction_counts {
            if let Some(family) = classifier::family_of(mnemonic) {
                *families.entry(family).or_insert(0) += count;
            }
        }
        families
    }

    /// Check the counter invariants: both maps sum to the RVV total, which
    /// never exceeds the overall total.
    pub fn is_consistent(&self) -> bool {
        let by_instruction: usize = self.instruction_counts.values().sum();
        let by_section: usize = self.section_counts.values().sum();
        by_instruction == self.target_instructions
            && by_section == self.target_instructions
            && self.target_instructions <= self.total_instructions
    }
}

fn sort_by_count(counts: &BTreeMap<String, usize>) -> Vec<(&str, usize)> {
    let mut sorted: Vec<(&str, usize)> = counts.iter().map(|(k, v)| (k.as_str(), *v)).collect();
    // BTreeMap iteration is already name-ordered, so a stable sort keeps ties by name
    sorted.sort_by(|a, b| b.1.cmp(&a.1));
    sorted
}

/// Incremental counter fed by the disassembly parser.
#[derive(Debug, Default)]
pub struct Aggregator {
    stats: StatisticsSnapshot,
}

impl Aggregator {
    /// Create an empty aggregator
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one instruction occurrence.
    pub fn record(&mut self, mnemonic: &str, section: &str) {
        self.stats.total_instructions += 1;

        if classifier::is_target_instruction(mnemonic) {
            self.stats.target_instructions += 1;
            *self.stats.instruction_counts.entry(mnemonic.to_string()).or_insert(0) += 1;
            *self.stats.section_counts.entry(section.to_string()).or_insert(0) += 1;
        }
    }

    /// Current counters; the aggregator keeps counting afterwards.
    pub fn snapshot(&self) -> StatisticsSnapshot {
        self.stats.clone()
    }

    /// Consume the aggregator and return its final counters
    pub fn into_snapshot(self) -> StatisticsSnapshot {
        self.stats
    }
}

/// Statistics tagged with the model (or binary) they describe.
///
/// This is the unit written to and read from `*_rvv_stats.json` files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelReport {
    /// Model name, "unknown" when none could be determined
    #[serde(default = "default_model_name")]
    pub model: String,
    /// Counters for the model
    pub statistics: StatisticsSnapshot,
}

fn default_model_name() -> String {
    "unknown".to_string()
}

impl ModelReport {
    /// Wrap a snapshot with its model name
    pub fn new(model: impl Into<String>, statistics: StatisticsSnapshot) -> Self {
        Self {
            model: model.into(),
            statistics,
        }
    }

    /// Pretty-printed JSON document
    pub fn to_json(&self) -> Result<String, AnalysisError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse a JSON document produced by [`ModelReport::to_json`]
    pub fn from_json(json: &str) -> Result<Self, AnalysisError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Write the report as JSON to `path`
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<(), AnalysisError> {
        let path = path.as_ref();
        fs::write(path, self.to_json()?)?;
        info!("Statistics saved to: {}", path.display());
        Ok(())
    }

    /// Load a report previously written by [`ModelReport::save_json`]
    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self, AnalysisError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(AnalysisError::InputNotFound(path.to_path_buf()));
        }
        Self::from_json(&fs::read_to_string(path)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_aggregator() -> Aggregator {
        let mut agg = Aggregator::new();
        agg.record("auipc", ".text");
        agg.record("addi", ".text");
        agg.record("vsetvli", ".data");
        agg.record("vle32", ".data");
        agg.record("vle32", ".data");
        agg.record("vadd", ".data");
        agg.record("vse32", ".data");
        agg
    }

    #[test]
    fn test_record_counts() {
        let stats = sample_aggregator().snapshot();

        assert_eq!(stats.total_instructions, 7);
        assert_eq!(stats.target_instructions, 5);
        assert_eq!(stats.instruction_counts.get("vle32"), Some(&2));
        assert_eq!(stats.instruction_counts.get("auipc"), None);
        assert_eq!(stats.section_counts.get(".data"), Some(&5));
        assert_eq!(stats.section_counts.get(".text"), None);
        assert!(stats.is_consistent());
    }

    #[test]
    fn test_snapshot_does_not_reset() {
        let mut agg = sample_aggregator();
        let first = agg.snapshot();
        assert_eq!(first, agg.snapshot());

        agg.record("vadd", ".data");
        let second = agg.into_snapshot();
        assert_eq!(second.total_instructions, 8);
        assert_eq!(second.instruction_counts.get("vadd"), Some(&2));
    }

    #[test]
    fn test_sorted_views() {
        let stats = sample_aggregator().snapshot();
        let sorted = stats.sorted_instructions();

        assert_eq!(sorted[0], ("vle32", 2));
        // ties ordered by name
        assert_eq!(&sorted[1..], &[("vadd", 1), ("vse32", 1), ("vsetvli", 1)]);
        assert_eq!(stats.sorted_sections(), vec![(".data", 5)]);
    }

    #[test]
    fn test_percentage_and_families() {
        let stats = sample_aggregator().snapshot();
        let pct = stats.rvv_percentage().unwrap();
        assert!((pct - 500.0 / 7.0).abs() < 1e-9);
        assert_eq!(StatisticsSnapshot::default().rvv_percentage(), None);

        let families = stats.family_counts();
        assert_eq!(families.get(&InstructionFamily::LoadStore), Some(&3));
        assert_eq!(families.get(&InstructionFamily::Arithmetic), Some(&1));
        assert_eq!(families.get(&InstructionFamily::Configuration), Some(&1));
    }

    #[test]
    fn test_inconsistent_snapshot_detected() {
        let mut stats = sample_aggregator().snapshot();
        stats.target_instructions += 1;
        assert!(!stats.is_consistent());
    }

    #[test]
    fn test_report_json_keys() {
        let report = ModelReport::new("bird", sample_aggregator().snapshot());
        let json = report.to_json().unwrap();

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["model"], "bird");
        assert_eq!(value["statistics"]["total_instructions"], 7);
        assert_eq!(value["statistics"]["rvv_instructions"], 5);
        assert_eq!(value["statistics"]["instruction_counts"]["vle32"], 2);
        assert_eq!(value["statistics"]["section_counts"][".data"], 5);

        assert_eq!(ModelReport::from_json(&json).unwrap(), report);
    }

    #[test]
    fn test_report_legacy_keys() {
        let json = r#"{
            "statistics": {
                "total_instructions": 10,
                "rvv_instructions": 3,
                "instruction_stats": {"vadd": 3},
                "section_stats": {".data": 3}
            }
        }"#;
        let report = ModelReport::from_json(json).unwrap();

        assert_eq!(report.model, "unknown");
        assert_eq!(report.statistics.instruction_counts.get("vadd"), Some(&3));
        assert_eq!(report.statistics.section_counts.get(".data"), Some(&3));
        assert!(report.statistics.is_consistent());
    }

    #[test]
    fn test_report_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bird_rvv_stats.json");

        let report = ModelReport::new("bird", sample_aggregator().snapshot());
        report.save_json(&path).unwrap();
        assert_eq!(ModelReport::load_json(&path).unwrap(), report);

        let missing = ModelReport::load_json(dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(missing, AnalysisError::InputNotFound(_)));
    }
}
