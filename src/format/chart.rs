//! Plain-text charts for instruction statistics

use std::fs;
use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::stats::ModelReport;
use crate::AnalysisError;
use super::share;

/// Instructions shown in the bar chart
pub const CHART_TOP_N: usize = 20;

/// Instructions shown individually in the share table; the rest are "Others"
pub const SHARE_TOP_N: usize = 10;

/// Width of a full-length bar in characters
const BAR_WIDTH: usize = 50;

/// Horizontal bar scaled against `max`; any non-zero count gets at least one cell.
pub fn bar(count: usize, max: usize) -> String {
    if max == 0 || count == 0 {
        return String::new();
    }
    let len = ((count as f64 / max as f64) * BAR_WIDTH as f64).round() as usize;
    "#".repeat(len.clamp(1, BAR_WIDTH))
}

/// Render the usage chart for one model.
///
/// Returns `None` when the model has no RVV instructions to chart.
pub fn render_model_chart(report: &ModelReport) -> Option<String> {
    let stats = &report.statistics;
    let sorted = stats.sorted_instructions();
    if sorted.is_empty() {
        return None;
    }

    let mut out = format!("RVV Instruction Analysis - {}\n\n", report.model);

    let top = &sorted[..sorted.len().min(CHART_TOP_N)];
    let max = top[0].1;
    out.push_str("Top RVV Instructions by Usage Count\n");
    for (instruction, count) in top {
        out.push_str(&format!("{:>16} | {} {}\n", instruction, bar(*count, max), count));
    }

    out.push_str("\nDistribution of Top RVV Instructions\n");
    let shown = sorted.len().min(SHARE_TOP_N);
    for (instruction, count) in &sorted[..shown] {
        out.push_str(&format!(
            "{:>16} | {:5.1}%\n",
            instruction,
            share(*count, stats.target_instructions)
        ));
    }
    if sorted.len() > shown {
        let others: usize = sorted[shown..].iter().map(|(_, c)| c).sum();
        out.push_str(&format!(
            "{:>16} | {:5.1}%\n",
            "Others",
            share(others, stats.target_instructions)
        ));
    }

    out.push_str(&format!("\nTotal Instructions: {}\n", stats.total_instructions));
    out.push_str(&format!("RVV Instructions: {}\n", stats.target_instructions));
    out.push_str(&format!("RVV Usage: {:.2}%\n", stats.rvv_percentage().unwrap_or(0.0)));

    Some(out)
}

/// Bar for every RVV mnemonic of the model, most used first.
///
/// Only produced when there are more mnemonics than the main chart shows.
pub fn render_detailed_chart(report: &ModelReport) -> Option<String> {
    let sorted = report.statistics.sorted_instructions();
    if sorted.len() <= CHART_TOP_N {
        return None;
    }

    let max = sorted[0].1;
    let mut out = format!(
        "All RVV Instructions - {} ({} distinct)\n\n",
        report.model,
        sorted.len()
    );
    for (instruction, count) in &sorted {
        out.push_str(&format!("{:>16} | {} {}\n", instruction, bar(*count, max), count));
    }
    Some(out)
}

/// File name of the chart written for `model`
pub fn chart_file_name(model: &str) -> String {
    format!("{}_rvv_chart.txt", model.replace(['/', '\\'], "_"))
}

/// File name of the full-listing chart written for `model`
pub fn detailed_chart_file_name(model: &str) -> String {
    format!("{}_rvv_chart_detailed.txt", model.replace(['/', '\\'], "_"))
}

/// Write the model chart into `dir`, creating it if needed.
///
/// Models with more than [`CHART_TOP_N`] mnemonics also get the detailed
/// chart next to it. Returns the main chart's path, or `None` if there was
/// nothing to chart.
pub fn write_model_chart<P: AsRef<Path>>(
    report: &ModelReport,
    dir: P,
) -> Result<Option<PathBuf>, AnalysisError> {
    let Some(chart) = render_model_chart(report) else {
        warn!("No RVV instructions found to visualize for {}", report.model);
        return Ok(None);
    };

    let dir = dir.as_ref();
    fs::create_dir_all(dir)?;
    let path = dir.join(chart_file_name(&report.model));
    fs::write(&path, chart)?;
    info!("Visualization saved to: {}", path.display());

    if let Some(detailed) = render_detailed_chart(report) {
        let detailed_path = dir.join(detailed_chart_file_name(&report.model));
        fs::write(&detailed_path, detailed)?;
        info!("Detailed chart saved to: {}", detailed_path.display());
    }

    Ok(Some(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::tests::create_test_report;
    use crate::stats::{Aggregator, ModelReport};

    #[test]
    fn test_bar_scaling() {
        assert_eq!(bar(10, 10).len(), BAR_WIDTH);
        assert_eq!(bar(5, 10).len(), BAR_WIDTH / 2);
        assert_eq!(bar(1, 1000).len(), 1);
        assert_eq!(bar(0, 10), "");
        assert_eq!(bar(3, 0), "");
    }

    #[test]
    fn test_model_chart() {
        let chart = render_model_chart(&create_test_report()).unwrap();

        assert!(chart.starts_with("RVV Instruction Analysis - bird"));
        assert!(chart.contains(&format!("{:>16} | {} 2", "vle32", "#".repeat(BAR_WIDTH))));
        assert!(chart.contains("RVV Usage: 71.43%"));
        assert!(!chart.contains("Others"));
    }

    #[test]
    fn test_model_chart_others_bucket() {
        let mut agg = Aggregator::new();
        let mnemonics = [
            "vadd", "vsub", "vmul", "vdiv", "vand", "vor", "vxor", "vsll", "vsrl", "vsra", "vmv",
            "vfadd",
        ];
        for mnemonic in mnemonics {
            agg.record(mnemonic, ".data");
        }
        let report = ModelReport::new("wide", agg.snapshot());
        let chart = render_model_chart(&report).unwrap();

        // 12 distinct mnemonics, 2 fold into Others
        assert!(chart.contains(&format!("{:>16} | {:5.1}%", "Others", 200.0 / 12.0)));
    }

    fn many_mnemonics_report() -> ModelReport {
        let mnemonics = [
            "vadd", "vsub", "vmul", "vdiv", "vand", "vor", "vxor", "vsll", "vsrl", "vsra", "vmv",
            "vfadd", "vfsub", "vfmul", "vfdiv", "vmin", "vmax", "vredsum", "vslideup",
            "vslidedown", "vrgather", "vmerge", "vle32", "vse32", "vsetvli",
        ];
        let mut agg = Aggregator::new();
        for (i, mnemonic) in mnemonics.iter().enumerate() {
            for _ in 0..=i {
                agg.record(mnemonic, ".data");
            }
        }
        ModelReport::new("resnet", agg.into_snapshot())
    }

    #[test]
    fn test_detailed_chart_lists_every_mnemonic() {
        let report = many_mnemonics_report();

        let main = render_model_chart(&report).unwrap();
        // least used mnemonic falls outside the top 20
        assert!(!main.contains("vadd"));

        let detailed = render_detailed_chart(&report).unwrap();
        assert!(detailed.starts_with("All RVV Instructions - resnet (25 distinct)"));
        assert!(detailed.contains(&format!("{:>16} | {} 25", "vsetvli", "#".repeat(BAR_WIDTH))));
        assert!(detailed.contains(&format!("{:>16} | {} 1", "vadd", bar(1, 25))));
        assert_eq!(detailed.lines().filter(|l| l.contains(" | ")).count(), 25);
    }

    #[test]
    fn test_detailed_chart_only_past_top_n() {
        assert_eq!(render_detailed_chart(&create_test_report()), None);

        let dir = tempfile::tempdir().unwrap();
        write_model_chart(&create_test_report(), dir.path()).unwrap();
        assert!(!dir.path().join("bird_rvv_chart_detailed.txt").exists());

        write_model_chart(&many_mnemonics_report(), dir.path()).unwrap();
        let detailed = fs::read_to_string(dir.path().join("resnet_rvv_chart_detailed.txt")).unwrap();
        assert!(detailed.contains("vrgather"));
    }

    #[test]
    fn test_write_model_chart() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_model_chart(&create_test_report(), dir.path().join("charts"))
            .unwrap()
            .unwrap();
        assert_eq!(path.file_name().unwrap(), "bird_rvv_chart.txt");
        assert!(fs::read_to_string(&path).unwrap().contains("vle32"));

        let empty = ModelReport::new("empty", Default::default());
        assert_eq!(write_model_chart(&empty, dir.path()).unwrap(), None);
    }
}
