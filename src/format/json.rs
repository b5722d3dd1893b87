//! JSON output formatter

use crate::stats::ModelReport;
use crate::AnalysisError;
use super::ReportFormatter;

impl ReportFormatter for super::JsonFormatter {
    fn format(&self, report: &ModelReport) -> Result<String, AnalysisError> {
        report.to_json()
    }
}
