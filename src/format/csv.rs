//! CSV output formatter

use crate::stats::ModelReport;
use crate::AnalysisError;
use super::ReportFormatter;

impl ReportFormatter for super::CsvFormatter {
    fn format(&self, report: &ModelReport) -> Result<String, AnalysisError> {
        let stats = &report.statistics;
        let mut writer = ::csv::Writer::from_writer(Vec::new());

        writer.write_record(["model", "kind", "name", "count"])?;

        let model = report.model.as_str();
        let total = stats.total_instructions.to_string();
        let rvv = stats.target_instructions.to_string();
        writer.write_record([model, "summary", "total_instructions", total.as_str()])?;
        writer.write_record([model, "summary", "rvv_instructions", rvv.as_str()])?;

        for (section, count) in stats.sorted_sections() {
            let count = count.to_string();
            writer.write_record([model, "section", section, count.as_str()])?;
        }

        for (instruction, count) in stats.sorted_instructions() {
            let count = count.to_string();
            writer.write_record([model, "instruction", instruction, count.as_str()])?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| AnalysisError::Serialization(format!("CSV flush error: {}", e)))?;
        String::from_utf8(bytes)
            .map_err(|e| AnalysisError::Serialization(format!("CSV encoding error: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::tests::create_test_report;
    use crate::format::CsvFormatter;

    #[test]
    fn test_csv_formatter() {
        let output = CsvFormatter.format(&create_test_report()).unwrap();
        let lines: Vec<&str> = output.lines().collect();

        assert_eq!(lines[0], "model,kind,name,count");
        assert_eq!(lines[1], "bird,summary,total_instructions,7");
        assert_eq!(lines[2], "bird,summary,rvv_instructions,5");
        assert_eq!(lines[3], "bird,section,.data,4");
        assert_eq!(lines[4], "bird,section,.rodata,1");
        assert_eq!(lines[5], "bird,instruction,vle32,2");
        assert_eq!(lines.len(), 9);
    }

    #[test]
    fn test_csv_quotes_awkward_names() {
        let mut report = create_test_report();
        report.model = "yolo, v5".to_string();
        let output = CsvFormatter.format(&report).unwrap();
        assert!(output.contains("\"yolo, v5\",summary,total_instructions,7"));
    }
}
