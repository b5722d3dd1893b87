//! Output format module implementation

mod json;
mod csv;
mod chart;

pub use self::chart::*;

use crate::stats::ModelReport;
use crate::AnalysisError;
use std::fmt;
use std::str::FromStr;
use clap::ValueEnum;

/// Width of the rule lines in text reports
const RULE_WIDTH: usize = 60;

/// Supported output formats for analysis reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable tables (default)
    Text,
    /// JSON document, same shape as the saved statistics files
    Json,
    /// CSV rows (model, kind, name, count)
    Csv,
}

impl Default for OutputFormat {
    fn default() -> Self {
        OutputFormat::Text
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Csv => write!(f, "csv"),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            "csv" => Ok(OutputFormat::Csv),
            _ => Err(format!("Unknown output format: {}", s)),
        }
    }
}

impl OutputFormat {
    /// Get all available output formats
    pub fn available_formats() -> &'static [Self] {
        &[OutputFormat::Text, OutputFormat::Json, OutputFormat::Csv]
    }

    /// Get a formatter for this output format
    pub fn get_formatter(&self) -> Box<dyn ReportFormatter> {
        match self {
            OutputFormat::Text => Box::new(TextFormatter),
            OutputFormat::Json => Box::new(JsonFormatter),
            OutputFormat::Csv => Box::new(CsvFormatter),
        }
    }
}

/// Formatter trait for analysis reports
pub trait ReportFormatter {
    /// Render a model report
    fn format(&self, report: &ModelReport) -> Result<String, AnalysisError>;
}

/// Format reports as plain-text tables
pub struct TextFormatter;

/// Format reports as pretty JSON
pub struct JsonFormatter;

/// Format reports as CSV
pub struct CsvFormatter;

impl ReportFormatter for TextFormatter {
    fn format(&self, report: &ModelReport) -> Result<String, AnalysisError> {
        let stats = &report.statistics;
        let mut output = String::new();
        let heavy = "=".repeat(RULE_WIDTH);
        let light = "-".repeat(RULE_WIDTH);

        output.push_str(&format!("{}\nModel: {}\n{}\n", heavy, report.model, heavy));

        output.push_str(&format!("\nTotal instructions: {}\n", stats.total_instructions));
        output.push_str(&format!("RVV instructions: {}\n", stats.target_instructions));
        if let Some(pct) = stats.rvv_percentage() {
            output.push_str(&format!("RVV usage: {:.2}%\n", pct));
        }

        if !stats.section_counts.is_empty() {
            output.push_str(&format!("\nRVV Instructions by Section:\n{}\n", light));
            for (section, count) in stats.sorted_sections() {
                output.push_str(&format!(
                    "{:30}: {:6} ({:5.1}%)\n",
                    section,
                    count,
                    share(count, stats.target_instructions)
                ));
            }
        }

        output.push_str(&format!("\nRVV Instruction Distribution:\n{}\n", light));
        for (instruction, count) in stats.sorted_instructions() {
            output.push_str(&format!("{:20}: {:6}\n", instruction, count));
        }

        let families = stats.family_counts();
        if !families.is_empty() {
            output.push_str(&format!("\nRVV Instructions by Family:\n{}\n", light));
            let mut families: Vec<_> = families.into_iter().collect();
            families.sort_by(|a, b| b.1.cmp(&a.1));
            for (family, count) in families {
                output.push_str(&format!(
                    "{:20}: {:6} ({:5.1}%)\n",
                    family.to_string(),
                    count,
                    share(count, stats.target_instructions)
                ));
            }
        }

        Ok(output)
    }
}

/// Percentage of `part` in `whole`, zero for an empty whole
pub(crate) fn share(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

/// Decimal digits grouped by thousands, e.g. `1,234,567`
pub fn thousands(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thousands() {
        assert_eq!(thousands(0), "0");
        assert_eq!(thousands(999), "999");
        assert_eq!(thousands(1000), "1,000");
        assert_eq!(thousands(123456), "123,456");
        assert_eq!(thousands(1234567), "1,234,567");
    }
    use crate::stats::Aggregator;

    pub(crate) fn create_test_report() -> ModelReport {
        let mut agg = Aggregator::new();
        for (mnemonic, section) in [
            ("auipc", ".text"),
            ("addi", ".text"),
            ("vsetvli", ".data"),
            ("vle32", ".data"),
            ("vle32", ".data"),
            ("vadd", ".data"),
            ("vse32", ".rodata"),
        ] {
            agg.record(mnemonic, section);
        }
        ModelReport::new("bird", agg.snapshot())
    }

    #[test]
    fn test_text_formatter() {
        let result = TextFormatter.format(&create_test_report()).unwrap();

        assert!(result.contains("Model: bird"));
        assert!(result.contains("Total instructions: 7"));
        assert!(result.contains("RVV instructions: 5"));
        assert!(result.contains("RVV usage: 71.43%"));
        assert!(result.contains(&format!("{:30}: {:6} ({:5.1}%)", ".data", 4, 80.0)));
        assert!(result.contains(&format!("{:20}: {:6}", "vle32", 2)));
        assert!(result.contains("Load/store"));

        // Sections listed by descending count
        let data = result.find(".data").unwrap();
        let rodata = result.find(".rodata").unwrap();
        assert!(data < rodata);
    }

    #[test]
    fn test_text_formatter_empty() {
        let report = ModelReport::new("empty", Default::default());
        let result = TextFormatter.format(&report).unwrap();

        assert!(result.contains("Total instructions: 0"));
        assert!(!result.contains("RVV usage"));
        assert!(!result.contains("by Section"));
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!("JSON".parse::<OutputFormat>(), Ok(OutputFormat::Json));
        assert_eq!("txt".parse::<OutputFormat>(), Ok(OutputFormat::Text));
        assert!("ngram".parse::<OutputFormat>().is_err());
        assert_eq!(OutputFormat::default().to_string(), "text");
    }

    #[test]
    fn test_format_selection() {
        let report = create_test_report();
        for format in OutputFormat::available_formats() {
            let output = format.get_formatter().format(&report).unwrap();
            assert!(!output.is_empty(), "Empty output for format {:?}", format);
        }
    }
}
