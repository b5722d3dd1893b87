//! Core types, errors, and the analysis pipeline for the RVV usage analyzer.
//!
//! The library runs an external `objdump`, parses its text output line by line,
//! classifies every instruction mnemonic against a fixed catalog of RISC-V
//! Vector (RVV) instructions, and aggregates the result per mnemonic and per
//! section.
//!
//! # Basic Usage
//!
//! ```rust,no_run
//! use rvv_scope::{
//!     objdump::ObjdumpConfig,
//!     stats::ModelReport,
//!     analyze_binary,
//! };
//!
//! // Restrict disassembly to the section IREE puts kernels in
//! let config = ObjdumpConfig::new("riscv64-elf-objdump")
//!     .with_sections(vec![".data".to_string()]);
//!
//! let snapshot = analyze_binary("models/bird/OUTPUT/bird.adx", &config).unwrap();
//! println!("{} of {} instructions are RVV",
//!          snapshot.target_instructions, snapshot.total_instructions);
//!
//! let report = ModelReport::new("bird", snapshot);
//! report.save_json("bird_rvv_stats.json").unwrap();
//! ```

pub mod classifier;
pub mod parser;
pub mod stats;
pub mod objdump;
pub mod format;
pub mod scan;
pub mod compare;
pub mod census;

use std::fmt;
use std::path::{Path, PathBuf};

use log::info;

use crate::objdump::ObjdumpConfig;
use crate::parser::DisassemblyParser;
use crate::stats::{Aggregator, StatisticsSnapshot};

/// Section name used for instructions seen before any section header
pub const UNKNOWN_SECTION: &str = "unknown";

/// One parsed instruction occurrence.
///
/// Records are produced by the parser and consumed immediately; nothing keeps
/// them after the aggregator has counted them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstructionRecord<'a> {
    /// Leading mnemonic token (e.g. "vle32" for `vle32.v`)
    pub mnemonic: &'a str,
    /// Section the instruction was found in
    pub section: &'a str,
    /// 1-based position of the instruction within the parse pass
    pub ordinal: usize,
}

impl fmt::Display for InstructionRecord<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} {} [{}]", self.ordinal, self.mnemonic, self.section)
    }
}

/// Error type for analysis operations
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    /// The configured disassembler could not be executed
    #[error("objdump not found at {}; please check your toolchain installation", .path.display())]
    ToolNotFound {
        path: PathBuf,
    },

    /// The disassembler ran but exited unsuccessfully
    #[error("objdump failed ({}): {stderr}", exit_description(.code))]
    DisassemblyFailed {
        /// Exit code, if the process was not killed by a signal
        code: Option<i32>,
        /// Captured standard error, verbatim
        stderr: String,
    },

    /// An input path (binary, report or scan root) does not exist
    #[error("Input not found: {}", .0.display())]
    InputNotFound(PathBuf),

    /// None of the given report files could be loaded
    #[error("No usable reports among {0} file(s)")]
    NoReports(usize),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON or CSV encoding/decoding error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

fn exit_description(code: &Option<i32>) -> String {
    match *code {
        Some(code) => format!("exit status {}", code),
        None => "terminated by signal".to_string(),
    }
}

impl From<serde_json::Error> for AnalysisError {
    fn from(e: serde_json::Error) -> Self {
        AnalysisError::Serialization(e.to_string())
    }
}

impl From<csv::Error> for AnalysisError {
    fn from(e: csv::Error) -> Self {
        AnalysisError::Serialization(e.to_string())
    }
}

/// Run the full pipeline on one binary: disassemble, parse, classify, count.
pub fn analyze_binary<P: AsRef<Path>>(
    binary: P,
    config: &ObjdumpConfig,
) -> Result<StatisticsSnapshot, AnalysisError> {
    let binary = binary.as_ref();
    info!("Analyzing binary: {}", binary.display());

    let disassembly = config.disassemble(binary)?;

    let mut aggregator = Aggregator::new();
    DisassemblyParser::new().parse(&disassembly, &mut aggregator);
    let snapshot = aggregator.snapshot();

    info!(
        "Parsed {} instructions, {} RVV",
        snapshot.total_instructions, snapshot.target_instructions
    );
    Ok(snapshot)
}
