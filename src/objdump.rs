//! External `objdump` invocation.

use std::ffi::OsString;
use std::fmt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use log::{debug, info};

use crate::AnalysisError;

/// Default disassembler, looked up on `PATH`
pub const DEFAULT_OBJDUMP: &str = "riscv64-elf-objdump";

/// Disassembler location plus the optional scope filters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjdumpConfig {
    /// Path (or bare program name) of the objdump executable
    pub path: PathBuf,
    /// Sections passed as `-j <section>`; empty means all sections
    pub sections: Vec<String>,
    /// Functions passed as `--disassemble=<function>`; empty means all
    pub functions: Vec<String>,
}

impl Default for ObjdumpConfig {
    fn default() -> Self {
        Self::new(DEFAULT_OBJDUMP)
    }
}

impl ObjdumpConfig {
    /// Configuration for the objdump at `path`, without filters
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            sections: Vec::new(),
            functions: Vec::new(),
        }
    }

    /// Restrict disassembly to the given sections
    pub fn with_sections(mut self, sections: Vec<String>) -> Self {
        self.sections = sections;
        self
    }

    /// Restrict disassembly to the given functions
    pub fn with_functions(mut self, functions: Vec<String>) -> Self {
        self.functions = functions;
        self
    }

    /// Argument list for disassembling `binary`, binary path last.
    pub fn build_args(&self, binary: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec!["-D".into()];

        for section in &self.sections {
            args.push("-j".into());
            args.push(section.into());
        }

        for function in &self.functions {
            args.push(format!("--disassemble={}", function).into());
        }

        args.push(binary.as_os_str().to_os_string());
        args
    }

    /// Disassemble `binary` with this configuration
    pub fn disassemble(&self, binary: &Path) -> Result<String, AnalysisError> {
        disassemble(&self.path, binary, &self.sections, &self.functions)
    }
}

impl fmt::Display for ObjdumpConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())?;
        if !self.sections.is_empty() {
            write!(f, " (sections: {})", self.sections.join(", "))?;
        }
        if !self.functions.is_empty() {
            write!(f, " (functions: {})", self.functions.join(", "))?;
        }
        Ok(())
    }
}

/// Run `objdump -D` on `binary` and capture its whole standard output.
///
/// The binary must exist; it is checked before anything is spawned. Section
/// and function filters only narrow which lines appear in the output.
pub fn disassemble(
    objdump: &Path,
    binary: &Path,
    sections: &[String],
    functions: &[String],
) -> Result<String, AnalysisError> {
    if !binary.exists() {
        return Err(AnalysisError::InputNotFound(binary.to_path_buf()));
    }

    let config = ObjdumpConfig {
        path: objdump.to_path_buf(),
        sections: sections.to_vec(),
        functions: functions.to_vec(),
    };
    let args = config.build_args(binary);

    let mut cmd = Command::new(objdump);
    cmd.args(&args)
        .stdin(Stdio::null());
    debug!("Running command: {:?}", cmd);

    // `output` owns the child and its pipes until it has exited
    let output = cmd.output().map_err(|e| match e.kind() {
        ErrorKind::NotFound | ErrorKind::PermissionDenied => AnalysisError::ToolNotFound {
            path: objdump.to_path_buf(),
        },
        _ => AnalysisError::Io(e),
    })?;

    if !output.status.success() {
        return Err(AnalysisError::DisassemblyFailed {
            code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        });
    }

    let text = String::from_utf8_lossy(&output.stdout).into_owned();
    info!(
        "objdump produced {} bytes ({} lines) for {}",
        text.len(),
        text.lines().count(),
        binary.display()
    );
    Ok(text)
}
