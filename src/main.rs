use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use log::{info, LevelFilter};

use rvv_scope::census::{self, Census};
use rvv_scope::compare::{self, Comparison};
use rvv_scope::format::{write_model_chart, OutputFormat};
use rvv_scope::objdump::{ObjdumpConfig, DEFAULT_OBJDUMP};
use rvv_scope::scan::{scan_models, ScanOptions};
use rvv_scope::stats::ModelReport;
use rvv_scope::analyze_binary;

#[derive(Parser)]
#[command(author, version, about = "Analyze RISC-V Vector instruction usage in compiled binaries", long_about = None)]
struct Cli {
    /// Path to the RISC-V objdump executable
    #[arg(long, global = true, env = "RVV_OBJDUMP", default_value = DEFAULT_OBJDUMP)]
    objdump: PathBuf,

    /// Set the base log level (use -v / -q to adjust relative to this level)
    #[arg(
        long,
        value_enum,
        default_value_t = LogLevel::Info,
        global = true,
        help = "error | warn | info | debug | trace"
    )]
    log_level: LogLevel,

    /// Increase logging verbosity (can be used multiple times)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Decrease logging verbosity (can be used multiple times)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    quiet: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_filter(self) -> LevelFilter {
        match self {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

fn init_logging(base: LogLevel, verbose: u8, quiet: u8) {
    let levels = [
        LevelFilter::Error,
        LevelFilter::Warn,
        LevelFilter::Info,
        LevelFilter::Debug,
        LevelFilter::Trace,
    ];

    let base_idx = levels
        .iter()
        .position(|lvl| *lvl == base.to_filter())
        .unwrap_or(2) as i8;
    let adjusted =
        (base_idx + verbose as i8 - quiet as i8).clamp(0, (levels.len() - 1) as i8) as usize;

    env_logger::Builder::from_default_env()
        .format_target(false)
        .filter_level(levels[adjusted])
        .init();
}

/// Section and function filters shared by the disassembling commands
#[derive(clap::Args, Debug, Default)]
struct FilterArgs {
    /// Sections to disassemble, comma-separated (e.g. ".data,.text")
    #[arg(short, long, value_name = "SECTIONS")]
    section: Option<String>,

    /// Functions to disassemble, comma-separated
    #[arg(short, long, value_name = "FUNCTIONS")]
    function: Option<String>,
}

impl FilterArgs {
    fn config(&self, objdump: &Path) -> ObjdumpConfig {
        ObjdumpConfig::new(objdump)
            .with_sections(parse_list(self.section.as_deref()))
            .with_functions(parse_list(self.function.as_deref()))
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a single binary
    Analyze {
        /// Binary to disassemble
        binary: PathBuf,

        /// Write the JSON report to this file
        #[arg(short, long, value_name = "JSON")]
        output: Option<PathBuf>,

        /// Model name used in reports (defaults to the binary's grandparent directory)
        #[arg(short, long)]
        model: Option<String>,

        #[clap(flatten)]
        filters: FilterArgs,

        /// Report format printed to stdout
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,

        /// Write a usage chart
        #[arg(long)]
        visualize: bool,

        /// Directory for the chart (defaults to the JSON report's directory)
        #[arg(long, value_name = "DIR")]
        chart_dir: Option<PathBuf>,
    },

    /// Analyze every model found below a directory
    Scan {
        /// Root directory holding one subdirectory per model
        dir: PathBuf,

        /// Sections to disassemble, comma-separated
        #[arg(short, long, value_name = "SECTIONS")]
        section: Option<String>,

        /// Write a usage chart next to each report
        #[arg(long)]
        visualize: bool,
    },

    /// Compare saved JSON reports of several models
    Compare {
        /// JSON reports to compare
        #[arg(required = true)]
        reports: Vec<PathBuf>,

        /// Number of instructions in the cross-model table
        #[arg(long, default_value_t = compare::DEFAULT_TOP_N)]
        top: usize,

        /// Write the comparison chart
        #[arg(long)]
        visualize: bool,

        /// Directory for the comparison chart
        #[arg(short, long, value_name = "DIR", default_value = ".")]
        output: PathBuf,
    },

    /// Print the head and tail of the raw objdump output
    Inspect {
        binary: PathBuf,

        /// Lines shown from each end
        #[arg(short = 'n', long, default_value_t = 20)]
        lines: usize,

        #[clap(flatten)]
        filters: FilterArgs,
    },

    /// Count every mnemonic in a binary, vector or not
    Census {
        binary: PathBuf,

        /// Number of mnemonics listed
        #[arg(long, default_value_t = census::DEFAULT_TOP_N)]
        top: usize,

        #[clap(flatten)]
        filters: FilterArgs,
    },
}

/// Split a comma-separated list, dropping blank entries
fn parse_list(value: Option<&str>) -> Vec<String> {
    value
        .map(|v| {
            v.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect()
        })
        .unwrap_or_default()
}

/// Name of the directory two levels above the binary, else the file stem
fn default_model_name(binary: &Path) -> String {
    binary
        .parent()
        .and_then(Path::parent)
        .and_then(Path::file_name)
        .or_else(|| binary.file_stem())
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "unknown".to_string())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_level, cli.verbose, cli.quiet);

    match cli.command {
        Commands::Analyze {
            binary,
            output,
            model,
            filters,
            format,
            visualize,
            chart_dir,
        } => {
            let config = filters.config(&cli.objdump);
            info!("Using {}", config);

            let statistics = analyze_binary(&binary, &config)
                .with_context(|| format!("Failed to analyze {}", binary.display()))?;
            let model = model.unwrap_or_else(|| default_model_name(&binary));
            let report = ModelReport::new(model, statistics);

            let rendered = format
                .get_formatter()
                .format(&report)
                .context("Failed to format report")?;
            println!("{}", rendered);

            if let Some(path) = &output {
                report
                    .save_json(path)
                    .with_context(|| format!("Failed to write {}", path.display()))?;
            }

            if visualize {
                let dir = chart_dir
                    .or_else(|| output.as_deref().and_then(Path::parent).map(Path::to_path_buf))
                    .filter(|dir| !dir.as_os_str().is_empty())
                    .unwrap_or_else(|| PathBuf::from("."));
                write_model_chart(&report, &dir).context("Failed to write chart")?;
            }
        }
        Commands::Scan {
            dir,
            section,
            visualize,
        } => {
            let options = ScanOptions {
                objdump: ObjdumpConfig::new(&cli.objdump)
                    .with_sections(parse_list(section.as_deref())),
                visualize,
            };
            let summary = scan_models(&dir, &options)
                .with_context(|| format!("Failed to scan {}", dir.display()))?;
            println!("{}", summary);
        }
        Commands::Compare {
            reports,
            top,
            visualize,
            output,
        } => {
            let comparison = Comparison::load(&reports).context("No valid reports to compare")?;
            println!("{}", comparison.render(top));

            if visualize {
                comparison
                    .write_chart(&output)
                    .context("Failed to write comparison chart")?;
            }
        }
        Commands::Inspect {
            binary,
            lines,
            filters,
        } => {
            let config = filters.config(&cli.objdump);
            let text = config
                .disassemble(&binary)
                .with_context(|| format!("Failed to disassemble {}", binary.display()))?;
            print_head_and_tail(&text, lines);
        }
        Commands::Census {
            binary,
            top,
            filters,
        } => {
            let config = filters.config(&cli.objdump);
            let text = config
                .disassemble(&binary)
                .with_context(|| format!("Failed to disassemble {}", binary.display()))?;
            println!("{}", Census::from_disassembly(&text).render(top));
        }
    }

    Ok(())
}

fn print_head_and_tail(text: &str, n: usize) {
    let lines: Vec<&str> = text.lines().collect();
    println!("Total lines: {}", lines.len());

    println!("\n=== First {} lines ===", n.min(lines.len()));
    for (i, line) in lines.iter().enumerate().take(n) {
        println!("{:4}: {}", i + 1, line);
    }

    if lines.len() > 2 * n {
        println!("\n=== Last {} lines ===", n);
        let start = lines.len() - n;
        for (i, line) in lines.iter().enumerate().skip(start) {
            println!("{:4}: {}", i + 1, line);
        }
    } else if lines.len() > n {
        for (i, line) in lines.iter().enumerate().skip(n) {
            println!("{:4}: {}", i + 1, line);
        }
    }
}
