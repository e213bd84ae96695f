//! datpatch - Replace phone numbers inside fixed-length binary record files
//!
//! Each record of the input file is classified by its first byte; data
//! records have their configured phone fields looked up in a CSV mapping
//! table and rewritten in place. A transcript of every decision is written
//! to the log directory.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use datpatch_core::sample::{sample_file, SAMPLE_MAPPING};
use datpatch_core::{
    MappingTable, RunConfig, RunReport, Scanner, ScannerConfig, TranscriptHeader,
    UnknownMarkerPolicy,
};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use chrono::{DateTime, Local};
use tracing::{debug, info, trace, warn, Level};
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

/// Replace phone numbers inside fixed-length binary record files
#[derive(Parser, Debug)]
#[command(name = "datpatch")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Rewrite phone fields using a mapping table
    Run(RunArgs),
    /// Generate a sample record file (and optionally a starter mapping)
    Sample(SampleArgs),
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Record file name, looked up in the input directory
    #[arg(default_value = "data.dat")]
    file: String,

    /// Mapping CSV name, looked up in the mapping directory
    #[arg(short, long, default_value = "mapping.csv")]
    mapping: String,

    /// Process every file in the input directory, one pass per file
    #[arg(long, conflicts_with = "file")]
    all: bool,

    /// Don't echo the transcript to stdout
    #[arg(short, long)]
    quiet: bool,

    #[command(flatten)]
    dirs: Dirs,

    #[command(flatten)]
    layout: LayoutArgs,
}

#[derive(Args, Debug)]
struct SampleArgs {
    /// Sample file name, written to the input directory
    #[arg(default_value = "data.dat")]
    file: String,

    /// Also write a starter mapping.csv to the mapping directory
    #[arg(long)]
    with_mapping: bool,

    /// Overwrite existing files
    #[arg(long)]
    force: bool,

    #[command(flatten)]
    dirs: Dirs,

    #[command(flatten)]
    layout: LayoutArgs,
}

/// Working directories
#[derive(Args, Debug)]
struct Dirs {
    /// Directory holding record files to process
    #[arg(long, default_value = "in")]
    in_dir: PathBuf,

    /// Directory receiving rewritten record files
    #[arg(long, default_value = "out")]
    out_dir: PathBuf,

    /// Directory receiving transcripts
    #[arg(long, default_value = "log")]
    log_dir: PathBuf,

    /// Directory holding mapping tables
    #[arg(long, default_value = "mapping")]
    mapping_dir: PathBuf,
}

/// Record layout overrides
#[derive(Args, Debug)]
struct LayoutArgs {
    /// TOML file describing record size, markers and fields
    #[arg(short, long, env = "DATPATCH_CONFIG")]
    config: Option<PathBuf>,

    /// Record size in bytes
    #[arg(long)]
    record_size: Option<usize>,

    /// Field encoding label (e.g. ascii, utf-16be, BigEndianUnicode)
    #[arg(long)]
    encoding: Option<String>,

    /// Abort when a record has neither the header nor the data marker
    #[arg(long)]
    strict_markers: bool,
}

impl LayoutArgs {
    /// Resolves the config file (if any) and applies command-line overrides
    fn scanner_config(&self) -> Result<ScannerConfig> {
        let mut config = match &self.config {
            Some(path) => RunConfig::load(path)?,
            None => RunConfig::default(),
        };

        if let Some(size) = self.record_size {
            config.record_size = size;
        }
        if let Some(label) = &self.encoding {
            config.encoding = label.clone();
        }
        if self.strict_markers {
            config.markers.unknown = UnknownMarkerPolicy::Reject;
        }

        Ok(config.scanner_config()?)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_target(false)
        .init();

    match &cli.command {
        Command::Run(args) => run(args),
        Command::Sample(args) => sample(args),
    }
}

/// Run one pass per selected file
fn run(args: &RunArgs) -> Result<()> {
    let config = args.layout.scanner_config()?;

    let inputs = if args.all {
        list_inputs(&args.dirs.in_dir)?
    } else {
        let input = args.dirs.in_dir.join(&args.file);
        if !input.is_file() {
            bail!("DAT file '{}' does not exist", input.display());
        }
        vec![input]
    };

    let mapping_path = args.dirs.mapping_dir.join(&args.mapping);
    let mapping = MappingTable::load(&mapping_path)?;
    info!(
        "Loaded {} mapping rules from {}",
        mapping.len(),
        mapping_path.display()
    );

    let scanner = Scanner::new(config, &mapping)?;

    let mut failures = 0;
    for input in &inputs {
        let result = process_one(&scanner, input, &mapping_path, &mapping, args);
        match result {
            Ok(_) => {}
            Err(e) if args.all => {
                warn!("Error processing {}: {:#}", input.display(), e);
                failures += 1;
            }
            Err(e) => return Err(e),
        }
    }

    if failures > 0 {
        bail!("{} of {} files failed", failures, inputs.len());
    }
    Ok(())
}

/// Every regular, non-hidden file directly inside `dir`, sorted by name
fn list_inputs(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        bail!("Input directory '{}' does not exist", dir.display());
    }

    let mut inputs = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();

        if !entry.file_type().is_file() {
            continue;
        }

        // Skip hidden files
        if path
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.starts_with('.'))
            .unwrap_or(false)
        {
            trace!("Skipping hidden file: {}", path.display());
            continue;
        }

        inputs.push(path.to_path_buf());
    }

    if inputs.is_empty() {
        bail!("No record files found in '{}'", dir.display());
    }
    debug!("Found {} record file(s) in {}", inputs.len(), dir.display());
    Ok(inputs)
}

/// Process a single record file and write its transcript
fn process_one(
    scanner: &Scanner<'_>,
    input: &Path,
    mapping_path: &Path,
    mapping: &MappingTable,
    args: &RunArgs,
) -> Result<RunReport> {
    let file_name = input
        .file_name()
        .context("Input path has no file name")?;
    let output = args.dirs.out_dir.join(file_name);
    let now = Local::now();

    debug!("Processing {} -> {}", input.display(), output.display());
    let report = scanner
        .process_file(input, &output)
        .with_context(|| format!("Failed to process {}", input.display()))?;

    let transcript = report.transcript(&TranscriptHeader {
        started: now.format("%Y-%m-%d %H:%M:%S").to_string(),
        input: input.display().to_string(),
        output: output.display().to_string(),
        mapping: mapping_path.display().to_string(),
        rule_count: mapping.len(),
        field_count: scanner.fields().len(),
    });

    let log_path = args.dirs.log_dir.join(log_file_name(input, &now));
    write_file(&log_path, transcript.as_bytes(), true)?;

    if !args.quiet {
        print!("{}", transcript);
        println!();
        println!("Output file: {}", output.display());
        println!("Log file:    {}", log_path.display());
    }

    info!(
        "{}: {} / {} records modified, {} numbers replaced",
        input.display(),
        report.modified_record_count,
        report.record_count,
        report.replaced_field_count
    );
    if let Some(short) = &report.short_read {
        warn!(
            "{}: trailing {} byte(s) do not form a full record",
            input.display(),
            short.len
        );
    }

    Ok(report)
}

/// `<stem><timestamp>.log`
fn log_file_name(input: &Path, now: &DateTime<Local>) -> String {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    format!("{}{}.log", stem, now.format("%Y-%m-%d_%H-%M-%S"))
}

/// Generate the sample data set
fn sample(args: &SampleArgs) -> Result<()> {
    let config = args.layout.scanner_config()?;
    let data = sample_file(&config)?;

    let path = args.dirs.in_dir.join(&args.file);
    write_file(&path, &data, args.force)?;
    println!("Created: {} ({} bytes)", path.display(), data.len());

    if args.with_mapping {
        let mapping = args.dirs.mapping_dir.join("mapping.csv");
        write_file(&mapping, SAMPLE_MAPPING.as_bytes(), args.force)?;
        println!("Created: {}", mapping.display());
    }

    Ok(())
}

/// Write a file, creating parent directories
fn write_file(path: &Path, content: &[u8], force: bool) -> Result<()> {
    // Create parent directories
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    // Check if file exists
    if path.exists() && !force {
        bail!(
            "File already exists: {} (use --force to overwrite)",
            path.display()
        );
    }

    let mut file = fs::File::create(path)
        .with_context(|| format!("Failed to create file: {}", path.display()))?;

    file.write_all(content)
        .with_context(|| format!("Failed to write file: {}", path.display()))?;

    Ok(())
}
