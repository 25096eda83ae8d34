//! pdftotree - Build layout trees for PDF pages
//!
//! Reads a JSON dump of raw page elements (text lines, paths and figure
//! boxes in PDF user space), analyzes the layout of every page and writes
//! the result as hOCR, or the trees themselves as JSON.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{ArgAction, Parser, ValueEnum};
use memmap2::Mmap;
use pdftree_core::layout::normalize::{RawPage, normalize_document};
use pdftree_core::predict::TableDetection;
use pdftree_core::scan::ScanPolicy;
use pdftree_core::tree::{TreeExtractor, TreeOptions};
use pdftree_core::HocrRenderer;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Output format.
#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum Format {
    /// hOCR HTML (default)
    #[default]
    Html,
    /// The page trees as JSON
    Json,
}

/// How table regions are found.
#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum Strategy {
    /// Alignment clusters passing the table test (default)
    #[default]
    Heuristic,
    /// Rectangles closed by ruling lines
    Rulings,
}

impl From<Strategy> for TableDetection {
    fn from(s: Strategy) -> Self {
        match s {
            Strategy::Heuristic => TableDetection::Heuristic,
            Strategy::Rulings => TableDetection::Rulings,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ScanPolicyArg {
    /// Refuse scanned documents
    Abort,
    /// Warn and continue
    Warn,
}

impl From<ScanPolicyArg> for ScanPolicy {
    fn from(p: ScanPolicyArg) -> Self {
        match p {
            ScanPolicyArg::Abort => ScanPolicy::Abort,
            ScanPolicyArg::Warn => ScanPolicy::Warn,
        }
    }
}

/// Parses the usual spellings of a boolean flag value.
fn parse_bool(s: &str) -> std::result::Result<bool, String> {
    match s.trim().to_ascii_lowercase().as_str() {
        "yes" | "true" | "t" | "y" | "1" => Ok(true),
        "no" | "false" | "f" | "n" | "0" => Ok(false),
        other => Err(format!("expected a boolean, got {other:?}")),
    }
}

/// Convert a dump of PDF page elements into a tree of typed regions.
#[derive(Parser, Debug)]
#[command(name = "pdftotree")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the JSON element dump (an array of raw pages)
    input: PathBuf,

    /// Write output here instead of stdout
    #[arg(short = 'o', long)]
    outfile: Option<PathBuf>,

    /// Use debug logging level
    #[arg(short = 'd', long, action = ArgAction::SetTrue)]
    debug: bool,

    /// Output format
    #[arg(long, value_enum, default_value_t = Format::Html)]
    format: Format,

    /// Drop tables and text regions that overlap a figure
    #[arg(long = "favor-figures", value_parser = parse_bool)]
    favor_figures: Option<bool>,

    /// What to do with a document that looks scanned
    #[arg(long = "scan-policy", value_enum)]
    scan_policy: Option<ScanPolicyArg>,

    /// Table detection strategy
    #[arg(long, value_enum, default_value_t = Strategy::Heuristic)]
    strategy: Strategy,

    /// JSON file with tree options; flags given on the command line win
    #[arg(long)]
    config: Option<PathBuf>,

    /// Scale applied to page coordinates
    #[arg(long, default_value = "1.0")]
    scale: f64,
}

fn init_tracing(debug: bool) {
    let level = if debug { tracing::Level::DEBUG } else { tracing::Level::WARN };
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .init();
}

fn load_options(args: &Args) -> Result<TreeOptions> {
    let mut options = match &args.config {
        Some(path) => {
            let file = File::open(path).with_context(|| format!("opening config {}", path.display()))?;
            serde_json::from_reader(io::BufReader::new(file))
                .with_context(|| format!("parsing config {}", path.display()))?
        }
        None => TreeOptions::default(),
    };
    if let Some(favor) = args.favor_figures {
        options.favor_figures = favor;
    }
    if let Some(policy) = args.scan_policy {
        options.scan_policy = policy.into();
    }
    Ok(options)
}

fn read_pages(path: &Path) -> Result<Vec<RawPage>> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    // SAFETY: the dump is only read, and not expected to change while mapped.
    let mmap = unsafe { Mmap::map(&file) }.with_context(|| format!("mapping {}", path.display()))?;
    serde_json::from_slice(&mmap).with_context(|| format!("parsing {}", path.display()))
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.debug);

    if !(args.scale.is_finite() && args.scale > 0.0) {
        bail!("scale must be a positive number, got {}", args.scale);
    }
    let options = load_options(&args)?;
    debug!(?options, "tree options");

    let raw = read_pages(&args.input)?;
    let pages = normalize_document(&raw, args.scale).context("normalizing pages")?;
    info!(pages = pages.len(), input = %args.input.display(), "loaded document");

    let extractor = TreeExtractor::new(pages, options).with_detection(args.strategy.into());
    let trees = extractor.build().context("building layout trees")?;

    let mut out: Box<dyn Write> = match &args.outfile {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("creating {}", path.display()))?,
        )),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };
    match args.format {
        Format::Html => {
            let mut renderer = HocrRenderer::new(&mut out);
            renderer.render(&extractor, &trees).context("writing hOCR")?;
        }
        Format::Json => {
            serde_json::to_writer_pretty(&mut out, &trees).context("writing trees")?;
            writeln!(out)?;
        }
    }
    out.flush()?;
    Ok(())
}
