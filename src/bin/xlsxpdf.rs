//! CLI tool to convert Excel sheets into PDF tables
//!
//! Each selected sheet becomes `<prefix>_<sheet>.pdf` in the output directory.
//!
//! # Usage
//!
//! ```bash
//! # Convert every sheet into ./out
//! xlsxpdf report.xlsx -o out
//!
//! # Convert two sheets, wrapping long text
//! xlsxpdf report.xlsx --sheet Summary --sheet Details --wrap 30
//!
//! # List sheets with their trimmed size
//! xlsxpdf report.xlsx --list
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use xlsxpdf::{
    ConvertOptions, ConverterBuilder, EmptyCellRule, GridProvider, Preset, SheetSelector,
    WorkbookParser,
};

/// Convert Excel sheets into paginated PDF tables
#[derive(Parser, Debug)]
#[command(name = "xlsxpdf")]
#[command(version, about, long_about = None)]
struct Args {
    /// Input XLSX file
    input: PathBuf,

    /// Output directory
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,

    /// Sheet to convert (repeatable; default: all sheets)
    #[arg(short, long = "sheet")]
    sheets: Vec<String>,

    /// Output file name prefix (default: workbook file name)
    #[arg(long)]
    prefix: Option<String>,

    /// List sheets with their row/column counts and exit
    #[arg(long)]
    list: bool,

    /// Use the direct conversion constants (threshold 6, 15 mm margins, clipped text)
    #[arg(long)]
    direct: bool,

    /// Ignore cell formatting (bold, fills, alignment)
    #[arg(long)]
    no_format: bool,

    /// Size columns by their content instead of evenly
    #[arg(long)]
    content_widths: bool,

    /// Switch to landscape above this many columns
    #[arg(long)]
    threshold: Option<usize>,

    /// Truncate cell text to this many characters
    #[arg(long, conflicts_with_all = ["wrap", "clip"])]
    truncate: Option<usize>,

    /// Wrap cell text at this many characters
    #[arg(long, conflicts_with = "clip")]
    wrap: Option<usize>,

    /// Draw cell text as-is, clipped to the cell
    #[arg(long)]
    clip: bool,

    /// Repeat the header row on continuation pages
    #[arg(long)]
    repeat_header: bool,

    /// Compress PDF streams
    #[arg(long)]
    compress: bool,

    /// Render sheets in parallel
    #[arg(long)]
    parallel: bool,

    /// Load options from a JSON file (flags override it)
    #[arg(long)]
    options: Option<PathBuf>,

    /// Report format
    #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
    report: ReportFormat,

    /// Verbose output (-v: info, -vv: debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum ReportFormat {
    Text,
    Json,
}

fn builder_from_args(args: &Args) -> Result<ConverterBuilder> {
    let preset = if args.direct {
        Preset::Direct
    } else {
        Preset::StylePreserving
    };
    let mut options = ConvertOptions::from_preset(preset);
    if let Some(path) = &args.options {
        options = options
            .overlay_json_file(path)
            .with_context(|| format!("Failed to load options from {}", path.display()))?;
    }
    let mut builder = ConverterBuilder::new().with_options(options);

    if args.no_format {
        builder = builder.preserve_formatting(false);
    }
    if args.content_widths {
        builder = builder.with_content_aware_widths(true);
    }
    if let Some(threshold) = args.threshold {
        builder = builder.with_orientation_threshold(threshold);
    }
    if let Some(max_chars) = args.truncate {
        builder = builder.with_truncate_length(max_chars);
    }
    if let Some(width) = args.wrap {
        builder = builder.with_word_wrap(width);
    }
    if args.clip {
        builder = builder.with_clip();
    }
    if args.repeat_header {
        builder = builder.repeat_header(true);
    }
    if args.compress {
        builder = builder.compress(true);
    }
    if args.parallel {
        builder = builder.parallel(true);
    }
    if !args.sheets.is_empty() {
        builder = builder.with_sheet_selector(SheetSelector::Names(args.sheets.clone()));
    }
    Ok(builder)
}

/// シート名とトリム後の行数・列数を列挙
fn sheet_sizes(
    provider: &mut dyn GridProvider,
    rule: EmptyCellRule,
) -> Result<Vec<(String, usize, usize)>> {
    let mut sizes = Vec::new();
    for name in provider.sheet_names() {
        let grid = provider.get_cells(&name)?.trim(rule);
        sizes.push((name, grid.row_count(), grid.column_count()));
    }
    Ok(sizes)
}

fn list_sheets(args: &Args, rule: EmptyCellRule) -> Result<()> {
    let mut parser = WorkbookParser::open_path(&args.input)
        .with_context(|| format!("Failed to open {}", args.input.display()))?;

    for (name, rows, columns) in sheet_sizes(&mut parser, rule)? {
        println!("{}\t{} rows\t{} columns", name, rows, columns);
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let level = match args.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let converter = builder_from_args(&args)?
        .build()
        .context("Invalid conversion options")?;

    if args.list {
        return list_sheets(&args, converter.options().empty_cell_rule);
    }

    let report = converter
        .convert_workbook(&args.input, &args.output_dir, args.prefix.as_deref())
        .with_context(|| format!("Failed to convert {}", args.input.display()))?;

    match args.report {
        ReportFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        ReportFormat::Text => {
            for result in &report.results {
                match (&result.output_path, &result.error) {
                    (Some(path), _) => println!("  {} -> {}", result.sheet_name, path.display()),
                    (None, error) => println!(
                        "  {} failed: {}",
                        result.sheet_name,
                        error.as_deref().unwrap_or("unknown error")
                    ),
                }
            }
            println!("{}", report.summary());
            if !report.all_succeeded() {
                println!("Failed sheets: {}", report.failed_sheets().join(", "));
            }
        }
    }

    if !report.all_succeeded() {
        std::process::exit(1);
    }
    Ok(())
}
