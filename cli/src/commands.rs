//! Command implementations for tablediff CLI

use crate::cli::Commands;
use crate::output::{JsonFormatter, PrettyPrinter};
use crate::progress::ProgressReporter;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tablediff_core::config::{self, Config};
use tablediff_core::{CompareOptions, CsvSource, RowComparator};

/// What a command found, mapped to the process exit status by `main`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Clean,
    Differences,
}

/// Inputs and flags for the diff command
pub struct DiffArgs {
    pub left: PathBuf,
    pub right: PathBuf,
    pub keys: Vec<String>,
    pub batch_size: Option<usize>,
    pub no_sort: bool,
    pub delimiter: char,
    pub staging_dir: Option<PathBuf>,
    pub page_size: Option<usize>,
    pub show_identical: bool,
    pub summary_only: bool,
    pub json: bool,
}

/// Execute a command
pub fn execute_command(command: Commands) -> Result<Outcome> {
    let config = config::get_config().context("Failed to load configuration")?;
    match command {
        Commands::Diff {
            left,
            right,
            keys,
            batch_size,
            no_sort,
            delimiter,
            staging_dir,
            page_size,
            show_identical,
            summary_only,
            json,
        } => diff_command(
            config,
            DiffArgs {
                left,
                right,
                keys,
                batch_size,
                no_sort,
                delimiter,
                staging_dir,
                page_size,
                show_identical,
                summary_only,
                json,
            },
        ),
        Commands::Config { json } => {
            if json {
                JsonFormatter::print_config(&config)?;
            } else {
                PrettyPrinter::print_config(&config)?;
            }
            Ok(Outcome::Clean)
        }
    }
}

/// Command line flags take precedence over the loaded configuration
fn apply_overrides(mut config: Config, args: &DiffArgs) -> Result<Config> {
    if let Some(dir) = &args.staging_dir {
        config.staging.directory = Some(dir.clone());
    }
    if let Some(page_size) = args.page_size {
        config.staging.page_size = page_size;
    }
    if args.batch_size.is_some() {
        config.compare.batch_size = args.batch_size;
    }
    if args.no_sort {
        config.compare.sort = false;
    }
    config.validate()?;
    Ok(config)
}

fn open_source(path: &Path, keys: &[String], delimiter: char) -> Result<CsvSource> {
    let delimiter = u8::try_from(delimiter)
        .ok()
        .filter(u8::is_ascii)
        .with_context(|| format!("Delimiter must be a single ASCII character, got '{delimiter}'"))?;
    CsvSource::open_with_delimiter(path, keys, delimiter)
        .with_context(|| format!("Failed to open {}", path.display()))
}

pub fn diff_command(config: Config, args: DiffArgs) -> Result<Outcome> {
    let config = apply_overrides(config, &args)?;
    let options = CompareOptions::from(&config);
    let batch_size = config.compare.batch_size;

    let left = open_source(&args.left, &args.keys, args.delimiter)?;
    let right = open_source(&args.right, &args.keys, args.delimiter)?;
    if left.schema().value_columns.len() != right.schema().value_columns.len() {
        anyhow::bail!(
            "Inputs have different column counts: {} has {}, {} has {}",
            args.left.display(),
            left.schema().value_columns.len(),
            args.right.display(),
            right.schema().value_columns.len()
        );
    }
    if left.schema().value_columns != right.schema().value_columns {
        log::warn!(
            "Column names differ between inputs; columns are compared by position"
        );
    }
    let schema = left.schema().clone();

    log::info!(
        "Comparing {} with {} on key {:?}",
        args.left.display(),
        args.right.display(),
        args.keys
    );

    let mut progress = ProgressReporter::new(args.summary_only && !args.json);
    let left = left
        .into_source(batch_size)
        .with_context(|| format!("Failed to read {}", args.left.display()))?;
    let right = right
        .into_source(batch_size)
        .with_context(|| format!("Failed to read {}", args.right.display()))?;

    let mut stream = RowComparator::new(options)
        .compare(left, right)
        .context("Failed to stage inputs")?;
    progress.set_phase("Comparing rows...");

    let mut count = 0u64;
    for record in stream.by_ref() {
        let record = record.context("Comparison failed")?;
        count += 1;
        progress.records(count);

        if args.summary_only || (record.is_identical() && !args.show_identical) {
            continue;
        }
        if args.json {
            JsonFormatter::print_record(&record)?;
        } else {
            PrettyPrinter::print_record(&record, &schema);
        }
    }
    progress.finish();

    let summary = stream.summary();
    if args.json {
        JsonFormatter::print_summary(&summary)?;
    } else {
        PrettyPrinter::print_summary(&summary);
    }

    Ok(if summary.has_differences() {
        Outcome::Differences
    } else {
        Outcome::Clean
    })
}
