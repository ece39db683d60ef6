//! `tabkit`: split one workbook by a column, or merge several into one.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tabkit_io_fs::filter_workbook_paths;
use tabkit_io_xlsx::{
    ProgressCallback, SpecMergeOptions, SpecSplitOptions, merge_workbooks, read_headers,
    split_workbook,
};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser)]
#[command(name = "tabkit")]
#[command(author, version, about = "Split and merge .xlsx workbooks", long_about = None)]
struct Cli {
    /// Verbose output (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the header row of the active sheet
    Headers {
        /// Source workbook
        file: PathBuf,
    },
    /// Write one workbook per distinct value of a column
    Split {
        /// Source workbook
        file: PathBuf,

        /// Header text of the column to split by
        #[arg(short, long)]
        column: String,

        /// Directory that receives the run's `output_<timestamp>` folder
        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,

        /// Log progress every N rows (0 disables the cadence)
        #[arg(long, default_value_t = tabkit_io_xlsx::conf::N_PROGRESS_EVERY_ROWS)]
        progress_every: usize,
    },
    /// Append the data rows of several workbooks under one header
    Merge {
        /// Source workbooks, in merge order; non-.xlsx paths are ignored
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Directory that receives the run's `output_<timestamp>` folder
        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,
    },
}

fn init_tracing(verbose: u8) {
    let c_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(c_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn run_headers(file: &Path) -> Result<()> {
    let l_headers = read_headers(file)?;
    for (n_idx, c_header) in l_headers.iter().enumerate() {
        println!("{}\t{c_header}", n_idx + 1);
    }
    Ok(())
}

fn run_split(file: &Path, column: &str, output_dir: &Path, progress_every: usize) -> Result<()> {
    let options = SpecSplitOptions {
        progress_every_rows: progress_every,
        ..Default::default()
    };
    let mut on_progress = |n_rows: usize, n_groups: usize| {
        tracing::info!(rows = n_rows, groups = n_groups, "split progress");
    };
    let progress: ProgressCallback<'_> = &mut on_progress;

    let report = split_workbook(file, output_dir, column, Some(progress), &options)?;
    println!("{report}");
    for path_out in &report.files_written {
        println!("{}", path_out.display());
    }
    Ok(())
}

fn run_merge(files: &[PathBuf], output_dir: &Path) -> Result<()> {
    let l_paths = filter_workbook_paths(files).context("failed to filter input workbooks")?;
    if l_paths.len() < files.len() {
        tracing::warn!(
            ignored = files.len() - l_paths.len(),
            "ignored inputs without an .xlsx extension"
        );
    }

    let report = merge_workbooks(&l_paths, output_dir, &SpecMergeOptions::default())?;
    println!("{report}");
    println!("{}", report.file_written.display());
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Headers { file } => run_headers(&file),
        Commands::Split {
            file,
            column,
            output_dir,
            progress_every,
        } => run_split(&file, &column, &output_dir, progress_every),
        Commands::Merge { files, output_dir } => run_merge(&files, &output_dir),
    }
}
