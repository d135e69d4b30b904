//! Yearwise - Year-bucketed CSV merger & spending chart viewer
//!
//! `merge` buckets quarterly CSV extracts into one processed file per year.
//! `analyze` loads those files, prints summary statistics and shows the
//! six charts in a window or writes them as PNGs.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use eframe::egui;
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;
use yearwise::charts::{ChartData, StaticChartRenderer};
use yearwise::config::AppConfig;
use yearwise::data::{AnalysisError, AnalysisTable, YearMerger};
use yearwise::gui::ViewerApp;

#[derive(Parser)]
#[command(name = "yearwise", version, about, long_about = None)]
struct Cli {
    /// Configuration file (defaults to ./yearwise.toml when present)
    #[arg(short, long, env = "YEARWISE_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Merge raw CSV files into one processed file per year
    Merge {
        /// Folder holding the raw CSV files
        #[arg(long)]
        input_dir: Option<PathBuf>,

        /// Folder receiving merged_data_{year}_processed.csv
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Years to extract, e.g. --years 2018,2020,2023
        #[arg(long, value_delimiter = ',')]
        years: Option<Vec<i32>>,

        /// Column holding the quarter code
        #[arg(long)]
        quarter_column: Option<String>,
    },

    /// Analyze the processed files and show the charts
    Analyze {
        /// Folder holding the processed files
        #[arg(long)]
        processed_dir: Option<PathBuf>,

        /// Write the charts as PNG files into this folder
        #[arg(long)]
        out: Option<PathBuf>,

        /// Do not open the chart window
        #[arg(long)]
        no_window: bool,

        /// Open the written PNG files with the system viewer
        #[arg(long, requires = "out")]
        open: bool,

        /// Seed for the scatter jitter
        #[arg(long)]
        seed: Option<u64>,
    },
}

fn init_logging(verbose: bool) {
    let default = if verbose { "yearwise=debug" } else { "yearwise=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = AppConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;

    match cli.command {
        Command::Merge {
            input_dir,
            output_dir,
            years,
            quarter_column,
        } => {
            if let Some(dir) = input_dir {
                config.merge.input_dir = dir;
            }
            if let Some(dir) = output_dir {
                config.merge.output_dir = dir;
            }
            if let Some(years) = years {
                config.years = years;
            }
            if let Some(column) = quarter_column {
                config.merge.quarter_column = column;
            }
            config.validate()?;
            run_merge(&config)
        }
        Command::Analyze {
            processed_dir,
            out,
            no_window,
            open,
            seed,
        } => {
            if let Some(dir) = processed_dir {
                config.analysis.processed_dir = dir;
            }
            if seed.is_some() {
                config.analysis.scatter.seed = seed;
            }
            config.validate()?;
            run_analyze(config, out, no_window, open)
        }
    }
}

fn run_merge(config: &AppConfig) -> Result<()> {
    let merger = YearMerger::new(&config.years, &config.merge.quarter_column);
    let summary = merger
        .run(&config.merge.input_dir, &config.merge.output_dir)
        .with_context(|| format!("Merge of {} failed", config.merge.input_dir.display()))?;

    tracing::info!(
        written = summary.outputs.len(),
        empty = summary.empty_years.len(),
        "Merge finished"
    );
    Ok(())
}

fn run_analyze(config: AppConfig, out: Option<PathBuf>, no_window: bool, open: bool) -> Result<()> {
    let analysis = &config.analysis;
    let table = match AnalysisTable::load(&analysis.processed_dir, &config.years, analysis) {
        Ok(table) => table,
        Err(e @ AnalysisError::CardColumnNotFound { .. }) => {
            println!("{e}");
            std::process::exit(1);
        }
        Err(e) => {
            return Err(e).with_context(|| {
                format!("Cannot analyze {}", analysis.processed_dir.display())
            })
        }
    };

    println!("Card amount column: {}", table.card_column());
    println!("Rows: {}\n", table.height());

    let data = ChartData::build(&table, &analysis.scatter).context("Failed to compute chart data")?;
    print!("{}", data.summary_table(&table));

    if let Some(dir) = &out {
        let renderer = StaticChartRenderer::new(
            &config.charts.font,
            (config.charts.width, config.charts.height),
        );
        let written = renderer
            .render_all(&data, dir)
            .with_context(|| format!("Failed to render charts into {}", dir.display()))?;
        println!("\nWrote {} charts to {}", written.len(), dir.display());

        if open {
            for path in &written {
                if let Err(e) = open::that(path) {
                    tracing::warn!(path = %path.display(), error = %e, "Cannot open chart");
                }
            }
        }
    }

    if no_window {
        return Ok(());
    }

    let summary = format!("{} rows, card column {}", table.height(), table.card_column());
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 800.0])
            .with_min_inner_size([1000.0, 600.0])
            .with_title("Yearwise"),
        ..Default::default()
    };

    eframe::run_native(
        "Yearwise",
        options,
        Box::new(move |cc| Ok(Box::new(ViewerApp::new(cc, config, Some(data), Some(summary))))),
    )
    .map_err(|e| anyhow::anyhow!("Chart window failed: {e}"))
}
