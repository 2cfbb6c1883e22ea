use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};

use shape_moments_lib::{
    extract_feature_dataset, generate_mask_dataset, run_dataset, Config, DatasetReport, LogBase,
    Strategy,
};

type Task = fn(&Config) -> shape_moments_lib::Result<DatasetReport>;

/// Command-line arguments
#[derive(Parser, Debug)]
#[clap(author, version, about = "Shape moments - mask segmentation and moment features")]
struct Args {
    #[clap(subcommand)]
    command: Command,

    /// Path to configuration file
    #[clap(short, long, default_value = "config.toml", global = true)]
    config: String,

    /// Print per-image details
    #[clap(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Segment raw class folders into binary mask folders
    Segment(DatasetArgs),
    /// Measure stored masks and write the feature CSV files
    Extract(DatasetArgs),
    /// Segment raw class folders and measure them in one pass
    Run(DatasetArgs),
    /// Write the default configuration to the config path
    InitConfig,
}

#[derive(clap::Args, Debug)]
struct DatasetArgs {
    /// Directory holding one subdirectory per class
    #[clap(short, long)]
    input: Option<String>,

    /// Output directory
    #[clap(short, long)]
    output: Option<String>,

    /// Dataset name used in logs and the report
    #[clap(short, long)]
    name: Option<String>,

    /// Segmentation strategy (overwrites config)
    #[clap(short, long)]
    strategy: Option<StrategyArg>,

    /// Sampling seed (overwrites config)
    #[clap(long)]
    seed: Option<u64>,

    /// Logarithm of the log-scale normaliser (overwrites config)
    #[clap(long)]
    log_base: Option<LogBaseArg>,

    /// Process images one at a time
    #[clap(long)]
    sequential: bool,

    /// Also write hog.csv
    #[clap(long)]
    hog: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum StrategyArg {
    Cell,
    Chroma,
    Otsu,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogBaseArg {
    Natural,
    Base10,
}

impl DatasetArgs {
    fn apply(&self, config: &mut Config) {
        if let Some(input) = self.input.clone() {
            config.input_path = input;
        }

        if let Some(output) = self.output.clone() {
            config.output_base_dir = output;
        }

        if let Some(name) = self.name.clone() {
            config.dataset_name = name;
        }

        if let Some(strategy) = self.strategy {
            config.strategy = match strategy {
                StrategyArg::Cell => Strategy::CellMorphology,
                StrategyArg::Chroma => Strategy::ChromaKey,
                StrategyArg::Otsu => Strategy::GlobalOtsu,
            };
        }

        if let Some(seed) = self.seed {
            config.seed = seed;
        }

        if let Some(base) = self.log_base {
            config.log_base = match base {
                LogBaseArg::Natural => LogBase::Natural,
                LogBaseArg::Base10 => LogBase::Base10,
            };
        }

        if self.sequential {
            config.use_parallel = false;
        }

        if self.hog {
            config.extract_hog = true;
        }
    }
}

/// Write the built-in defaults, ignoring whatever the file currently holds
fn init_config(path: &str) -> anyhow::Result<()> {
    Config::default()
        .save_to_file(path)
        .with_context(|| format!("writing configuration to {}", path))
}

/// Main function
fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let default_filter = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter)).init();

    let (dataset_args, task): (&DatasetArgs, Task) = match &args.command {
        Command::InitConfig => {
            init_config(&args.config)?;
            log::info!("Default configuration written to {}", args.config);
            return Ok(());
        }
        Command::Segment(a) => (a, generate_mask_dataset as Task),
        Command::Extract(a) => (a, extract_feature_dataset as Task),
        Command::Run(a) => (a, run_dataset as Task),
    };

    let mut config = Config::from_file_or_default(&args.config)
        .with_context(|| format!("loading configuration from {}", args.config))?;
    dataset_args.apply(&mut config);
    config.validate().context("invalid configuration")?;

    let output_base = PathBuf::from(&config.output_base_dir);
    std::fs::create_dir_all(&output_base)
        .with_context(|| format!("creating output directory {}", output_base.display()))?;

    let start_time = Instant::now();
    log::info!(
        "Dataset {} ({}), input {}",
        config.dataset_name,
        config.strategy.name(),
        config.input_path
    );

    let report = task(&config)
        .with_context(|| format!("processing dataset {}", config.dataset_name))?;

    log::info!(
        "Processing completed in {:.2} seconds, outputs in {}",
        start_time.elapsed().as_secs_f64(),
        output_base.display()
    );
    if !report.skipped.is_empty() {
        log::info!("See {} for skipped items", output_base.join("report.json").display());
    }

    Ok(())
}
