//! FastBTV CLI

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use btv_analysis::{Background, HistAxis, OperatingPoint, RocOptions, RocSelection};

mod efficiency;
mod roc;
mod run;

#[derive(Parser)]
#[command(name = "fastbtv")]
#[command(about = "FastBTV - b-tagging discriminator validation")]
#[command(version)]
struct Cli {
    /// Log verbosity level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "warn")]
    log_level: tracing::Level,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Process an event stream into the jet table and score histograms
    Run {
        /// Analyzer configuration (YAML)
        #[arg(short, long)]
        config: PathBuf,

        /// Events (JSON lines)
        #[arg(short, long)]
        input: PathBuf,

        /// Output directory (created if missing); receives tree.parquet and histograms.json
        #[arg(long)]
        out_dir: PathBuf,

        /// Stop after N events. Overrides `maxEvents` from the config.
        #[arg(long)]
        max_events: Option<u64>,
    },

    /// Tagging efficiency and mistag rates from stored histograms
    Efficiency {
        /// Histogram document written by `run`
        #[arg(long)]
        histograms: PathBuf,

        /// Alias group name (e.g. pfDeepFlavourJetTagsProbB)
        #[arg(long)]
        group: String,

        /// X axis of the profile (pt, eta, pu)
        #[arg(long, default_value = "pt")]
        axis: HistAxis,

        /// Operating point as name=threshold; repeatable
        #[arg(long = "op", required = true)]
        ops: Vec<OperatingPoint>,

        /// Merge this many adjacent x bins (must divide the bin count)
        #[arg(long, default_value = "10")]
        rebin: usize,

        /// Output file for results (pretty JSON). Defaults to stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// ROC curves (b efficiency vs mistag) from the jet table
    Roc {
        /// Jet table written by `run` (tree.parquet)
        #[arg(long)]
        tree: PathBuf,

        /// Discriminator column (a sum group name, e.g. DeepFlavour)
        #[arg(long)]
        column: String,

        /// Background flavour (light, c); repeatable. Defaults to both.
        #[arg(long = "vs", default_values = ["light", "c"])]
        backgrounds: Vec<Background>,

        /// Minimum jet pt (exclusive)
        #[arg(long, default_value = "100")]
        pt_min: f64,

        /// Maximum jet |eta| (inclusive)
        #[arg(long, default_value = "2.5")]
        abs_eta_max: f64,

        /// Bootstrap replicas for an uncertainty band (0 = off)
        #[arg(long, default_value = "0")]
        bootstrap: usize,

        /// Seed for the bootstrap
        #[arg(long, default_value = "42")]
        seed: u64,

        /// Output file for results (pretty JSON). Defaults to stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print resolved alias groups and sum groups for a configuration
    Groups {
        /// Analyzer configuration (YAML)
        #[arg(short, long)]
        config: PathBuf,

        /// Output file (pretty JSON). Defaults to stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(cli.log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Run { config, input, out_dir, max_events } => {
            run::cmd_run(&config, &input, &out_dir, max_events)
        }
        Commands::Efficiency { histograms, group, axis, ops, rebin, output } => {
            efficiency::cmd_efficiency(&histograms, &group, axis, &ops, rebin, output.as_ref())
        }
        Commands::Roc {
            tree,
            column,
            backgrounds,
            pt_min,
            abs_eta_max,
            bootstrap,
            seed,
            output,
        } => {
            let options =
                RocOptions { selection: RocSelection { pt_min, abs_eta_max }, bootstrap, seed };
            roc::cmd_roc(&tree, &column, &backgrounds, &options, output.as_ref())
        }
        Commands::Groups { config, output } => run::cmd_groups(&config, output.as_ref()),
    }
}

fn write_json(output: Option<&PathBuf>, value: serde_json::Value) -> Result<()> {
    if let Some(path) = output {
        std::fs::write(path, serde_json::to_string_pretty(&value)?)?;
    } else {
        println!("{}", serde_json::to_string_pretty(&value)?);
    }
    Ok(())
}
