use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "triage")]
#[command(version = "0.1.0")]
#[command(about = "Health risk prediction: offline trainer and serving API", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config directory (reads <dir>/default.toml when present)
    #[arg(short, long, default_value = "config")]
    pub config: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fit the forest and the encoders from a CSV dataset
    Train {
        /// Input CSV path (default: data/dataset.csv)
        #[arg(long)]
        data: Option<PathBuf>,
        /// Output directory for the artifacts (default: model)
        #[arg(long)]
        out: Option<PathBuf>,
        /// Number of trees in the forest (default: 100)
        #[arg(long)]
        trees: Option<usize>,
        /// Seed for the split and the forest (default: 42)
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Serve the prediction API from trained artifacts
    Serve {
        /// Artifact directory (default: model)
        #[arg(long)]
        model_dir: Option<PathBuf>,
        /// Bind host (default: 0.0.0.0)
        #[arg(long)]
        host: Option<String>,
        /// Bind port (default: 5000)
        #[arg(long)]
        port: Option<u16>,
    },
}
