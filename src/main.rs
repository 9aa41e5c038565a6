use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use triage::cli::{Cli, Commands};
use triage::config::AppConfig;
use triage::error::{Result, TriageError};
use triage::{server, trainer};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging();

    // Load configuration; CLI flags override whatever the file and the
    // environment provided.
    let mut config = match AppConfig::load_from(&cli.config) {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to load configuration: {} - using defaults", e);
            AppConfig::default()
        }
    };

    match cli.command {
        Commands::Train {
            data,
            out,
            trees,
            seed,
        } => {
            if let Some(data) = data {
                config.training.dataset = data;
            }
            if let Some(out) = out {
                config.training.out_dir = out;
            }
            if let Some(trees) = trees {
                config.training.trees = trees;
            }
            if let Some(seed) = seed {
                config.training.seed = seed;
            }
            check(&config)?;
            trainer::run(&config.training)?;
        }
        Commands::Serve {
            model_dir,
            host,
            port,
        } => {
            if let Some(model_dir) = model_dir {
                config.server.model_dir = model_dir;
            }
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            check(&config)?;
            server::run(&config.server).await?;
        }
    }

    Ok(())
}

fn check(config: &AppConfig) -> Result<()> {
    config
        .validate()
        .map_err(|errors| TriageError::Validation(errors.join("; ")))
}

fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,triage=debug"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();
}
