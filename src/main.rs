//! urban-explore CLI: offline pipeline stages and the participant service

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use urban_explore::{pipeline, server, AssignmentStore, Config, Profile};

#[derive(Parser)]
#[command(name = "urban-explore")]
#[command(about = "POI sets for mobility workshop participants")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, env = "URBAN_EXPLORE_CONFIG", default_value = "urban-explore.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Categorize raw POIs and clip them to the region
    Categorize,

    /// Drop unnamed and banned POIs
    Refine,

    /// Generate numbered sets per profile
    GenerateSets {
        /// Only this profile (default: all)
        #[arg(short, long)]
        profile: Option<String>,

        /// Sets per profile (overrides config)
        #[arg(short = 'n', long)]
        count: Option<usize>,

        /// RNG seed (overrides config)
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Run the participant service
    Serve {
        #[arg(long, env = "MAPBOX_API_KEY", hide_env_values = true)]
        mapbox_api_key: String,

        /// Listen address (overrides config)
        #[arg(long, env = "LISTEN")]
        listen: Option<SocketAddr>,
    },

    /// Delete every assignment
    ResetDb,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "urban_explore=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut config = Config::load(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;

    match cli.command {
        Command::Categorize => {
            pipeline::categorize(&config.pipeline)?;
        }
        Command::Refine => {
            pipeline::refine(&config.pipeline)?;
        }
        Command::GenerateSets { profile, count, seed } => {
            let profiles = match profile {
                Some(name) => vec![name.parse::<Profile>()?],
                None => Profile::ALL.to_vec(),
            };
            let count = count.unwrap_or(config.sets.per_profile);
            anyhow::ensure!(count > 0, "--count must be at least 1");

            let reports =
                pipeline::generate_sets(&config.pipeline, &config.sets, &profiles, count, seed)?;
            for (profile, report) in reports {
                println!(
                    "{}: {} written, {} partial, {} not generated",
                    profile,
                    report.written.len(),
                    report.partial.len(),
                    report.empty.len()
                );
            }
        }
        Command::Serve { mapbox_api_key, listen } => {
            if let Some(listen) = listen {
                config.server.listen = listen;
            }
            info!("Starting urban-explore service");
            info!("Static dir: {}", config.server.static_dir.display());
            info!("Database: {}", config.store.db_path.display());
            server::run(&config, mapbox_api_key).await?;
        }
        Command::ResetDb => {
            let store = AssignmentStore::open(&config.store.db_path)?;
            let removed = store.reset()?;
            println!("Removed {} assignments", removed);
        }
    }

    Ok(())
}
