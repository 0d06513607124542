mod records;
mod scenario;
mod simulate;

use std::path::PathBuf;
use std::sync::Arc;

use addrfix_store::{FileBackend, PersistenceStore};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::records::RecordsCommands;

#[derive(Debug, Parser)]
#[command(name = "addrfix")]
#[command(about = "Inspect and exercise the order address patch")]
struct Cli {
    /// Store file to use instead of `ADDRFIX_STORE_PATH`
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Inspect or clear persisted address records
    Records {
        #[command(subcommand)]
        command: RecordsCommands,
    },
    /// Capture an address label as the order detail view would
    Capture {
        #[arg(long)]
        order: String,
        #[arg(long)]
        label: String,
    },
    /// Restore the stored address onto a headless edit view
    Restore {
        #[arg(long)]
        order: String,
        /// Address option text, in control order (repeatable)
        #[arg(long = "option")]
        options: Vec<String>,
    },
    /// Run a scripted page session from a YAML file
    Replay { scenario: PathBuf },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = addrfix_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let store_path = cli.store.unwrap_or_else(|| config.store_path.clone());
    let store = Arc::new(PersistenceStore::new(
        config.namespace.clone(),
        FileBackend::new(store_path),
    ));
    let config = Arc::new(config);

    match cli.command {
        Some(Commands::Records { command }) => records::run(&store, command)?,
        Some(Commands::Capture { order, label }) => {
            simulate::capture(config, store, &order, &label).await?;
        }
        Some(Commands::Restore { order, options }) => {
            simulate::restore(config, store, &order, &options).await?;
        }
        Some(Commands::Replay { scenario }) => {
            let scenario = scenario::Scenario::load(&scenario)?;
            simulate::replay(config, store, scenario).await?;
        }
        None => println!("addrfix: nothing to do (see --help)"),
    }

    Ok(())
}
