use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

mod catalog;
mod config;
mod constants;
mod error;
mod imaging;
mod logging;
mod server;
mod slots;
mod types;

use crate::catalog::{load_catalog, serializer, CatalogStore};
use crate::config::Config;
use crate::slots::SlotManager;

#[derive(Parser)]
#[command(name = "product-image-tool")]
#[command(about = "Local web tool for managing product image sets")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the web server
    Serve {
        /// Override the configured port
        #[arg(long)]
        port: Option<u16>,
    },
    /// Load the catalog and write the slotted backup CSV, then exit
    Export {
        /// Output path (defaults to the configured backup file)
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init_logging();

    let cli = Cli::parse();
    let config = Config::load()?;

    match cli.command {
        Commands::Serve { port } => {
            let port = port.unwrap_or(config.server.port);

            let products = load_catalog(&config.paths.source_csv, &config.paths.backup_csv)?;
            info!(count = products.len(), "Catalog ready");

            let store = Arc::new(CatalogStore::new(products, config.paths.backup_csv.clone()));
            let manager = Arc::new(SlotManager::new(store.clone(), &config));
            manager.prepare_dirs()?;

            server::start_server(store, manager, Arc::new(config), port).await?;
        }
        Commands::Export { output } => {
            let products = load_catalog(&config.paths.source_csv, &config.paths.backup_csv)?;
            let output = output.unwrap_or_else(|| config.paths.backup_csv.clone());
            serializer::write_backup(&products, &output)?;
            println!("✅ Exported {} products to {}", products.len(), output.display());
        }
    }
    Ok(())
}
