use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

mod commands;

use commands::{
    CatalogCommand, CategoryCommand, ConfigCommand, OrderCommand, RecipeCommand, SyncCommand,
};
use menuhub::config::Config;
use menuhub_core::{
    CatalogService, Cloudinary, OrderService, PublicCatalog, RestStore, SyncEngine,
};

#[derive(Parser)]
#[command(name = "menuhub")]
#[command(version)]
#[command(about = "Manage a restaurant catalog and its public storefront", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage the restaurant's categories
    Category(CategoryCommand),

    /// Manage the restaurant's recipes
    Recipe(RecipeCommand),

    /// Place and track customer orders
    Order(OrderCommand),

    /// Publish the catalog to the public collections
    Sync(SyncCommand),

    /// Browse the public catalog
    Catalog(CatalogCommand),

    /// Manage configuration
    Config(ConfigCommand),
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(cli.config.clone())?;

    match cli.command {
        Some(Commands::Category(cmd)) => {
            let catalog = catalog_service(&config)?;
            cmd.run(&catalog, &config).await?;
        }
        Some(Commands::Recipe(cmd)) => {
            let catalog = catalog_service(&config)?;
            cmd.run(&catalog, &config).await?;
        }
        Some(Commands::Order(cmd)) => {
            cmd.run(&OrderService::new(connect(&config)?), &config).await?;
        }
        Some(Commands::Sync(cmd)) => {
            let engine = SyncEngine::new(connect(&config)?).with_retention(config.retention.value);
            cmd.run(&engine, &config).await?;
        }
        Some(Commands::Catalog(cmd)) => {
            cmd.run(PublicCatalog::new(connect(&config)?)).await?;
        }
        Some(Commands::Config(cmd)) => {
            cmd.run(&config, cli.config.as_deref())?;
        }
        None => {
            println!("Use --help to see available commands");
        }
    }

    Ok(())
}

fn connect(config: &Config) -> Result<Arc<RestStore>, Box<dyn std::error::Error>> {
    config.require_project()?;
    Ok(Arc::new(
        RestStore::new(config.store_config()).with_retry(config.retry),
    ))
}

fn catalog_service(config: &Config) -> Result<CatalogService, Box<dyn std::error::Error>> {
    let store = connect(config)?;
    let engine = SyncEngine::new(store.clone()).with_retention(config.retention.value);
    let media = Arc::new(Cloudinary::new(config.media.clone()));
    Ok(CatalogService::new(store, media, engine))
}
