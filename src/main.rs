use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use catalog_sync::api::{ApiServer, AppState};
use catalog_sync::config::SyncConfig;
use catalog_sync::database_ops::{db::Db, lookup};
use catalog_sync::{logging, sync};
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "catalog-sync", version, about = "Catalog feed sync and product lookup")]
struct Cli {
    /// Override FEED_DIR
    #[arg(long, global = true)]
    feed_dir: Option<PathBuf>,
    /// Override DATABASE_URL
    #[arg(long, global = true)]
    database_url: Option<String>,
    /// Create missing catalog tables before running the command
    #[arg(long, global = true)]
    init_schema: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run one full sync (products, inventory, prices)
    Sync,
    /// Print the merged view of one SKU as JSON
    Product { sku: String },
    /// Serve the HTTP API
    Serve,
}

#[actix_web::main]
async fn main() -> Result<ExitCode> {
    logging::init_tracing(logging::DEFAULT_FILTER)?;
    let cli = Cli::parse();

    let mut config = SyncConfig::from_env();
    if let Some(dir) = cli.feed_dir {
        config.feed_dir = dir;
    }
    if let Some(url) = cli.database_url {
        config.database_url = url;
    }
    config.bootstrap_schema |= cli.init_schema;

    let db = Db::from_config(&config).await?;

    match cli.command {
        Command::Sync => {
            let report = sync::run_sync(&db, &config).await?;
            for (feed, outcome) in &report.passes {
                match outcome {
                    Ok(r) => println!(
                        "{feed:<10} ok      read={} skipped={} inserted={} updated={}",
                        r.read, r.skipped, r.inserted, r.updated
                    ),
                    Err(e) => println!("{feed:<10} failed  {e}"),
                }
            }
            if report.is_complete() {
                Ok(ExitCode::SUCCESS)
            } else {
                Ok(ExitCode::FAILURE)
            }
        }
        Command::Product { sku } => match lookup::get_product_details(&db, &sku).await? {
            Some(details) => {
                let json = serde_json::to_string_pretty(&details)
                    .context("failed to encode product details")?;
                println!("{json}");
                Ok(ExitCode::SUCCESS)
            }
            None => {
                eprintln!("Product not found");
                Ok(ExitCode::FAILURE)
            }
        },
        Command::Serve => {
            ApiServer::from_env()?.run(AppState { db, config }).await?;
            Ok(ExitCode::SUCCESS)
        }
    }
}
