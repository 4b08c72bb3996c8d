use std::sync::Arc;
use anyhow::Context;
use clap::Parser;
use seatline_inventory::InventoryManager;
use seatline_store::{app_config::Config, DbClient, PostgresFlightStore};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;

use cli::{Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "seatline_admin=info,seatline_inventory=info,seatline_store=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    info!("Starting seatline-admin");
    let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".into());
    let config = Config::load().context("Failed to load config")?;
    info!("Loaded config (run mode: {})", run_mode);

    let db = DbClient::new(&config.database)
        .await
        .context("Failed to connect to Postgres")?;

    let command = match cli.command {
        Command::Migrate => {
            info!("Applying migrations");
            db.migrate().await.context("Migration failed")?;
            info!("Migrations applied");
            return Ok(());
        }
        Command::Inventory(command) => command,
    };

    let store = Arc::new(PostgresFlightStore::new(db.pool.clone()));
    let manager = InventoryManager::new(store, config.inventory.clone());

    info!("Running {}", command.name());
    let output = cli::run(&manager, command).await?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
