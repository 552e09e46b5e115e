use crate::app::App;
use crate::config::{Cli, Config};
use crate::persistence::FileSnapshotStore;
use crate::reservoir::ReservoirClient;
use clap::Parser;
use log::info;
use tracing_subscriber::{EnvFilter, fmt};

mod app;
mod config;
mod data;
mod flatten;
mod paginator;
mod persistence;
mod reservoir;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(env_filter).init();

    let cli = Cli::parse();
    let config_path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    let config = Config::load(std::path::Path::new(&config_path))?;
    let contract = cli.contract_or(&config.fallback_contract);

    let source = ReservoirClient::new(config.api_url.clone(), config.api_key.clone());
    let store = FileSnapshotStore::new(config.output_dir.clone());
    let app = App::new(source, store, config.page_limit);

    let saved = app.run(&contract).await?;
    info!(
        "Snapshot written to {} and {}",
        saved.csv_path.display(),
        saved.json_path.display()
    );

    Ok(())
}
