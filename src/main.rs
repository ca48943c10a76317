//! AQI Forecast - Main Entry Point

use aqi_forecast::cli::{
    cmd_backfill, cmd_features, cmd_fetch, cmd_predict, cmd_status, cmd_train, Cli, Commands,
};
use aqi_forecast::config::ForecastConfig;
use aqi_forecast::pipeline::Pipeline;
use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "aqi_forecast=info".into()),
        )
        .init();

    let cli = Cli::parse();
    let mut config = ForecastConfig::load(cli.config.as_deref())?;

    if let Some(Commands::Backfill { days: Some(days) }) = &cli.command {
        config.backfill_days = *days;
    }
    let pipeline = Pipeline::local(config);

    match cli.command {
        Some(Commands::Fetch) => cmd_fetch(&pipeline).await?,
        Some(Commands::Backfill { .. }) => cmd_backfill(&pipeline).await?,
        Some(Commands::Features) => cmd_features(&pipeline)?,
        Some(Commands::Train) => cmd_train(&pipeline)?,
        Some(Commands::Predict { json }) => cmd_predict(&pipeline, json)?,
        Some(Commands::Status) | None => cmd_status(&pipeline)?,
    }

    Ok(())
}
