use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use sales_forecast::telemetry::init_tracing;
use sales_forecast::utils::date_parser;
use sales_forecast::{DataLoader, ForecastConfig, ForecastController, ForecastRequest};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "sales-forecast", version, about = "Forecast daily sales from transaction records")]
struct Cli {
    /// Sales records as JSON or CSV.
    #[arg(long, env = "SALES_FORECAST_INPUT")]
    input: PathBuf,

    /// Number of days to forecast.
    #[arg(long)]
    days: Option<usize>,

    /// Store identifier attached to the result.
    #[arg(long, env = "SALES_FORECAST_STORE", default_value = "default")]
    store: String,

    /// Last day of history to use (YYYY-MM-DD).
    #[arg(long)]
    as_of: Option<String>,

    /// Days of history to consider; 0 uses everything.
    #[arg(long)]
    lookback_days: Option<u32>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();

    let mut config = ForecastConfig::from_env();
    if let Some(days) = cli.lookback_days {
        config.lookback_days = if days == 0 { None } else { Some(days) };
    }

    let records = DataLoader::from_path(&cli.input)
        .with_context(|| format!("failed to load {}", cli.input.display()))?;
    info!(records = records.len(), path = %cli.input.display(), "loaded sales records");

    let mut request = ForecastRequest::new(cli.store, records);
    if let Some(days) = cli.days {
        request = request.with_days(days);
    }
    if let Some(as_of) = cli.as_of.as_deref() {
        request = request.with_as_of(date_parser::parse_date(as_of)?);
    }

    let controller = ForecastController::new(config)?;
    let outcome = controller.forecast(&request).await?;
    info!(
        tier = %outcome.tier,
        confidence = outcome.result.model_confidence,
        alerts = outcome.alerts.len(),
        "forecast complete"
    );

    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(())
}
