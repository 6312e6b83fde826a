//! tradelog - trade list view engine, command-line entry point.

use anyhow::Result;
use clap::Parser;
use tracing::info;

/// Filter, sort and page a trade journal the way the trade list does.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (can also be set via TRADELOG_CONFIG env var)
    #[arg(short, long)]
    config: Option<String>,

    /// JSON file with an array of trade records
    #[arg(short, long)]
    trades: String,

    /// Query string to open, e.g. "symbols=BTC&sort=pnl:desc"
    #[arg(short, long, default_value = "")]
    query: String,

    /// JSON session script to replay after the first render
    #[arg(short, long)]
    script: Option<String>,

    /// Print Prometheus metrics to stderr on exit
    #[arg(long)]
    metrics: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = tradelog_app::AppConfig::load(args.config.as_deref())?;
    tradelog_telemetry::init_logging(config.telemetry.log_filter.as_deref())?;
    info!("Starting tradelog v{}", env!("CARGO_PKG_VERSION"));

    let trades = tradelog_app::load_trades(&args.trades)?;
    info!(trades = trades.len(), path = %args.trades, "Trades loaded");

    // Parse the script before starting so a bad step fails fast.
    let actions = match &args.script {
        Some(path) => tradelog_app::load_script(path)?,
        None => Vec::new(),
    };

    let app = tradelog_app::Application::start(config, trades, &args.query).await?;
    if !actions.is_empty() {
        info!(steps = actions.len(), "Replaying session script");
        app.run_script(actions).await?;
    }

    let report = app.report().await?;
    println!("{}", serde_json::to_string_pretty(&report)?);

    if args.metrics {
        eprintln!("{}", tradelog_telemetry::Metrics::render()?);
    }

    app.shutdown().await;
    Ok(())
}
