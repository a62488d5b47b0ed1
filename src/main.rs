/// main.rs — Volatility Report Entry Point
///
/// Runs the full analysis once:
///   1. Load config from .env, apply CLI overrides
///   2. Fetch daily closes for the configured ticker
///   3. Build returns, fit GARCH(1,1), run the vol-targeting overlay
///   4. Print the comparison report
use anyhow::Result;
use chrono::NaiveDate;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use vol_engine::config::AppConfig;
use vol_engine::data::ChartClient;
use vol_engine::engine::run_pipeline;

#[derive(Parser)]
#[command(name = "vol_report")]
#[command(about = "GARCH(1,1) vs realized volatility, with a volatility-targeting overlay")]
#[command(version)]
struct Cli {
    /// Ticker symbol (e.g. ^GSPC)
    #[arg(short, long)]
    ticker: Option<String>,

    /// Start date (YYYY-MM-DD)
    #[arg(long)]
    start_date: Option<NaiveDate>,

    /// End date (YYYY-MM-DD)
    #[arg(long)]
    end_date: Option<NaiveDate>,

    /// Annualized target volatility for the overlay
    #[arg(long)]
    target_vol: Option<f64>,

    /// Leverage floor
    #[arg(long)]
    min_leverage: Option<f64>,

    /// Leverage cap
    #[arg(long)]
    max_leverage: Option<f64>,

    /// Realized-vol rolling window (returns)
    #[arg(long)]
    rolling_window: Option<usize>,
}

impl Cli {
    fn apply(self, cfg: &mut AppConfig) {
        if let Some(t) = self.ticker {
            cfg.ticker = t;
        }
        if let Some(d) = self.start_date {
            cfg.start_date = d;
        }
        if let Some(d) = self.end_date {
            cfg.end_date = d;
        }
        if let Some(v) = self.target_vol {
            cfg.target_annual_vol = v;
        }
        if let Some(v) = self.min_leverage {
            cfg.min_leverage = v;
        }
        if let Some(v) = self.max_leverage {
            cfg.max_leverage = v;
        }
        if let Some(w) = self.rolling_window {
            cfg.rolling_window = w;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let mut cfg = AppConfig::from_env()?;
    cli.apply(&mut cfg);
    cfg.validate()?;

    info!(
        "Config: ticker={} range={}..{} W={} A={}",
        cfg.ticker, cfg.start_date, cfg.end_date, cfg.rolling_window, cfg.trading_days_per_year
    );
    info!(
        "Overlay: target_vol={:.2}% leverage=[{:.2}, {:.2}]",
        cfg.target_annual_vol * 100.0,
        cfg.min_leverage,
        cfg.max_leverage
    );

    let client = ChartClient::new()?;
    let prices = client
        .fetch_daily_closes(&cfg.ticker, cfg.start_date, cfg.end_date)
        .await?;
    info!("Loaded {} closes", prices.len());

    let report = run_pipeline(&prices, &cfg)?;
    println!("\n{report}");

    Ok(())
}
