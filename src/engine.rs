/// engine.rs — Analysis Pipeline
///
/// Runs the full forward-only chain over one price series:
///
///   prices → log-returns → { realized vol, GARCH fit } → leverage weights
///          → strategy returns → equity curves → performance metrics
///
/// Each stage consumes immutable inputs and produces a new series; a failure
/// at any stage aborts the run with its typed error. The returned report
/// carries both the summary metrics and the aligned series so an external
/// reporting layer can plot them without re-deriving anything.
use tracing::info;

use crate::config::AppConfig;
use crate::error::Result;
use crate::metrics::{evaluate, forecast_accuracy, ForecastAccuracy, StrategyPerf};
use crate::models::garch::{self, GarchFit};
use crate::overlay::{run_overlay, OverlayConfig, OverlayResult};
use crate::series::{PriceSeries, VolPanel};

/// Everything one pipeline run produces.
#[derive(Debug, Clone)]
pub struct AnalysisReport {
    pub ticker: String,
    pub n_prices: usize,
    /// Rows on the aligned panel axis (returns with defined realized vol).
    pub n_panel_rows: usize,
    pub garch: GarchFit,
    /// Annualized GARCH conditional vol, aligned 1:1 with the panel.
    pub garch_vol: Vec<f64>,
    /// GARCH path vs realized vol over the panel.
    pub accuracy: ForecastAccuracy,
    /// One-step-ahead annualized vol forecast past the sample end.
    pub next_annualized_vol: f64,
    /// Annualized long-run volatility implied by the fit.
    pub long_run_annualized_vol: f64,
    pub overlay: OverlayResult,
    pub buy_hold: StrategyPerf,
    pub vol_target: StrategyPerf,
    pub panel: VolPanel,
}

impl std::fmt::Display for AnalysisReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "════════════════════════════════════════════════")?;
        writeln!(f, "  VOLATILITY REPORT — {}", self.ticker)?;
        writeln!(f, "════════════════════════════════════════════════")?;
        writeln!(
            f,
            "  Prices / panel rows : {} / {}",
            self.n_prices, self.n_panel_rows
        )?;
        writeln!(f, "{}", self.garch)?;
        writeln!(
            f,
            "  Long-run vol (ann.) : {:>8.4}",
            self.long_run_annualized_vol
        )?;
        writeln!(
            f,
            "  Next-period vol     : {:>8.4}",
            self.next_annualized_vol
        )?;
        writeln!(
            f,
            "  GARCH vs realized   : MSE {:.6e}  MAE {:.6}",
            self.accuracy.mse, self.accuracy.mae
        )?;
        writeln!(f, "  ─────────────────────────────────────────────")?;
        writeln!(
            f,
            "                        {:>12}  {:>12}",
            "Buy & Hold", "Vol Target"
        )?;
        writeln!(
            f,
            "  Sharpe Ratio        : {:>12.3}  {:>12.3}",
            self.buy_hold.sharpe, self.vol_target.sharpe
        )?;
        writeln!(
            f,
            "  Max Drawdown        : {:>11.2}%  {:>11.2}%",
            self.buy_hold.max_drawdown * 100.0,
            self.vol_target.max_drawdown * 100.0
        )?;
        writeln!(
            f,
            "  Total Return        : {:>11.2}%  {:>11.2}%",
            self.buy_hold.total_return * 100.0,
            self.vol_target.total_return * 100.0
        )?;
        write!(f, "════════════════════════════════════════════════")
    }
}

/// Run the whole pipeline for one price series under one configuration.
pub fn run_pipeline(prices: &PriceSeries, cfg: &AppConfig) -> Result<AnalysisReport> {
    cfg.validate()?;
    let trading_days = cfg.trading_days_per_year as f64;

    let returns = prices.log_returns();
    info!(
        "Built {} log-returns from {} closes",
        returns.len(),
        prices.len()
    );

    let panel = VolPanel::build(&returns, cfg.rolling_window, trading_days)?;
    info!(
        "Aligned panel: {} rows after dropping {} leading rows (W = {})",
        panel.len(),
        cfg.rolling_window - 1,
        cfg.rolling_window
    );

    let fit = garch::fit(&panel.log_return, cfg.garch_max_iters)?;
    info!(
        "GARCH fit: ω={:.6} α={:.4} β={:.4} (α+β={:.4}), LL={:.2}",
        fit.params.omega,
        fit.params.alpha,
        fit.params.beta,
        fit.params.persistence(),
        fit.log_likelihood
    );

    let garch_vol = fit.annualized_vol(trading_days);
    let accuracy = forecast_accuracy(&panel.realized_vol, &garch_vol)?;
    let next_annualized_vol = fit.next_annualized_vol(trading_days);
    let long_run_annualized_vol = fit.long_run_annualized_vol(trading_days);

    let overlay_cfg = OverlayConfig {
        target_annual_vol: cfg.target_annual_vol,
        min_leverage: cfg.min_leverage,
        max_leverage: cfg.max_leverage,
    };
    let overlay = run_overlay(&panel, &garch_vol, &overlay_cfg)?;

    let buy_hold = evaluate(
        &overlay.buy_hold_return,
        &overlay.buy_hold_equity,
        trading_days,
    )?;
    let vol_target = evaluate(
        &overlay.strategy_return,
        &overlay.strategy_equity,
        trading_days,
    )?;

    Ok(AnalysisReport {
        ticker: cfg.ticker.clone(),
        n_prices: prices.len(),
        n_panel_rows: panel.len(),
        garch: fit,
        garch_vol,
        accuracy,
        next_annualized_vol,
        long_run_annualized_vol,
        overlay,
        buy_hold,
        vol_target,
        panel,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    /// Deterministic heteroskedastic return generator (same scheme as the
    /// GARCH module tests), turned into a price path from 100.0.
    fn synthetic_prices(n: usize) -> PriceSeries {
        let noise = |i: usize| ((i * 7919 + 1) % 2000) as f64 / 1000.0 - 1.0;
        let (omega, alpha, beta): (f64, f64, f64) = (0.05, 0.10, 0.85);
        let mut sigma2: f64 = omega / (1.0 - alpha - beta);
        let mut prev_eps = 0.0;

        let d0 = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        let mut rows = Vec::with_capacity(n);
        let mut price = 100.0;
        rows.push((d0, price));
        for i in 1..n {
            sigma2 = omega + alpha * prev_eps * prev_eps + beta * sigma2;
            let eps = sigma2.sqrt() * noise(i);
            price *= (eps / 100.0).exp();
            rows.push((d0 + chrono::Days::new(i as u64), price));
            prev_eps = eps;
        }
        PriceSeries::from_rows(rows).unwrap()
    }

    #[test]
    fn end_to_end_pipeline_holds_its_invariants() {
        let prices = synthetic_prices(400);
        let cfg = AppConfig {
            ticker: "TEST".into(),
            rolling_window: 21,
            ..AppConfig::default()
        };
        let report = run_pipeline(&prices, &cfg).unwrap();

        // Axis accounting: N prices → N−1 returns → N−W panel rows.
        assert_eq!(report.n_prices, 400);
        assert_eq!(report.n_panel_rows, 400 - cfg.rolling_window);
        assert_eq!(report.garch_vol.len(), report.n_panel_rows);
        assert_eq!(report.overlay.weight.len(), report.n_panel_rows - 1);
        assert_eq!(
            report.overlay.strategy_equity.len(),
            report.n_panel_rows
        );

        // Fitted constraints and weight band.
        assert!(report.garch.params.omega > 0.0);
        assert!(report.garch.params.persistence() < 1.0);
        assert!(report
            .overlay
            .weight
            .iter()
            .all(|w| (cfg.min_leverage..=cfg.max_leverage).contains(w)));

        // Reductions are well-formed.
        assert!(report.buy_hold.max_drawdown <= 0.0);
        assert!(report.vol_target.max_drawdown <= 0.0);
        assert!(report.buy_hold.sharpe.is_finite());
        assert!(report.vol_target.sharpe.is_finite());
        assert!(report.accuracy.mse >= 0.0 && report.accuracy.mae >= 0.0);
        assert!(report.next_annualized_vol > 0.0);

        // Report renders.
        assert!(format!("{report}").contains("VOLATILITY REPORT"));
    }

    #[test]
    fn pipeline_rejects_too_short_history() {
        let prices = synthetic_prices(10);
        let cfg = AppConfig::default(); // W = 21 > available returns
        assert!(run_pipeline(&prices, &cfg).is_err());
    }
}
