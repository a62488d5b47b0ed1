/// overlay.rs — Volatility-Targeting Overlay
///
/// ─────────────────────────────────────────────────────────────────────────
/// POSITION-SIZING RULE
/// ─────────────────────────────────────────────────────────────────────────
///
///   w_t = clip( σ_target / σ̂_{t-1},  w_min,  w_max )
///
///   σ̂_{t-1} is the PREVIOUS period's annualized GARCH conditional vol:
///   the weight for period t is decided at the start of t using only
///   information available then. Scaling r_t by σ̂_t instead would leak the
///   period's own volatility into the decision — the t−1 shift is an
///   invariant, not a convenience.
///
///   strategy_return_t = w_t · r_t
///   buy_hold_return_t = r_t                (weight pinned at 1.0)
///
///   Equity compounds from 1.0 at the row preceding the first sized return:
///       E_0 = 1,   E_t = E_{t-1} · (1 + strategy_return_t)
///
///   The first panel row has no prior forecast; it is dropped outright,
///   never defaulted.
/// ─────────────────────────────────────────────────────────────────────────
use chrono::NaiveDate;

use crate::error::{Result, VolError};
use crate::series::VolPanel;

/// Sizing configuration for the overlay.
#[derive(Debug, Clone, Copy)]
pub struct OverlayConfig {
    /// Annualized volatility the strategy targets (e.g. 0.10 = 10%).
    pub target_annual_vol: f64,
    /// Lower leverage clip (0.0 = long-only floor).
    pub min_leverage: f64,
    /// Upper leverage clip.
    pub max_leverage: f64,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            target_annual_vol: 0.10,
            min_leverage: 0.0,
            max_leverage: 2.0,
        }
    }
}

/// Overlay and baseline paths on a common axis. `dates`, `weight` and the
/// two return series have length n−1 for an n-row panel; the equity curves
/// carry one extra leading point: the 1.0 anchor at `anchor_date`.
#[derive(Debug, Clone)]
pub struct OverlayResult {
    /// Date of the 1.0 equity anchor (the dropped first panel row).
    pub anchor_date: NaiveDate,
    pub dates: Vec<NaiveDate>,
    pub weight: Vec<f64>,
    pub strategy_return: Vec<f64>,
    pub buy_hold_return: Vec<f64>,
    pub strategy_equity: Vec<f64>,
    pub buy_hold_equity: Vec<f64>,
}

/// Size each period off the previous period's GARCH forecast and compound
/// both the overlay and the buy-and-hold baseline.
///
/// `garch_vol` must be the annualized conditional-vol path aligned 1:1 with
/// the panel rows.
pub fn run_overlay(
    panel: &VolPanel,
    garch_vol: &[f64],
    cfg: &OverlayConfig,
) -> Result<OverlayResult> {
    if garch_vol.len() != panel.len() {
        return Err(VolError::InvalidInput(format!(
            "overlay: garch vol length {} != panel length {}",
            garch_vol.len(),
            panel.len()
        )));
    }
    if panel.len() < 2 {
        return Err(VolError::InvalidInput(
            "overlay: need ≥ 2 panel rows (one forecast lag is consumed)".into(),
        ));
    }
    if !(cfg.target_annual_vol > 0.0) {
        return Err(VolError::InvalidInput(format!(
            "overlay: target_annual_vol must be > 0, got {}",
            cfg.target_annual_vol
        )));
    }
    if !(cfg.min_leverage <= cfg.max_leverage) {
        return Err(VolError::InvalidInput(format!(
            "overlay: min_leverage {} > max_leverage {}",
            cfg.min_leverage, cfg.max_leverage
        )));
    }
    if garch_vol.iter().any(|v| !v.is_finite() || *v <= 0.0) {
        return Err(VolError::InvalidInput(
            "overlay: garch vol path contains non-positive or non-finite values".into(),
        ));
    }

    let n = panel.len();
    let mut weight = Vec::with_capacity(n - 1);
    let mut strategy_return = Vec::with_capacity(n - 1);
    let mut buy_hold_return = Vec::with_capacity(n - 1);
    let mut strategy_equity = Vec::with_capacity(n);
    let mut buy_hold_equity = Vec::with_capacity(n);
    strategy_equity.push(1.0);
    buy_hold_equity.push(1.0);

    for t in 1..n {
        let w = (cfg.target_annual_vol / garch_vol[t - 1])
            .clamp(cfg.min_leverage, cfg.max_leverage);
        let r = panel.log_return[t];
        weight.push(w);
        strategy_return.push(w * r);
        buy_hold_return.push(r);
        strategy_equity.push(strategy_equity[t - 1] * (1.0 + w * r));
        buy_hold_equity.push(buy_hold_equity[t - 1] * (1.0 + r));
    }

    Ok(OverlayResult {
        anchor_date: panel.dates[0],
        dates: panel.dates[1..].to_vec(),
        weight,
        strategy_return,
        buy_hold_return,
        strategy_equity,
        buy_hold_equity,
    })
}
