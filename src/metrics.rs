/// metrics.rs — Performance Evaluator
///
/// ─────────────────────────────────────────────────────────────────────────
/// MATHEMATICAL SPECIFICATION
/// ─────────────────────────────────────────────────────────────────────────
///
/// SHARPE RATIO (annualized, zero risk-free rate)
///
///   SR = mean(r) / std(r) · √A        (std = sample, N−1)
///
///   Undefined when std(r) = 0 — surfaced as `UndefinedMetric`, never a
///   sentinel value.
///
/// MAXIMUM DRAWDOWN
///
///   peak_t = max_{s ≤ t}(E_s)
///   MaxDD  = min_t( E_t / peak_t − 1 )
///
///   Always ≤ 0; equals 0 only for a non-decreasing equity curve.
///
/// FORECAST ACCURACY (model vs realized vol, aligned element-wise)
///
///   MSE = mean((σ̂_t − rv_t)²)      MAE = mean(|σ̂_t − rv_t|)
///
/// All of these are pure reductions: no internal state, deterministic given
/// identical inputs.
/// ─────────────────────────────────────────────────────────────────────────
use statrs::statistics::Statistics;

use crate::error::{Result, VolError};

/// Annualized Sharpe ratio of a period-return series.
pub fn sharpe_ratio(returns: &[f64], periods_per_year: f64) -> Result<f64> {
    if returns.len() < 2 {
        return Err(VolError::InvalidInput(format!(
            "sharpe: need ≥ 2 returns, got {}",
            returns.len()
        )));
    }
    // Constant series leave a tiny floating-point residue in the sample
    // std, not an exact zero; guard with a tolerance.
    let sd = returns.std_dev();
    if sd < 1e-12 || !sd.is_finite() {
        return Err(VolError::UndefinedMetric(format!(
            "sharpe: zero return dispersion over {} periods",
            returns.len()
        )));
    }
    Ok(returns.mean() / sd * periods_per_year.sqrt())
}

/// Maximum drawdown of an equity curve, as a non-positive fraction
/// (−0.15 = a 15% peak-to-trough decline).
pub fn max_drawdown(equity: &[f64]) -> f64 {
    if equity.is_empty() {
        return 0.0;
    }
    let mut peak = equity[0];
    let mut max_dd = 0.0f64;
    for &e in equity {
        if e > peak {
            peak = e;
        }
        let dd = e / peak - 1.0;
        if dd < max_dd {
            max_dd = dd;
        }
    }
    max_dd
}

/// Element-wise error of a model vol path against realized vol.
#[derive(Debug, Clone, Copy)]
pub struct ForecastAccuracy {
    pub mse: f64,
    pub mae: f64,
}

pub fn forecast_accuracy(realized: &[f64], model: &[f64]) -> Result<ForecastAccuracy> {
    if realized.len() != model.len() || realized.is_empty() {
        return Err(VolError::InvalidInput(format!(
            "forecast accuracy: series lengths {} vs {}",
            realized.len(),
            model.len()
        )));
    }
    let n = realized.len() as f64;
    let mut sq = 0.0;
    let mut abs = 0.0;
    for (rv, mv) in realized.iter().zip(model) {
        let e = mv - rv;
        sq += e * e;
        abs += e.abs();
    }
    Ok(ForecastAccuracy {
        mse: sq / n,
        mae: abs / n,
    })
}

/// Risk/return summary of one strategy leg.
#[derive(Debug, Clone, Copy)]
pub struct StrategyPerf {
    pub sharpe: f64,
    pub max_drawdown: f64,
    /// Total compounded return over the run (E_final − 1).
    pub total_return: f64,
}

/// Reduce a return series and its equity curve to the summary metrics.
pub fn evaluate(returns: &[f64], equity: &[f64], periods_per_year: f64) -> Result<StrategyPerf> {
    let sharpe = sharpe_ratio(returns, periods_per_year)?;
    let final_equity = equity.last().copied().ok_or_else(|| {
        VolError::InvalidInput("evaluate: empty equity curve".into())
    })?;
    Ok(StrategyPerf {
        sharpe,
        max_drawdown: max_drawdown(equity),
        total_return: final_equity - 1.0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sharpe_of_zero_dispersion_is_undefined() {
        // The sample std of a constant series is a ~1e-19 rounding residue,
        // not exact zero; it must still be treated as zero dispersion.
        let flat = vec![0.001; 50];
        assert!(matches!(
            sharpe_ratio(&flat, 252.0),
            Err(VolError::UndefinedMetric(_))
        ));
        let zeros = vec![0.0; 20];
        assert!(matches!(
            sharpe_ratio(&zeros, 252.0),
            Err(VolError::UndefinedMetric(_))
        ));
    }

    #[test]
    fn sharpe_of_too_short_series_is_invalid_input() {
        assert!(matches!(
            sharpe_ratio(&[0.01], 252.0),
            Err(VolError::InvalidInput(_))
        ));
        assert!(matches!(
            sharpe_ratio(&[], 252.0),
            Err(VolError::InvalidInput(_))
        ));
    }

    #[test]
    fn sharpe_matches_hand_computation() {
        let r = [0.01, -0.01, 0.02, 0.0];
        let m: f64 = 0.005;
        let var = r.iter().map(|x| (x - m).powi(2)).sum::<f64>() / 3.0;
        let expected = m / var.sqrt() * 252.0_f64.sqrt();
        let got = sharpe_ratio(&r, 252.0).unwrap();
        assert!((got - expected).abs() < 1e-12, "{got} vs {expected}");
    }

    #[test]
    fn max_drawdown_is_zero_for_non_decreasing_curves() {
        assert_eq!(max_drawdown(&[1.0, 1.01, 1.02, 1.03]), 0.0);
        assert_eq!(max_drawdown(&[1.0, 1.0, 1.0]), 0.0);
        assert_eq!(max_drawdown(&[]), 0.0);
    }

    #[test]
    fn max_drawdown_finds_worst_peak_to_trough() {
        // peak 1.2, trough 0.6 → 0.6/1.2 − 1 = −0.5
        let dd = max_drawdown(&[1.0, 1.2, 0.6, 0.8]);
        assert!((dd + 0.5).abs() < 1e-12, "dd = {dd}");
        assert!(dd <= 0.0);
    }

    #[test]
    fn forecast_accuracy_reduces_element_wise() {
        let rv = [0.10, 0.20, 0.30];
        let mv = [0.12, 0.18, 0.33];
        let acc = forecast_accuracy(&rv, &mv).unwrap();
        let mse = (0.02f64.powi(2) + 0.02f64.powi(2) + 0.03f64.powi(2)) / 3.0;
        let mae = (0.02 + 0.02 + 0.03) / 3.0;
        assert!((acc.mse - mse).abs() < 1e-15);
        assert!((acc.mae - mae).abs() < 1e-15);
        assert!(matches!(
            forecast_accuracy(&rv, &mv[..2]),
            Err(VolError::InvalidInput(_))
        ));
    }

    #[test]
    fn evaluate_combines_the_reductions() {
        let returns = [0.10, -0.05];
        let equity = [1.0, 1.10, 1.045];
        let perf = evaluate(&returns, &equity, 252.0).unwrap();
        assert!((perf.total_return - 0.045).abs() < 1e-12);
        assert!(perf.max_drawdown < 0.0);
        assert!(perf.sharpe.is_finite());
    }
}
