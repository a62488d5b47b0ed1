/// models/garch.rs — GARCH(1,1) Maximum-Likelihood Estimator
///
/// ─────────────────────────────────────────────────────────────────────────
/// MATHEMATICAL SPECIFICATION
/// ─────────────────────────────────────────────────────────────────────────
///
/// Constant-mean GARCH(1,1), Bollerslev (1986), Gaussian innovations:
///
///   r_t = μ + ε_t,    ε_t = σ_t · z_t,    z_t ~ N(0,1)
///
///   Conditional variance recursion:
///       σ²_t = ω + α · ε²_{t-1} + β · σ²_{t-1}
///
///   Constraints (positivity + covariance stationarity):
///       ω > 0,  α ≥ 0,  β ≥ 0,  α + β < 1
///
///   Long-run (unconditional) variance:
///       σ²_∞ = ω / (1 − α − β)
///
///   Gaussian log-likelihood (maximized; the optimizer minimizes −L):
///       L = Σ_t −½ · [ ln(2π) + ln(σ²_t) + ε²_t / σ²_t ]
///
///   σ²_0 is initialized to the sample variance of the mean-adjusted
///   returns. Returns are scaled to percent units (×100) before estimation
///   purely for numerical conditioning and scaled back on output.
///
///   One-step-ahead forecast:
///       σ²_{T+1|T} = ω + α · ε²_T + β · σ²_T
///
/// Fit procedure: derivative-free Nelder-Mead simplex over (μ, ω, α, β);
/// infeasible vertices are repelled with a large penalty cost so the simplex
/// stays inside the constraint set. Bounded iteration budget; failure to
/// produce a feasible optimum is a `Convergence` error. A return series
/// whose variance is below a small floor is rejected up front as
/// `DegenerateInput` — estimation on it is meaningless.
/// ─────────────────────────────────────────────────────────────────────────
use argmin::core::{CostFunction, Error, Executor, State};
use argmin::solver::neldermead::NelderMead;
use statrs::statistics::Statistics;

use crate::error::{Result, VolError};

/// Internal conditioning scale: returns are estimated in percent units.
pub const RETURN_SCALE: f64 = 100.0;

/// Cost assigned to infeasible parameter vectors.
const PENALTY: f64 = 1e12;
/// Variance floor below which the input is considered degenerate (percent²).
const DEGENERATE_VAR_FLOOR: f64 = 1e-12;

const LN_2PI: f64 = 1.8378770664093453;

/// Fitted GARCH(1,1) parameters, in percent-return units.
#[derive(Debug, Clone, Copy)]
pub struct GarchParams {
    /// μ: constant conditional mean
    pub mu: f64,
    /// ω: long-run variance weight
    pub omega: f64,
    /// α: ARCH (shock) coefficient
    pub alpha: f64,
    /// β: GARCH (persistence) coefficient
    pub beta: f64,
}

impl GarchParams {
    /// Positivity and covariance-stationarity constraints.
    pub fn is_valid(&self) -> bool {
        self.omega > 0.0
            && self.alpha >= 0.0
            && self.beta >= 0.0
            && self.alpha + self.beta < 1.0
    }

    /// α + β: persistence of variance shocks.
    pub fn persistence(&self) -> f64 {
        self.alpha + self.beta
    }

    /// σ²_∞ = ω / (1 − α − β), percent² units.
    pub fn long_run_variance(&self) -> f64 {
        self.omega / (1.0 - self.persistence())
    }

    /// Half-life of a variance shock in periods: ln(½) / ln(α+β).
    pub fn half_life(&self) -> Option<f64> {
        let p = self.persistence();
        if p <= 0.0 || p >= 1.0 {
            None
        } else {
            Some(-(2.0_f64.ln()) / p.ln())
        }
    }
}

/// A completed maximum-likelihood fit: parameters, fit diagnostics, and the
/// full in-sample conditional-variance path. Immutable once produced.
#[derive(Debug, Clone)]
pub struct GarchFit {
    pub params: GarchParams,
    /// Total Gaussian log-likelihood at the optimum.
    pub log_likelihood: f64,
    pub aic: f64,
    pub bic: f64,
    pub n_obs: usize,
    /// σ²_t path in percent² units, one entry per input return.
    sigma2: Vec<f64>,
    /// ε_T: last in-sample innovation (percent units), for forecasting.
    last_epsilon: f64,
}

impl GarchFit {
    /// Per-period conditional volatility, back in raw return units.
    pub fn conditional_vol(&self) -> Vec<f64> {
        self.sigma2
            .iter()
            .map(|s2| s2.sqrt() / RETURN_SCALE)
            .collect()
    }

    /// Annualized conditional volatility path, aligned 1:1 with the input
    /// returns: √(σ²_t)/100 · √A.
    pub fn annualized_vol(&self, trading_days: f64) -> Vec<f64> {
        let ann = trading_days.sqrt();
        self.sigma2
            .iter()
            .map(|s2| s2.sqrt() / RETURN_SCALE * ann)
            .collect()
    }

    /// One-step-ahead annualized volatility forecast:
    /// σ²_{T+1|T} = ω + α·ε²_T + β·σ²_T.
    pub fn next_annualized_vol(&self, trading_days: f64) -> f64 {
        let p = self.params;
        let var_next =
            p.omega + p.alpha * self.last_epsilon.powi(2) + p.beta * self.sigma2[self.n_obs - 1];
        var_next.sqrt() / RETURN_SCALE * trading_days.sqrt()
    }

    /// Annualized long-run volatility implied by the fit.
    pub fn long_run_annualized_vol(&self, trading_days: f64) -> f64 {
        self.params.long_run_variance().sqrt() / RETURN_SCALE * trading_days.sqrt()
    }
}

impl std::fmt::Display for GarchFit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "GARCH(1,1) fit ({} obs, constant mean)", self.n_obs)?;
        writeln!(f, "  μ (mean, %)    : {:>10.6}", self.params.mu)?;
        writeln!(f, "  ω (omega)      : {:>10.6}", self.params.omega)?;
        writeln!(f, "  α (arch)       : {:>10.6}", self.params.alpha)?;
        writeln!(f, "  β (garch)      : {:>10.6}", self.params.beta)?;
        writeln!(f, "  α+β            : {:>10.6}", self.params.persistence())?;
        if let Some(hl) = self.params.half_life() {
            writeln!(f, "  Half-life      : {:>8.2} periods", hl)?;
        }
        writeln!(f, "  Log-likelihood : {:>10.4}", self.log_likelihood)?;
        writeln!(f, "  AIC            : {:>10.4}", self.aic)?;
        write!(f, "  BIC            : {:>10.4}", self.bic)
    }
}

/// Negative log-likelihood of (μ, ω, α, β) given percent-scaled returns.
///
/// Infeasible vectors get the flat `PENALTY` cost. `sigma2_init` is the
/// fixed σ²_0 initialization (sample variance of the mean-adjusted input).
fn negative_log_likelihood(theta: &[f64], scaled: &[f64], sigma2_init: f64) -> f64 {
    let (mu, omega, alpha, beta) = (theta[0], theta[1], theta[2], theta[3]);
    if omega <= 0.0 || alpha < 0.0 || beta < 0.0 || alpha + beta >= 1.0 {
        return PENALTY;
    }

    let mut nll = 0.0;
    let mut sigma2 = sigma2_init;
    let mut prev_eps = scaled[0] - mu;

    // t = 0 uses the initialization variance directly.
    nll += 0.5 * (LN_2PI + sigma2.ln() + prev_eps * prev_eps / sigma2);

    for &r in &scaled[1..] {
        sigma2 = omega + alpha * prev_eps * prev_eps + beta * sigma2;
        if sigma2 <= 0.0 || !sigma2.is_finite() {
            return PENALTY;
        }
        let eps = r - mu;
        nll += 0.5 * (LN_2PI + sigma2.ln() + eps * eps / sigma2);
        prev_eps = eps;
    }

    if nll.is_finite() {
        nll
    } else {
        PENALTY
    }
}

struct GarchCost<'a> {
    scaled: &'a [f64],
    sigma2_init: f64,
}

impl CostFunction for GarchCost<'_> {
    type Param = Vec<f64>;
    type Output = f64;

    fn cost(&self, theta: &Self::Param) -> std::result::Result<Self::Output, Error> {
        Ok(negative_log_likelihood(theta, self.scaled, self.sigma2_init))
    }
}

/// Fit a constant-mean GARCH(1,1) to raw log-returns by maximum likelihood.
///
/// `max_iters` bounds the Nelder-Mead budget. The returned fit carries the
/// full in-sample σ²_t path.
pub fn fit(returns: &[f64], max_iters: u64) -> Result<GarchFit> {
    let n = returns.len();
    if n < 10 {
        return Err(VolError::InvalidInput(format!(
            "garch fit: need ≥ 10 returns, got {n}"
        )));
    }
    if returns.iter().any(|r| !r.is_finite()) {
        return Err(VolError::InvalidInput(
            "garch fit: returns contain non-finite values".into(),
        ));
    }

    let scaled: Vec<f64> = returns.iter().map(|r| r * RETURN_SCALE).collect();
    let sample_var = scaled.as_slice().variance();
    if !sample_var.is_finite() || sample_var < DEGENERATE_VAR_FLOOR {
        return Err(VolError::DegenerateInput(format!(
            "garch fit: return variance {sample_var:.3e} below floor {DEGENERATE_VAR_FLOOR:.0e}, \
             estimation is meaningless"
        )));
    }
    let sample_mean = scaled.as_slice().mean();

    // Initial vertex: modest shock sensitivity, high persistence, ω sized so
    // the implied long-run variance matches the sample variance.
    let theta0 = vec![sample_mean, 0.05 * sample_var, 0.05, 0.90];
    let mut simplex = vec![theta0.clone()];
    for i in 0..4 {
        let mut v = theta0.clone();
        match i {
            0 => v[0] += 0.1 * sample_var.sqrt(),
            1 => v[1] *= 2.0,
            2 => v[2] = 0.10,
            3 => v[3] = 0.80,
            _ => unreachable!(),
        }
        simplex.push(v);
    }

    let cost = GarchCost {
        scaled: &scaled,
        sigma2_init: sample_var,
    };
    let solver = NelderMead::new(simplex)
        .with_sd_tolerance(1e-8)
        .map_err(|e| VolError::Convergence(format!("solver setup: {e}")))?;

    let res = Executor::new(cost, solver)
        .configure(|state| state.max_iters(max_iters))
        .run()
        .map_err(|e| VolError::Convergence(format!("optimizer aborted: {e}")))?;

    let best_cost = res.state().get_best_cost();
    let theta = res
        .state()
        .get_best_param()
        .ok_or_else(|| VolError::Convergence("optimizer produced no parameters".into()))?;

    if !best_cost.is_finite() || best_cost >= PENALTY {
        return Err(VolError::Convergence(format!(
            "no feasible optimum within {max_iters} iterations (best cost {best_cost:.3e})"
        )));
    }

    let params = GarchParams {
        mu: theta[0],
        omega: theta[1],
        alpha: theta[2],
        beta: theta[3],
    };
    if !params.is_valid() {
        return Err(VolError::Convergence(format!(
            "optimum violates constraints: ω={:.6}, α={:.6}, β={:.6}, α+β={:.6}",
            params.omega,
            params.alpha,
            params.beta,
            params.persistence()
        )));
    }

    // Rebuild the conditional-variance path at the optimum.
    let mut sigma2 = Vec::with_capacity(n);
    sigma2.push(sample_var);
    let mut prev_eps = scaled[0] - params.mu;
    for &r in &scaled[1..] {
        let s2 = params.omega + params.alpha * prev_eps * prev_eps + params.beta * sigma2[sigma2.len() - 1];
        sigma2.push(s2);
        prev_eps = r - params.mu;
    }

    let log_likelihood = -best_cost;
    let k = 4.0;
    let aic = 2.0 * k - 2.0 * log_likelihood;
    let bic = k * (n as f64).ln() - 2.0 * log_likelihood;

    Ok(GarchFit {
        params,
        log_likelihood,
        aic,
        bic,
        n_obs: n,
        sigma2,
        last_epsilon: prev_eps,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Deterministic pseudo-noise in (−1, 1), enough for a fit smoke test.
    fn noise(i: usize) -> f64 {
        ((i * 7919 + 1) % 2000) as f64 / 1000.0 - 1.0
    }

    fn simulated_garch_returns(n: usize) -> Vec<f64> {
        // True process in percent² units: ω=0.05, α=0.10, β=0.85 → σ²_∞ = 1.
        let (omega, alpha, beta): (f64, f64, f64) = (0.05, 0.10, 0.85);
        let mut sigma2: f64 = omega / (1.0 - alpha - beta);
        let mut prev_eps = 0.0;
        let mut out = Vec::with_capacity(n);
        for i in 0..n {
            sigma2 = omega + alpha * prev_eps * prev_eps + beta * sigma2;
            let eps = sigma2.sqrt() * noise(i);
            out.push(eps / RETURN_SCALE);
            prev_eps = eps;
        }
        out
    }

    #[test]
    fn fit_satisfies_constraints() {
        let returns = simulated_garch_returns(500);
        let fit = fit(&returns, 5000).unwrap();
        assert!(fit.params.omega > 0.0);
        assert!(fit.params.alpha >= 0.0);
        assert!(fit.params.beta >= 0.0);
        assert!(fit.params.persistence() < 1.0);
        assert!(fit.log_likelihood.is_finite());
        assert_eq!(fit.conditional_vol().len(), returns.len());
    }

    #[test]
    fn vol_path_is_positive_and_aligned() {
        let returns = simulated_garch_returns(300);
        let fit = fit(&returns, 5000).unwrap();
        let ann = fit.annualized_vol(252.0);
        assert_eq!(ann.len(), returns.len());
        assert!(ann.iter().all(|v| *v > 0.0 && v.is_finite()));
        assert!(fit.next_annualized_vol(252.0) > 0.0);
    }

    #[test]
    fn zero_returns_are_degenerate() {
        let returns = vec![0.0; 100];
        assert!(matches!(
            fit(&returns, 5000),
            Err(VolError::DegenerateInput(_))
        ));
    }

    #[test]
    fn constant_returns_are_degenerate() {
        let returns = vec![0.001; 100];
        assert!(matches!(
            fit(&returns, 5000),
            Err(VolError::DegenerateInput(_))
        ));
    }

    #[test]
    fn low_variance_series_fits_with_near_constant_path() {
        // i.i.d. alternating returns: no ARCH effects, the fitted path should
        // hover near the long-run level rather than raise Convergence.
        let returns: Vec<f64> = (0..200)
            .map(|i| if i % 2 == 0 { 0.001 } else { -0.001 })
            .collect();
        let fit = fit(&returns, 5000).unwrap();
        let path = fit.annualized_vol(252.0);
        let long_run = fit.long_run_annualized_vol(252.0);
        let last = *path.last().unwrap();
        assert!(
            last / long_run > 0.5 && last / long_run < 2.0,
            "path end {last} vs long-run {long_run}"
        );
        let max = path.iter().cloned().fold(f64::MIN, f64::max);
        let min = path.iter().cloned().fold(f64::MAX, f64::min);
        assert!(max / min < 2.0, "path not near-constant: {min}..{max}");
    }

    #[test]
    fn infeasible_parameters_get_penalty_cost() {
        let scaled = vec![0.1, -0.2, 0.3, -0.1];
        // α + β ≥ 1
        assert_eq!(
            negative_log_likelihood(&[0.0, 0.1, 0.5, 0.5], &scaled, 1.0),
            PENALTY
        );
        // ω ≤ 0
        assert_eq!(
            negative_log_likelihood(&[0.0, 0.0, 0.1, 0.8], &scaled, 1.0),
            PENALTY
        );
        // Feasible point is finite and below the penalty.
        let nll = negative_log_likelihood(&[0.0, 0.05, 0.1, 0.8], &scaled, 1.0);
        assert!(nll.is_finite() && nll < PENALTY);
    }

    #[test]
    fn half_life_only_defined_inside_unit_persistence() {
        let p = GarchParams {
            mu: 0.0,
            omega: 0.05,
            alpha: 0.10,
            beta: 0.85,
        };
        let hl = p.half_life().unwrap();
        // persistence 0.95 → half-life ≈ 13.5 periods
        assert!((hl - 13.513).abs() < 0.01, "hl = {hl}");
        assert!((p.long_run_variance() - 1.0).abs() < 1e-12);
    }
}
