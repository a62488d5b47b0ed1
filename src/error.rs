/// error.rs — Error taxonomy for the volatility pipeline
///
/// Every failure is terminal for the run that raised it: no stage retries or
/// recovers locally, and no partial series is ever handed downstream. Each
/// variant carries enough context (stage, offending values) to diagnose the
/// run from the message alone.
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VolError {
    /// Malformed or insufficient price/return data.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The GARCH optimizer failed to reach a valid fit within budget.
    #[error("GARCH fit did not converge: {0}")]
    Convergence(String),

    /// Numerically degenerate input that makes estimation meaningless.
    #[error("degenerate input: {0}")]
    DegenerateInput(String),

    /// A ratio metric with a zero denominator.
    #[error("undefined metric: {0}")]
    UndefinedMetric(String),

    /// The external price provider failed.
    #[error("price data unavailable: {0}")]
    DataUnavailable(String),
}

pub type Result<T> = std::result::Result<T, VolError>;
