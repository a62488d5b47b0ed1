pub mod config;
pub mod data;
pub mod engine;
pub mod error;
pub mod metrics;
pub mod models;
pub mod overlay;
pub mod series;

pub use error::VolError;
pub use models::garch::{GarchFit, GarchParams};
