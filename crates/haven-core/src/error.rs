//! Error types for `haven-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("risk score {0} is outside [0.0, 1.0]")]
  RiskScoreOutOfRange(f64),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
