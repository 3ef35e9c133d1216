//! Benchmark interest rate port.

use async_trait::async_trait;
use ledgerline_shared::AppError;
use rust_decimal::Decimal;
use thiserror::Error;

/// Rate lookup errors.
#[derive(Debug, Error)]
pub enum RateError {
    /// The provider could not be reached or answered with an error status.
    #[error("rate provider unavailable: {0}")]
    Unavailable(String),
    /// The provider answered but no rate could be read from it.
    #[error("rate provider response malformed: {0}")]
    Malformed(String),
}

impl RateError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Unavailable(_) => "RATE_UNAVAILABLE",
            Self::Malformed(_) => "RATE_MALFORMED",
        }
    }
}

impl From<RateError> for AppError {
    fn from(_: RateError) -> Self {
        Self::Dependency("benchmark rate unavailable".to_string())
    }
}

/// Source of the annual benchmark rate, in percent.
#[async_trait]
pub trait RateProvider: Send + Sync {
    /// Returns the current benchmark rate, e.g. `16.00` for 16%.
    async fn current_rate(&self) -> Result<Decimal, RateError>;
}

/// Always returns the same rate.
#[derive(Debug, Clone, Copy)]
pub struct FixedRateProvider {
    rate: Decimal,
}

impl FixedRateProvider {
    /// Creates a provider that always answers `rate`.
    #[must_use]
    pub const fn new(rate: Decimal) -> Self {
        Self { rate }
    }
}

#[async_trait]
impl RateProvider for FixedRateProvider {
    async fn current_rate(&self) -> Result<Decimal, RateError> {
        Ok(self.rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_fixed_rate() {
        let provider = FixedRateProvider::new(dec!(16.00));
        assert_eq!(provider.current_rate().await.unwrap(), dec!(16.00));
    }

    #[test]
    fn test_classified_as_dependency() {
        let err = AppError::from(RateError::Malformed("no KR element".into()));
        assert!(err.is_retryable());
    }
}
