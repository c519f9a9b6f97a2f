//! Pricing abstractions and core types

use async_trait::async_trait;
use reqwest::StatusCode;
use thiserror::Error;

/// Length of the trailing window used for the monthly high, in seconds.
pub const MONTHLY_WINDOW_SECS: i64 = 30 * 24 * 60 * 60;

/// Which of the two price lookups a [`FetchError`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceQuery {
    CurrentPrice,
    MonthlyHigh,
}

impl std::fmt::Display for PriceQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PriceQuery::CurrentPrice => write!(f, "current price"),
            PriceQuery::MonthlyHigh => write!(f, "monthly high"),
        }
    }
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Request error fetching {query}: {source}")]
    Request {
        query: PriceQuery,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP error: {status} fetching {query}")]
    Status {
        query: PriceQuery,
        status: StatusCode,
    },

    #[error("Failed to parse JSON response for {query}: {source}")]
    Parse {
        query: PriceQuery,
        #[source]
        source: serde_json::Error,
    },

    #[error("Missing field {field} in {query} response")]
    MissingField { query: PriceQuery, field: String },

    #[error("Empty price series for {query}")]
    EmptySeries { query: PriceQuery },
}

impl FetchError {
    pub fn query(&self) -> PriceQuery {
        match self {
            FetchError::Request { query, .. }
            | FetchError::Status { query, .. }
            | FetchError::Parse { query, .. }
            | FetchError::MissingField { query, .. }
            | FetchError::EmptySeries { query } => *query,
        }
    }
}

/// Spot price and trailing 30-day high captured during one run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceSample {
    pub current_price: f64,
    pub monthly_high: f64,
}

#[async_trait]
pub trait PriceSource: Send + Sync {
    async fn fetch_current_price(&self) -> Result<f64, FetchError>;

    async fn fetch_monthly_high(&self) -> Result<f64, FetchError>;

    /// Runs both lookups concurrently. Either failure fails the sample.
    async fn fetch_sample(&self) -> Result<PriceSample, FetchError> {
        let (current_price, monthly_high) =
            futures::try_join!(self.fetch_current_price(), self.fetch_monthly_high())?;
        Ok(PriceSample {
            current_price,
            monthly_high,
        })
    }
}

/// Returns the highest price in the series, or `None` for an empty series.
pub fn series_high<I>(prices: I) -> Option<f64>
where
    I: IntoIterator<Item = f64>,
{
    prices.into_iter().reduce(f64::max)
}

/// Unix-second bounds `(from, to)` of the trailing monthly window ending at `now`.
pub fn monthly_window(now: i64) -> (i64, i64) {
    (now - MONTHLY_WINDOW_SECS, now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedSource {
        current: Result<f64, ()>,
        high: Result<f64, ()>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl PriceSource for FixedSource {
        async fn fetch_current_price(&self) -> Result<f64, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.current.map_err(|_| FetchError::MissingField {
                query: PriceQuery::CurrentPrice,
                field: "usd".to_string(),
            })
        }

        async fn fetch_monthly_high(&self) -> Result<f64, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.high.map_err(|_| FetchError::EmptySeries {
                query: PriceQuery::MonthlyHigh,
            })
        }
    }

    #[test]
    fn test_series_high() {
        assert_eq!(series_high([41000.0, 52000.5, 49999.0]), Some(52000.5));
        assert_eq!(series_high([7.0]), Some(7.0));
    }

    #[test]
    fn test_series_high_empty_is_none() {
        assert_eq!(series_high(Vec::<f64>::new()), None);
    }

    #[test]
    fn test_monthly_window_spans_thirty_days() {
        let (from, to) = monthly_window(1_700_000_000);
        assert_eq!(to, 1_700_000_000);
        assert_eq!(to - from, 2_592_000);
    }

    #[tokio::test]
    async fn test_fetch_sample_joins_both_lookups() {
        let source = FixedSource {
            current: Ok(40000.0),
            high: Ok(50000.0),
            calls: AtomicUsize::new(0),
        };
        let sample = source.fetch_sample().await.unwrap();
        assert_eq!(
            sample,
            PriceSample {
                current_price: 40000.0,
                monthly_high: 50000.0
            }
        );
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_fetch_sample_fails_when_either_lookup_fails() {
        let source = FixedSource {
            current: Ok(40000.0),
            high: Err(()),
            calls: AtomicUsize::new(0),
        };
        let err = source.fetch_sample().await.unwrap_err();
        assert!(matches!(err, FetchError::EmptySeries { .. }));
        assert_eq!(err.query(), PriceQuery::MonthlyHigh);

        let source = FixedSource {
            current: Err(()),
            high: Ok(50000.0),
            calls: AtomicUsize::new(0),
        };
        let err = source.fetch_sample().await.unwrap_err();
        assert_eq!(err.query(), PriceQuery::CurrentPrice);
        assert_eq!(
            err.to_string(),
            "Missing field usd in current price response"
        );
    }
}
