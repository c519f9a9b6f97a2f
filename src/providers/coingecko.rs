use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use tracing::{debug, instrument};

use crate::core::price::{FetchError, PriceQuery, PriceSource, monthly_window, series_high};

pub const ASSET_ID: &str = "bitcoin";
pub const QUOTE_CURRENCY: &str = "usd";

const USER_AGENT: &str = concat!("dipalert/", env!("CARGO_PKG_VERSION"));

/// `{"bitcoin": {"usd": 40000.0}}`
type SimplePriceResponse = HashMap<String, HashMap<String, f64>>;

#[derive(Deserialize, Debug)]
struct MarketChartResponse {
    prices: Vec<(f64, f64)>,
}

pub struct CoinGeckoProvider {
    base_url: String,
}

impl CoinGeckoProvider {
    pub fn new(base_url: &str) -> Self {
        CoinGeckoProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        query: PriceQuery,
        url: &str,
    ) -> Result<T, FetchError> {
        debug!("Requesting {} from {}", query, url);

        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|source| FetchError::Request { query, source })?;

        let response = client
            .get(url)
            .send()
            .await
            .map_err(|source| FetchError::Request { query, source })?;

        debug!(status = %response.status(), "Received CoinGecko response");

        if !response.status().is_success() {
            return Err(FetchError::Status {
                query,
                status: response.status(),
            });
        }

        let text = response
            .text()
            .await
            .map_err(|source| FetchError::Request { query, source })?;

        serde_json::from_str(&text).map_err(|source| FetchError::Parse { query, source })
    }

    /// Monthly high for the window ending at `now` (Unix seconds).
    pub async fn fetch_monthly_high_at(&self, now: i64) -> Result<f64, FetchError> {
        let query = PriceQuery::MonthlyHigh;
        let (from, to) = monthly_window(now);
        let url = format!(
            "{}/api/v3/coins/{}/market_chart/range?vs_currency={}&from={}&to={}",
            self.base_url, ASSET_ID, QUOTE_CURRENCY, from, to
        );

        let data: MarketChartResponse = self.get_json(query, &url).await?;
        debug!(samples = data.prices.len(), "Received price series");

        series_high(data.prices.into_iter().map(|(_, price)| price))
            .ok_or(FetchError::EmptySeries { query })
    }
}

#[async_trait]
impl PriceSource for CoinGeckoProvider {
    #[instrument(name = "CoinGeckoSpotFetch", skip(self))]
    async fn fetch_current_price(&self) -> Result<f64, FetchError> {
        let query = PriceQuery::CurrentPrice;
        let url = format!(
            "{}/api/v3/simple/price?ids={}&vs_currencies={}",
            self.base_url, ASSET_ID, QUOTE_CURRENCY
        );

        let data: SimplePriceResponse = self.get_json(query, &url).await?;

        let quotes = data.get(ASSET_ID).ok_or_else(|| FetchError::MissingField {
            query,
            field: ASSET_ID.to_string(),
        })?;
        quotes
            .get(QUOTE_CURRENCY)
            .copied()
            .ok_or_else(|| FetchError::MissingField {
                query,
                field: format!("{ASSET_ID}.{QUOTE_CURRENCY}"),
            })
    }

    #[instrument(name = "CoinGeckoRangeFetch", skip(self))]
    async fn fetch_monthly_high(&self) -> Result<f64, FetchError> {
        self.fetch_monthly_high_at(Utc::now().timestamp()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const SPOT_PATH: &str = "/api/v3/simple/price";
    const RANGE_PATH: &str = "/api/v3/coins/bitcoin/market_chart/range";

    async fn create_mock_server(request_path: &str, status: u16, body: &str) -> MockServer {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(request_path))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .mount(&mock_server)
            .await;

        mock_server
    }

    #[tokio::test]
    async fn test_successful_current_price_fetch() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(SPOT_PATH))
            .and(query_param("ids", "bitcoin"))
            .and(query_param("vs_currencies", "usd"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string(r#"{"bitcoin":{"usd":40123.45}}"#),
            )
            .expect(1)
            .mount(&mock_server)
            .await;

        let provider = CoinGeckoProvider::new(&mock_server.uri());
        let price = provider.fetch_current_price().await.unwrap();
        assert_eq!(price, 40123.45);
    }

    #[tokio::test]
    async fn test_current_price_missing_currency() {
        let mock_server = create_mock_server(SPOT_PATH, 200, r#"{"bitcoin":{}}"#).await;

        let provider = CoinGeckoProvider::new(&mock_server.uri());
        let result = provider.fetch_current_price().await;
        assert_eq!(
            result.unwrap_err().to_string(),
            "Missing field bitcoin.usd in current price response"
        );
    }

    #[tokio::test]
    async fn test_current_price_missing_asset() {
        let mock_server = create_mock_server(SPOT_PATH, 200, r#"{}"#).await;

        let provider = CoinGeckoProvider::new(&mock_server.uri());
        let result = provider.fetch_current_price().await;
        assert!(matches!(
            result,
            Err(FetchError::MissingField { query: PriceQuery::CurrentPrice, .. })
        ));
    }

    #[tokio::test]
    async fn test_current_price_api_error_response() {
        let mock_server = create_mock_server(SPOT_PATH, 429, "").await;

        let provider = CoinGeckoProvider::new(&mock_server.uri());
        let result = provider.fetch_current_price().await;
        assert_eq!(
            result.unwrap_err().to_string(),
            "HTTP error: 429 Too Many Requests fetching current price"
        );
    }

    #[tokio::test]
    async fn test_current_price_malformed_response() {
        let mock_server = create_mock_server(SPOT_PATH, 200, r#"{"bitcoin":{"usd":"n/a"}}"#).await;

        let provider = CoinGeckoProvider::new(&mock_server.uri());
        let result = provider.fetch_current_price().await;
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Failed to parse JSON response for current price")
        );
    }

    #[tokio::test]
    async fn test_monthly_high_uses_thirty_day_window() {
        let now = 1_700_000_000;
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(RANGE_PATH))
            .and(query_param("vs_currency", "usd"))
            .and(query_param("from", "1697408000"))
            .and(query_param("to", "1700000000"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{
                    "prices": [
                        [1697408000000, 41000.5],
                        [1698000000000, 52310.25],
                        [1699999000000, 48000]
                    ],
                    "market_caps": [],
                    "total_volumes": []
                }"#,
            ))
            .expect(1)
            .mount(&mock_server)
            .await;

        let provider = CoinGeckoProvider::new(&mock_server.uri());
        let high = provider.fetch_monthly_high_at(now).await.unwrap();
        assert_eq!(high, 52310.25);
    }

    #[tokio::test]
    async fn test_monthly_high_with_current_time() {
        let mock_server = create_mock_server(
            RANGE_PATH,
            200,
            r#"{"prices": [[1, 10.0], [2, 30.0], [3, 20.0]]}"#,
        )
        .await;

        let provider = CoinGeckoProvider::new(&mock_server.uri());
        assert_eq!(provider.fetch_monthly_high().await.unwrap(), 30.0);

        let requests = mock_server.received_requests().await.unwrap();
        let params: HashMap<String, String> = requests[0]
            .url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        let from: i64 = params["from"].parse().unwrap();
        let to: i64 = params["to"].parse().unwrap();
        assert_eq!(to - from, 30 * 24 * 60 * 60);
    }

    #[tokio::test]
    async fn test_monthly_high_empty_series() {
        let mock_server = create_mock_server(RANGE_PATH, 200, r#"{"prices": []}"#).await;

        let provider = CoinGeckoProvider::new(&mock_server.uri());
        let result = provider.fetch_monthly_high().await;
        assert!(matches!(
            result,
            Err(FetchError::EmptySeries { query: PriceQuery::MonthlyHigh })
        ));
    }

    #[tokio::test]
    async fn test_monthly_high_missing_prices() {
        let mock_server = create_mock_server(RANGE_PATH, 200, r#"{"error": "rate limited"}"#).await;

        let provider = CoinGeckoProvider::new(&mock_server.uri());
        let result = provider.fetch_monthly_high().await;
        assert!(matches!(result, Err(FetchError::Parse { .. })));
    }

    #[tokio::test]
    async fn test_fetch_sample_against_mock_api() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(SPOT_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"bitcoin":{"usd":40000}}"#))
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path(RANGE_PATH))
            .respond_with(
                ResponseTemplate::new(200).set_body_string(r#"{"prices": [[1, 50000], [2, 45000]]}"#),
            )
            .mount(&mock_server)
            .await;

        let provider = CoinGeckoProvider::new(&mock_server.uri());
        let sample = provider.fetch_sample().await.unwrap();
        assert_eq!(sample.current_price, 40000.0);
        assert_eq!(sample.monthly_high, 50000.0);
    }
}
