//! Quote provider backed by Revolut's public exchange endpoint.
//!
//! The endpoint is unofficial and unversioned, so the response is validated
//! defensively: the payload must carry a positive numeric per-unit rate and
//! echo the requested pair back exactly, or the quote is rejected outright.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument};

use crate::core::currency;
use crate::core::rate::{RateProvider, RateQuote};
use crate::error::{Error, Result};

/// Representative conversion amount. The value is irrelevant to the result
/// because only the normalized per-unit rate is read, never the total.
const QUOTE_AMOUNT: u32 = 10_000;

/// The upstream rejects obviously non-browser traffic, so requests carry a
/// realistic user agent and a referer/origin matching the provider's site.
const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

pub struct RevolutProvider {
    base_url: String,
    client: reqwest::Client,
}

impl RevolutProvider {
    /// `timeout` is the fixed overall deadline for the upstream call; there
    /// is no retry inside this component.
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue, ORIGIN, REFERER};

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json, text/plain, */*"));
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
        headers.insert(REFERER, HeaderValue::from_static("https://www.revolut.com/"));
        headers.insert(ORIGIN, HeaderValue::from_static("https://www.revolut.com"));

        let client = reqwest::Client::builder()
            .user_agent(BROWSER_USER_AGENT)
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(RevolutProvider {
            base_url: base_url.to_string(),
            client,
        })
    }
}

#[derive(Debug, Deserialize)]
struct QuoteResponse {
    rate: Option<RatePayload>,
}

#[derive(Debug, Deserialize)]
struct RatePayload {
    from: Option<String>,
    to: Option<String>,
    rate: Option<f64>,
}

#[async_trait]
impl RateProvider for RevolutProvider {
    fn name(&self) -> &'static str {
        "revolut"
    }

    #[instrument(
        name = "RevolutQuote",
        skip(self),
        fields(from = %from, to = %to)
    )]
    async fn fetch_rate(&self, from: &str, to: &str) -> Result<RateQuote> {
        let from = currency::ensure_supported(from)?;
        let to = currency::ensure_supported(to)?;

        // The upstream does not reliably support same-currency pairs, and the
        // answer is known anyway.
        if from == to {
            return Ok(RateQuote {
                from,
                to,
                rate: 1.0,
                raw: None,
            });
        }

        let url = format!("{}/api/exchange/quote", self.base_url);
        debug!("Requesting quote from {}", url);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("amount", QUOTE_AMOUNT.to_string()),
                ("country", "GB".to_string()),
                ("fromCurrency", from.clone()),
                ("isRecipientAmount", "false".to_string()),
                ("toCurrency", to.clone()),
            ])
            .send()
            .await
            .map_err(|e| {
                Error::UpstreamUnavailable(format!("request error for {from}->{to}: {e}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::UpstreamUnavailable(format!(
                "HTTP {status} for {from}->{to}"
            )));
        }

        let body = response.text().await.map_err(|e| {
            Error::UpstreamUnavailable(format!("failed to read body for {from}->{to}: {e}"))
        })?;

        let raw: serde_json::Value = serde_json::from_str(&body).map_err(|e| {
            Error::UpstreamFormat(format!("non-JSON body for {from}->{to}: {e}"))
        })?;

        let quote: QuoteResponse = serde_json::from_value(raw.clone()).map_err(|e| {
            Error::UpstreamFormat(format!("unexpected shape for {from}->{to}: {e}"))
        })?;

        let payload = quote.rate.ok_or_else(|| {
            Error::UpstreamFormat(format!("missing rate object for {from}->{to}"))
        })?;

        let rate = payload.rate.filter(|r| *r > 0.0).ok_or_else(|| {
            Error::UpstreamFormat(format!("missing or non-positive rate for {from}->{to}"))
        })?;

        if payload.from.as_deref() != Some(from.as_str())
            || payload.to.as_deref() != Some(to.as_str())
        {
            return Err(Error::UpstreamFormat(format!(
                "echoed pair {:?}->{:?} does not match requested {from}->{to}",
                payload.from, payload.to
            )));
        }

        debug!("Quote for {}->{}: {}", from, to, rate);

        Ok(RateQuote {
            from,
            to,
            rate,
            raw: Some(raw),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider(base_url: &str) -> RevolutProvider {
        RevolutProvider::new(base_url, Duration::from_secs(5)).unwrap()
    }

    async fn mock_quote(mock_response: &str) -> MockServer {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/exchange/quote"))
            .respond_with(ResponseTemplate::new(200).set_body_string(mock_response))
            .mount(&mock_server)
            .await;

        mock_server
    }

    #[tokio::test]
    async fn test_successful_quote_fetch() {
        let mock_response = r#"{
            "rate": {
                "from": "JPY",
                "to": "VND",
                "rate": 190.5
            },
            "timestamp": 1714557600000
        }"#;

        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/exchange/quote"))
            .and(query_param("amount", "10000"))
            .and(query_param("country", "GB"))
            .and(query_param("fromCurrency", "JPY"))
            .and(query_param("isRecipientAmount", "false"))
            .and(query_param("toCurrency", "VND"))
            .respond_with(ResponseTemplate::new(200).set_body_string(mock_response))
            .mount(&mock_server)
            .await;

        let quote = provider(&mock_server.uri())
            .fetch_rate("jpy", "vnd")
            .await
            .unwrap();
        assert_eq!(quote.from, "JPY");
        assert_eq!(quote.to, "VND");
        assert_eq!(quote.rate, 190.5);
        assert!(quote.raw.is_some());
    }

    #[tokio::test]
    async fn test_same_currency_skips_upstream() {
        // No mock is mounted: any request would come back 404 and fail the
        // fetch, so a successful rate of 1 proves zero upstream calls.
        let mock_server = MockServer::start().await;
        let quote = provider(&mock_server.uri())
            .fetch_rate("JPY", "jpy")
            .await
            .unwrap();
        assert_eq!(quote.rate, 1.0);
        assert_eq!(quote.from, "JPY");
        assert_eq!(quote.to, "JPY");
        assert!(quote.raw.is_none());
    }

    #[tokio::test]
    async fn test_unsupported_currency_rejected_without_call() {
        let mock_server = MockServer::start().await;
        let result = provider(&mock_server.uri()).fetch_rate("EUR", "USD").await;
        assert!(matches!(
            result.unwrap_err(),
            Error::UnsupportedCurrency(ref c) if c == "EUR"
        ));
    }

    #[tokio::test]
    async fn test_echo_mismatch_is_a_format_error() {
        let mock_response = r#"{
            "rate": { "from": "USD", "to": "VND", "rate": 25000.0 }
        }"#;
        let mock_server = mock_quote(mock_response).await;

        let result = provider(&mock_server.uri()).fetch_rate("JPY", "VND").await;
        assert!(matches!(result.unwrap_err(), Error::UpstreamFormat(_)));
    }

    #[tokio::test]
    async fn test_missing_rate_field_is_a_format_error() {
        let mock_server = mock_quote(r#"{ "timestamp": 1714557600000 }"#).await;

        let result = provider(&mock_server.uri()).fetch_rate("JPY", "VND").await;
        assert!(matches!(result.unwrap_err(), Error::UpstreamFormat(_)));
    }

    #[tokio::test]
    async fn test_zero_rate_is_a_format_error() {
        let mock_server =
            mock_quote(r#"{ "rate": { "from": "JPY", "to": "VND", "rate": 0.0 } }"#).await;

        let result = provider(&mock_server.uri()).fetch_rate("JPY", "VND").await;
        assert!(matches!(result.unwrap_err(), Error::UpstreamFormat(_)));
    }

    #[tokio::test]
    async fn test_non_json_body_is_a_format_error() {
        let mock_server = mock_quote("<html>blocked</html>").await;

        let result = provider(&mock_server.uri()).fetch_rate("JPY", "VND").await;
        assert!(matches!(result.unwrap_err(), Error::UpstreamFormat(_)));
    }

    #[tokio::test]
    async fn test_http_error_is_unavailable() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/exchange/quote"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&mock_server)
            .await;

        let result = provider(&mock_server.uri()).fetch_rate("JPY", "VND").await;
        assert!(matches!(result.unwrap_err(), Error::UpstreamUnavailable(_)));
    }
}
