//! Central bank key rate over the DailyInfo SOAP service.
//!
//! The service answers a `KeyRate` request with a DataSet diffgram holding
//! one `KR` row per day, newest first. Only the first row is read.

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{Days, NaiveDate, Utc};
use ledgerline_core::rates::{RateError, RateProvider};
use ledgerline_shared::config::RatesConfig;
use reqwest::StatusCode;
use reqwest::header::CONTENT_TYPE;
use roxmltree::{Document, Node};
use rust_decimal::Decimal;
use tracing::{debug, error, info};

/// SOAP action header value for the key rate operation.
pub const KEY_RATE_ACTION: &str = "http://web.cbr.ru/KeyRate";

const SOAP_CONTENT_TYPE: &str = "application/soap+xml; charset=utf-8";

/// Days of history requested so a weekend or holiday still yields a row.
const LOOKBACK_DAYS: u64 = 30;

/// [`RateProvider`] backed by the central bank web service.
#[derive(Debug, Clone)]
pub struct CbrRateProvider {
    client: reqwest::Client,
    url: String,
}

impl CbrRateProvider {
    /// Creates a provider for the endpoint and timeout in `settings`.
    ///
    /// # Errors
    ///
    /// Returns `RateError::Unavailable` if the HTTP client cannot be built.
    pub fn new(settings: &RatesConfig) -> Result<Self, RateError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| RateError::Unavailable(e.to_string()))?;

        Ok(Self {
            client,
            url: settings.provider_url.clone(),
        })
    }
}

#[async_trait]
impl RateProvider for CbrRateProvider {
    async fn current_rate(&self) -> Result<Decimal, RateError> {
        let body = build_request(Utc::now().date_naive());

        let response = self
            .client
            .post(&self.url)
            .header(CONTENT_TYPE, SOAP_CONTENT_TYPE)
            .header("SOAPAction", KEY_RATE_ACTION)
            .body(body)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, url = %self.url, "Key rate request failed");
                RateError::Unavailable(e.to_string())
            })?;

        let status = response.status();
        if status != StatusCode::OK {
            error!(%status, url = %self.url, "Key rate service returned an error status");
            return Err(RateError::Unavailable(format!("unexpected status {status}")));
        }

        let text = response
            .text()
            .await
            .map_err(|e| RateError::Unavailable(e.to_string()))?;
        debug!(bytes = text.len(), "Key rate response received");

        let rate = parse_key_rate(&text)?;
        info!(%rate, "Key rate retrieved");
        Ok(rate)
    }
}

/// Renders the SOAP 1.2 envelope asking for the last month of key rates.
#[must_use]
pub fn build_request(today: NaiveDate) -> String {
    let from = today.checked_sub_days(Days::new(LOOKBACK_DAYS)).unwrap_or(today);
    format!(
        concat!(
            r#"<?xml version="1.0" encoding="utf-8"?>"#,
            r#"<soap12:Envelope xmlns:soap12="http://www.w3.org/2003/05/soap-envelope">"#,
            "<soap12:Body>",
            r#"<KeyRate xmlns="http://web.cbr.ru/">"#,
            "<fromDate>{from}</fromDate>",
            "<ToDate>{to}</ToDate>",
            "</KeyRate>",
            "</soap12:Body>",
            "</soap12:Envelope>"
        ),
        from = from.format("%Y-%m-%d"),
        to = today.format("%Y-%m-%d"),
    )
}

/// Extracts the most recent rate from a `KeyRate` response body.
///
/// # Errors
///
/// Returns `RateError::Malformed` if the body is not XML, has no
/// `diffgram/KeyRate/KR/Rate` path, or the rate is not a decimal.
pub fn parse_key_rate(xml: &str) -> Result<Decimal, RateError> {
    let doc = Document::parse(xml).map_err(|e| RateError::Malformed(e.to_string()))?;

    let row = doc
        .descendants()
        .filter(|n| n.has_tag_name("diffgram"))
        .flat_map(|diffgram| named_children(diffgram, "KeyRate"))
        .flat_map(|table| named_children(table, "KR"))
        .next()
        .ok_or_else(|| RateError::Malformed("no KR row in response".to_string()))?;

    let text = named_children(row, "Rate")
        .next()
        .and_then(|rate| rate.text())
        .ok_or_else(|| RateError::Malformed("KR row has no Rate".to_string()))?;

    Decimal::from_str(text.trim())
        .map_err(|e| RateError::Malformed(format!("rate {text:?}: {e}")))
}

fn named_children<'a, 'input>(
    node: Node<'a, 'input>,
    name: &'static str,
) -> impl Iterator<Item = Node<'a, 'input>> {
    node.children().filter(move |n| n.has_tag_name(name))
}
