//! Network-backed quote provider.
//!
//! Fetches quotes from a three-field CSV feed: one `symbol, name, price`
//! record per requested symbol (the classic Yahoo `quotes.csv` wire
//! format). Every failure mode — structurally invalid symbol, transport
//! error, non-success status, malformed CSV, non-numeric or negative price
//! — collapses to `None`, per the [`QuoteProvider`] contract.
//!
//! The HTTP timeout is the caller's responsibility: pass it to
//! [`YahooCsvProvider::new`] or inject a preconfigured client with
//! [`YahooCsvProvider::with_client`].

use std::time::Duration;

use async_trait::async_trait;
use engine::{MoneyCents, Quote, QuoteProvider, symbol_is_well_formed};
use reqwest::Url;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("invalid base url: {0}")]
    InvalidBaseUrl(String),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

pub struct YahooCsvProvider {
    http: reqwest::Client,
    base_url: Url,
}

impl YahooCsvProvider {
    /// Creates a provider with its own HTTP client and request timeout.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, BuildError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Self::with_client(http, base_url)
    }

    /// Creates a provider around an existing HTTP client.
    pub fn with_client(http: reqwest::Client, base_url: &str) -> Result<Self, BuildError> {
        let base_url =
            Url::parse(base_url).map_err(|err| BuildError::InvalidBaseUrl(err.to_string()))?;
        Ok(Self { http, base_url })
    }
}

#[async_trait]
impl QuoteProvider for YahooCsvProvider {
    async fn lookup(&self, symbol: &str) -> Option<Quote> {
        let symbol = symbol.trim();
        if !symbol_is_well_formed(symbol) {
            return None;
        }

        let mut url = self.base_url.clone();
        url.query_pairs_mut()
            .append_pair("f", "snl1")
            .append_pair("s", symbol);

        let response = match self.http.get(url).send().await {
            Ok(response) => response,
            Err(err) => {
                tracing::debug!("quote fetch failed for {symbol}: {err}");
                return None;
            }
        };
        let response = match response.error_for_status() {
            Ok(response) => response,
            Err(err) => {
                tracing::debug!("quote feed rejected {symbol}: {err}");
                return None;
            }
        };
        let body = match response.text().await {
            Ok(body) => body,
            Err(err) => {
                tracing::debug!("quote body unreadable for {symbol}: {err}");
                return None;
            }
        };

        parse_quote_record(&body)
    }
}

/// Parses the first record of a `symbol, name, price` CSV response.
fn parse_quote_record(body: &str) -> Option<Quote> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(body.as_bytes());

    let record = reader.records().next()?.ok()?;
    if record.len() < 3 {
        return None;
    }

    let symbol = record.get(0)?.trim().to_ascii_uppercase();
    if symbol.is_empty() {
        return None;
    }
    let price: MoneyCents = record.get(2)?.trim().parse().ok()?;
    if price.is_negative() {
        return None;
    }

    Some(Quote {
        symbol,
        name: record.get(1)?.trim().to_string(),
        price,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_three_field_record() {
        let quote = parse_quote_record("aapl,\"Apple Inc.\",171.26\r\n").unwrap();
        assert_eq!(quote.symbol, "AAPL");
        assert_eq!(quote.name, "Apple Inc.");
        assert_eq!(quote.price, MoneyCents::new(17_126));
    }

    #[test]
    fn rejects_missing_fields() {
        assert!(parse_quote_record("").is_none());
        assert!(parse_quote_record("AAPL,Apple Inc.").is_none());
    }

    #[test]
    fn rejects_non_numeric_price() {
        // The feed reports unknown symbols with an "N/A" price field.
        assert!(parse_quote_record("FOO,\"FOO\",N/A").is_none());
    }

    #[test]
    fn rejects_negative_price() {
        assert!(parse_quote_record("FOO,\"FOO\",-1.00").is_none());
    }
}
