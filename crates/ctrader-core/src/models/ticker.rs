//! Ticker events pushed by the timeseries stream

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// One price observation for a product
///
/// Wire format:
///
/// ```json
/// {"product":"BTC-EUR","price":13470.1,"side":"sell","time":"2017-12-22T00:09:24.015Z","size":0.00371192}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickerEvent {
    /// Exchange product identifier, e.g. `BTC-EUR`
    pub product: String,
    /// Trade price
    pub price: f64,
    /// Trade side as reported by the producer (`buy` / `sell`)
    pub side: String,
    /// Trade time
    pub time: DateTime<Utc>,
    /// Trade size
    pub size: f64,
}

impl TickerEvent {
    /// Trade time as milliseconds since the Unix epoch (chart x value)
    pub fn epoch_millis(&self) -> i64 {
        self.time.timestamp_millis()
    }

    pub fn is_buy(&self) -> bool {
        self.side.eq_ignore_ascii_case("buy")
    }

    pub fn is_sell(&self) -> bool {
        self.side.eq_ignore_ascii_case("sell")
    }
}

/// A `from-to` currency pair as used in timeseries routes
///
/// Route segments are lowercase (`btc-eur`); hub keys and exchange
/// identifiers are uppercase (`BTC-EUR`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Product {
    from: String,
    to: String,
}

impl Product {
    /// Parse a route segment of the form `from-to` (ASCII letters only)
    pub fn parse(segment: &str) -> CoreResult<Self> {
        let (from, to) = segment
            .split_once('-')
            .ok_or_else(|| CoreError::InvalidProduct(segment.to_string()))?;

        let valid = |part: &str| !part.is_empty() && part.bytes().all(|b| b.is_ascii_alphabetic());
        if !valid(from) || !valid(to) {
            return Err(CoreError::InvalidProduct(segment.to_string()));
        }

        Ok(Self {
            from: from.to_ascii_uppercase(),
            to: to.to_ascii_uppercase(),
        })
    }

    pub fn from_currency(&self) -> &str {
        &self.from
    }

    pub fn to_currency(&self) -> &str {
        &self.to
    }

    /// Lowercase route segment, e.g. `btc-eur`
    pub fn route_segment(&self) -> String {
        format!(
            "{}-{}",
            self.from.to_ascii_lowercase(),
            self.to.to_ascii_lowercase()
        )
    }

    /// Key identifying the ticker channel of this product on a provider
    pub fn channel_key(&self, provider: &str) -> String {
        format!("{}-{}", provider, self)
    }
}

impl fmt::Display for Product {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.from, self.to)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{"product":"BTC-EUR","price":13470.1,"side":"sell","time":"2017-12-22T00:09:24.015Z","size":0.00371192}"#;

    #[test]
    fn test_decode_sample_event() {
        let event: TickerEvent = serde_json::from_str(SAMPLE).unwrap();
        assert_eq!(event.product, "BTC-EUR");
        assert_eq!(event.price, 13470.1);
        assert_eq!(event.size, 0.00371192);
        assert!(event.is_sell());
        assert!(!event.is_buy());
    }

    #[test]
    fn test_epoch_millis() {
        let event: TickerEvent = serde_json::from_str(SAMPLE).unwrap();
        // 2017-12-22T00:09:24.015Z
        assert_eq!(event.epoch_millis(), 1_513_901_364_015);
    }

    #[test]
    fn test_decode_rejects_bad_time() {
        let data = r#"{"product":"BTC-EUR","price":1.0,"side":"buy","time":"yesterday","size":1.0}"#;
        assert!(serde_json::from_str::<TickerEvent>(data).is_err());
    }

    #[test]
    fn test_product_parse() {
        let product = Product::parse("btc-eur").unwrap();
        assert_eq!(product.to_string(), "BTC-EUR");
        assert_eq!(product.route_segment(), "btc-eur");
        assert_eq!(product.channel_key("gdax"), "gdax-BTC-EUR");
    }

    #[test]
    fn test_product_parse_invalid() {
        assert!(Product::parse("btceur").is_err());
        assert!(Product::parse("btc-").is_err());
        assert!(Product::parse("btc-e1r").is_err());
    }
}
