//! Market data models.
//!
//! A [`MarketRecord`] is what the external data layer hands us: loosely typed
//! metadata plus a price history. A [`Market`] is the validated form used by
//! every downstream computation, with a numeric strike and a known strike type.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// Numeric Parsing
// =============================================================================

/// A number as it appears in upstream payloads: either a JSON number or a
/// string such as `"4.5"` or `"1,250"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawNumber {
    /// A JSON number.
    Number(f64),
    /// A textual number.
    Text(String),
}

impl RawNumber {
    /// Parses the value into a finite `f64`.
    ///
    /// Returns `None` for non-numeric text and for NaN or infinite values.
    #[must_use]
    pub fn parse(&self) -> Option<f64> {
        let value = match self {
            Self::Number(n) => *n,
            Self::Text(s) => {
                let cleaned: String = s.trim().chars().filter(|c| *c != ',').collect();
                cleaned.parse::<f64>().ok()?
            }
        };
        value.is_finite().then_some(value)
    }
}

impl From<f64> for RawNumber {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for RawNumber {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

// =============================================================================
// Strike Types
// =============================================================================

/// Direction of a strike market's condition.
///
/// Both variants settle YES when the outcome clears the threshold from above,
/// so the market price reads as the survival function `P(X > strike)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrikeType {
    /// Outcome strictly greater than the threshold.
    Greater,
    /// Outcome greater than or equal to the threshold.
    GreaterOrEqual,
}

impl StrikeType {
    /// Parses an upstream strike-type label.
    ///
    /// Labels describing other conditions (`"less"`, `"between"`, ...) return
    /// `None` because they are not survival-function points.
    #[must_use]
    pub fn parse(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "greater" | ">" => Some(Self::Greater),
            "greater_or_equal" | "greater-or-equal" | ">=" => Some(Self::GreaterOrEqual),
            _ => None,
        }
    }
}

// =============================================================================
// Markets
// =============================================================================

/// One observation of a market's YES price.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    /// Observation time.
    pub timestamp: DateTime<Utc>,
    /// Price in [0, 1], read as `P(outcome > strike)`.
    pub price: f64,
}

impl PricePoint {
    /// Creates a new price point.
    #[must_use]
    pub const fn new(timestamp: DateTime<Utc>, price: f64) -> Self {
        Self { timestamp, price }
    }
}

/// A strike market as delivered by the data-collection layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketRecord {
    /// Market ticker (e.g., "KXCPI-25JAN-T0.3").
    pub ticker: String,
    /// Event ticker shared by every strike of one release.
    pub event_ticker: String,
    /// Strike threshold, possibly textual.
    pub threshold: RawNumber,
    /// Strike-type label (e.g., "greater").
    pub strike_type: String,
    /// Price history in timestamp order.
    #[serde(default)]
    pub prices: Vec<PricePoint>,
}

impl MarketRecord {
    /// Validates the record into a [`Market`].
    ///
    /// Returns `None` when the threshold is not numeric or the strike type is
    /// not a survival condition.
    #[must_use]
    pub fn into_market(self) -> Option<Market> {
        let strike = self.threshold.parse()?;
        let strike_type = StrikeType::parse(&self.strike_type)?;
        let mut prices = self.prices;
        prices.sort_by_key(|p| p.timestamp);
        Some(Market {
            ticker: self.ticker,
            event_ticker: self.event_ticker,
            strike,
            strike_type,
            prices,
        })
    }
}

/// A validated strike market.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Market {
    /// Market ticker.
    pub ticker: String,
    /// Event ticker this market belongs to.
    pub event_ticker: String,
    /// Numeric strike threshold.
    pub strike: f64,
    /// Strike direction.
    pub strike_type: StrikeType,
    /// Price history, sorted by timestamp.
    pub prices: Vec<PricePoint>,
}

impl Market {
    /// Returns the most recent finite price observed at or before `timestamp`
    /// and no older than `max_lookback`.
    ///
    /// A zero lookback means only an observation at exactly `timestamp`
    /// qualifies. Observations after `timestamp` are never returned.
    #[must_use]
    pub fn price_as_of(&self, timestamp: DateTime<Utc>, max_lookback: Duration) -> Option<f64> {
        let idx = self.prices.partition_point(|p| p.timestamp <= timestamp);
        let point = self.prices.get(idx.checked_sub(1)?)?;
        let fresh = timestamp - point.timestamp <= max_lookback;
        (fresh && point.price.is_finite()).then_some(point.price)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record(threshold: RawNumber, strike_type: &str) -> MarketRecord {
        MarketRecord {
            ticker: "KXCPI-25JAN-T0.3".to_string(),
            event_ticker: "KXCPI-25JAN".to_string(),
            threshold,
            strike_type: strike_type.to_string(),
            prices: vec![],
        }
    }

    #[test]
    fn raw_number_parses_numbers_and_text() {
        assert_eq!(RawNumber::from(0.3).parse(), Some(0.3));
        assert_eq!(RawNumber::from(" 0.25 ").parse(), Some(0.25));
        assert_eq!(RawNumber::from("1,250").parse(), Some(1250.0));
    }

    #[test]
    fn raw_number_rejects_garbage_and_non_finite() {
        assert_eq!(RawNumber::from("above 3%").parse(), None);
        assert_eq!(RawNumber::from("").parse(), None);
        assert_eq!(RawNumber::from(f64::NAN).parse(), None);
        assert_eq!(RawNumber::from("inf").parse(), None);
    }

    #[test]
    fn raw_number_deserializes_untagged() {
        let n: RawNumber = serde_json::from_str("4.5").unwrap();
        let s: RawNumber = serde_json::from_str("\"4.5\"").unwrap();
        assert_eq!(n.parse(), Some(4.5));
        assert_eq!(s.parse(), Some(4.5));
    }

    #[test]
    fn strike_type_labels() {
        assert_eq!(StrikeType::parse("greater"), Some(StrikeType::Greater));
        assert_eq!(
            StrikeType::parse("GREATER_OR_EQUAL"),
            Some(StrikeType::GreaterOrEqual)
        );
        assert_eq!(StrikeType::parse(">="), Some(StrikeType::GreaterOrEqual));
        assert_eq!(StrikeType::parse("less"), None);
        assert_eq!(StrikeType::parse("between"), None);
    }

    #[test]
    fn into_market_validates_threshold_and_type() {
        let market = record(RawNumber::from("0.3"), "greater").into_market().unwrap();
        assert!((market.strike - 0.3).abs() < f64::EPSILON);
        assert_eq!(market.strike_type, StrikeType::Greater);

        assert!(record(RawNumber::from("n/a"), "greater").into_market().is_none());
        assert!(record(RawNumber::from(0.3), "less").into_market().is_none());
    }

    #[test]
    fn into_market_sorts_prices() {
        let t0 = Utc.with_ymd_and_hms(2025, 1, 10, 12, 0, 0).unwrap();
        let t1 = Utc.with_ymd_and_hms(2025, 1, 10, 13, 0, 0).unwrap();
        let mut rec = record(RawNumber::from(0.3), "greater");
        rec.prices = vec![PricePoint::new(t1, 0.5), PricePoint::new(t0, 0.4)];
        let market = rec.into_market().unwrap();

        assert_eq!(market.prices[0].timestamp, t0);
        assert_eq!(market.prices[1].timestamp, t1);
    }

    #[test]
    fn price_as_of_zero_lookback_requires_exact_timestamp() {
        let t0 = Utc.with_ymd_and_hms(2025, 1, 10, 12, 0, 0).unwrap();
        let t1 = Utc.with_ymd_and_hms(2025, 1, 10, 13, 0, 0).unwrap();
        let mut rec = record(RawNumber::from(0.3), "greater");
        rec.prices = vec![PricePoint::new(t0, 0.42)];
        let market = rec.into_market().unwrap();

        assert_eq!(market.price_as_of(t0, Duration::zero()), Some(0.42));
        assert_eq!(market.price_as_of(t1, Duration::zero()), None);
    }

    #[test]
    fn price_as_of_never_looks_ahead() {
        let t0 = Utc.with_ymd_and_hms(2025, 1, 10, 12, 0, 0).unwrap();
        let t1 = Utc.with_ymd_and_hms(2025, 1, 10, 12, 5, 0).unwrap();
        let t2 = Utc.with_ymd_and_hms(2025, 1, 10, 12, 10, 0).unwrap();
        let mut rec = record(RawNumber::from(0.3), "greater");
        rec.prices = vec![PricePoint::new(t0, 0.40), PricePoint::new(t2, 0.60)];
        let market = rec.into_market().unwrap();

        // 12:05 sees the 12:00 print, not the 12:10 one
        assert_eq!(market.price_as_of(t1, Duration::minutes(5)), Some(0.40));
        // Too stale
        assert_eq!(market.price_as_of(t1, Duration::minutes(4)), None);
        // Before the first observation
        assert_eq!(
            market.price_as_of(t0 - Duration::minutes(1), Duration::hours(1)),
            None
        );
    }
}
