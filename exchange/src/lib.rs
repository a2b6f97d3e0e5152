pub mod adapter;

pub use adapter::AdapterError;

use chrono::NaiveDate;
use serde::de::Error as SerdeError;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// A single finite observation of a time series.
///
/// Produced by the adapters after sentinel filtering; the core only ever reads these.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Observation {
    pub date: NaiveDate,
    pub value: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invested: Option<f64>,
}

impl Observation {
    pub fn new(date: NaiveDate, value: f64) -> Self {
        Self {
            date,
            value,
            invested: None,
        }
    }

    pub fn with_invested(mut self, invested: f64) -> Self {
        self.invested = Some(invested);
        self
    }
}

/// Observation as delivered by a provider: values may be numbers, numeric strings,
/// the FRED `"."` placeholder, `null`, or missing entirely.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawObservation {
    #[serde(alias = "Date", default)]
    pub date: Option<String>,
    #[serde(alias = "Value", default, deserialize_with = "de_lenient_f64")]
    pub value: Option<f64>,
    #[serde(alias = "TotalInvested", default, deserialize_with = "de_lenient_f64")]
    pub invested: Option<f64>,
}

impl RawObservation {
    pub fn clean(&self) -> Option<Observation> {
        let date = self.date.as_deref().and_then(parse_date)?;
        let value = self.value.filter(|v| v.is_finite())?;

        Some(Observation {
            date,
            value,
            invested: self.invested.filter(|v| v.is_finite()),
        })
    }
}

/// Drops every entry without a parseable date or a finite value and restores
/// chronological order if the provider delivered it shuffled.
pub fn clean_observations(raw: &[RawObservation]) -> Vec<Observation> {
    let mut out: Vec<Observation> = raw.iter().filter_map(RawObservation::clean).collect();

    let dropped = raw.len() - out.len();
    if dropped > 0 {
        log::debug!("Dropped {dropped} non-numeric observations out of {}", raw.len());
    }

    if !out.is_sorted_by_key(|o| o.date) {
        log::debug!("Observations were out of order, sorting by date");
        out.sort_by_key(|o| o.date);
    }

    out
}

/// Accepts `2024-01-31` as well as datetime strings like `2024-01-31T00:00:00Z`.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    let head = s.get(..10).unwrap_or(s);
    NaiveDate::parse_from_str(head, "%Y-%m-%d").ok()
}

/// Lenient numeric decoding shared by every provider payload.
///
/// `"12.5"`, `"12,5"` and `"12.5%"` all decode to `12.5`; `"."`, `null`, booleans
/// and non-finite numbers decode to `None`.
pub fn parse_number(val: &Value) -> Option<f64> {
    let n = match val {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let cleaned = s.trim().trim_end_matches('%').replace(',', ".");
            cleaned.parse::<f64>().ok()
        }
        _ => None,
    }?;
    n.is_finite().then_some(n)
}

fn de_lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(parse_number(&value))
}

/// Raw asset weights in the order the provider listed them.
///
/// Weights may be fractions (`0.4`) or percentages (`40`); normalization to
/// percent-of-100 happens in the core.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawWeights(pub Vec<(String, f64)>);

impl RawWeights {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(t, w)| (t.as_str(), *w))
    }

    fn from_value(value: &Value) -> Option<Self> {
        let entries: Vec<(String, f64)> = match value {
            Value::Object(map) => map
                .iter()
                .filter_map(|(ticker, w)| parse_number(w).map(|w| (ticker.clone(), w)))
                .collect(),
            Value::Array(items) => items
                .iter()
                .filter_map(|item| {
                    let ticker = first_key(item, &["ticker", "symbol"])?.as_str()?;
                    let weight = first_key(
                        item,
                        &["weight", "weight_percent", "pct", "percent", "value"],
                    )
                    .and_then(parse_number)?;
                    Some((ticker.to_string(), weight))
                })
                .collect(),
            _ => return None,
        };

        if entries.is_empty() {
            None
        } else {
            Some(Self(entries))
        }
    }
}

const VOLATILITY_KEYS: &[&str] = &["volatility", "Volatility", "annual_volatility"];
const RETURN_KEYS: &[&str] = &["return", "Return", "cagr_approx"];
const SHARPE_KEYS: &[&str] = &["sharpe", "Sharpe", "sharpe_ratio"];
const WEIGHT_KEYS: &[&str] = &[
    "weights",
    "composition",
    "allocation",
    "static_weights",
    "portfolio_weights",
];

fn first_key<'a>(value: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    let map = value.as_object()?;
    keys.iter()
        .filter_map(|k| map.get(*k))
        .find(|v| !v.is_null())
}

/// A portfolio point as delivered by the optimizer backend.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawPortfolio {
    pub volatility: Option<f64>,
    pub ret: Option<f64>,
    pub sharpe: Option<f64>,
    pub weights: Option<RawWeights>,
}

impl<'de> Deserialize<'de> for RawPortfolio {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        // backends disagree on field names, so look the value up by every known alias
        let value = Value::deserialize(deserializer)?;
        if !value.is_object() {
            return Err(SerdeError::custom("Portfolio must be an object"));
        }

        Ok(RawPortfolio {
            volatility: first_key(&value, VOLATILITY_KEYS).and_then(parse_number),
            ret: first_key(&value, RETURN_KEYS).and_then(parse_number),
            sharpe: first_key(&value, SHARPE_KEYS).and_then(parse_number),
            weights: first_key(&value, WEIGHT_KEYS).and_then(RawWeights::from_value),
        })
    }
}

/// Efficient-frontier response: optimizer anchors plus the raw simulation pool.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FrontierPayload {
    #[serde(alias = "simulated", alias = "simulations")]
    pub simulated_portfolios: Vec<RawPortfolio>,
    pub max_sharpe_portfolio: Option<RawPortfolio>,
    pub min_volatility_portfolio: Option<RawPortfolio>,
    pub max_return_portfolio: Option<RawPortfolio>,
    pub user_portfolio_point: Option<RawPortfolio>,
    #[serde(deserialize_with = "de_lenient_f64")]
    pub risk_free_rate_percent: Option<f64>,
}
