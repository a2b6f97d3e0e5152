pub mod backtest;
pub mod fred;

use crate::{FrontierPayload, Observation};

use serde_json::Value;

#[derive(thiserror::Error, Debug)]
pub enum AdapterError {
    #[error("Parsing error: {0}")]
    ParseError(String),
    #[error("Missing field: {0}")]
    MissingField(&'static str),
    #[error("Payload contains no usable observations")]
    EmptySeries,
}

/// Payload shapes a series can arrive in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeriesSource {
    /// `{"observations": [{"date", "value"}]}`
    Fred,
    /// `{"chart_data": [{"Date", "Value", "TotalInvested"}]}`
    Backtest,
    /// a bare array of observations
    Bare,
}

impl SeriesSource {
    fn detect(value: &Value) -> Option<Self> {
        match value {
            Value::Array(_) => Some(SeriesSource::Bare),
            Value::Object(map) if map.contains_key("observations") => Some(SeriesSource::Fred),
            Value::Object(map) if map.contains_key("chart_data") => Some(SeriesSource::Backtest),
            _ => None,
        }
    }
}

/// Decodes a series payload of any supported shape into clean observations.
pub fn parse_series(text: &str) -> Result<Vec<Observation>, AdapterError> {
    let value: Value =
        serde_json::from_str(text).map_err(|e| AdapterError::ParseError(e.to_string()))?;

    let source = SeriesSource::detect(&value).ok_or(AdapterError::MissingField("observations"))?;

    let observations = match source {
        SeriesSource::Fred => fred::observations(value)?,
        SeriesSource::Backtest => backtest::chart_data(value)?,
        SeriesSource::Bare => {
            let raw = serde_json::from_value::<Vec<crate::RawObservation>>(value)
                .map_err(|e| AdapterError::ParseError(e.to_string()))?;
            crate::clean_observations(&raw)
        }
    };

    if observations.is_empty() {
        return Err(AdapterError::EmptySeries);
    }

    log::debug!("Decoded {} observations from {:?} payload", observations.len(), source);
    Ok(observations)
}

const MAX_DRAWDOWN_KEYS: &[&str] = &["max_drawdown", "MaxDrawdown", "maxDrawdown"];

/// Maximum drawdown (percent) the backend already computed for this series, if any.
///
/// Looked up at the top level and under `metrics`.
pub fn reported_max_drawdown(text: &str) -> Option<f64> {
    let value: Value = serde_json::from_str(text).ok()?;

    [Some(&value), value.get("metrics")]
        .into_iter()
        .flatten()
        .flat_map(|v| MAX_DRAWDOWN_KEYS.iter().filter_map(move |k| v.get(*k)))
        .find_map(crate::parse_number)
}

pub fn parse_frontier(text: &str) -> Result<FrontierPayload, AdapterError> {
    serde_json::from_str(text)
        .map_err(|e| AdapterError::ParseError(format!("Failed to parse frontier payload: {e}")))
}
