use crate::{Observation, RawObservation, clean_observations};

use super::AdapterError;

use serde::Deserialize;
use serde_json::Value;

#[derive(Deserialize)]
struct BacktestEnvelope {
    chart_data: Vec<RawObservation>,
}

/// Backtest results: portfolio value per day plus the capital invested so far.
pub fn chart_data(value: Value) -> Result<Vec<Observation>, AdapterError> {
    let envelope: BacktestEnvelope = serde_json::from_value(value)
        .map_err(|e| AdapterError::ParseError(format!("Failed to parse chart_data: {e}")))?;

    let observations = clean_observations(&envelope.chart_data);

    let missing_invested = observations.iter().filter(|o| o.invested.is_none()).count();
    if missing_invested > 0 {
        log::debug!("{missing_invested} backtest rows carry no invested capital");
    }

    Ok(observations)
}
