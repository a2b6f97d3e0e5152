use crate::{Observation, RawObservation, clean_observations};

use super::AdapterError;

use serde::Deserialize;
use serde_json::Value;

#[derive(Deserialize)]
struct ObservationsEnvelope {
    observations: Vec<RawObservation>,
}

/// FRED series endpoint: missing readings are reported as `"."`.
pub fn observations(value: Value) -> Result<Vec<Observation>, AdapterError> {
    let envelope: ObservationsEnvelope = serde_json::from_value(value)
        .map_err(|e| AdapterError::ParseError(format!("Failed to parse observations: {e}")))?;

    Ok(clean_observations(&envelope.observations))
}
