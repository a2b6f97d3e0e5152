use serde::{Deserialize, Deserializer};

/// Falls back to the default when a persisted field fails to decode,
/// so a single bad entry never invalidates the whole file.
pub fn ok_or_default<'de, T, D>(deserializer: D) -> Result<T, D::Error>
where
    T: Deserialize<'de> + Default,
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(T::deserialize(value).unwrap_or_default())
}

/// Rounds to a fixed number of decimals.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

/// Decimals needed so that multiples of `step` print without drift, never fewer than `min`.
pub fn decimals_for_step(step: f64, min: u32) -> u32 {
    if !step.is_finite() || step <= 0.0 {
        return min;
    }
    let needed = (-(step.log10() + 1e-9).floor()).max(0.0) as u32;
    needed.max(min)
}
