//! Built-in flows, embedded at compile time.

use crate::error::{ConfigError, Result};

use super::registry::StepRegistry;

const WEIGHT_LOSS: &str = include_str!("../../flows/weight_loss.json");
const FITNESS: &str = include_str!("../../flows/fitness.json");

/// Ids of every built-in flow.
pub const BUILTIN_FLOWS: [&str; 2] = ["weight_loss", "fitness"];

/// Load a built-in registry by flow id.
pub fn builtin(flow_id: &str) -> Result<StepRegistry> {
    let json = match flow_id {
        "weight_loss" => WEIGHT_LOSS,
        "fitness" => FITNESS,
        other => return Err(ConfigError::UnknownFlow(other.to_string()).into()),
    };
    Ok(StepRegistry::from_json(json)?)
}
