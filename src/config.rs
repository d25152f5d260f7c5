//! Configuration types.

use std::path::PathBuf;

use crate::error::ConfigError;
use crate::flow::AutoAdvanceConfig;
use crate::flow::catalog::BUILTIN_FLOWS;
use crate::units::UnitSystem;

/// Engine configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// libSQL file that holds persisted progress.
    pub db_path: PathBuf,
    /// Built-in flow to run.
    pub flow: String,
    /// Unit system used until the host says otherwise.
    pub unit_system: UnitSystem,
    /// Loading splash before the first step. `None` disables it.
    pub splash: Option<AutoAdvanceConfig>,
    /// Prefix of every persistence key.
    pub persist_key_prefix: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("./data/quiz-flow.db"),
            flow: "weight_loss".to_string(),
            unit_system: UnitSystem::Metric,
            splash: Some(default_splash()),
            persist_key_prefix: "quiz".to_string(),
        }
    }
}

fn default_splash() -> AutoAdvanceConfig {
    AutoAdvanceConfig {
        ceiling: 100,
        step: 4,
        tick_ms: 30,
        settle_ms: 200,
    }
}

impl EngineConfig {
    /// Build config from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from any key lookup. Unset or unparseable numbers fall
    /// back to defaults; an unknown flow or unit system is an error.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let db_path = lookup("QUIZ_FLOW_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.db_path);

        let flow = lookup("QUIZ_FLOW_FLOW").unwrap_or(defaults.flow);
        if !BUILTIN_FLOWS.contains(&flow.as_str()) {
            return Err(ConfigError::UnknownFlow(flow));
        }

        let unit_system = match lookup("QUIZ_FLOW_UNITS") {
            Some(raw) => raw.parse().map_err(|_| ConfigError::InvalidValue {
                key: "QUIZ_FLOW_UNITS".to_string(),
                message: format!("expected metric or imperial, got {raw:?}"),
            })?,
            None => defaults.unit_system,
        };

        let base = default_splash();
        let tick_ms: u64 = lookup("QUIZ_FLOW_SPLASH_TICK_MS")
            .and_then(|s| s.parse().ok())
            .unwrap_or(base.tick_ms);
        let settle_ms: u64 = lookup("QUIZ_FLOW_SPLASH_SETTLE_MS")
            .and_then(|s| s.parse().ok())
            .unwrap_or(base.settle_ms);
        // A zero tick turns the splash off.
        let splash = (tick_ms > 0).then_some(AutoAdvanceConfig {
            tick_ms,
            settle_ms,
            ..base
        });

        let persist_key_prefix = lookup("QUIZ_FLOW_KEY_PREFIX")
            .filter(|p| !p.trim().is_empty())
            .unwrap_or(defaults.persist_key_prefix);

        Ok(Self {
            db_path,
            flow,
            unit_system,
            splash,
            persist_key_prefix,
        })
    }
}
