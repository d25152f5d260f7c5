//! Quiz Flow: branching questionnaire engine with derived health metrics.

pub mod cli;
pub mod config;
pub mod error;
pub mod flow;
pub mod metrics;
pub mod profile;
pub mod store;
pub mod units;

pub use config::EngineConfig;
pub use error::{Error, Result};
pub use flow::{WizardManager, WizardSession};
