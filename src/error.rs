//! Error types for the quiz engine.

/// Top-level error type for the engine.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("Wizard error: {0}")]
    Wizard(#[from] WizardError),

    #[error("Unit error: {0}")]
    Unit(#[from] UnitError),

    #[error("Metrics error: {0}")]
    Metrics(#[from] MetricsError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("Unknown flow: {0}")]
    UnknownFlow(String),
}

/// Database-related errors.
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("Connection pool error: {0}")]
    Pool(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Problems found while building a step registry.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RegistryError {
    #[error("Registry has no steps")]
    Empty,

    #[error("Duplicate step id: {0}")]
    DuplicateStep(String),

    #[error("Step {step_id} has duplicate option id {option_id}")]
    DuplicateOption { step_id: String, option_id: String },

    #[error("Choice step {0} has no options")]
    NoOptions(String),

    #[error("Step {step_id} visibility refers to unknown step {reference}")]
    UnknownReference { step_id: String, reference: String },

    #[error("Step {step_id} visibility refers to itself or a later step ({reference})")]
    ForwardReference { step_id: String, reference: String },

    #[error("Failed to parse registry: {0}")]
    Parse(String),
}

/// Failures returned by the wizard session. None of these are fatal.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WizardError {
    #[error("Step {step_id} requires an answer before moving on")]
    AnswerRequired { step_id: String },

    #[error("Step {step_id} expects {expected}, got {found}")]
    InvalidAnswerShape {
        step_id: String,
        expected: String,
        found: String,
    },

    #[error("Value {value} for step {step_id} is outside [{min:?}, {max:?}]")]
    AnswerOutOfBounds {
        step_id: String,
        value: f64,
        min: Option<f64>,
        max: Option<f64>,
    },

    #[error("Step {step_id} has no choice {choice_id}")]
    UnknownChoice { step_id: String, choice_id: String },

    #[error("Unknown step: {step_id}")]
    UnknownStep { step_id: String },

    #[error("Step index {index} out of range (0..{len})")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Step {step_id} does not accept toggled choices")]
    NotToggleable { step_id: String },

    #[error("Step {step_id} is hidden by the current answers")]
    StepHidden { step_id: String },

    #[error("Snapshot belongs to flow {found}, not {expected}")]
    SnapshotMismatch { expected: String, found: String },
}

/// Unit conversion and parsing errors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum UnitError {
    #[error("{quantity} must be a finite number")]
    NonFinite { quantity: &'static str },

    #[error("{quantity} must not be negative: {value}")]
    Negative { quantity: &'static str, value: f64 },

    #[error("Cannot read a {quantity} from {input:?}")]
    Unparseable {
        quantity: &'static str,
        input: String,
    },
}

/// Derived-metric errors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MetricsError {
    #[error("Not yet computable, missing: {}", missing.join(", "))]
    NotYetComputable { missing: Vec<&'static str> },

    #[error("Invalid input: {0}")]
    InvalidInput(#[from] UnitError),
}

/// Result type alias for the engine.
pub type Result<T> = std::result::Result<T, Error>;
