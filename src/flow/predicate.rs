//! Declarative visibility predicates over the answer store.
//!
//! A predicate about a step that has no answer evaluates to false, so a
//! partially completed session never fails navigation.

use serde::{Deserialize, Serialize};

use super::answers::{Answer, AnswerStore};
use crate::units::{to_metric_height, to_metric_weight};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Predicate {
    /// Single-choice answer equals `value`.
    Equals { step: String, value: String },
    /// Answered, and the single-choice answer differs from `value`.
    NotEquals { step: String, value: String },
    /// Single-choice answer is one of `values`.
    OneOf { step: String, values: Vec<String> },
    /// Multi-choice answer includes `value` (or single-choice equals it).
    Contains { step: String, value: String },
    /// Numeric answer (metric for measurements) is strictly greater.
    GreaterThan { step: String, value: f64 },
    /// Numeric answer (metric for measurements) is strictly less.
    LessThan { step: String, value: f64 },
    Answered { step: String },
    All { all: Vec<Predicate> },
    Any { any: Vec<Predicate> },
}

impl Predicate {
    pub fn equals(step: &str, value: &str) -> Self {
        Self::Equals {
            step: step.to_string(),
            value: value.to_string(),
        }
    }

    pub fn not_equals(step: &str, value: &str) -> Self {
        Self::NotEquals {
            step: step.to_string(),
            value: value.to_string(),
        }
    }

    pub fn contains(step: &str, value: &str) -> Self {
        Self::Contains {
            step: step.to_string(),
            value: value.to_string(),
        }
    }

    pub fn answered(step: &str) -> Self {
        Self::Answered {
            step: step.to_string(),
        }
    }

    /// Evaluate against the current answers.
    pub fn evaluate(&self, answers: &AnswerStore) -> bool {
        match self {
            Self::Equals { step, value } => choice(answers, step) == Some(value.as_str()),
            Self::NotEquals { step, value } => {
                matches!(choice(answers, step), Some(c) if c != value)
            }
            Self::OneOf { step, values } => {
                matches!(choice(answers, step), Some(c) if values.iter().any(|v| v == c))
            }
            Self::Contains { step, value } => match answers.get(step) {
                Some(Answer::Choices(set)) => set.contains(value),
                Some(Answer::Choice(c)) => c == value,
                _ => false,
            },
            Self::GreaterThan { step, value } => {
                matches!(numeric(answers, step), Some(n) if n > *value)
            }
            Self::LessThan { step, value } => {
                matches!(numeric(answers, step), Some(n) if n < *value)
            }
            Self::Answered { step } => answers.get(step).is_some(),
            Self::All { all } => all.iter().all(|p| p.evaluate(answers)),
            Self::Any { any } => any.iter().any(|p| p.evaluate(answers)),
        }
    }

    /// Step ids this predicate reads.
    pub fn references(&self) -> Vec<&str> {
        match self {
            Self::Equals { step, .. }
            | Self::NotEquals { step, .. }
            | Self::OneOf { step, .. }
            | Self::Contains { step, .. }
            | Self::GreaterThan { step, .. }
            | Self::LessThan { step, .. }
            | Self::Answered { step } => vec![step.as_str()],
            Self::All { all: list } | Self::Any { any: list } => {
                list.iter().flat_map(Predicate::references).collect()
            }
        }
    }
}

fn choice<'a>(answers: &'a AnswerStore, step: &str) -> Option<&'a str> {
    match answers.get(step) {
        Some(Answer::Choice(c)) => Some(c.as_str()),
        _ => None,
    }
}

fn numeric(answers: &AnswerStore, step: &str) -> Option<f64> {
    match answers.get(step)? {
        Answer::Number(n) => Some(*n),
        Answer::Height(h) => to_metric_height(h).ok(),
        Answer::Weight(w) => to_metric_weight(w).ok(),
        Answer::Choice(_) | Answer::Choices(_) => None,
    }
}
