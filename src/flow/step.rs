//! Step definitions: the immutable, config-driven description of one screen
//! of a flow.

use serde::{Deserialize, Serialize};

use super::predicate::Predicate;
use super::timer::AutoAdvanceConfig;
use crate::metrics::MetricKind;

fn default_true() -> bool {
    true
}

fn default_min_selected() -> usize {
    1
}

/// One selectable choice of a choice step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChoiceOption {
    pub id: String,
    pub label: String,
}

impl ChoiceOption {
    pub fn new(id: &str, label: &str) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
        }
    }
}

/// Which physical quantity a unit-pair step collects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Quantity {
    Height,
    Weight,
}

/// The closed set of step kinds. Behaviour per kind lives in `kinds.rs`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StepKind {
    SingleChoice {
        options: Vec<ChoiceOption>,
        /// Selecting a choice submits and moves on (no "Next" button).
        #[serde(default = "default_true")]
        advance_on_select: bool,
    },
    MultiChoice {
        options: Vec<ChoiceOption>,
        /// Fewer selected choices than this counts as unanswered.
        #[serde(default = "default_min_selected")]
        min_selected: usize,
    },
    NumericInput {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        unit_label: Option<String>,
    },
    UnitPairInput {
        quantity: Quantity,
    },
    Informational,
    AutoAdvance {
        #[serde(default)]
        timer: AutoAdvanceConfig,
    },
    ComputedSummary {
        #[serde(default)]
        metrics: Vec<MetricKind>,
    },
}

/// A single step of a flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepDefinition {
    /// Unique, stable key; answers are stored under it.
    pub id: String,
    /// Host-provided copy. Opaque to the engine.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(flatten)]
    pub kind: StepKind,
    /// Absent means always visible.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visible_when: Option<Predicate>,
    #[serde(default = "default_true")]
    pub required: bool,
}

impl StepDefinition {
    pub fn new(id: &str, kind: StepKind) -> Self {
        Self {
            id: id.to_string(),
            title: None,
            kind,
            visible_when: None,
            required: true,
        }
    }

    pub fn with_title(mut self, title: &str) -> Self {
        self.title = Some(title.to_string());
        self
    }

    pub fn visible_when(mut self, predicate: Predicate) -> Self {
        self.visible_when = Some(predicate);
        self
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Whether forward navigation is blocked until this step is answered.
    ///
    /// Steps that take no answer are never required.
    pub fn is_required(&self) -> bool {
        self.required && self.kind.accepts_answer()
    }

    /// Options of a choice step; empty for every other kind.
    pub fn options(&self) -> &[ChoiceOption] {
        match &self.kind {
            StepKind::SingleChoice { options, .. } | StepKind::MultiChoice { options, .. } => {
                options
            }
            _ => &[],
        }
    }

    pub fn has_option(&self, choice_id: &str) -> bool {
        self.options().iter().any(|o| o.id == choice_id)
    }
}
