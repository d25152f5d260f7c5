//! Per-kind behaviour: answer validation and how a step moves on.

use super::answers::Answer;
use super::step::{ChoiceOption, Quantity, StepKind};
use crate::error::WizardError;
use crate::units::{to_metric_height, to_metric_weight};

/// How a step leaves the screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvancePolicy {
    /// The user presses "Next"; may be gated on an answer.
    Manual,
    /// Selecting a choice submits and advances.
    OnSelect,
    /// The auto-advance timer moves on by itself.
    Timer,
}

impl StepKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::SingleChoice { .. } => "single_choice",
            Self::MultiChoice { .. } => "multi_choice",
            Self::NumericInput { .. } => "numeric_input",
            Self::UnitPairInput { .. } => "unit_pair_input",
            Self::Informational => "informational",
            Self::AutoAdvance { .. } => "auto_advance",
            Self::ComputedSummary { .. } => "computed_summary",
        }
    }

    /// Whether the kind collects an answer at all.
    pub fn accepts_answer(&self) -> bool {
        !matches!(
            self,
            Self::Informational | Self::AutoAdvance { .. } | Self::ComputedSummary { .. }
        )
    }

    pub fn expected_shape(&self) -> &'static str {
        match self {
            Self::SingleChoice { .. } => "a single choice",
            Self::MultiChoice { .. } => "a set of choices",
            Self::NumericInput { .. } => "a number",
            Self::UnitPairInput {
                quantity: Quantity::Height,
            } => "a height",
            Self::UnitPairInput {
                quantity: Quantity::Weight,
            } => "a weight",
            Self::Informational | Self::AutoAdvance { .. } | Self::ComputedSummary { .. } => {
                "no answer"
            }
        }
    }

    pub fn advance_policy(&self) -> AdvancePolicy {
        match self {
            Self::SingleChoice {
                advance_on_select: true,
                ..
            } => AdvancePolicy::OnSelect,
            Self::AutoAdvance { .. } => AdvancePolicy::Timer,
            _ => AdvancePolicy::Manual,
        }
    }

    /// Check that `answer` fits this kind.
    pub fn validate(&self, step_id: &str, answer: &Answer) -> Result<(), WizardError> {
        match self {
            Self::SingleChoice { options, .. } => validate_single(step_id, options, answer),
            Self::MultiChoice { options, .. } => validate_multi(step_id, options, answer),
            Self::NumericInput { min, max, .. } => validate_numeric(step_id, *min, *max, answer),
            Self::UnitPairInput { quantity } => validate_unit_pair(step_id, *quantity, answer),
            Self::Informational | Self::AutoAdvance { .. } | Self::ComputedSummary { .. } => {
                Err(shape_error(step_id, self.expected_shape(), answer))
            }
        }
    }
}

fn shape_error(step_id: &str, expected: &str, found: &Answer) -> WizardError {
    WizardError::InvalidAnswerShape {
        step_id: step_id.to_string(),
        expected: expected.to_string(),
        found: found.shape().to_string(),
    }
}

fn check_choice(step_id: &str, options: &[ChoiceOption], id: &str) -> Result<(), WizardError> {
    if options.iter().any(|o| o.id == id) {
        Ok(())
    } else {
        Err(WizardError::UnknownChoice {
            step_id: step_id.to_string(),
            choice_id: id.to_string(),
        })
    }
}

fn validate_single(
    step_id: &str,
    options: &[ChoiceOption],
    answer: &Answer,
) -> Result<(), WizardError> {
    match answer {
        Answer::Choice(id) => check_choice(step_id, options, id),
        other => Err(shape_error(step_id, "a single choice", other)),
    }
}

fn validate_multi(
    step_id: &str,
    options: &[ChoiceOption],
    answer: &Answer,
) -> Result<(), WizardError> {
    match answer {
        Answer::Choices(ids) => ids
            .iter()
            .try_for_each(|id| check_choice(step_id, options, id)),
        other => Err(shape_error(step_id, "a set of choices", other)),
    }
}

fn validate_numeric(
    step_id: &str,
    min: Option<f64>,
    max: Option<f64>,
    answer: &Answer,
) -> Result<(), WizardError> {
    let Answer::Number(value) = answer else {
        return Err(shape_error(step_id, "a number", answer));
    };
    if !value.is_finite() {
        return Err(WizardError::InvalidAnswerShape {
            step_id: step_id.to_string(),
            expected: "a finite number".to_string(),
            found: value.to_string(),
        });
    }
    let below = min.is_some_and(|m| *value < m);
    let above = max.is_some_and(|m| *value > m);
    if below || above {
        return Err(WizardError::AnswerOutOfBounds {
            step_id: step_id.to_string(),
            value: *value,
            min,
            max,
        });
    }
    Ok(())
}

fn validate_unit_pair(
    step_id: &str,
    quantity: Quantity,
    answer: &Answer,
) -> Result<(), WizardError> {
    let converted = match (quantity, answer) {
        (Quantity::Height, Answer::Height(h)) => to_metric_height(h),
        (Quantity::Weight, Answer::Weight(w)) => to_metric_weight(w),
        (Quantity::Height, other) => return Err(shape_error(step_id, "a height", other)),
        (Quantity::Weight, other) => return Err(shape_error(step_id, "a weight", other)),
    };
    match converted {
        Ok(_) => Ok(()),
        Err(e) => Err(WizardError::InvalidAnswerShape {
            step_id: step_id.to_string(),
            expected: format!("a non-negative, finite {}", answer.shape().trim_start_matches("a ")),
            found: e.to_string(),
        }),
    }
}
