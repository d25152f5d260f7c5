//! Answer store: step id → answer value.
//!
//! Entries exist only for steps that were actively answered. Back navigation
//! never removes an entry, so returning forward restores the previous answer.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::step::{StepDefinition, StepKind};
use crate::error::WizardError;
use crate::units::{Height, Weight};

/// A stored answer. The shape must match the step kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Answer {
    Choice(String),
    Choices(BTreeSet<String>),
    Number(f64),
    Height(Height),
    Weight(Weight),
}

impl Answer {
    pub fn choice(id: &str) -> Self {
        Self::Choice(id.to_string())
    }

    pub fn choices<'a>(ids: impl IntoIterator<Item = &'a str>) -> Self {
        Self::Choices(ids.into_iter().map(String::from).collect())
    }

    /// Human-readable shape name, used in `InvalidAnswerShape`.
    pub fn shape(&self) -> &'static str {
        match self {
            Self::Choice(_) => "a single choice",
            Self::Choices(_) => "a set of choices",
            Self::Number(_) => "a number",
            Self::Height(_) => "a height",
            Self::Weight(_) => "a weight",
        }
    }
}

impl std::fmt::Display for Answer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Choice(c) => write!(f, "{c}"),
            Self::Choices(set) => {
                let ids: Vec<&str> = set.iter().map(String::as_str).collect();
                write!(f, "{}", ids.join(", "))
            }
            Self::Number(n) => write!(f, "{n}"),
            Self::Height(h) => write!(f, "{h}"),
            Self::Weight(w) => write!(f, "{w}"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnswerStore {
    answers: BTreeMap<String, Answer>,
}

impl AnswerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate `value` against the step kind and store it.
    ///
    /// On error the store is left untouched.
    pub fn submit(&mut self, step: &StepDefinition, value: Answer) -> Result<(), WizardError> {
        if let Err(e) = step.kind.validate(&step.id, &value) {
            warn!(step_id = %step.id, error = %e, "Rejected answer");
            return Err(e);
        }
        debug!(step_id = %step.id, answer = %value, "Answer stored");
        self.answers.insert(step.id.clone(), value);
        Ok(())
    }

    /// Add-or-remove a choice on a multi-choice step. Returns whether the
    /// choice is selected afterwards.
    pub fn toggle_multi(
        &mut self,
        step: &StepDefinition,
        choice_id: &str,
    ) -> Result<bool, WizardError> {
        if !matches!(step.kind, StepKind::MultiChoice { .. }) {
            return Err(WizardError::NotToggleable {
                step_id: step.id.clone(),
            });
        }
        if !step.has_option(choice_id) {
            return Err(WizardError::UnknownChoice {
                step_id: step.id.clone(),
                choice_id: choice_id.to_string(),
            });
        }

        // A malformed entry (e.g. from an old snapshot) is replaced.
        let mut set = match self.answers.remove(&step.id) {
            Some(Answer::Choices(set)) => set,
            _ => BTreeSet::new(),
        };

        let selected = if set.remove(choice_id) {
            false
        } else {
            set.insert(choice_id.to_string());
            true
        };
        self.answers.insert(step.id.clone(), Answer::Choices(set));
        debug!(step_id = %step.id, choice_id, selected, "Choice toggled");
        Ok(selected)
    }

    pub fn get(&self, step_id: &str) -> Option<&Answer> {
        self.answers.get(step_id)
    }

    /// Whether the step has an answer that satisfies it.
    ///
    /// A multi-choice selection smaller than `min_selected` does not count.
    pub fn is_answered(&self, step: &StepDefinition) -> bool {
        match (self.answers.get(&step.id), &step.kind) {
            (None, _) => false,
            (Some(Answer::Choices(set)), StepKind::MultiChoice { min_selected, .. }) => {
                set.len() >= (*min_selected).max(1)
            }
            (Some(_), _) => true,
        }
    }

    pub fn choice(&self, step_id: &str) -> Option<&str> {
        match self.answers.get(step_id) {
            Some(Answer::Choice(c)) => Some(c),
            _ => None,
        }
    }

    pub fn number(&self, step_id: &str) -> Option<f64> {
        match self.answers.get(step_id) {
            Some(Answer::Number(n)) => Some(*n),
            _ => None,
        }
    }

    pub fn height(&self, step_id: &str) -> Option<&Height> {
        match self.answers.get(step_id) {
            Some(Answer::Height(h)) => Some(h),
            _ => None,
        }
    }

    pub fn weight(&self, step_id: &str) -> Option<&Weight> {
        match self.answers.get(step_id) {
            Some(Answer::Weight(w)) => Some(w),
            _ => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Answer)> {
        self.answers.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.answers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }

    #[cfg(test)]
    pub(crate) fn insert_unchecked(&mut self, step_id: &str, answer: Answer) {
        self.answers.insert(step_id.to_string(), answer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::step::{ChoiceOption, Quantity};

    fn goals_step() -> StepDefinition {
        StepDefinition::new(
            "goals",
            StepKind::MultiChoice {
                options: vec![
                    ChoiceOption::new("sleep", "Sleep better"),
                    ChoiceOption::new("energy", "More energy"),
                ],
                min_selected: 1,
            },
        )
    }

    fn gender_step() -> StepDefinition {
        StepDefinition::new(
            "gender",
            StepKind::SingleChoice {
                options: vec![
                    ChoiceOption::new("male", "Male"),
                    ChoiceOption::new("female", "Female"),
                ],
                advance_on_select: true,
            },
        )
    }

    #[test]
    fn submit_stores_valid_answer() {
        let mut store = AnswerStore::new();
        store.submit(&gender_step(), Answer::choice("female")).unwrap();
        assert_eq!(store.choice("gender"), Some("female"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn wrong_shape_leaves_store_untouched() {
        let mut store = AnswerStore::new();
        store.submit(&gender_step(), Answer::choice("male")).unwrap();

        let err = store
            .submit(&gender_step(), Answer::Number(1.0))
            .unwrap_err();
        assert!(matches!(err, WizardError::InvalidAnswerShape { .. }));
        assert_eq!(store.choice("gender"), Some("male"));
    }

    #[test]
    fn toggle_adds_then_removes() {
        let mut store = AnswerStore::new();
        let step = goals_step();

        assert!(store.toggle_multi(&step, "sleep").unwrap());
        assert!(store.toggle_multi(&step, "energy").unwrap());
        assert!(!store.toggle_multi(&step, "sleep").unwrap());
        assert_eq!(store.get("goals"), Some(&Answer::choices(["energy"])));
    }

    #[test]
    fn toggle_rejects_unknown_choice_and_wrong_kind() {
        let mut store = AnswerStore::new();
        assert!(matches!(
            store.toggle_multi(&goals_step(), "flying"),
            Err(WizardError::UnknownChoice { .. })
        ));
        assert!(matches!(
            store.toggle_multi(&gender_step(), "male"),
            Err(WizardError::NotToggleable { .. })
        ));
        assert!(store.is_empty());
    }

    #[test]
    fn emptied_multi_choice_is_unanswered() {
        let mut store = AnswerStore::new();
        let step = goals_step();
        store.toggle_multi(&step, "sleep").unwrap();
        assert!(store.is_answered(&step));
        store.toggle_multi(&step, "sleep").unwrap();
        assert!(!store.is_answered(&step));
        // The entry itself stays; only its content changed.
        assert!(store.get("goals").is_some());
    }

    #[test]
    fn measurement_accessors() {
        let mut store = AnswerStore::new();
        let height = StepDefinition::new(
            "height",
            StepKind::UnitPairInput {
                quantity: Quantity::Height,
            },
        );
        store.submit(&height, Answer::Height(Height::cm(180.0))).unwrap();
        assert_eq!(store.height("height"), Some(&Height::cm(180.0)));
        assert!(store.weight("height").is_none());
    }

    #[test]
    fn serde_roundtrip_keeps_shapes() {
        let mut store = AnswerStore::new();
        store.insert_unchecked("goals", Answer::choices(["sleep"]));
        store.insert_unchecked("age", Answer::Number(31.0));

        let json = serde_json::to_value(&store).unwrap();
        assert_eq!(json["age"], serde_json::json!({"type": "number", "value": 31.0}));
        let parsed: AnswerStore = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, store);
    }
}
