//! Navigation: resolves the next/previous visible step.
//!
//! Visibility is always re-evaluated live from the answer store. Forward and
//! backward moves consult the same predicates, so a step skipped going forward
//! is skipped going back as well.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::answers::AnswerStore;
use super::registry::{StepRegistry, step_visible};

/// Where the session stands in the full (unfiltered) step list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "index", rename_all = "snake_case")]
pub enum Position {
    BeforeFirst,
    AtStep(usize),
    AfterLast,
}

impl Position {
    pub fn index(self) -> Option<usize> {
        match self {
            Self::AtStep(i) => Some(i),
            Self::BeforeFirst | Self::AfterLast => None,
        }
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BeforeFirst => write!(f, "before_first"),
            Self::AtStep(i) => write!(f, "step {i}"),
            Self::AfterLast => write!(f, "after_last"),
        }
    }
}

/// Stateless navigation over one registry.
#[derive(Debug, Clone, Copy)]
pub struct NavigationController<'a> {
    registry: &'a StepRegistry,
}

impl<'a> NavigationController<'a> {
    pub fn new(registry: &'a StepRegistry) -> Self {
        Self { registry }
    }

    /// First visible step after `current`, or `AfterLast`.
    pub fn next(&self, current: Position, answers: &AnswerStore) -> Position {
        let start = match current {
            Position::BeforeFirst => 0,
            Position::AtStep(i) => i + 1,
            Position::AfterLast => return Position::AfterLast,
        };
        let steps = self.registry.steps();
        (start..steps.len())
            .find(|&i| self.visible(i, answers))
            .map_or(Position::AfterLast, Position::AtStep)
    }

    /// First visible step before `current`, or `BeforeFirst`.
    pub fn previous(&self, current: Position, answers: &AnswerStore) -> Position {
        let end = match current {
            Position::BeforeFirst => return Position::BeforeFirst,
            Position::AtStep(i) => i,
            Position::AfterLast => self.registry.len(),
        };
        (0..end)
            .rev()
            .find(|&i| self.visible(i, answers))
            .map_or(Position::BeforeFirst, Position::AtStep)
    }

    /// Indices of every currently visible step, in order.
    pub fn visible_indices(&self, answers: &AnswerStore) -> Vec<usize> {
        (0..self.registry.len())
            .filter(|&i| self.visible(i, answers))
            .collect()
    }

    /// 1-based position of `index` among the visible steps up to and
    /// including it. The step itself counts even if it has since become
    /// invisible, since the session never evicts the current step.
    pub fn visible_rank(&self, index: usize, answers: &AnswerStore) -> usize {
        (0..index).filter(|&i| self.visible(i, answers)).count() + 1
    }

    fn visible(&self, index: usize, answers: &AnswerStore) -> bool {
        let step = &self.registry.steps()[index];
        let visible = step_visible(step, answers);
        if !visible {
            debug!(step_id = %step.id, "Skipping hidden step");
        }
        visible
    }
}

/// Position plus the trail of visited indices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationState {
    pub position: Position,
    /// Indices visited on the way to the current step; the last entry is the
    /// current step.
    pub history: Vec<usize>,
}

impl Default for NavigationState {
    fn default() -> Self {
        Self {
            position: Position::BeforeFirst,
            history: Vec::new(),
        }
    }
}

impl NavigationState {
    /// Record a forward move.
    pub fn advance_to(&mut self, position: Position) {
        if let Position::AtStep(i) = position {
            self.history.push(i);
        }
        self.position = position;
    }

    /// Record a backward move. History past the target is dropped.
    pub fn retreat_to(&mut self, position: Position) {
        match position {
            Position::AtStep(target) => {
                self.history.retain(|&i| i < target);
                self.history.push(target);
            }
            Position::BeforeFirst => self.history.clear(),
            Position::AfterLast => {}
        }
        self.position = position;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::predicate::Predicate;
    use crate::flow::step::{ChoiceOption, StepDefinition, StepKind};
    use crate::flow::Answer;

    /// welcome, gender, pregnancy (female only), age, summary
    fn registry() -> StepRegistry {
        StepRegistry::new(
            "nav",
            vec![
                StepDefinition::new("welcome", StepKind::Informational),
                StepDefinition::new(
                    "gender",
                    StepKind::SingleChoice {
                        options: vec![
                            ChoiceOption::new("male", "Male"),
                            ChoiceOption::new("female", "Female"),
                        ],
                        advance_on_select: true,
                    },
                ),
                StepDefinition::new("pregnancy", StepKind::Informational)
                    .visible_when(Predicate::equals("gender", "female")),
                StepDefinition::new(
                    "age",
                    StepKind::NumericInput {
                        min: None,
                        max: None,
                        unit_label: None,
                    },
                ),
                StepDefinition::new("summary", StepKind::ComputedSummary { metrics: vec![] }),
            ],
        )
        .unwrap()
    }

    fn with_gender(g: &str) -> AnswerStore {
        let mut answers = AnswerStore::new();
        answers.insert_unchecked("gender", Answer::choice(g));
        answers
    }

    #[test]
    fn next_skips_hidden_step() {
        let registry = registry();
        let nav = NavigationController::new(&registry);
        let male = with_gender("male");
        assert_eq!(nav.next(Position::AtStep(1), &male), Position::AtStep(3));

        let female = with_gender("female");
        assert_eq!(nav.next(Position::AtStep(1), &female), Position::AtStep(2));
    }

    #[test]
    fn previous_mirrors_next() {
        let registry = registry();
        let nav = NavigationController::new(&registry);
        let male = with_gender("male");
        assert_eq!(nav.previous(Position::AtStep(3), &male), Position::AtStep(1));

        let female = with_gender("female");
        assert_eq!(nav.previous(Position::AtStep(3), &female), Position::AtStep(2));
    }

    #[test]
    fn unanswered_gate_is_hidden() {
        let registry = registry();
        let nav = NavigationController::new(&registry);
        let empty = AnswerStore::new();
        assert_eq!(nav.next(Position::AtStep(1), &empty), Position::AtStep(3));
    }

    #[test]
    fn boundaries() {
        let registry = registry();
        let nav = NavigationController::new(&registry);
        let empty = AnswerStore::new();
        assert_eq!(nav.next(Position::BeforeFirst, &empty), Position::AtStep(0));
        assert_eq!(nav.next(Position::AtStep(4), &empty), Position::AfterLast);
        assert_eq!(nav.next(Position::AfterLast, &empty), Position::AfterLast);
        assert_eq!(nav.previous(Position::AtStep(0), &empty), Position::BeforeFirst);
        assert_eq!(nav.previous(Position::BeforeFirst, &empty), Position::BeforeFirst);
        assert_eq!(nav.previous(Position::AfterLast, &empty), Position::AtStep(4));
    }

    #[test]
    fn visible_counts_follow_answers() {
        let registry = registry();
        let nav = NavigationController::new(&registry);
        assert_eq!(nav.visible_indices(&with_gender("male")), vec![0, 1, 3, 4]);
        assert_eq!(nav.visible_indices(&with_gender("female")).len(), 5);
        assert_eq!(nav.visible_rank(3, &with_gender("male")), 3);
        assert_eq!(nav.visible_rank(3, &with_gender("female")), 4);
    }

    #[test]
    fn history_tracks_moves() {
        let mut state = NavigationState::default();
        state.advance_to(Position::AtStep(0));
        state.advance_to(Position::AtStep(1));
        state.advance_to(Position::AtStep(3));
        state.retreat_to(Position::AtStep(1));
        assert_eq!(state.history, vec![0, 1]);
        assert_eq!(state.position, Position::AtStep(1));

        state.advance_to(Position::AfterLast);
        assert_eq!(state.history, vec![0, 1]);
        state.retreat_to(Position::BeforeFirst);
        assert!(state.history.is_empty());
    }
}
