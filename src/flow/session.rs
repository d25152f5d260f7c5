//! Wizard session: the engine's public contract over one registry.
//!
//! Every mutating call leaves answers, position and derived values
//! consistent before it returns. The session is single-caller and does no
//! locking itself; `WizardManager` wraps it for async hosts.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::answers::{Answer, AnswerStore};
use super::kinds::AdvancePolicy;
use super::navigation::{NavigationController, NavigationState, Position};
use super::registry::{StepRegistry, step_visible};
use super::step::{StepDefinition, StepKind};
use super::timer::{AutoAdvanceConfig, TimerTicket};
use crate::error::WizardError;
use crate::metrics::{self, DerivedSnapshot};
use crate::units::UnitSystem;

/// What a navigation call did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// Nothing moved.
    Stayed,
    /// A step became current.
    Entered { index: usize, step_id: String },
    /// Moved past the last visible step.
    Completed,
    /// Moved back before the first step; the host should leave the wizard.
    Exited,
}

impl Transition {
    pub fn moved(&self) -> bool {
        !matches!(self, Self::Stayed)
    }
}

/// Persistable state of a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    /// Identifies one run through the flow; a restart gets a new id.
    #[serde(default = "Uuid::new_v4")]
    pub session_id: Uuid,
    pub flow_id: String,
    pub answers: AnswerStore,
    pub navigation: NavigationState,
    #[serde(default)]
    pub unit_system: UnitSystem,
    pub saved_at: DateTime<Utc>,
}

/// Everything a presenter needs to draw the current state.
#[derive(Debug, Clone, PartialEq)]
pub struct StepView {
    pub flow_id: String,
    pub position: Position,
    pub step: Option<StepDefinition>,
    /// Stored answer for the current step, if any.
    pub answer: Option<Answer>,
    /// 1-based position among visible steps.
    pub visible_position: Option<usize>,
    pub visible_total: usize,
    pub progress: f64,
    pub derived: DerivedSnapshot,
    pub unit_system: UnitSystem,
    pub timer: Option<TimerTicket>,
    /// Filled in by the manager while an auto-advance timer runs.
    pub timer_percent: Option<u8>,
    pub complete: bool,
}

#[derive(Debug, Clone)]
pub struct WizardSession {
    id: Uuid,
    registry: Arc<StepRegistry>,
    answers: AnswerStore,
    navigation: NavigationState,
    derived: DerivedSnapshot,
    unit_system: UnitSystem,
    /// Bumped on every position change; stale timer tickets are ignored.
    generation: u64,
    /// Highest progress shown since the last backward move.
    progress_floor: f64,
}

impl WizardSession {
    pub fn new(registry: Arc<StepRegistry>) -> Self {
        let answers = AnswerStore::new();
        let derived = DerivedSnapshot::compute(&answers);
        Self {
            id: Uuid::new_v4(),
            registry,
            answers,
            navigation: NavigationState::default(),
            derived,
            unit_system: UnitSystem::default(),
            generation: 0,
            progress_floor: 0.0,
        }
    }

    /// Rebuild a session from a persisted snapshot.
    pub fn restore(
        registry: Arc<StepRegistry>,
        snapshot: SessionSnapshot,
    ) -> Result<Self, WizardError> {
        if snapshot.flow_id != registry.flow_id() {
            return Err(WizardError::SnapshotMismatch {
                expected: registry.flow_id().to_string(),
                found: snapshot.flow_id,
            });
        }
        if let Some(index) = snapshot.navigation.position.index() {
            registry.step_at(index)?;
        }
        let derived = DerivedSnapshot::compute(&snapshot.answers);
        info!(
            session_id = %snapshot.session_id,
            flow = %snapshot.flow_id,
            position = %snapshot.navigation.position,
            answers = snapshot.answers.len(),
            "Session restored"
        );
        Ok(Self {
            id: snapshot.session_id,
            registry,
            answers: snapshot.answers,
            navigation: snapshot.navigation,
            derived,
            unit_system: snapshot.unit_system,
            generation: 0,
            progress_floor: 0.0,
        })
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            session_id: self.id,
            flow_id: self.registry.flow_id().to_string(),
            answers: self.answers.clone(),
            navigation: self.navigation.clone(),
            unit_system: self.unit_system,
            saved_at: Utc::now(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn registry(&self) -> &StepRegistry {
        &self.registry
    }

    pub fn flow_id(&self) -> &str {
        self.registry.flow_id()
    }

    pub fn position(&self) -> Position {
        self.navigation.position
    }

    pub fn history(&self) -> &[usize] {
        &self.navigation.history
    }

    pub fn answers(&self) -> &AnswerStore {
        &self.answers
    }

    pub fn unit_system(&self) -> UnitSystem {
        self.unit_system
    }

    pub fn set_unit_system(&mut self, unit_system: UnitSystem) {
        self.unit_system = unit_system;
    }

    pub fn current_step(&self) -> Option<&StepDefinition> {
        let index = self.navigation.position.index()?;
        self.registry.steps().get(index)
    }

    pub fn is_complete(&self) -> bool {
        self.navigation.position == Position::AfterLast
    }

    pub fn derived_snapshot(&self) -> &DerivedSnapshot {
        &self.derived
    }

    /// (1-based visible position, visible total) of the current step.
    pub fn visible_position(&self) -> (Option<usize>, usize) {
        let nav = NavigationController::new(&self.registry);
        let visible = nav.visible_indices(&self.answers).len();
        match self.navigation.position {
            Position::AtStep(index) => {
                let current_hidden = self
                    .current_step()
                    .is_some_and(|step| !step_visible(step, &self.answers));
                let total = visible + usize::from(current_hidden);
                (Some(nav.visible_rank(index, &self.answers)), total)
            }
            Position::BeforeFirst | Position::AfterLast => (None, visible),
        }
    }

    /// Fraction of the effective (visible) path covered, in [0, 1].
    ///
    /// Never drops while moving forward, even when an answer reveals several
    /// steps at once.
    pub fn progress_fraction(&self) -> f64 {
        self.path_fraction().max(self.progress_floor)
    }

    fn path_fraction(&self) -> f64 {
        match self.navigation.position {
            Position::BeforeFirst => 0.0,
            Position::AfterLast => 1.0,
            Position::AtStep(_) => match self.visible_position() {
                (Some(rank), total) if total > 0 => (rank as f64 / total as f64).clamp(0.0, 1.0),
                _ => 0.0,
            },
        }
    }

    /// Enter the first visible step. No-op once started.
    pub fn start(&mut self) -> Transition {
        if self.navigation.position != Position::BeforeFirst {
            return Transition::Stayed;
        }
        self.move_forward()
    }

    /// Store an answer. A select-to-advance choice on the current step also
    /// moves on. Steps hidden by the current answers only accept an answer
    /// while they are current.
    pub fn submit_answer(
        &mut self,
        step_id: &str,
        answer: Answer,
    ) -> Result<Transition, WizardError> {
        let step = self
            .registry
            .get(step_id)
            .ok_or_else(|| WizardError::UnknownStep {
                step_id: step_id.to_string(),
            })?;
        let advance_on_select = step.kind.advance_policy() == AdvancePolicy::OnSelect;
        let is_current = self.current_step().is_some_and(|s| s.id == step_id);
        if !is_current && !step_visible(step, &self.answers) {
            return Err(WizardError::StepHidden {
                step_id: step_id.to_string(),
            });
        }

        let total_before = self.visible_position().1;
        self.answers.submit(step, answer)?;
        if metrics::depends_on(step_id) {
            self.derived = DerivedSnapshot::compute(&self.answers);
        }

        if is_current && advance_on_select {
            return Ok(self.move_forward());
        }
        self.follow_path_change(total_before);
        Ok(Transition::Stayed)
    }

    /// Add-or-remove a choice on a multi-choice step. Returns whether the
    /// choice is now selected.
    pub fn toggle_choice(&mut self, step_id: &str, choice_id: &str) -> Result<bool, WizardError> {
        let step = self
            .registry
            .get(step_id)
            .ok_or_else(|| WizardError::UnknownStep {
                step_id: step_id.to_string(),
            })?;
        let is_current = self.current_step().is_some_and(|s| s.id == step_id);
        if !is_current && !step_visible(step, &self.answers) {
            return Err(WizardError::StepHidden {
                step_id: step_id.to_string(),
            });
        }
        let total_before = self.visible_position().1;
        let selected = self.answers.toggle_multi(step, choice_id)?;
        if metrics::depends_on(step_id) {
            self.derived = DerivedSnapshot::compute(&self.answers);
        }
        self.follow_path_change(total_before);
        Ok(selected)
    }

    /// User-issued "Next". Blocked on a required, unanswered step.
    pub fn go_next(&mut self) -> Result<Transition, WizardError> {
        match self.navigation.position {
            Position::AfterLast => Ok(Transition::Stayed),
            Position::BeforeFirst => Ok(self.move_forward()),
            Position::AtStep(index) => {
                let step = self.registry.step_at(index)?;
                if step.is_required() && !self.answers.is_answered(step) {
                    warn!(step_id = %step.id, "Next blocked: answer required");
                    return Err(WizardError::AnswerRequired {
                        step_id: step.id.clone(),
                    });
                }
                Ok(self.move_forward())
            }
        }
    }

    /// "Back". At the very start this is a no-op reported as `Exited`.
    pub fn go_back(&mut self) -> Transition {
        if self.navigation.position == Position::BeforeFirst {
            return Transition::Exited;
        }
        let nav = NavigationController::new(&self.registry);
        let target = nav.previous(self.navigation.position, &self.answers);
        self.navigation.retreat_to(target);
        let transition = self.enter(target);
        self.progress_floor = self.path_fraction();
        transition
    }

    /// Ticket for the auto-advance timer of the current step, if it has one.
    pub fn timer_ticket(&self) -> Option<TimerTicket> {
        self.timer_config().map(|_| TimerTicket(self.generation))
    }

    pub fn timer_config(&self) -> Option<AutoAdvanceConfig> {
        match self.current_step()?.kind {
            StepKind::AutoAdvance { timer } => Some(timer),
            _ => None,
        }
    }

    /// Timer-issued "Next". Never gated; ignored unless `ticket` belongs to
    /// the current step.
    pub fn auto_advance(&mut self, ticket: TimerTicket) -> Transition {
        if self.timer_ticket() != Some(ticket) {
            debug!(ticket = %ticket, generation = self.generation, "Ignoring stale timer");
            return Transition::Stayed;
        }
        self.move_forward()
    }

    pub fn view(&self) -> StepView {
        let (visible_position, visible_total) = self.visible_position();
        let step = self.current_step().cloned();
        let answer = step
            .as_ref()
            .and_then(|s| self.answers.get(&s.id))
            .cloned();
        StepView {
            flow_id: self.registry.flow_id().to_string(),
            position: self.navigation.position,
            step,
            answer,
            visible_position,
            visible_total,
            progress: self.progress_fraction(),
            derived: self.derived.clone(),
            unit_system: self.unit_system,
            timer: self.timer_ticket(),
            timer_percent: None,
            complete: self.is_complete(),
        }
    }

    /// An answer that stays put but reshapes the visible path drops the
    /// floor, so the bar shows the new path right away.
    fn follow_path_change(&mut self, total_before: usize) {
        if self.visible_position().1 != total_before {
            self.progress_floor = self.path_fraction();
        }
    }

    fn move_forward(&mut self) -> Transition {
        let nav = NavigationController::new(&self.registry);
        let target = nav.next(self.navigation.position, &self.answers);
        self.navigation.advance_to(target);
        let transition = self.enter(target);
        self.progress_floor = self.progress_fraction();
        transition
    }

    fn enter(&mut self, target: Position) -> Transition {
        self.generation += 1;
        match target {
            Position::AtStep(index) => {
                let step_id = self.registry.steps()[index].id.clone();
                info!(flow = %self.registry.flow_id(), step_id = %step_id, index, "Entered step");
                Transition::Entered { index, step_id }
            }
            Position::AfterLast => {
                info!(flow = %self.registry.flow_id(), answers = self.answers.len(), "Flow complete");
                Transition::Completed
            }
            Position::BeforeFirst => {
                info!(flow = %self.registry.flow_id(), "Left the flow from the first step");
                Transition::Exited
            }
        }
    }
}
