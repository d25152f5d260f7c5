//! WizardManager: async host for one `WizardSession`.
//!
//! Wires the session to its collaborators: progress is hydrated on start and
//! persisted after every mutation, the presenter gets a fresh view after every
//! state change, and auto-advance timers run on the tokio runtime with their
//! events fed back through a channel.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use tokio::sync::{Mutex, RwLock, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::answers::Answer;
use super::host::{CompletionHandler, FixedUnits, Headless, Presenter, UnitPreference};
use super::navigation::Position;
use super::registry::StepRegistry;
use super::session::{SessionSnapshot, StepView, Transition, WizardSession};
use super::timer::{AutoAdvanceConfig, AutoAdvanceHandle, TimerEvent, TimerTicket, spawn_auto_advance};
use crate::config::EngineConfig;
use crate::error::WizardError;
use crate::metrics::DerivedSnapshot;
use crate::profile::HealthProfile;
use crate::store::{self, ProgressStore};
use crate::units::UnitSystem;

/// Everything the manager talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub store: Arc<dyn ProgressStore>,
    pub presenter: Arc<dyn Presenter>,
    pub units: Arc<dyn UnitPreference>,
    pub completion: Arc<dyn CompletionHandler>,
}

impl Collaborators {
    /// Persist to `store`; no rendering, no completion hook, metric units.
    pub fn headless(store: Arc<dyn ProgressStore>) -> Self {
        Self {
            store,
            presenter: Arc::new(Headless),
            units: Arc::new(FixedUnits(UnitSystem::Metric)),
            completion: Arc::new(Headless),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimerPurpose {
    Splash,
    /// Carries the session's ticket for the step the timer was started on.
    Step(TimerTicket),
}

/// The running timer. Its handle ticket is unique for the manager's lifetime,
/// so events from a timer cancelled by navigation or `restart` never match.
struct ActiveTimer {
    purpose: TimerPurpose,
    handle: AutoAdvanceHandle,
    percent: u8,
}

pub struct WizardManager {
    registry: Arc<StepRegistry>,
    session: RwLock<WizardSession>,
    host: Collaborators,
    session_key: String,
    profile_key: String,
    splash: Option<AutoAdvanceConfig>,
    timer: Mutex<Option<ActiveTimer>>,
    timer_serial: AtomicU64,
    events: mpsc::UnboundedSender<TimerEvent>,
    event_loop: JoinHandle<()>,
    started: AtomicBool,
    completion_sent: AtomicBool,
}

impl WizardManager {
    /// Create a manager for `registry`. Must be called inside a tokio runtime.
    pub fn new(
        registry: Arc<StepRegistry>,
        host: Collaborators,
        config: &EngineConfig,
    ) -> Arc<Self> {
        let (events, rx) = mpsc::unbounded_channel();
        let flow_id = registry.flow_id().to_string();
        Arc::new_cyclic(|weak: &Weak<Self>| Self {
            session: RwLock::new(WizardSession::new(Arc::clone(&registry))),
            registry,
            host,
            session_key: store::session_key(&config.persist_key_prefix, &flow_id),
            profile_key: store::profile_key(&config.persist_key_prefix, &flow_id),
            splash: config.splash,
            timer: Mutex::new(None),
            timer_serial: AtomicU64::new(1),
            events,
            event_loop: tokio::spawn(run_timer_events(weak.clone(), rx)),
            started: AtomicBool::new(false),
            completion_sent: AtomicBool::new(false),
        })
    }

    pub fn flow_id(&self) -> &str {
        self.registry.flow_id()
    }

    pub fn session_key(&self) -> &str {
        &self.session_key
    }

    pub fn profile_key(&self) -> &str {
        &self.profile_key
    }

    /// The profile saved when this flow last completed, if any.
    pub async fn profile(&self) -> Option<HealthProfile> {
        match store::load_as(self.host.store.as_ref(), &self.profile_key).await {
            Ok(profile) => profile,
            Err(e) => {
                warn!(key = %self.profile_key, error = %e, "Failed to load persisted profile");
                None
            }
        }
    }

    /// Hydrate from the store and show the first screen. A restored session
    /// resumes where it left off; a fresh one runs the splash (if any) and
    /// then enters the first visible step.
    pub async fn start(&self) -> StepView {
        if self.started.swap(true, Ordering::SeqCst) {
            return self.view().await;
        }

        let units = self.host.units.unit_system().await;
        let view = {
            let mut session = self.session.write().await;
            if let Some(restored) = self.hydrate().await {
                *session = restored;
            }
            session.set_unit_system(units);
            if session.is_complete() {
                self.completion_sent.store(true, Ordering::SeqCst);
            }
            self.begin(&mut session).await;
            self.persist(&session).await;
            session.view()
        };
        self.publish(view).await
    }

    /// Drop persisted progress and start the flow over.
    pub async fn restart(&self) -> StepView {
        self.cancel_timer().await;
        for key in [&self.session_key, &self.profile_key] {
            if let Err(e) = self.host.store.delete(key).await {
                warn!(key = %key, error = %e, "Failed to clear persisted state");
            }
        }
        let units = self.host.units.unit_system().await;
        let view = {
            let mut session = self.session.write().await;
            *session = WizardSession::new(Arc::clone(&self.registry));
            session.set_unit_system(units);
            self.completion_sent.store(false, Ordering::SeqCst);
            self.started.store(true, Ordering::SeqCst);
            info!(flow = %self.registry.flow_id(), "Flow restarted");
            self.begin(&mut session).await;
            self.persist(&session).await;
            session.view()
        };
        self.publish(view).await
    }

    pub async fn submit_answer(
        &self,
        step_id: &str,
        answer: Answer,
    ) -> Result<Transition, WizardError> {
        self.apply(|session| session.submit_answer(step_id, answer))
            .await
    }

    pub async fn toggle_choice(&self, step_id: &str, choice_id: &str) -> Result<bool, WizardError> {
        self.apply(|session| session.toggle_choice(step_id, choice_id))
            .await
    }

    pub async fn go_next(&self) -> Result<Transition, WizardError> {
        self.apply(WizardSession::go_next).await
    }

    pub async fn go_back(&self) -> Transition {
        match self.apply(|session| Ok(session.go_back())).await {
            Ok(transition) => transition,
            Err(_) => Transition::Stayed,
        }
    }

    pub async fn set_unit_system(&self, unit_system: UnitSystem) {
        let _ = self
            .apply(|session| {
                session.set_unit_system(unit_system);
                Ok(())
            })
            .await;
    }

    /// Re-read the unit preference from the host.
    pub async fn refresh_units(&self) {
        let units = self.host.units.unit_system().await;
        self.set_unit_system(units).await;
    }

    pub async fn view(&self) -> StepView {
        let view = self.session.read().await.view();
        self.decorate(view).await
    }

    pub async fn is_complete(&self) -> bool {
        self.session.read().await.is_complete()
    }

    pub async fn position(&self) -> Position {
        self.session.read().await.position()
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        self.session.read().await.snapshot()
    }

    pub async fn derived_snapshot(&self) -> DerivedSnapshot {
        self.session.read().await.derived_snapshot().clone()
    }

    /// Stop timers and write the final state.
    pub async fn shutdown(&self) {
        self.cancel_timer().await;
        let session = self.session.read().await;
        self.persist(&session).await;
        self.event_loop.abort();
        info!(flow = %self.registry.flow_id(), position = %session.position(), "Wizard manager shut down");
    }

    /// Run a session mutation, then persist, restart timers and notify.
    async fn apply<T>(
        &self,
        op: impl FnOnce(&mut WizardSession) -> Result<T, WizardError>,
    ) -> Result<T, WizardError> {
        let (result, view, profile) = {
            let mut session = self.session.write().await;
            let before = (session.position(), session.timer_ticket());
            let result = op(&mut *session)?;
            if (session.position(), session.timer_ticket()) != before {
                self.sync_timer(&session).await;
            }
            self.persist(&session).await;

            let first_completion =
                session.is_complete() && !self.completion_sent.swap(true, Ordering::SeqCst);
            let profile = first_completion.then(|| HealthProfile::from_session(&session));
            (result, session.view(), profile)
        };

        if let Some(profile) = profile {
            self.complete(profile).await;
        }
        self.publish(view).await;
        Ok(result)
    }

    /// Leave `BeforeFirst`, through the splash when one is configured.
    async fn begin(&self, session: &mut WizardSession) {
        if session.position() != Position::BeforeFirst {
            self.sync_timer(session).await;
            return;
        }
        match self.splash {
            Some(config) => {
                let mut timer = self.timer.lock().await;
                *timer = Some(ActiveTimer {
                    purpose: TimerPurpose::Splash,
                    handle: spawn_auto_advance(config, self.next_timer_ticket(), self.events.clone()),
                    percent: 0,
                });
                debug!(flow = %self.registry.flow_id(), "Splash started");
            }
            None => {
                session.start();
                self.sync_timer(session).await;
            }
        }
    }

    async fn hydrate(&self) -> Option<WizardSession> {
        let snapshot =
            match store::load_as::<SessionSnapshot>(self.host.store.as_ref(), &self.session_key)
                .await
            {
                Ok(Some(snapshot)) => snapshot,
                Ok(None) => return None,
                Err(e) => {
                    warn!(key = %self.session_key, error = %e, "Failed to load persisted session");
                    return None;
                }
            };
        match WizardSession::restore(Arc::clone(&self.registry), snapshot) {
            Ok(session) => Some(session),
            Err(e) => {
                warn!(key = %self.session_key, error = %e, "Discarding persisted session");
                None
            }
        }
    }

    async fn persist(&self, session: &WizardSession) {
        match store::save_as(self.host.store.as_ref(), &self.session_key, &session.snapshot()).await
        {
            Ok(()) => debug!(key = %self.session_key, "Session persisted"),
            Err(e) => warn!(key = %self.session_key, error = %e, "Failed to persist session"),
        }
    }

    async fn complete(&self, profile: HealthProfile) {
        if let Err(e) = store::save_as(self.host.store.as_ref(), &self.profile_key, &profile).await {
            warn!(key = %self.profile_key, error = %e, "Failed to persist profile");
        }
        info!(
            flow = %profile.flow_id,
            answers = profile.answers.len(),
            "Flow completed, handing off profile"
        );
        if let Err(e) = self.host.completion.on_complete(&profile).await {
            warn!(error = %e, "Completion handler failed");
        }
    }

    /// Cancel whatever timer runs and start the current step's, if it has one.
    async fn sync_timer(&self, session: &WizardSession) {
        let mut timer = self.timer.lock().await;
        if let Some(old) = timer.take() {
            old.handle.cancel();
        }
        if let (Some(ticket), Some(config)) = (session.timer_ticket(), session.timer_config()) {
            *timer = Some(ActiveTimer {
                purpose: TimerPurpose::Step(ticket),
                handle: spawn_auto_advance(config, self.next_timer_ticket(), self.events.clone()),
                percent: 0,
            });
        }
    }

    fn next_timer_ticket(&self) -> TimerTicket {
        TimerTicket(self.timer_serial.fetch_add(1, Ordering::SeqCst))
    }

    async fn cancel_timer(&self) {
        if let Some(old) = self.timer.lock().await.take() {
            old.handle.cancel();
        }
    }

    async fn on_timer_event(&self, event: TimerEvent) {
        let finished = {
            let mut timer = self.timer.lock().await;
            let Some(active) = timer
                .as_mut()
                .filter(|active| active.handle.ticket() == event.ticket())
            else {
                debug!(ticket = %event.ticket(), "Dropping event from a cancelled timer");
                return;
            };
            match event {
                TimerEvent::Progress { percent, .. } => {
                    active.percent = percent;
                    None
                }
                TimerEvent::Finished { .. } => {
                    let purpose = active.purpose;
                    *timer = None;
                    Some(purpose)
                }
            }
        };

        match finished {
            None => {
                let view = self.view().await;
                self.host.presenter.render(&view).await;
            }
            Some(TimerPurpose::Splash) => {
                let _ = self.apply(|session| Ok(session.start())).await;
            }
            Some(TimerPurpose::Step(ticket)) => {
                let _ = self.apply(|session| Ok(session.auto_advance(ticket))).await;
            }
        }
    }

    async fn decorate(&self, mut view: StepView) -> StepView {
        view.timer_percent = self.timer.lock().await.as_ref().map(|t| t.percent);
        view
    }

    async fn publish(&self, view: StepView) -> StepView {
        let view = self.decorate(view).await;
        self.host.presenter.render(&view).await;
        view
    }
}

impl Drop for WizardManager {
    fn drop(&mut self) {
        self.event_loop.abort();
    }
}

async fn run_timer_events(manager: Weak<WizardManager>, mut rx: mpsc::UnboundedReceiver<TimerEvent>) {
    while let Some(event) = rx.recv().await {
        let Some(manager) = manager.upgrade() else {
            break;
        };
        manager.on_timer_event(event).await;
    }
}
