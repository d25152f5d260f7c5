//! Collaborator traits the manager talks to. The host decides how views are
//! drawn, where the unit preference comes from and what happens after a flow
//! completes.

use async_trait::async_trait;

use super::session::StepView;
use crate::profile::HealthProfile;
use crate::units::UnitSystem;

/// Receives a fresh view after every state change.
///
/// `render` must not call back into the manager.
#[async_trait]
pub trait Presenter: Send + Sync {
    async fn render(&self, view: &StepView);
}

/// Supplies the user's chosen unit system.
#[async_trait]
pub trait UnitPreference: Send + Sync {
    async fn unit_system(&self) -> UnitSystem;
}

/// Invoked once when the flow completes.
#[async_trait]
pub trait CompletionHandler: Send + Sync {
    async fn on_complete(&self, profile: &HealthProfile) -> anyhow::Result<()>;
}

/// A unit preference that never changes.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedUnits(pub UnitSystem);

#[async_trait]
impl UnitPreference for FixedUnits {
    async fn unit_system(&self) -> UnitSystem {
        self.0
    }
}

/// Presenter and completion handler that do nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct Headless;

#[async_trait]
impl Presenter for Headless {
    async fn render(&self, _view: &StepView) {}
}

#[async_trait]
impl CompletionHandler for Headless {
    async fn on_complete(&self, _profile: &HealthProfile) -> anyhow::Result<()> {
        Ok(())
    }
}
