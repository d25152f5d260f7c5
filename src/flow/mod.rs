//! Wizard flow engine: step registry, conditional navigation, answer
//! validation, auto-advance timers and the session that ties them together.

pub mod answers;
pub mod catalog;
pub mod host;
pub mod kinds;
pub mod manager;
pub mod navigation;
pub mod predicate;
pub mod registry;
pub mod session;
pub mod step;
pub mod timer;

pub use answers::{Answer, AnswerStore};
pub use host::{CompletionHandler, FixedUnits, Headless, Presenter, UnitPreference};
pub use kinds::AdvancePolicy;
pub use manager::{Collaborators, WizardManager};
pub use navigation::{NavigationController, NavigationState, Position};
pub use predicate::Predicate;
pub use registry::{RegistryFile, StepRegistry};
pub use session::{SessionSnapshot, StepView, Transition, WizardSession};
pub use step::{ChoiceOption, Quantity, StepDefinition, StepKind};
pub use timer::{AutoAdvanceConfig, AutoAdvanceCounter, TimerEvent, TimerTicket};
