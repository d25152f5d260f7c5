//! Derived metrics: BMI, BMR, macro split, maintenance calories and weight
//! delta, computed from the answer store.
//!
//! A metric whose inputs are not all answered is `NotYetComputable`; nothing
//! defaults to zero.

pub mod formulas;

use serde::{Deserialize, Serialize};

use crate::error::MetricsError;
use crate::flow::AnswerStore;
use crate::units::{to_metric_height, to_metric_weight};

pub use formulas::{Bmi, BmiCategory, Macro, MacroShare, MacroSplit, MACRO_POLICY};

/// Canonical answer keys the calculator reads. Every flow uses these ids.
pub mod keys {
    pub const GENDER: &str = "gender";
    pub const AGE: &str = "age";
    pub const HEIGHT: &str = "height";
    pub const WEIGHT_CURRENT: &str = "weight_current";
    pub const WEIGHT_GOAL: &str = "weight_goal";
    pub const ACTIVITY_LEVEL: &str = "activity_level";
    pub const GOAL: &str = "goal";

    /// Steps whose answers feed a derived metric.
    pub const INPUTS: [&str; 6] = [GENDER, AGE, HEIGHT, WEIGHT_CURRENT, WEIGHT_GOAL, ACTIVITY_LEVEL];
}

/// Whether an answer to `step_id` can change the derived snapshot.
pub fn depends_on(step_id: &str) -> bool {
    keys::INPUTS.contains(&step_id)
}

/// Which metric a summary step shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    Bmi,
    Bmr,
    Macros,
    MaintenanceCalories,
    WeightDelta,
}

/// Biological-sex category for BMR.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sex {
    Male,
    Female,
    Other,
}

impl Sex {
    pub fn from_choice(id: &str) -> Self {
        match id {
            "male" => Self::Male,
            "female" => Self::Female,
            _ => Self::Other,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityLevel {
    Sedentary,
    Light,
    Moderate,
    Active,
    VeryActive,
}

impl ActivityLevel {
    pub fn from_choice(id: &str) -> Option<Self> {
        match id {
            "sedentary" => Some(Self::Sedentary),
            "light" => Some(Self::Light),
            "moderate" => Some(Self::Moderate),
            "active" => Some(Self::Active),
            "very_active" => Some(Self::VeryActive),
            _ => None,
        }
    }

    pub fn multiplier(self) -> f64 {
        match self {
            Self::Sedentary => 1.2,
            Self::Light => 1.375,
            Self::Moderate => 1.55,
            Self::Active => 1.725,
            Self::VeryActive => 1.9,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightDelta {
    pub kilograms: f64,
    pub pounds: f64,
}

pub type Derived<T> = Result<T, MetricsError>;

/// Everything derivable from the current answers. Never persisted on its own.
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedSnapshot {
    pub bmi: Derived<Bmi>,
    pub bmr: Derived<f64>,
    pub macros: Derived<MacroSplit>,
    pub maintenance_calories: Derived<f64>,
    pub weight_delta: Derived<WeightDelta>,
}

impl DerivedSnapshot {
    /// Recompute from scratch. Idempotent and side-effect free.
    pub fn compute(answers: &AnswerStore) -> Self {
        let bmr = compute_bmr(answers);
        let macros = bmr.clone().map(formulas::macro_split);
        let maintenance_calories = compute_maintenance(answers, &bmr);
        Self {
            bmi: compute_bmi(answers),
            bmr,
            macros,
            maintenance_calories,
            weight_delta: compute_weight_delta(answers),
        }
    }

    pub fn is_ready(&self, kind: MetricKind) -> bool {
        match kind {
            MetricKind::Bmi => self.bmi.is_ok(),
            MetricKind::Bmr => self.bmr.is_ok(),
            MetricKind::Macros => self.macros.is_ok(),
            MetricKind::MaintenanceCalories => self.maintenance_calories.is_ok(),
            MetricKind::WeightDelta => self.weight_delta.is_ok(),
        }
    }
}

/// Reads metric inputs and records which ones are missing.
struct Inputs<'a> {
    answers: &'a AnswerStore,
    missing: Vec<&'static str>,
}

impl<'a> Inputs<'a> {
    fn new(answers: &'a AnswerStore) -> Self {
        Self {
            answers,
            missing: Vec::new(),
        }
    }

    fn weight_kg(&mut self, key: &'static str) -> Result<Option<f64>, MetricsError> {
        let answers = self.answers;
        match answers.weight(key) {
            Some(w) => Ok(Some(to_metric_weight(w)?)),
            None => {
                self.missing.push(key);
                Ok(None)
            }
        }
    }

    fn height_cm(&mut self) -> Result<Option<f64>, MetricsError> {
        let answers = self.answers;
        let cm = match answers.height(keys::HEIGHT) {
            Some(h) => Some(to_metric_height(h)?).filter(|cm| *cm > 0.0),
            None => None,
        };
        if cm.is_none() {
            self.missing.push(keys::HEIGHT);
        }
        Ok(cm)
    }

    fn age(&mut self) -> Option<f64> {
        let age = self.answers.number(keys::AGE);
        if age.is_none() {
            self.missing.push(keys::AGE);
        }
        age
    }

    fn sex(&mut self) -> Option<Sex> {
        let sex = self.answers.choice(keys::GENDER).map(Sex::from_choice);
        if sex.is_none() {
            self.missing.push(keys::GENDER);
        }
        sex
    }

    fn activity(&mut self) -> Option<ActivityLevel> {
        let level = self
            .answers
            .choice(keys::ACTIVITY_LEVEL)
            .and_then(ActivityLevel::from_choice);
        if level.is_none() {
            self.missing.push(keys::ACTIVITY_LEVEL);
        }
        level
    }

    fn not_yet(self) -> MetricsError {
        MetricsError::NotYetComputable {
            missing: self.missing,
        }
    }
}

fn compute_bmi(answers: &AnswerStore) -> Derived<Bmi> {
    let mut inputs = Inputs::new(answers);
    let weight = inputs.weight_kg(keys::WEIGHT_CURRENT)?;
    let height = inputs.height_cm()?;
    match (weight, height) {
        (Some(w), Some(h)) => Ok(formulas::bmi(w, h)),
        _ => Err(inputs.not_yet()),
    }
}

fn compute_bmr(answers: &AnswerStore) -> Derived<f64> {
    let mut inputs = Inputs::new(answers);
    let weight = inputs.weight_kg(keys::WEIGHT_CURRENT)?;
    let height = inputs.height_cm()?;
    let age = inputs.age();
    let sex = inputs.sex();
    match (weight, height, age, sex) {
        (Some(w), Some(h), Some(a), Some(s)) => Ok(formulas::bmr(w, h, a, s)),
        _ => Err(inputs.not_yet()),
    }
}

fn compute_maintenance(answers: &AnswerStore, bmr: &Derived<f64>) -> Derived<f64> {
    let mut inputs = Inputs::new(answers);
    let activity = inputs.activity();
    match (bmr, activity) {
        (Ok(bmr), Some(level)) => Ok(formulas::maintenance_calories(*bmr, level)),
        (Err(MetricsError::NotYetComputable { missing }), _) => {
            let mut all = missing.clone();
            all.extend(inputs.missing);
            Err(MetricsError::NotYetComputable { missing: all })
        }
        (Err(e), _) => Err(e.clone()),
        (Ok(_), None) => Err(inputs.not_yet()),
    }
}

fn compute_weight_delta(answers: &AnswerStore) -> Derived<WeightDelta> {
    let mut inputs = Inputs::new(answers);
    let current = inputs.weight_kg(keys::WEIGHT_CURRENT)?;
    let goal = inputs.weight_kg(keys::WEIGHT_GOAL)?;
    match (current, goal) {
        (Some(c), Some(g)) => {
            let kilograms = formulas::weight_delta(c, g);
            Ok(WeightDelta {
                kilograms,
                pounds: kilograms / crate::units::convert::KG_PER_LB,
            })
        }
        _ => Err(inputs.not_yet()),
    }
}
