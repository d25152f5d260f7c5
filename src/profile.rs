//! Health profile handed off when a flow completes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::flow::{AnswerStore, WizardSession};
use crate::metrics::{ActivityLevel, Bmi, MacroSplit, keys};
use crate::units::{UnitSystem, Weight, from_metric_weight, to_metric_height, to_metric_weight};

/// Canonical answers plus the derived values computable at completion.
///
/// Stored as JSON under `<prefix>:<flow_id>:profile`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthProfile {
    pub session_id: Uuid,
    pub flow_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height_cm: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight_current_kg: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight_goal_kg: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activity_level: Option<ActivityLevel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goal: Option<String>,
    pub unit_system: UnitSystem,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bmi: Option<Bmi>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bmr: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maintenance_calories: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub macros: Option<MacroSplit>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight_to_lose_kg: Option<f64>,
    /// Every answer, including flow-specific ones.
    pub answers: AnswerStore,
    pub completed_at: DateTime<Utc>,
}

impl HealthProfile {
    pub fn from_session(session: &WizardSession) -> Self {
        let answers = session.answers();
        let derived = session.derived_snapshot();
        Self {
            session_id: session.id(),
            flow_id: session.flow_id().to_string(),
            gender: answers.choice(keys::GENDER).map(str::to_string),
            age: answers.number(keys::AGE),
            height_cm: answers
                .height(keys::HEIGHT)
                .and_then(|h| to_metric_height(h).ok()),
            weight_current_kg: metric_weight(answers, keys::WEIGHT_CURRENT),
            weight_goal_kg: metric_weight(answers, keys::WEIGHT_GOAL),
            activity_level: answers
                .choice(keys::ACTIVITY_LEVEL)
                .and_then(ActivityLevel::from_choice),
            goal: answers.choice(keys::GOAL).map(str::to_string),
            unit_system: session.unit_system(),
            bmi: derived.bmi.as_ref().ok().copied(),
            bmr: derived.bmr.as_ref().ok().copied(),
            maintenance_calories: derived.maintenance_calories.as_ref().ok().copied(),
            macros: derived.macros.as_ref().ok().copied(),
            weight_to_lose_kg: derived.weight_delta.as_ref().ok().map(|d| d.kilograms),
            answers: answers.clone(),
            completed_at: Utc::now(),
        }
    }

    /// Short human-readable summary in the profile's unit system.
    pub fn to_summary(&self) -> String {
        let mut parts = vec![format!("# Profile ({})", self.flow_id)];

        if let Some(ref gender) = self.gender {
            parts.push(format!("- Gender: {gender}"));
        }
        if let Some(age) = self.age {
            parts.push(format!("- Age: {age}"));
        }
        if let Some(kg) = self.weight_current_kg {
            parts.push(format!("- Weight: {}", self.display_weight(kg)));
        }
        if let Some(kg) = self.weight_goal_kg {
            parts.push(format!("- Goal weight: {}", self.display_weight(kg)));
        }
        if let Some(bmi) = self.bmi {
            parts.push(format!("- BMI: {} ({})", bmi.rounded(), bmi.category));
        }
        if let Some(bmr) = self.bmr {
            parts.push(format!("- BMR: {} kcal/day", bmr.round()));
        }
        if let Some(kcal) = self.maintenance_calories {
            parts.push(format!("- Maintenance: {} kcal/day", kcal.round()));
        }
        if let Some(kg) = self.weight_to_lose_kg.filter(|kg| *kg > 0.0) {
            parts.push(format!("- To lose: {}", self.display_weight(kg)));
        }

        parts.join("\n")
    }

    fn display_weight(&self, kg: f64) -> String {
        match from_metric_weight(kg, self.unit_system.weight_unit()) {
            Ok(Weight::Pounds { lb }) => format!("{lb:.1} lb"),
            Ok(Weight::Kilograms { kg }) => format!("{kg:.1} kg"),
            Err(_) => format!("{kg} kg"),
        }
    }
}

fn metric_weight(answers: &AnswerStore, key: &str) -> Option<f64> {
    answers.weight(key).and_then(|w| to_metric_weight(w).ok())
}
