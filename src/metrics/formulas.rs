//! Pure body-metric formulas. Inputs are metric (kg, cm, years).

use serde::{Deserialize, Serialize};

use super::{ActivityLevel, Sex};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BmiCategory {
    Underweight,
    Normal,
    Overweight,
    Obesity,
}

impl BmiCategory {
    pub fn from_bmi(bmi: f64) -> Self {
        if bmi < 18.5 {
            Self::Underweight
        } else if bmi < 25.0 {
            Self::Normal
        } else if bmi < 30.0 {
            Self::Overweight
        } else {
            Self::Obesity
        }
    }
}

impl std::fmt::Display for BmiCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Underweight => "Underweight",
            Self::Normal => "Normal",
            Self::Overweight => "Overweight",
            Self::Obesity => "Obesity",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bmi {
    pub value: f64,
    pub category: BmiCategory,
}

impl Bmi {
    /// BMI rounded to one decimal, as shown to the user.
    pub fn rounded(&self) -> f64 {
        (self.value * 10.0).round() / 10.0
    }
}

/// BMI = kg / m².
pub fn bmi(weight_kg: f64, height_cm: f64) -> Bmi {
    let height_m = height_cm / 100.0;
    let value = weight_kg / (height_m * height_m);
    Bmi {
        value,
        category: BmiCategory::from_bmi(value),
    }
}

/// Basal metabolic rate (kcal/day), Mifflin-St Jeor.
///
/// `10·kg + 6.25·cm − 5·age + 5` for male; `− 161` instead of `+ 5` for
/// female and every other category.
pub fn bmr(weight_kg: f64, height_cm: f64, age_years: f64, sex: Sex) -> f64 {
    let base = 10.0 * weight_kg + 6.25 * height_cm - 5.0 * age_years;
    match sex {
        Sex::Male => base + 5.0,
        Sex::Female | Sex::Other => base - 161.0,
    }
}

/// Daily maintenance calories: BMR scaled by activity.
pub fn maintenance_calories(bmr: f64, activity: ActivityLevel) -> f64 {
    bmr * activity.multiplier()
}

/// Kilograms still to lose; never negative.
pub fn weight_delta(current_kg: f64, goal_kg: f64) -> f64 {
    (current_kg - goal_kg).max(0.0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Macro {
    Carbs,
    Fat,
    Protein,
}

/// Fixed macro policy: (macro, share of calories, kcal per gram).
pub const MACRO_POLICY: [(Macro, f64, f64); 3] = [
    (Macro::Carbs, 0.50, 4.0),
    (Macro::Fat, 0.30, 9.0),
    (Macro::Protein, 0.20, 4.0),
];

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MacroShare {
    pub percent: f64,
    pub kcal: f64,
    pub grams: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MacroSplit {
    pub carbs: MacroShare,
    pub fat: MacroShare,
    pub protein: MacroShare,
}

/// Apply `MACRO_POLICY` to a calorie budget.
pub fn macro_split(kcal: f64) -> MacroSplit {
    let share = |which: Macro| {
        let (_, ratio, kcal_per_gram) = MACRO_POLICY
            .iter()
            .copied()
            .find(|(m, _, _)| *m == which)
            .unwrap_or((which, 0.0, 1.0));
        MacroShare {
            percent: ratio * 100.0,
            kcal: kcal * ratio,
            grams: kcal * ratio / kcal_per_gram,
        }
    };
    MacroSplit {
        carbs: share(Macro::Carbs),
        fat: share(Macro::Fat),
        protein: share(Macro::Protein),
    }
}
