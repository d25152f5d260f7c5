//! Unit handling: height/weight measurements, conversions, and lenient
//! parsing of user-typed values.

pub mod convert;
pub mod parse;

use serde::{Deserialize, Serialize};

pub use convert::{from_metric_height, from_metric_weight, to_metric_height, to_metric_weight};
pub use parse::{parse_height, parse_weight};

/// Which unit system the user prefers for labels and input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum UnitSystem {
    #[default]
    Metric,
    Imperial,
}

impl UnitSystem {
    pub fn height_unit(self) -> HeightUnit {
        match self {
            Self::Metric => HeightUnit::Centimeters,
            Self::Imperial => HeightUnit::FeetInches,
        }
    }

    pub fn weight_unit(self) -> WeightUnit {
        match self {
            Self::Metric => WeightUnit::Kilograms,
            Self::Imperial => WeightUnit::Pounds,
        }
    }
}

impl std::fmt::Display for UnitSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Metric => write!(f, "metric"),
            Self::Imperial => write!(f, "imperial"),
        }
    }
}

impl std::str::FromStr for UnitSystem {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "metric" | "si" => Ok(Self::Metric),
            "imperial" | "us" => Ok(Self::Imperial),
            other => Err(format!("unknown unit system '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeightUnit {
    Centimeters,
    FeetInches,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightUnit {
    Kilograms,
    Pounds,
}

/// A height as the user entered it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "unit", rename_all = "snake_case")]
pub enum Height {
    Centimeters { cm: f64 },
    FeetInches { feet: f64, inches: f64 },
}

impl Height {
    pub fn cm(cm: f64) -> Self {
        Self::Centimeters { cm }
    }

    pub fn feet_inches(feet: f64, inches: f64) -> Self {
        Self::FeetInches { feet, inches }
    }

    pub fn unit(&self) -> HeightUnit {
        match self {
            Self::Centimeters { .. } => HeightUnit::Centimeters,
            Self::FeetInches { .. } => HeightUnit::FeetInches,
        }
    }
}

impl std::fmt::Display for Height {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Centimeters { cm } => write!(f, "{cm} cm"),
            Self::FeetInches { feet, inches } => write!(f, "{feet} ft {inches} in"),
        }
    }
}

/// A weight as the user entered it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "unit", rename_all = "snake_case")]
pub enum Weight {
    Kilograms { kg: f64 },
    Pounds { lb: f64 },
}

impl Weight {
    pub fn kg(kg: f64) -> Self {
        Self::Kilograms { kg }
    }

    pub fn lb(lb: f64) -> Self {
        Self::Pounds { lb }
    }

    pub fn unit(&self) -> WeightUnit {
        match self {
            Self::Kilograms { .. } => WeightUnit::Kilograms,
            Self::Pounds { .. } => WeightUnit::Pounds,
        }
    }
}

impl std::fmt::Display for Weight {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Kilograms { kg } => write!(f, "{kg} kg"),
            Self::Pounds { lb } => write!(f, "{lb} lb"),
        }
    }
}
