//! Pure height/weight conversions. Everything downstream works in
//! centimeters and kilograms.

use super::{Height, HeightUnit, Weight, WeightUnit};
use crate::error::UnitError;

pub const CM_PER_INCH: f64 = 2.54;
pub const INCHES_PER_FOOT: f64 = 12.0;
pub const KG_PER_LB: f64 = 0.453_592_37;

fn check(quantity: &'static str, value: f64) -> Result<f64, UnitError> {
    if !value.is_finite() {
        return Err(UnitError::NonFinite { quantity });
    }
    if value < 0.0 {
        return Err(UnitError::Negative { quantity, value });
    }
    Ok(value)
}

/// Convert a height to centimeters.
pub fn to_metric_height(height: &Height) -> Result<f64, UnitError> {
    match *height {
        Height::Centimeters { cm } => check("height", cm),
        Height::FeetInches { feet, inches } => {
            let feet = check("height", feet)?;
            let inches = check("height", inches)?;
            Ok((feet * INCHES_PER_FOOT + inches) * CM_PER_INCH)
        }
    }
}

/// Convert a weight to kilograms.
pub fn to_metric_weight(weight: &Weight) -> Result<f64, UnitError> {
    match *weight {
        Weight::Kilograms { kg } => check("weight", kg),
        Weight::Pounds { lb } => Ok(check("weight", lb)? * KG_PER_LB),
    }
}

/// Express a centimeter height in `unit`.
///
/// Feet are whole; inches carry the remainder rounded to one decimal.
pub fn from_metric_height(cm: f64, unit: HeightUnit) -> Result<Height, UnitError> {
    let cm = check("height", cm)?;
    match unit {
        HeightUnit::Centimeters => Ok(Height::Centimeters { cm }),
        HeightUnit::FeetInches => {
            let total_inches = (cm / CM_PER_INCH * 10.0).round() / 10.0;
            let mut feet = (total_inches / INCHES_PER_FOOT).floor();
            let mut inches = ((total_inches - feet * INCHES_PER_FOOT) * 10.0).round() / 10.0;
            if inches >= INCHES_PER_FOOT {
                feet += 1.0;
                inches -= INCHES_PER_FOOT;
            }
            Ok(Height::FeetInches { feet, inches })
        }
    }
}

/// Express a kilogram weight in `unit`.
pub fn from_metric_weight(kg: f64, unit: WeightUnit) -> Result<Weight, UnitError> {
    let kg = check("weight", kg)?;
    match unit {
        WeightUnit::Kilograms => Ok(Weight::Kilograms { kg }),
        WeightUnit::Pounds => Ok(Weight::Pounds { lb: kg / KG_PER_LB }),
    }
}
