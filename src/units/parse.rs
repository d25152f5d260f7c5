//! Lenient parsing of typed height/weight strings (`5'11"`, `180 cm`,
//! `72,5kg`, `160 lbs`). A bare number is read in the preferred unit system.

use std::sync::LazyLock;

use regex::Regex;

use super::{Height, UnitSystem, Weight};
use crate::error::UnitError;

const NUMBER: &str = r"(\d+(?:\.\d+)?)";

static FEET_INCHES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r#"(?i)^{NUMBER}\s*(?:'|ft|feet|foot)\s*(?:{NUMBER}\s*(?:"|''|in|inch|inches)?)?$"#
    ))
    .expect("feet/inches pattern is valid")
});

static CENTIMETERS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?i)^{NUMBER}\s*(cm|centimeters?|m|meters?)$"))
        .expect("metric height pattern is valid")
});

static WEIGHT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)^{NUMBER}\s*(kgs?|kilos?|kilograms?|lbs?|pounds?)?$"
    ))
    .expect("weight pattern is valid")
});

static BARE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!("^{NUMBER}$")).expect("number pattern is valid"));

fn normalize(input: &str) -> String {
    input.trim().replace(',', ".")
}

fn number(s: &str, quantity: &'static str, input: &str) -> Result<f64, UnitError> {
    s.parse::<f64>().map_err(|_| UnitError::Unparseable {
        quantity,
        input: input.to_string(),
    })
}

/// Parse a height. Bare numbers are centimeters (metric) or total inches
/// (imperial).
pub fn parse_height(input: &str, preferred: UnitSystem) -> Result<Height, UnitError> {
    let text = normalize(input);
    let unparseable = || UnitError::Unparseable {
        quantity: "height",
        input: input.to_string(),
    };

    if let Some(caps) = FEET_INCHES.captures(&text) {
        let feet = number(&caps[1], "height", input)?;
        let inches = match caps.get(2) {
            Some(m) => number(m.as_str(), "height", input)?,
            None => 0.0,
        };
        return Ok(Height::feet_inches(feet, inches));
    }

    if let Some(caps) = CENTIMETERS.captures(&text) {
        let value = number(&caps[1], "height", input)?;
        let unit = caps[2].to_ascii_lowercase();
        let cm = if unit.starts_with('c') {
            value
        } else {
            value * 100.0
        };
        return Ok(Height::cm(cm));
    }

    if BARE.is_match(&text) {
        let value = number(&text, "height", input)?;
        return Ok(match preferred {
            UnitSystem::Metric => Height::cm(value),
            UnitSystem::Imperial => {
                let feet = (value / 12.0).floor();
                Height::feet_inches(feet, value - feet * 12.0)
            }
        });
    }

    Err(unparseable())
}

/// Parse a weight. Bare numbers are kilograms (metric) or pounds (imperial).
pub fn parse_weight(input: &str, preferred: UnitSystem) -> Result<Weight, UnitError> {
    let text = normalize(input);
    let caps = WEIGHT.captures(&text).ok_or_else(|| UnitError::Unparseable {
        quantity: "weight",
        input: input.to_string(),
    })?;

    let value = number(&caps[1], "weight", input)?;
    let imperial = match caps.get(2) {
        Some(unit) => {
            let unit = unit.as_str().to_ascii_lowercase();
            unit.starts_with('l') || unit.starts_with('p')
        }
        None => preferred == UnitSystem::Imperial,
    };

    Ok(if imperial {
        Weight::lb(value)
    } else {
        Weight::kg(value)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feet_and_inches_forms() {
        let expected = Height::feet_inches(5.0, 11.0);
        assert_eq!(parse_height("5'11\"", UnitSystem::Metric).unwrap(), expected);
        assert_eq!(parse_height("5 ft 11 in", UnitSystem::Metric).unwrap(), expected);
        assert_eq!(parse_height("5' 11", UnitSystem::Metric).unwrap(), expected);
        assert_eq!(
            parse_height("6 feet", UnitSystem::Metric).unwrap(),
            Height::feet_inches(6.0, 0.0)
        );
    }

    #[test]
    fn metric_height_forms() {
        assert_eq!(parse_height("180cm", UnitSystem::Imperial).unwrap(), Height::cm(180.0));
        assert_eq!(parse_height("1.75 m", UnitSystem::Imperial).unwrap(), Height::cm(175.0));
    }

    #[test]
    fn bare_height_uses_preference() {
        assert_eq!(parse_height("172", UnitSystem::Metric).unwrap(), Height::cm(172.0));
        assert_eq!(
            parse_height("70", UnitSystem::Imperial).unwrap(),
            Height::feet_inches(5.0, 10.0)
        );
    }

    #[test]
    fn weight_forms() {
        assert_eq!(parse_weight("72,5kg", UnitSystem::Imperial).unwrap(), Weight::kg(72.5));
        assert_eq!(parse_weight("160 lbs", UnitSystem::Metric).unwrap(), Weight::lb(160.0));
        assert_eq!(parse_weight("160", UnitSystem::Imperial).unwrap(), Weight::lb(160.0));
        assert_eq!(parse_weight(" 80 ", UnitSystem::Metric).unwrap(), Weight::kg(80.0));
    }

    #[test]
    fn partial_input_is_an_error_not_a_panic() {
        assert!(matches!(
            parse_weight("7o kg", UnitSystem::Metric),
            Err(UnitError::Unparseable { quantity: "weight", .. })
        ));
        assert!(parse_height("", UnitSystem::Metric).is_err());
        assert!(parse_height("5'", UnitSystem::Metric).is_ok());
        assert!(parse_height("tall", UnitSystem::Metric).is_err());
    }
}
