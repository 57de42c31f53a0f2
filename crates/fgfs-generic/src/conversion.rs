//! Numeric conversions applied to raw field text.
//!
//! A descriptor names a conversion by function name and optional parameter.
//! Resolution happens once at load time through [`Conversion::resolve`]; the
//! receive loop only ever calls [`Conversion::apply`].

use core::fmt;

use serde::Serialize;

use crate::error::{ConversionDefinitionError, ConversionError};

/// Parameter used when a conversion element carries no `value` attribute.
pub const DEFAULT_PARAMETER: f64 = 1.0;

/// A resolved conversion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "function", rename_all = "snake_case")]
pub enum Conversion {
    /// `x * factor`.
    Scale {
        /// Multiplier.
        factor: f64,
    },
    /// `(x - 32) * 5 / 9`.
    FahrenheitToCelsius,
}

type Constructor = fn(f64) -> Conversion;

/// Name table consulted by [`Conversion::resolve`]. Names are lowercase.
const CONVERSIONS: &[(&str, Constructor)] = &[
    ("multiply", scale),
    ("scale", scale),
    ("ftoc", fahrenheit_to_celsius),
    ("fahrenheit_to_celsius", fahrenheit_to_celsius),
];

fn scale(factor: f64) -> Conversion {
    Conversion::Scale { factor }
}

fn fahrenheit_to_celsius(_: f64) -> Conversion {
    Conversion::FahrenheitToCelsius
}

impl Conversion {
    /// Resolve a descriptor `function` / `value` pair.
    ///
    /// Function names are matched case-insensitively. A missing `value`
    /// means [`DEFAULT_PARAMETER`].
    ///
    /// # Errors
    ///
    /// Returns [`ConversionDefinitionError::UnknownFunction`] for a name not
    /// in the table and [`ConversionDefinitionError::InvalidParameter`] when
    /// `value` is not a finite number.
    pub fn resolve(function: &str, value: Option<&str>) -> Result<Self, ConversionDefinitionError> {
        let name = function.trim().to_ascii_lowercase();
        let constructor = CONVERSIONS
            .iter()
            .find(|(candidate, _)| *candidate == name)
            .map(|(_, constructor)| *constructor)
            .ok_or_else(|| ConversionDefinitionError::UnknownFunction(function.to_string()))?;

        let parameter = match value {
            None => DEFAULT_PARAMETER,
            Some(raw) => raw
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| ConversionDefinitionError::InvalidParameter {
                    function: function.to_string(),
                    value: raw.to_string(),
                })?,
        };

        Ok(constructor(parameter))
    }

    /// Names accepted by [`Conversion::resolve`].
    pub fn known_names() -> impl Iterator<Item = &'static str> {
        CONVERSIONS.iter().map(|(name, _)| *name)
    }

    /// Parse `raw` and apply the conversion.
    ///
    /// # Errors
    ///
    /// Returns [`ConversionError::NotNumeric`] when `raw` is not a finite
    /// number or the result is not finite.
    pub fn apply(&self, raw: &str) -> Result<f64, ConversionError> {
        let x = raw
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| ConversionError::not_numeric(raw))?;

        let out = match *self {
            Conversion::Scale { factor } => x * factor,
            Conversion::FahrenheitToCelsius => (x - 32.0) * 5.0 / 9.0,
        };

        if out.is_finite() {
            Ok(out)
        } else {
            Err(ConversionError::not_numeric(raw))
        }
    }
}

impl fmt::Display for Conversion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Conversion::Scale { factor } => write!(f, "scale({factor})"),
            Conversion::FahrenheitToCelsius => write!(f, "fahrenheit_to_celsius"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_resolve_by_name() -> TestResult {
        assert_eq!(
            Conversion::resolve("multiply", Some("0.3048"))?,
            Conversion::Scale { factor: 0.3048 }
        );
        assert_eq!(
            Conversion::resolve("SCALE", None)?,
            Conversion::Scale { factor: 1.0 }
        );
        assert_eq!(
            Conversion::resolve("FtoC", Some("7"))?,
            Conversion::FahrenheitToCelsius
        );
        Ok(())
    }

    #[test]
    fn test_resolve_rejects_unknown_and_bad_parameter() {
        assert_eq!(
            Conversion::resolve("sqrt", None),
            Err(ConversionDefinitionError::UnknownFunction("sqrt".to_string()))
        );
        assert!(matches!(
            Conversion::resolve("multiply", Some("fast")),
            Err(ConversionDefinitionError::InvalidParameter { .. })
        ));
        assert!(matches!(
            Conversion::resolve("multiply", Some("inf")),
            Err(ConversionDefinitionError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_scale_feet_to_metres() -> TestResult {
        let conv = Conversion::resolve("multiply", Some("0.3048"))?;
        assert!(close(conv.apply("1500")?, 457.2));
        Ok(())
    }

    #[test]
    fn test_fahrenheit_to_celsius() -> TestResult {
        let conv = Conversion::FahrenheitToCelsius;
        assert!(close(conv.apply("212")?, 100.0));
        assert!(close(conv.apply("32")?, 0.0));
        assert!(close(conv.apply(" -40 \r")?, -40.0));
        Ok(())
    }

    #[test]
    fn test_apply_rejects_non_numeric() {
        let conv = Conversion::Scale { factor: 2.0 };
        assert_eq!(conv.apply("abc"), Err(ConversionError::not_numeric("abc")));
        assert!(conv.apply("").is_err());
        assert!(conv.apply("NaN").is_err());
    }

    #[test]
    fn test_apply_rejects_overflow() {
        let conv = Conversion::Scale { factor: f64::MAX };
        assert!(conv.apply("10").is_err());
    }

    #[test]
    fn test_known_names_cover_table() {
        let names: Vec<&str> = Conversion::known_names().collect();
        assert!(names.contains(&"multiply"));
        assert!(names.contains(&"ftoc"));
    }
}
