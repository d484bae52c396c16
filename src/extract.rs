//! Named metric extraction from statistics text.
//!
//! Each [`MetricRule`] pairs a regex (one capture group holding a decimal
//! number) with a unit label and an optional divisor. Only the first match in
//! the text counts; later duplicate lines are ignored. A missing statistic is
//! not an error: it yields a [`Metric`] whose value is `None`.

use regex::Regex;
use std::fmt;

/// A single extracted statistic.
#[derive(Debug, Clone, PartialEq)]
pub struct Metric {
    pub name: String,
    /// `None` when the pattern was not found in the input.
    pub value: Option<f64>,
    pub unit: String,
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.value {
            Some(v) => write!(
                f,
                "{}: {} {}",
                self.name,
                crate::table::format_value(v),
                self.unit
            ),
            None => write!(f, "{}: None", self.name),
        }
    }
}

/// Errors produced while extracting metrics.
#[derive(Debug)]
pub enum ExtractError {
    /// The pattern matched but the captured text is not a number (e.g. `1.2.3`).
    InvalidNumber {
        pattern: String,
        text: String,
        source: std::num::ParseFloatError,
    },
}

impl fmt::Display for ExtractError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtractError::InvalidNumber { pattern, text, .. } => {
                write!(f, "could not convert {text:?} matched by `{pattern}` to a number")
            }
        }
    }
}

impl std::error::Error for ExtractError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ExtractError::InvalidNumber { source, .. } => Some(source),
        }
    }
}

/// Return the value captured by the first match of `regex` in `text`.
///
/// `Ok(None)` means the statistic is absent from the input.
pub fn extract_stat(text: &str, regex: &Regex) -> Result<Option<f64>, ExtractError> {
    let captured = match regex.captures(text).and_then(|c| c.get(1)) {
        Some(m) => m.as_str(),
        None => return Ok(None),
    };

    captured
        .parse::<f64>()
        .map(Some)
        .map_err(|e| ExtractError::InvalidNumber {
            pattern: regex.as_str().to_string(),
            text: captured.to_string(),
            source: e,
        })
}

/// A compiled extraction rule: which statistic to find and how to present it.
#[derive(Debug, Clone)]
pub struct MetricRule {
    name: String,
    regex: Regex,
    unit: String,
    divisor: Option<f64>,
}

impl MetricRule {
    pub fn new(
        name: impl Into<String>,
        regex: Regex,
        unit: impl Into<String>,
        divisor: Option<f64>,
    ) -> Self {
        Self {
            name: name.into(),
            regex,
            unit: unit.into(),
            divisor,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn divisor(&self) -> Option<f64> {
        self.divisor
    }

    /// Extract this rule's statistic from `text`, applying the unit conversion
    /// when a value is present.
    pub fn apply(&self, text: &str) -> Result<Metric, ExtractError> {
        let raw = extract_stat(text, &self.regex)?;
        let value = match (raw, self.divisor) {
            (Some(v), Some(d)) => Some(v / d),
            (v, _) => v,
        };

        if value.is_none() {
            tracing::debug!(metric = %self.name, "statistic not found");
        }

        Ok(Metric {
            name: self.name.clone(),
            value,
            unit: self.unit.clone(),
        })
    }
}

/// Apply every rule to `text`, preserving rule order.
pub fn extract_metrics(text: &str, rules: &[MetricRule]) -> Result<Vec<Metric>, ExtractError> {
    rules.iter().map(|rule| rule.apply(text)).collect()
}
