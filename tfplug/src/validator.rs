//! Attribute validators run against configuration during planning
//!
//! Validators only see known, non-null values: the schema skips null and
//! unknown values before calling them, and a value of the wrong type is left
//! for the type checker to report.

use crate::types::{AttributePath, Diagnostic, Dynamic};
use regex::Regex;

pub trait Validator: Send + Sync {
    /// Human-readable description, used in docs and error details
    fn description(&self) -> String;

    fn validate(&self, value: &Dynamic, path: &AttributePath, diagnostics: &mut Vec<Diagnostic>);
}

/// Bounds the length of a string, counted in characters
pub struct StringLengthValidator {
    pub min: Option<usize>,
    pub max: Option<usize>,
}

impl StringLengthValidator {
    pub fn between(min: usize, max: usize) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
        }
    }

    pub fn at_most(max: usize) -> Self {
        Self {
            min: None,
            max: Some(max),
        }
    }
}

impl Validator for StringLengthValidator {
    fn description(&self) -> String {
        match (self.min, self.max) {
            (Some(min), Some(max)) => format!("string length must be between {} and {}", min, max),
            (Some(min), None) => format!("string length must be at least {}", min),
            (None, Some(max)) => format!("string length must be at most {}", max),
            (None, None) => "any string length".to_string(),
        }
    }

    fn validate(&self, value: &Dynamic, path: &AttributePath, diagnostics: &mut Vec<Diagnostic>) {
        let Some(s) = value.as_string() else {
            return;
        };
        let len = s.chars().count();

        if let Some(min) = self.min {
            if len < min {
                diagnostics.push(
                    Diagnostic::error(
                        format!("{} must have minimum length of {}", path, min),
                        format!("Got length {}", len),
                    )
                    .with_attribute(path.clone()),
                );
            }
        }
        if let Some(max) = self.max {
            if len > max {
                diagnostics.push(
                    Diagnostic::error(
                        format!("{} cannot be longer than {} characters", path, max),
                        format!("Got length {}", len),
                    )
                    .with_attribute(path.clone()),
                );
            }
        }
    }
}

pub struct StringPatternValidator {
    pub pattern: Regex,
    pub description: String,
}

impl StringPatternValidator {
    pub fn new(pattern: Regex, description: impl Into<String>) -> Self {
        Self {
            pattern,
            description: description.into(),
        }
    }
}

impl Validator for StringPatternValidator {
    fn description(&self) -> String {
        format!("must match {}", self.description)
    }

    fn validate(&self, value: &Dynamic, path: &AttributePath, diagnostics: &mut Vec<Diagnostic>) {
        if let Some(s) = value.as_string() {
            if !self.pattern.is_match(s) {
                diagnostics.push(
                    Diagnostic::error(
                        format!("{} must match {}", path, self.description),
                        format!(
                            "Value '{}' does not satisfy pattern {}",
                            s,
                            self.pattern.as_str()
                        ),
                    )
                    .with_attribute(path.clone()),
                );
            }
        }
    }
}

pub struct NumberRangeValidator {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl Validator for NumberRangeValidator {
    fn description(&self) -> String {
        match (self.min, self.max) {
            (Some(min), Some(max)) => format!("value must be between {} and {}", min, max),
            (Some(min), None) => format!("value must be at least {}", min),
            (None, Some(max)) => format!("value must be at most {}", max),
            (None, None) => "any number".to_string(),
        }
    }

    fn validate(&self, value: &Dynamic, path: &AttributePath, diagnostics: &mut Vec<Diagnostic>) {
        let Some(n) = value.as_number() else {
            return;
        };

        if let Some(min) = self.min {
            if n < min {
                diagnostics.push(
                    Diagnostic::error(
                        format!("{} cannot be lower than {}", path, min),
                        format!("Got {}", n),
                    )
                    .with_attribute(path.clone()),
                );
            }
        }
        if let Some(max) = self.max {
            if n > max {
                diagnostics.push(
                    Diagnostic::error(
                        format!("{} cannot be greater than {}", path, max),
                        format!("Got {}", n),
                    )
                    .with_attribute(path.clone()),
                );
            }
        }
    }
}

/// Rejects numbers with a fractional part
pub struct WholeNumberValidator;

impl Validator for WholeNumberValidator {
    fn description(&self) -> String {
        "value must be a whole number".to_string()
    }

    fn validate(&self, value: &Dynamic, path: &AttributePath, diagnostics: &mut Vec<Diagnostic>) {
        if let Some(n) = value.as_number() {
            if !n.is_finite() || n.fract() != 0.0 {
                diagnostics.push(
                    Diagnostic::error(
                        format!("{} must be a whole number", path),
                        format!("Got {}", n),
                    )
                    .with_attribute(path.clone()),
                );
            }
        }
    }
}
