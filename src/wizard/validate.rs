//! Field validation primitives.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Inclusive pitch length bounds, in characters.
pub const PITCH_MIN_CHARS: usize = 50;
pub const PITCH_MAX_CHARS: usize = 1000;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());

/// Field name → human-readable message for the step being validated.
///
/// Always recomputed in full; an empty map means the step is valid.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, String>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an error. The first message for a field wins.
    pub fn insert(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_insert_with(|| message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    /// Clear a field's message, e.g. once the user edits it.
    pub fn remove(&mut self, field: &str) -> bool {
        self.0.remove(field).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

pub fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

pub fn is_valid_email(value: &str) -> bool {
    EMAIL_RE.is_match(value)
}

/// Non-blank text.
pub fn require_text(errors: &mut ValidationErrors, field: &str, value: &str, message: &str) {
    if is_blank(value) {
        errors.insert(field, message);
    }
}

/// At least one selection in a multi-select.
pub fn require_any<T>(errors: &mut ValidationErrors, field: &str, values: &[T], message: &str) {
    if values.is_empty() {
        errors.insert(field, message);
    }
}

/// A single-select discriminant has been chosen.
pub fn require_some<T>(errors: &mut ValidationErrors, field: &str, value: &Option<T>, message: &str) {
    if value.is_none() {
        errors.insert(field, message);
    }
}

/// A required dropdown value drawn from `options`.
pub fn require_option(
    errors: &mut ValidationErrors,
    field: &str,
    value: &str,
    options: &[&str],
    message: &str,
) {
    if is_blank(value) {
        errors.insert(field, message);
    } else if !options.contains(&value) {
        errors.insert(field, "Select a valid option");
    }
}

/// Required, well-formed email address.
pub fn require_email(
    errors: &mut ValidationErrors,
    field: &str,
    value: &str,
    required: &str,
    invalid: &str,
) {
    if is_blank(value) {
        errors.insert(field, required);
    } else if !is_valid_email(value) {
        errors.insert(field, invalid);
    }
}

/// Optional percentage: blank passes, otherwise a number in `0..=100`.
pub fn optional_percentage(errors: &mut ValidationErrors, field: &str, value: &str) {
    if is_blank(value) {
        return;
    }
    match value.trim().parse::<f64>() {
        Ok(pct) if (0.0..=100.0).contains(&pct) => {}
        _ => errors.insert(field, "Enter a percentage between 0 and 100"),
    }
}

/// The clean-tech pitch: present, and between the inclusive bounds.
pub fn check_pitch(errors: &mut ValidationErrors, field: &str, pitch: &str) {
    let chars = pitch.chars().count();
    if is_blank(pitch) {
        errors.insert(field, "Please provide a brief pitch");
    } else if chars < PITCH_MIN_CHARS {
        errors.insert(
            field,
            format!("Pitch should be at least {PITCH_MIN_CHARS} characters"),
        );
    } else if chars > PITCH_MAX_CHARS {
        errors.insert(
            field,
            format!("Pitch should not exceed {PITCH_MAX_CHARS} characters"),
        );
    }
}
