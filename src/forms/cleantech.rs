//! Clean-tech vendor registration: solution focus, pitch, and goal.

use serde::{Deserialize, Serialize};

use super::{FieldPatch, FormRecord, merge_fields, to_snapshot};
use crate::error::FlowError;
use crate::wizard::WizardForm;
use crate::wizard::validate::{ValidationErrors, check_pitch, require_any, require_some};

pub const STEP_SOLUTIONS: u32 = 1;
pub const STEP_PITCH: u32 = 2;
pub const STEP_GOALS: u32 = 3;

/// What the vendor wants after registering. Selects the next flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Intent {
    /// List solutions on the marketplace.
    Listing,
    /// Raise climate finance.
    Funding,
}

impl Intent {
    pub const ALL: [Intent; 2] = [Intent::Listing, Intent::Funding];
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Listing => write!(f, "listing"),
            Self::Funding => write!(f, "funding"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CleantechForm {
    pub solution_types: Vec<String>,
    pub other_solution: String,
    pub industries: Vec<String>,
    pub geographies: Vec<String>,
    pub pitch: String,
    pub intent: Option<Intent>,
}

impl FormRecord for CleantechForm {
    fn snapshot(&self) -> serde_json::Value {
        to_snapshot(self)
    }

    fn apply_patch(&mut self, patch: &FieldPatch) -> Result<Vec<String>, FlowError> {
        merge_fields(self, patch)
    }
}

impl WizardForm for CleantechForm {
    fn first_step(&self) -> u32 {
        STEP_SOLUTIONS
    }

    fn last_step(&self) -> u32 {
        STEP_GOALS
    }

    fn validate(&self, step: u32) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        match step {
            STEP_SOLUTIONS => {
                require_any(
                    &mut errors,
                    "solutionTypes",
                    &self.solution_types,
                    "Please select at least one solution type",
                );
                require_any(
                    &mut errors,
                    "industries",
                    &self.industries,
                    "Please select at least one industry",
                );
                require_any(
                    &mut errors,
                    "geographies",
                    &self.geographies,
                    "Please select at least one region",
                );
            }
            STEP_PITCH => check_pitch(&mut errors, "pitch", &self.pitch),
            STEP_GOALS => require_some(&mut errors, "intent", &self.intent, "Please select an option"),
            _ => {}
        }
        errors
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn step_one_complete() -> CleantechForm {
        CleantechForm {
            solution_types: vec!["energy".into()],
            industries: vec!["Manufacturing".into()],
            geographies: vec!["IN".into()],
            ..Default::default()
        }
    }

    #[test]
    fn step_one_requires_all_three_selections() {
        let errors = CleantechForm::default().validate(STEP_SOLUTIONS);
        assert_eq!(errors.len(), 3);
        assert_eq!(
            errors.get("solutionTypes"),
            Some("Please select at least one solution type")
        );
        assert_eq!(errors.get("industries"), Some("Please select at least one industry"));
        assert_eq!(errors.get("geographies"), Some("Please select at least one region"));

        assert!(step_one_complete().validate(STEP_SOLUTIONS).is_empty());
    }

    #[test]
    fn pitch_only_checked_on_its_step() {
        let form = step_one_complete();
        // Empty pitch does not affect step one or three's field set
        assert!(form.validate(STEP_SOLUTIONS).is_empty());
        assert!(!form.validate(STEP_GOALS).contains("pitch"));
        assert!(form.validate(STEP_PITCH).contains("pitch"));
    }

    #[test]
    fn pitch_boundaries() {
        for (len, valid) in [(49, false), (50, true), (1000, true), (1001, false)] {
            let form = CleantechForm {
                pitch: "p".repeat(len),
                ..step_one_complete()
            };
            assert_eq!(form.validate(STEP_PITCH).is_empty(), valid, "{len} chars");
        }
    }

    #[test]
    fn goal_step_requires_intent() {
        let mut form = step_one_complete();
        assert_eq!(
            form.validate(STEP_GOALS).get("intent"),
            Some("Please select an option")
        );
        form.intent = Some(Intent::Listing);
        assert!(form.validate(STEP_GOALS).is_empty());
    }

    #[test]
    fn intent_wire_values() {
        assert_eq!(serde_json::to_value(Intent::Listing).unwrap(), "listing");
        assert_eq!(serde_json::to_value(Intent::Funding).unwrap(), "funding");
        for intent in Intent::ALL {
            assert_eq!(serde_json::to_value(intent).unwrap(), intent.to_string());
        }
    }

    #[test]
    fn patch_sets_intent_from_string() {
        let mut form = CleantechForm::default();
        form.apply_patch(json!({"intent": "funding"}).as_object().unwrap())
            .unwrap();
        assert_eq!(form.intent, Some(Intent::Funding));

        let err = form
            .apply_patch(json!({"intent": "donation"}).as_object().unwrap())
            .unwrap_err();
        assert!(matches!(err, FlowError::InvalidValue { ref field, .. } if field == "intent"));
        assert_eq!(form.intent, Some(Intent::Funding));
    }

    #[test]
    fn snapshot_has_every_field() {
        let snapshot = CleantechForm::default().snapshot();
        for field in [
            "solutionTypes",
            "otherSolution",
            "industries",
            "geographies",
            "pitch",
            "intent",
        ] {
            assert!(snapshot.get(field).is_some(), "missing {field}");
        }
        assert_eq!(snapshot["intent"], serde_json::Value::Null);
    }

    #[test]
    fn tolerant_deserialize_fills_defaults() {
        let form: CleantechForm = serde_json::from_value(json!({"pitch": "hello"})).unwrap();
        assert_eq!(form.pitch, "hello");
        assert!(form.solution_types.is_empty());
        assert!(form.intent.is_none());
    }
}
