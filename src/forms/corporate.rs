//! Corporate ESG registration and the onboarding-mode choice that follows it.

use serde::{Deserialize, Serialize};

use super::{FieldPatch, FormRecord, merge_fields, to_snapshot};
use crate::catalog::{self, ReportingFramework};
use crate::error::FlowError;
use crate::wizard::WizardForm;
use crate::wizard::validate::{ValidationErrors, require_email, require_some, require_text};

/// Both corporate forms are a single page.
pub const STEP_FORM: u32 = 1;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CorporateRegistrationForm {
    pub company_name: String,
    pub contact_person: String,
    pub email: String,
    pub phone: String,
    pub employees: String,
    /// ESG location id.
    pub location: Option<String>,
    /// ESG industry id.
    pub industry: Option<String>,
    /// Reporting framework id, offered by `location`.
    pub framework: Option<String>,
}

impl CorporateRegistrationForm {
    /// Frameworks selectable for the current location.
    pub fn available_frameworks(&self) -> Vec<&'static ReportingFramework> {
        self.location
            .as_deref()
            .map(catalog::frameworks_for_location)
            .unwrap_or_default()
    }
}

impl FormRecord for CorporateRegistrationForm {
    fn snapshot(&self) -> serde_json::Value {
        to_snapshot(self)
    }

    fn apply_patch(&mut self, patch: &FieldPatch) -> Result<Vec<String>, FlowError> {
        let mut draft = self.clone();
        let touched = merge_fields(&mut draft, patch)?;

        // A new location invalidates the chosen framework
        if draft.location != self.location && !patch.contains_key("framework") {
            draft.framework = None;
        }
        *self = draft;
        Ok(touched)
    }
}

impl WizardForm for CorporateRegistrationForm {
    fn first_step(&self) -> u32 {
        STEP_FORM
    }

    fn last_step(&self) -> u32 {
        STEP_FORM
    }

    fn validate(&self, step: u32) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        if step != STEP_FORM {
            return errors;
        }

        require_text(
            &mut errors,
            "companyName",
            &self.company_name,
            "Company name is required",
        );
        require_text(
            &mut errors,
            "contactPerson",
            &self.contact_person,
            "Contact person is required",
        );
        require_email(
            &mut errors,
            "email",
            &self.email,
            "Email is required",
            "Please enter a valid email address",
        );

        match self.location.as_deref() {
            None => errors.insert("location", "Location is required"),
            Some(id) if catalog::esg_location(id).is_none() => {
                errors.insert("location", "Select a valid option")
            }
            Some(_) => {}
        }
        match self.industry.as_deref() {
            None => errors.insert("industry", "Industry is required"),
            Some(id) if catalog::esg_industry(id).is_none() => {
                errors.insert("industry", "Select a valid option")
            }
            Some(_) => {}
        }
        match self.framework.as_deref() {
            None => errors.insert("framework", "Framework is required"),
            Some(id) if !self.available_frameworks().iter().any(|fw| fw.id == id) => {
                errors.insert("framework", "Framework is not available for the selected location")
            }
            Some(_) => {}
        }
        errors
    }
}

/// How the company wants its ESG data collected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OnboardingChoice {
    Auto,
    Manual,
}

impl OnboardingChoice {
    pub fn title(&self) -> &'static str {
        match self {
            Self::Auto => "Automatic Integration",
            Self::Manual => "Manual Entry with Expert Support",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OnboardingChoiceForm {
    pub onboarding_choice: Option<OnboardingChoice>,
}

impl FormRecord for OnboardingChoiceForm {
    fn snapshot(&self) -> serde_json::Value {
        to_snapshot(self)
    }

    fn apply_patch(&mut self, patch: &FieldPatch) -> Result<Vec<String>, FlowError> {
        merge_fields(self, patch)
    }
}

impl WizardForm for OnboardingChoiceForm {
    fn first_step(&self) -> u32 {
        STEP_FORM
    }

    fn last_step(&self) -> u32 {
        STEP_FORM
    }

    fn validate(&self, step: u32) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        if step == STEP_FORM {
            require_some(
                &mut errors,
                "onboardingChoice",
                &self.onboarding_choice,
                "Please select an option above to continue",
            );
        }
        errors
    }
}
