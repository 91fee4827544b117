//! Climate-finance registration: shared contact details plus one variant
//! record per registration type.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{FieldPatch, FileDescriptor, FormRecord, field_names, merge_fields, to_snapshot};
use crate::catalog::{FUND_SIZES, FUNDING_PURPOSES, FUNDING_STAGES};
use crate::error::FlowError;
use crate::wizard::WizardForm;
use crate::wizard::validate::{
    ValidationErrors, optional_percentage, require_any, require_email, require_option,
    require_some, require_text,
};

/// Step 0 chooses the registration type; variant steps start at 1.
pub const STEP_CHOOSE_TYPE: u32 = 0;

/// Branch discriminant for the climate-finance flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistrationType {
    Vendor,
    Investor,
    Participant,
}

impl RegistrationType {
    pub const ALL: [RegistrationType; 3] = [Self::Vendor, Self::Investor, Self::Participant];

    /// Last step of this variant's sequence.
    pub fn last_step(&self) -> u32 {
        match self {
            Self::Vendor => 2,
            Self::Investor => 4,
            Self::Participant => 2,
        }
    }
}

impl std::fmt::Display for RegistrationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Vendor => write!(f, "vendor"),
            Self::Investor => write!(f, "investor"),
            Self::Participant => write!(f, "participant"),
        }
    }
}

impl std::str::FromStr for RegistrationType {
    type Err = FlowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "vendor" => Ok(Self::Vendor),
            "investor" => Ok(Self::Investor),
            "participant" => Ok(Self::Participant),
            other => Err(FlowError::InvalidValue {
                field: "registrationType".into(),
                reason: format!("unknown registration type '{other}'"),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EngagementType {
    ProjectFinance,
    RaiseEquity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParticipationIntent {
    Events,
    Consultation,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContactDetails {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub organization: String,
    pub designation: String,
    pub website: String,
}

impl ContactDetails {
    fn validate(&self, errors: &mut ValidationErrors) {
        require_text(errors, "firstName", &self.first_name, "Required");
        require_text(errors, "lastName", &self.last_name, "Required");
        require_email(errors, "email", &self.email, "Required", "Valid email required");
    }
}

/// A vendor's funding request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VendorFunding {
    pub company_name: String,
    pub solution_types: Vec<String>,
    pub industries: Vec<String>,
    pub geographies: Vec<String>,
    pub pitch: String,
    pub funding_stage: String,
    pub funding_amount: String,
    pub funding_purpose: String,
    pub current_revenue: String,
    pub projected_revenue: String,
    pub equity_offered: String,
    pub use_of_funds: String,
    pub previous_funding: String,
    pub investors: String,
    pub pitch_deck: Option<FileDescriptor>,
    pub financials: Option<FileDescriptor>,
}

impl VendorFunding {
    fn validate(&self, step: u32, errors: &mut ValidationErrors) {
        match step {
            1 => {
                require_option(errors, "fundingStage", &self.funding_stage, FUNDING_STAGES, "Required");
                require_text(errors, "fundingAmount", &self.funding_amount, "Required");
                require_option(
                    errors,
                    "fundingPurpose",
                    &self.funding_purpose,
                    FUNDING_PURPOSES,
                    "Required",
                );
                optional_percentage(errors, "equityOffered", &self.equity_offered);
            }
            2 => {
                require_text(errors, "useOfFunds", &self.use_of_funds, "Required");
                require_text(errors, "currentRevenue", &self.current_revenue, "Required");
            }
            _ => {}
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InvestorProfile {
    pub engagement_type: Option<EngagementType>,
    pub finance_sub_type: Vec<String>,
    pub fund_name: String,
    pub fund_size: String,
    pub sectors_of_interest: Vec<String>,
    pub financing_types: Vec<String>,
    pub ticket_size: String,
    pub geographic_focus: Vec<String>,
    pub intent_type: Vec<ParticipationIntent>,
    pub consultation_message: String,
    pub preferred_date: String,
}

impl InvestorProfile {
    fn validate(&self, step: u32, errors: &mut ValidationErrors) {
        match step {
            2 => {
                require_some(errors, "engagementType", &self.engagement_type, "Required");
                require_any(errors, "financeSubType", &self.finance_sub_type, "Select at least one");
            }
            3 => {
                require_any(
                    errors,
                    "sectorsOfInterest",
                    &self.sectors_of_interest,
                    "Select at least one sector",
                );
                require_option(errors, "fundSize", &self.fund_size, FUND_SIZES, "Required");
            }
            _ => {}
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ParticipantProfile {
    pub intent_type: Vec<ParticipationIntent>,
    pub consultation_message: String,
    pub preferred_date: String,
}

/// The variant-specific part of a finance registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationForm {
    Vendor(VendorFunding),
    Investor(InvestorProfile),
    Participant(ParticipantProfile),
}

impl RegistrationForm {
    pub fn new(kind: RegistrationType) -> Self {
        match kind {
            RegistrationType::Vendor => Self::Vendor(VendorFunding::default()),
            RegistrationType::Investor => Self::Investor(InvestorProfile::default()),
            RegistrationType::Participant => Self::Participant(ParticipantProfile::default()),
        }
    }

    pub fn kind(&self) -> RegistrationType {
        match self {
            Self::Vendor(_) => RegistrationType::Vendor,
            Self::Investor(_) => RegistrationType::Investor,
            Self::Participant(_) => RegistrationType::Participant,
        }
    }

    fn snapshot(&self) -> Value {
        match self {
            Self::Vendor(form) => to_snapshot(form),
            Self::Investor(form) => to_snapshot(form),
            Self::Participant(form) => to_snapshot(form),
        }
    }

    fn apply_patch(&mut self, patch: &FieldPatch) -> Result<Vec<String>, FlowError> {
        match self {
            Self::Vendor(form) => merge_fields(form, patch),
            Self::Investor(form) => merge_fields(form, patch),
            Self::Participant(form) => merge_fields(form, patch),
        }
    }
}

/// First step of every variant's sequence.
pub const STEP_FIRST_VARIANT: u32 = 1;

pub const TYPE_LOCKED_REASON: &str = "fixed to vendor by the clean-tech registration";

/// Climate-finance registration record.
///
/// Contact details survive a change of registration type; the variant
/// record does not.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FinanceRegistration {
    pub contact: ContactDetails,
    pub registration: Option<RegistrationForm>,
    type_locked: bool,
}

impl FinanceRegistration {
    /// A vendor registration pre-filled from an earlier clean-tech flow. The
    /// type is fixed and the selection step is skipped.
    pub fn for_vendor(prefill: VendorFunding) -> Self {
        Self {
            contact: ContactDetails::default(),
            registration: Some(RegistrationForm::Vendor(prefill)),
            type_locked: true,
        }
    }

    pub fn is_type_locked(&self) -> bool {
        self.type_locked
    }

    pub fn registration_type(&self) -> Option<RegistrationType> {
        self.registration.as_ref().map(RegistrationForm::kind)
    }

    /// Select a registration type. Re-selecting the current type keeps its
    /// fields; any other choice starts a fresh variant record.
    pub fn choose(&mut self, kind: RegistrationType) {
        if self.registration_type() != Some(kind) {
            self.registration = Some(RegistrationForm::new(kind));
        }
    }

    pub fn vendor(&self) -> Option<&VendorFunding> {
        match &self.registration {
            Some(RegistrationForm::Vendor(form)) => Some(form),
            _ => None,
        }
    }
}

impl FormRecord for FinanceRegistration {
    fn snapshot(&self) -> Value {
        let mut fields = match to_snapshot(&self.contact) {
            Value::Object(map) => map,
            _ => serde_json::Map::new(),
        };
        fields.insert(
            "registrationType".into(),
            to_snapshot(&self.registration_type()),
        );
        if let Some(Value::Object(variant)) = self.registration.as_ref().map(RegistrationForm::snapshot)
        {
            fields.extend(variant);
        }
        Value::Object(fields)
    }

    fn apply_patch(&mut self, patch: &FieldPatch) -> Result<Vec<String>, FlowError> {
        let contact_fields = field_names(&self.contact);
        let mut contact_patch = FieldPatch::new();
        let mut variant_patch = FieldPatch::new();
        let mut next_kind = None;

        for (field, value) in patch {
            if field == "registrationType" {
                let kind: Option<RegistrationType> = serde_json::from_value(value.clone())
                    .map_err(|e| FlowError::InvalidValue {
                        field: field.clone(),
                        reason: e.to_string(),
                    })?;
                if self.type_locked && kind != self.registration_type() {
                    return Err(FlowError::InvalidValue {
                        field: field.clone(),
                        reason: TYPE_LOCKED_REASON.into(),
                    });
                }
                next_kind = Some(kind);
            } else if contact_fields.contains(field) {
                contact_patch.insert(field.clone(), value.clone());
            } else {
                variant_patch.insert(field.clone(), value.clone());
            }
        }

        // Work on a copy so a rejected field leaves the record untouched
        let mut draft = self.clone();
        match next_kind {
            Some(Some(kind)) => draft.choose(kind),
            Some(None) => draft.registration = None,
            None => {}
        }
        merge_fields(&mut draft.contact, &contact_patch)?;
        if !variant_patch.is_empty() {
            match draft.registration.as_mut() {
                Some(form) => {
                    form.apply_patch(&variant_patch)?;
                }
                None => {
                    let field = variant_patch.keys().next().cloned().unwrap_or_default();
                    return Err(FlowError::UnknownField { field });
                }
            }
        }

        *self = draft;
        Ok(patch.keys().cloned().collect())
    }
}

impl WizardForm for FinanceRegistration {
    fn first_step(&self) -> u32 {
        if self.type_locked {
            STEP_FIRST_VARIANT
        } else {
            STEP_CHOOSE_TYPE
        }
    }

    // Until a type is chosen only the selection step exists.
    fn last_step(&self) -> u32 {
        self.registration_type()
            .map_or(STEP_CHOOSE_TYPE, |kind| kind.last_step())
    }

    fn validate(&self, step: u32) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        let Some(registration) = &self.registration else {
            errors.insert("registrationType", "Please choose how you want to join");
            return errors;
        };
        match (registration, step) {
            (_, STEP_CHOOSE_TYPE) => {}
            (RegistrationForm::Vendor(form), step) => form.validate(step, &mut errors),
            (RegistrationForm::Investor(_) | RegistrationForm::Participant(_), 1) => {
                self.contact.validate(&mut errors)
            }
            (RegistrationForm::Investor(form), step) => form.validate(step, &mut errors),
            (RegistrationForm::Participant(_), _) => {}
        }
        errors
    }

    fn reset_from(&mut self, step: u32) {
        if step == STEP_CHOOSE_TYPE {
            self.registration = None;
        }
    }
}
