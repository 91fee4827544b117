//! Corporate ESG registration and the onboarding choice that follows it.
//!
//! Registration stores the company and its ESG configuration durably.
//! Onboarding requires that record; it writes the dashboard configuration
//! the navigation bar and dashboard read afterwards.

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::{Flow, FlowKind, FlowServices, FlowState};
use crate::catalog;
use crate::error::FlowError;
use crate::forms::{
    CorporateRegistrationForm, FieldPatch, OnboardingChoice, OnboardingChoiceForm,
};
use crate::handoff::{HandoffStore, Slot};
use crate::wizard::branch::{corporate_onboarding, corporate_registration, esg_dashboard};
use crate::wizard::submission::iso_timestamp;
use crate::wizard::{Destination, StepController, Transition};

/// A catalog entry as stored in handoff records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogRef {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyInfo {
    pub company_name: String,
    pub contact_person: String,
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub employees: String,
}

/// Durable `registrationData` record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationRecord {
    #[serde(flatten)]
    pub company: CompanyInfo,
    pub location: CatalogRef,
    pub industry: CatalogRef,
    pub framework: CatalogRef,
    pub registered_at: String,
}

impl RegistrationRecord {
    /// Expand a validated form's catalog ids.
    fn from_form(form: &CorporateRegistrationForm, registered_at: String) -> Option<Self> {
        let location = catalog::esg_location(form.location.as_deref()?)?;
        let industry = catalog::esg_industry(form.industry.as_deref()?)?;
        let framework = catalog::reporting_framework(form.framework.as_deref()?)?;
        Some(Self {
            company: CompanyInfo {
                company_name: form.company_name.clone(),
                contact_person: form.contact_person.clone(),
                email: form.email.clone(),
                phone: form.phone.clone(),
                employees: form.employees.clone(),
            },
            location: CatalogRef {
                id: location.id.into(),
                name: location.name.into(),
            },
            industry: CatalogRef {
                id: industry.id.into(),
                name: industry.label.into(),
            },
            framework: CatalogRef {
                id: framework.id.into(),
                name: framework.name.into(),
            },
            registered_at,
        })
    }
}

/// Durable `dashboardConfig` record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardConfig {
    pub location: CatalogRef,
    pub industry: CatalogRef,
    pub framework: CatalogRef,
    pub company_info: CompanyInfo,
    pub onboarding_choice: OnboardingChoice,
    pub configured_at: String,
}

/// Durable `onboardingData` record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnboardingRecord {
    #[serde(flatten)]
    pub registration: RegistrationRecord,
    pub onboarding_choice: OnboardingChoice,
    pub onboarded_at: String,
}

pub struct CorporateFlow {
    wizard: StepController<CorporateRegistrationForm>,
    destination: Option<Destination>,
}

impl CorporateFlow {
    pub fn new() -> Self {
        Self {
            wizard: StepController::new(CorporateRegistrationForm::default()),
            destination: None,
        }
    }
}

impl Default for CorporateFlow {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Flow for CorporateFlow {
    fn kind(&self) -> FlowKind {
        FlowKind::CorporateRegistration
    }

    fn edit(&mut self, patch: &FieldPatch) -> Result<Vec<String>, FlowError> {
        self.wizard.edit(patch)
    }

    async fn advance(
        &mut self,
        visitor: &str,
        services: &FlowServices,
    ) -> Result<Transition, FlowError> {
        if !self.wizard.can_complete() {
            return self.wizard.advance();
        }
        let record = RegistrationRecord::from_form(self.wizard.form(), iso_timestamp(Utc::now()))
            .ok_or_else(|| FlowError::InvalidValue {
                field: "location".into(),
                reason: "catalog selection could not be resolved".into(),
            })?;

        let store = &services.store;
        store.write(visitor, Slot::RegistrationData, &record).await?;
        // Start the new company from a clean slate
        store.remove(visitor, Slot::Cart).await?;
        store.remove(visitor, Slot::ComplianceProgress).await?;

        let transition = self.wizard.advance()?;
        info!(
            visitor,
            company = %record.company.company_name,
            framework = %record.framework.id,
            "Corporate registration stored"
        );
        self.destination = Some(corporate_onboarding());
        Ok(transition)
    }

    fn retreat(&mut self) -> Result<Transition, FlowError> {
        self.wizard.retreat()
    }

    fn restart(&mut self) -> Result<Transition, FlowError> {
        self.wizard.restart()
    }

    fn state(&self) -> FlowState {
        let frameworks: Vec<_> = self
            .wizard
            .form()
            .available_frameworks()
            .into_iter()
            .map(|fw| CatalogRef {
                id: fw.id.into(),
                name: fw.name.into(),
            })
            .collect();
        FlowState::of(&self.wizard)
            .with_destination(self.destination.as_ref())
            .with_context(serde_json::json!({ "availableFrameworks": frameworks }))
    }
}

pub struct OnboardingFlow {
    wizard: StepController<OnboardingChoiceForm>,
    registration: RegistrationRecord,
    destination: Option<Destination>,
}

impl OnboardingFlow {
    /// Requires a stored corporate registration; without one the visitor is
    /// sent back to register.
    pub async fn mount(visitor: &str, store: &HandoffStore) -> Result<Self, FlowError> {
        let Some(registration) = store
            .read::<RegistrationRecord>(visitor, Slot::RegistrationData)
            .await
        else {
            warn!(visitor, "No registration data; onboarding redirects to {}", corporate_registration().route);
            return Err(FlowError::MissingContext {
                slot: Slot::RegistrationData.key().into(),
            });
        };
        Ok(Self::new(registration))
    }

    pub fn new(registration: RegistrationRecord) -> Self {
        Self {
            wizard: StepController::new(OnboardingChoiceForm::default()),
            registration,
            destination: None,
        }
    }
}

#[async_trait]
impl Flow for OnboardingFlow {
    fn kind(&self) -> FlowKind {
        FlowKind::Onboarding
    }

    fn edit(&mut self, patch: &FieldPatch) -> Result<Vec<String>, FlowError> {
        self.wizard.edit(patch)
    }

    async fn advance(
        &mut self,
        visitor: &str,
        services: &FlowServices,
    ) -> Result<Transition, FlowError> {
        if !self.wizard.can_complete() {
            return self.wizard.advance();
        }
        let Some(choice) = self.wizard.form().onboarding_choice else {
            return self.wizard.advance();
        };

        let now = iso_timestamp(Utc::now());
        let registration = &self.registration;
        let config = DashboardConfig {
            location: registration.location.clone(),
            industry: registration.industry.clone(),
            framework: registration.framework.clone(),
            company_info: registration.company.clone(),
            onboarding_choice: choice,
            configured_at: now.clone(),
        };
        let onboarding = OnboardingRecord {
            registration: registration.clone(),
            onboarding_choice: choice,
            onboarded_at: now,
        };

        let store = &services.store;
        store.write(visitor, Slot::DashboardConfig, &config).await?;
        store.write(visitor, Slot::OnboardingData, &onboarding).await?;

        let transition = self.wizard.advance()?;
        let destination = esg_dashboard(
            &config.location.id,
            &config.industry.id,
            &config.framework.id,
        );
        info!(visitor, route = %destination.route, choice = choice.title(), "Onboarding complete");
        self.destination = Some(destination);
        Ok(transition)
    }

    fn retreat(&mut self) -> Result<Transition, FlowError> {
        self.wizard.retreat()
    }

    fn restart(&mut self) -> Result<Transition, FlowError> {
        self.wizard.restart()
    }

    fn state(&self) -> FlowState {
        let registration = &self.registration;
        FlowState::of(&self.wizard)
            .with_destination(self.destination.as_ref())
            .with_context(serde_json::json!({
                "companyName": registration.company.company_name,
                "email": registration.company.email,
                "location": registration.location,
                "industry": registration.industry,
                "framework": registration.framework,
            }))
    }
}
