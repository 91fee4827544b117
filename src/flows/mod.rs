//! Flow sessions: live wizard instances for each onboarding vertical.
//!
//! A flow wraps a [`StepController`] with what happens around it: reading a
//! handoff on mount, writing one on completion, and resolving where the user
//! goes next.

pub mod cleantech;
pub mod corporate;
pub mod finance;
pub mod manager;

pub use cleantech::CleantechFlow;
pub use corporate::{CorporateFlow, OnboardingFlow};
pub use finance::{FinanceFlow, PendingSubmission, SubmitStart};
pub use manager::FlowManager;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::time::Instant;
use uuid::Uuid;

use crate::error::{FlowError, SubmissionError};
use crate::forms::{FieldPatch, RegistrationType};
use crate::handoff::HandoffStore;
use crate::wizard::{
    Destination, StepController, StepCursor, SubmissionState, SubmitEffect, Transition,
    ValidationErrors, WizardForm,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FlowKind {
    Cleantech,
    ClimateFinance,
    CorporateRegistration,
    Onboarding,
}

impl std::fmt::Display for FlowKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cleantech => write!(f, "cleantech"),
            Self::ClimateFinance => write!(f, "climate-finance"),
            Self::CorporateRegistration => write!(f, "corporate-registration"),
            Self::Onboarding => write!(f, "onboarding"),
        }
    }
}

/// Shared dependencies a flow acts through.
#[derive(Clone)]
pub struct FlowServices {
    pub store: HandoffStore,
    pub submitter: Arc<dyn SubmitEffect>,
}

/// Everything a client needs to render a flow.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowState {
    pub step: StepCursor,
    pub first_step: u32,
    pub last_step: u32,
    pub form: Value,
    pub errors: ValidationErrors,
    pub submission: SubmissionState,
    pub destination: Option<Destination>,
    /// Flow-specific extras, e.g. the vendor banner.
    #[serde(skip_serializing_if = "Value::is_null")]
    pub context: Value,
}

impl FlowState {
    pub fn of<F: WizardForm>(wizard: &StepController<F>) -> Self {
        Self {
            step: wizard.cursor(),
            first_step: wizard.form().first_step(),
            last_step: wizard.form().last_step(),
            form: wizard.form().snapshot(),
            errors: wizard.errors().clone(),
            submission: wizard.submission().clone(),
            destination: None,
            context: Value::Null,
        }
    }

    fn with_destination(mut self, destination: Option<&Destination>) -> Self {
        self.destination = destination.cloned();
        self
    }

    fn with_context(mut self, context: Value) -> Self {
        self.context = context;
        self
    }
}

/// One vertical's wizard plus its mount and exit behavior.
#[async_trait]
pub trait Flow: Send {
    fn kind(&self) -> FlowKind;

    fn edit(&mut self, patch: &FieldPatch) -> Result<Vec<String>, FlowError>;

    /// Advance; completing the last step performs the flow's exit.
    async fn advance(
        &mut self,
        visitor: &str,
        services: &FlowServices,
    ) -> Result<Transition, FlowError>;

    fn retreat(&mut self) -> Result<Transition, FlowError>;

    fn restart(&mut self) -> Result<Transition, FlowError>;

    fn state(&self) -> FlowState;
}

/// The flow a session is running.
pub enum ActiveFlow {
    Cleantech(CleantechFlow),
    ClimateFinance(FinanceFlow),
    CorporateRegistration(CorporateFlow),
    Onboarding(OnboardingFlow),
}

impl ActiveFlow {
    /// Start a flow of `kind`, reading whatever handoff it consumes.
    pub async fn mount(
        kind: FlowKind,
        visitor: &str,
        store: &HandoffStore,
    ) -> Result<Self, FlowError> {
        Ok(match kind {
            FlowKind::Cleantech => Self::Cleantech(CleantechFlow::new()),
            FlowKind::ClimateFinance => {
                Self::ClimateFinance(FinanceFlow::mount(visitor, store).await)
            }
            FlowKind::CorporateRegistration => Self::CorporateRegistration(CorporateFlow::new()),
            FlowKind::Onboarding => Self::Onboarding(OnboardingFlow::mount(visitor, store).await?),
        })
    }

    pub fn as_flow(&self) -> &dyn Flow {
        match self {
            Self::Cleantech(flow) => flow,
            Self::ClimateFinance(flow) => flow,
            Self::CorporateRegistration(flow) => flow,
            Self::Onboarding(flow) => flow,
        }
    }

    pub fn as_flow_mut(&mut self) -> &mut dyn Flow {
        match self {
            Self::Cleantech(flow) => flow,
            Self::ClimateFinance(flow) => flow,
            Self::CorporateRegistration(flow) => flow,
            Self::Onboarding(flow) => flow,
        }
    }

    /// Start the submission effect if advancing now would run one. `None`
    /// means the flow advances without an effect.
    pub fn begin_submission(&mut self) -> Result<Option<SubmitStart>, FlowError> {
        match self {
            Self::ClimateFinance(flow) if flow.submits_on_advance() => {
                flow.begin_submission().map(Some)
            }
            _ => Ok(None),
        }
    }

    pub async fn finish_submission(
        &mut self,
        visitor: &str,
        store: &HandoffStore,
        pending: PendingSubmission,
        outcome: Result<(), SubmissionError>,
    ) -> Transition {
        match self {
            Self::ClimateFinance(flow) => {
                flow.finish_submission(visitor, store, pending, outcome)
                    .await
            }
            _ => Transition::Unchanged,
        }
    }

    /// Select the climate-finance registration type.
    pub fn choose_registration_type(
        &mut self,
        kind: RegistrationType,
    ) -> Result<Transition, FlowError> {
        match self {
            Self::ClimateFinance(flow) => flow.choose(kind),
            other => Err(FlowError::NotApplicable {
                action: "registration-type".into(),
                flow: other.as_flow().kind().to_string(),
            }),
        }
    }
}

/// A mounted flow, owned by one visitor.
pub struct FlowSession {
    pub id: Uuid,
    pub visitor_id: String,
    pub flow: ActiveFlow,
    /// Last time a request touched the session.
    pub last_active: Instant,
}

/// A session as returned to clients.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowView {
    pub id: Uuid,
    pub visitor_id: String,
    pub flow: FlowKind,
    #[serde(flatten)]
    pub state: FlowState,
}

impl FlowSession {
    pub fn new(visitor_id: impl Into<String>, flow: ActiveFlow) -> Self {
        Self {
            id: Uuid::new_v4(),
            visitor_id: visitor_id.into(),
            flow,
            last_active: Instant::now(),
        }
    }

    pub fn touch(&mut self) {
        self.last_active = Instant::now();
    }

    pub fn view(&self) -> FlowView {
        let flow = self.flow.as_flow();
        FlowView {
            id: self.id,
            visitor_id: self.visitor_id.clone(),
            flow: flow.kind(),
            state: flow.state(),
        }
    }
}
