//! Climate-finance registration flow.
//!
//! Mount reads the clean-tech handoff: a vendor arriving from the clean-tech
//! flow skips the type selection and starts pre-filled. The last step runs
//! the submission effect; the accepted request is mirrored into the
//! visitor's session list for its registration type.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use super::{Flow, FlowKind, FlowServices, FlowState};
use crate::catalog;
use crate::error::{FlowError, SubmissionError};
use crate::forms::finance::{STEP_CHOOSE_TYPE, TYPE_LOCKED_REASON};
use crate::forms::{FieldPatch, FinanceRegistration, FormRecord, RegistrationType, VendorFunding};
use crate::handoff::{HandoffStore, Slot};
use crate::wizard::branch::climate_finance_dashboard;
use crate::wizard::submission::{iso_timestamp, submission_id};
use crate::wizard::{Destination, StepController, Transition};

pub const REGISTER_ENDPOINT: &str = "/api/climate-finance/register";
pub const SUBMISSION_ID_PREFIX: &str = "cf";
pub const BANNER_FALLBACK_NAME: &str = "Your Company";
const BANNER_TAG_LIMIT: usize = 3;

/// The clean-tech handoff as this flow reads it. Missing fields default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VendorContext {
    pub company_name: String,
    pub solution_types: Vec<String>,
    pub industries: Vec<String>,
    pub geographies: Vec<String>,
    pub pitch: String,
    pub timestamp: String,
    pub source: String,
}

impl VendorContext {
    fn prefill(&self) -> VendorFunding {
        VendorFunding {
            company_name: self.company_name.clone(),
            solution_types: self.solution_types.clone(),
            industries: self.industries.clone(),
            geographies: self.geographies.clone(),
            pitch: self.pitch.clone(),
            ..Default::default()
        }
    }
}

/// Summary of the vendor context shown above the form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextBanner {
    pub company_name: String,
    pub solution_tags: Vec<String>,
}

impl ContextBanner {
    fn from_context(context: &VendorContext) -> Self {
        let company_name = if context.company_name.trim().is_empty() {
            BANNER_FALLBACK_NAME.to_string()
        } else {
            context.company_name.clone()
        };
        let solution_tags = context
            .solution_types
            .iter()
            .take(BANNER_TAG_LIMIT)
            .map(|id| {
                catalog::solution_type(id)
                    .map(|option| option.label.to_string())
                    .unwrap_or_else(|| id.clone())
            })
            .collect();
        Self {
            company_name,
            solution_tags,
        }
    }
}

/// A submission that entered `Submitting` and waits for its effect.
#[derive(Debug, Clone)]
pub struct PendingSubmission {
    pub endpoint: &'static str,
    pub payload: Value,
}

/// How a submission attempt starts: with an effect to run, or settled
/// already because the last step did not validate.
#[derive(Debug)]
pub enum SubmitStart {
    Pending(PendingSubmission),
    Settled(Transition),
}

pub struct FinanceFlow {
    wizard: StepController<FinanceRegistration>,
    vendor_context: Option<VendorContext>,
    destination: Option<Destination>,
    submission_id: Option<String>,
}

impl FinanceFlow {
    /// A flow with no vendor context, on the type selection step.
    pub fn new() -> Self {
        Self {
            wizard: StepController::new(FinanceRegistration::default()),
            vendor_context: None,
            destination: None,
            submission_id: None,
        }
    }

    pub async fn mount(visitor: &str, store: &HandoffStore) -> Self {
        match store
            .read::<VendorContext>(visitor, Slot::CleantechRegistration)
            .await
        {
            Some(context) => {
                info!(
                    visitor,
                    solution_types = context.solution_types.len(),
                    "Vendor context loaded from clean-tech registration"
                );
                Self::with_vendor_context(context)
            }
            None => Self::new(),
        }
    }

    /// A vendor registration pre-filled from `context`. Type selection is
    /// skipped and cannot be reached.
    pub fn with_vendor_context(context: VendorContext) -> Self {
        let form = FinanceRegistration::for_vendor(context.prefill());
        Self {
            wizard: StepController::new(form),
            vendor_context: Some(context),
            destination: None,
            submission_id: None,
        }
    }

    pub fn banner(&self) -> Option<ContextBanner> {
        self.vendor_context.as_ref().map(ContextBanner::from_context)
    }

    pub fn form(&self) -> &FinanceRegistration {
        self.wizard.form()
    }

    /// Pick the registration type and move on to its first step. From a
    /// later step this returns to the type selection first.
    pub fn choose(&mut self, kind: RegistrationType) -> Result<Transition, FlowError> {
        if self.wizard.form().is_type_locked() {
            return match kind {
                RegistrationType::Vendor => Ok(Transition::Unchanged),
                _ => Err(type_change_refused(TYPE_LOCKED_REASON)),
            };
        }
        if self.wizard.cursor().step().is_some_and(|step| step > STEP_CHOOSE_TYPE) {
            self.wizard.restart()?;
        }
        self.wizard.update(|form| form.choose(kind))?;
        self.wizard.advance()
    }

    /// A type change through a field edit is only accepted on the selection
    /// step; later steps go through [`choose`](Self::choose).
    fn check_type_edit(&self, patch: &FieldPatch) -> Result<(), FlowError> {
        let Some(value) = patch.get("registrationType") else {
            return Ok(());
        };
        let requested: Option<RegistrationType> =
            serde_json::from_value(value.clone()).map_err(|e| FlowError::InvalidValue {
                field: "registrationType".into(),
                reason: e.to_string(),
            })?;
        let on_selection = self.wizard.cursor().step() == Some(STEP_CHOOSE_TYPE);
        if on_selection || requested == self.wizard.form().registration_type() {
            return Ok(());
        }
        Err(type_change_refused(
            "can only be changed on the type selection step",
        ))
    }

    /// Whether `advance` submits from the current step.
    pub fn submits_on_advance(&self) -> bool {
        self.wizard.is_last_step() && self.wizard.cursor().step() != Some(STEP_CHOOSE_TYPE)
    }

    /// The request body sent to the registration endpoint.
    pub fn payload(&self, at: DateTime<Utc>) -> Value {
        let mut body = match self.wizard.form().snapshot() {
            Value::Object(map) => map,
            _ => serde_json::Map::new(),
        };
        body.insert(
            "vendorContext".into(),
            serde_json::to_value(&self.vendor_context).unwrap_or_default(),
        );
        body.insert(
            "userType".into(),
            serde_json::to_value(self.wizard.form().registration_type()).unwrap_or_default(),
        );
        body.insert("status".into(), Value::String("pending".into()));
        body.insert("submittedAt".into(), Value::String(iso_timestamp(at)));
        body.insert(
            "id".into(),
            Value::String(submission_id(SUBMISSION_ID_PREFIX, at)),
        );
        Value::Object(body)
    }

    /// Validate the last step and enter `Submitting`. The caller runs the
    /// effect for the returned payload and reports back through
    /// [`finish_submission`](Self::finish_submission).
    pub fn begin_submission(&mut self) -> Result<SubmitStart, FlowError> {
        let transition = self.wizard.begin_submission()?;
        if !matches!(transition, Transition::Submitting { .. }) {
            return Ok(SubmitStart::Settled(transition));
        }
        Ok(SubmitStart::Pending(PendingSubmission {
            endpoint: REGISTER_ENDPOINT,
            payload: self.payload(Utc::now()),
        }))
    }

    /// Settle a submission. An accepted request is mirrored into the
    /// visitor's list slot for its registration type.
    pub async fn finish_submission(
        &mut self,
        visitor: &str,
        store: &HandoffStore,
        pending: PendingSubmission,
        outcome: Result<(), SubmissionError>,
    ) -> Transition {
        let accepted = outcome.is_ok();
        let transition = self.wizard.finish_submission(outcome);
        if !accepted {
            warn!(visitor, "Climate-finance submission failed; flow stays on its last step");
            return transition;
        }

        let payload = pending.payload;
        if let Some(slot) = self.wizard.form().registration_type().map(list_slot) {
            if let Err(e) = store.append(visitor, slot, &payload).await {
                warn!(visitor, slot = %slot, error = %e, "Failed to record submitted registration");
            }
        }
        self.submission_id = payload["id"].as_str().map(str::to_string);
        self.destination = Some(climate_finance_dashboard());
        info!(
            visitor,
            id = self.submission_id.as_deref().unwrap_or_default(),
            "Climate-finance registration submitted"
        );
        transition
    }

    async fn submit(
        &mut self,
        visitor: &str,
        services: &FlowServices,
    ) -> Result<Transition, FlowError> {
        let pending = match self.begin_submission()? {
            SubmitStart::Pending(pending) => pending,
            SubmitStart::Settled(transition) => return Ok(transition),
        };
        let outcome = services
            .submitter
            .submit(pending.endpoint, &pending.payload)
            .await;
        Ok(self
            .finish_submission(visitor, &services.store, pending, outcome)
            .await)
    }
}

impl Default for FinanceFlow {
    fn default() -> Self {
        Self::new()
    }
}

fn type_change_refused(reason: &str) -> FlowError {
    FlowError::InvalidValue {
        field: "registrationType".into(),
        reason: reason.into(),
    }
}

/// Session list that mirrors submissions of each registration type.
pub fn list_slot(kind: RegistrationType) -> Slot {
    match kind {
        RegistrationType::Vendor => Slot::FundingRequests,
        RegistrationType::Investor => Slot::ClimateInvestors,
        RegistrationType::Participant => Slot::ClimateParticipants,
    }
}

#[async_trait]
impl Flow for FinanceFlow {
    fn kind(&self) -> FlowKind {
        FlowKind::ClimateFinance
    }

    fn edit(&mut self, patch: &FieldPatch) -> Result<Vec<String>, FlowError> {
        self.check_type_edit(patch)?;
        self.wizard.edit(patch)
    }

    async fn advance(
        &mut self,
        visitor: &str,
        services: &FlowServices,
    ) -> Result<Transition, FlowError> {
        if self.submits_on_advance() {
            return self.submit(visitor, services).await;
        }
        self.wizard.advance()
    }

    fn retreat(&mut self) -> Result<Transition, FlowError> {
        self.wizard.retreat()
    }

    fn restart(&mut self) -> Result<Transition, FlowError> {
        self.wizard.restart()
    }

    fn state(&self) -> FlowState {
        let context = match self.banner() {
            Some(banner) => serde_json::json!({
                "banner": banner,
                "submissionId": self.submission_id,
            }),
            None => serde_json::json!({ "submissionId": self.submission_id }),
        };
        FlowState::of(&self.wizard)
            .with_destination(self.destination.as_ref())
            .with_context(context)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use serde_json::json;

    use super::*;
    use crate::error::SubmissionError;
    use crate::handoff::{KvStore, MemoryStore};
    use crate::wizard::submission::SubmitEffect;
    use crate::wizard::{LoggingSubmitter, StepCursor, SubmissionState};

    fn services() -> FlowServices {
        FlowServices {
            store: HandoffStore::in_memory(),
            submitter: Arc::new(LoggingSubmitter::new(Duration::ZERO)),
        }
    }

    fn patch(value: Value) -> FieldPatch {
        value.as_object().unwrap().clone()
    }

    /// Fails the first `failures` calls, then accepts.
    struct FlakySubmitter {
        failures: usize,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl SubmitEffect for FlakySubmitter {
        async fn submit(&self, _endpoint: &str, _payload: &Value) -> Result<(), SubmissionError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                Err(SubmissionError::Transport("connection refused".into()))
            } else {
                Ok(())
            }
        }
    }

    fn investor_ready(flow: &mut FinanceFlow) {
        flow.choose(RegistrationType::Investor).unwrap();
        flow.edit(&patch(json!({
            "firstName": "Ravi",
            "lastName": "Menon",
            "email": "ravi@fund.example",
        })))
        .unwrap();
    }

    #[tokio::test]
    async fn mount_without_context_starts_at_type_selection() {
        let services = services();
        let flow = FinanceFlow::mount("v1", &services.store).await;
        assert_eq!(flow.state().step, StepCursor::At(0));
        assert!(flow.banner().is_none());
    }

    #[tokio::test]
    async fn mount_with_context_prefills_vendor() {
        let services = services();
        services
            .store
            .write(
                "v1",
                Slot::CleantechRegistration,
                &json!({
                    "solutionTypes": ["energy", "water", "waste", "carbon"],
                    "industries": ["Manufacturing"],
                    "geographies": ["IN"],
                    "pitch": "p".repeat(60),
                    "intent": "funding",
                    "timestamp": "2025-01-01T00:00:00.000Z",
                    "source": "cleantech",
                }),
            )
            .await
            .unwrap();

        let flow = FinanceFlow::mount("v1", &services.store).await;
        assert_eq!(flow.state().step, StepCursor::At(1));
        assert_eq!(flow.state().first_step, 1);
        assert_eq!(flow.form().registration_type(), Some(RegistrationType::Vendor));
        let vendor = flow.form().vendor().unwrap();
        assert_eq!(vendor.industries, vec!["Manufacturing"]);

        let banner = flow.banner().unwrap();
        assert_eq!(banner.company_name, "Your Company");
        assert_eq!(
            banner.solution_tags,
            vec!["Energy Management", "Water Treatment", "Waste Solutions"]
        );
    }

    #[tokio::test]
    async fn malformed_context_is_ignored() {
        let session = Arc::new(MemoryStore::new());
        let store = HandoffStore::new(session.clone(), Arc::new(MemoryStore::new()));
        session
            .set("v1", "cleantech-registration", "{\"solutionTypes\": 5")
            .await
            .unwrap();
        let flow = FinanceFlow::mount("v1", &store).await;
        assert_eq!(flow.state().step, StepCursor::At(0));
    }

    #[tokio::test]
    async fn investor_blocked_on_engagement_type() {
        let services = services();
        let mut flow = FinanceFlow::new();
        investor_ready(&mut flow);
        assert_eq!(
            flow.advance("v1", &services).await.unwrap(),
            Transition::Advanced { from: 1, to: 2 }
        );

        flow.edit(&patch(json!({"financeSubType": ["debt"]}))).unwrap();
        let transition = flow.advance("v1", &services).await.unwrap();
        match transition {
            Transition::Blocked { errors } => {
                assert_eq!(errors.get("engagementType"), Some("Required"));
                assert_eq!(errors.len(), 1);
            }
            other => panic!("expected blocked, got {other:?}"),
        }
        assert_eq!(flow.state().step, StepCursor::At(2));
    }

    #[tokio::test]
    async fn participant_submission_records_list_entry() {
        let services = services();
        let mut flow = FinanceFlow::new();
        flow.choose(RegistrationType::Participant).unwrap();
        flow.edit(&patch(json!({
            "firstName": "Lena",
            "lastName": "Ortiz",
            "email": "lena@example.org",
            "intentType": ["events"],
        })))
        .unwrap();
        flow.advance("v1", &services).await.unwrap();
        let transition = flow.advance("v1", &services).await.unwrap();
        assert_eq!(transition, Transition::Completed { from: 2 });

        let state = flow.state();
        assert_eq!(state.step, StepCursor::Terminal);
        assert_eq!(state.submission, SubmissionState::Succeeded);
        assert_eq!(
            state.destination.unwrap().route,
            "/climate-finance/dashboard"
        );

        let entries = services
            .store
            .read_list("v1", Slot::ClimateParticipants)
            .await;
        assert_eq!(entries.len(), 1);
        let entry = &entries[0];
        assert_eq!(entry["userType"], "participant");
        assert_eq!(entry["status"], "pending");
        assert_eq!(entry["vendorContext"], Value::Null);
        assert!(entry["id"].as_str().unwrap().starts_with("cf_"));
        assert_eq!(entry["intentType"], json!(["events"]));
    }

    #[tokio::test]
    async fn failed_submission_can_be_retried() {
        let services = FlowServices {
            store: HandoffStore::in_memory(),
            submitter: Arc::new(FlakySubmitter {
                failures: 1,
                calls: AtomicUsize::new(0),
            }),
        };
        let mut flow = FinanceFlow::new();
        flow.choose(RegistrationType::Participant).unwrap();
        flow.edit(&patch(json!({
            "firstName": "Lena",
            "lastName": "Ortiz",
            "email": "lena@example.org",
        })))
        .unwrap();
        flow.advance("v1", &services).await.unwrap();

        let failed = flow.advance("v1", &services).await.unwrap();
        assert!(matches!(failed, Transition::SubmissionFailed { .. }));
        assert_eq!(flow.state().step, StepCursor::At(2));
        assert!(
            services
                .store
                .read_list("v1", Slot::ClimateParticipants)
                .await
                .is_empty()
        );

        let retried = flow.advance("v1", &services).await.unwrap();
        assert_eq!(retried, Transition::Completed { from: 2 });
        assert_eq!(
            services
                .store
                .read_list("v1", Slot::ClimateParticipants)
                .await
                .len(),
            1
        );
    }

    #[tokio::test]
    async fn vendor_context_never_reaches_type_selection() {
        let services = services();
        let mut flow = FinanceFlow::with_vendor_context(VendorContext {
            company_name: "Sunbeam".into(),
            solution_types: vec!["renewable".into()],
            ..Default::default()
        });
        assert_eq!(flow.state().first_step, 1);
        assert_eq!(flow.retreat().unwrap(), Transition::Unchanged);
        assert_eq!(flow.restart().unwrap(), Transition::Unchanged);
        assert_eq!(flow.state().step, StepCursor::At(1));
        assert_eq!(flow.form().registration_type(), Some(RegistrationType::Vendor));

        assert!(matches!(
            flow.choose(RegistrationType::Investor),
            Err(FlowError::InvalidValue { .. })
        ));
        assert_eq!(flow.choose(RegistrationType::Vendor).unwrap(), Transition::Unchanged);

        flow.edit(&patch(json!({
            "fundingStage": catalog::FUNDING_STAGES[0],
            "fundingAmount": "₹ 2 Crore",
            "fundingPurpose": catalog::FUNDING_PURPOSES[0],
        })))
        .unwrap();
        flow.advance("v1", &services).await.unwrap();
        assert_eq!(
            flow.restart().unwrap(),
            Transition::Jumped { from: 2, to: 1 }
        );
        assert_eq!(flow.form().vendor().unwrap().company_name, "Sunbeam");
        assert_eq!(flow.banner().unwrap().company_name, "Sunbeam");
    }

    #[tokio::test]
    async fn restart_keeps_contact_details() {
        let services = services();
        let mut flow = FinanceFlow::new();
        investor_ready(&mut flow);
        flow.advance("v1", &services).await.unwrap();

        assert_eq!(
            flow.restart().unwrap(),
            Transition::Jumped { from: 2, to: 0 }
        );
        assert_eq!(flow.form().registration_type(), None);
        assert_eq!(flow.form().contact.email, "ravi@fund.example");
    }

    #[tokio::test]
    async fn type_edit_past_selection_is_refused() {
        let services = services();
        let mut flow = FinanceFlow::new();
        flow.choose(RegistrationType::Vendor).unwrap();
        flow.edit(&patch(json!({
            "fundingStage": catalog::FUNDING_STAGES[0],
            "fundingAmount": "10 lakh",
            "fundingPurpose": catalog::FUNDING_PURPOSES[0],
        })))
        .unwrap();
        flow.advance("v1", &services).await.unwrap();
        assert_eq!(flow.state().step, StepCursor::At(2));

        // Switching to participant here would skip its contact step
        let err = flow
            .edit(&patch(json!({"registrationType": "participant"})))
            .unwrap_err();
        assert!(matches!(err, FlowError::InvalidValue { ref field, .. } if field == "registrationType"));
        assert_eq!(flow.form().registration_type(), Some(RegistrationType::Vendor));

        let transition = flow.advance("v1", &services).await.unwrap();
        assert!(matches!(transition, Transition::Blocked { .. }));
        assert!(
            services
                .store
                .read_list("v1", Slot::ClimateParticipants)
                .await
                .is_empty()
        );

        // Restating the current type is accepted
        flow.edit(&patch(json!({"registrationType": "vendor"}))).unwrap();
    }

    #[tokio::test]
    async fn type_edit_on_selection_step() {
        let services = services();
        let mut flow = FinanceFlow::new();
        flow.edit(&patch(json!({"registrationType": "participant"})))
            .unwrap();
        assert_eq!(
            flow.advance("v1", &services).await.unwrap(),
            Transition::Advanced { from: 0, to: 1 }
        );
        let blocked = flow.advance("v1", &services).await.unwrap();
        assert!(matches!(blocked, Transition::Blocked { ref errors } if errors.contains("email")));
    }

    #[tokio::test]
    async fn choose_from_later_step_returns_to_selection() {
        let mut flow = FinanceFlow::new();
        investor_ready(&mut flow);
        let transition = flow.choose(RegistrationType::Participant).unwrap();
        assert_eq!(transition, Transition::Advanced { from: 0, to: 1 });
        assert_eq!(
            flow.form().registration_type(),
            Some(RegistrationType::Participant)
        );
        assert_eq!(flow.form().contact.first_name, "Ravi");
    }

    #[test]
    fn payload_shape() {
        let flow = FinanceFlow::with_vendor_context(VendorContext {
            solution_types: vec!["energy".into()],
            ..Default::default()
        });
        let at = DateTime::parse_from_rfc3339("2025-06-01T10:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let body = flow.payload(at);
        assert_eq!(body["userType"], "vendor");
        assert_eq!(body["registrationType"], "vendor");
        assert_eq!(body["status"], "pending");
        assert_eq!(body["submittedAt"], "2025-06-01T10:00:00.000Z");
        assert_eq!(body["id"], format!("cf_{}", at.timestamp_millis()));
        assert_eq!(body["vendorContext"]["solutionTypes"], json!(["energy"]));
        assert_eq!(body["solutionTypes"], json!(["energy"]));
    }

    #[test]
    fn list_slots_per_type() {
        assert_eq!(list_slot(RegistrationType::Vendor).key(), "funding-requests");
        assert_eq!(list_slot(RegistrationType::Investor).key(), "climate-investors");
        assert_eq!(
            list_slot(RegistrationType::Participant).key(),
            "climate-participants"
        );
    }
}
