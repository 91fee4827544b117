//! Clean-tech vendor registration flow.

use async_trait::async_trait;
use chrono::Utc;
use tracing::info;

use super::{Flow, FlowKind, FlowServices, FlowState};
use crate::error::FlowError;
use crate::forms::{CleantechForm, FieldPatch};
use crate::handoff::{Handoff, Slot};
use crate::wizard::branch::resolve_intent;
use crate::wizard::{Destination, StepController, Transition};

pub const HANDOFF_SOURCE: &str = "cleantech";

pub struct CleantechFlow {
    wizard: StepController<CleantechForm>,
    destination: Option<Destination>,
}

impl CleantechFlow {
    pub fn new() -> Self {
        Self {
            wizard: StepController::new(CleantechForm::default()),
            destination: None,
        }
    }

    pub fn form(&self) -> &CleantechForm {
        self.wizard.form()
    }
}

impl Default for CleantechFlow {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Flow for CleantechFlow {
    fn kind(&self) -> FlowKind {
        FlowKind::Cleantech
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

        let form = self.wizard.form().clone();
        let Some(intent) = form.intent else {
            return self.wizard.advance();
        };
        let handoff = Handoff::new(form, HANDOFF_SOURCE, Utc::now());
        services
            .store
            .write(visitor, Slot::CleantechRegistration, &handoff)
            .await?;

        let transition = self.wizard.advance()?;
        let destination = resolve_intent(intent);
        info!(visitor, %intent, route = %destination.route, "Clean-tech registration complete");
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
        FlowState::of(&self.wizard).with_destination(self.destination.as_ref())
    }
}
