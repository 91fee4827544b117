//! Step controller: cursor movement gated by per-step validation.

use serde::Serialize;
use tracing::debug;

use super::cursor::StepCursor;
use super::submission::SubmissionState;
use super::validate::ValidationErrors;
use super::WizardForm;
use crate::error::{FlowError, SubmissionError};
use crate::forms::FieldPatch;

/// Outcome of a navigation or submission request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Transition {
    Advanced { from: u32, to: u32 },
    Retreated { from: u32, to: u32 },
    Jumped { from: u32, to: u32 },
    /// The last step validated and the cursor is now terminal.
    Completed { from: u32 },
    /// Validation failed; the cursor did not move.
    Blocked { errors: ValidationErrors },
    /// The last step validated and the submission effect may run.
    Submitting { step: u32 },
    SubmissionFailed { reason: String },
    Unchanged,
}

impl Transition {
    /// Whether the client should bring the top of the page into view.
    pub fn scroll_to_top(&self) -> bool {
        matches!(
            self,
            Self::Advanced { .. } | Self::Retreated { .. } | Self::Jumped { .. } | Self::Completed { .. }
        )
    }
}

/// Owns a form, its cursor, the visible validation errors and the
/// submission state.
#[derive(Debug, Clone)]
pub struct StepController<F: WizardForm> {
    form: F,
    cursor: StepCursor,
    errors: ValidationErrors,
    submission: SubmissionState,
}

impl<F: WizardForm> StepController<F> {
    /// Start at the form's first step.
    pub fn new(form: F) -> Self {
        let first = form.first_step();
        Self::starting_at(form, first)
    }

    /// Start at `step`, e.g. when earlier steps were satisfied by a handoff.
    pub fn starting_at(form: F, step: u32) -> Self {
        Self {
            form,
            cursor: StepCursor::At(step),
            errors: ValidationErrors::new(),
            submission: SubmissionState::Idle,
        }
    }

    pub fn form(&self) -> &F {
        &self.form
    }

    pub fn cursor(&self) -> StepCursor {
        self.cursor
    }

    pub fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    pub fn submission(&self) -> &SubmissionState {
        &self.submission
    }

    pub fn is_terminal(&self) -> bool {
        self.cursor.is_terminal()
    }

    pub fn is_last_step(&self) -> bool {
        self.cursor.step() == Some(self.form.last_step())
    }

    /// Current step, or an error when the flow is finished or busy.
    fn editable_step(&self) -> Result<u32, FlowError> {
        let Some(step) = self.cursor.step() else {
            return Err(FlowError::Completed);
        };
        if self.submission == SubmissionState::Submitting {
            return Err(FlowError::SubmissionInProgress);
        }
        Ok(step)
    }

    /// Apply field edits. Errors for the touched fields are cleared.
    pub fn edit(&mut self, patch: &FieldPatch) -> Result<Vec<String>, FlowError> {
        self.editable_step()?;
        let touched = self.form.apply_patch(patch)?;
        for field in &touched {
            self.errors.remove(field);
        }
        Ok(touched)
    }

    /// Mutate the form directly, e.g. to select a discriminant. The current
    /// step's errors are cleared.
    pub fn update<R>(&mut self, change: impl FnOnce(&mut F) -> R) -> Result<R, FlowError> {
        self.editable_step()?;
        let result = change(&mut self.form);
        self.errors = ValidationErrors::new();
        Ok(result)
    }

    /// Validate the current step and move forward. The last step moves to
    /// the terminal cursor.
    pub fn advance(&mut self) -> Result<Transition, FlowError> {
        let step = self.editable_step()?;
        let errors = self.form.validate(step);
        if !errors.is_empty() {
            debug!(step, fields = errors.len(), "Step blocked by validation");
            self.errors = errors.clone();
            return Ok(Transition::Blocked { errors });
        }

        self.errors = ValidationErrors::new();
        if step >= self.form.last_step() {
            self.cursor = StepCursor::Terminal;
            return Ok(Transition::Completed { from: step });
        }
        self.cursor = StepCursor::At(step + 1);
        Ok(Transition::Advanced {
            from: step,
            to: step + 1,
        })
    }

    /// Move back one step without validating. Stays put on the first step
    /// and once terminal.
    pub fn retreat(&mut self) -> Result<Transition, FlowError> {
        if self.is_terminal() {
            return Ok(Transition::Unchanged);
        }
        let step = self.editable_step()?;
        self.errors = ValidationErrors::new();
        if step <= self.form.first_step() {
            return Ok(Transition::Unchanged);
        }
        self.cursor = StepCursor::At(step - 1);
        Ok(Transition::Retreated {
            from: step,
            to: step - 1,
        })
    }

    /// Jump back to an earlier step, discarding the form's progress from
    /// that step on.
    pub fn jump_to(&mut self, target: u32) -> Result<Transition, FlowError> {
        let step = self.editable_step()?;
        if target >= step || target < self.form.first_step() {
            return Err(FlowError::InvalidJump {
                from: self.cursor.to_string(),
                to: target,
            });
        }
        self.form.reset_from(target);
        self.errors = ValidationErrors::new();
        self.cursor = StepCursor::At(target);
        Ok(Transition::Jumped {
            from: step,
            to: target,
        })
    }

    /// Return to the first step, discarding progress. On the first step this
    /// only resets it.
    pub fn restart(&mut self) -> Result<Transition, FlowError> {
        let step = self.editable_step()?;
        let first = self.form.first_step();
        if step > first {
            return self.jump_to(first);
        }
        self.form.reset_from(first);
        self.errors = ValidationErrors::new();
        Ok(Transition::Unchanged)
    }

    /// Whether `advance` would complete the flow right now.
    pub fn can_complete(&self) -> bool {
        match self.editable_step() {
            Ok(step) => step == self.form.last_step() && self.form.validate(step).is_empty(),
            Err(_) => false,
        }
    }

    /// Validate the last step and enter `Submitting`. The caller runs the
    /// submission effect and reports back with [`finish_submission`].
    ///
    /// [`finish_submission`]: Self::finish_submission
    pub fn begin_submission(&mut self) -> Result<Transition, FlowError> {
        let step = self.editable_step()?;
        if step != self.form.last_step() {
            return Err(FlowError::NotOnFinalStep { step });
        }
        let errors = self.form.validate(step);
        if !errors.is_empty() {
            self.errors = errors.clone();
            return Ok(Transition::Blocked { errors });
        }
        self.errors = ValidationErrors::new();
        self.submission = SubmissionState::Submitting;
        Ok(Transition::Submitting { step })
    }

    /// Record the effect's outcome. Success makes the flow terminal; failure
    /// keeps the cursor so the user can retry.
    pub fn finish_submission(&mut self, outcome: Result<(), SubmissionError>) -> Transition {
        let Some(step) = self.cursor.step() else {
            return Transition::Unchanged;
        };
        match outcome {
            Ok(()) => {
                self.submission = SubmissionState::Succeeded;
                self.cursor = StepCursor::Terminal;
                Transition::Completed { from: step }
            }
            Err(e) => {
                let reason = e.to_string();
                self.submission = SubmissionState::Failed {
                    reason: reason.clone(),
                };
                Transition::SubmissionFailed { reason }
            }
        }
    }
}
