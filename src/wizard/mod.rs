//! Wizard engine: validation-gated step control for multi-step forms.
//!
//! A flow is a [`WizardForm`] driven by a [`StepController`]. The form knows
//! which fields each step renders and how to validate them; the controller
//! owns the step cursor and only moves it forward when the current step
//! validates. Branching on a discriminant field and the submission seam
//! live in [`branch`] and [`submission`].

pub mod branch;
pub mod controller;
pub mod cursor;
pub mod submission;
pub mod validate;

pub use branch::{Destination, DestinationFlow};
pub use controller::{StepController, Transition};
pub use cursor::{StepCursor, TERMINAL_STEP};
pub use submission::{LoggingSubmitter, SubmissionState, SubmitEffect};
pub use validate::ValidationErrors;

use crate::forms::FormRecord;

/// A form that can be walked step by step.
pub trait WizardForm: FormRecord {
    /// The step a fresh instance starts on.
    fn first_step(&self) -> u32;

    /// The last step before completion. May depend on a discriminant chosen
    /// in an earlier step.
    fn last_step(&self) -> u32;

    /// Validate the fields rendered on `step`. Fields of other steps are
    /// never checked.
    fn validate(&self, step: u32) -> ValidationErrors;

    /// Discard progress that belongs to `step` and later steps. Called when
    /// the controller jumps back to `step`.
    fn reset_from(&mut self, _step: u32) {}
}
