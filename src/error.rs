//! Error types for the Ploxi onboarding service.

use uuid::Uuid;

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Key-value store errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Errors raised while driving a wizard flow.
///
/// A blocked `advance` is not an error: it is reported as a
/// [`Transition::Blocked`](crate::wizard::Transition::Blocked) carrying the
/// validation messages.
#[derive(Debug, thiserror::Error)]
pub enum FlowError {
    #[error("Flow {id} not found")]
    NotFound { id: Uuid },

    #[error("Unknown field: {field}")]
    UnknownField { field: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Cannot jump from {from} to step {to}")]
    InvalidJump { from: String, to: u32 },

    #[error("Flow already completed")]
    Completed,

    #[error("A submission is already in progress")]
    SubmissionInProgress,

    #[error("Submission is only possible on the final step (currently on step {step})")]
    NotOnFinalStep { step: u32 },

    #[error("Action {action} does not apply to the {flow} flow")]
    NotApplicable { action: String, flow: String },

    #[error("Missing handoff context: {slot}")]
    MissingContext { slot: String },

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Errors from the outbound registration seam.
#[derive(Debug, thiserror::Error)]
pub enum SubmissionError {
    #[error("Registration endpoint rejected the request ({status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("Transport error: {0}")]
    Transport(String),
}
