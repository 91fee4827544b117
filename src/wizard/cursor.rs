//! Step cursor: which step's fields are rendered and validated.

use serde::{Deserialize, Serialize};

/// Wire value of the terminal ("success") cursor.
pub const TERMINAL_STEP: u32 = 999;

/// Position of a flow: a numbered step, or the terminal success state.
///
/// Serialized as a bare integer, with [`TERMINAL_STEP`] for `Terminal`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "u32", into = "u32")]
pub enum StepCursor {
    At(u32),
    Terminal,
}

impl StepCursor {
    /// The current step, or `None` once terminal.
    pub fn step(&self) -> Option<u32> {
        match self {
            Self::At(step) => Some(*step),
            Self::Terminal => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Terminal)
    }
}

impl From<u32> for StepCursor {
    fn from(value: u32) -> Self {
        if value == TERMINAL_STEP {
            Self::Terminal
        } else {
            Self::At(value)
        }
    }
}

impl From<StepCursor> for u32 {
    fn from(cursor: StepCursor) -> Self {
        match cursor {
            StepCursor::At(step) => step,
            StepCursor::Terminal => TERMINAL_STEP,
        }
    }
}

impl std::fmt::Display for StepCursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::At(step) => write!(f, "step {step}"),
            Self::Terminal => write!(f, "terminal"),
        }
    }
}
