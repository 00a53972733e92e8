use runway_core::ModelError;
use thiserror::Error;

use crate::{Feedback, RefineState};

#[derive(Error, Debug)]
pub enum RefineError {
    #[error("Candidate source failed: {0:#}")]
    Source(anyhow::Error),

    #[error("No valid model after {attempts} attempt(s); last feedback: {feedback}")]
    RetriesExhausted { attempts: usize, feedback: Feedback },

    #[error("Refinement cannot move from {from} to {to}")]
    InvalidTransition { from: RefineState, to: RefineState },

    #[error(transparent)]
    Model(#[from] ModelError),
}

pub type Result<T> = std::result::Result<T, RefineError>;
