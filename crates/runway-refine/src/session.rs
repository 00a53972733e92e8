//! The refinement state machine.
//!
//! ```text
//! Drafting -> Validating -> Accepted
//!                 |  ^
//!                 v  |
//!             Correcting        (at most max_retries times)
//!                 |
//!                 v
//!             Exhausted
//! ```

use chrono::Utc;
use runway_core::{accept, DataModel, ModelDocument, ModelError, ModelHistory, ValidatedModel};

use crate::error::{RefineError, Result};
use crate::{
    CandidateSource, DraftRequest, Feedback, RefineState, RefinementLog, SessionId, Transition,
};

/// Corrections allowed after the first draft unless configured otherwise.
pub const DEFAULT_MAX_RETRIES: usize = 3;

/// Outcome of a successful refinement.
#[derive(Debug, Clone, PartialEq)]
pub struct Accepted {
    pub session: SessionId,
    /// History version the model was appended as.
    pub version: usize,
    /// Corrections needed before the model validated.
    pub corrections: usize,
}

/// Drives one candidate source from first draft to an accepted model.
pub struct Refinement<S> {
    source: S,
    max_retries: usize,
    state: RefineState,
    log: RefinementLog,
}

impl<S: CandidateSource> Refinement<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            max_retries: DEFAULT_MAX_RETRIES,
            state: RefineState::Drafting,
            log: RefinementLog {
                id: SessionId::new(),
                started_at: Utc::now(),
                completed_at: None,
                transitions: Vec::new(),
                accepted_version: None,
            },
        }
    }

    /// Bound the number of correction rounds.
    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn id(&self) -> SessionId {
        self.log.id
    }

    pub fn state(&self) -> RefineState {
        self.state
    }

    pub fn log(&self) -> &RefinementLog {
        &self.log
    }

    pub fn into_log(self) -> RefinementLog {
        self.log
    }

    /// Run to completion, appending the accepted model to `history`.
    ///
    /// A refinement runs once; calling this again after it finished is an
    /// `InvalidTransition`.
    pub fn run(&mut self, request: &DraftRequest, history: &mut ModelHistory) -> Result<Accepted> {
        if self.state != RefineState::Drafting {
            return Err(RefineError::InvalidTransition {
                from: self.state,
                to: RefineState::Validating,
            });
        }

        tracing::info!(session = %self.log.id, max_retries = self.max_retries, "Drafting candidate");
        let mut candidate = self.source.propose(request).map_err(RefineError::Source)?;
        let mut corrections = 0;

        loop {
            self.transition(RefineState::Validating, 0)?;

            let feedback = match check(&candidate, request) {
                Ok(validated) => {
                    self.transition(RefineState::Accepted, 0)?;
                    let version = history.append(validated);
                    self.log.accepted_version = Some(version);
                    self.log.completed_at = Some(Utc::now());
                    tracing::info!(session = %self.log.id, version, corrections, "Candidate accepted");
                    return Ok(Accepted {
                        session: self.log.id,
                        version,
                        corrections,
                    });
                }
                Err(feedback) => feedback?,
            };

            tracing::warn!(
                session = %self.log.id,
                issues = feedback.len(),
                corrections,
                "Candidate rejected"
            );

            if corrections >= self.max_retries {
                self.transition(RefineState::Exhausted, feedback.len())?;
                self.log.completed_at = Some(Utc::now());
                return Err(RefineError::RetriesExhausted {
                    attempts: corrections + 1,
                    feedback,
                });
            }

            self.transition(RefineState::Correcting, feedback.len())?;
            corrections += 1;
            candidate = self
                .source
                .correct(&candidate, &feedback)
                .map_err(RefineError::Source)?;
        }
    }

    fn transition(&mut self, to: RefineState, issues: usize) -> Result<()> {
        let from = self.state;
        if !from.can_transition_to(to) {
            return Err(RefineError::InvalidTransition { from, to });
        }
        tracing::debug!(session = %self.log.id, %from, %to, issues, "Refinement transition");
        self.log.transitions.push(Transition {
            from,
            to,
            issues,
            at: Utc::now(),
        });
        self.state = to;
        Ok(())
    }
}

/// Build and validate a candidate.
///
/// The outer error is a hard failure; the inner one is feedback for the
/// source.
fn check(
    candidate: &ModelDocument,
    request: &DraftRequest,
) -> std::result::Result<ValidatedModel, Result<Feedback>> {
    let model = match DataModel::from_document(candidate) {
        Ok(model) => model,
        Err(ModelError::Construction(issues)) => return Err(Ok(Feedback::Structural(issues))),
        Err(other) => return Err(Err(other.into())),
    };
    accept(model, &request.allowed_columns).map_err(|violations| Ok(Feedback::Schema(violations)))
}
