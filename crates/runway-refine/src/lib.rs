//! runway-refine: Bounded draft, validate and correct loop for schema
//! candidates.
//!
//! A [`Refinement`] asks a [`CandidateSource`] (typically an LLM client) for
//! a model, validates it against the allowed columns, and feeds violations
//! back for correction until the model is accepted into a
//! [`runway_core::ModelHistory`] or the retry budget runs out. Every state
//! change is recorded in a serializable [`RefinementLog`].

pub mod error;
pub mod session;

use std::fmt;

use chrono::{DateTime, Utc};
use runway_core::{AllowedColumns, ConstructionIssue, ModelDocument, SchemaViolation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use error::{RefineError, Result};
pub use session::{Accepted, Refinement, DEFAULT_MAX_RETRIES};

// ── Core Types ───────────────────────────────────────────────────

/// Identifier of one refinement run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where a refinement is in its lifecycle.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RefineState {
    Drafting,
    Validating,
    Correcting,
    Accepted,
    Exhausted,
}

impl RefineState {
    /// Whether the machine may move from `self` to `next`.
    ///
    /// `Accepted` is only reachable from `Validating`, and both terminal
    /// states are final.
    pub fn can_transition_to(self, next: RefineState) -> bool {
        use RefineState::*;
        matches!(
            (self, next),
            (Drafting, Validating)
                | (Validating, Accepted)
                | (Validating, Correcting)
                | (Validating, Exhausted)
                | (Correcting, Validating)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Accepted | Self::Exhausted)
    }
}

impl fmt::Display for RefineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Drafting => "drafting",
            Self::Validating => "validating",
            Self::Correcting => "correcting",
            Self::Accepted => "accepted",
            Self::Exhausted => "exhausted",
        };
        f.write_str(name)
    }
}

/// What a candidate source is asked to model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DraftRequest {
    /// The columns the model may map properties to.
    pub allowed_columns: AllowedColumns,
    /// Free-form description of the data.
    #[serde(default)]
    pub discovery: String,
    /// Questions the graph should answer.
    #[serde(default)]
    pub use_cases: Vec<String>,
}

impl DraftRequest {
    pub fn new(allowed_columns: AllowedColumns) -> Self {
        Self {
            allowed_columns,
            discovery: String::new(),
            use_cases: Vec::new(),
        }
    }
}

/// Why a candidate was rejected.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", content = "issues", rename_all = "snake_case")]
pub enum Feedback {
    /// The document could not be built into a model at all.
    Structural(Vec<ConstructionIssue>),
    /// The model was built but breaks schema rules.
    Schema(Vec<SchemaViolation>),
}

impl Feedback {
    pub fn len(&self) -> usize {
        match self {
            Self::Structural(issues) => issues.len(),
            Self::Schema(violations) => violations.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// One human-readable line per problem, for prompting a correction.
    pub fn messages(&self) -> Vec<String> {
        match self {
            Self::Structural(issues) => issues.iter().map(ToString::to_string).collect(),
            Self::Schema(violations) => violations.iter().map(ToString::to_string).collect(),
        }
    }
}

impl fmt::Display for Feedback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.messages().join("; "))
    }
}

/// Produces and corrects candidate models.
///
/// Failures are returned as-is; the refinement never retries them.
pub trait CandidateSource {
    /// Draft a first candidate.
    fn propose(&mut self, request: &DraftRequest) -> anyhow::Result<ModelDocument>;

    /// Return a corrected candidate given why the last one was rejected.
    fn correct(
        &mut self,
        candidate: &ModelDocument,
        feedback: &Feedback,
    ) -> anyhow::Result<ModelDocument>;
}

/// One recorded state change.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Transition {
    pub from: RefineState,
    pub to: RefineState,
    /// Number of problems found when leaving `Validating`, otherwise zero.
    pub issues: usize,
    pub at: DateTime<Utc>,
}

/// Record of a whole refinement run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RefinementLog {
    pub id: SessionId,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub transitions: Vec<Transition>,
    /// History version the accepted model was appended as.
    pub accepted_version: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepted_only_from_validating() {
        use RefineState::*;
        for from in [Drafting, Correcting, Accepted, Exhausted] {
            assert!(!from.can_transition_to(Accepted), "{from}");
        }
        assert!(Validating.can_transition_to(Accepted));
        assert!(Correcting.can_transition_to(Validating));
        assert!(!Exhausted.can_transition_to(Drafting));
        assert!(Accepted.is_terminal() && Exhausted.is_terminal());
    }

    #[test]
    fn feedback_serializes_with_kind() {
        let feedback = Feedback::Schema(vec![SchemaViolation::MissingNodeKey {
            label: "Pet".to_string(),
        }]);
        let json = serde_json::to_value(&feedback).unwrap();
        assert_eq!(json["kind"], "schema");
        assert_eq!(json["issues"][0]["label"], "Pet");
        assert_eq!(feedback.len(), 1);
        assert!(feedback.to_string().contains("Pet"));
    }
}
