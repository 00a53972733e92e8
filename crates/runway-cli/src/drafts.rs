//! Candidate source that replays hand-written draft files.
//!
//! The first file is the proposal; each correction round consumes the next
//! file after logging why the previous one was rejected.

use std::collections::VecDeque;
use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use runway_core::{AllowedColumns, ModelDocument, ModelHistory};
use runway_refine::{Accepted, CandidateSource, DraftRequest, Feedback, Refinement, RefinementLog};

pub struct DraftFiles {
    pending: VecDeque<PathBuf>,
}

impl DraftFiles {
    pub fn new(paths: impl IntoIterator<Item = PathBuf>) -> Self {
        Self {
            pending: paths.into_iter().collect(),
        }
    }

    fn next_draft(&mut self) -> anyhow::Result<ModelDocument> {
        let path = self
            .pending
            .pop_front()
            .context("no drafts left to try")?;
        let json = fs::read_to_string(&path)
            .with_context(|| format!("reading draft {}", path.display()))?;
        tracing::info!(draft = %path.display(), "Trying draft");
        ModelDocument::from_json(&json).with_context(|| format!("parsing draft {}", path.display()))
    }
}

impl CandidateSource for DraftFiles {
    fn propose(&mut self, _request: &DraftRequest) -> anyhow::Result<ModelDocument> {
        self.next_draft()
    }

    fn correct(
        &mut self,
        _candidate: &ModelDocument,
        feedback: &Feedback,
    ) -> anyhow::Result<ModelDocument> {
        for message in feedback.messages() {
            tracing::warn!(%message, "Draft rejected");
        }
        self.next_draft()
    }
}

/// Refine `drafts` against `columns`, appending the accepted one to `history`.
///
/// The log is returned on failure too, so callers can report how far the
/// refinement got.
pub fn refine_drafts(
    drafts: Vec<PathBuf>,
    columns: AllowedColumns,
    max_retries: usize,
    history: &mut ModelHistory,
) -> (runway_refine::Result<Accepted>, RefinementLog) {
    let mut refinement = Refinement::new(DraftFiles::new(drafts)).with_max_retries(max_retries);
    let outcome = refinement.run(&DraftRequest::new(columns), history);
    (outcome, refinement.into_log())
}
