use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use super::domain::EvaluationDocument;
use super::edits::{EditCommand, EditError, EditOutcome};
use super::export::{EvaluationPayload, ExportError};
use super::ingest::{normalize, NormalizationError};
use super::placeholder::placeholder_document;
use super::repository::{
    EvaluationSink, RepositoryError, ReviewId, ReviewRecord, ReviewRepository, ReviewStatus,
    ReviewSummary, SinkError, SubmissionId, SubmissionReceipt,
};
use super::views::DocumentView;
use crate::config::ReviewConfig;

/// Owns review sessions: opening, editing, previewing and submitting documents.
pub struct ReviewService<R, S> {
    repository: Arc<R>,
    sink: Arc<S>,
    settings: ReviewConfig,
    edit_lock: Mutex<()>,
}

static REVIEW_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_review_id() -> ReviewId {
    let id = REVIEW_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    ReviewId(format!("rev-{id:06}"))
}

/// A session with its grader-facing document view.
#[derive(Debug, Clone, Serialize)]
pub struct ReviewView {
    #[serde(flatten)]
    pub summary: ReviewSummary,
    pub document: DocumentView,
}

impl ReviewView {
    pub fn from_record(record: &ReviewRecord) -> Self {
        Self {
            summary: record.summary(),
            document: DocumentView::from_document(&record.document),
        }
    }
}

impl<R, S> ReviewService<R, S>
where
    R: ReviewRepository + 'static,
    S: EvaluationSink + 'static,
{
    pub fn new(repository: Arc<R>, sink: Arc<S>, settings: ReviewConfig) -> Self {
        Self {
            repository,
            sink,
            settings,
            edit_lock: Mutex::new(()),
        }
    }

    pub fn settings(&self) -> ReviewConfig {
        self.settings
    }

    /// Normalize a raw scoring result and start a session for it.
    pub fn open(
        &self,
        submission_id: SubmissionId,
        raw: Option<&Value>,
    ) -> Result<ReviewRecord, ReviewServiceError> {
        self.open_with_fallback(submission_id, raw, self.settings.placeholder_fallback)
    }

    /// Like [`open`](Self::open), with an explicit choice of whether unreadable input
    /// opens the placeholder instead of failing.
    pub fn open_with_fallback(
        &self,
        submission_id: SubmissionId,
        raw: Option<&Value>,
        fallback: bool,
    ) -> Result<ReviewRecord, ReviewServiceError> {
        let document = match normalize(raw) {
            Ok(document) => document,
            Err(error) if fallback => {
                warn!(
                    submission = %submission_id,
                    %error,
                    "raw evaluation unreadable, opening placeholder"
                );
                placeholder_document()
            }
            Err(error) => return Err(error.into()),
        };
        if document.is_placeholder() {
            warn!(
                submission = %submission_id,
                "no scoring result available, review opened on placeholder"
            );
        }

        self.start(submission_id, document)
    }

    /// Start a session on an already built document, e.g. a manually authored one.
    pub fn start(
        &self,
        submission_id: SubmissionId,
        document: EvaluationDocument,
    ) -> Result<ReviewRecord, ReviewServiceError> {
        let record = ReviewRecord {
            review_id: next_review_id(),
            submission_id,
            status: ReviewStatus::Open,
            document,
            opened_at: Utc::now(),
            submitted_at: None,
        };

        let stored = self.repository.insert(record)?;
        info!(
            review = %stored.review_id,
            submission = %stored.submission_id,
            source = stored.document.source().label(),
            problems = stored.document.problems().len(),
            "review opened"
        );
        Ok(stored)
    }

    pub fn get(&self, review_id: &ReviewId) -> Result<ReviewRecord, ReviewServiceError> {
        let record = self
            .repository
            .fetch(review_id)?
            .ok_or(RepositoryError::NotFound)?;
        Ok(record)
    }

    /// Apply one edit. A rejected edit leaves the stored document untouched. Editing a
    /// submitted review reopens it.
    pub fn apply(
        &self,
        review_id: &ReviewId,
        command: &EditCommand,
    ) -> Result<(EditOutcome, ReviewRecord), ReviewServiceError> {
        let _guard = self
            .edit_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let mut record = self.get(review_id)?;

        let redistribution = self.settings.redistribution;
        let outcome = match record.document.apply(command, redistribution) {
            Ok(outcome) => outcome,
            Err(error) => {
                warn!(review = %review_id, op = command.name(), %error, "edit rejected");
                return Err(error.into());
            }
        };

        if record.status == ReviewStatus::Submitted {
            record.status = ReviewStatus::Open;
            record.submitted_at = None;
        }
        self.repository.update(record.clone())?;

        debug!(
            review = %review_id,
            op = command.name(),
            overall = %record.document.overall_grade_text(),
            "edit applied"
        );
        Ok((outcome, record))
    }

    /// The payload `submit` would send, without sending it.
    pub fn preview(&self, review_id: &ReviewId) -> Result<EvaluationPayload, ReviewServiceError> {
        let record = self.get(review_id)?;
        Ok(record.document.export()?)
    }

    pub fn submit(&self, review_id: &ReviewId) -> Result<SubmissionReceipt, ReviewServiceError> {
        let _guard = self
            .edit_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let mut record = self.get(review_id)?;

        let payload = record.document.export()?;
        self.sink.save(&record.submission_id, &payload)?;

        let submitted_at = Utc::now();
        record.status = ReviewStatus::Submitted;
        record.submitted_at = Some(submitted_at);
        self.repository.update(record.clone())?;

        info!(
            review = %review_id,
            submission = %record.submission_id,
            overall = payload.overall_score,
            "review submitted"
        );
        Ok(SubmissionReceipt {
            review_id: record.review_id,
            submission_id: record.submission_id,
            status: record.status,
            overall_score: payload.overall_score,
            submitted_at,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ReviewServiceError {
    #[error(transparent)]
    Normalization(#[from] NormalizationError),
    #[error(transparent)]
    Edit(#[from] EditError),
    #[error(transparent)]
    Export(#[from] ExportError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Sink(#[from] SinkError),
}
