use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::EvaluationDocument;
use super::export::EvaluationPayload;

/// Identifier of a review session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReviewId(pub String);

impl fmt::Display for ReviewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of the student submission under review, as known to the persistence collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubmissionId(pub String);

impl fmt::Display for SubmissionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewStatus {
    Open,
    Submitted,
}

impl ReviewStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Open => "Open",
            Self::Submitted => "Submitted",
        }
    }
}

/// One review session: the document being edited plus lifecycle metadata.
#[derive(Debug, Clone)]
pub struct ReviewRecord {
    pub review_id: ReviewId,
    pub submission_id: SubmissionId,
    pub status: ReviewStatus,
    pub document: EvaluationDocument,
    pub opened_at: DateTime<Utc>,
    pub submitted_at: Option<DateTime<Utc>>,
}

/// Session storage so the service can be exercised against in-memory doubles.
pub trait ReviewRepository: Send + Sync {
    fn insert(&self, record: ReviewRecord) -> Result<ReviewRecord, RepositoryError>;
    fn update(&self, record: ReviewRecord) -> Result<(), RepositoryError>;
    fn fetch(&self, id: &ReviewId) -> Result<Option<ReviewRecord>, RepositoryError>;
}

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("review already exists")]
    Conflict,
    #[error("review not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Outbound persistence hook that stores the exported payload for a submission.
pub trait EvaluationSink: Send + Sync {
    fn save(
        &self,
        submission_id: &SubmissionId,
        payload: &EvaluationPayload,
    ) -> Result<(), SinkError>;
}

#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("evaluation store rejected the payload: {0}")]
    Rejected(String),
    #[error("evaluation store unavailable: {0}")]
    Transport(String),
}

/// Returned once a payload has been handed to the sink.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubmissionReceipt {
    pub review_id: ReviewId,
    pub submission_id: SubmissionId,
    pub status: ReviewStatus,
    pub overall_score: u64,
    pub submitted_at: DateTime<Utc>,
}

/// Lifecycle summary exposed alongside document views.
#[derive(Debug, Clone, Serialize)]
pub struct ReviewSummary {
    pub review_id: ReviewId,
    pub submission_id: SubmissionId,
    pub status: &'static str,
    pub opened_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submitted_at: Option<DateTime<Utc>>,
}

impl ReviewRecord {
    pub fn summary(&self) -> ReviewSummary {
        ReviewSummary {
            review_id: self.review_id.clone(),
            submission_id: self.submission_id.clone(),
            status: self.status.label(),
            opened_at: self.opened_at,
            submitted_at: self.submitted_at,
        }
    }
}
