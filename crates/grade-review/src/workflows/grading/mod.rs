//! Grader review of automated homework evaluations.
//!
//! Raw scoring results are normalized into an [`EvaluationDocument`], edited through
//! validated operations, totalled on demand, and exported as the bilingual payload the
//! evaluation store accepts. [`ReviewService`] wraps a document in a review session.

pub mod aggregate;
pub mod domain;
pub mod edits;
pub mod export;
pub mod ingest;
pub mod placeholder;
pub mod repository;
pub mod router;
pub mod service;
pub mod views;

#[cfg(test)]
mod tests;

pub use aggregate::{aggregate, ScoreTotals};
pub use domain::{
    DocumentSource, ErrorEntry, ErrorId, EvaluationDocument, Problem, ProblemDraft, ProblemId,
    ProblemStatus, DEFAULT_ERROR_KIND,
};
pub use edits::{
    EditCommand, EditError, EditOutcome, ErrorField, GradeInput, GradeViolation, MalformedReason,
    Redistribution, TextField, NEW_ERROR_DEDUCTION,
};
pub use export::{
    export, write_grade_sheet, ErrorPayload, EvaluationPayload, ExportError, LocalizedText,
    ProblemPayload,
};
pub use ingest::{
    normalize, EvaluationImportError, EvaluationImporter, NormalizationError, DEFAULT_MAX_SCORE,
};
pub use placeholder::placeholder_document;
pub use repository::{
    EvaluationSink, RepositoryError, ReviewId, ReviewRecord, ReviewRepository, ReviewStatus,
    ReviewSummary, SinkError, SubmissionId, SubmissionReceipt,
};
pub use router::{error_status, review_router, OpenReviewRequest};
pub use service::{ReviewService, ReviewServiceError, ReviewView};
pub use views::{DocumentView, ErrorView, ProblemView, StudentView};
