use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

use super::edits::EditCommand;
use super::repository::{EvaluationSink, RepositoryError, ReviewId, ReviewRepository, SubmissionId};
use super::service::{ReviewService, ReviewServiceError, ReviewView};
use super::views::StudentView;

/// Body of `POST /api/v1/reviews`.
#[derive(Debug, Clone, Deserialize)]
pub struct OpenReviewRequest {
    pub submission_id: String,
    #[serde(default)]
    pub raw_evaluation: Option<Value>,
    #[serde(default)]
    pub fallback_to_placeholder: Option<bool>,
}

/// Router builder exposing the review session endpoints.
pub fn review_router<R, S>(service: Arc<ReviewService<R, S>>) -> Router
where
    R: ReviewRepository + 'static,
    S: EvaluationSink + 'static,
{
    Router::new()
        .route("/api/v1/reviews", post(open_handler::<R, S>))
        .route("/api/v1/reviews/:review_id", get(review_handler::<R, S>))
        .route(
            "/api/v1/reviews/:review_id/student",
            get(student_handler::<R, S>),
        )
        .route(
            "/api/v1/reviews/:review_id/edits",
            post(edit_handler::<R, S>),
        )
        .route(
            "/api/v1/reviews/:review_id/payload",
            get(payload_handler::<R, S>),
        )
        .route(
            "/api/v1/reviews/:review_id/submit",
            post(submit_handler::<R, S>),
        )
        .with_state(service)
}

/// HTTP status for a failed review operation. Caller mistakes map to 4xx, collaborator
/// failures to 5xx.
pub fn error_status(error: &ReviewServiceError) -> StatusCode {
    match error {
        ReviewServiceError::Normalization(_) => StatusCode::BAD_REQUEST,
        ReviewServiceError::Edit(edit) if edit.is_not_found() => StatusCode::NOT_FOUND,
        ReviewServiceError::Edit(_) => StatusCode::UNPROCESSABLE_ENTITY,
        ReviewServiceError::Export(_) => StatusCode::CONFLICT,
        ReviewServiceError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        ReviewServiceError::Repository(RepositoryError::Conflict) => StatusCode::CONFLICT,
        ReviewServiceError::Repository(RepositoryError::Unavailable(_)) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
        ReviewServiceError::Sink(_) => StatusCode::BAD_GATEWAY,
    }
}

fn error_response(error: ReviewServiceError) -> Response {
    let payload = json!({
        "error": error.to_string(),
    });
    (error_status(&error), axum::Json(payload)).into_response()
}

pub(crate) async fn open_handler<R, S>(
    State(service): State<Arc<ReviewService<R, S>>>,
    axum::Json(request): axum::Json<OpenReviewRequest>,
) -> Response
where
    R: ReviewRepository + 'static,
    S: EvaluationSink + 'static,
{
    let fallback = request
        .fallback_to_placeholder
        .unwrap_or(service.settings().placeholder_fallback);
    let submission_id = SubmissionId(request.submission_id);

    let raw = request.raw_evaluation.as_ref();

    match service.open_with_fallback(submission_id, raw, fallback) {
        Ok(record) => {
            let view = ReviewView::from_record(&record);
            (StatusCode::CREATED, axum::Json(view)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn review_handler<R, S>(
    State(service): State<Arc<ReviewService<R, S>>>,
    Path(review_id): Path<String>,
) -> Response
where
    R: ReviewRepository + 'static,
    S: EvaluationSink + 'static,
{
    match service.get(&ReviewId(review_id)) {
        Ok(record) => {
            let view = ReviewView::from_record(&record);
            (StatusCode::OK, axum::Json(view)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn student_handler<R, S>(
    State(service): State<Arc<ReviewService<R, S>>>,
    Path(review_id): Path<String>,
) -> Response
where
    R: ReviewRepository + 'static,
    S: EvaluationSink + 'static,
{
    match service.get(&ReviewId(review_id)) {
        Ok(record) => {
            let view = StudentView::from_document(&record.document);
            (StatusCode::OK, axum::Json(view)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn edit_handler<R, S>(
    State(service): State<Arc<ReviewService<R, S>>>,
    Path(review_id): Path<String>,
    axum::Json(command): axum::Json<EditCommand>,
) -> Response
where
    R: ReviewRepository + 'static,
    S: EvaluationSink + 'static,
{
    match service.apply(&ReviewId(review_id), &command) {
        Ok((outcome, record)) => {
            let payload = json!({
                "outcome": outcome,
                "review": ReviewView::from_record(&record),
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn payload_handler<R, S>(
    State(service): State<Arc<ReviewService<R, S>>>,
    Path(review_id): Path<String>,
) -> Response
where
    R: ReviewRepository + 'static,
    S: EvaluationSink + 'static,
{
    match service.preview(&ReviewId(review_id)) {
        Ok(payload) => (StatusCode::OK, axum::Json(payload)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn submit_handler<R, S>(
    State(service): State<Arc<ReviewService<R, S>>>,
    Path(review_id): Path<String>,
) -> Response
where
    R: ReviewRepository + 'static,
    S: EvaluationSink + 'static,
{
    match service.submit(&ReviewId(review_id)) {
        Ok(receipt) => (StatusCode::OK, axum::Json(receipt)).into_response(),
        Err(error) => error_response(error),
    }
}
