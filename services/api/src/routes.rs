use crate::infra::AppState;
use axum::extract::Path;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use grade_review::workflows::grading::{
    review_router, EvaluationSink, ReviewRepository, ReviewService, SubmissionId,
};
use serde_json::json;
use std::sync::Arc;

pub(crate) fn with_review_routes<R, S>(service: Arc<ReviewService<R, S>>) -> axum::Router
where
    R: ReviewRepository + 'static,
    S: EvaluationSink + 'static,
{
    review_router(service)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
        .route(
            "/api/v1/evaluations/:submission_id",
            axum::routing::get(stored_evaluation_endpoint),
        )
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

/// Read side of the in-memory evaluation store, so a submitted grade can be checked.
pub(crate) async fn stored_evaluation_endpoint(
    Extension(state): Extension<AppState>,
    Path(submission_id): Path<String>,
) -> impl IntoResponse {
    let submission_id = SubmissionId(submission_id);
    match state.evaluations.get(&submission_id) {
        Some(stored) => (StatusCode::OK, Json(json!(stored))),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({
                "error": format!("no evaluation stored for submission {submission_id}"),
            })),
        ),
    }
}
