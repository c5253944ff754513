use super::common::*;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use crate::workflows::grading::{review_router, ReviewService};

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("request builds")
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("request builds")
}

async fn open_review(router: &axum::Router, raw: Value) -> String {
    let response = router
        .clone()
        .oneshot(post_json(
            "/api/v1/reviews",
            json!({ "submission_id": "sub-1042", "raw_evaluation": raw }),
        ))
        .await
        .expect("router responds");
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = read_json_body(response).await;
    body["review_id"].as_str().expect("review id").to_string()
}

#[tokio::test]
async fn open_returns_document_view() {
    let (service, _, _) = build_service();
    let router = router_with_service(service);

    let response = router
        .oneshot(post_json(
            "/api/v1/reviews",
            json!({ "submission_id": "sub-1042", "raw_evaluation": raw_evaluation() }),
        ))
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = read_json_body(response).await;
    assert_eq!(body["status"], "Open");
    assert_eq!(body["submission_id"], "sub-1042");
    assert_eq!(body["document"]["source"], "ingested");
    assert_eq!(body["document"]["overall_grade"], "42/50");
    assert_eq!(body["document"]["problems"][0]["label"], "Question 1");
    assert_eq!(body["document"]["problems"][0]["status"], "partial");
}

#[tokio::test]
async fn open_rejects_unreadable_evaluation() {
    let (service, _, _) = build_service();
    let router = router_with_service(service);

    let response = router
        .oneshot(post_json(
            "/api/v1/reviews",
            json!({ "submission_id": "sub-1042", "raw_evaluation": { "problem_breakdown": 7 } }),
        ))
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = read_json_body(response).await;
    assert!(body["error"]
        .as_str()
        .expect("error message")
        .contains("problem_breakdown"));
}

#[tokio::test]
async fn open_honours_request_fallback() {
    let (service, _, _) = build_service();
    let router = router_with_service(service);

    let response = router
        .oneshot(post_json(
            "/api/v1/reviews",
            json!({
                "submission_id": "sub-1042",
                "raw_evaluation": "garbage",
                "fallback_to_placeholder": true
            }),
        ))
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = read_json_body(response).await;
    assert_eq!(body["document"]["source"], "placeholder");
}

#[tokio::test]
async fn edits_update_the_review() {
    let (service, _, _) = build_service();
    let router = router_with_service(service);
    let review_id = open_review(&router, raw_evaluation()).await;

    let response = router
        .clone()
        .oneshot(post_json(
            &format!("/api/v1/reviews/{review_id}/edits"),
            json!({ "op": "set_problem_grade", "problem_id": 1, "grade": "25/25" }),
        ))
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["outcome"]["result"], "updated");
    assert_eq!(
        body["review"]["document"]["problems"][0]["status"],
        "correct"
    );
    assert_eq!(body["review"]["document"]["overall_grade"], "47/50");
}

#[tokio::test]
async fn edit_errors_map_to_client_statuses() {
    let (service, _, _) = build_service();
    let router = router_with_service(service);
    let review_id = open_review(&router, raw_evaluation()).await;
    let uri = format!("/api/v1/reviews/{review_id}/edits");

    let cases = [
        (
            json!({ "op": "set_overall_grade", "grade": "abc" }),
            StatusCode::UNPROCESSABLE_ENTITY,
        ),
        (
            json!({ "op": "set_problem_grade", "problem_id": 1, "grade": "26/25" }),
            StatusCode::UNPROCESSABLE_ENTITY,
        ),
        (
            json!({ "op": "remove_error", "problem_id": 1, "error_id": 99 }),
            StatusCode::NOT_FOUND,
        ),
        (
            json!({ "op": "toggle_expanded", "problem_id": 12 }),
            StatusCode::NOT_FOUND,
        ),
    ];

    for (command, expected) in cases {
        let response = router
            .clone()
            .oneshot(post_json(&uri, command.clone()))
            .await
            .expect("router responds");
        assert_eq!(response.status(), expected, "command {command}");
    }
}

#[tokio::test]
async fn student_view_hides_teacher_notes() {
    let (service, _, _) = build_service();
    let router = router_with_service(service);
    let review_id = open_review(&router, raw_evaluation()).await;

    let response = router
        .oneshot(get(&format!("/api/v1/reviews/{review_id}/student")))
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    let rendered = body.to_string();
    assert!(!rendered.contains("Review the calculation steps"));
    assert_eq!(
        body["problems"][0]["errors"][0]["hint"],
        "Double-check your arithmetic."
    );
}

#[tokio::test]
async fn payload_and_submit_use_export_shape() {
    let (service, _, sink) = build_service();
    let router = router_with_service(service);
    let review_id = open_review(&router, raw_evaluation()).await;

    let response = router
        .clone()
        .oneshot(get(&format!("/api/v1/reviews/{review_id}/payload")))
        .await
        .expect("router responds");
    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["overall_score"], 42);
    assert_eq!(
        payload["problem_breakdown"][0]["errors"][0],
        json!({
            "description": {
                "en": "Minor calculation error in step 2.",
                "he": "Minor calculation error in step 2."
            },
            "location": "calculation_error"
        })
    );

    let response = router
        .oneshot(post_json(
            &format!("/api/v1/reviews/{review_id}/submit"),
            json!({}),
        ))
        .await
        .expect("router responds");
    assert_eq!(response.status(), StatusCode::OK);
    let receipt = read_json_body(response).await;
    assert_eq!(receipt["status"], "submitted");
    assert_eq!(receipt["overall_score"], 42);
    assert_eq!(sink.saved().len(), 1);
}

#[tokio::test]
async fn placeholder_submit_is_a_conflict() {
    let (service, _, sink) = build_service();
    let router = router_with_service(service);
    let review_id = open_review(&router, Value::Null).await;

    let response = router
        .oneshot(post_json(
            &format!("/api/v1/reviews/{review_id}/submit"),
            json!({}),
        ))
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert!(sink.saved().is_empty());
}

#[tokio::test]
async fn unknown_review_is_not_found() {
    let (service, _, _) = build_service();
    let router = router_with_service(service);

    let response = router
        .oneshot(get("/api/v1/reviews/rev-999999"))
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn sink_failure_is_a_bad_gateway() {
    let service = ReviewService::new(
        Arc::new(MemoryRepository::default()),
        Arc::new(OfflineSink),
        settings(),
    );
    let router = review_router(Arc::new(service));
    let review_id = open_review(&router, raw_evaluation()).await;

    let response = router
        .oneshot(post_json(
            &format!("/api/v1/reviews/{review_id}/submit"),
            json!({}),
        ))
        .await
        .expect("router responds");

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn repository_outage_is_an_internal_error() {
    let service = ReviewService::new(
        Arc::new(UnavailableRepository),
        Arc::new(MemorySink::default()),
        settings(),
    );
    let response = crate::workflows::grading::router::open_handler::<
        UnavailableRepository,
        MemorySink,
    >(
        axum::extract::State(Arc::new(service)),
        axum::Json(
            serde_json::from_value(json!({ "submission_id": "sub-1042" }))
                .expect("request parses"),
        ),
    )
    .await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}
