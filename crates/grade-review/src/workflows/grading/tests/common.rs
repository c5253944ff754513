use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::response::Response;
use serde_json::{json, Value};

use crate::config::ReviewConfig;
use crate::workflows::grading::export::EvaluationPayload;
use crate::workflows::grading::repository::{
    EvaluationSink, RepositoryError, ReviewId, ReviewRecord, ReviewRepository, SinkError,
    SubmissionId,
};
use crate::workflows::grading::{review_router, Redistribution, ReviewService};

pub(super) fn raw_evaluation() -> Value {
    json!({
        "overall_score": 85,
        "problem_breakdown": [
            {
                "problem_description": { "en": "Problem 1: Basic Calculation", "he": "שאלה 1: חישוב בסיסי" },
                "score": 20,
                "max_score": 25,
                "feedback": { "en": "Good work on the basic calculation.", "he": "עבודה טובה על החישוב הבסיסי." },
                "teacher_recommendation": { "en": "Review the calculation steps carefully.", "he": "בדוק את שלבי החישוב בקפידה." },
                "errors": [
                    {
                        "error_type": "calculation_error",
                        "deduction": 5,
                        "explanation": { "en": "Minor calculation error in step 2.", "he": "שגיאת חישוב קטנה בשלב 2." },
                        "hint": { "en": "Double-check your arithmetic.", "he": "בדוק שוב את החשבון שלך." }
                    }
                ]
            },
            {
                "problem_description": { "en": "Problem 2: Word Problem", "he": "שאלה 2: בעיה מילולית" },
                "score": 22,
                "max_score": 25,
                "feedback": { "en": "Excellent understanding of the word problem.", "he": "הבנה מצוינת של הבעיה המילולית." },
                "teacher_recommendation": { "en": "Continue practicing similar problems.", "he": "המשך לתרגל בעיות דומות." },
                "errors": []
            }
        ]
    })
}

pub(super) fn settings() -> ReviewConfig {
    ReviewConfig {
        placeholder_fallback: false,
        redistribution: Redistribution::HalfUp,
    }
}

pub(super) fn submission_id() -> SubmissionId {
    SubmissionId("sub-1042".to_string())
}

pub(super) fn build_service() -> (
    ReviewService<MemoryRepository, MemorySink>,
    Arc<MemoryRepository>,
    Arc<MemorySink>,
) {
    build_service_with(settings())
}

pub(super) fn build_service_with(
    settings: ReviewConfig,
) -> (
    ReviewService<MemoryRepository, MemorySink>,
    Arc<MemoryRepository>,
    Arc<MemorySink>,
) {
    let repository = Arc::new(MemoryRepository::default());
    let sink = Arc::new(MemorySink::default());
    let service = ReviewService::new(repository.clone(), sink.clone(), settings);
    (service, repository, sink)
}

#[derive(Default, Clone)]
pub(super) struct MemoryRepository {
    pub(super) records: Arc<Mutex<HashMap<ReviewId, ReviewRecord>>>,
}

impl ReviewRepository for MemoryRepository {
    fn insert(&self, record: ReviewRecord) -> Result<ReviewRecord, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if guard.contains_key(&record.review_id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(record.review_id.clone(), record.clone());
        Ok(record)
    }

    fn update(&self, record: ReviewRecord) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        guard.insert(record.review_id.clone(), record);
        Ok(())
    }

    fn fetch(&self, id: &ReviewId) -> Result<Option<ReviewRecord>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.get(id).cloned())
    }
}

#[derive(Default, Clone)]
pub(super) struct MemorySink {
    saved: Arc<Mutex<Vec<(SubmissionId, EvaluationPayload)>>>,
}

impl MemorySink {
    pub(super) fn saved(&self) -> Vec<(SubmissionId, EvaluationPayload)> {
        self.saved.lock().expect("sink mutex poisoned").clone()
    }
}

impl EvaluationSink for MemorySink {
    fn save(
        &self,
        submission_id: &SubmissionId,
        payload: &EvaluationPayload,
    ) -> Result<(), SinkError> {
        self.saved
            .lock()
            .expect("sink mutex poisoned")
            .push((submission_id.clone(), payload.clone()));
        Ok(())
    }
}

pub(super) struct OfflineSink;

impl EvaluationSink for OfflineSink {
    fn save(
        &self,
        _submission_id: &SubmissionId,
        _payload: &EvaluationPayload,
    ) -> Result<(), SinkError> {
        Err(SinkError::Transport("connection refused".to_string()))
    }
}

pub(super) struct UnavailableRepository;

impl ReviewRepository for UnavailableRepository {
    fn insert(&self, _record: ReviewRecord) -> Result<ReviewRecord, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn update(&self, _record: ReviewRecord) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _id: &ReviewId) -> Result<Option<ReviewRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

pub(super) fn router_with_service(
    service: ReviewService<MemoryRepository, MemorySink>,
) -> axum::Router {
    review_router(Arc::new(service))
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
