use chrono::{DateTime, Utc};
use grade_review::workflows::grading::{
    EvaluationPayload, EvaluationSink, RepositoryError, ReviewId, ReviewRecord, ReviewRepository,
    SinkError, SubmissionId,
};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
    pub(crate) evaluations: Arc<InMemoryEvaluationSink>,
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryReviewRepository {
    records: Arc<Mutex<HashMap<ReviewId, ReviewRecord>>>,
}

impl ReviewRepository for InMemoryReviewRepository {
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
        if guard.contains_key(&record.review_id) {
            guard.insert(record.review_id.clone(), record);
            Ok(())
        } else {
            Err(RepositoryError::NotFound)
        }
    }

    fn fetch(&self, id: &ReviewId) -> Result<Option<ReviewRecord>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.get(id).cloned())
    }
}

/// Last payload stored for a submission.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct StoredEvaluation {
    pub(crate) submission_id: SubmissionId,
    pub(crate) stored_at: DateTime<Utc>,
    pub(crate) evaluation: EvaluationPayload,
}

/// Keeps the latest payload per submission; a re-submit overwrites the previous one.
#[derive(Default, Clone)]
pub(crate) struct InMemoryEvaluationSink {
    evaluations: Arc<Mutex<HashMap<SubmissionId, StoredEvaluation>>>,
}

impl EvaluationSink for InMemoryEvaluationSink {
    fn save(
        &self,
        submission_id: &SubmissionId,
        payload: &EvaluationPayload,
    ) -> Result<(), SinkError> {
        let mut guard = self.evaluations.lock().expect("sink mutex poisoned");
        guard.insert(
            submission_id.clone(),
            StoredEvaluation {
                submission_id: submission_id.clone(),
                stored_at: Utc::now(),
                evaluation: payload.clone(),
            },
        );
        Ok(())
    }
}

impl InMemoryEvaluationSink {
    pub(crate) fn get(&self, submission_id: &SubmissionId) -> Option<StoredEvaluation> {
        self.evaluations
            .lock()
            .expect("sink mutex poisoned")
            .get(submission_id)
            .cloned()
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.evaluations.lock().expect("sink mutex poisoned").len()
    }
}
