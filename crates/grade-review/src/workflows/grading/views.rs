use serde::Serialize;

use super::aggregate::ScoreTotals;
use super::domain::{
    DocumentSource, ErrorEntry, ErrorId, EvaluationDocument, Problem, ProblemId, ProblemStatus,
};

/// Grader-facing projection of a document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentView {
    pub source: DocumentSource,
    pub source_label: &'static str,
    pub totals: ScoreTotals,
    pub overall_grade: String,
    pub percentage: Option<f64>,
    pub reported_overall: Option<f64>,
    pub problems: Vec<ProblemView>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProblemView {
    pub id: ProblemId,
    pub label: String,
    pub title: String,
    pub score: u32,
    pub max_score: u32,
    pub status: ProblemStatus,
    pub status_label: &'static str,
    pub student_feedback: String,
    pub teacher_notes: String,
    pub expanded: bool,
    pub errors: Vec<ErrorView>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorView {
    pub id: ErrorId,
    pub kind: String,
    pub description: String,
    pub hint: String,
    pub points_deducted: f64,
}

/// What the learner sees once grading is released. Carries no teacher notes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudentView {
    pub totals: ScoreTotals,
    pub problems: Vec<StudentProblemView>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudentProblemView {
    pub label: String,
    pub title: String,
    pub score: u32,
    pub max_score: u32,
    pub status: ProblemStatus,
    pub feedback: String,
    pub errors: Vec<StudentErrorView>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StudentErrorView {
    pub description: String,
    pub hint: String,
}

impl DocumentView {
    pub fn from_document(document: &EvaluationDocument) -> Self {
        let totals = document.totals();
        Self {
            source: document.source(),
            source_label: document.source().label(),
            totals,
            overall_grade: document.overall_grade_text(),
            percentage: totals.percentage(),
            reported_overall: document.reported_overall(),
            problems: document
                .problems()
                .iter()
                .map(ProblemView::from_problem)
                .collect(),
        }
    }
}

impl ProblemView {
    fn from_problem(problem: &Problem) -> Self {
        let status = problem.status();
        Self {
            id: problem.id(),
            label: question_label(problem.id()),
            title: problem.title().to_string(),
            score: problem.score_earned(),
            max_score: problem.score_possible(),
            status,
            status_label: status.label(),
            student_feedback: problem.student_feedback().to_string(),
            teacher_notes: problem.teacher_notes().to_string(),
            expanded: problem.expanded(),
            errors: problem.errors().iter().map(ErrorView::from_entry).collect(),
        }
    }
}

impl ErrorView {
    fn from_entry(entry: &ErrorEntry) -> Self {
        Self {
            id: entry.id(),
            kind: entry.kind().to_string(),
            description: entry.description().to_string(),
            hint: entry.hint().to_string(),
            points_deducted: entry.points_deducted(),
        }
    }
}

impl StudentView {
    pub fn from_document(document: &EvaluationDocument) -> Self {
        Self {
            totals: document.totals(),
            problems: document
                .problems()
                .iter()
                .map(|problem| StudentProblemView {
                    label: question_label(problem.id()),
                    title: problem.title().to_string(),
                    score: problem.score_earned(),
                    max_score: problem.score_possible(),
                    status: problem.status(),
                    feedback: problem.student_feedback().to_string(),
                    errors: problem
                        .errors()
                        .iter()
                        .map(|entry| StudentErrorView {
                            description: entry.description().to_string(),
                            hint: entry.hint().to_string(),
                        })
                        .collect(),
                })
                .collect(),
        }
    }
}

fn question_label(id: ProblemId) -> String {
    format!("Question {id}")
}
