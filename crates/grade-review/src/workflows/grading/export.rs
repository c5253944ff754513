//! Projection of a reviewed document into the persistence payload.
//!
//! Text is stored once and mirrored into both language keys here. Review-session fields
//! (ids, expansion, derived status) never leave the crate through this shape.

use serde::{Deserialize, Serialize};
use std::io::Write;

use super::domain::{DocumentSource, ErrorEntry, EvaluationDocument, Problem, ProblemStatus};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalizedText {
    pub en: String,
    pub he: String,
}

impl LocalizedText {
    /// Both language keys carry the same value.
    pub fn mirrored(value: &str) -> Self {
        Self {
            en: value.to_string(),
            he: value.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationPayload {
    /// Aggregate earned points at export time.
    pub overall_score: u64,
    pub problem_breakdown: Vec<ProblemPayload>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProblemPayload {
    pub problem_description: LocalizedText,
    pub score: u32,
    pub max_score: u32,
    pub feedback: LocalizedText,
    pub teacher_recommendation: LocalizedText,
    pub errors: Vec<ErrorPayload>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub description: LocalizedText,
    /// Carries the error kind. The field name is part of the stored schema.
    pub location: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ExportError {
    #[error("refusing to export a {} document", .origin.label())]
    Refused { origin: DocumentSource },
}

pub fn export(document: &EvaluationDocument) -> Result<EvaluationPayload, ExportError> {
    if !document.source().is_exportable() {
        return Err(ExportError::Refused {
            origin: document.source(),
        });
    }

    Ok(EvaluationPayload {
        overall_score: document.totals().earned,
        problem_breakdown: document.problems().iter().map(problem_payload).collect(),
    })
}

impl EvaluationDocument {
    pub fn export(&self) -> Result<EvaluationPayload, ExportError> {
        export(self)
    }
}

fn problem_payload(problem: &Problem) -> ProblemPayload {
    ProblemPayload {
        problem_description: LocalizedText::mirrored(problem.title()),
        score: problem.score_earned(),
        max_score: problem.score_possible(),
        feedback: LocalizedText::mirrored(problem.student_feedback()),
        teacher_recommendation: LocalizedText::mirrored(problem.teacher_notes()),
        errors: problem.errors().iter().map(error_payload).collect(),
    }
}

fn error_payload(entry: &ErrorEntry) -> ErrorPayload {
    ErrorPayload {
        description: LocalizedText::mirrored(entry.description()),
        location: entry.kind().to_string(),
    }
}

#[derive(Debug, Serialize)]
struct GradeSheetRow<'a> {
    question: usize,
    title: &'a str,
    score: u32,
    max_score: u32,
    status: &'static str,
}

/// Writes one CSV row per problem of an exported payload.
pub fn write_grade_sheet<W: Write>(
    writer: W,
    payload: &EvaluationPayload,
) -> Result<(), csv::Error> {
    let mut csv_writer = csv::WriterBuilder::new()
        .has_headers(true)
        .from_writer(writer);

    for (index, problem) in payload.problem_breakdown.iter().enumerate() {
        let status = ProblemStatus::from_scores(problem.score, problem.max_score);
        csv_writer.serialize(GradeSheetRow {
            question: index + 1,
            title: &problem.problem_description.en,
            score: problem.score,
            max_score: problem.max_score,
            status: status.label(),
        })?;
    }

    csv_writer.flush()?;
    Ok(())
}
