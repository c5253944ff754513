use serde::{Deserialize, Serialize};
use std::fmt;

use super::edits::EditError;

/// Identifier of a problem within one document. Assigned once and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProblemId(pub u32);

impl fmt::Display for ProblemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of an error entry, unique within its owning problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ErrorId(pub u64);

impl fmt::Display for ErrorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where a document came from. Placeholder documents are never exportable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentSource {
    Ingested,
    Manual,
    Placeholder,
}

impl DocumentSource {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Ingested => "Scoring Assistant",
            Self::Manual => "Manual",
            Self::Placeholder => "Placeholder",
        }
    }

    pub const fn is_exportable(self) -> bool {
        !matches!(self, Self::Placeholder)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProblemStatus {
    Correct,
    Partial,
    Incorrect,
}

impl ProblemStatus {
    /// `Correct` iff earned == possible, `Incorrect` iff earned == 0, otherwise `Partial`.
    pub const fn from_scores(earned: u32, possible: u32) -> Self {
        if earned == possible {
            Self::Correct
        } else if earned == 0 {
            Self::Incorrect
        } else {
            Self::Partial
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Correct => "Correct",
            Self::Partial => "Partial",
            Self::Incorrect => "Incorrect",
        }
    }
}

pub const DEFAULT_ERROR_KIND: &str = "calculation_error";

/// One annotated mistake. `points_deducted` is informational and never applied to the score.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorEntry {
    pub(crate) id: ErrorId,
    pub(crate) kind: String,
    pub(crate) description: String,
    pub(crate) hint: String,
    pub(crate) points_deducted: f64,
}

impl ErrorEntry {
    pub(crate) fn new(
        id: ErrorId,
        kind: impl Into<String>,
        description: impl Into<String>,
        hint: impl Into<String>,
        points_deducted: f64,
    ) -> Self {
        Self {
            id,
            kind: kind.into(),
            description: description.into(),
            hint: hint.into(),
            points_deducted: sanitize_deduction(points_deducted),
        }
    }

    pub fn id(&self) -> ErrorId {
        self.id
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn hint(&self) -> &str {
        &self.hint
    }

    pub fn points_deducted(&self) -> f64 {
        self.points_deducted
    }
}

pub(crate) fn sanitize_deduction(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

/// One graded sub-question. Holds `0 <= score_earned <= score_possible` and `score_possible > 0`.
#[derive(Debug, Clone, PartialEq)]
pub struct Problem {
    pub(crate) id: ProblemId,
    pub(crate) title: String,
    pub(crate) score_earned: u32,
    pub(crate) score_possible: u32,
    pub(crate) student_feedback: String,
    pub(crate) teacher_notes: String,
    pub(crate) errors: Vec<ErrorEntry>,
    pub(crate) expanded: bool,
    next_error_id: u64,
}

impl Problem {
    pub(crate) fn new(
        id: ProblemId,
        title: impl Into<String>,
        score_earned: u32,
        score_possible: u32,
    ) -> Self {
        debug_assert!(score_possible > 0 && score_earned <= score_possible);
        Self {
            id,
            title: title.into(),
            score_earned,
            score_possible,
            student_feedback: String::new(),
            teacher_notes: String::new(),
            errors: Vec::new(),
            expanded: true,
            next_error_id: 1,
        }
    }

    pub(crate) fn with_feedback(
        mut self,
        student_feedback: impl Into<String>,
        teacher_notes: impl Into<String>,
    ) -> Self {
        self.student_feedback = student_feedback.into();
        self.teacher_notes = teacher_notes.into();
        self
    }

    /// Appends an entry carrying an explicit id and keeps the id counter ahead of it.
    pub(crate) fn push_error(&mut self, entry: ErrorEntry) {
        self.next_error_id = self.next_error_id.max(entry.id.0.saturating_add(1));
        self.errors.push(entry);
    }

    /// Hands out the next error id. Ids only ever increase, so removed ids are not reissued.
    pub(crate) fn allocate_error_id(&mut self) -> ErrorId {
        let id = ErrorId(self.next_error_id);
        self.next_error_id = self.next_error_id.saturating_add(1);
        id
    }

    pub fn id(&self) -> ProblemId {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn score_earned(&self) -> u32 {
        self.score_earned
    }

    pub fn score_possible(&self) -> u32 {
        self.score_possible
    }

    pub fn status(&self) -> ProblemStatus {
        ProblemStatus::from_scores(self.score_earned, self.score_possible)
    }

    pub fn student_feedback(&self) -> &str {
        &self.student_feedback
    }

    pub fn teacher_notes(&self) -> &str {
        &self.teacher_notes
    }

    pub fn errors(&self) -> &[ErrorEntry] {
        &self.errors
    }

    pub fn error(&self, id: ErrorId) -> Option<&ErrorEntry> {
        self.errors.iter().find(|entry| entry.id == id)
    }

    pub fn expanded(&self) -> bool {
        self.expanded
    }
}

/// Title and possible points for a manually authored problem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProblemDraft {
    pub title: String,
    pub score_possible: u32,
}

/// Editable grading result for one submission.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationDocument {
    pub(crate) source: DocumentSource,
    pub(crate) reported_overall: Option<f64>,
    pub(crate) problems: Vec<Problem>,
}

impl EvaluationDocument {
    pub(crate) fn from_problems(
        source: DocumentSource,
        reported_overall: Option<f64>,
        problems: Vec<Problem>,
    ) -> Self {
        Self {
            source,
            reported_overall,
            problems,
        }
    }

    /// Builds a grader-authored document with every problem starting at zero earned points.
    pub fn manual(drafts: Vec<ProblemDraft>) -> Result<Self, EditError> {
        let mut problems = Vec::with_capacity(drafts.len());
        for (index, draft) in drafts.into_iter().enumerate() {
            if draft.score_possible == 0 {
                return Err(EditError::invalid_grade(
                    0,
                    0,
                    super::edits::GradeViolation::NonPositivePossible,
                ));
            }
            let id = ProblemId(index as u32 + 1);
            problems.push(Problem::new(id, draft.title, 0, draft.score_possible));
        }

        Ok(Self::from_problems(DocumentSource::Manual, None, problems))
    }

    pub fn source(&self) -> DocumentSource {
        self.source
    }

    pub fn is_placeholder(&self) -> bool {
        self.source == DocumentSource::Placeholder
    }

    /// Overall score reported by the scoring assistant at ingestion time. Informational only.
    pub fn reported_overall(&self) -> Option<f64> {
        self.reported_overall
    }

    pub fn problems(&self) -> &[Problem] {
        &self.problems
    }

    pub fn problem(&self, id: ProblemId) -> Option<&Problem> {
        self.problems.iter().find(|problem| problem.id == id)
    }

    pub(crate) fn problem_mut(&mut self, id: ProblemId) -> Result<&mut Problem, EditError> {
        self.problems
            .iter_mut()
            .find(|problem| problem.id == id)
            .ok_or(EditError::ProblemNotFound(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_follows_scores() {
        assert_eq!(ProblemStatus::from_scores(17, 17), ProblemStatus::Correct);
        assert_eq!(ProblemStatus::from_scores(0, 17), ProblemStatus::Incorrect);
        assert_eq!(ProblemStatus::from_scores(12, 17), ProblemStatus::Partial);
    }

    #[test]
    fn pushed_errors_keep_counter_ahead() {
        let mut problem = Problem::new(ProblemId(1), "Probability", 12, 17);
        let entry = ErrorEntry::new(ErrorId(4), "calculation_error", "", "", 3.0);
        problem.push_error(entry);
        assert_eq!(problem.allocate_error_id(), ErrorId(5));
        assert_eq!(problem.allocate_error_id(), ErrorId(6));
    }

    #[test]
    fn negative_deductions_are_zeroed() {
        let entry = ErrorEntry::new(ErrorId(1), "sign_error", "", "", -2.0);
        assert_eq!(entry.points_deducted(), 0.0);
        let entry = ErrorEntry::new(ErrorId(2), "sign_error", "", "", f64::NAN);
        assert_eq!(entry.points_deducted(), 0.0);
    }

    #[test]
    fn manual_documents_start_at_zero() {
        let document = EvaluationDocument::manual(vec![
            ProblemDraft {
                title: "Limits".to_string(),
                score_possible: 10,
            },
            ProblemDraft {
                title: "Derivatives".to_string(),
                score_possible: 15,
            },
        ])
        .expect("drafts are valid");

        assert_eq!(document.source(), DocumentSource::Manual);
        assert_eq!(document.problems().len(), 2);
        assert_eq!(document.problems()[1].id(), ProblemId(2));
        assert!(document
            .problems()
            .iter()
            .all(|problem| problem.status() == ProblemStatus::Incorrect));
    }

    #[test]
    fn manual_documents_reject_zero_possible() {
        let error = EvaluationDocument::manual(vec![ProblemDraft {
            title: "Empty".to_string(),
            score_possible: 0,
        }])
        .expect_err("zero possible rejected");
        assert!(matches!(error, EditError::InvalidGrade { .. }));
    }
}
