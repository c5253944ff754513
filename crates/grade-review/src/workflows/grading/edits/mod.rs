//! Grader edits over an [`EvaluationDocument`].
//!
//! Every operation validates before it mutates: a rejected edit returns an [`EditError`]
//! and leaves the document exactly as it was.

mod grade_input;
mod redistribution;

pub use grade_input::GradeInput;
pub use redistribution::Redistribution;

use serde::{Deserialize, Serialize};

use super::domain::{
    sanitize_deduction, ErrorEntry, ErrorId, EvaluationDocument, ProblemId, DEFAULT_ERROR_KIND,
};

/// Points recorded on an error added during review.
pub const NEW_ERROR_DEDUCTION: f64 = 1.0;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EditError {
    #[error("problem {0} not found")]
    ProblemNotFound(ProblemId),
    #[error("error {error_id} not found on problem {problem_id}")]
    ErrorNotFound {
        problem_id: ProblemId,
        error_id: ErrorId,
    },
    #[error("invalid grade {earned}/{possible}: {violation}")]
    InvalidGrade {
        earned: i64,
        possible: i64,
        violation: GradeViolation,
    },
    #[error("malformed grade '{input}': {reason}")]
    MalformedInput {
        input: String,
        reason: MalformedReason,
    },
}

impl EditError {
    pub(crate) fn invalid_grade(earned: i64, possible: i64, violation: GradeViolation) -> Self {
        Self::InvalidGrade {
            earned,
            possible,
            violation,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ProblemNotFound(_) | Self::ErrorNotFound { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum GradeViolation {
    #[error("earned points cannot be negative")]
    NegativeEarned,
    #[error("possible points must be greater than zero")]
    NonPositivePossible,
    #[error("earned points exceed possible points")]
    EarnedExceedsPossible,
    #[error("points exceed the supported range")]
    OutOfRange,
    #[error("possible total is derived from the problems and must stay {expected}")]
    PossibleMismatch { expected: u64 },
    #[error("document has no possible points to redistribute")]
    NothingToRedistribute,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum MalformedReason {
    #[error("expected earned/possible, e.g. 85/100")]
    MissingSeparator,
    #[error("more than one '/' separator")]
    TooManySeparators,
    #[error("earned points are not a whole number")]
    Earned,
    #[error("possible points are not a whole number")]
    Possible,
}

/// Free-text fields of a problem. The two are independent: editing one never touches the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextField {
    StudentFeedback,
    TeacherNotes,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorField {
    Kind,
    Description,
    Hint,
    PointsDeducted,
}

/// An edit expressed as data, as dispatched by the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum EditCommand {
    ToggleExpanded {
        problem_id: ProblemId,
    },
    SetProblemText {
        problem_id: ProblemId,
        field: TextField,
        value: String,
    },
    AddError {
        problem_id: ProblemId,
    },
    UpdateError {
        problem_id: ProblemId,
        error_id: ErrorId,
        field: ErrorField,
        value: String,
    },
    RemoveError {
        problem_id: ProblemId,
        error_id: ErrorId,
    },
    SetProblemGrade {
        problem_id: ProblemId,
        grade: String,
    },
    SetOverallGrade {
        grade: String,
    },
}

impl EditCommand {
    pub const fn name(&self) -> &'static str {
        match self {
            Self::ToggleExpanded { .. } => "toggle_expanded",
            Self::SetProblemText { .. } => "set_problem_text",
            Self::AddError { .. } => "add_error",
            Self::UpdateError { .. } => "update_error",
            Self::RemoveError { .. } => "remove_error",
            Self::SetProblemGrade { .. } => "set_problem_grade",
            Self::SetOverallGrade { .. } => "set_overall_grade",
        }
    }

    pub const fn changes_scores(&self) -> bool {
        matches!(
            self,
            Self::SetProblemGrade { .. } | Self::SetOverallGrade { .. }
        )
    }
}

/// What an applied command produced, for callers that need the new id or flag.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum EditOutcome {
    Updated,
    Expanded { expanded: bool },
    ErrorAdded { error_id: ErrorId },
}

impl EvaluationDocument {
    pub fn toggle_expanded(&mut self, problem_id: ProblemId) -> Result<bool, EditError> {
        let problem = self.problem_mut(problem_id)?;
        problem.expanded = !problem.expanded;
        Ok(problem.expanded)
    }

    pub fn set_problem_text(
        &mut self,
        problem_id: ProblemId,
        field: TextField,
        value: impl Into<String>,
    ) -> Result<(), EditError> {
        let problem = self.problem_mut(problem_id)?;
        let value = value.into();
        match field {
            TextField::StudentFeedback => problem.student_feedback = value,
            TextField::TeacherNotes => problem.teacher_notes = value,
        }
        Ok(())
    }

    /// Appends a blank error with a fresh id. The problem score is not touched.
    pub fn add_error(&mut self, problem_id: ProblemId) -> Result<ErrorId, EditError> {
        let problem = self.problem_mut(problem_id)?;
        let id = problem.allocate_error_id();
        let entry = ErrorEntry::new(id, DEFAULT_ERROR_KIND, "", "", NEW_ERROR_DEDUCTION);
        problem.errors.push(entry);
        Ok(id)
    }

    /// Replaces one field. Deductions parse permissively: anything that is not a
    /// non-negative number becomes 0.
    pub fn update_error(
        &mut self,
        problem_id: ProblemId,
        error_id: ErrorId,
        field: ErrorField,
        value: &str,
    ) -> Result<(), EditError> {
        let problem = self.problem_mut(problem_id)?;
        let entry = problem
            .errors
            .iter_mut()
            .find(|entry| entry.id == error_id)
            .ok_or(EditError::ErrorNotFound {
                problem_id,
                error_id,
            })?;

        match field {
            ErrorField::Kind => entry.kind = value.to_string(),
            ErrorField::Description => entry.description = value.to_string(),
            ErrorField::Hint => entry.hint = value.to_string(),
            ErrorField::PointsDeducted => entry.points_deducted = parse_deduction(value),
        }
        Ok(())
    }

    pub fn remove_error(
        &mut self,
        problem_id: ProblemId,
        error_id: ErrorId,
    ) -> Result<ErrorEntry, EditError> {
        let problem = self.problem_mut(problem_id)?;
        let position = problem
            .errors
            .iter()
            .position(|entry| entry.id == error_id)
            .ok_or(EditError::ErrorNotFound {
                problem_id,
                error_id,
            })?;
        Ok(problem.errors.remove(position))
    }

    pub fn set_problem_score(
        &mut self,
        problem_id: ProblemId,
        earned: i64,
        possible: i64,
    ) -> Result<(), EditError> {
        let (earned, possible) = validate_grade(earned, possible)?;
        let problem = self.problem_mut(problem_id)?;
        problem.score_earned = earned;
        problem.score_possible = possible;
        Ok(())
    }

    pub fn set_problem_grade(
        &mut self,
        problem_id: ProblemId,
        grade: &str,
    ) -> Result<(), EditError> {
        let GradeInput { earned, possible } = GradeInput::parse(grade)?;
        self.set_problem_score(problem_id, earned, possible)
    }

    /// Spreads `earned_total` across every problem in proportion to its possible points.
    /// The possible total is derived, so `possible_total` must equal the current aggregate.
    pub fn set_overall_score(
        &mut self,
        earned_total: i64,
        possible_total: i64,
        policy: Redistribution,
    ) -> Result<(), EditError> {
        let current = self.totals();
        if current.possible == 0 {
            return Err(EditError::invalid_grade(
                earned_total,
                possible_total,
                GradeViolation::NothingToRedistribute,
            ));
        }

        check_bounds(earned_total, possible_total)?;
        if possible_total as u64 != current.possible {
            return Err(EditError::invalid_grade(
                earned_total,
                possible_total,
                GradeViolation::PossibleMismatch {
                    expected: current.possible,
                },
            ));
        }

        let possibles: Vec<u32> = self
            .problems
            .iter()
            .map(|problem| problem.score_possible)
            .collect();
        let shares = policy.redistribute(earned_total as u64, &possibles);
        for (problem, share) in self.problems.iter_mut().zip(shares) {
            problem.score_earned = share;
        }
        Ok(())
    }

    pub fn set_overall_grade(
        &mut self,
        grade: &str,
        policy: Redistribution,
    ) -> Result<(), EditError> {
        let GradeInput { earned, possible } = GradeInput::parse(grade)?;
        self.set_overall_score(earned, possible, policy)
    }

    /// Text shown in the overall grade editor before the grader types.
    pub fn overall_grade_text(&self) -> String {
        let totals = self.totals();
        format!("{}/{}", totals.earned, totals.possible)
    }

    pub fn apply(
        &mut self,
        command: &EditCommand,
        policy: Redistribution,
    ) -> Result<EditOutcome, EditError> {
        match command {
            EditCommand::ToggleExpanded { problem_id } => {
                let expanded = self.toggle_expanded(*problem_id)?;
                Ok(EditOutcome::Expanded { expanded })
            }
            EditCommand::SetProblemText {
                problem_id,
                field,
                value,
            } => {
                self.set_problem_text(*problem_id, *field, value.as_str())?;
                Ok(EditOutcome::Updated)
            }
            EditCommand::AddError { problem_id } => {
                let error_id = self.add_error(*problem_id)?;
                Ok(EditOutcome::ErrorAdded { error_id })
            }
            EditCommand::UpdateError {
                problem_id,
                error_id,
                field,
                value,
            } => {
                self.update_error(*problem_id, *error_id, *field, value)?;
                Ok(EditOutcome::Updated)
            }
            EditCommand::RemoveError {
                problem_id,
                error_id,
            } => {
                self.remove_error(*problem_id, *error_id)?;
                Ok(EditOutcome::Updated)
            }
            EditCommand::SetProblemGrade { problem_id, grade } => {
                self.set_problem_grade(*problem_id, grade)?;
                Ok(EditOutcome::Updated)
            }
            EditCommand::SetOverallGrade { grade } => {
                self.set_overall_grade(grade, policy)?;
                Ok(EditOutcome::Updated)
            }
        }
    }
}

fn check_bounds(earned: i64, possible: i64) -> Result<(), EditError> {
    let violation = if possible <= 0 {
        GradeViolation::NonPositivePossible
    } else if earned < 0 {
        GradeViolation::NegativeEarned
    } else if earned > possible {
        GradeViolation::EarnedExceedsPossible
    } else {
        return Ok(());
    };
    Err(EditError::invalid_grade(earned, possible, violation))
}

fn validate_grade(earned: i64, possible: i64) -> Result<(u32, u32), EditError> {
    check_bounds(earned, possible)?;
    let out_of_range = || EditError::invalid_grade(earned, possible, GradeViolation::OutOfRange);
    let earned = u32::try_from(earned).map_err(|_| out_of_range())?;
    let possible = u32::try_from(possible).map_err(|_| out_of_range())?;
    Ok((earned, possible))
}

fn parse_deduction(value: &str) -> f64 {
    sanitize_deduction(value.trim().parse::<f64>().unwrap_or(0.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::grading::domain::{DocumentSource, Problem, ProblemStatus};

    fn document() -> EvaluationDocument {
        let mut probability = Problem::new(ProblemId(2), "Probability", 12, 17);
        probability.push_error(ErrorEntry::new(
            ErrorId(1),
            "calculation_error",
            "Minor calculation error in step 3",
            "Double-check your fraction simplification",
            3.0,
        ));

        EvaluationDocument::from_problems(
            DocumentSource::Ingested,
            Some(93.0),
            vec![
                Problem::new(ProblemId(1), "Data Analysis", 17, 17),
                probability,
                Problem::new(ProblemId(3), "Circle Circles", 17, 17),
                Problem::new(ProblemId(4), "Rectangle", 15, 17),
                Problem::new(ProblemId(5), "Data Integration", 16, 16),
                Problem::new(ProblemId(6), "Word Problem", 16, 16),
            ],
        )
    }

    fn problem(document: &EvaluationDocument, id: u32) -> &Problem {
        document.problem(ProblemId(id)).expect("problem present")
    }

    #[test]
    fn toggle_flips_expansion_without_score_effect() {
        let mut document = document();
        let before = document.totals();
        assert!(!document.toggle_expanded(ProblemId(1)).expect("toggle"));
        assert!(document.toggle_expanded(ProblemId(1)).expect("toggle back"));
        assert_eq!(document.totals(), before);
    }

    #[test]
    fn feedback_and_notes_stay_independent() {
        let mut document = document();
        document
            .set_problem_text(
                ProblemId(2),
                TextField::TeacherNotes,
                "Review step 3 in class",
            )
            .expect("notes set");
        document
            .set_problem_text(
                ProblemId(2),
                TextField::StudentFeedback,
                "Check the fractions",
            )
            .expect("feedback set");

        let probability = problem(&document, 2);
        assert_eq!(probability.teacher_notes(), "Review step 3 in class");
        assert_eq!(probability.student_feedback(), "Check the fractions");
    }

    #[test]
    fn add_error_uses_defaults_and_keeps_score() {
        let mut document = document();
        let id = document.add_error(ProblemId(2)).expect("error added");

        let probability = problem(&document, 2);
        assert_eq!(id, ErrorId(2));
        assert_eq!(probability.score_earned(), 12);
        let entry = probability.error(id).expect("new entry present");
        assert_eq!(entry.kind(), DEFAULT_ERROR_KIND);
        assert_eq!(entry.description(), "");
        assert_eq!(entry.hint(), "");
        assert_eq!(entry.points_deducted(), 1.0);
    }

    #[test]
    fn error_ids_are_not_reused_after_removal() {
        let mut document = document();
        let first = document.add_error(ProblemId(2)).expect("added");
        document.remove_error(ProblemId(2), first).expect("removed");
        let second = document.add_error(ProblemId(2)).expect("added again");
        assert_ne!(first, second);

        let ids: Vec<ErrorId> = problem(&document, 2)
            .errors()
            .iter()
            .map(ErrorEntry::id)
            .collect();
        assert_eq!(ids, vec![ErrorId(1), second]);
    }

    #[test]
    fn update_error_coerces_deductions() {
        let mut document = document();
        let cases = [
            ("2.5", 2.5),
            ("  4 ", 4.0),
            ("-3", 0.0),
            ("lots", 0.0),
            ("", 0.0),
        ];
        for (input, expected) in cases {
            document
                .update_error(ProblemId(2), ErrorId(1), ErrorField::PointsDeducted, input)
                .expect("deduction updated");
            let entry = problem(&document, 2).error(ErrorId(1)).expect("entry");
            assert_eq!(entry.points_deducted(), expected, "input {input:?}");
        }
        assert_eq!(problem(&document, 2).score_earned(), 12);
    }

    #[test]
    fn update_error_reports_missing_targets() {
        let mut document = document();
        let snapshot = document.clone();

        let error = document
            .update_error(ProblemId(9), ErrorId(1), ErrorField::Hint, "x")
            .expect_err("missing problem");
        assert_eq!(error, EditError::ProblemNotFound(ProblemId(9)));

        let error = document
            .update_error(ProblemId(2), ErrorId(7), ErrorField::Hint, "x")
            .expect_err("missing error");
        assert!(error.is_not_found());
        assert_eq!(document, snapshot);
    }

    #[test]
    fn remove_error_requires_existing_entry() {
        let mut document = document();
        let removed = document
            .remove_error(ProblemId(2), ErrorId(1))
            .expect("removed");
        assert_eq!(removed.description(), "Minor calculation error in step 3");

        let error = document
            .remove_error(ProblemId(2), ErrorId(1))
            .expect_err("already removed");
        assert_eq!(
            error,
            EditError::ErrorNotFound {
                problem_id: ProblemId(2),
                error_id: ErrorId(1)
            }
        );
    }

    #[test]
    fn problem_score_updates_status() {
        let mut document = document();
        document
            .set_problem_score(ProblemId(2), 17, 17)
            .expect("score set");
        assert_eq!(problem(&document, 2).status(), ProblemStatus::Correct);

        document
            .set_problem_grade(ProblemId(2), "0/20")
            .expect("grade set");
        let probability = problem(&document, 2);
        assert_eq!(probability.score_possible(), 20);
        assert_eq!(probability.status(), ProblemStatus::Incorrect);
    }

    #[test]
    fn rejected_problem_score_leaves_document_unchanged() {
        let mut document = document();
        let snapshot = document.clone();

        let error = document
            .set_problem_score(ProblemId(1), 18, 17)
            .expect_err("earned above possible");
        assert_eq!(
            error,
            EditError::InvalidGrade {
                earned: 18,
                possible: 17,
                violation: GradeViolation::EarnedExceedsPossible
            }
        );

        let cases = [
            (-1, 17),
            (0, 0),
            (5, -5),
            (i64::from(u32::MAX) + 1, i64::MAX),
        ];
        for (earned, possible) in cases {
            assert!(matches!(
                document.set_problem_score(ProblemId(1), earned, possible),
                Err(EditError::InvalidGrade { .. })
            ));
        }
        assert_eq!(document, snapshot);
    }

    #[test]
    fn score_edit_on_missing_problem_is_not_found() {
        let mut document = document();
        let error = document
            .set_problem_score(ProblemId(42), 1, 2)
            .expect_err("missing problem");
        assert_eq!(error, EditError::ProblemNotFound(ProblemId(42)));
    }

    #[test]
    fn overall_grade_redistributes_half_up() {
        let mut document = document();
        document
            .set_overall_grade("93/100", Redistribution::HalfUp)
            .expect("overall grade set");

        for problem in document.problems() {
            let expected = (f64::from(problem.score_possible()) * 0.93).round() as u32;
            assert_eq!(problem.score_earned(), expected, "problem {}", problem.id());
        }
        let earned = document.totals().earned as i64;
        assert!((earned - 93).abs() <= 6);
    }

    #[test]
    fn overall_grade_can_be_exact() {
        let mut document = document();
        document
            .set_overall_score(71, 100, Redistribution::LargestRemainder)
            .expect("overall grade set");
        assert_eq!(document.totals().earned, 71);
    }

    #[test]
    fn overall_grade_rejects_changed_possible_total() {
        let mut document = document();
        let snapshot = document.clone();
        let error = document
            .set_overall_score(45, 50, Redistribution::HalfUp)
            .expect_err("possible total is derived");
        assert!(matches!(
            error,
            EditError::InvalidGrade {
                violation: GradeViolation::PossibleMismatch { expected: 100 },
                ..
            }
        ));
        assert_eq!(document, snapshot);
    }

    #[test]
    fn overall_grade_on_empty_document_fails() {
        let mut document =
            EvaluationDocument::from_problems(DocumentSource::Manual, None, Vec::new());
        let error = document
            .set_overall_score(0, 0, Redistribution::HalfUp)
            .expect_err("nothing to redistribute");
        assert!(matches!(
            error,
            EditError::InvalidGrade {
                violation: GradeViolation::NothingToRedistribute,
                ..
            }
        ));
    }

    #[test]
    fn malformed_overall_text_leaves_document_unchanged() {
        let mut document = document();
        let snapshot = document.clone();
        for input in ["abc", "10/20/30", "/100", "93/"] {
            let error = document
                .set_overall_grade(input, Redistribution::HalfUp)
                .expect_err("malformed");
            assert!(matches!(error, EditError::MalformedInput { .. }), "{input}");
        }
        assert_eq!(document, snapshot);
    }

    #[test]
    fn overall_grade_text_reflects_current_totals() {
        let mut document = document();
        assert_eq!(document.overall_grade_text(), "93/100");
        document
            .set_problem_score(ProblemId(1), 10, 17)
            .expect("score set");
        assert_eq!(document.overall_grade_text(), "86/100");
    }

    #[test]
    fn commands_dispatch_to_operations() {
        let mut document = document();
        let command: EditCommand = serde_json::from_value(serde_json::json!({
            "op": "add_error",
            "problem_id": 4
        }))
        .expect("command parses");
        let outcome = document
            .apply(&command, Redistribution::HalfUp)
            .expect("command applies");
        assert_eq!(
            outcome,
            EditOutcome::ErrorAdded {
                error_id: ErrorId(1)
            }
        );

        let command = EditCommand::SetProblemGrade {
            problem_id: ProblemId(4),
            grade: "17/17".to_string(),
        };
        assert!(command.changes_scores());
        document
            .apply(&command, Redistribution::HalfUp)
            .expect("grade applies");
        assert_eq!(problem(&document, 4).status(), ProblemStatus::Correct);
        assert_eq!(problem(&document, 4).errors().len(), 1);
    }
}
