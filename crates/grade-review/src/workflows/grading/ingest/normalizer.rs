use tracing::warn;

use super::parser::{primary_text, RawError, RawEvaluation, RawProblem};
use crate::workflows::grading::domain::{
    DocumentSource, ErrorEntry, ErrorId, EvaluationDocument, Problem, ProblemId,
    DEFAULT_ERROR_KIND,
};

pub const DEFAULT_MAX_SCORE: u32 = 100;

pub(crate) fn normalize_evaluation(raw: RawEvaluation) -> EvaluationDocument {
    let problems = raw
        .problems
        .into_iter()
        .enumerate()
        .map(|(index, problem)| normalize_problem(index, problem))
        .collect();

    EvaluationDocument::from_problems(DocumentSource::Ingested, raw.overall_score, problems)
}

fn normalize_problem(index: usize, raw: RawProblem) -> Problem {
    let position = index + 1;
    let id = ProblemId(position as u32);
    let title = primary_text(&raw.problem_description)
        .map(str::to_string)
        .unwrap_or_else(|| format!("Problem {position}"));

    let possible = raw
        .max_score
        .map(round_half_up)
        .filter(|max| *max >= 1.0)
        .map(|max| max.min(f64::from(u32::MAX)) as u32)
        .unwrap_or(DEFAULT_MAX_SCORE);
    let earned = clamp_score(id, raw.score.map(round_half_up).unwrap_or(0.0), possible);

    let mut problem = Problem::new(id, title, earned, possible).with_feedback(
        primary_text(&raw.feedback).unwrap_or_default(),
        primary_text(&raw.teacher_recommendation).unwrap_or_default(),
    );

    for (error_index, error) in raw.errors.unwrap_or_default().into_iter().enumerate() {
        problem.push_error(normalize_error(error_index, error));
    }

    problem
}

fn normalize_error(index: usize, raw: RawError) -> ErrorEntry {
    let kind = raw
        .error_type
        .or(raw.location)
        .unwrap_or_else(|| DEFAULT_ERROR_KIND.to_string());
    let description = primary_text(&raw.description)
        .or_else(|| primary_text(&raw.explanation))
        .unwrap_or_default();
    let hint = primary_text(&raw.hint).unwrap_or_default();

    ErrorEntry::new(
        ErrorId(index as u64 + 1),
        kind,
        description,
        hint,
        raw.deduction.unwrap_or(0.0),
    )
}

fn round_half_up(value: f64) -> f64 {
    (value + 0.5).floor()
}

fn clamp_score(id: ProblemId, score: f64, possible: u32) -> u32 {
    if score < 0.0 {
        warn!(problem = %id, score, "raw score below zero, clamping to 0");
        return 0;
    }
    if score > f64::from(possible) {
        warn!(problem = %id, score, possible, "raw score above max_score, clamping");
        return possible;
    }
    score as u32
}

#[cfg(test)]
pub(crate) fn round_for_tests(value: f64) -> f64 {
    round_half_up(value)
}
