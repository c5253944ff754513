use crate::infra::{InMemoryEvaluationSink, InMemoryReviewRepository};
use clap::Args;
use grade_review::config::ReviewConfig;
use grade_review::error::AppError;
use grade_review::workflows::grading::{
    write_grade_sheet, DocumentView, EditCommand, ErrorField, ErrorId, EvaluationImporter,
    ProblemId, Redistribution, ReviewService, ReviewServiceError, StudentView, SubmissionId,
    TextField,
};
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct ShowArgs {
    /// Raw scoring result (JSON) to normalize
    #[arg(long)]
    pub(crate) input: PathBuf,
    /// Render the learner-facing view instead of the grader view
    #[arg(long)]
    pub(crate) student: bool,
    /// Print the view as JSON
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug)]
pub(crate) struct ExportArgs {
    /// Raw scoring result (JSON) to normalize
    #[arg(long)]
    pub(crate) input: PathBuf,
    /// Overall grade to apply before export, e.g. 85/100
    #[arg(long)]
    pub(crate) overall: Option<String>,
    /// How an overall grade is spread across problems (half_up or largest_remainder)
    #[arg(long, value_parser = parse_redistribution, default_value = "half_up")]
    pub(crate) redistribution: Redistribution,
    /// Emit a CSV grade sheet instead of the JSON payload
    #[arg(long)]
    pub(crate) grade_sheet: bool,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Overall grade entered during the scripted session
    #[arg(long)]
    pub(crate) overall: Option<String>,
    /// How an overall grade is spread across problems (half_up or largest_remainder)
    #[arg(long, value_parser = parse_redistribution)]
    pub(crate) redistribution: Option<Redistribution>,
    /// Skip the placeholder guard portion of the demo
    #[arg(long)]
    pub(crate) skip_placeholder: bool,
}

pub(crate) fn parse_redistribution(raw: &str) -> Result<Redistribution, String> {
    Redistribution::from_name(raw)
        .ok_or_else(|| format!("'{raw}' is not half_up or largest_remainder"))
}

pub(crate) fn run_review_show(args: ShowArgs) -> Result<(), AppError> {
    let document = EvaluationImporter::from_path(&args.input)?;

    if args.json {
        let rendered = if args.student {
            serde_json::to_string_pretty(&StudentView::from_document(&document))
        } else {
            serde_json::to_string_pretty(&DocumentView::from_document(&document))
        };
        match rendered {
            Ok(json) => println!("{json}"),
            Err(err) => println!("View unavailable: {err}"),
        }
        return Ok(());
    }

    if args.student {
        render_student_view(&StudentView::from_document(&document));
    } else {
        render_document_view(&DocumentView::from_document(&document));
    }
    Ok(())
}

pub(crate) fn run_review_export(args: ExportArgs) -> Result<(), AppError> {
    let mut document = EvaluationImporter::from_path(&args.input)?;

    if let Some(grade) = args.overall.as_deref() {
        document
            .set_overall_grade(grade, args.redistribution)
            .map_err(ReviewServiceError::from)?;
    }
    let payload = document.export().map_err(ReviewServiceError::from)?;

    if args.grade_sheet {
        write_grade_sheet(std::io::stdout().lock(), &payload).map_err(std::io::Error::other)?;
        return Ok(());
    }

    match serde_json::to_string_pretty(&payload) {
        Ok(json) => println!("{json}"),
        Err(err) => println!("Payload unavailable: {err}"),
    }
    Ok(())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        overall,
        redistribution,
        skip_placeholder,
    } = args;

    let settings = ReviewConfig {
        redistribution: redistribution.unwrap_or_default(),
        ..ReviewConfig::default()
    };
    let overall = overall.unwrap_or_else(|| "88/100".to_string());

    let repository = Arc::new(InMemoryReviewRepository::default());
    let sink = Arc::new(InMemoryEvaluationSink::default());
    let service = ReviewService::new(repository, sink.clone(), settings);

    println!("Grade review demo");
    let submission_id = SubmissionId("sub-demo-001".to_string());
    let record = service.open(submission_id.clone(), Some(&demo_evaluation()))?;
    println!(
        "- Opened review {} for submission {} ({} problems)",
        record.review_id,
        record.submission_id,
        record.document.problems().len()
    );
    render_document_view(&DocumentView::from_document(&record.document));

    let script = vec![
        EditCommand::SetProblemText {
            problem_id: ProblemId(2),
            field: TextField::TeacherNotes,
            value: "Revisit unit conversions in the next session.".to_string(),
        },
        EditCommand::AddError {
            problem_id: ProblemId(2),
        },
        EditCommand::UpdateError {
            problem_id: ProblemId(2),
            error_id: ErrorId(1),
            field: ErrorField::Description,
            value: "Answer given in minutes instead of hours.".to_string(),
        },
        EditCommand::UpdateError {
            problem_id: ProblemId(2),
            error_id: ErrorId(1),
            field: ErrorField::Hint,
            value: "Check the units the question asks for.".to_string(),
        },
        EditCommand::SetProblemGrade {
            problem_id: ProblemId(3),
            grade: "30/30".to_string(),
        },
        EditCommand::SetOverallGrade { grade: overall },
    ];

    let policy = settings.redistribution.label();
    println!("\nScripted edits ({policy} redistribution)");
    for command in &script {
        match service.apply(&record.review_id, command) {
            Ok((_, updated)) => println!(
                "  - {} -> overall {}",
                command.name(),
                updated.document.overall_grade_text()
            ),
            Err(err) => println!("  - {} rejected: {}", command.name(), err),
        }
    }

    let rejected = EditCommand::SetProblemGrade {
        problem_id: ProblemId(1),
        grade: "26/25".to_string(),
    };
    if let Err(err) = service.apply(&record.review_id, &rejected) {
        println!("  - {} rejected as expected: {}", rejected.name(), err);
    }

    let current = service.get(&record.review_id)?;
    render_document_view(&DocumentView::from_document(&current.document));

    println!("\nStudent view");
    render_student_view(&StudentView::from_document(&current.document));

    let receipt = service.submit(&record.review_id)?;
    println!(
        "\n- Submitted review {} at {} (overall score {})",
        receipt.review_id,
        receipt.submitted_at.format("%Y-%m-%d %H:%M:%S UTC"),
        receipt.overall_score
    );
    match sink.get(&submission_id) {
        Some(stored) => match serde_json::to_string_pretty(&stored.evaluation) {
            Ok(json) => println!("  Stored payload:\n{json}"),
            Err(err) => println!("  Stored payload unavailable: {err}"),
        },
        None => println!("  Evaluation store returned no payload"),
    }

    if skip_placeholder {
        return Ok(());
    }

    println!("\nPlaceholder guard");
    let placeholder = service.open(SubmissionId("sub-demo-002".to_string()), None)?;
    println!(
        "- Opened review {} without a scoring result (source: {})",
        placeholder.review_id,
        placeholder.document.source().label()
    );
    match service.submit(&placeholder.review_id) {
        Ok(_) => println!("  Placeholder was submitted unexpectedly"),
        Err(err) => println!("  Submit refused: {err}"),
    }

    Ok(())
}

fn render_document_view(view: &DocumentView) {
    let percentage = view
        .percentage
        .map(|value| format!("{value:.1}%"))
        .unwrap_or_else(|| "n/a".to_string());
    println!(
        "Overall grade {} ({}) | source: {}",
        view.overall_grade, percentage, view.source_label
    );
    if let Some(reported) = view.reported_overall {
        println!("  Reported by scoring assistant: {reported}");
    }
    for problem in &view.problems {
        println!(
            "  {} {}: {}/{} [{}]",
            problem.label, problem.title, problem.score, problem.max_score, problem.status_label
        );
        if !problem.student_feedback.is_empty() {
            println!("    Feedback: {}", problem.student_feedback);
        }
        if !problem.teacher_notes.is_empty() {
            println!("    Teacher notes: {}", problem.teacher_notes);
        }
        for error in &problem.errors {
            println!(
                "    - #{} {} (-{} pts): {}",
                error.id, error.kind, error.points_deducted, error.description
            );
        }
    }
}

fn render_student_view(view: &StudentView) {
    println!("Score {}/{}", view.totals.earned, view.totals.possible);
    for problem in &view.problems {
        println!(
            "  {} {}: {}/{}",
            problem.label, problem.title, problem.score, problem.max_score
        );
        if !problem.feedback.is_empty() {
            println!("    {}", problem.feedback);
        }
        for error in &problem.errors {
            if error.hint.is_empty() {
                println!("    - {}", error.description);
            } else {
                println!("    - {} (hint: {})", error.description, error.hint);
            }
        }
    }
}

fn demo_evaluation() -> Value {
    json!({
        "overall_score": 82,
        "problem_breakdown": [
            {
                "problem_description": { "en": "Linear Equations", "he": "Linear Equations" },
                "score": 22,
                "max_score": 25,
                "feedback": { "en": "Solid setup; one sign slip in the final step." },
                "teacher_recommendation": { "en": "Reinforce sign handling when moving terms." },
                "errors": [
                    {
                        "error_type": "sign_error",
                        "deduction": 3,
                        "explanation": { "en": "Sign flipped when moving 4x across." },
                        "hint": { "en": "Subtracting a negative adds." }
                    }
                ]
            },
            {
                "problem_description": { "en": "Rates and Units" },
                "score": 30,
                "max_score": 45,
                "feedback": { "en": "Method is correct; the unit in the answer is not." },
                "errors": []
            },
            {
                "problem_description": { "en": "Geometry Proof" },
                "score": 28,
                "max_score": 30,
                "errors": []
            }
        ]
    })
}
