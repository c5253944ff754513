use super::domain::{
    DocumentSource, ErrorEntry, ErrorId, EvaluationDocument, Problem, ProblemId,
    DEFAULT_ERROR_KIND,
};

/// Overall score the placeholder claims to have been reported with.
pub const PLACEHOLDER_REPORTED_OVERALL: f64 = 93.0;

/// Sample document shown when no scoring result is available. Editable like any other
/// document but refused at export.
pub fn placeholder_document() -> EvaluationDocument {
    let mut probability = Problem::new(ProblemId(2), "Probability", 12, 17);
    probability.push_error(ErrorEntry::new(
        ErrorId(1),
        DEFAULT_ERROR_KIND,
        "Minor calculation error in step 3",
        "Double-check your fraction simplification",
        3.0,
    ));

    let problems = vec![
        Problem::new(ProblemId(1), "Data Analysis", 17, 17).with_feedback(
            "Perfect score! You accurately identified all possible outcomes and calculated \
             probabilities for various scenarios involving two",
            "Excellent work on identifying all outcomes. The student has a comprehensive \
             understanding of fundamental concepts, including sample space and calculating",
        ),
        probability,
        Problem::new(ProblemId(3), "Circle Circles", 17, 17).with_feedback(
            "Outstanding! You successfully set up the equations for the rectangle's perimeter, \
             solved for the unknown side length, and correctly",
            "The student shows remarkable skills in setting up and solving equations from word \
             problems, and a solid understanding of",
        ),
        Problem::new(ProblemId(4), "Rectangle", 15, 17),
        Problem::new(ProblemId(5), "Data Integration", 16, 16),
        Problem::new(ProblemId(6), "Word Problem", 16, 16).with_feedback(
            "Excellent work on this word problem! You correctly found initial total, calculated \
             the difference, and accurately",
            "The student excels at translating real-world scenarios into mathematical problems, \
             performing calculations, and creating",
        ),
    ];

    EvaluationDocument::from_problems(
        DocumentSource::Placeholder,
        Some(PLACEHOLDER_REPORTED_OVERALL),
        problems,
    )
}
