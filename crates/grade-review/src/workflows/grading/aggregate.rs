use serde::{Deserialize, Serialize};

use super::domain::EvaluationDocument;

/// Summed earned/possible points over the current problem list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreTotals {
    pub earned: u64,
    pub possible: u64,
}

impl ScoreTotals {
    /// Earned share of the possible total in percent, `None` for an empty document.
    pub fn percentage(&self) -> Option<f64> {
        if self.possible == 0 {
            return None;
        }
        Some(self.earned as f64 * 100.0 / self.possible as f64)
    }
}

/// Recomputed on every call; totals are never cached on the document.
pub fn aggregate(document: &EvaluationDocument) -> ScoreTotals {
    document
        .problems()
        .iter()
        .fold(ScoreTotals::default(), |totals, problem| ScoreTotals {
            earned: totals.earned + u64::from(problem.score_earned()),
            possible: totals.possible + u64::from(problem.score_possible()),
        })
}

impl EvaluationDocument {
    pub fn totals(&self) -> ScoreTotals {
        aggregate(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::grading::domain::{DocumentSource, Problem, ProblemId};

    #[test]
    fn sums_scores_in_list_order() {
        let document = EvaluationDocument::from_problems(
            DocumentSource::Ingested,
            None,
            vec![
                Problem::new(ProblemId(1), "Data Analysis", 17, 17),
                Problem::new(ProblemId(2), "Probability", 12, 17),
                Problem::new(ProblemId(3), "Word Problem", 0, 16),
            ],
        );

        let totals = aggregate(&document);
        assert_eq!(
            totals,
            ScoreTotals {
                earned: 29,
                possible: 50
            }
        );
        assert_eq!(totals.percentage(), Some(58.0));
    }

    #[test]
    fn empty_document_has_no_percentage() {
        let document = EvaluationDocument::from_problems(DocumentSource::Manual, None, Vec::new());
        let totals = document.totals();
        assert_eq!(totals, ScoreTotals::default());
        assert!(totals.percentage().is_none());
    }
}
