mod normalizer;
mod parser;

use serde_json::Value;
use std::io::Read;
use std::path::Path;

use super::domain::EvaluationDocument;
use super::placeholder::placeholder_document;
use parser::RawInput;

pub use normalizer::DEFAULT_MAX_SCORE;

/// Raw input whose shape cannot be turned into a document.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NormalizationError {
    #[error("raw evaluation must be a record, found {found}")]
    NotAnObject { found: &'static str },
    #[error("problem_breakdown must be a list, found {found}")]
    ProblemsNotAList { found: &'static str },
    #[error("problem entry {index} must be a record, found {found}")]
    ProblemNotARecord { index: usize, found: &'static str },
    #[error("problem entry {index} is malformed: {message}")]
    MalformedProblem { index: usize, message: String },
}

impl NormalizationError {
    /// Zero-based position of the offending problem entry, when one is to blame.
    pub fn index(&self) -> Option<usize> {
        match self {
            Self::ProblemNotARecord { index, .. } | Self::MalformedProblem { index, .. } => {
                Some(*index)
            }
            Self::NotAnObject { .. } | Self::ProblemsNotAList { .. } => None,
        }
    }
}

/// Builds a document from a raw scoring result. Absent input yields the placeholder,
/// tagged [`DocumentSource::Placeholder`](super::DocumentSource::Placeholder).
///
/// Pure: the same input always produces the same document, ids included.
pub fn normalize(raw: Option<&Value>) -> Result<EvaluationDocument, NormalizationError> {
    match parser::parse_input(raw)? {
        RawInput::Absent => Ok(placeholder_document()),
        RawInput::Evaluation(evaluation) => Ok(normalizer::normalize_evaluation(evaluation)),
    }
}

#[derive(Debug)]
pub enum EvaluationImportError {
    Io(std::io::Error),
    Json(serde_json::Error),
    Normalization(NormalizationError),
}

impl std::fmt::Display for EvaluationImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EvaluationImportError::Io(err) => write!(f, "failed to read evaluation: {}", err),
            EvaluationImportError::Json(err) => write!(f, "evaluation is not valid JSON: {}", err),
            EvaluationImportError::Normalization(err) => {
                write!(f, "could not normalize evaluation: {}", err)
            }
        }
    }
}

impl std::error::Error for EvaluationImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EvaluationImportError::Io(err) => Some(err),
            EvaluationImportError::Json(err) => Some(err),
            EvaluationImportError::Normalization(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for EvaluationImportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<serde_json::Error> for EvaluationImportError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err)
    }
}

impl From<NormalizationError> for EvaluationImportError {
    fn from(err: NormalizationError) -> Self {
        Self::Normalization(err)
    }
}

pub struct EvaluationImporter;

impl EvaluationImporter {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<EvaluationDocument, EvaluationImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(std::io::BufReader::new(file))
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<EvaluationDocument, EvaluationImportError> {
        let value: Value = serde_json::from_reader(reader)?;
        Self::from_value(&value)
    }

    pub fn from_value(value: &Value) -> Result<EvaluationDocument, EvaluationImportError> {
        Ok(normalize(Some(value))?)
    }
}
