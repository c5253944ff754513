use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use super::NormalizationError;

/// Raw scoring result after shape checks. Field contents are still untrusted.
#[derive(Debug)]
pub(crate) enum RawInput {
    /// No usable result: absent input, `null`, or no `problem_breakdown`.
    Absent,
    Evaluation(RawEvaluation),
}

#[derive(Debug, Default)]
pub(crate) struct RawEvaluation {
    pub(crate) overall_score: Option<f64>,
    pub(crate) problems: Vec<RawProblem>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct RawProblem {
    #[serde(default)]
    pub(crate) problem_description: Option<RawText>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub(crate) score: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub(crate) max_score: Option<f64>,
    #[serde(default)]
    pub(crate) feedback: Option<RawText>,
    #[serde(default)]
    pub(crate) teacher_recommendation: Option<RawText>,
    #[serde(default)]
    pub(crate) errors: Option<Vec<RawError>>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct RawError {
    #[serde(default, deserialize_with = "lenient_string")]
    pub(crate) error_type: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub(crate) location: Option<String>,
    #[serde(default)]
    pub(crate) description: Option<RawText>,
    #[serde(default)]
    pub(crate) explanation: Option<RawText>,
    #[serde(default)]
    pub(crate) hint: Option<RawText>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub(crate) deduction: Option<f64>,
}

/// Localized text as the scoring service sends it: a bilingual record or a bare string.
/// Only the primary language is read; the secondary copy is rebuilt at export.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum RawText {
    Plain(String),
    Localized {
        #[serde(default, deserialize_with = "lenient_string")]
        en: Option<String>,
    },
    Other(IgnoredAny),
}

impl RawText {
    /// The primary-language value, treating blank strings as missing.
    pub(crate) fn primary(&self) -> Option<&str> {
        let value = match self {
            RawText::Plain(value) => Some(value.as_str()),
            RawText::Localized { en, .. } => en.as_deref(),
            RawText::Other(_) => None,
        };
        value.filter(|value| !value.trim().is_empty())
    }
}

pub(crate) fn primary_text(text: &Option<RawText>) -> Option<&str> {
    text.as_ref().and_then(RawText::primary)
}

pub(crate) fn parse_input(raw: Option<&Value>) -> Result<RawInput, NormalizationError> {
    let object = match raw {
        None | Some(Value::Null) => return Ok(RawInput::Absent),
        Some(Value::Object(object)) => object,
        Some(other) => {
            return Err(NormalizationError::NotAnObject {
                found: kind_of(other),
            })
        }
    };

    let entries = match object.get("problem_breakdown") {
        None | Some(Value::Null) => return Ok(RawInput::Absent),
        Some(Value::Array(entries)) => entries,
        Some(other) => {
            return Err(NormalizationError::ProblemsNotAList {
                found: kind_of(other),
            })
        }
    };

    let mut problems = Vec::with_capacity(entries.len());
    for (index, entry) in entries.iter().enumerate() {
        if !entry.is_object() {
            return Err(NormalizationError::ProblemNotARecord {
                index,
                found: kind_of(entry),
            });
        }
        let problem = RawProblem::deserialize(entry).map_err(|source| {
            NormalizationError::MalformedProblem {
                index,
                message: source.to_string(),
            }
        })?;
        problems.push(problem);
    }

    Ok(RawInput::Evaluation(RawEvaluation {
        overall_score: object.get("overall_score").and_then(number_from_value),
        problems,
    }))
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "record",
    }
}

fn number_from_value(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    };
    number.filter(|number| number.is_finite())
}

fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(number_from_value))
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(text)) if !text.trim().is_empty() => Some(text),
        _ => None,
    })
}
