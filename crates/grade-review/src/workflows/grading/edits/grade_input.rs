use std::str::FromStr;

use super::{EditError, MalformedReason};

/// A grade typed by the grader as `earned/possible`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GradeInput {
    pub earned: i64,
    pub possible: i64,
}

impl GradeInput {
    pub fn parse(input: &str) -> Result<Self, EditError> {
        let malformed = |reason| EditError::MalformedInput {
            input: input.to_string(),
            reason,
        };

        let mut parts = input.split('/');
        let earned = parts.next().unwrap_or_default();
        let possible = parts
            .next()
            .ok_or_else(|| malformed(MalformedReason::MissingSeparator))?;
        if parts.next().is_some() {
            return Err(malformed(MalformedReason::TooManySeparators));
        }

        let earned = parse_side(earned).ok_or_else(|| malformed(MalformedReason::Earned))?;
        let possible = parse_side(possible).ok_or_else(|| malformed(MalformedReason::Possible))?;

        Ok(Self { earned, possible })
    }
}

impl FromStr for GradeInput {
    type Err = EditError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn parse_side(value: &str) -> Option<i64> {
    value.trim().parse::<i64>().ok()
}
