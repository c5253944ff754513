use serde::{Deserialize, Serialize};
use std::cmp::Reverse;

/// How an overall grade is spread across problems.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Redistribution {
    /// Each problem gets `round(possible * ratio)`, half-up. The sum may drift from the
    /// entered total by up to one point per problem.
    #[default]
    HalfUp,
    /// Floors each share, then hands leftover points to the largest remainders so the
    /// sum matches the entered total exactly.
    LargestRemainder,
}

impl Redistribution {
    pub fn from_name(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "half_up" | "round" => Some(Self::HalfUp),
            "largest_remainder" | "exact" => Some(Self::LargestRemainder),
            _ => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::HalfUp => "half_up",
            Self::LargestRemainder => "largest_remainder",
        }
    }

    /// New earned values for each entry of `possibles`. Callers guarantee
    /// `target <= sum(possibles)` and a non-zero sum.
    pub(crate) fn redistribute(self, target: u64, possibles: &[u32]) -> Vec<u32> {
        let total: u64 = possibles.iter().map(|possible| u64::from(*possible)).sum();
        if total == 0 {
            return vec![0; possibles.len()];
        }

        match self {
            Self::HalfUp => {
                let ratio = target as f64 / total as f64;
                possibles
                    .iter()
                    .map(|possible| {
                        let scaled = (f64::from(*possible) * ratio).round();
                        (scaled as u32).min(*possible)
                    })
                    .collect()
            }
            Self::LargestRemainder => largest_remainder(target, total, possibles),
        }
    }
}

fn largest_remainder(target: u64, total: u64, possibles: &[u32]) -> Vec<u32> {
    let target = u128::from(target);
    let total = u128::from(total);

    let mut shares = Vec::with_capacity(possibles.len());
    let mut remainders = Vec::with_capacity(possibles.len());
    for (index, possible) in possibles.iter().enumerate() {
        let scaled = u128::from(*possible) * target;
        shares.push((scaled / total) as u32);
        remainders.push((index, scaled % total));
    }

    let assigned: u128 = shares.iter().map(|share| u128::from(*share)).sum();
    let leftover = target.saturating_sub(assigned) as usize;

    // stable sort keeps list order among equal remainders
    remainders.sort_by_key(|entry| Reverse(entry.1));
    for (index, remainder) in remainders.into_iter().take(leftover) {
        if remainder > 0 {
            shares[index] += 1;
        }
    }

    shares
}
