//! Expense splitting.
//!
//! An expense of `total` minor units is divided among participants into
//! [`Share`]s. Whatever the mode, shares always add up to the total exactly:
//! leftover cents are handed out deterministically instead of rounded away.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::{EngineError, ResultEngine, money::ensure_expense_amount};

/// What a member owes for one expense.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Share {
    pub user_id: String,
    pub amount_minor: i64,
}

impl Share {
    pub fn new(user_id: impl Into<String>, amount_minor: i64) -> Self {
        Self {
            user_id: user_id.into(),
            amount_minor,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Weight {
    pub user_id: String,
    pub weight: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum SplitMode {
    /// Even split; the first participants absorb the remainder, one cent each.
    Equal { participants: Vec<String> },
    /// Explicit amounts that must add up to the total.
    Exact { shares: Vec<Share> },
    /// Proportional to integer weights (largest remainder).
    Weighted { weights: Vec<Weight> },
}

impl SplitMode {
    pub fn equal<I, S>(participants: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Equal {
            participants: participants.into_iter().map(Into::into).collect(),
        }
    }

    /// Participants in the order given by the caller.
    #[must_use]
    pub fn participants(&self) -> Vec<&str> {
        match self {
            Self::Equal { participants } => participants.iter().map(String::as_str).collect(),
            Self::Exact { shares } => shares.iter().map(|s| s.user_id.as_str()).collect(),
            Self::Weighted { weights } => weights.iter().map(|w| w.user_id.as_str()).collect(),
        }
    }
}

/// Splits `total_minor` according to `mode`.
pub fn compute_shares(total_minor: i64, mode: &SplitMode) -> ResultEngine<Vec<Share>> {
    ensure_expense_amount(total_minor)?;
    ensure_distinct_participants(&mode.participants())?;

    match mode {
        SplitMode::Equal { participants } => Ok(split_equal(total_minor, participants)),
        SplitMode::Exact { shares } => split_exact(total_minor, shares),
        SplitMode::Weighted { weights } => split_weighted(total_minor, weights),
    }
}

fn ensure_distinct_participants(participants: &[&str]) -> ResultEngine<()> {
    if participants.is_empty() {
        return Err(EngineError::InvalidSplit(
            "at least one participant is required".to_string(),
        ));
    }
    let mut seen = HashSet::with_capacity(participants.len());
    for participant in participants {
        if !seen.insert(*participant) {
            return Err(EngineError::InvalidSplit(format!(
                "participant {participant} listed more than once"
            )));
        }
    }
    Ok(())
}

fn split_equal(total_minor: i64, participants: &[String]) -> Vec<Share> {
    let count = participants.len() as i64;
    let base = total_minor / count;
    let remainder = total_minor % count;

    participants
        .iter()
        .enumerate()
        .map(|(idx, user_id)| {
            let extra = i64::from((idx as i64) < remainder);
            Share::new(user_id.clone(), base + extra)
        })
        .collect()
}

fn split_exact(total_minor: i64, shares: &[Share]) -> ResultEngine<Vec<Share>> {
    let mut sum: i64 = 0;
    for share in shares {
        if share.amount_minor < 0 {
            return Err(EngineError::InvalidSplit(
                "share amounts must be >= 0".to_string(),
            ));
        }
        sum = sum
            .checked_add(share.amount_minor)
            .ok_or_else(|| EngineError::InvalidAmount("amount too large".to_string()))?;
    }
    if sum != total_minor {
        return Err(EngineError::InvalidSplit(format!(
            "shares sum to {sum}, expected {total_minor}"
        )));
    }
    Ok(shares.to_vec())
}

fn split_weighted(total_minor: i64, weights: &[Weight]) -> ResultEngine<Vec<Share>> {
    if weights.iter().any(|w| w.weight == 0) {
        return Err(EngineError::InvalidSplit("weights must be > 0".to_string()));
    }
    let weight_sum: i128 = weights.iter().map(|w| i128::from(w.weight)).sum();
    let total = i128::from(total_minor);

    let mut amounts = Vec::with_capacity(weights.len());
    let mut remainders = Vec::with_capacity(weights.len());
    for (idx, weight) in weights.iter().enumerate() {
        let exact = total * i128::from(weight.weight);
        amounts.push(exact / weight_sum);
        remainders.push((exact % weight_sum, idx));
    }

    let allocated: i128 = amounts.iter().sum();
    let leftover = usize::try_from(total - allocated)
        .map_err(|_| EngineError::InvalidSplit("invalid weights".to_string()))?;

    // Largest remainder first; input order breaks ties.
    remainders.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
    for (_, idx) in remainders.into_iter().take(leftover) {
        amounts[idx] += 1;
    }

    weights
        .iter()
        .zip(amounts)
        .map(|(weight, amount)| {
            let amount_minor = i64::try_from(amount)
                .map_err(|_| EngineError::InvalidAmount("amount too large".to_string()))?;
            Ok(Share::new(weight.user_id.clone(), amount_minor))
        })
        .collect()
}
