//! Stage progression: computes the next progress pointer for a team
//!
//! A single pure transition. The stage index itself is the state variable
//! and lives in the caller's persisted record.

use crate::normalize;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Request to move a team forward
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvanceInput {
    /// Highest stage the team has reached
    pub current_stage_index: f64,

    /// Previously solved stages, possibly unsorted or malformed
    #[serde(default)]
    pub solved_stages: Vec<f64>,

    /// Stage the team is asking to move to
    pub requested_next_stage_index: f64,

    /// Number of stages in the room (0 = unknown)
    #[serde(default)]
    pub total_rooms: f64,

    /// Force completion regardless of indices
    #[serde(default)]
    pub explicit_complete: bool,
}

/// Result of [`advance`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvanceOutcome {
    pub is_complete: bool,
    pub next_stage_index: u32,
    /// Ascending, unique, all ≥ 1
    pub solved_stages: Vec<u32>,
}

/// Drop malformed entries and floor the rest.
pub fn normalize_solved_stages(raw: &[f64]) -> BTreeSet<u32> {
    raw.iter()
        .copied()
        .filter(|v| v.is_finite() && *v >= 1.0)
        .filter_map(normalize::count)
        .collect()
}

/// Compute the next progression state.
///
/// Completion happens either explicitly or when the requested stage runs past
/// `total_rooms`. Completing marks the final stage solved; a normal advance
/// marks the stage being left as solved.
pub fn advance(input: &AdvanceInput) -> AdvanceOutcome {
    let current = normalize::stage_index(input.current_stage_index, 1);
    let requested =
        normalize::positive_stage_index(input.requested_next_stage_index, current.saturating_add(1));
    let total_rooms = normalize::non_negative(input.total_rooms).unwrap_or(0);

    let is_complete = input.explicit_complete || (total_rooms > 0 && requested > total_rooms);

    let next_stage_index = if is_complete {
        if total_rooms > 0 {
            total_rooms
        } else {
            current
        }
    } else {
        requested
    };

    let newly_solved = if is_complete { next_stage_index } else { current };

    let mut solved = normalize_solved_stages(&input.solved_stages);
    solved.insert(newly_solved);

    AdvanceOutcome {
        is_complete,
        next_stage_index,
        solved_stages: solved.into_iter().collect(),
    }
}
