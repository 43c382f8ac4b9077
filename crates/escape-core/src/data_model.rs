//! Data Model: progress records and their persisted encoding
use crate::error::EscapeError;
use crate::normalize;
use crate::progression::{normalize_solved_stages, AdvanceInput, AdvanceOutcome};
use crate::scene::SceneState;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Identifies one team's attempt at one room
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressKey {
    pub team_id: String,
    pub escape_room_id: String,
}

impl ProgressKey {
    pub fn new(team_id: impl Into<String>, escape_room_id: impl Into<String>) -> Self {
        Self {
            team_id: team_id.into(),
            escape_room_id: escape_room_id.into(),
        }
    }
}

impl fmt::Display for ProgressKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.team_id, self.escape_room_id)
    }
}

/// Decoded progress record the handlers work with
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamEscapeProgress {
    #[serde(flatten)]
    pub key: ProgressKey,
    pub current_stage_index: u32,
    pub solved_stages: Vec<u32>,
    pub scene_state: SceneState,
    /// Store version this record was read at (0 = never written)
    pub version: u64,
    pub updated_at: DateTime<Utc>,
}

impl TeamEscapeProgress {
    /// A team that has not started the room yet.
    pub fn fresh(key: ProgressKey) -> Self {
        Self {
            key,
            current_stage_index: 1,
            solved_stages: Vec::new(),
            scene_state: SceneState::new(),
            version: 0,
            updated_at: Utc::now(),
        }
    }

    pub fn is_solved(&self, stage: u32) -> bool {
        self.solved_stages.binary_search(&stage).is_ok()
    }

    /// The room is done once the last stage is reached and solved.
    pub fn is_complete(&self, total_stages: u32) -> bool {
        total_stages > 0 && self.current_stage_index >= total_stages && self.is_solved(total_stages)
    }

    /// Build the request for moving past `stage`.
    pub fn advance_input(&self, stage: u32, total_stages: u32) -> AdvanceInput {
        AdvanceInput {
            current_stage_index: f64::from(self.current_stage_index),
            solved_stages: self.solved_stages.iter().map(|s| f64::from(*s)).collect(),
            requested_next_stage_index: f64::from(stage) + 1.0,
            total_rooms: f64::from(total_stages),
            explicit_complete: false,
        }
    }

    /// Copy an advance outcome and a new scene state onto this record.
    pub fn apply(&mut self, outcome: &AdvanceOutcome, scene_state: SceneState) {
        self.current_stage_index = outcome.next_stage_index;
        self.solved_stages = outcome.solved_stages.clone();
        self.scene_state = scene_state;
    }
}

/// Row as persisted: JSON-encoded solved stages and scene state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredProgress {
    pub current_stage_index: i64,
    /// JSON array of integers
    pub solved_stages: String,
    /// JSON object
    pub scene_state: String,
    pub version: u64,
    pub updated_at: DateTime<Utc>,
}

/// Decode a stored row. Never fails: unreadable fields fall back to empty.
pub fn decode(key: ProgressKey, row: &StoredProgress) -> TeamEscapeProgress {
    let solved_raw: Vec<f64> = match serde_json::from_str::<Value>(&row.solved_stages) {
        Ok(Value::Array(items)) => items.iter().filter_map(Value::as_f64).collect(),
        Ok(_) => Vec::new(),
        Err(err) => {
            tracing::warn!(key = %key, error = %err, "unreadable solved stages; treating as empty");
            Vec::new()
        }
    };

    let scene_state = match serde_json::from_str::<Value>(&row.scene_state) {
        Ok(value) => SceneState::from_value(&value),
        Err(err) => {
            tracing::warn!(key = %key, error = %err, "unreadable scene state; treating as empty");
            SceneState::new()
        }
    };

    TeamEscapeProgress {
        key,
        // i64 → f64 is exact for any sane stage index
        current_stage_index: normalize::stage_index(row.current_stage_index as f64, 1),
        solved_stages: normalize_solved_stages(&solved_raw).into_iter().collect(),
        scene_state,
        version: row.version,
        updated_at: row.updated_at,
    }
}

/// Encode a record for persistence.
pub fn encode(progress: &TeamEscapeProgress) -> Result<StoredProgress, EscapeError> {
    Ok(StoredProgress {
        current_stage_index: i64::from(progress.current_stage_index),
        solved_stages: serde_json::to_string(&progress.solved_stages)?,
        scene_state: serde_json::to_string(&progress.scene_state.to_value())?,
        version: progress.version,
        updated_at: progress.updated_at,
    })
}
