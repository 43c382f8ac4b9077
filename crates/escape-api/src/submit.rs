//! Answer submission: check the answer, log the contribution, gate, advance
//!
//! All state changes go through [`read_modify_write`], which re-reads and
//! re-applies the pure core functions whenever a concurrent write wins.

use crate::catalog::{RoomConfig, StageConfig};
use crate::error::ApiError;
use crate::state::AppState;
use chrono::Utc;
use escape_core::{
    advance, decode, encode, normalize, record_contribution, AdvanceOutcome, EscapeError,
    ProgressKey, TeamEscapeProgress,
};
use escape_gate::{ContributionSummary, GateDefaults};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Body of a submit-answer request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRequest {
    pub stage_index: f64,
    pub answer: String,
    pub user_id: String,
}

/// Who is submitting what, for logs and the response
#[derive(Debug, Clone)]
pub struct SubmissionContext {
    pub submission_id: Uuid,
    pub key: ProgressKey,
    pub user_id: String,
    pub stage_index: u32,
}

impl SubmissionContext {
    pub fn new(key: ProgressKey, user_id: impl Into<String>, stage_index: u32) -> Self {
        Self {
            submission_id: Uuid::new_v4(),
            key,
            user_id: user_id.into(),
            stage_index,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// Wrong answer; nothing stored
    Incorrect,
    /// Stage already behind the team; nothing stored
    AlreadySolved { current_stage_index: u32 },
    /// Contribution stored, but the team can't move on yet
    GateBlocked { summary: ContributionSummary },
    /// Contribution stored and the team moved on
    Advanced {
        outcome: AdvanceOutcome,
        summary: ContributionSummary,
    },
}

impl SubmitOutcome {
    /// Metrics label
    pub fn label(&self) -> &'static str {
        match self {
            Self::Incorrect => "incorrect",
            Self::AlreadySolved { .. } => "already_solved",
            Self::GateBlocked { .. } => "gate_blocked",
            Self::Advanced { .. } => "advanced",
        }
    }
}

/// What a read-modify-write step decided
pub enum Write<T> {
    /// Store the modified record and return the value
    Persist(T),
    /// Return the value without writing
    Skip(T),
}

/// Load a team's progress, or a fresh record if they haven't started.
pub fn load_progress(state: &AppState, key: &ProgressKey) -> Result<TeamEscapeProgress, ApiError> {
    Ok(match state.store.load(key)? {
        Some(row) => decode(key.clone(), &row),
        None => TeamEscapeProgress::fresh(key.clone()),
    })
}

/// Apply `step` to the current record and write it back with compare-and-swap.
///
/// On a version conflict the record is re-read and `step` runs again, up to
/// `max_write_retries` extra times.
pub fn read_modify_write<T>(
    state: &AppState,
    key: &ProgressKey,
    mut step: impl FnMut(&mut TeamEscapeProgress) -> Result<Write<T>, ApiError>,
) -> Result<T, ApiError> {
    let attempts = state.config.max_write_retries.saturating_add(1);

    for attempt in 1..=attempts {
        let mut progress = load_progress(state, key)?;
        let expected_version = progress.version;

        let value = match step(&mut progress)? {
            Write::Skip(value) => return Ok(value),
            Write::Persist(value) => value,
        };

        progress.updated_at = Utc::now();
        match state.store.compare_and_swap(key, expected_version, encode(&progress)?) {
            Ok(_) => return Ok(value),
            Err(EscapeError::Conflict { expected, found }) => {
                state.metrics.record_conflict();
                tracing::debug!(%key, attempt, expected, found, "progress write conflict; retrying");
            }
            Err(err) => return Err(err.into()),
        }
    }

    tracing::warn!(%key, attempts, "giving up on contended progress write");
    Err(ApiError::WriteContention(key.to_string()))
}

/// Resolved catalog entries for a request
struct Target<'a> {
    room: &'a RoomConfig,
    stage: &'a StageConfig,
    roster: &'a [String],
}

fn resolve<'a>(state: &'a AppState, key: &ProgressKey, stage_index: u32) -> Result<Target<'a>, ApiError> {
    let room = state
        .catalog
        .room(&key.escape_room_id)
        .ok_or_else(|| ApiError::RoomNotFound(key.escape_room_id.clone()))?;
    let roster = state
        .catalog
        .roster(&key.team_id)
        .ok_or_else(|| ApiError::TeamNotFound(key.team_id.clone()))?;
    let stage = room.stage(stage_index).ok_or_else(|| ApiError::StageNotFound {
        room: room.id.clone(),
        stage: stage_index,
    })?;
    Ok(Target { room, stage, roster })
}

/// Handle one answer submission for a team member.
pub fn submit_answer(
    state: &AppState,
    ctx: &SubmissionContext,
    answer: &str,
) -> Result<SubmitOutcome, ApiError> {
    let user_id = ctx.user_id.trim();
    if user_id.is_empty() {
        return Err(ApiError::BadRequest("userId is required".to_string()));
    }

    let Target { room, stage, roster } = resolve(state, &ctx.key, ctx.stage_index)?;
    if !roster.iter().any(|member| member.trim() == user_id) {
        return Err(ApiError::NotOnTeam {
            user: user_id.to_string(),
            team: ctx.key.team_id.clone(),
        });
    }

    let total_stages = room.stage_count();
    let stage_index = ctx.stage_index;

    let outcome = read_modify_write(state, &ctx.key, |progress| {
        let current = progress.current_stage_index;
        if stage_index > current {
            return Err(ApiError::StageLocked {
                requested: stage_index,
                current,
            });
        }
        if stage_index < current || progress.is_complete(total_stages) {
            return Ok(Write::Skip(SubmitOutcome::AlreadySolved {
                current_stage_index: current,
            }));
        }
        if !stage.accepts(answer) {
            return Ok(Write::Skip(SubmitOutcome::Incorrect));
        }

        let stage_f = f64::from(stage_index);
        let scene = record_contribution(&progress.scene_state, stage_f, user_id, None);
        let (summary, satisfied) =
            escape_gate::evaluate(&scene, stage_f, roster, &stage.meta, &GateDefaults::default());

        if !satisfied {
            progress.scene_state = scene;
            return Ok(Write::Persist(SubmitOutcome::GateBlocked { summary }));
        }

        let outcome = advance(&progress.advance_input(stage_index, total_stages));
        progress.apply(&outcome, scene);
        Ok(Write::Persist(SubmitOutcome::Advanced { outcome, summary }))
    })?;

    state.metrics.record_submission(outcome.label());
    match &outcome {
        SubmitOutcome::Advanced { outcome, .. } => tracing::info!(
            submission_id = %ctx.submission_id,
            team_id = %ctx.key.team_id,
            room_id = %ctx.key.escape_room_id,
            stage = stage_index,
            next_stage = outcome.next_stage_index,
            complete = outcome.is_complete,
            "team advanced"
        ),
        SubmitOutcome::GateBlocked { summary } => tracing::info!(
            submission_id = %ctx.submission_id,
            team_id = %ctx.key.team_id,
            room_id = %ctx.key.escape_room_id,
            stage = stage_index,
            missing = summary.missing_user_ids.len(),
            "waiting on teammates"
        ),
        other => tracing::debug!(
            submission_id = %ctx.submission_id,
            team_id = %ctx.key.team_id,
            stage = stage_index,
            outcome = other.label(),
            "submission not applied"
        ),
    }

    Ok(outcome)
}

/// Current participation on a stage, without recording anything.
pub fn contribution_status(
    state: &AppState,
    key: &ProgressKey,
    stage_index: u32,
) -> Result<(ContributionSummary, bool), ApiError> {
    let Target { stage, roster, .. } = resolve(state, key, stage_index)?;
    let progress = load_progress(state, key)?;
    Ok(escape_gate::evaluate(
        &progress.scene_state,
        f64::from(stage_index),
        roster,
        &stage.meta,
        &GateDefaults::default(),
    ))
}

/// Normalize a raw stage number from a request.
pub fn requested_stage(raw: f64) -> u32 {
    normalize::stage_index(raw, 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::config::ApiConfig;

    const YAML: &str = r#"
rooms:
  - id: vault
    stages:
      - { index: 1, correctAnswer: "Red Door" }
      - index: 2
        correctAnswer: "blue"
        meta: { contributionGate: { enabled: false } }
teams:
  - id: red
    members: [u1, u2]
"#;

    fn state() -> AppState {
        AppState::in_memory(Catalog::from_yaml(YAML).unwrap(), ApiConfig::default()).unwrap()
    }

    fn ctx(user: &str, stage: u32) -> SubmissionContext {
        SubmissionContext::new(ProgressKey::new("red", "vault"), user, stage)
    }

    #[test]
    fn test_wrong_answer_stores_nothing() {
        let state = state();
        let outcome = submit_answer(&state, &ctx("u1", 1), "green door").unwrap();
        assert_eq!(outcome, SubmitOutcome::Incorrect);
        assert!(state.store.load(&ProgressKey::new("red", "vault")).unwrap().is_none());
    }

    #[test]
    fn test_gate_blocks_until_everyone_acts() {
        let state = state();
        match submit_answer(&state, &ctx("u1", 1), " red door ").unwrap() {
            SubmitOutcome::GateBlocked { summary } => {
                assert_eq!(summary.missing_user_ids, vec!["u2".to_string()]);
            }
            other => panic!("expected gate to block, got {other:?}"),
        }

        let (outcome, summary) = match submit_answer(&state, &ctx("u2", 1), "RED DOOR").unwrap() {
            SubmitOutcome::Advanced { outcome, summary } => (outcome, summary),
            other => panic!("expected advance, got {other:?}"),
        };
        assert_eq!(outcome.next_stage_index, 2);
        assert_eq!(outcome.solved_stages, vec![1]);
        assert!(!outcome.is_complete);
        assert_eq!(summary.distinct_contributors, 2);
    }

    #[test]
    fn test_disabled_gate_completes_room() {
        let state = state();
        submit_answer(&state, &ctx("u1", 1), "red door").unwrap();
        submit_answer(&state, &ctx("u2", 1), "red door").unwrap();

        let outcome = match submit_answer(&state, &ctx("u1", 2), "blue").unwrap() {
            SubmitOutcome::Advanced { outcome, .. } => outcome,
            other => panic!("expected advance, got {other:?}"),
        };
        assert!(outcome.is_complete);
        assert_eq!(outcome.next_stage_index, 2);
        assert_eq!(outcome.solved_stages, vec![1, 2]);

        let again = submit_answer(&state, &ctx("u2", 2), "blue").unwrap();
        assert_eq!(again, SubmitOutcome::AlreadySolved { current_stage_index: 2 });
    }

    #[test]
    fn test_locked_stage_and_strangers() {
        let state = state();
        assert!(matches!(
            submit_answer(&state, &ctx("u1", 2), "blue"),
            Err(ApiError::StageLocked { requested: 2, current: 1 })
        ));
        assert!(matches!(
            submit_answer(&state, &ctx("mallory", 1), "red door"),
            Err(ApiError::NotOnTeam { .. })
        ));
        assert!(matches!(
            submit_answer(&state, &ctx("  ", 1), "red door"),
            Err(ApiError::BadRequest(_))
        ));
        assert!(matches!(
            submit_answer(&state, &ctx("u1", 9), "red door"),
            Err(ApiError::StageNotFound { stage: 9, .. })
        ));
    }

    #[test]
    fn test_contribution_status_is_read_only() {
        let state = state();
        submit_answer(&state, &ctx("u1", 1), "red door").unwrap();
        let key = ProgressKey::new("red", "vault");

        let (summary, satisfied) = contribution_status(&state, &key, 1).unwrap();
        assert!(!satisfied);
        assert_eq!(summary.by_user.get("u1"), Some(&1));

        let (again, _) = contribution_status(&state, &key, 1).unwrap();
        assert_eq!(summary, again);
    }

    #[test]
    fn test_requested_stage_normalizes() {
        assert_eq!(requested_stage(-5.0), 1);
        assert_eq!(requested_stage(2.9), 2);
    }
}
