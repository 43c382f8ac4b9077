//! Contribution recording
//!
//! Logs that a user acted on a stage. The gate that reads these counts lives
//! in `escape-gate`.

use crate::normalize;
use crate::scene::SceneState;

/// Record `increment_by` actions (default 1) for `user_id` on `stage_index`.
///
/// Returns a new scene state; the input is never modified. A blank user id
/// leaves the counts alone but still returns the normalized ledger.
pub fn record_contribution(
    scene: &SceneState,
    stage_index: f64,
    user_id: &str,
    increment_by: Option<f64>,
) -> SceneState {
    let mut ledger = scene.ledger();
    let user_id = user_id.trim();

    if !user_id.is_empty() {
        let stage = normalize::stage_index(stage_index, 1);
        let by = increment_by.and_then(normalize::count).unwrap_or(1);
        ledger.increment(stage, user_id, by);
    }

    SceneState {
        stage_contributions: Some(ledger),
        extra: scene.extra.clone(),
    }
}
