//! Escape Gate: team participation checks for escape-room stages
//!
//! A stage can require that enough different players helped and that each
//! player on the roster acted a minimum number of times before the team
//! moves on.
//!
//! # Example
//!
//! ```
//! use escape_core::{record_contribution, SceneState};
//! use escape_gate::{evaluate, GateDefaults};
//! use serde_json::json;
//!
//! let roster = vec!["u1".to_string(), "u2".to_string()];
//! let meta = json!({ "contributionGate": { "minActionsPerPlayer": 1 } });
//!
//! let scene = record_contribution(&SceneState::new(), 1.0, "u1", None);
//! let (summary, satisfied) = evaluate(&scene, 1.0, &roster, &meta, &GateDefaults::default());
//! assert!(!satisfied);
//! assert_eq!(summary.missing_user_ids, vec!["u2".to_string()]);
//! ```

pub mod gate;
pub mod summary;

pub use gate::{parse_contribution_gate, ContributionGate, GateDefaults};
pub use summary::{is_contribution_gate_satisfied, summarize_stage_contributions, ContributionSummary};

use escape_core::SceneState;
use serde_json::Value;

/// Parse the stage's gate, summarize the stage and check the gate in one go.
pub fn evaluate(
    scene: &SceneState,
    stage_index: f64,
    team_user_ids: &[String],
    meta: &Value,
    defaults: &GateDefaults,
) -> (ContributionSummary, bool) {
    let gate = parse_contribution_gate(meta, defaults);
    let summary = summarize_stage_contributions(scene, stage_index, team_user_ids, &gate);
    let satisfied = is_contribution_gate_satisfied(&summary);
    (summary, satisfied)
}

/// Check if a stage's gate would let the team through
pub fn would_pass(
    scene: &SceneState,
    stage_index: f64,
    team_user_ids: &[String],
    meta: &Value,
) -> bool {
    evaluate(scene, stage_index, team_user_ids, meta, &GateDefaults::default()).1
}
