//! Contribution summary and gate evaluation
//!
//! Answers two separate questions for a stage: did enough different people
//! help, and did every roster member personally do their part.

use super::gate::ContributionGate;
use escape_core::normalize;
use escape_core::{SceneState, StageLedger};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Participation snapshot for one stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContributionSummary {
    /// Gate switch carried over from the configuration
    pub enabled: bool,

    pub stage_index: u32,

    pub required_distinct: u32,

    pub min_actions_per_player: u32,

    /// Users with any logged action, roster or not
    pub distinct_contributors: u32,

    /// Every roster member reached `min_actions_per_player`
    pub all_players_met_minimum: bool,

    /// Full per-user counts for the stage
    pub by_user: StageLedger,

    /// Roster members still below the minimum, in roster order
    pub missing_user_ids: Vec<String>,
}

impl ContributionSummary {
    /// Short status line for clients, e.g. `"3/4 contributors, need 1 action each; missing: u4"`.
    pub fn message(&self) -> String {
        if !self.enabled {
            return "Contribution gate disabled".to_string();
        }

        let noun = if self.min_actions_per_player == 1 { "action" } else { "actions" };
        let mut message = format!(
            "{}/{} contributors, need {} {} each",
            self.distinct_contributors, self.required_distinct, self.min_actions_per_player, noun
        );
        if !self.missing_user_ids.is_empty() {
            message.push_str(&format!("; missing: {}", self.missing_user_ids.join(", ")));
        }
        message
    }
}

/// Trim, drop blanks and dedupe a roster, keeping first-seen order.
fn normalize_roster(team_user_ids: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    team_user_ids
        .iter()
        .map(|id| id.trim())
        .filter(|id| !id.is_empty())
        .filter(|id| seen.insert(id.to_string()))
        .map(str::to_string)
        .collect()
}

/// Summarize who has acted on `stage_index`. Read-only.
pub fn summarize_stage_contributions(
    scene: &SceneState,
    stage_index: f64,
    team_user_ids: &[String],
    gate: &ContributionGate,
) -> ContributionSummary {
    let stage = normalize::stage_index(stage_index, 1);
    let ledger = scene.ledger();
    let by_user = ledger.stage(stage).cloned().unwrap_or_default();
    let roster = normalize_roster(team_user_ids);

    let roster_size = u32::try_from(roster.len()).unwrap_or(u32::MAX);
    let required_distinct = gate.required_distinct.unwrap_or(roster_size);
    let min_actions_per_player = gate.min_actions_per_player;

    let distinct_contributors = by_user.values().filter(|count| **count > 0).count();

    let missing_user_ids: Vec<String> = roster
        .into_iter()
        .filter(|user| by_user.get(user).copied().unwrap_or(0) < min_actions_per_player)
        .collect();

    ContributionSummary {
        enabled: gate.enabled,
        stage_index: stage,
        required_distinct,
        min_actions_per_player,
        distinct_contributors: u32::try_from(distinct_contributors).unwrap_or(u32::MAX),
        all_players_met_minimum: missing_user_ids.is_empty(),
        by_user,
        missing_user_ids,
    }
}

/// Disabled gates always pass; otherwise both checks must hold.
pub fn is_contribution_gate_satisfied(summary: &ContributionSummary) -> bool {
    if !summary.enabled {
        return true;
    }
    summary.distinct_contributors >= summary.required_distinct && summary.all_players_met_minimum
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn roster(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    fn scene(ledger: serde_json::Value) -> SceneState {
        SceneState::from_value(&json!({ "stageContributions": ledger }))
    }

    #[test]
    fn test_roster_is_trimmed_and_deduped() {
        let ids = roster(&[" u1", "u2", "u1", "  ", "u3 "]);
        assert_eq!(normalize_roster(&ids), roster(&["u1", "u2", "u3"]));
    }

    #[test]
    fn test_required_distinct_defaults_to_roster_size() {
        let gate = ContributionGate::default();
        let summary = summarize_stage_contributions(
            &SceneState::new(),
            1.0,
            &roster(&["a", "b", "a", "c"]),
            &gate,
        );
        assert_eq!(summary.required_distinct, 3);
        assert_eq!(summary.distinct_contributors, 0);
        assert_eq!(summary.missing_user_ids, roster(&["a", "b", "c"]));
        assert!(!is_contribution_gate_satisfied(&summary));
    }

    #[test]
    fn test_non_roster_contributors_still_count() {
        let gate = ContributionGate {
            enabled: true,
            required_distinct: Some(2),
            min_actions_per_player: 1,
        };
        let summary = summarize_stage_contributions(
            &scene(json!({ "1": { "u1": 1, "departed": 3 } })),
            1.0,
            &roster(&["u1"]),
            &gate,
        );
        assert_eq!(summary.distinct_contributors, 2);
        assert_eq!(summary.by_user.get("departed"), Some(&3));
        assert!(summary.all_players_met_minimum);
        assert!(is_contribution_gate_satisfied(&summary));
    }

    #[test]
    fn test_message() {
        let gate = ContributionGate {
            enabled: true,
            required_distinct: Some(4),
            min_actions_per_player: 1,
        };
        let summary = summarize_stage_contributions(
            &scene(json!({ "2": { "u1": 1, "u2": 1, "u3": 1 } })),
            2.0,
            &roster(&["u1", "u2", "u3", "u4"]),
            &gate,
        );
        assert_eq!(summary.message(), "3/4 contributors, need 1 action each; missing: u4");
    }

    #[test]
    fn test_wire_format() {
        let summary = summarize_stage_contributions(
            &scene(json!({ "1": { "u1": 2 } })),
            1.0,
            &roster(&["u1"]),
            &ContributionGate::default(),
        );
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["stageIndex"], 1);
        assert_eq!(json["distinctContributors"], 1);
        assert_eq!(json["allPlayersMetMinimum"], true);
        assert_eq!(json["byUser"], json!({ "u1": 2 }));
        assert_eq!(json["missingUserIds"], json!([]));
    }
}
