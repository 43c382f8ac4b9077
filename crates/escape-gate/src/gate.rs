//! Contribution gate configuration
//!
//! Read from a stage's metadata blob. Missing or malformed fields fall back to
//! the caller's defaults.

use escape_core::normalize;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Key of the gate inside stage metadata
pub const CONTRIBUTION_GATE_KEY: &str = "contributionGate";

/// Fallback thresholds when a stage doesn't configure its own
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GateDefaults {
    /// Distinct contributors required (`None` = team size)
    #[serde(default)]
    pub required_distinct: Option<u32>,

    /// Actions each roster member must take
    #[serde(default = "default_min_actions")]
    pub min_actions_per_player: u32,
}

fn default_min_actions() -> u32 {
    1
}

impl GateDefaults {
    /// Everyone on a roster of `team_size` distinct members must act at least once.
    pub fn for_team(team_size: usize) -> Self {
        Self {
            required_distinct: Some(u32::try_from(team_size).unwrap_or(u32::MAX)),
            min_actions_per_player: 1,
        }
    }
}

impl Default for GateDefaults {
    fn default() -> Self {
        Self {
            required_distinct: None,
            min_actions_per_player: default_min_actions(),
        }
    }
}

/// Participation requirements for one stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContributionGate {
    /// `false` lets the team advance without any participation check
    pub enabled: bool,

    /// Distinct contributors required (`None` = team size)
    pub required_distinct: Option<u32>,

    /// Actions each roster member must take
    pub min_actions_per_player: u32,
}

impl ContributionGate {
    fn from_defaults(defaults: &GateDefaults) -> Self {
        Self {
            enabled: true,
            required_distinct: defaults.required_distinct,
            min_actions_per_player: defaults.min_actions_per_player,
        }
    }
}

impl Default for ContributionGate {
    fn default() -> Self {
        Self::from_defaults(&GateDefaults::default())
    }
}

/// Read the gate from stage metadata.
///
/// Without a `contributionGate` object the defaults apply wholesale. Inside
/// it, `enabled` is only off when literally `false`, and each threshold must
/// be a number that floors to ≥ 0.
pub fn parse_contribution_gate(meta: &Value, defaults: &GateDefaults) -> ContributionGate {
    let Some(gate) = meta.get(CONTRIBUTION_GATE_KEY).and_then(Value::as_object) else {
        return ContributionGate::from_defaults(defaults);
    };

    let threshold = |field: &str| {
        gate.get(field)
            .and_then(Value::as_f64)
            .and_then(normalize::non_negative)
    };

    ContributionGate {
        enabled: gate.get("enabled") != Some(&Value::Bool(false)),
        required_distinct: threshold("requiredDistinct").or(defaults.required_distinct),
        min_actions_per_player: threshold("minActionsPerPlayer")
            .unwrap_or(defaults.min_actions_per_player),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_missing_gate_uses_defaults() {
        let defaults = GateDefaults::for_team(4);
        for meta in [json!({}), json!(null), json!("x"), json!({ "contributionGate": 3 })] {
            let gate = parse_contribution_gate(&meta, &defaults);
            assert!(gate.enabled);
            assert_eq!(gate.required_distinct, Some(4));
            assert_eq!(gate.min_actions_per_player, 1);
        }
    }

    #[test]
    fn test_reads_configured_fields() {
        let meta = json!({ "contributionGate": { "requiredDistinct": 2.7, "minActionsPerPlayer": 3 } });
        let gate = parse_contribution_gate(&meta, &GateDefaults::for_team(4));
        assert!(gate.enabled);
        assert_eq!(gate.required_distinct, Some(2));
        assert_eq!(gate.min_actions_per_player, 3);
    }

    #[test]
    fn test_bad_fields_fall_back() {
        let meta = json!({
            "contributionGate": { "requiredDistinct": -1, "minActionsPerPlayer": "lots", "enabled": "no" }
        });
        let gate = parse_contribution_gate(&meta, &GateDefaults::for_team(3));
        assert!(gate.enabled);
        assert_eq!(gate.required_distinct, Some(3));
        assert_eq!(gate.min_actions_per_player, 1);
    }

    #[test]
    fn test_only_literal_false_disables() {
        let off = parse_contribution_gate(
            &json!({ "contributionGate": { "enabled": false } }),
            &GateDefaults::default(),
        );
        assert!(!off.enabled);

        let zero = parse_contribution_gate(
            &json!({ "contributionGate": { "enabled": 0 } }),
            &GateDefaults::default(),
        );
        assert!(zero.enabled);
    }

    #[test]
    fn test_zero_thresholds_are_kept() {
        let meta = json!({ "contributionGate": { "requiredDistinct": 0, "minActionsPerPlayer": 0 } });
        let gate = parse_contribution_gate(&meta, &GateDefaults::for_team(5));
        assert_eq!(gate.required_distinct, Some(0));
        assert_eq!(gate.min_actions_per_player, 0);
    }
}
