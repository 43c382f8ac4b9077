//! Scene state: the per-room document carried on a team's progress record
//!
//! Only `stageContributions` has meaning here. Every other key is carried
//! through untouched. Decoding is tolerant: whatever is stored, the result is
//! a well-formed scene state.

use crate::normalize;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Key of the ledger inside the scene state object
pub const STAGE_CONTRIBUTIONS_KEY: &str = "stageContributions";

/// Per-user action counts for one stage
pub type StageLedger = BTreeMap<String, u32>;

/// Stage index → user id → action count (always ≥ 1)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContributionLedger(BTreeMap<u32, StageLedger>);

impl ContributionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalize an untrusted `stageContributions` value.
    ///
    /// Non-object input yields an empty ledger. Bad stage keys, non-object
    /// stage entries, blank user ids and counts below 1 are dropped. Keys that
    /// land on the same stage (`"2"` and `"2.0"`) are merged by summing.
    pub fn from_value(raw: &Value) -> Self {
        let mut ledger = Self::new();
        let Some(stages) = raw.as_object() else {
            return ledger;
        };

        for (stage_key, users) in stages {
            let Some(stage) = normalize::stage_key(stage_key) else {
                tracing::debug!(stage_key = %stage_key, "dropping malformed stage key");
                continue;
            };
            let Some(users) = users.as_object() else {
                continue;
            };
            for (user_id, raw_count) in users {
                let user_id = user_id.trim();
                if user_id.is_empty() {
                    continue;
                }
                if let Some(count) = raw_count.as_f64().and_then(normalize::count) {
                    ledger.increment(stage, user_id, count);
                }
            }
        }

        ledger
    }

    /// Counts for one stage, if anyone has acted on it.
    pub fn stage(&self, stage: u32) -> Option<&StageLedger> {
        self.0.get(&stage)
    }

    /// Count for a user on a stage (0 when absent).
    pub fn count(&self, stage: u32, user_id: &str) -> u32 {
        self.stage(stage)
            .and_then(|users| users.get(user_id))
            .copied()
            .unwrap_or(0)
    }

    /// Add `by` actions for a user on a stage. Saturates at `u32::MAX`.
    pub fn increment(&mut self, stage: u32, user_id: &str, by: u32) {
        if by == 0 {
            return;
        }
        let entry = self
            .0
            .entry(stage)
            .or_default()
            .entry(user_id.to_string())
            .or_insert(0);
        *entry = entry.saturating_add(by);
    }

    /// Stages that have at least one contributor, ascending.
    pub fn stages(&self) -> impl Iterator<Item = u32> + '_ {
        self.0.keys().copied()
    }

    pub fn to_value(&self) -> Value {
        let stages: Map<String, Value> = self
            .0
            .iter()
            .map(|(stage, users)| {
                let users: Map<String, Value> = users
                    .iter()
                    .map(|(user, count)| (user.clone(), Value::from(*count)))
                    .collect();
                (stage.to_string(), Value::Object(users))
            })
            .collect();
        Value::Object(stages)
    }
}

/// Typed scene state with the unknown keys kept aside
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value", into = "Value")]
pub struct SceneState {
    pub stage_contributions: Option<ContributionLedger>,
    /// Everything that isn't `stageContributions`, preserved verbatim
    pub extra: Map<String, Value>,
}

impl SceneState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode an arbitrary value; anything but an object is an empty scene.
    pub fn from_value(raw: &Value) -> Self {
        let Some(object) = raw.as_object() else {
            if !raw.is_null() {
                tracing::debug!("scene state is not an object; treating as empty");
            }
            return Self::new();
        };

        let mut extra = object.clone();
        let stage_contributions = extra
            .remove(STAGE_CONTRIBUTIONS_KEY)
            .map(|value| ContributionLedger::from_value(&value));

        Self {
            stage_contributions,
            extra,
        }
    }

    /// The ledger, or an empty one if the scene never had contributions.
    pub fn ledger(&self) -> ContributionLedger {
        self.stage_contributions.clone().unwrap_or_default()
    }

    pub fn to_value(&self) -> Value {
        let mut object = self.extra.clone();
        if let Some(ledger) = &self.stage_contributions {
            object.insert(STAGE_CONTRIBUTIONS_KEY.to_string(), ledger.to_value());
        }
        Value::Object(object)
    }
}

impl From<Value> for SceneState {
    fn from(value: Value) -> Self {
        Self::from_value(&value)
    }
}

impl From<SceneState> for Value {
    fn from(scene: SceneState) -> Self {
        scene.to_value()
    }
}
