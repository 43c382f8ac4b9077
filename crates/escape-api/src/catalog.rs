//! Room catalog: rooms, their stages and team rosters
//!
//! Loaded once at startup from YAML. Stage metadata stays an untyped JSON
//! value; the gate parser copes with whatever is in there.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("CATALOG/IO: {0}")]
    Io(#[from] std::io::Error),

    #[error("CATALOG/PARSE: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("CATALOG/INVALID: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Catalog {
    #[serde(default)]
    pub rooms: Vec<RoomConfig>,
    #[serde(default)]
    pub teams: Vec<TeamConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomConfig {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    pub stages: Vec<StageConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageConfig {
    pub index: u32,
    #[serde(default)]
    pub title: Option<String>,
    pub correct_answer: String,
    /// Free-form stage metadata; may hold a `contributionGate`
    #[serde(default)]
    pub meta: Value,
}

impl StageConfig {
    /// Trimmed, case-insensitive comparison against the stage's answer.
    pub fn accepts(&self, answer: &str) -> bool {
        answer.trim().to_lowercase() == self.correct_answer.trim().to_lowercase()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamConfig {
    pub id: String,
    #[serde(default)]
    pub members: Vec<String>,
}

impl RoomConfig {
    pub fn stage(&self, index: u32) -> Option<&StageConfig> {
        self.stages.iter().find(|s| s.index == index)
    }

    pub fn stage_count(&self) -> u32 {
        u32::try_from(self.stages.len()).unwrap_or(u32::MAX)
    }
}

impl Catalog {
    /// Parse and validate a YAML catalog
    pub fn from_yaml(yaml: &str) -> Result<Self, CatalogError> {
        let catalog: Catalog = serde_yaml::from_str(yaml)?;
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml(&yaml)
    }

    /// Room ids and team ids are unique; each room numbers its stages 1..=n.
    pub fn validate(&self) -> Result<(), CatalogError> {
        let mut room_ids = HashSet::new();
        for room in &self.rooms {
            if !room_ids.insert(room.id.as_str()) {
                return Err(CatalogError::Invalid(format!("duplicate room id {}", room.id)));
            }
            let mut indices: Vec<u32> = room.stages.iter().map(|s| s.index).collect();
            indices.sort_unstable();
            let expected: Vec<u32> = (1..=room.stage_count()).collect();
            if indices != expected {
                return Err(CatalogError::Invalid(format!(
                    "room {} must number its stages 1..={}, got {:?}",
                    room.id,
                    room.stages.len(),
                    indices
                )));
            }
        }

        let mut team_ids = HashSet::new();
        for team in &self.teams {
            if !team_ids.insert(team.id.as_str()) {
                return Err(CatalogError::Invalid(format!("duplicate team id {}", team.id)));
            }
        }
        Ok(())
    }

    pub fn room(&self, id: &str) -> Option<&RoomConfig> {
        self.rooms.iter().find(|r| r.id == id)
    }

    pub fn team(&self, id: &str) -> Option<&TeamConfig> {
        self.teams.iter().find(|t| t.id == id)
    }

    /// Current member ids of a team
    pub fn roster(&self, team_id: &str) -> Option<&[String]> {
        self.team(team_id).map(|t| t.members.as_slice())
    }
}
