/// GameState: the root aggregate, persisted and restored as one unit.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::player::PlayerStats;
use crate::domain::tab::Tab;
use crate::domain::world::{self, WorldProgress, WORLD_IDS};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    pub player_stats: PlayerStats,
    pub worlds: BTreeMap<String, WorldProgress>,
    pub active_world: Option<String>,
    pub active_tab: String,
}

impl Default for GameState {
    fn default() -> Self {
        GameState {
            player_stats: PlayerStats::default(),
            worlds: world::catalog()
                .into_iter()
                .map(|w| (w.id.clone(), w))
                .collect(),
            active_world: None,
            active_tab: Tab::Play.id().to_string(),
        }
    }
}

/// Why a decoded aggregate was rejected.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum InvalidState {
    #[error("player field `{0}` out of range")]
    Player(&'static str),
    #[error("world `{id}` field `{field}` out of range")]
    World { id: String, field: &'static str },
    #[error("world `{0}` is not a known world")]
    UnknownWorld(String),
    #[error("world `{0}` is missing")]
    MissingWorld(&'static str),
    #[error("world keyed `{key}` has id `{id}`")]
    KeyMismatch { key: String, id: String },
}

impl GameState {
    pub fn world(&self, id: &str) -> Option<&WorldProgress> {
        self.worlds.get(id)
    }

    /// Worlds in unlock order.
    pub fn ordered_worlds(&self) -> impl Iterator<Item = &WorldProgress> {
        WORLD_IDS.iter().filter_map(move |id| self.worlds.get(*id))
    }

    /// Check every data-model invariant of a freshly decoded aggregate.
    pub fn validate(&self) -> Result<(), InvalidState> {
        self.player_stats.validate().map_err(InvalidState::Player)?;

        for (key, w) in &self.worlds {
            if !world::is_known(key) {
                return Err(InvalidState::UnknownWorld(key.clone()));
            }
            if *key != w.id {
                return Err(InvalidState::KeyMismatch { key: key.clone(), id: w.id.clone() });
            }
            w.validate().map_err(|field| InvalidState::World { id: key.clone(), field })?;
            // The size of a world is fixed at creation.
            if world::total_activities_of(key) != Some(w.total_activities) {
                return Err(InvalidState::World { id: key.clone(), field: "totalActivities" });
            }
        }
        if let Some(missing) = WORLD_IDS.iter().find(|id| !self.worlds.contains_key(**id)) {
            return Err(InvalidState::MissingWorld(*missing));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        let s = GameState::default();
        assert_eq!(s.validate(), Ok(()));
        assert_eq!(s.active_tab, "play");
        assert_eq!(s.active_world, None);
        assert_eq!(s.worlds.len(), WORLD_IDS.len());
    }

    #[test]
    fn ordered_worlds_follow_unlock_order() {
        let s = GameState::default();
        let ids: Vec<&str> = s.ordered_worlds().map(|w| w.id.as_str()).collect();
        assert_eq!(ids, WORLD_IDS.to_vec());
    }

    #[test]
    fn extra_world_rejected() {
        let mut s = GameState::default();
        let mut w = s.worlds["addition"].clone();
        w.id = "geometry".into();
        s.worlds.insert("geometry".into(), w);
        assert_eq!(s.validate(), Err(InvalidState::UnknownWorld("geometry".into())));
    }

    #[test]
    fn missing_world_rejected() {
        let mut s = GameState::default();
        s.worlds.remove("division");
        assert_eq!(s.validate(), Err(InvalidState::MissingWorld("division")));
    }

    #[test]
    fn key_mismatch_rejected() {
        let mut s = GameState::default();
        if let Some(w) = s.worlds.get_mut("addition") {
            w.id = "subtraction".into();
        }
        assert!(matches!(s.validate(), Err(InvalidState::KeyMismatch { .. })));
    }

    #[test]
    fn resized_world_rejected() {
        let mut s = GameState::default();
        if let Some(w) = s.worlds.get_mut("addition") {
            w.total_activities = 50_000_000;
            w.completion_percentage = 100;
            w.activities_completed = 50_000_000;
        }
        assert_eq!(
            s.validate(),
            Err(InvalidState::World { id: "addition".into(), field: "totalActivities" })
        );
    }

    #[test]
    fn serializes_with_camel_case_fields() {
        let json = serde_json::to_string(&GameState::default()).unwrap();
        assert!(json.contains("\"playerStats\""));
        assert!(json.contains("\"activeTab\":\"play\""));
        assert!(json.contains("\"isUnlocked\""));
        assert!(json.contains("\"activeWorld\":null"));
    }
}
