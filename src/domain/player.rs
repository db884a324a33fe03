/// Player profile shown in the header of every screen.

use serde::{Deserialize, Serialize};

/// XP needed to advance one level. `xp_progress` is a percentage of this.
pub const XP_PER_LEVEL: u32 = 100;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerStats {
    pub username: String,
    pub level: u32,
    pub coins: u32,
    pub xp_progress: u32,
    pub achievement_count: u32,
    pub total_achievements: u32,
}

impl Default for PlayerStats {
    fn default() -> Self {
        PlayerStats {
            username: "Explorer".to_string(),
            level: 3,
            coins: 250,
            xp_progress: 40,
            achievement_count: 4,
            total_achievements: 30,
        }
    }
}

impl PlayerStats {
    /// Check every range constraint. Returns the first violated field name.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.username.trim().is_empty() {
            return Err("username");
        }
        if self.level < 1 {
            return Err("level");
        }
        if self.xp_progress > XP_PER_LEVEL {
            return Err("xpProgress");
        }
        if self.achievement_count > self.total_achievements {
            return Err("achievementCount");
        }
        Ok(())
    }

    pub fn with_coins(&self, amount: u32) -> Self {
        PlayerStats {
            coins: self.coins.saturating_add(amount),
            ..self.clone()
        }
    }

    /// Add XP; every full bar rolls into a level.
    pub fn with_xp(&self, points: u32) -> Self {
        let total = self.xp_progress.saturating_add(points);
        PlayerStats {
            level: self.level.saturating_add(total / XP_PER_LEVEL),
            xp_progress: total % XP_PER_LEVEL,
            ..self.clone()
        }
    }
}
