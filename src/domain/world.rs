/// Per-world progress records and the fixed world catalog.
///
/// The set of worlds is closed: it is established by `catalog()` at startup
/// and never grows. Lookups for an id outside `WORLD_IDS` are a caller error.

use serde::{Deserialize, Serialize};

/// Known world ids, in unlock order.
pub const WORLD_IDS: [&str; 4] = ["addition", "subtraction", "multiplication", "division"];

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorldProgress {
    pub id: String,
    pub title: String,
    pub is_unlocked: bool,
    pub completion_percentage: u32,
    pub activities_completed: u32,
    pub total_activities: u32,
}

/// `round(completion / 100 * total)` with ties rounding up, in integers.
/// Widened so a record read from disk cannot overflow; with `completion`
/// at most 100 the result never exceeds `total`.
pub fn activities_for(completion: u32, total: u32) -> u32 {
    let n = (u64::from(completion.min(100)) * u64::from(total) + 50) / 100;
    n as u32
}

impl WorldProgress {
    fn seed(id: &str, title: &str, unlocked: bool, completion: u32, total: u32) -> Self {
        WorldProgress {
            id: id.to_string(),
            title: title.to_string(),
            is_unlocked: unlocked,
            completion_percentage: completion,
            activities_completed: activities_for(completion, total),
            total_activities: total,
        }
    }

    /// The only path that changes completion. Keeps the activity count in step.
    pub fn with_completion(&self, completion: u32) -> Self {
        let completion = completion.min(100);
        WorldProgress {
            completion_percentage: completion,
            activities_completed: activities_for(completion, self.total_activities),
            ..self.clone()
        }
    }

    pub fn unlocked(&self) -> Self {
        WorldProgress { is_unlocked: true, ..self.clone() }
    }

    pub fn is_complete(&self) -> bool {
        self.completion_percentage >= 100
    }

    pub fn validate(&self) -> Result<(), &'static str> {
        if self.total_activities == 0 {
            return Err("totalActivities");
        }
        if self.completion_percentage > 100 {
            return Err("completionPercentage");
        }
        if self.activities_completed != activities_for(self.completion_percentage, self.total_activities) {
            return Err("activitiesCompleted");
        }
        Ok(())
    }
}

/// Fixed size of a known world, as created by `catalog()`.
pub fn total_activities_of(id: &str) -> Option<u32> {
    catalog().into_iter().find(|w| w.id == id).map(|w| w.total_activities)
}

/// Starting progress for every known world.
pub fn catalog() -> Vec<WorldProgress> {
    vec![
        WorldProgress::seed("addition", "Addition Meadows", true, 60, 20),
        WorldProgress::seed("subtraction", "Subtraction Sands", true, 25, 16),
        WorldProgress::seed("multiplication", "Multiplication Peaks", false, 0, 24),
        WorldProgress::seed("division", "Division Depths", false, 0, 24),
    ]
}

pub fn is_known(id: &str) -> bool {
    WORLD_IDS.contains(&id)
}

/// The world that unlocks after `id` is completed, if any.
pub fn next_after(id: &str) -> Option<&'static str> {
    let pos = WORLD_IDS.iter().position(|w| *w == id)?;
    WORLD_IDS.get(pos + 1).copied()
}
