use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", tag = "kind", content = "target")]
pub enum Milestone {
    Hours(u64),
    Streak(u64),
}

impl Milestone {
    pub fn is_reached(&self, streak: u64, total_hours: u64) -> bool {
        match *self {
            Milestone::Hours(target) => total_hours >= target,
            Milestone::Streak(target) => streak >= target,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Achievement {
    pub title: String,
    pub description: String,
    pub icon: String,
    pub milestone: Milestone,
    /// Derived from progress on every state change; never persisted.
    #[serde(skip_deserializing)]
    pub is_unlocked: bool,
}

impl Achievement {
    fn new(title: &str, description: &str, icon: &str, milestone: Milestone) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            icon: icon.into(),
            milestone,
            is_unlocked: false,
        }
    }
}

pub fn default_catalog() -> Vec<Achievement> {
    vec![
        Achievement::new(
            "First Reset",
            "Complete a 1 hour detox session.",
            "sparkles",
            Milestone::Hours(1),
        ),
        Achievement::new(
            "Deep Focus",
            "Log 10 detox hours in total.",
            "brain.head.profile",
            Milestone::Hours(10),
        ),
        Achievement::new(
            "Consistency",
            "Maintain a 7 day streak.",
            "flame",
            Milestone::Streak(7),
        ),
    ]
}

/// Recompute unlock flags for the whole catalog from current progress.
pub fn evaluate_achievements(
    catalog: &[Achievement],
    streak: u64,
    total_focus_minutes: u64,
) -> Vec<Achievement> {
    let total_hours = total_focus_minutes / 60;
    catalog
        .iter()
        .map(|achievement| Achievement {
            is_unlocked: achievement.milestone.is_reached(streak, total_hours),
            ..achievement.clone()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unlocked(achievements: &[Achievement], title: &str) -> bool {
        achievements
            .iter()
            .find(|a| a.title == title)
            .map(|a| a.is_unlocked)
            .unwrap()
    }

    #[test]
    fn nothing_unlocked_without_progress() {
        let result = evaluate_achievements(&default_catalog(), 0, 0);
        assert!(result.iter().all(|a| !a.is_unlocked));
    }

    #[test]
    fn hours_use_floor_of_minutes() {
        let result = evaluate_achievements(&default_catalog(), 0, 59);
        assert!(!unlocked(&result, "First Reset"));

        let result = evaluate_achievements(&default_catalog(), 0, 60);
        assert!(unlocked(&result, "First Reset"));
        assert!(!unlocked(&result, "Deep Focus"));
    }

    #[test]
    fn streak_milestone_relocks_when_streak_drops() {
        let catalog = default_catalog();
        let result = evaluate_achievements(&catalog, 7, 0);
        assert!(unlocked(&result, "Consistency"));

        let result = evaluate_achievements(&result, 0, 0);
        assert!(!unlocked(&result, "Consistency"));
    }
}
