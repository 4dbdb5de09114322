//! User goals consumed by the efficiency goal sub-score

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::impl_domain_status_conversions;

/// What a goal measures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalTargetType {
    /// `target_id` is a process name.
    App,
    /// `target_id` is a category label.
    Category,
    /// `target_id` is a context type label.
    Context,
    /// All tracked time; `target_id` is ignored.
    Total,
}

impl_domain_status_conversions!(GoalTargetType {
    App => "app",
    Category => "category",
    Context => "context",
    Total => "total",
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserGoal {
    pub id: Uuid,
    pub target_type: GoalTargetType,
    pub target_id: String,
    pub daily_limit_minutes: Option<u32>,
    pub daily_target_minutes: Option<u32>,
    pub is_active: bool,
}

impl UserGoal {
    /// Goal capping daily time at `minutes`.
    pub fn limit(target_type: GoalTargetType, target_id: &str, minutes: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            target_type,
            target_id: target_id.to_string(),
            daily_limit_minutes: Some(minutes),
            daily_target_minutes: None,
            is_active: true,
        }
    }

    /// Goal requiring at least `minutes` of daily time.
    pub fn target(target_type: GoalTargetType, target_id: &str, minutes: u32) -> Self {
        Self {
            daily_limit_minutes: None,
            daily_target_minutes: Some(minutes),
            ..Self::limit(target_type, target_id, 0)
        }
    }

    /// Whether `actual_minutes` satisfies this goal. `None` when the goal has
    /// neither a limit nor a target.
    pub fn is_met(&self, actual_minutes: f64) -> Option<bool> {
        match (self.daily_limit_minutes, self.daily_target_minutes) {
            (None, None) => None,
            (limit, target) => {
                let within_limit = limit.map_or(true, |l| actual_minutes <= f64::from(l));
                let reached_target = target.map_or(true, |t| actual_minutes >= f64::from(t));
                Some(within_limit && reached_target)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limit_goal() {
        let goal = UserGoal::limit(GoalTargetType::App, "chrome.exe", 60);
        assert_eq!(goal.is_met(45.0), Some(true));
        assert_eq!(goal.is_met(61.0), Some(false));
    }

    #[test]
    fn test_target_goal() {
        let goal = UserGoal::target(GoalTargetType::Context, "development", 120);
        assert_eq!(goal.is_met(119.0), Some(false));
        assert_eq!(goal.is_met(120.0), Some(true));
    }

    #[test]
    fn test_goal_without_bounds_is_ignored() {
        let mut goal = UserGoal::target(GoalTargetType::Total, "", 10);
        goal.daily_target_minutes = None;
        assert_eq!(goal.is_met(5.0), None);
    }
}
