//! Five-component efficiency score
//!
//! `total = 0.30·focus + 0.25·taskCompletion + 0.20·balance + 0.15·interruption + 0.10·goal`
//!
//! Each sub-score lies in `[0, 100]` and is rounded to one decimal before it
//! is combined. The whole computation is a pure function of the day's
//! sessions and the active goals.

use deskpulse_domain::constants::{DEEP_WORK_TARGET_MINUTES, IDEAL_BREAK_RATIO, NEUTRAL_GOAL_SCORE};
use deskpulse_domain::{AppSession, EfficiencyBreakdown, FocusSession, GoalTargetType, UserGoal};

use super::focus::segment_focus_sessions;
use super::{minutes_between, round1};

const FOCUS_WEIGHT: f64 = 0.30;
const TASK_WEIGHT: f64 = 0.25;
const BALANCE_WEIGHT: f64 = 0.20;
const INTERRUPTION_WEIGHT: f64 = 0.15;
const GOAL_WEIGHT: f64 = 0.10;

/// Score a day. Zero sessions yield the all-zero default breakdown.
pub fn calculate_efficiency(sessions: &[AppSession], goals: &[UserGoal]) -> EfficiencyBreakdown {
    let focus = segment_focus_sessions(sessions);
    calculate_with_focus(sessions, &focus, goals)
}

/// Score a day using already segmented focus sessions.
pub fn calculate_with_focus(
    sessions: &[AppSession],
    focus: &[FocusSession],
    goals: &[UserGoal],
) -> EfficiencyBreakdown {
    let mut ordered: Vec<&AppSession> = sessions.iter().collect();
    ordered.sort_by_key(|s| s.start_time);

    let total_minutes: f64 = ordered.iter().map(|s| s.duration_minutes()).sum();
    if ordered.is_empty() || total_minutes <= 0.0 {
        return EfficiencyBreakdown::default();
    }

    let focus_minutes: f64 = focus.iter().map(|f| f.duration_minutes).sum();
    let deep_minutes: f64 = focus.iter().filter(|f| f.is_deep_work).map(|f| f.duration_minutes).sum();
    let productive_minutes: f64 =
        ordered.iter().filter(|s| s.context.is_productive()).map(|s| s.duration_minutes()).sum();
    let break_minutes: f64 = ordered
        .windows(2)
        .map(|pair| minutes_between(pair[0].effective_end(), pair[1].start_time).max(0.0))
        .sum();
    let switches = ordered.windows(2).filter(|pair| pair[0].process_name != pair[1].process_name).count();
    let switches_per_hour = switches as f64 / (total_minutes / 60.0);

    let focus_score = round1(focus_score(focus_minutes, deep_minutes, total_minutes));
    let task_completion_score = round1(task_completion_score(productive_minutes, total_minutes));
    let balance_score = round1(balance_score(break_minutes / (break_minutes + total_minutes)));
    let interruption_score = round1(interruption_score(switches_per_hour));
    let goal_score = round1(goal_score(&ordered, goals));

    let total_score = round1(
        FOCUS_WEIGHT * focus_score
            + TASK_WEIGHT * task_completion_score
            + BALANCE_WEIGHT * balance_score
            + INTERRUPTION_WEIGHT * interruption_score
            + GOAL_WEIGHT * goal_score,
    );

    EfficiencyBreakdown {
        focus_score,
        task_completion_score,
        balance_score,
        interruption_score,
        goal_score,
        total_score,
    }
}

/// `min(focus/total·100, 80) + min(deep/120, 1)·20`, capped at 100.
pub fn focus_score(focus_minutes: f64, deep_work_minutes: f64, total_minutes: f64) -> f64 {
    if total_minutes <= 0.0 {
        return 0.0;
    }
    let share = (focus_minutes / total_minutes * 100.0).min(80.0);
    let deep = (deep_work_minutes / DEEP_WORK_TARGET_MINUTES).min(1.0) * 20.0;
    (share + deep).min(100.0)
}

pub fn task_completion_score(productive_minutes: f64, total_minutes: f64) -> f64 {
    if total_minutes <= 0.0 {
        return 0.0;
    }
    (productive_minutes / total_minutes * 100.0).clamp(0.0, 100.0)
}

/// Penalise deviation of the observed break ratio from the ideal.
pub fn balance_score(break_ratio: f64) -> f64 {
    let deviation = (break_ratio - IDEAL_BREAK_RATIO).abs();
    if deviation <= 0.05 {
        100.0
    } else if deviation <= 0.10 {
        80.0
    } else if deviation <= 0.20 {
        60.0
    } else {
        (100.0 - deviation * 200.0).max(40.0)
    }
}

pub fn interruption_score(switches_per_hour: f64) -> f64 {
    if switches_per_hour <= 5.0 {
        100.0
    } else if switches_per_hour <= 10.0 {
        90.0
    } else if switches_per_hour <= 20.0 {
        70.0
    } else if switches_per_hour <= 30.0 {
        50.0
    } else {
        (100.0 - switches_per_hour * 2.0).max(20.0)
    }
}

/// Percentage of evaluable active goals met; neutral when there are none.
fn goal_score(sessions: &[&AppSession], goals: &[UserGoal]) -> f64 {
    let results: Vec<bool> = goals
        .iter()
        .filter(|goal| goal.is_active)
        .filter_map(|goal| goal.is_met(goal_minutes(sessions, goal)))
        .collect();
    if results.is_empty() {
        return NEUTRAL_GOAL_SCORE;
    }
    let met = results.iter().filter(|met| **met).count();
    met as f64 / results.len() as f64 * 100.0
}

fn goal_minutes(sessions: &[&AppSession], goal: &UserGoal) -> f64 {
    let target = goal.target_id.as_str();
    sessions
        .iter()
        .filter(|s| match goal.target_type {
            GoalTargetType::App => s.process_name.eq_ignore_ascii_case(target),
            GoalTargetType::Category => s.category.eq_ignore_ascii_case(target),
            GoalTargetType::Context => s.context.to_string().eq_ignore_ascii_case(target),
            GoalTargetType::Total => true,
        })
        .map(|s| s.duration_minutes())
        .sum()
}
