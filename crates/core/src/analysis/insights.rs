//! Rule-based insights over a daily report

use deskpulse_domain::{DailyReport, Insight, InsightKind, InsightPriority};

const STRONG_FOCUS: f64 = 70.0;
const WEAK_FOCUS: f64 = 40.0;
const DEEP_WORK_HIGHLIGHT_MINUTES: f64 = 60.0;
const FRAGMENTED_MIN_ACTIVE_MINUTES: f64 = 60.0;
const HEAVY_INTERRUPTION: f64 = 50.0;
const POOR_BALANCE: f64 = 60.0;
const MISSED_GOALS: f64 = 50.0;

/// Derive insights from a report, highest priority first.
///
/// The order of equal-priority insights is stable.
pub fn generate_insights(report: &DailyReport) -> Vec<Insight> {
    let efficiency = &report.efficiency;
    let mut insights = Vec::new();

    if efficiency.focus_score >= STRONG_FOCUS {
        insights.push(insight(
            InsightKind::Focus,
            InsightPriority::Low,
            "Strong focus",
            format!("Focus score of {:.1} today.", efficiency.focus_score),
        ));
    } else if efficiency.focus_score < WEAK_FOCUS && report.total_minutes > FRAGMENTED_MIN_ACTIVE_MINUTES {
        insights.push(insight(
            InsightKind::Focus,
            InsightPriority::High,
            "Fragmented attention",
            format!(
                "Only {:.1} focus score across {:.0} active minutes. Try blocking time for a single task.",
                efficiency.focus_score, report.total_minutes
            ),
        ));
    }

    let deep_minutes: f64 =
        report.focus_sessions.iter().filter(|f| f.is_deep_work).map(|f| f.duration_minutes).sum();
    if deep_minutes >= DEEP_WORK_HIGHLIGHT_MINUTES {
        insights.push(insight(
            InsightKind::Focus,
            InsightPriority::Medium,
            "Deep work achieved",
            format!("{deep_minutes:.0} minutes of deep work."),
        ));
    }

    if report.session_count > 0 && efficiency.interruption_score <= HEAVY_INTERRUPTION {
        insights.push(insight(
            InsightKind::Distraction,
            InsightPriority::High,
            "Frequent app switching",
            "Switching between apps is breaking up your work. Batch messages and notifications.".into(),
        ));
    }

    if report.session_count > 0 && efficiency.balance_score <= POOR_BALANCE {
        insights.push(insight(
            InsightKind::Balance,
            InsightPriority::Medium,
            "Break balance is off",
            "Your break time is far from the recommended share of the day.".into(),
        ));
    }

    if report.session_count > 0 {
        if efficiency.goal_score < MISSED_GOALS {
            insights.push(insight(
                InsightKind::Goal,
                InsightPriority::High,
                "Goals missed",
                format!("Goal score of {:.0} today.", efficiency.goal_score),
            ));
        } else if efficiency.goal_score >= 100.0 {
            insights.push(insight(
                InsightKind::Goal,
                InsightPriority::Low,
                "All goals met",
                "Every active goal was met today.".into(),
            ));
        }
    }

    if !report.peak_hours.is_empty() {
        let hours: Vec<String> = report.peak_hours.iter().map(|h| format!("{h:02}:00")).collect();
        insights.push(insight(
            InsightKind::PeakTime,
            InsightPriority::Low,
            "Peak hours",
            format!("You were most active at {}.", hours.join(", ")),
        ));
    }

    insights.sort_by_key(|i| i.priority);
    insights
}

fn insight(kind: InsightKind, priority: InsightPriority, title: &str, message: String) -> Insight {
    Insight { kind, priority, title: title.to_string(), message }
}
