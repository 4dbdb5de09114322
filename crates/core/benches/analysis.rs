use chrono::{Duration, FixedOffset, TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use deskpulse_core::analysis::{calculate_efficiency, detect_patterns, segment_focus_sessions};
use deskpulse_core::classification::CategoryClassifier;
use deskpulse_domain::{AppSession, GoalTargetType, ResolvedApp, UserGoal};

const PROCESSES: &[&str] = &["code.exe", "chrome.exe", "slack.exe", "outlook.exe", "teams.exe"];

/// An eight-hour day of sessions with an uneven switching rhythm.
fn sample_day() -> Vec<AppSession> {
    let classifier = CategoryClassifier::default();
    let start = Utc.with_ymd_and_hms(2024, 4, 2, 8, 0, 0).single().unwrap();
    let mut at = start;
    let mut sessions = Vec::new();
    let mut idx = 0usize;
    while at < start + Duration::hours(8) {
        let app = ResolvedApp::named(PROCESSES[idx % PROCESSES.len()], "window");
        let length = Duration::seconds(30 + ((idx * 97) % 1_500) as i64);
        let mut session = AppSession::open(&app, &classifier.classify_app(&app), at);
        session.close(at + length);
        sessions.push(session);
        at = at + length + Duration::seconds((idx % 4) as i64 * 20);
        idx += 1;
    }
    sessions
}

fn analysis_benchmark(c: &mut Criterion) {
    let sessions = sample_day();
    let goals = vec![
        UserGoal::target(GoalTargetType::Context, "development", 120),
        UserGoal::limit(GoalTargetType::App, "slack.exe", 45),
    ];
    let offset = FixedOffset::east_opt(0).unwrap();

    let mut group = c.benchmark_group("analysis");
    group.sample_size(50);

    group.bench_function("segment_focus_sessions", |b| {
        b.iter(|| segment_focus_sessions(black_box(&sessions)));
    });

    group.bench_function("calculate_efficiency", |b| {
        b.iter(|| calculate_efficiency(black_box(&sessions), black_box(&goals)));
    });

    group.bench_function("detect_patterns", |b| {
        b.iter(|| detect_patterns(black_box(&sessions), offset));
    });

    group.finish();
}

fn classifier_benchmark(c: &mut Criterion) {
    let classifier = CategoryClassifier::default();
    let domains = ["github.com", "mail.google.com", "news.ycombinator.com", "example.org"];

    c.bench_function("classify_domain", |b| {
        b.iter(|| {
            for domain in domains {
                black_box(classifier.classify_domain(black_box(domain)));
            }
        });
    });
}

criterion_group!(core_benchmarks, analysis_benchmark, classifier_benchmark);
criterion_main!(core_benchmarks);
