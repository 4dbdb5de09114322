//! Integration tests for the ingestion service

mod support;

use std::sync::Arc;

use deskpulse_core::classification::CategoryClassifier;
use deskpulse_core::ingestion::{FrameOutcome, IngestionEvent, IngestionService};
use deskpulse_domain::{ContextType, WebActivityKind, WebSessionKey};
use support::fixtures::at_ms;
use support::repositories::MockSessionRepository;
use tokio::sync::broadcast::Receiver;

fn service(repository: Arc<MockSessionRepository>) -> IngestionService {
    IngestionService::new(Arc::new(CategoryClassifier::default()), repository)
}

fn page_view(tab: i64, url: &str) -> String {
    format!(r#"{{"type":"pageView","tabId":{tab},"url":"{url}","title":"Page {tab}"}}"#)
}

fn drain(rx: &mut Receiver<IngestionEvent>) -> Vec<IngestionEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

#[tokio::test]
async fn test_disconnect_closes_every_open_session() {
    let repository = Arc::new(MockSessionRepository::new());
    let ingestion = service(Arc::clone(&repository));
    let mut rx = ingestion.subscribe();

    let client = ingestion.connect();
    let handshake = ingestion
        .handle_frame_at(client, r#"{"type":"connection","browser":"firefox","version":"125"}"#, at_ms(0))
        .await;
    assert_eq!(handshake, FrameOutcome::Handshake);

    // three page views over two tabs: tab 1 is superseded once
    ingestion.handle_frame_at(client, &page_view(1, "https://github.com/rust-lang"), at_ms(1_000)).await;
    ingestion.handle_frame_at(client, &page_view(1, "https://docs.rs/tokio"), at_ms(5_000)).await;
    ingestion.handle_frame_at(client, &page_view(2, "https://www.reddit.com/r/rust"), at_ms(6_000)).await;
    assert_eq!(ingestion.registry().open_for_client(client), 2);
    assert_eq!(repository.web_sessions().len(), 1);

    let closed = ingestion.disconnect_at(client, at_ms(10_000)).await;
    assert_eq!(closed, 2);
    assert_eq!(ingestion.registry().open_count(), 0);

    let saved = repository.web_sessions();
    assert_eq!(saved.len(), 3);
    assert!(saved.iter().all(|s| s.end_time.is_some() && s.browser == "firefox"));
    let superseded = &saved[0];
    assert_eq!(superseded.domain, "github.com");
    assert_eq!(superseded.duration_secs, 4);
    assert!(saved.iter().any(|s| s.domain == "reddit.com" && s.context == ContextType::SocialMedia));

    let events = drain(&mut rx);
    let disconnects: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            IngestionEvent::ClientDisconnected { client_id, closed_sessions } => Some((*client_id, *closed_sessions)),
            _ => None,
        })
        .collect();
    assert_eq!(disconnects, vec![(client, 2)]);
    let closed_events = events.iter().filter(|e| matches!(e, IngestionEvent::WebSessionClosed(_))).count();
    assert_eq!(closed_events, 3);
}

#[tokio::test]
async fn test_same_tab_id_on_two_clients_is_independent() {
    let repository = Arc::new(MockSessionRepository::new());
    let ingestion = service(Arc::clone(&repository));

    let chrome = ingestion.connect();
    let edge = ingestion.connect();
    assert_ne!(chrome, edge);

    ingestion.handle_frame_at(chrome, &page_view(7, "https://github.com"), at_ms(0)).await;
    ingestion.handle_frame_at(edge, &page_view(7, "https://news.ycombinator.com"), at_ms(100)).await;
    assert_eq!(ingestion.registry().open_count(), 2);

    let close = r#"{"type":"tabClose","tabId":7}"#;
    ingestion.handle_frame_at(chrome, close, at_ms(2_000)).await;

    assert!(ingestion.registry().get(WebSessionKey::new(chrome, 7)).is_none());
    let edge_session = ingestion.registry().get(WebSessionKey::new(edge, 7)).unwrap();
    assert_eq!(edge_session.domain, "news.ycombinator.com");
    assert_eq!(repository.web_sessions().len(), 1);
}

#[tokio::test]
async fn test_malformed_and_unknown_frames_are_dropped() {
    let repository = Arc::new(MockSessionRepository::new());
    let ingestion = service(Arc::clone(&repository));
    let client = ingestion.connect();

    assert_eq!(ingestion.handle_frame_at(client, "{not json", at_ms(0)).await, FrameOutcome::Malformed);
    assert_eq!(
        ingestion.handle_frame_at(client, r#"{"type":"heartbeat","tabId":1}"#, at_ms(0)).await,
        FrameOutcome::Discarded
    );
    assert_eq!(
        ingestion.handle_frame_at(client, r#"{"type":"pageView","tabId":2,"title":"No url"}"#, at_ms(0)).await,
        FrameOutcome::Malformed
    );
    assert_eq!(
        ingestion.handle_frame_at(client, r#"{"type":"search","tabId":2,"url":"  ","query":"rust"}"#, at_ms(0)).await,
        FrameOutcome::Malformed
    );
    assert_eq!(ingestion.registry().open_count(), 0);
    assert!(repository.web_sessions().is_empty());

    // the connection keeps working after bad frames
    assert_eq!(
        ingestion.handle_frame_at(client, &page_view(3, "https://crates.io"), at_ms(10)).await,
        FrameOutcome::Activity
    );
    assert_eq!(ingestion.registry().open_count(), 1);
}

#[tokio::test]
async fn test_activity_events_carry_classification() {
    let repository = Arc::new(MockSessionRepository::new());
    let ingestion = service(repository);
    let mut rx = ingestion.subscribe();
    let client = ingestion.connect();

    let search = r#"{"type":"search","tabId":4,"url":"https://www.google.com/search?q=tokio","query":"tokio","engine":"google","browser":"chrome"}"#;
    ingestion.handle_frame_at(client, search, at_ms(0)).await;

    let activity = drain(&mut rx).into_iter().find_map(|e| match e {
        IngestionEvent::WebActivity(activity) => Some(activity),
        _ => None,
    });
    let activity = activity.unwrap();
    assert_eq!(activity.domain, "google.com");
    assert_eq!(activity.browser, "chrome");
    assert_eq!(activity.category, "Search");
    assert!(matches!(activity.kind, WebActivityKind::Search { ref query, .. } if query == "tokio"));
    // search does not open a session
    assert_eq!(ingestion.registry().open_count(), 0);
}

#[tokio::test]
async fn test_disconnect_without_sessions_emits_once() {
    let ingestion = service(Arc::new(MockSessionRepository::new()));
    let mut rx = ingestion.subscribe();
    let client = ingestion.connect();

    assert_eq!(ingestion.disconnect_at(client, at_ms(0)).await, 0);
    let events = drain(&mut rx);
    assert_eq!(events.len(), 2);
    assert!(matches!(events[1], IngestionEvent::ClientDisconnected { closed_sessions: 0, .. }));
}
