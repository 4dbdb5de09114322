//! Browser activity ingestion - transport independent
//!
//! Connection handlers call [`IngestionService::connect`], then
//! [`IngestionService::handle_frame`] per text frame and finally
//! [`IngestionService::disconnect`]. All methods take `&self` and are safe to
//! call concurrently from many handler tasks.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use deskpulse_domain::{
    ClientId, WebActivityEvent, WebActivityKind, WebSession, WebSessionKey, WebSessionParams,
};
use tokio::sync::broadcast;
use tracing::{debug, warn};

use super::messages::{ActivityMessage, PageInfo};
use super::registry::WebSessionRegistry;
use crate::classification::{extract_domain, CategoryClassifier};
use crate::tracking::ports::SessionRepository;

const EVENT_CHANNEL_CAPACITY: usize = 1024;
const UNKNOWN_BROWSER: &str = "unknown";

/// Notifications published by the ingestion service
#[derive(Debug, Clone, PartialEq)]
pub enum IngestionEvent {
    ClientConnected { client_id: ClientId },
    WebActivity(WebActivityEvent),
    WebSessionClosed(WebSession),
    ClientDisconnected { client_id: ClientId, closed_sessions: usize },
}

/// How a single frame was handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    Handshake,
    Activity,
    /// Valid JSON with an unrecognised `type`.
    Discarded,
    /// Undecodable frame, or an activity without a url; dropped.
    Malformed,
}

pub struct IngestionService {
    registry: WebSessionRegistry,
    classifier: Arc<CategoryClassifier>,
    repository: Arc<dyn SessionRepository>,
    events: broadcast::Sender<IngestionEvent>,
}

impl IngestionService {
    pub fn new(classifier: Arc<CategoryClassifier>, repository: Arc<dyn SessionRepository>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self { registry: WebSessionRegistry::new(), classifier, repository, events }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<IngestionEvent> {
        self.events.subscribe()
    }

    pub fn registry(&self) -> &WebSessionRegistry {
        &self.registry
    }

    /// Accept a new connection and assign it a client id.
    pub fn connect(&self) -> ClientId {
        let client_id = self.registry.register_client();
        debug!(%client_id, "ingestion client connected");
        self.publish(IngestionEvent::ClientConnected { client_id });
        client_id
    }

    /// Decode and apply one text frame.
    pub async fn handle_frame(&self, client_id: ClientId, text: &str) -> FrameOutcome {
        self.handle_frame_at(client_id, text, Utc::now()).await
    }

    /// [`Self::handle_frame`] with an explicit receipt time.
    pub async fn handle_frame_at(
        &self,
        client_id: ClientId,
        text: &str,
        received: DateTime<Utc>,
    ) -> FrameOutcome {
        match ActivityMessage::decode(text) {
            Ok(message) => self.apply(client_id, message, received).await,
            Err(err) => {
                warn!(%client_id, error = %err, "dropping malformed ingestion frame");
                FrameOutcome::Malformed
            }
        }
    }

    /// Apply a decoded message.
    pub async fn apply(
        &self,
        client_id: ClientId,
        message: ActivityMessage,
        received: DateTime<Utc>,
    ) -> FrameOutcome {
        let kind = match &message {
            ActivityMessage::Connection(info) => {
                let browser = info.browser.as_deref().unwrap_or(UNKNOWN_BROWSER);
                self.registry.set_browser(client_id, browser);
                debug!(%client_id, browser, "ingestion handshake");
                return FrameOutcome::Handshake;
            }
            ActivityMessage::Discard => {
                debug!(%client_id, "discarding unrecognised message type");
                return FrameOutcome::Discarded;
            }
            ActivityMessage::PageView(_) => WebActivityKind::PageView,
            ActivityMessage::TabActivate(_) => WebActivityKind::TabActivate,
            ActivityMessage::PageClose(_) => WebActivityKind::PageClose,
            ActivityMessage::TabClose(_) => WebActivityKind::TabClose,
            ActivityMessage::Navigation(_) => WebActivityKind::Navigation,
            ActivityMessage::Scroll(info) => WebActivityKind::Scroll { percentage: info.percentage },
            ActivityMessage::Click(info) => WebActivityKind::Click {
                element: info.element.clone(),
                x: info.coordinates.map(|c| c.x),
                y: info.coordinates.map(|c| c.y),
            },
            ActivityMessage::FormSubmit(info) => WebActivityKind::FormSubmit { element: info.element.clone() },
            ActivityMessage::Search(info) => WebActivityKind::Search {
                query: info.query.clone(),
                engine: info.engine.clone(),
            },
        };
        let Some(page) = message.page() else {
            return FrameOutcome::Discarded;
        };
        if message.requires_url() && page.url.trim().is_empty() {
            warn!(%client_id, message_type = message.type_name(), "dropping activity without a url");
            return FrameOutcome::Malformed;
        }

        let key = WebSessionKey::new(client_id, page.tab_id);
        let at = page.timestamp_or(received);
        let browser = self.browser_for(client_id, page);
        let domain = extract_domain(&page.url);
        let classification = self.classifier.classify_domain(&domain);

        match kind {
            WebActivityKind::PageView | WebActivityKind::TabActivate => {
                let session = WebSession::open(WebSessionParams {
                    key,
                    url: page.url.clone(),
                    title: page.title.clone(),
                    domain: domain.clone(),
                    browser: browser.clone(),
                    classification: classification.clone(),
                    start_time: at,
                });
                if let Some(superseded) = self.registry.open(session) {
                    self.finish_session(superseded).await;
                }
            }
            WebActivityKind::PageClose | WebActivityKind::TabClose => {
                if let Some(closed) = self.registry.close(key, at) {
                    self.finish_session(closed).await;
                }
            }
            _ => {}
        }

        self.publish(IngestionEvent::WebActivity(WebActivityEvent {
            key,
            kind,
            url: page.url.clone(),
            domain,
            title: page.title.clone(),
            browser,
            category: classification.category,
            context: classification.context,
            timestamp: at,
        }));
        FrameOutcome::Activity
    }

    /// Purge every session of `client_id` and announce the disconnect once.
    pub async fn disconnect(&self, client_id: ClientId) -> usize {
        self.disconnect_at(client_id, Utc::now()).await
    }

    pub async fn disconnect_at(&self, client_id: ClientId, at: DateTime<Utc>) -> usize {
        let closed = self.registry.purge_client(client_id, at);
        let closed_sessions = closed.len();
        for session in closed {
            self.finish_session(session).await;
        }
        debug!(%client_id, closed_sessions, "ingestion client disconnected");
        self.publish(IngestionEvent::ClientDisconnected { client_id, closed_sessions });
        closed_sessions
    }

    fn browser_for(&self, client_id: ClientId, page: &PageInfo) -> String {
        page.browser
            .clone()
            .or_else(|| self.registry.browser(client_id))
            .unwrap_or_else(|| UNKNOWN_BROWSER.to_string())
    }

    async fn finish_session(&self, session: WebSession) {
        if let Err(err) = self.repository.save_web_session(session.clone()).await {
            warn!(
                client_id = %session.client_id,
                tab_id = session.tab_id,
                error = %err,
                "failed to save web session"
            );
        }
        self.publish(IngestionEvent::WebSessionClosed(session));
    }

    fn publish(&self, event: IngestionEvent) {
        let _ = self.events.send(event);
    }
}
