//! Browser agent wire messages
//!
//! One JSON object per text frame, discriminated by `type`. Unknown types
//! decode to [`ActivityMessage::Discard`]; malformed JSON fails to decode and
//! is dropped by the caller.

use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;
use serde_json::Value;

/// Decoded browser message
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ActivityMessage {
    /// Handshake carrying the browser name; not an activity.
    Connection(ConnectionInfo),
    PageView(PageInfo),
    TabActivate(PageInfo),
    PageClose(PageInfo),
    TabClose(PageInfo),
    Scroll(ScrollInfo),
    Click(ClickInfo),
    FormSubmit(FormInfo),
    Search(SearchInfo),
    Navigation(PageInfo),
    #[serde(other)]
    Discard,
}

impl ActivityMessage {
    pub fn decode(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    /// Page fields shared by every activity variant.
    pub fn page(&self) -> Option<&PageInfo> {
        match self {
            Self::PageView(page)
            | Self::TabActivate(page)
            | Self::PageClose(page)
            | Self::TabClose(page)
            | Self::Navigation(page) => Some(page),
            Self::Scroll(info) => Some(&info.page),
            Self::Click(info) => Some(&info.page),
            Self::FormSubmit(info) => Some(&info.page),
            Self::Search(info) => Some(&info.page),
            Self::Connection(_) | Self::Discard => None,
        }
    }

    /// Every activity carries its page URL except closes, which are keyed by tab alone.
    pub fn requires_url(&self) -> bool {
        !matches!(
            self,
            Self::PageClose(_) | Self::TabClose(_) | Self::Connection(_) | Self::Discard
        )
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Connection(_) => "connection",
            Self::PageView(_) => "pageView",
            Self::TabActivate(_) => "tabActivate",
            Self::PageClose(_) => "pageClose",
            Self::TabClose(_) => "tabClose",
            Self::Scroll(_) => "scroll",
            Self::Click(_) => "click",
            Self::FormSubmit(_) => "formSubmit",
            Self::Search(_) => "search",
            Self::Navigation(_) => "navigation",
            Self::Discard => "discard",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionInfo {
    #[serde(default)]
    pub browser: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub browser: Option<String>,
    #[serde(default)]
    pub tab_id: i64,
    /// ISO-8601 string or epoch milliseconds.
    #[serde(default)]
    pub timestamp: Option<Value>,
}

impl PageInfo {
    /// Message timestamp, or `received` when absent or unparseable.
    pub fn timestamp_or(&self, received: DateTime<Utc>) -> DateTime<Utc> {
        match &self.timestamp {
            Some(Value::String(text)) => DateTime::parse_from_rfc3339(text)
                .map(|ts| ts.with_timezone(&Utc))
                .unwrap_or(received),
            Some(Value::Number(n)) => n
                .as_i64()
                .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
                .unwrap_or(received),
            _ => received,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ScrollInfo {
    #[serde(flatten)]
    pub page: PageInfo,
    #[serde(default)]
    pub percentage: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Coordinates {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ClickInfo {
    #[serde(flatten)]
    pub page: PageInfo,
    #[serde(default)]
    pub element: Option<String>,
    #[serde(default)]
    pub coordinates: Option<Coordinates>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FormInfo {
    #[serde(flatten)]
    pub page: PageInfo,
    #[serde(default)]
    pub element: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SearchInfo {
    #[serde(flatten)]
    pub page: PageInfo,
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub engine: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_page_view() {
        let msg = ActivityMessage::decode(
            r#"{"type":"pageView","url":"https://docs.rs/axum","title":"axum","tabId":4,"browser":"chrome"}"#,
        )
        .unwrap();
        let page = msg.page().unwrap();
        assert_eq!(msg.type_name(), "pageView");
        assert_eq!(page.tab_id, 4);
        assert_eq!(page.browser.as_deref(), Some("chrome"));
    }

    #[test]
    fn test_decode_type_specific_fields() {
        let msg = ActivityMessage::decode(
            r#"{"type":"search","url":"https://duckduckgo.com/?q=rust","tabId":1,"query":"rust","engine":"ddg"}"#,
        )
        .unwrap();
        match msg {
            ActivityMessage::Search(info) => {
                assert_eq!(info.query, "rust");
                assert_eq!(info.page.tab_id, 1);
            }
            other => panic!("unexpected message: {other:?}"),
        }

        let scroll = ActivityMessage::decode(r#"{"type":"scroll","url":"https://a.b","percentage":75}"#).unwrap();
        assert!(matches!(scroll, ActivityMessage::Scroll(ScrollInfo { percentage, .. }) if (percentage - 75.0).abs() < 1e-9));
    }

    #[test]
    fn test_closes_do_not_require_url() {
        let view = ActivityMessage::decode(r#"{"type":"pageView","tabId":2}"#).unwrap();
        assert!(view.requires_url());
        assert_eq!(view.page().map(|page| page.url.as_str()), Some(""));

        let close = ActivityMessage::decode(r#"{"type":"tabClose","tabId":2}"#).unwrap();
        assert!(!close.requires_url());
    }

    #[test]
    fn test_unknown_type_is_discarded() {
        let msg = ActivityMessage::decode(r#"{"type":"heartbeat","url":"x"}"#).unwrap();
        assert_eq!(msg, ActivityMessage::Discard);
    }

    #[test]
    fn test_malformed_json_fails() {
        assert!(ActivityMessage::decode("{not json").is_err());
        assert!(ActivityMessage::decode(r#"{"url":"https://a.b"}"#).is_err());
    }

    #[test]
    fn test_timestamp_parsing() {
        let received = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut page = PageInfo::default();
        assert_eq!(page.timestamp_or(received), received);

        page.timestamp = Some(Value::String("2024-03-05T10:15:00Z".into()));
        assert_eq!(page.timestamp_or(received), Utc.with_ymd_and_hms(2024, 3, 5, 10, 15, 0).unwrap());

        page.timestamp = Some(Value::from(1_700_000_000_000_i64));
        assert_eq!(page.timestamp_or(received).timestamp(), 1_700_000_000);

        page.timestamp = Some(Value::String("yesterday".into()));
        assert_eq!(page.timestamp_or(received), received);
    }
}
