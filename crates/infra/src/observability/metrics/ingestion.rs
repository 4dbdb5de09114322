//! Ingestion server metrics
//!
//! Connection and frame counters for the browser WebSocket endpoint.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::observability::MetricsResult;

/// Snapshot of ingestion statistics at a point in time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize)]
pub struct IngestionStats {
    pub connections_opened: u64,
    pub connections_closed: u64,
    /// Connections currently open
    pub active_connections: u64,
    /// Text frames handed to the ingestion service
    pub frames_received: u64,
    /// Frames that were malformed, unknown or not text
    pub frames_dropped: u64,
}

/// Metrics for the ingestion server
#[derive(Debug, Default)]
pub struct IngestionMetrics {
    connections_opened: AtomicU64,
    connections_closed: AtomicU64,
    frames_received: AtomicU64,
    frames_dropped: AtomicU64,
}

impl IngestionMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_connection_opened(&self) -> MetricsResult<()> {
        self.connections_opened.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    pub fn record_connection_closed(&self) -> MetricsResult<()> {
        self.connections_closed.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    pub fn record_frame_received(&self) -> MetricsResult<()> {
        self.frames_received.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    pub fn record_frame_dropped(&self) -> MetricsResult<()> {
        self.frames_dropped.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Get ingestion statistics as a structured snapshot
    ///
    /// `active_connections` is derived from the open/close counters and may
    /// lag by one while a connection is being torn down.
    pub fn stats(&self) -> IngestionStats {
        let opened = self.connections_opened.load(Ordering::Relaxed);
        let closed = self.connections_closed.load(Ordering::Relaxed);
        IngestionStats {
            connections_opened: opened,
            connections_closed: closed,
            active_connections: opened.saturating_sub(closed),
            frames_received: self.frames_received.load(Ordering::Relaxed),
            frames_dropped: self.frames_dropped.load(Ordering::Relaxed),
        }
    }

    /// Reset all counters to zero
    pub fn reset(&self) -> MetricsResult<()> {
        self.connections_opened.store(0, Ordering::Relaxed);
        self.connections_closed.store(0, Ordering::Relaxed);
        self.frames_received.store(0, Ordering::Relaxed);
        self.frames_dropped.store(0, Ordering::Relaxed);
        Ok(())
    }
}
