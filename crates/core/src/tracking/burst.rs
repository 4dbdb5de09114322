//! Typing burst detection
//!
//! A burst is a contiguous run of qualifying key presses in one process with
//! no gap longer than the idle threshold. Bursts close on an idle gap (seen
//! either by the next key or by the periodic idle check) or on a process
//! switch, and are only emitted when long enough and dense enough.

use chrono::{DateTime, Duration, Utc};
use deskpulse_domain::constants::{BURST_IDLE_GAP_MS, BURST_MIN_DURATION_MS, BURST_MIN_KEYS};
use deskpulse_domain::TypingBurst;

/// Thresholds for burst segmentation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BurstConfig {
    pub idle_gap: Duration,
    pub min_duration: Duration,
    pub min_keys: u32,
}

impl Default for BurstConfig {
    fn default() -> Self {
        Self {
            idle_gap: Duration::milliseconds(BURST_IDLE_GAP_MS),
            min_duration: Duration::milliseconds(BURST_MIN_DURATION_MS),
            min_keys: BURST_MIN_KEYS,
        }
    }
}

#[derive(Debug, Clone)]
struct OpenBurst {
    start: DateTime<Utc>,
    last_key: DateTime<Utc>,
    key_count: u32,
    process: String,
}

#[derive(Debug, Default)]
pub struct BurstDetector {
    config: BurstConfig,
    current: Option<OpenBurst>,
}

impl BurstDetector {
    pub fn new(config: BurstConfig) -> Self {
        Self { config, current: None }
    }

    /// Record one qualifying key press for `process`.
    ///
    /// Returns the previous burst when this press closed it and it met the
    /// emission thresholds.
    pub fn record_key(&mut self, process: &str, at: DateTime<Utc>) -> Option<TypingBurst> {
        let must_close = self.current.as_ref().is_some_and(|open| {
            open.process != process || at - open.last_key > self.config.idle_gap
        });
        let closed = if must_close { self.close() } else { None };

        match self.current.as_mut() {
            Some(open) => {
                open.key_count += 1;
                open.last_key = open.last_key.max(at);
            }
            None => {
                self.current = Some(OpenBurst {
                    start: at,
                    last_key: at,
                    key_count: 1,
                    process: process.to_string(),
                });
            }
        }
        closed
    }

    /// Close the open burst when no key has arrived for longer than the idle gap.
    pub fn check_idle(&mut self, now: DateTime<Utc>) -> Option<TypingBurst> {
        let idle = self.current.as_ref().is_some_and(|open| now - open.last_key > self.config.idle_gap);
        if idle {
            self.close()
        } else {
            None
        }
    }

    /// Close the open burst unconditionally (process switch, shutdown).
    pub fn close(&mut self) -> Option<TypingBurst> {
        let open = self.current.take()?;
        let duration = open.last_key - open.start;
        if duration < self.config.min_duration || open.key_count < self.config.min_keys {
            return None;
        }
        Some(TypingBurst {
            start_time: open.start,
            duration_ms: duration.num_milliseconds(),
            key_count: open.key_count,
            context: open.process,
        })
    }

    /// Keys counted in the open burst, zero when idle.
    pub fn open_key_count(&self) -> u32 {
        self.current.as_ref().map_or(0, |open| open.key_count)
    }

    pub fn is_open(&self) -> bool {
        self.current.is_some()
    }
}
