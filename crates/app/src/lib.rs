//! # DeskPulse App
//!
//! Process wiring layer.
//!
//! This crate contains:
//! - Application context (dependency injection and lifecycle)
//! - Health reporting
//! - Main entry point
//!
//! ## Architecture
//! - Depends on `domain`, `core`, and `infra`
//! - Wires the capture pipeline, ingestion server and analysis scheduler
//!   around one session store

pub mod context;
pub mod utils;

pub use context::*;
