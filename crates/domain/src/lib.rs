//! # DeskPulse Domain
//!
//! Data types shared by every DeskPulse crate.
//!
//! This crate contains:
//! - Raw input, app session, web session and hourly bucket types
//! - Analysis outputs (focus sessions, patterns, efficiency breakdowns)
//! - Domain error types and Result definitions
//! - Configuration structures and threshold constants
//!
//! ## Architecture
//! - No dependencies on other DeskPulse crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod config;
pub mod constants;
pub mod errors;
pub mod macros;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
