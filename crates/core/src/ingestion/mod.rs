//! Browser activity ingestion

pub mod messages;
pub mod registry;
pub mod service;

pub use messages::ActivityMessage;
pub use registry::WebSessionRegistry;
pub use service::{FrameOutcome, IngestionEvent, IngestionService};
