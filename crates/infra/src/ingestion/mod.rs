//! Browser activity ingestion over WebSocket

pub mod server;

pub use server::IngestionServer;
