//! Vibe Server Library
//!
//! Geotagged play reports in, "what is trending around here" out.

pub mod config;
pub mod error;
pub mod geo;
pub mod ranking;
pub mod server;
pub mod sqlite_persistence;
pub mod vibe_store;

// Re-export commonly used types for convenience
pub use error::{VibeError, VibeResult};
pub use server::{run_server, RequestsLoggingLevel};
pub use vibe_store::{SqliteVibeStore, VibeStore};
