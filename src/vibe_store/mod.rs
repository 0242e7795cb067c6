mod models;
mod schema;
mod store;
mod trait_def;

pub use models::*;
pub use schema::VIBE_VERSIONED_SCHEMAS;
pub use store::SqliteVibeStore;
pub use trait_def::VibeStore;
