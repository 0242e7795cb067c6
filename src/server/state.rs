use axum::extract::FromRef;

use crate::ranking::{ScanOrchestrator, VibeRanker};
use crate::vibe_store::VibeStore;
use std::sync::Arc;
use std::time::Instant;

use super::ServerConfig;

pub type GuardedVibeStore = Arc<dyn VibeStore>;

#[derive(Clone)]
pub struct ServerState {
    pub config: ServerConfig,
    pub start_time: Instant,
    pub vibe_store: GuardedVibeStore,
    pub orchestrator: ScanOrchestrator,
}

impl ServerState {
    pub fn new(config: ServerConfig, vibe_store: GuardedVibeStore) -> Self {
        let orchestrator = ScanOrchestrator::new(VibeRanker::new(vibe_store.clone()));
        ServerState {
            config,
            start_time: Instant::now(),
            vibe_store,
            orchestrator,
        }
    }
}

impl FromRef<ServerState> for GuardedVibeStore {
    fn from_ref(input: &ServerState) -> Self {
        input.vibe_store.clone()
    }
}

impl FromRef<ServerState> for ServerConfig {
    fn from_ref(input: &ServerState) -> Self {
        input.config.clone()
    }
}

impl FromRef<ServerState> for ScanOrchestrator {
    fn from_ref(input: &ServerState) -> Self {
        input.orchestrator.clone()
    }
}
