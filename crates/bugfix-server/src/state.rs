use std::sync::Arc;

use claude_agent::Dispatcher;

use crate::config::ServerConfig;
use crate::logs::LogStore;

/// Shared application state passed to all route handlers.
///
/// Immutable after startup; clones share the same dispatcher.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub dispatcher: Arc<Dispatcher>,
    pub logs: LogStore,
}

impl AppState {
    pub fn new(config: ServerConfig, dispatcher: Dispatcher) -> Self {
        let logs = LogStore::new(config.root.clone(), config.log_dir.clone());
        Self {
            config: Arc::new(config),
            dispatcher: Arc::new(dispatcher),
            logs,
        }
    }
}
