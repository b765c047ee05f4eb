//! Application state.

use std::sync::Arc;

use mezzo_pipeline::{Dispatcher, PipelineConfig, StateNotifier, TimeoutSweeper, WebhookReceiver};
use mezzo_store::MemoryStore;
use mezzo_worker::HttpWorkerClient;

use crate::config::ApiConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub store: Arc<MemoryStore>,
    pub dispatcher: Arc<Dispatcher<MemoryStore, HttpWorkerClient>>,
    pub receiver: Arc<WebhookReceiver<MemoryStore>>,
    pub notifier: StateNotifier,
    pub pipeline_config: PipelineConfig,
}

impl AppState {
    /// Create new application state from the environment.
    pub fn new(config: ApiConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let worker = Arc::new(HttpWorkerClient::from_env()?);
        Ok(Self::from_parts(
            config,
            PipelineConfig::from_env(),
            Arc::new(MemoryStore::new()),
            worker,
        ))
    }

    /// Assemble state from pre-built components (tests, embedding).
    pub fn from_parts(
        config: ApiConfig,
        pipeline_config: PipelineConfig,
        store: Arc<MemoryStore>,
        worker: Arc<HttpWorkerClient>,
    ) -> Self {
        let notifier = StateNotifier::new();
        let dispatcher = Arc::new(Dispatcher::new(
            Arc::clone(&store),
            worker,
            notifier.clone(),
            pipeline_config.clone(),
        ));
        let receiver = Arc::new(WebhookReceiver::new(
            Arc::clone(&store),
            notifier.clone(),
            pipeline_config.clone(),
        ));

        Self {
            config,
            store,
            dispatcher,
            receiver,
            notifier,
            pipeline_config,
        }
    }

    /// Build the timeout sweeper over this state's components.
    pub fn timeout_sweeper(&self) -> TimeoutSweeper<MemoryStore, HttpWorkerClient> {
        TimeoutSweeper::new(
            Arc::clone(&self.store),
            Arc::clone(&self.dispatcher),
            self.notifier.clone(),
            self.pipeline_config.clone(),
        )
    }
}
