pub mod embedding;
pub mod intents;
pub mod parser;
pub mod text;

use std::path::Path;
use std::sync::Arc;

use tracing::info;

use crate::config::AppConfig;
use embedding::{HttpEmbedder, SharedEmbedder};
use intents::IntentCatalog;

/// Model-side resources built once at startup and shared read-only by every turn.
#[derive(Clone)]
pub struct NluContext {
    pub embedder: Option<SharedEmbedder>,
    pub intents: Arc<IntentCatalog>,
}

impl NluContext {
    pub async fn init(config: &AppConfig) -> Self {
        let embedder = config.embedding.as_ref().map(|cfg| {
            info!(url = %cfg.url, model = %cfg.model, "embedding provider configured");
            Arc::new(HttpEmbedder::new(cfg)) as SharedEmbedder
        });
        let intents = IntentCatalog::load(Path::new(&config.intents_path), embedder.as_ref()).await;
        Self {
            embedder,
            intents: Arc::new(intents),
        }
    }

    pub fn new(embedder: Option<SharedEmbedder>, intents: IntentCatalog) -> Self {
        Self {
            embedder,
            intents: Arc::new(intents),
        }
    }

    /// No provider, no intents: only the lexical rules and substring lookups work.
    pub fn disabled() -> Self {
        Self::new(None, IntentCatalog::empty())
    }
}
