use std::sync::Arc;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;

use crate::chat::DialogueEngine;
use crate::config::{AppConfig, StoreBackend};
use crate::nlu::NluContext;
use crate::store::{MemoryStore, PgStore, SharedStore};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: SharedStore,
    pub nlu: NluContext,
    pub engine: Arc<DialogueEngine>,
}

impl AppState {
    /// Opens the configured store (applying migrations for Postgres) and
    /// builds the NLU context.
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);
        let store = open_store(&config).await?;
        let nlu = NluContext::init(&config).await;
        Ok(Self::from_parts(config, store, nlu))
    }

    pub fn from_parts(config: Arc<AppConfig>, store: SharedStore, nlu: NluContext) -> Self {
        let engine = Arc::new(DialogueEngine::new(nlu.clone(), store.clone()));
        Self {
            config,
            store,
            nlu,
            engine,
        }
    }

    /// In-memory state with embeddings disabled, for tests.
    #[cfg(test)]
    pub fn fake() -> Self {
        let config = Arc::new(AppConfig {
            store: StoreBackend::Memory,
            database_url: None,
            jwt: crate::config::JwtConfig {
                secret: "test".into(),
                issuer: "test-issuer".into(),
                audience: "test-aud".into(),
                ttl_minutes: 5,
            },
            embedding: None,
            intents_path: "resources/intents.json".into(),
        });
        let store: SharedStore = Arc::new(MemoryStore::new());
        Self::from_parts(config, store, NluContext::disabled())
    }
}

async fn open_store(config: &AppConfig) -> anyhow::Result<SharedStore> {
    match config.store {
        StoreBackend::Memory => {
            tracing::warn!("using in-memory store; data is lost on exit");
            Ok(Arc::new(MemoryStore::new()))
        }
        StoreBackend::Postgres => {
            let url = config
                .database_url
                .as_deref()
                .context("DATABASE_URL is required for the postgres store")?;
            let db = PgPoolOptions::new()
                .max_connections(10)
                .connect(url)
                .await
                .context("connect to database")?;

            if let Err(e) = sqlx::migrate!("./migrations").run(&db).await {
                tracing::warn!(error = %e, "migration failed; continuing");
            }
            Ok(Arc::new(PgStore::new(db)))
        }
    }
}
