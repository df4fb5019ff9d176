use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

/// OpenAI-compatible embeddings endpoint. Absent config disables embeddings.
#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingConfig {
    pub url: String,
    pub api_key: Option<String>,
    pub model: String,
}

/// Where records live. `memory` keeps everything in-process and is lost on exit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Postgres,
    Memory,
}

impl StoreBackend {
    pub fn parse(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "postgres" | "pg" => Ok(Self::Postgres),
            "memory" | "mem" => Ok(Self::Memory),
            other => anyhow::bail!("unknown STORE_BACKEND '{other}' (expected postgres or memory)"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub store: StoreBackend,
    /// Required by the postgres backend only.
    pub database_url: Option<String>,
    pub jwt: JwtConfig,
    pub embedding: Option<EmbeddingConfig>,
    pub intents_path: String,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let store = match std::env::var("STORE_BACKEND") {
            Ok(v) => StoreBackend::parse(&v)?,
            Err(_) => StoreBackend::default(),
        };
        let database_url = std::env::var("DATABASE_URL").ok();
        if store == StoreBackend::Postgres && database_url.is_none() {
            anyhow::bail!("DATABASE_URL must be set for the postgres store");
        }
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "nutribot".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "nutribot-users".into()),
            ttl_minutes: std::env::var("JWT_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(60),
        };
        let embedding = std::env::var("EMBEDDING_URL")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(|url| EmbeddingConfig {
                url,
                api_key: std::env::var("EMBEDDING_API_KEY").ok(),
                model: std::env::var("EMBEDDING_MODEL")
                    .unwrap_or_else(|_| "paraphrase-multilingual-MiniLM-L12-v2".into()),
            });
        let intents_path =
            std::env::var("INTENTS_PATH").unwrap_or_else(|_| "resources/intents.json".into());
        Ok(Self {
            store,
            database_url,
            jwt,
            embedding,
            intents_path,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_backend_labels() {
        assert_eq!(StoreBackend::parse("Memory").unwrap(), StoreBackend::Memory);
        assert_eq!(StoreBackend::parse(" postgres ").unwrap(), StoreBackend::Postgres);
        assert!(StoreBackend::parse("sqlite").is_err());
    }
}
