//! Intent classification by nearest example phrase.
//!
//! The intent table is a JSON object `{ "<label>": ["example", ...], ... }`.
//! Every example is embedded once at startup; the table is read-only afterwards.

use std::path::Path;
use std::sync::Arc;

use tracing::{info, warn};

use super::embedding::{Embedding, SharedEmbedder};
use crate::error::{CoreError, CoreResult};

/// Minimum score (exclusive) for a classification to be acted on.
pub const INTENT_THRESHOLD: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Greeting,
    BreakfastOptions,
    LunchOptions,
    DinnerOptions,
    RemainingCalories,
    ShowInfo,
}

impl Intent {
    /// Maps a catalog label to an intent. Labels are the Portuguese keys of
    /// the shipped table; the English names are accepted too.
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "saudacoes" | "greeting" => Some(Intent::Greeting),
            "perguntar_opcoes_cafe" | "breakfast_options" => Some(Intent::BreakfastOptions),
            "perguntar_opcoes_almoco" | "lunch_options" => Some(Intent::LunchOptions),
            "perguntar_opcoes_janta" | "dinner_options" => Some(Intent::DinnerOptions),
            "calorias_disponiveis" | "remaining_calories" => Some(Intent::RemainingCalories),
            "mostrar_info" | "show_info" => Some(Intent::ShowInfo),
            _ => None,
        }
    }

    /// Plan meal slot listed by the option intents.
    pub fn meal_slot(self) -> Option<&'static str> {
        match self {
            Intent::BreakfastOptions => Some("cafe da manha"),
            Intent::LunchOptions => Some("almoco"),
            Intent::DinnerOptions => Some("janta"),
            _ => None,
        }
    }
}

struct IntentEntry {
    label: String,
    examples: Vec<Embedding>,
}

/// Per-intent example embeddings, in file order.
#[derive(Default)]
pub struct IntentCatalog {
    entries: Vec<IntentEntry>,
}

impl IntentCatalog {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub async fn build(
        examples: Vec<(String, Vec<String>)>,
        embedder: &SharedEmbedder,
    ) -> CoreResult<Self> {
        let mut entries = Vec::with_capacity(examples.len());
        for (label, phrases) in examples {
            let vectors = embedder.embed_batch(&phrases).await?;
            entries.push(IntentEntry {
                label,
                examples: vectors,
            });
        }
        Ok(Self { entries })
    }

    pub fn parse_examples(json: &str) -> CoreResult<Vec<(String, Vec<String>)>> {
        let map: serde_json::Map<String, serde_json::Value> = serde_json::from_str(json)
            .map_err(|e| CoreError::InvalidInput(format!("intent table: {e}")))?;
        map.into_iter()
            .map(|(label, value)| {
                let phrases: Vec<String> = serde_json::from_value(value).map_err(|e| {
                    CoreError::InvalidInput(format!("intent table entry {label}: {e}"))
                })?;
                Ok((label, phrases))
            })
            .collect()
    }

    /// Loads and embeds the table. A missing file, a bad table or an
    /// unavailable provider leave the catalog empty.
    pub async fn load(path: &Path, embedder: Option<&SharedEmbedder>) -> Self {
        let Some(embedder) = embedder else {
            warn!("no embedding provider; intent classification disabled");
            return Self::empty();
        };

        let raw = match tokio::fs::read_to_string(path).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, path = %path.display(), "intent table not found; intent classification disabled");
                return Self::empty();
            }
        };

        let built = match Self::parse_examples(&raw) {
            Ok(examples) => Self::build(examples, embedder).await,
            Err(e) => Err(e),
        };
        match built {
            Ok(catalog) => {
                info!(intents = catalog.len(), model = embedder.model_name(), "intent table loaded");
                catalog
            }
            Err(e) => {
                warn!(error = %e, "failed to build intent table; intent classification disabled");
                Self::empty()
            }
        }
    }
}

#[derive(Clone)]
pub struct IntentClassifier {
    catalog: Arc<IntentCatalog>,
    embedder: Option<SharedEmbedder>,
}

impl IntentClassifier {
    pub fn new(catalog: Arc<IntentCatalog>, embedder: Option<SharedEmbedder>) -> Self {
        Self { catalog, embedder }
    }

    /// Best intent label and its score. Exact ties keep the intent that comes
    /// first in the table.
    pub async fn classify(&self, utterance: &str) -> (Option<String>, f32) {
        if self.catalog.is_empty() {
            return (None, 0.0);
        }
        let Some(embedder) = &self.embedder else {
            return (None, 0.0);
        };

        let query = match embedder.embed(utterance).await {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, "intent classification skipped");
                return (None, 0.0);
            }
        };

        let mut best: Option<&str> = None;
        let mut best_score = f32::NEG_INFINITY;
        for entry in &self.catalog.entries {
            let score = entry
                .examples
                .iter()
                .map(|e| query.cosine(e))
                .fold(f32::NEG_INFINITY, f32::max);
            if score > best_score {
                best_score = score;
                best = Some(entry.label.as_str());
            }
        }

        match best {
            Some(label) => (Some(label.to_string()), best_score),
            None => (None, 0.0),
        }
    }

    /// Intent to act on, if the best label is known and clears the threshold.
    pub async fn recognize(&self, utterance: &str) -> Option<Intent> {
        let (label, score) = self.classify(utterance).await;
        let intent = label.as_deref().and_then(Intent::from_label)?;
        (score > INTENT_THRESHOLD).then_some(intent)
    }
}
