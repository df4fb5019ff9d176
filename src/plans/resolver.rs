//! Maps a free-text fragment to one of the client's plan items.

use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::CoreResult;
use crate::nlu::embedding::SharedEmbedder;
use crate::nlu::text::normalize;
use crate::plans::repo_types::PlanItem;
use crate::store::SharedStore;

/// Minimum cosine similarity (inclusive) for an embedding match.
pub const RESOLVE_THRESHOLD: f32 = 0.55;

#[derive(Clone)]
pub struct PlanItemResolver {
    store: SharedStore,
    embedder: Option<SharedEmbedder>,
}

impl PlanItemResolver {
    pub fn new(store: SharedStore, embedder: Option<SharedEmbedder>) -> Self {
        Self { store, embedder }
    }

    /// Best embedding match at or above `threshold`. Items without an
    /// embedding are not candidates; an unavailable provider gives `None`.
    pub async fn resolve(
        &self,
        client_id: Uuid,
        fragment: &str,
        threshold: f32,
    ) -> CoreResult<Option<PlanItem>> {
        let Some(embedder) = &self.embedder else {
            return Ok(None);
        };
        let items = self.store.list_plan_items_with_embedding(client_id).await?;
        if items.is_empty() {
            return Ok(None);
        }

        let query = match embedder.embed(fragment).await {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, "plan item resolution skipped");
                return Ok(None);
            }
        };

        let mut best: Option<(f32, PlanItem)> = None;
        for item in items {
            let Some(vector) = &item.embedding else {
                continue;
            };
            let score = query.cosine(vector);
            if best.as_ref().map_or(true, |(s, _)| score > *s) {
                best = Some((score, item));
            }
        }

        Ok(best.and_then(|(score, item)| {
            debug!(item = %item.name, score, "best plan item");
            (score >= threshold).then_some(item)
        }))
    }

    /// First item, in stored order, whose normalized name occurs in the text.
    pub async fn find_by_substring(
        &self,
        client_id: Uuid,
        text: &str,
    ) -> CoreResult<Option<PlanItem>> {
        let haystack = normalize(text);
        let items = self.store.list_plan_items(client_id).await?;
        Ok(items.into_iter().find(|item| {
            let name = normalize(&item.name);
            !name.is_empty() && haystack.contains(&name)
        }))
    }

    pub async fn lookup(&self, client_id: Uuid, text: &str) -> CoreResult<Option<PlanItem>> {
        if let Some(item) = self.resolve(client_id, text, RESOLVE_THRESHOLD).await? {
            return Ok(Some(item));
        }
        self.find_by_substring(client_id, text).await
    }
}
