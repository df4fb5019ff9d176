use std::collections::BTreeMap;

use tracing::{info, warn};
use uuid::Uuid;

use crate::error::CoreResult;
use crate::nlu::embedding::SharedEmbedder;
use crate::plans::repo_types::{Macros, NewPlanItem, PlanItem};
use crate::store::SharedStore;

/// Stores a plan item, embedding it first when a provider is available.
/// The item is kept without an embedding if the provider fails.
pub async fn add_plan_item(
    store: &SharedStore,
    embedder: Option<&SharedEmbedder>,
    client_id: Uuid,
    meal_slot: &str,
    name: &str,
    per_100g: Macros,
) -> CoreResult<PlanItem> {
    let mut new = NewPlanItem::new(client_id, meal_slot, name, per_100g);
    if let Some(embedder) = embedder {
        match embedder.embed(&new.embedding_text).await {
            Ok(v) => new.embedding = Some(v),
            Err(e) => warn!(error = %e, item = %new.name, "storing plan item without embedding"),
        }
    }
    let item = store.insert_plan_item(new).await?;
    info!(%client_id, item_id = item.id, slot = %item.meal_slot, "plan item added");
    Ok(item)
}

/// Plan items keyed by meal slot, each list in insertion order.
pub fn group_by_slot(items: Vec<PlanItem>) -> BTreeMap<String, Vec<PlanItem>> {
    let mut grouped: BTreeMap<String, Vec<PlanItem>> = BTreeMap::new();
    for item in items {
        grouped.entry(item.meal_slot.clone()).or_default().push(item);
    }
    grouped
}

pub async fn plan_by_slot(
    store: &SharedStore,
    client_id: Uuid,
) -> CoreResult<BTreeMap<String, Vec<PlanItem>>> {
    Ok(group_by_slot(store.list_plan_items(client_id).await?))
}
