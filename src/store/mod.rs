//! Record-store contracts used by the dialogue core and the HTTP handlers,
//! with a Postgres adapter and an in-memory one.

pub mod memory;
pub mod postgres;

use std::sync::Arc;

use async_trait::async_trait;
use time::{Duration, OffsetDateTime, Time};
use uuid::Uuid;

use crate::chat::repo_types::{ConsumptionRecord, ConversationTurn, NewConsumption, Role};
use crate::clients::repo_types::{ClientCredentials, ClientProfile, NewClient, ProfileUpdate};
use crate::error::CoreResult;
use crate::nutritionists::repo_types::{
    BotConfig, NewNutritionist, Nutritionist, NutritionistUpdate,
};
use crate::plans::repo_types::{NewPlanItem, PlanItem};

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[async_trait]
pub trait ClientStore: Send + Sync {
    async fn create_nutritionist(&self, new: NewNutritionist) -> CoreResult<Nutritionist>;
    async fn find_nutritionist_by_email(&self, email: &str) -> CoreResult<Option<Nutritionist>>;
    async fn get_nutritionist(&self, id: Uuid) -> CoreResult<Option<Nutritionist>>;

    /// Rejects an e-mail already used by another nutritionist.
    async fn update_nutritionist(
        &self,
        id: Uuid,
        update: &NutritionistUpdate,
    ) -> CoreResult<Nutritionist>;

    async fn get_bot_config(&self, nutritionist_id: Uuid) -> CoreResult<Option<BotConfig>>;
    async fn update_bot_config(
        &self,
        nutritionist_id: Uuid,
        config: &BotConfig,
    ) -> CoreResult<BotConfig>;

    async fn create_client(&self, new: NewClient) -> CoreResult<ClientProfile>;
    async fn find_client_credentials(&self, email: &str) -> CoreResult<Option<ClientCredentials>>;
    async fn get_client(&self, id: Uuid) -> CoreResult<Option<ClientProfile>>;
    async fn list_clients(&self, nutritionist_id: Uuid) -> CoreResult<Vec<ClientProfile>>;

    /// Applies a validated whitelist update and returns the new profile.
    async fn update_client(&self, id: Uuid, update: &ProfileUpdate) -> CoreResult<ClientProfile>;

    /// Removes the client with its plan, consumption and conversation rows.
    async fn delete_client(&self, id: Uuid) -> CoreResult<()>;
}

#[async_trait]
pub trait PlanStore: Send + Sync {
    /// Rejects a second item with the same (client, meal slot, name).
    async fn insert_plan_item(&self, new: NewPlanItem) -> CoreResult<PlanItem>;

    /// All items of a client, by meal slot then insertion order.
    async fn list_plan_items(&self, client_id: Uuid) -> CoreResult<Vec<PlanItem>>;

    async fn list_plan_items_with_embedding(&self, client_id: Uuid) -> CoreResult<Vec<PlanItem>> {
        let items = self.list_plan_items(client_id).await?;
        Ok(items.into_iter().filter(|i| i.embedding.is_some()).collect())
    }
}

#[async_trait]
pub trait JournalStore: Send + Sync {
    async fn insert_consumption(&self, new: NewConsumption) -> CoreResult<ConsumptionRecord>;

    /// Records logged in `[from, to)`, oldest first.
    async fn consumption_between(
        &self,
        client_id: Uuid,
        from: OffsetDateTime,
        to: OffsetDateTime,
    ) -> CoreResult<Vec<ConsumptionRecord>>;

    /// Records of the current UTC day.
    async fn consumption_today(&self, client_id: Uuid) -> CoreResult<Vec<ConsumptionRecord>> {
        let (from, to) = utc_day_bounds(OffsetDateTime::now_utc());
        self.consumption_between(client_id, from, to).await
    }

    async fn append_turn(&self, client_id: Uuid, role: Role, text: &str)
        -> CoreResult<ConversationTurn>;

    /// Whole conversation in insertion order.
    async fn conversation_history(&self, client_id: Uuid) -> CoreResult<Vec<ConversationTurn>>;

    async fn latest_bot_turn(&self, client_id: Uuid) -> CoreResult<Option<ConversationTurn>> {
        let history = self.conversation_history(client_id).await?;
        Ok(history.into_iter().rev().find(|t| t.role == Role::Bot))
    }
}

pub trait Store: ClientStore + PlanStore + JournalStore {}

impl<T: ClientStore + PlanStore + JournalStore> Store for T {}

pub type SharedStore = Arc<dyn Store>;

pub fn utc_day_bounds(at: OffsetDateTime) -> (OffsetDateTime, OffsetDateTime) {
    let start = at.to_offset(time::UtcOffset::UTC).replace_time(Time::MIDNIGHT);
    (start, start + Duration::days(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn day_bounds_cover_the_utc_day() {
        let (from, to) = utc_day_bounds(datetime!(2024-05-10 15:30 UTC));
        assert_eq!(from, datetime!(2024-05-10 0:00 UTC));
        assert_eq!(to, datetime!(2024-05-11 0:00 UTC));
    }
}
