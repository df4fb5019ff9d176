use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{ClientStore, JournalStore, PlanStore};
use crate::chat::repo_types::{ConsumptionRecord, ConversationTurn, NewConsumption, Role};
use crate::clients::repo_types::{ClientCredentials, ClientProfile, NewClient, ProfileUpdate};
use crate::error::{CoreError, CoreResult};
use crate::nutritionists::repo_types::{
    BotConfig, NewNutritionist, Nutritionist, NutritionistUpdate,
};
use crate::plans::repo_types::{NewPlanItem, PlanItem};

#[derive(Default)]
struct Tables {
    nutritionists: Vec<(Nutritionist, BotConfig)>,
    clients: Vec<(ClientProfile, String)>,
    plan_items: Vec<PlanItem>,
    consumption: Vec<ConsumptionRecord>,
    turns: Vec<ConversationTurn>,
    next_id: i64,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// In-process store with the same contract as [`super::PgStore`].
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent write fail with a persistence error.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check_writable(&self) -> CoreResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(CoreError::Persistence("store is read-only".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl ClientStore for MemoryStore {
    async fn create_nutritionist(&self, new: NewNutritionist) -> CoreResult<Nutritionist> {
        self.check_writable()?;
        let mut t = self.tables.lock().await;
        if t.nutritionists.iter().any(|(n, _)| n.email == new.email) {
            return Err(CoreError::Duplicate(format!("nutritionist {}", new.email)));
        }
        let n = Nutritionist {
            id: Uuid::new_v4(),
            name: new.name,
            email: new.email,
            password_hash: new.password_hash,
            created_at: OffsetDateTime::now_utc(),
        };
        t.nutritionists.push((n.clone(), BotConfig::default()));
        Ok(n)
    }

    async fn find_nutritionist_by_email(&self, email: &str) -> CoreResult<Option<Nutritionist>> {
        let t = self.tables.lock().await;
        Ok(t.nutritionists
            .iter()
            .find(|(n, _)| n.email == email)
            .map(|(n, _)| n.clone()))
    }

    async fn get_nutritionist(&self, id: Uuid) -> CoreResult<Option<Nutritionist>> {
        let t = self.tables.lock().await;
        Ok(t.nutritionists
            .iter()
            .find(|(n, _)| n.id == id)
            .map(|(n, _)| n.clone()))
    }

    async fn update_nutritionist(
        &self,
        id: Uuid,
        update: &NutritionistUpdate,
    ) -> CoreResult<Nutritionist> {
        self.check_writable()?;
        let mut t = self.tables.lock().await;
        if t
            .nutritionists
            .iter()
            .any(|(n, _)| n.id != id && n.email == update.email)
        {
            return Err(CoreError::Duplicate(format!("nutritionist {}", update.email)));
        }
        let (n, _) = t
            .nutritionists
            .iter_mut()
            .find(|(n, _)| n.id == id)
            .ok_or(CoreError::Missing("nutritionist"))?;
        n.name = update.name.clone();
        n.email = update.email.clone();
        if let Some(hash) = &update.password_hash {
            n.password_hash = hash.clone();
        }
        Ok(n.clone())
    }

    async fn get_bot_config(&self, nutritionist_id: Uuid) -> CoreResult<Option<BotConfig>> {
        let t = self.tables.lock().await;
        Ok(t.nutritionists
            .iter()
            .find(|(n, _)| n.id == nutritionist_id)
            .map(|(_, cfg)| cfg.clone()))
    }

    async fn update_bot_config(
        &self,
        nutritionist_id: Uuid,
        config: &BotConfig,
    ) -> CoreResult<BotConfig> {
        config.validate()?;
        self.check_writable()?;
        let mut t = self.tables.lock().await;
        let (_, cfg) = t
            .nutritionists
            .iter_mut()
            .find(|(n, _)| n.id == nutritionist_id)
            .ok_or(CoreError::Missing("nutritionist"))?;
        *cfg = config.clone();
        Ok(cfg.clone())
    }

    async fn create_client(&self, new: NewClient) -> CoreResult<ClientProfile> {
        new.validate()?;
        self.check_writable()?;
        let mut t = self.tables.lock().await;
        if t.clients.iter().any(|(c, _)| c.email == new.email) {
            return Err(CoreError::Duplicate(format!("client {}", new.email)));
        }
        let profile = ClientProfile {
            id: Uuid::new_v4(),
            nutritionist_id: new.nutritionist_id,
            name: new.name,
            email: new.email,
            age: new.age,
            sex: new.sex,
            weight_kg: new.weight_kg,
            height_cm: new.height_cm,
            activity: new.activity,
            initial_weight_kg: new.weight_kg,
            goal: new.goal,
            water_goal_ml: None,
            created_at: OffsetDateTime::now_utc(),
        };
        t.clients.push((profile.clone(), new.password_hash));
        Ok(profile)
    }

    async fn find_client_credentials(&self, email: &str) -> CoreResult<Option<ClientCredentials>> {
        let t = self.tables.lock().await;
        Ok(t.clients
            .iter()
            .find(|(c, _)| c.email == email)
            .map(|(c, hash)| ClientCredentials {
                id: c.id,
                password_hash: hash.clone(),
            }))
    }

    async fn get_client(&self, id: Uuid) -> CoreResult<Option<ClientProfile>> {
        let t = self.tables.lock().await;
        Ok(t.clients.iter().find(|(c, _)| c.id == id).map(|(c, _)| c.clone()))
    }

    async fn list_clients(&self, nutritionist_id: Uuid) -> CoreResult<Vec<ClientProfile>> {
        let t = self.tables.lock().await;
        Ok(t.clients
            .iter()
            .filter(|(c, _)| c.nutritionist_id == nutritionist_id)
            .map(|(c, _)| c.clone())
            .collect())
    }

    async fn update_client(&self, id: Uuid, update: &ProfileUpdate) -> CoreResult<ClientProfile> {
        update.validate()?;
        self.check_writable()?;
        let mut t = self.tables.lock().await;
        let (profile, _) = t
            .clients
            .iter_mut()
            .find(|(c, _)| c.id == id)
            .ok_or(CoreError::Missing("client"))?;
        update.apply(profile);
        Ok(profile.clone())
    }

    async fn delete_client(&self, id: Uuid) -> CoreResult<()> {
        self.check_writable()?;
        let mut t = self.tables.lock().await;
        let before = t.clients.len();
        t.clients.retain(|(c, _)| c.id != id);
        if t.clients.len() == before {
            return Err(CoreError::Missing("client"));
        }
        t.plan_items.retain(|i| i.client_id != id);
        t.consumption.retain(|r| r.client_id != id);
        t.turns.retain(|r| r.client_id != id);
        Ok(())
    }
}

#[async_trait]
impl PlanStore for MemoryStore {
    async fn insert_plan_item(&self, new: NewPlanItem) -> CoreResult<PlanItem> {
        self.check_writable()?;
        let mut t = self.tables.lock().await;
        let taken = t.plan_items.iter().any(|i| {
            i.client_id == new.client_id && i.meal_slot == new.meal_slot && i.name == new.name
        });
        if taken {
            return Err(CoreError::Duplicate(format!(
                "plan item '{}' already exists for '{}'",
                new.name, new.meal_slot
            )));
        }
        let item = PlanItem {
            id: t.next_id(),
            client_id: new.client_id,
            meal_slot: new.meal_slot,
            name: new.name,
            per_100g: new.per_100g,
            embedding_text: new.embedding_text,
            embedding: new.embedding,
            created_at: OffsetDateTime::now_utc(),
        };
        t.plan_items.push(item.clone());
        Ok(item)
    }

    async fn list_plan_items(&self, client_id: Uuid) -> CoreResult<Vec<PlanItem>> {
        let t = self.tables.lock().await;
        let mut items: Vec<PlanItem> = t
            .plan_items
            .iter()
            .filter(|i| i.client_id == client_id)
            .cloned()
            .collect();
        items.sort_by(|a, b| a.meal_slot.cmp(&b.meal_slot));
        Ok(items)
    }
}

#[async_trait]
impl JournalStore for MemoryStore {
    async fn insert_consumption(&self, new: NewConsumption) -> CoreResult<ConsumptionRecord> {
        new.validate()?;
        self.check_writable()?;
        let mut t = self.tables.lock().await;
        let record = ConsumptionRecord {
            id: t.next_id(),
            client_id: new.client_id,
            logged_at: OffsetDateTime::now_utc(),
            meal_slot: new.meal_slot,
            item_name: new.item_name,
            grams: new.grams,
            kcal: new.kcal,
        };
        t.consumption.push(record.clone());
        Ok(record)
    }

    async fn consumption_between(
        &self,
        client_id: Uuid,
        from: OffsetDateTime,
        to: OffsetDateTime,
    ) -> CoreResult<Vec<ConsumptionRecord>> {
        let t = self.tables.lock().await;
        Ok(t.consumption
            .iter()
            .filter(|r| r.client_id == client_id && r.logged_at >= from && r.logged_at < to)
            .cloned()
            .collect())
    }

    async fn append_turn(
        &self,
        client_id: Uuid,
        role: Role,
        text: &str,
    ) -> CoreResult<ConversationTurn> {
        self.check_writable()?;
        let mut t = self.tables.lock().await;
        let turn = ConversationTurn {
            id: t.next_id(),
            client_id,
            role,
            text: text.to_string(),
            created_at: OffsetDateTime::now_utc(),
        };
        t.turns.push(turn.clone());
        Ok(turn)
    }

    async fn conversation_history(&self, client_id: Uuid) -> CoreResult<Vec<ConversationTurn>> {
        let t = self.tables.lock().await;
        Ok(t.turns
            .iter()
            .filter(|r| r.client_id == client_id)
            .cloned()
            .collect())
    }
}
