use async_trait::async_trait;
use sqlx::PgPool;
use time::OffsetDateTime;
use uuid::Uuid;

use super::{ClientStore, JournalStore, PlanStore};
use crate::chat::repo_types::{
    ConsumptionRecord, ConversationTurn, ConversationTurnRow, NewConsumption, Role,
};
use crate::clients::repo_types::{
    ClientCredentials, ClientProfile, ClientRow, NewClient, ProfileUpdate,
};
use crate::error::{CoreError, CoreResult};
use crate::nutritionists::repo_types::{
    BotConfig, NewNutritionist, Nutritionist, NutritionistUpdate,
};
use crate::plans::repo_types::{NewPlanItem, PlanItem, PlanItemRow};

const CLIENT_COLUMNS: &str = "id, nutritionist_id, name, email, age, sex, weight_kg, height_cm, \
     activity, initial_weight_kg, goal, water_goal_ml, created_at";

const PLAN_ITEM_COLUMNS: &str = "id, client_id, meal_slot, name, kcal_100g, protein_100g, \
     carb_100g, fat_100g, embedding_text, embedding, created_at";

#[derive(Clone)]
pub struct PgStore {
    db: PgPool,
}

impl PgStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ClientStore for PgStore {
    async fn create_nutritionist(&self, new: NewNutritionist) -> CoreResult<Nutritionist> {
        let n = sqlx::query_as::<_, Nutritionist>(
            r#"
            INSERT INTO nutritionists (id, name, email, password_hash)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, email, password_hash, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&new.name)
        .bind(&new.email)
        .bind(&new.password_hash)
        .fetch_one(&self.db)
        .await?;
        Ok(n)
    }

    async fn find_nutritionist_by_email(&self, email: &str) -> CoreResult<Option<Nutritionist>> {
        let n = sqlx::query_as::<_, Nutritionist>(
            r#"
            SELECT id, name, email, password_hash, created_at
            FROM nutritionists
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await?;
        Ok(n)
    }

    async fn get_nutritionist(&self, id: Uuid) -> CoreResult<Option<Nutritionist>> {
        let n = sqlx::query_as::<_, Nutritionist>(
            r#"
            SELECT id, name, email, password_hash, created_at
            FROM nutritionists
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(n)
    }

    async fn update_nutritionist(
        &self,
        id: Uuid,
        update: &NutritionistUpdate,
    ) -> CoreResult<Nutritionist> {
        let n = sqlx::query_as::<_, Nutritionist>(
            r#"
            UPDATE nutritionists SET
                name = $2,
                email = $3,
                password_hash = COALESCE($4, password_hash)
            WHERE id = $1
            RETURNING id, name, email, password_hash, created_at
            "#,
        )
        .bind(id)
        .bind(&update.name)
        .bind(&update.email)
        .bind(&update.password_hash)
        .fetch_optional(&self.db)
        .await?
        .ok_or(CoreError::Missing("nutritionist"))?;
        Ok(n)
    }

    async fn get_bot_config(&self, nutritionist_id: Uuid) -> CoreResult<Option<BotConfig>> {
        let cfg = sqlx::query_as::<_, BotConfig>(
            r#"
            SELECT bot_persona AS persona, bot_restrictions AS restrictions, bot_color AS color
            FROM nutritionists
            WHERE id = $1
            "#,
        )
        .bind(nutritionist_id)
        .fetch_optional(&self.db)
        .await?;
        Ok(cfg)
    }

    async fn update_bot_config(
        &self,
        nutritionist_id: Uuid,
        config: &BotConfig,
    ) -> CoreResult<BotConfig> {
        config.validate()?;
        let cfg = sqlx::query_as::<_, BotConfig>(
            r#"
            UPDATE nutritionists SET bot_persona = $2, bot_restrictions = $3, bot_color = $4
            WHERE id = $1
            RETURNING bot_persona AS persona, bot_restrictions AS restrictions, bot_color AS color
            "#,
        )
        .bind(nutritionist_id)
        .bind(&config.persona)
        .bind(&config.restrictions)
        .bind(&config.color)
        .fetch_optional(&self.db)
        .await?
        .ok_or(CoreError::Missing("nutritionist"))?;
        Ok(cfg)
    }

    async fn create_client(&self, new: NewClient) -> CoreResult<ClientProfile> {
        new.validate()?;
        let sql = format!(
            r#"
            INSERT INTO clients (id, nutritionist_id, name, email, password_hash, age, sex,
                                 weight_kg, height_cm, activity, initial_weight_kg, goal)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $8, $11)
            RETURNING {CLIENT_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, ClientRow>(&sql)
            .bind(Uuid::new_v4())
            .bind(new.nutritionist_id)
            .bind(&new.name)
            .bind(&new.email)
            .bind(&new.password_hash)
            .bind(new.age)
            .bind(&new.sex)
            .bind(new.weight_kg)
            .bind(new.height_cm)
            .bind(new.activity.as_str())
            .bind(&new.goal)
            .fetch_one(&self.db)
            .await?;
        Ok(row.into())
    }

    async fn find_client_credentials(&self, email: &str) -> CoreResult<Option<ClientCredentials>> {
        let creds = sqlx::query_as::<_, ClientCredentials>(
            r#"SELECT id, password_hash FROM clients WHERE email = $1"#,
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await?;
        Ok(creds)
    }

    async fn get_client(&self, id: Uuid) -> CoreResult<Option<ClientProfile>> {
        let sql = format!("SELECT {CLIENT_COLUMNS} FROM clients WHERE id = $1");
        let row = sqlx::query_as::<_, ClientRow>(&sql)
            .bind(id)
            .fetch_optional(&self.db)
            .await?;
        Ok(row.map(Into::into))
    }

    async fn list_clients(&self, nutritionist_id: Uuid) -> CoreResult<Vec<ClientProfile>> {
        let sql = format!(
            "SELECT {CLIENT_COLUMNS} FROM clients WHERE nutritionist_id = $1 ORDER BY name, id"
        );
        let rows = sqlx::query_as::<_, ClientRow>(&sql)
            .bind(nutritionist_id)
            .fetch_all(&self.db)
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn update_client(&self, id: Uuid, update: &ProfileUpdate) -> CoreResult<ClientProfile> {
        update.validate()?;
        let sql = format!(
            r#"
            UPDATE clients SET
                name = COALESCE($2, name),
                age = COALESCE($3, age),
                sex = COALESCE($4, sex),
                weight_kg = COALESCE($5, weight_kg),
                height_cm = COALESCE($6, height_cm),
                activity = COALESCE($7, activity),
                goal = COALESCE($8, goal),
                water_goal_ml = COALESCE($9, water_goal_ml)
            WHERE id = $1
            RETURNING {CLIENT_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, ClientRow>(&sql)
            .bind(id)
            .bind(&update.name)
            .bind(update.age)
            .bind(&update.sex)
            .bind(update.weight_kg)
            .bind(update.height_cm)
            .bind(update.activity_label())
            .bind(&update.goal)
            .bind(update.water_goal_ml)
            .fetch_optional(&self.db)
            .await?
            .ok_or(CoreError::Missing("client"))?;
        Ok(row.into())
    }

    async fn delete_client(&self, id: Uuid) -> CoreResult<()> {
        let mut tx = self.db.begin().await?;
        for table in ["conversation_turns", "consumption_records", "plan_items"] {
            sqlx::query(&format!("DELETE FROM {table} WHERE client_id = $1"))
                .bind(id)
                .execute(&mut *tx)
                .await?;
        }
        let res = sqlx::query("DELETE FROM clients WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        if res.rows_affected() == 0 {
            tx.rollback().await?;
            return Err(CoreError::Missing("client"));
        }
        tx.commit().await?;
        Ok(())
    }
}

#[async_trait]
impl PlanStore for PgStore {
    async fn insert_plan_item(&self, new: NewPlanItem) -> CoreResult<PlanItem> {
        let sql = format!(
            r#"
            INSERT INTO plan_items (client_id, meal_slot, name, kcal_100g, protein_100g,
                                    carb_100g, fat_100g, embedding_text, embedding)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {PLAN_ITEM_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, PlanItemRow>(&sql)
            .bind(new.client_id)
            .bind(&new.meal_slot)
            .bind(&new.name)
            .bind(new.per_100g.kcal)
            .bind(new.per_100g.protein)
            .bind(new.per_100g.carb)
            .bind(new.per_100g.fat)
            .bind(&new.embedding_text)
            .bind(new.embedding.as_ref().map(|e| e.to_le_bytes()))
            .fetch_one(&self.db)
            .await?;
        row.try_into()
    }

    async fn list_plan_items(&self, client_id: Uuid) -> CoreResult<Vec<PlanItem>> {
        let sql = format!(
            "SELECT {PLAN_ITEM_COLUMNS} FROM plan_items WHERE client_id = $1 ORDER BY meal_slot, id"
        );
        let rows = sqlx::query_as::<_, PlanItemRow>(&sql)
            .bind(client_id)
            .fetch_all(&self.db)
            .await?;
        rows.into_iter().map(PlanItem::try_from).collect()
    }

    async fn list_plan_items_with_embedding(&self, client_id: Uuid) -> CoreResult<Vec<PlanItem>> {
        let sql = format!(
            "SELECT {PLAN_ITEM_COLUMNS} FROM plan_items \
             WHERE client_id = $1 AND embedding IS NOT NULL ORDER BY meal_slot, id"
        );
        let rows = sqlx::query_as::<_, PlanItemRow>(&sql)
            .bind(client_id)
            .fetch_all(&self.db)
            .await?;
        rows.into_iter().map(PlanItem::try_from).collect()
    }
}

#[async_trait]
impl JournalStore for PgStore {
    async fn insert_consumption(&self, new: NewConsumption) -> CoreResult<ConsumptionRecord> {
        new.validate()?;
        let rec = sqlx::query_as::<_, ConsumptionRecord>(
            r#"
            INSERT INTO consumption_records (client_id, meal_slot, item_name, grams, kcal)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, client_id, logged_at, meal_slot, item_name, grams, kcal
            "#,
        )
        .bind(new.client_id)
        .bind(&new.meal_slot)
        .bind(&new.item_name)
        .bind(new.grams)
        .bind(new.kcal)
        .fetch_one(&self.db)
        .await?;
        Ok(rec)
    }

    async fn consumption_between(
        &self,
        client_id: Uuid,
        from: OffsetDateTime,
        to: OffsetDateTime,
    ) -> CoreResult<Vec<ConsumptionRecord>> {
        let rows = sqlx::query_as::<_, ConsumptionRecord>(
            r#"
            SELECT id, client_id, logged_at, meal_slot, item_name, grams, kcal
            FROM consumption_records
            WHERE client_id = $1 AND logged_at >= $2 AND logged_at < $3
            ORDER BY id
            "#,
        )
        .bind(client_id)
        .bind(from)
        .bind(to)
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn append_turn(
        &self,
        client_id: Uuid,
        role: Role,
        text: &str,
    ) -> CoreResult<ConversationTurn> {
        let row = sqlx::query_as::<_, ConversationTurnRow>(
            r#"
            INSERT INTO conversation_turns (client_id, role, text)
            VALUES ($1, $2, $3)
            RETURNING id, client_id, role, text, created_at
            "#,
        )
        .bind(client_id)
        .bind(role.as_str())
        .bind(text)
        .fetch_one(&self.db)
        .await?;
        row.try_into()
    }

    async fn conversation_history(&self, client_id: Uuid) -> CoreResult<Vec<ConversationTurn>> {
        let rows = sqlx::query_as::<_, ConversationTurnRow>(
            r#"
            SELECT id, client_id, role, text, created_at
            FROM conversation_turns
            WHERE client_id = $1
            ORDER BY id
            "#,
        )
        .bind(client_id)
        .fetch_all(&self.db)
        .await?;
        rows.into_iter().map(ConversationTurn::try_from).collect()
    }

    async fn latest_bot_turn(&self, client_id: Uuid) -> CoreResult<Option<ConversationTurn>> {
        let row = sqlx::query_as::<_, ConversationTurnRow>(
            r#"
            SELECT id, client_id, role, text, created_at
            FROM conversation_turns
            WHERE client_id = $1 AND role = 'bot'
            ORDER BY id DESC
            LIMIT 1
            "#,
        )
        .bind(client_id)
        .fetch_optional(&self.db)
        .await?;
        row.map(ConversationTurn::try_from).transpose()
    }
}
