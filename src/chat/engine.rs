//! The dialogue cascade: one utterance in, one reply out.
//!
//! Rules are tried in [`Step::ORDER`]; the first whose detector matches
//! handles the turn, and an utterance nothing matches gets the decline
//! message. The only conversational memory is the latest stored bot turn.

use lazy_static::lazy_static;
use regex::Regex;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::chat::repo_types::{NewConsumption, Role};
use crate::chat::responders;
use crate::clients::repo_types::{ClientProfile, ProfileUpdate};
use crate::error::{CoreError, CoreResult};
use crate::nlu::intents::{Intent, IntentClassifier};
use crate::nlu::parser::{
    detect_meal_slot, extract_items_and_grams, extract_kcal, extract_kcal_mention,
    extract_weight,
};
use crate::nlu::text::contains_any;
use crate::nlu::NluContext;
use crate::nutrition;
use crate::plans::repo_types::PlanItem;
use crate::plans::resolver::PlanItemResolver;
use crate::plans::services::plan_by_slot;
use crate::store::SharedStore;

pub const WATER_KEYWORDS: &[&str] = &["água", "agua"];

pub const INGESTION_KEYWORDS: &[&str] = &["comi", "comemos", "comeu", "registrei", "anota aí"];

pub const FOLLOW_UP_KEYWORDS: &[&str] =
    &["quanto isso", "quantas calorias", "quantas kcal", "quanto tem"];

lazy_static! {
    static ref REPORT_RE: Regex = Regex::new(
        r"(?:^|\s)(?:todas as informa[cç][oõ]es|meu resumo|meu relat[oó]rio)"
    )
    .unwrap();
}

/// Cascade rules, highest priority first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Report,
    WeightUpdate,
    Water,
    Intent,
    Consumption,
    FollowUp,
    PlanLookup,
}

impl Step {
    pub const ORDER: [Step; 7] = [
        Step::Report,
        Step::WeightUpdate,
        Step::Water,
        Step::Intent,
        Step::Consumption,
        Step::FollowUp,
        Step::PlanLookup,
    ];
}

/// What a detector found; carries whatever the handler needs.
#[derive(Debug, Clone)]
pub enum Matched {
    Report,
    Weight(f64),
    Water,
    Intent(Intent),
    Consumption,
    FollowUp,
    PlanItem(PlanItem),
}

impl Matched {
    pub fn step(&self) -> Step {
        match self {
            Matched::Report => Step::Report,
            Matched::Weight(_) => Step::WeightUpdate,
            Matched::Water => Step::Water,
            Matched::Intent(_) => Step::Intent,
            Matched::Consumption => Step::Consumption,
            Matched::FollowUp => Step::FollowUp,
            Matched::PlanItem(_) => Step::PlanLookup,
        }
    }
}

/// Reply text, plus the text to store as the bot turn when it differs.
struct Reply {
    text: String,
    logged: Option<String>,
}

impl Reply {
    /// Stores only the first line; listings keep their figures out of the
    /// follow-up context.
    fn headline(text: String) -> Self {
        let logged = text
            .split_once('\n')
            .map(|(first, _)| first.to_string());
        Self { text, logged }
    }

    fn logged_text(&self) -> &str {
        self.logged.as_deref().unwrap_or(&self.text)
    }
}

impl From<String> for Reply {
    fn from(text: String) -> Self {
        Self { text, logged: None }
    }
}

pub struct DialogueEngine {
    store: SharedStore,
    classifier: IntentClassifier,
    resolver: PlanItemResolver,
}

impl DialogueEngine {
    pub fn new(nlu: NluContext, store: SharedStore) -> Self {
        Self {
            classifier: IntentClassifier::new(nlu.intents.clone(), nlu.embedder.clone()),
            resolver: PlanItemResolver::new(store.clone(), nlu.embedder),
            store,
        }
    }

    /// Answers one utterance. Stores the utterance as a user turn first and
    /// the reply as exactly one bot turn last. Never fails: store errors end
    /// up as explanatory replies.
    #[instrument(skip(self, text))]
    pub async fn respond(&self, client_id: Uuid, text: &str) -> String {
        self.save_turn(client_id, Role::User, text).await;

        let lowered = text.trim().to_lowercase();
        let reply = match self.route(client_id, &lowered).await {
            Some(matched) => {
                let step = matched.step();
                debug!(?step, "cascade matched");
                match self.handle(client_id, matched, &lowered).await {
                    Ok(reply) => reply,
                    Err(CoreError::Missing(_)) => responders::client_missing().into(),
                    Err(e) => {
                        error!(error = %e, ?step, "dialogue step failed");
                        responders::store_unavailable().into()
                    }
                }
            }
            None => responders::decline().into(),
        };

        self.save_turn(client_id, Role::Bot, reply.logged_text()).await;
        reply.text
    }

    /// First matching step for an already lower-cased utterance, `None` when
    /// the turn falls through to the decline.
    pub async fn route(&self, client_id: Uuid, lowered: &str) -> Option<Matched> {
        for step in Step::ORDER {
            if let Some(m) = self.detect(step, client_id, lowered).await {
                return Some(m);
            }
        }
        None
    }

    async fn detect(&self, step: Step, client_id: Uuid, text: &str) -> Option<Matched> {
        match step {
            Step::Report => REPORT_RE.is_match(text).then_some(Matched::Report),
            Step::WeightUpdate => extract_weight(text).map(Matched::Weight),
            Step::Water => contains_any(text, WATER_KEYWORDS).then_some(Matched::Water),
            Step::Intent => self.classifier.recognize(text).await.map(Matched::Intent),
            Step::Consumption => {
                contains_any(text, INGESTION_KEYWORDS).then_some(Matched::Consumption)
            }
            Step::FollowUp => contains_any(text, FOLLOW_UP_KEYWORDS).then_some(Matched::FollowUp),
            Step::PlanLookup => match self.resolver.lookup(client_id, text).await {
                Ok(item) => item.map(Matched::PlanItem),
                Err(e) => {
                    warn!(error = %e, "plan lookup failed");
                    None
                }
            },
        }
    }

    async fn handle(&self, client_id: Uuid, matched: Matched, text: &str) -> CoreResult<Reply> {
        match matched {
            Matched::Report => self.report(client_id).await,
            Matched::Weight(kg) => Ok(self.update_weight(client_id, kg).await.into()),
            Matched::Water => self.water(client_id).await.map(Into::into),
            Matched::Intent(intent) => self.intent(client_id, intent).await.map(Reply::headline),
            Matched::Consumption => Ok(self.log_consumption(client_id, text).await.into()),
            Matched::FollowUp => self.follow_up(client_id).await.map(Into::into),
            Matched::PlanItem(item) => Ok(responders::plan_item_detail(&item).into()),
        }
    }

    async fn client(&self, client_id: Uuid) -> CoreResult<ClientProfile> {
        self.store
            .get_client(client_id)
            .await?
            .ok_or(CoreError::Missing("client"))
    }

    async fn consumed_today(&self, client_id: Uuid) -> CoreResult<(f64, usize)> {
        let records = self.store.consumption_today(client_id).await?;
        Ok((records.iter().map(|r| r.kcal).sum(), records.len()))
    }

    async fn report(&self, client_id: Uuid) -> CoreResult<Reply> {
        let profile = self.client(client_id).await?;
        let plan = plan_by_slot(&self.store, client_id).await?;
        let today = self.store.consumption_today(client_id).await?;
        let history = self.store.conversation_history(client_id).await?;
        let recent = &history[history.len().saturating_sub(responders::REPORT_TURNS)..];
        Ok(Reply {
            text: responders::report(&profile, &plan, &today, recent),
            logged: Some(responders::REPORT_PLACEHOLDER.to_string()),
        })
    }

    async fn update_weight(&self, client_id: Uuid, kg: f64) -> String {
        match self
            .store
            .update_client(client_id, &ProfileUpdate::weight(kg))
            .await
        {
            Ok(_) => {
                info!(%client_id, weight_kg = kg, "weight updated from chat");
                responders::weight_updated(kg)
            }
            Err(CoreError::InvalidInput(_)) => responders::weight_invalid(),
            Err(e) => {
                error!(error = %e, %client_id, "weight update failed");
                responders::weight_failed()
            }
        }
    }

    async fn water(&self, client_id: Uuid) -> CoreResult<String> {
        let profile = self.client(client_id).await?;
        Ok(match profile.weight_kg {
            Some(kg) => {
                responders::water_target(nutrition::water_target_ml(kg), profile.water_goal_ml)
            }
            None => responders::water_unknown(),
        })
    }

    async fn intent(&self, client_id: Uuid, intent: Intent) -> CoreResult<String> {
        match intent {
            Intent::Greeting => {
                let profile = self.client(client_id).await?;
                Ok(responders::greeting(&profile.name))
            }
            Intent::BreakfastOptions | Intent::LunchOptions | Intent::DinnerOptions => {
                let slot = intent.meal_slot().unwrap_or_default();
                let items = self.store.list_plan_items(client_id).await?;
                let options: Vec<&PlanItem> = items.iter().filter(|i| i.meal_slot == slot).collect();
                Ok(responders::meal_options(slot, &options))
            }
            Intent::RemainingCalories => {
                let profile = self.client(client_id).await?;
                let (Some(w), Some(h), Some(age)) =
                    (profile.weight_kg, profile.height_cm, profile.age)
                else {
                    return Ok(responders::missing_profile_data());
                };
                let tdee = nutrition::tdee(
                    nutrition::bmr(w, h, f64::from(age), profile.sex.as_deref()),
                    profile.activity,
                );
                let (consumed, _) = self.consumed_today(client_id).await?;
                let items = self.store.list_plan_items(client_id).await?;
                Ok(responders::remaining_calories(tdee, consumed, &items))
            }
            Intent::ShowInfo => {
                let profile = self.client(client_id).await?;
                let (consumed, count) = self.consumed_today(client_id).await?;
                Ok(responders::show_info(&profile, consumed, count))
            }
        }
    }

    /// One record and one reply line per extracted pair. Energy comes from
    /// the matched plan item, else an explicit kcal figure in the fragment,
    /// else the gram count taken 1:1 as kcal.
    async fn log_consumption(&self, client_id: Uuid, text: &str) -> String {
        let meal_slot = detect_meal_slot(text);
        let pairs = extract_items_and_grams(text);
        if pairs.is_empty() {
            return responders::consumption_unclear();
        }

        let mut lines = Vec::with_capacity(pairs.len());
        for (fragment, grams) in pairs {
            if !(grams.is_finite() && grams > 0.0) {
                debug!(item = %fragment, grams, "quantity out of range, not logged");
                lines.push(responders::consumption_bad_quantity(&fragment));
                continue;
            }
            let matched = self
                .resolver
                .lookup(client_id, &fragment)
                .await
                .unwrap_or_else(|e| {
                    warn!(error = %e, "plan lookup failed while logging");
                    None
                });
            let (item_name, kcal) = match matched {
                Some(item) => (
                    item.name,
                    nutrition::scale_per_100g(item.per_100g.kcal, grams),
                ),
                None => match extract_kcal(&fragment) {
                    Some(kcal) => (fragment, kcal),
                    // grams taken 1:1 as kcal; suspect, kept for compatibility
                    None => (fragment, grams),
                },
            };

            let record = NewConsumption {
                client_id,
                meal_slot: meal_slot.to_string(),
                item_name,
                grams,
                kcal,
            };
            match self.store.insert_consumption(record.clone()).await {
                Ok(saved) => {
                    info!(%client_id, item = %saved.item_name, kcal = saved.kcal, "consumption logged");
                    lines.push(responders::consumption_logged(
                        &saved.item_name,
                        saved.grams,
                        saved.kcal,
                    ));
                }
                Err(e) => {
                    error!(error = %e, %client_id, item = %record.item_name, "consumption not saved");
                    lines.push(responders::consumption_failed(&record.item_name));
                }
            }
        }
        lines.join("\n")
    }

    async fn follow_up(&self, client_id: Uuid) -> CoreResult<String> {
        let Some(last) = self.store.latest_bot_turn(client_id).await? else {
            return Ok(responders::follow_up_no_context());
        };
        Ok(match extract_kcal_mention(&last.text) {
            Some(kcal) => responders::follow_up_kcal(kcal),
            None => responders::follow_up_no_kcal(),
        })
    }

    async fn save_turn(&self, client_id: Uuid, role: Role, text: &str) {
        if let Err(e) = self.store.append_turn(client_id, role, text).await {
            error!(error = %e, %client_id, role = role.as_str(), "conversation turn not saved");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::chat::repo_types::ConsumptionRecord;
    use crate::clients::repo_types::NewClient;
    use crate::nlu::embedding::testing::KeywordEmbedder;
    use crate::nlu::embedding::SharedEmbedder;
    use crate::nlu::intents::IntentCatalog;
    use crate::nutrition::ActivityLevel;
    use crate::plans::repo_types::Macros;
    use crate::plans::services::add_plan_item;
    use crate::store::MemoryStore;

    struct Fixture {
        memory: Arc<MemoryStore>,
        store: SharedStore,
        client: Uuid,
    }

    async fn fixture() -> Fixture {
        let memory = Arc::new(MemoryStore::new());
        let store: SharedStore = memory.clone();
        let client = store
            .create_client(NewClient {
                nutritionist_id: Uuid::new_v4(),
                name: "Carlos".into(),
                email: "carlos@x.com".into(),
                password_hash: "hash".into(),
                age: Some(30),
                sex: Some("M".into()),
                weight_kg: Some(85.0),
                height_cm: Some(175.0),
                activity: ActivityLevel::parse("sedentario"),
                goal: Some("Perder peso".into()),
            })
            .await
            .unwrap()
            .id;
        Fixture {
            memory,
            store,
            client,
        }
    }

    async fn add_item(
        f: &Fixture,
        embedder: Option<&SharedEmbedder>,
        slot: &str,
        name: &str,
        kcal: f64,
    ) {
        add_plan_item(
            &f.store,
            embedder,
            f.client,
            slot,
            name,
            Macros {
                kcal,
                ..Default::default()
            },
        )
        .await
        .unwrap();
    }

    fn lexical_engine(f: &Fixture) -> DialogueEngine {
        DialogueEngine::new(NluContext::disabled(), f.store.clone())
    }

    async fn intent_engine(f: &Fixture) -> DialogueEngine {
        let embedder = KeywordEmbedder::shared(&["olá", "almoço", "restam", "perfil"]);
        let catalog = IntentCatalog::build(
            vec![
                ("saudacoes".into(), vec!["olá".into()]),
                ("perguntar_opcoes_almoco".into(), vec!["opções de almoço".into()]),
                ("calorias_disponiveis".into(), vec!["quantas restam".into()]),
                ("mostrar_info".into(), vec!["meu perfil".into()]),
            ],
            &embedder,
        )
        .await
        .unwrap();
        DialogueEngine::new(NluContext::new(Some(embedder), catalog), f.store.clone())
    }

    async fn today(f: &Fixture) -> Vec<ConsumptionRecord> {
        f.store.consumption_today(f.client).await.unwrap()
    }

    #[tokio::test]
    async fn weight_update_beats_water() {
        let f = fixture().await;
        let engine = lexical_engine(&f);
        let text = "meu peso é 80kg, quanta água devo beber?";
        assert!(matches!(
            engine.route(f.client, text).await,
            Some(Matched::Weight(w)) if w == 80.0
        ));

        let reply = engine.respond(f.client, text).await;
        assert!(reply.contains("80.0 kg"));
        let profile = f.store.get_client(f.client).await.unwrap().unwrap();
        assert_eq!(profile.weight_kg, Some(80.0));
    }

    #[tokio::test]
    async fn cascade_order() {
        let f = fixture().await;
        let engine = lexical_engine(&f);
        add_item(&f, None, "almoco", "Arroz integral", 124.0).await;

        let cases = [
            ("me dê meu relatório", Some(Step::Report)),
            ("quanta água?", Some(Step::Water)),
            ("comi arroz integral", Some(Step::Consumption)),
            ("quantas calorias tem?", Some(Step::FollowUp)),
            ("e o arroz integral?", Some(Step::PlanLookup)),
            ("bla bla", None),
        ];
        for (text, expected) in cases {
            let step = engine.route(f.client, text).await.map(|m| m.step());
            assert_eq!(step, expected, "{text}");
        }
    }

    #[tokio::test]
    async fn every_turn_stores_one_user_and_one_bot_turn() {
        let f = fixture().await;
        let engine = lexical_engine(&f);
        for text in ["oi", "quanta água?", "me dê meu relatório", "comi 100g de arroz"] {
            engine.respond(f.client, text).await;
        }
        let history = f.store.conversation_history(f.client).await.unwrap();
        assert_eq!(history.len(), 8);
        for pair in history.chunks(2) {
            assert_eq!(pair[0].role, Role::User);
            assert_eq!(pair[1].role, Role::Bot);
        }
        assert_eq!(history[0].text, "oi");
        assert_eq!(history[5].text, responders::REPORT_PLACEHOLDER);
    }

    #[tokio::test]
    async fn logs_plan_item_by_embedding() {
        let f = fixture().await;
        let embedder = KeywordEmbedder::shared(&["panqueca", "arroz"]);
        add_item(&f, Some(&embedder), "cafe da manha", "Panqueca", 200.0).await;
        let nlu = NluContext::new(Some(embedder), IntentCatalog::empty());
        let engine = DialogueEngine::new(nlu, f.store.clone());

        let reply = engine
            .respond(f.client, "Comi 150g de panqueca no café da manhã")
            .await;
        assert!(reply.contains("<b>Panqueca</b> (150g) com ~300 kcal"));

        let records = today(&f).await;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].kcal, 300.0);
        assert_eq!(records[0].meal_slot, "cafe da manha");
        assert_eq!(records[0].item_name, "Panqueca");
    }

    #[tokio::test]
    async fn logging_fallbacks() {
        let f = fixture().await;
        let engine = lexical_engine(&f);

        let reply = engine
            .respond(f.client, "comi 100g de arroz e 150g de frango no almoço")
            .await;
        assert_eq!(reply.lines().count(), 2);
        let records = today(&f).await;
        assert_eq!(records[0].item_name, "arroz");
        assert_eq!(records[0].kcal, 100.0);
        assert_eq!(records[1].item_name, "frango");
        assert_eq!(records[1].meal_slot, "almoco");

        engine.respond(f.client, "comi bolo 350 kcal 80g").await;
        let records = today(&f).await;
        assert_eq!(records[2].kcal, 350.0);
        assert_eq!(records[2].grams, 80.0);

        let reply = engine.respond(f.client, "comemos").await;
        assert!(reply.starts_with("Não entendi o que você comeu"));
        assert_eq!(today(&f).await.len(), 3);
    }

    #[tokio::test]
    async fn zero_grams_asks_again_without_writing() {
        let f = fixture().await;
        let engine = lexical_engine(&f);
        let reply = engine.respond(f.client, "comi 0g de arroz").await;
        assert_eq!(reply, responders::consumption_bad_quantity("arroz"));
        assert!(today(&f).await.is_empty());

        let reply = engine
            .respond(f.client, "comi 0g de arroz e 100g de feijao")
            .await;
        assert_eq!(reply.lines().count(), 2);
        let records = today(&f).await;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].item_name, "feijao");
    }

    #[tokio::test]
    async fn persistence_failure_is_reported() {
        let f = fixture().await;
        let engine = lexical_engine(&f);
        f.memory.set_fail_writes(true);

        let reply = engine.respond(f.client, "comi 100g de arroz").await;
        assert!(reply.contains("Não consegui salvar <b>arroz</b>"));
        assert!(reply.contains("nutri"));

        let reply = engine.respond(f.client, "meu peso é 79kg").await;
        assert_eq!(reply, responders::weight_failed());

        f.memory.set_fail_writes(false);
        assert!(today(&f).await.is_empty());
        assert!(f.store.conversation_history(f.client).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn follow_up_reads_last_bot_turn() {
        let f = fixture().await;
        let engine = lexical_engine(&f);

        let reply = engine.respond(f.client, "quantas calorias?").await;
        assert_eq!(reply, responders::follow_up_no_context());

        let reply = engine.respond(f.client, "quanto tem nisso?").await;
        assert_eq!(reply, responders::follow_up_no_kcal());
        assert_ne!(responders::follow_up_no_context(), responders::follow_up_no_kcal());

        engine.respond(f.client, "comi 120g de pizza").await;
        let reply = engine.respond(f.client, "quanto isso?").await;
        assert!(reply.contains("~120 kcal"));
    }

    #[tokio::test]
    async fn water_needs_a_weight() {
        let f = fixture().await;
        let engine = lexical_engine(&f);
        let reply = engine.respond(f.client, "quanta agua?").await;
        assert!(reply.contains("~2975 ml/dia"));

        let other = fixture().await;
        let blank = other
            .store
            .create_client(NewClient {
                nutritionist_id: Uuid::new_v4(),
                name: "Sem peso".into(),
                email: "sem@x.com".into(),
                password_hash: "h".into(),
                age: None,
                sex: None,
                weight_kg: None,
                height_cm: None,
                activity: ActivityLevel::Sedentary,
                goal: None,
            })
            .await
            .unwrap();
        let reply = lexical_engine(&other).respond(blank.id, "água").await;
        assert!(reply.contains("Meu peso 72kg"));
    }

    #[tokio::test]
    async fn water_follows_weight_not_the_stored_goal() {
        let f = fixture().await;
        let engine = lexical_engine(&f);
        let blank = f
            .store
            .create_client(NewClient {
                nutritionist_id: Uuid::new_v4(),
                name: "Meta".into(),
                email: "meta@x.com".into(),
                password_hash: "h".into(),
                age: None,
                sex: None,
                weight_kg: None,
                height_cm: None,
                activity: ActivityLevel::Sedentary,
                goal: None,
            })
            .await
            .unwrap();
        f.store
            .update_client(
                blank.id,
                &ProfileUpdate {
                    water_goal_ml: Some(2000),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let reply = engine.respond(blank.id, "quanta água?").await;
        assert_eq!(reply, responders::water_unknown());

        engine.respond(blank.id, "meu peso é 70kg").await;
        let reply = engine.respond(blank.id, "quanta água?").await;
        assert!(reply.contains("~2450 ml/dia"));
        assert!(reply.contains("meta de <b>2000 ml/dia</b>"));
    }

    #[tokio::test]
    async fn intents_drive_replies() {
        let f = fixture().await;
        add_item(&f, None, "almoco", "Frango grelhado", 165.0).await;
        add_item(&f, None, "janta", "Sopa", 40.0).await;
        let engine = intent_engine(&f).await;

        assert!(engine.respond(f.client, "olá!").await.starts_with("Olá, Carlos!"));

        let lunch = engine.respond(f.client, "opções de almoço").await;
        assert!(lunch.contains("Frango grelhado"));
        assert!(!lunch.contains("Sopa"));
        let stored = f.store.latest_bot_turn(f.client).await.unwrap().unwrap();
        assert_eq!(stored.text, lunch.lines().next().unwrap());
        assert!(!stored.text.contains("165"));
        let reply = engine.respond(f.client, "quanto isso?").await;
        assert_eq!(reply, responders::follow_up_no_kcal());

        let info = engine.respond(f.client, "meu perfil").await;
        assert!(info.contains("27.76"));
        assert!(info.contains("Meta Diária:</b> ~215"));
        let stored = f.store.latest_bot_turn(f.client).await.unwrap().unwrap();
        assert_eq!(stored.text, "Aqui está um resumo do seu perfil, Carlos:");
    }

    #[tokio::test]
    async fn remaining_calories_intent() {
        let f = fixture().await;
        add_item(&f, None, "almoco", "Frango grelhado", 200.0).await;
        add_item(&f, None, "lanche", "Castanhas", 600.0).await;
        let engine = intent_engine(&f).await;

        f.store
            .insert_consumption(NewConsumption {
                client_id: f.client,
                meal_slot: "almoco".into(),
                item_name: "arroz".into(),
                grams: 100.0,
                kcal: 1158.5,
            })
            .await
            .unwrap();
        let reply = engine.respond(f.client, "quantas restam?").await;
        assert!(reply.contains("~1000 kcal"));
        assert!(reply.find("Frango grelhado").unwrap() < reply.find("Castanhas").unwrap());

        f.store
            .insert_consumption(NewConsumption {
                client_id: f.client,
                meal_slot: "janta".into(),
                item_name: "pizza".into(),
                grams: 100.0,
                kcal: 960.0,
            })
            .await
            .unwrap();
        let reply = engine.respond(f.client, "quantas restam?").await;
        assert!(reply.starts_with("Parabéns!"));
    }

    #[tokio::test]
    async fn plan_lookup_and_decline() {
        let f = fixture().await;
        add_item(&f, None, "almoco", "Arroz integral", 124.0).await;
        let engine = lexical_engine(&f);

        let reply = engine.respond(f.client, "e o arroz integral?").await;
        assert!(reply.starts_with("Encontrei <b>Arroz integral</b>"));
        assert!(reply.contains("124 kcal"));

        let reply = engine.respond(f.client, "bla bla").await;
        assert_eq!(reply, responders::decline());
    }

    #[tokio::test]
    async fn report_contains_sections() {
        let f = fixture().await;
        add_item(&f, None, "almoco", "Arroz integral", 124.0).await;
        let engine = lexical_engine(&f);
        engine.respond(f.client, "comi 100g de arroz").await;

        let report = engine.respond(f.client, "me mande todas as informações").await;
        assert!(report.contains("=== DADOS DO CLIENTE ==="));
        assert!(report.contains("<b>ALMOCO</b>: 1 opções"));
        assert!(report.contains("arroz (100g)"));
        assert!(report.contains("<b>user</b>: comi 100g de arroz"));
        let last = f.store.latest_bot_turn(f.client).await.unwrap().unwrap();
        assert_eq!(last.text, responders::REPORT_PLACEHOLDER);
    }
}
