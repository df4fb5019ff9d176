//! Reply texts. Everything here formats data the engine already loaded;
//! nothing touches the store.

use std::collections::BTreeMap;

use time::macros::format_description;
use time::OffsetDateTime;

use crate::chat::repo_types::{ConsumptionRecord, ConversationTurn};
use crate::clients::repo_types::ClientProfile;
use crate::nutrition::{self, GOAL_MET_MARGIN_KCAL};
use crate::plans::repo_types::PlanItem;

/// Stored in place of the report itself.
pub const REPORT_PLACEHOLDER: &str = "Gerando relatório completo...";

/// Suggestions below this portion are not worth offering.
pub const MIN_PORTION_GRAMS: f64 = 20.0;

pub const MAX_SUGGESTIONS: usize = 5;

pub const REPORT_TURNS: usize = 10;

/// Drops a trailing ".0" so whole quantities read naturally.
pub fn format_amount(v: f64) -> String {
    if v.fract() == 0.0 {
        format!("{v:.0}")
    } else {
        format!("{v:.1}")
    }
}

fn format_time(at: OffsetDateTime) -> String {
    at.format(format_description!("[year]-[month]-[day] [hour]:[minute]"))
        .unwrap_or_else(|_| at.to_string())
}

fn or_dash<T: ToString>(v: Option<T>) -> String {
    v.map(|v| v.to_string()).unwrap_or_else(|| "—".into())
}

pub fn client_missing() -> String {
    "Não encontrei seu cadastro. 😕 Fale com seu/sua nutri para conferir seu acesso.".into()
}

pub fn store_unavailable() -> String {
    "Não consegui acessar seus dados agora. Tente novamente em instantes.".into()
}

pub fn greeting(name: &str) -> String {
    format!("Olá, {name}! 👋 Estou aqui para te ajudar. Sobre o que vamos conversar hoje?")
}

pub fn meal_options(slot: &str, items: &[&PlanItem]) -> String {
    if items.is_empty() {
        return format!(
            "Ainda não tenho opções cadastradas para o seu '<b>{slot}</b>'. 😕 Você pode me pedir \
             sugestões de outra refeição ou falar com seu/sua nutri para adicionar novas opções!"
        );
    }
    let mut lines = vec![format!(
        "Claro! Aqui estão as opções que seu/sua nutri cadastrou para o seu <b>{slot}</b>:"
    )];
    for item in items {
        let m = item.per_100g;
        lines.push(format!(
            "• <b>{}</b>: {:.0} kcal, {:.1}g prot, {:.1}g carb, {:.1}g gord. (por 100g)",
            item.name, m.kcal, m.protein, m.carb, m.fat
        ));
    }
    lines.join("\n")
}

pub fn missing_profile_data() -> String {
    "Faltam dados (peso/altura/idade) para calcular sua meta calórica. Peça para seu/sua nutri \
     completar seu cadastro! 😉"
        .into()
}

struct Suggestion<'a> {
    item: &'a PlanItem,
    max_grams: f64,
}

/// Budget left for today, or plan items that still fit it with their
/// largest portion.
pub fn remaining_calories(tdee: f64, consumed: f64, items: &[PlanItem]) -> String {
    let remaining = nutrition::remaining_budget(tdee, consumed, 0.0);
    if remaining <= GOAL_MET_MARGIN_KCAL {
        return format!(
            "Parabéns! 🥳 Você já atingiu sua meta diária de ~{tdee:.0} kcal (consumido: \
             {consumed:.0} kcal). Por hoje, o ideal é focar em bebidas sem calorias, como água ou chá."
        );
    }

    let mut suggestions: Vec<Suggestion> = items
        .iter()
        .filter_map(|item| {
            let max_grams = nutrition::max_portion_grams(remaining, item.per_100g.kcal)?.floor();
            (max_grams >= MIN_PORTION_GRAMS).then_some(Suggestion { item, max_grams })
        })
        .collect();

    if suggestions.is_empty() {
        return format!(
            "Hmm, pelas minhas contas, restam apenas <b>~{remaining:.0} kcal</b> para hoje. Nenhuma \
             das opções do seu plano se encaixa facilmente nesse valor. Que tal uma fruta leve ou um chá? 🍵"
        );
    }

    suggestions.sort_by(|a, b| b.max_grams.total_cmp(&a.max_grams));
    let mut lines = vec![
        format!(
            "Você ainda tem <b>~{remaining:.0} kcal</b> para hoje (Meta: ~{tdee:.0} kcal | \
             Consumido: {consumed:.0} kcal)."
        ),
        "Com base no seu plano, aqui estão algumas sugestões e a <b>porção máxima</b> de cada uma \
         para você se manter na meta:"
            .to_string(),
    ];
    for s in suggestions.iter().take(MAX_SUGGESTIONS) {
        lines.push(format!(
            "• <b>{}</b> ({}): até <b>{:.0}g</b> (~{:.0} kcal/100g)",
            s.item.name, s.item.meal_slot, s.max_grams, s.item.per_100g.kcal
        ));
    }
    lines.join("\n")
}

pub fn show_info(profile: &ClientProfile, consumed: f64, records: usize) -> String {
    let (Some(weight), Some(height), Some(age)) =
        (profile.weight_kg, profile.height_cm, profile.age)
    else {
        return "Parece que alguns dos seus dados de perfil (peso, altura, idade) não estão \
                preenchidos. Peça para seu/sua nutri completar seu cadastro! 😉"
            .into();
    };

    let bmi = nutrition::bmi(weight, height);
    let bmi_text = bmi.map(|v| format!("{v:.2}")).unwrap_or_else(|| "—".into());
    let tdee = nutrition::tdee(
        nutrition::bmr(weight, height, f64::from(age), profile.sex.as_deref()),
        profile.activity,
    );
    [
        format!("Aqui está um resumo do seu perfil, {}:", profile.name),
        format!(
            "• <b>Peso:</b> {} kg (Altura: {} cm)",
            format_amount(weight),
            format_amount(height)
        ),
        format!(
            "• <b>IMC:</b> {bmi_text} ({})",
            nutrition::classify_bmi(bmi).describe()
        ),
        format!("• <b>Meta Diária:</b> ~{tdee:.0} kcal"),
        format!("• <b>Consumo Hoje:</b> {consumed:.0} kcal ({records} registros)"),
        format!(
            "• <b>Água:</b> ~{:.0} ml/dia",
            nutrition::water_target_ml(weight)
        ),
    ]
    .join("\n")
}

pub fn report(
    profile: &ClientProfile,
    plan: &BTreeMap<String, Vec<PlanItem>>,
    today: &[ConsumptionRecord],
    recent: &[ConversationTurn],
) -> String {
    let bmi = match (profile.weight_kg, profile.height_cm) {
        (Some(w), Some(h)) => nutrition::bmi(w, h),
        _ => None,
    };
    let water = profile
        .weight_kg
        .map(nutrition::water_target_ml)
        .map(|ml| format!("~{ml:.0} ml/dia (~{:.2} L)", ml / 1000.0))
        .unwrap_or_else(|| "—".into());
    let (bmr_text, tdee_text) = match (profile.weight_kg, profile.height_cm, profile.age) {
        (Some(w), Some(h), Some(a)) => {
            let bmr = nutrition::bmr(w, h, f64::from(a), profile.sex.as_deref());
            let tdee = nutrition::tdee(bmr, profile.activity);
            (
                format!("{bmr:.0} kcal/dia"),
                format!(
                    "{tdee:.0} kcal/dia (atividade: {})",
                    profile.activity.as_str()
                ),
            )
        }
        _ => ("—".into(), "—".into()),
    };
    let consumed: f64 = today.iter().map(|r| r.kcal).sum();

    let mut lines = vec![
        "Aqui está o relatório completo que eu gero para seu/sua nutri (e para você, claro! 😉):"
            .to_string(),
        String::new(),
        "<b>=== DADOS DO CLIENTE ===</b>".to_string(),
        format!("• <b>Nome:</b> {}", profile.name),
        format!(
            "• <b>Idade:</b> {} | Sexo: {}",
            or_dash(profile.age),
            or_dash(profile.sex.as_deref())
        ),
        format!(
            "• <b>Peso Atual:</b> {} kg | Altura: {} cm",
            or_dash(profile.weight_kg.map(format_amount)),
            or_dash(profile.height_cm.map(format_amount))
        ),
        format!(
            "• <b>Peso Inicial:</b> {} | <b>Meta:</b> {}",
            or_dash(profile.initial_weight_kg.map(format_amount)),
            or_dash(profile.goal.as_deref())
        ),
        format!(
            "• <b>IMC:</b> {} ({})",
            or_dash(bmi.map(|v| format!("{v:.2}"))),
            nutrition::classify_bmi(bmi).describe()
        ),
        format!("• <b>Água:</b> {water}"),
        format!("• <b>Metas:</b> BMR: {bmr_text} | TDEE: {tdee_text}"),
        format!(
            "• <b>Consumo Hoje:</b> {consumed:.1} kcal ({} registros)",
            today.len()
        ),
        String::new(),
        "<b>--- PLANO ALIMENTAR ---</b>".to_string(),
    ];

    if plan.is_empty() {
        lines.push("• Plano vazio.".into());
    }
    for (slot, items) in plan {
        lines.push(format!(
            "• <b>{}</b>: {} opções",
            slot.to_uppercase(),
            items.len()
        ));
        for item in items {
            lines.push(format!(
                "    - {}: {:.0} kcal/100g",
                item.name, item.per_100g.kcal
            ));
        }
    }

    lines.push(String::new());
    lines.push("<b>--- REGISTROS DE HOJE ---</b>".into());
    if today.is_empty() {
        lines.push("• Sem registros de consumo hoje.".into());
    }
    for r in today {
        lines.push(format!(
            "• {} | {} ({}g) → {:.0} kcal",
            format_time(r.logged_at),
            r.item_name,
            format_amount(r.grams),
            r.kcal
        ));
    }

    lines.push(String::new());
    lines.push("<b>--- ÚLTIMAS MENSAGENS ---</b>".into());
    if recent.is_empty() {
        lines.push("• Sem histórico de conversas.".into());
    }
    for t in recent {
        lines.push(format!(
            "• [{}] <b>{}</b>: {}",
            format_time(t.created_at),
            t.role.as_str(),
            t.text
        ));
    }
    lines.join("\n")
}

pub fn weight_updated(kg: f64) -> String {
    format!(
        "Entendido! Atualizei seu peso para <b>{kg:.1} kg</b>. Vou usar esse valor para recalcular \
         suas metas de calorias e água. 👍"
    )
}

pub fn weight_invalid() -> String {
    "Esse peso não parece válido. Tente algo como 'Meu peso 72kg'.".into()
}

pub fn weight_failed() -> String {
    "Erro ao atualizar peso. Peça para a nutricionista atualizar manualmente.".into()
}

/// Weight-based target; a goal set by the nutritionist is shown on its own line.
pub fn water_target(ml: f64, nutritionist_goal_ml: Option<i32>) -> String {
    let mut text = format!(
        "Com base no seu peso, a sugestão de ingestão de água é de <b>~{ml:.0} ml/dia</b> (cerca de \
         {:.2} L). Mantenha-se hidratado! 💧",
        ml / 1000.0
    );
    if let Some(goal) = nutritionist_goal_ml {
        text.push_str(&format!("\nSeu/sua nutri definiu uma meta de <b>{goal} ml/dia</b>."));
    }
    text
}

pub fn water_unknown() -> String {
    "Não tenho seu peso cadastrado. Peça para a nutricionista cadastrar ou escreva 'Meu peso 72kg' \
     para atualizar."
        .into()
}

pub fn consumption_unclear() -> String {
    "Não entendi o que você comeu. 😅 Para eu registrar, tente dizer o alimento e a quantidade, por \
     exemplo: 'Comi 100g de arroz e 150g de frango no almoço'."
        .into()
}

pub fn consumption_logged(name: &str, grams: f64, kcal: f64) -> String {
    format!(
        "Anotado! ✅ <b>{name}</b> ({}g) com ~{kcal:.0} kcal.",
        format_amount(grams)
    )
}

pub fn consumption_bad_quantity(name: &str) -> String {
    format!(
        "A quantidade de <b>{name}</b> não parece válida. 🤔 Me diga quantos gramas, por exemplo: \
         'Comi 100g de {name}'."
    )
}

pub fn consumption_failed(name: &str) -> String {
    format!(
        "Não consegui salvar <b>{name}</b>. 😕 Peça para seu/sua nutri registrar manualmente."
    )
}

pub fn follow_up_kcal(kcal: f64) -> String {
    format!("A última opção que mencionei tem <b>~{kcal:.0} kcal</b> (a cada 100g, geralmente).")
}

pub fn follow_up_no_context() -> String {
    "Não achei referência anterior clara.".into()
}

pub fn follow_up_no_kcal() -> String {
    "Não consegui inferir as calorias da mensagem anterior.".into()
}

pub fn plan_item_detail(item: &PlanItem) -> String {
    let m = item.per_100g;
    format!(
        "Encontrei <b>{}</b> no seu plano! Aqui estão os detalhes (para 100g):\n\
         • <b>Calorias:</b> {:.0} kcal\n\
         • <b>Proteínas:</b> {:.1}g\n\
         • <b>Carboidratos:</b> {:.1}g\n\
         • <b>Gorduras:</b> {:.1}g",
        item.name, m.kcal, m.protein, m.carb, m.fat
    )
}

pub fn decline() -> String {
    "Desculpe, não consegui entender. 😅 Você pode tentar perguntar de outra forma? Lembre-se que \
     eu funciono melhor com perguntas como 'O que posso jantar?' ou 'Comi 150g de frango'."
        .into()
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;
    use crate::plans::repo_types::Macros;

    fn item(name: &str, slot: &str, kcal: f64) -> PlanItem {
        PlanItem {
            id: 1,
            client_id: Uuid::nil(),
            meal_slot: slot.into(),
            name: name.into(),
            per_100g: Macros {
                kcal,
                protein: 3.5,
                ..Default::default()
            },
            embedding_text: String::new(),
            embedding: None,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    #[test]
    fn amounts() {
        assert_eq!(format_amount(150.0), "150");
        assert_eq!(format_amount(12.5), "12.5");
    }

    #[test]
    fn goal_met_at_margin() {
        let text = remaining_calories(2000.0, 1950.0, &[]);
        assert!(text.starts_with("Parabéns!"));
        let text = remaining_calories(2000.0, 1949.0, &[]);
        assert!(text.contains("restam apenas"));
    }

    #[test]
    fn suggestions_largest_portion_first() {
        let items = vec![
            item("Granola", "lanche", 400.0),
            item("Alface", "almoco", 15.0),
            item("Agua", "ceia", 0.0),
            item("Azeite", "almoco", 900.0),
            item("Frango", "janta", 165.0),
        ];
        let text = remaining_calories(1000.0, 850.0, &items);
        assert!(text.contains("~150 kcal"));
        let alface = text.find("Alface").unwrap();
        let frango = text.find("Frango").unwrap();
        let granola = text.find("Granola").unwrap();
        assert!(alface < frango && frango < granola);
        assert!(text.contains("até <b>1000g</b>"));
        assert!(!text.contains("Agua"));
        assert!(!text.contains("Azeite"));
    }

    #[test]
    fn at_most_five_suggestions() {
        let items: Vec<_> = (1..=8)
            .map(|i| item(&format!("Item{i}"), "almoco", 10.0 * i as f64))
            .collect();
        let text = remaining_calories(3000.0, 0.0, &items);
        assert_eq!(text.matches("• ").count(), MAX_SUGGESTIONS);
        assert!(text.contains("Item1"));
        assert!(!text.contains("Item6"));
    }

    #[test]
    fn option_listing_mentions_kcal() {
        let it = item("Tapioca", "cafe da manha", 240.0);
        let text = meal_options("cafe da manha", &[&it]);
        assert!(text.contains("<b>Tapioca</b>: 240 kcal, 3.5g prot"));
        assert!(meal_options("janta", &[]).contains("Ainda não tenho opções"));
    }
}
