//! Regex extraction of food/quantity pairs and of the single-fact patterns
//! (weight updates, explicit kcal mentions) the dialogue cascade keys on.

use lazy_static::lazy_static;
use regex::Regex;

use super::text::{fold_accents, parse_decimal};

/// Grams assumed when a quantity is missing or unreadable.
pub const DEFAULT_GRAMS: f64 = 100.0;

/// Meal slot recorded when no meal key is mentioned.
pub const DEFAULT_MEAL_SLOT: &str = "refeicao";

/// Canonical meal keys, in matching priority.
pub const MEAL_KEYS: &[&str] = &[
    "cafe da manha",
    "almoco",
    "lanche",
    "lanche da tarde",
    "janta",
    "ceia",
    "lanche noturno",
];

lazy_static! {
    static ref QUANTITY_RE: Regex =
        Regex::new(r"(?i)(\d+(?:[.,]\d+)?)\s*(?:gramas|grama|grams|gram|gr|g)\b").unwrap();
    static ref CONNECTOR_RE: Regex = Regex::new(r"^\s*(?:de|do|da|of)\s+").unwrap();
    static ref SEPARATOR_RE: Regex = Regex::new(r"\s+e\s+|,|;|\band\b").unwrap();
    static ref LEADING_VERB_RE: Regex =
        Regex::new(r"^(?:(?:eu|comi|comemos|comeu|registrei|anota a[ií]|de|do|da)(?:\s+|$))+").unwrap();
    static ref TRAILING_MEAL_RE: Regex = Regex::new(
        r"\s*\b(?:no|na|ao|pelo|pela|de|do|da)\s+(?:caf[eé] da manh[aã]|almo[cç]o|lanche|janta|jantar|ceia)\b.*$"
    )
    .unwrap();
    static ref WORD_RE: Regex = Regex::new(r"[\p{L}\p{N}]+").unwrap();
    static ref WEIGHT_RE: Regex = Regex::new(
        r"(?i)(?:\b(?:meu\s+)?peso|\b(?:my\s+)?weight)\s*(?:é|is|=)?\s*(\d+(?:[.,]\d+)?)\s*(?:kg)?\b"
    )
    .unwrap();
    static ref KCAL_RE: Regex =
        Regex::new(r"(?i)(\d+(?:[.,]\d+)?)\s*(?:kcal|calorias|cal)").unwrap();
    static ref KCAL_MENTION_RE: Regex = Regex::new(r"(?i)(\d+(?:[.,]\d+)?)\s*kcal").unwrap();
}

/// Extracts `(food name, grams)` pairs in order of appearance.
pub fn extract_items_and_grams(text: &str) -> Vec<(String, f64)> {
    let text = text.to_lowercase();

    let pairs = pair_quantities(&text);
    if !pairs.is_empty() {
        return pairs;
    }

    let pairs = split_fragments(&text);
    if !pairs.is_empty() {
        return pairs;
    }

    guess_after_ingestion_verb(&text)
        .map(|name| vec![(name, DEFAULT_GRAMS)])
        .unwrap_or_default()
}

/// Each quantity claims the name after a `de`/`of` connector ("100g de arroz"),
/// otherwise the name right before it ("arroz, 100g").
fn pair_quantities(text: &str) -> Vec<(String, f64)> {
    let quantities: Vec<(usize, usize, f64)> = QUANTITY_RE
        .captures_iter(text)
        .filter_map(|c| {
            let whole = c.get(0)?;
            let grams = parse_decimal(&c[1]).unwrap_or(DEFAULT_GRAMS);
            Some((whole.start(), whole.end(), grams))
        })
        .collect();

    let mut out = Vec::with_capacity(quantities.len());
    for (i, &(start, end, grams)) in quantities.iter().enumerate() {
        let prev_end = if i == 0 { 0 } else { quantities[i - 1].1 };
        let next_start = quantities.get(i + 1).map(|q| q.0).unwrap_or(text.len());

        let after = &text[end..next_start];
        let raw = match CONNECTOR_RE.find(after) {
            Some(m) => first_fragment(&after[m.end()..]),
            None => last_fragment(&text[prev_end..start]),
        };
        let name = clean_name(raw);
        if !name.is_empty() {
            out.push((name, grams));
        }
    }
    out
}

fn split_fragments(text: &str) -> Vec<(String, f64)> {
    SEPARATOR_RE
        .split(text)
        .filter_map(|fragment| {
            let fragment = fragment.trim();
            let caps = QUANTITY_RE.captures(fragment)?;
            let grams = parse_decimal(&caps[1]).unwrap_or(DEFAULT_GRAMS);
            let name = QUANTITY_RE.replace_all(fragment, "").trim().to_string();
            (!name.is_empty()).then_some((name, grams))
        })
        .collect()
}

fn guess_after_ingestion_verb(text: &str) -> Option<String> {
    let words: Vec<&str> = WORD_RE.find_iter(text).map(|m| m.as_str()).collect();
    let idx = words.iter().position(|w| *w == "comi")?;
    let tail = &words[idx + 1..];
    if tail.is_empty() {
        return None;
    }
    Some(tail.iter().take(3).copied().collect::<Vec<_>>().join(" "))
}

fn first_fragment(s: &str) -> &str {
    SEPARATOR_RE.split(s).next().unwrap_or("")
}

fn last_fragment(s: &str) -> &str {
    let s = s.trim_end_matches(|c: char| c.is_whitespace() || ",.;:".contains(c));
    SEPARATOR_RE.split(s).last().unwrap_or("")
}

fn clean_name(raw: &str) -> String {
    let trimmed = raw.trim_matches(|c: char| c.is_whitespace() || ",.;:!?".contains(c));
    let without_verb = LEADING_VERB_RE.replace(trimmed, "");
    let without_meal = TRAILING_MEAL_RE.replace(&without_verb, "");
    without_meal
        .trim_matches(|c: char| c.is_whitespace() || ",.;:!?".contains(c))
        .to_string()
}

/// New body weight from "meu peso é 72kg" / "my weight is 72".
pub fn extract_weight(text: &str) -> Option<f64> {
    let caps = WEIGHT_RE.captures(text)?;
    parse_decimal(&caps[1])
}

/// Explicit energy mention such as "350 kcal" or "200 calorias".
pub fn extract_kcal(text: &str) -> Option<f64> {
    let caps = KCAL_RE.captures(text)?;
    parse_decimal(&caps[1])
}

/// Strict "<n> kcal" mention, used when reading back a previous bot reply.
pub fn extract_kcal_mention(text: &str) -> Option<f64> {
    let caps = KCAL_MENTION_RE.captures(text)?;
    parse_decimal(&caps[1])
}

/// First canonical meal key mentioned in the text, accent-insensitive.
pub fn detect_meal_slot(text: &str) -> &'static str {
    let folded = fold_accents(&text.to_lowercase());
    MEAL_KEYS
        .iter()
        .copied()
        .find(|key| folded.contains(key))
        .unwrap_or(DEFAULT_MEAL_SLOT)
}
