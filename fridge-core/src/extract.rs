//! Heuristic ingredient extraction from chat text.
//!
//! Used when no collaborator identified ingredients, and by the intent
//! classifier to decide whether a message is a bare ingredient list.

use std::sync::LazyLock;

use regex::Regex;

/// Separators between ingredients: whitespace and common CJK/ASCII list punctuation.
static SEPARATOR_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\s、,，;；/｜|]+").expect("Invalid separator regex"));

/// The same set without whitespace, for lists of multi-word names.
static PUNCTUATION_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[、,，;；/｜|]+").expect("Invalid punctuation regex"));

/// "I have ...", "我家有 ..." and similar possession cues; the ingredients follow.
static POSSESSION_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(我家有|冰箱裡有|冰箱有|我剩下|剩下|\bi(?:'ve| have)(?: got)?\b|\bmy fridge has\b|\bleftovers?:?|有)\s*(.*)$",
    )
    .expect("Invalid possession regex")
});

static SENTENCE_END_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[。.!！?？\n]").expect("Invalid sentence end regex"));

/// Filler words dropped when splitting a whole sentence.
const STOPWORDS: &[&str] = &[
    "我", "家", "有", "冰箱", "剩下", "想", "煮", "做", "可以", "幫我", "一下", "i", "have",
    "want", "to", "cook", "make", "with", "and", "some", "the", "a", "an", "please", "my",
    "fridge", "got", "hi", "hello", "hey", "thanks", "thank", "you", "ok", "okay", "yes", "no",
    "你好", "哈囉", "嗨", "謝謝", "好", "好的", "是", "不",
];

/// Split text into list items, dropping empty parts.
///
/// When list punctuation is present only punctuation separates items, so
/// "chicken thigh, onion" keeps "chicken thigh" whole. Otherwise whitespace
/// separates too.
pub fn split_items(text: &str) -> Vec<String> {
    let text = text.trim();
    let separator = if PUNCTUATION_REGEX.is_match(text) {
        &PUNCTUATION_REGEX
    } else {
        &SEPARATOR_REGEX
    };
    separator
        .split(text)
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}

const QUOTE_PAIRS: &[(char, char)] = &[('"', '"'), ('「', '」'), ('“', '”')];

fn unquote(text: &str) -> Option<&str> {
    QUOTE_PAIRS
        .iter()
        .find_map(|&(open, close)| text.strip_prefix(open)?.strip_suffix(close))
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Split the argument of an explicit add/remove command.
///
/// Like [`split_items`], except that Latin text without list punctuation is a
/// single multi-word name ("marbled beef short-rib"). Han text still splits on
/// whitespace. A quoted argument (`"雞 腿"`, `「雞 腿」`) is always one item.
pub fn split_command_items(text: &str) -> Vec<String> {
    let text = text.trim();
    if text.is_empty() {
        return Vec::new();
    }
    if let Some(inner) = unquote(text) {
        return vec![inner.to_string()];
    }
    if PUNCTUATION_REGEX.is_match(text) || text.chars().any(is_han) {
        return split_items(text);
    }
    vec![text.split_whitespace().collect::<Vec<_>>().join(" ")]
}

pub(crate) fn is_han(c: char) -> bool {
    matches!(c, '\u{4E00}'..='\u{9FFF}' | '\u{3400}'..='\u{4DBF}' | '\u{F900}'..='\u{FAFF}')
}

/// True for filler words that show up in sentences but never name an ingredient.
pub fn is_filler(word: &str) -> bool {
    let word = word.trim().to_lowercase();
    STOPWORDS.iter().any(|s| *s == word)
}

/// Longest text accepted as a single ingredient name, in characters.
const MAX_INGREDIENT_CHARS: usize = 24;

/// Ingredients listed after a possession cue ("I have ...", "我家有 ..."),
/// up to the end of that sentence. Empty when there is no cue.
pub fn possessed_ingredients(text: &str) -> Vec<String> {
    let Some(tail) = POSSESSION_REGEX
        .captures(text.trim())
        .and_then(|c| c.get(2))
        .map(|m| m.as_str())
    else {
        return Vec::new();
    };

    let sentence = SENTENCE_END_REGEX.split(tail).next().unwrap_or_default();
    split_items(sentence)
        .into_iter()
        .filter(|p| !is_filler(p) && p.chars().count() <= MAX_INGREDIENT_CHARS)
        .collect()
}

/// Best-effort list of ingredients mentioned in free text.
///
/// If a possession cue is present, only the text after it is used. Otherwise
/// the whole message is split and filler words are removed.
pub fn heuristic_ingredients(text: &str) -> Vec<String> {
    let text = text.trim();
    if text.is_empty() {
        return Vec::new();
    }

    let possessed = possessed_ingredients(text);
    if !possessed.is_empty() {
        return possessed;
    }

    split_items(text)
        .into_iter()
        .filter(|p| !is_filler(p))
        .collect()
}
