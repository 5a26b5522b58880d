//! Mapping raw chat text to a closed set of intents.
//!
//! Rules are evaluated top to bottom and the first match wins. The order
//! matters: a bare "-" must open the removal menu, never remove an
//! ingredient called "-".

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;

use crate::extract::{is_filler, is_han, split_command_items, split_items};
use crate::paginate::PageDelta;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    ShowMenu,
    ShowHelp,
    ListInventory,
    ClearInventory,
    AddIngredients(Vec<String>),
    /// An empty list opens the removal menu
    RemoveIngredients(Vec<String>),
    Recommend,
    RegenerateSameIngredients,
    /// 1-based recipe number within the current round
    ShowRecipeSteps(usize),
    PageSteps(PageDelta),
    /// Free text to hand to the recipe source, with any ingredients the
    /// list heuristic already picked out
    FreeTextIngredients(Vec<String>),
    Unrecognized,
}

/// What to do with text no rule matched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FallbackPolicy {
    /// Hand the text to the recipe source as-is
    #[default]
    FreeText,
    Unrecognized,
}

impl FallbackPolicy {
    fn intent(self) -> Intent {
        match self {
            FallbackPolicy::FreeText => Intent::FreeTextIngredients(Vec::new()),
            FallbackPolicy::Unrecognized => Intent::Unrecognized,
        }
    }
}

impl FromStr for FallbackPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "free_text" | "freetext" => Ok(FallbackPolicy::FreeText),
            "unrecognized" => Ok(FallbackPolicy::Unrecognized),
            other => Err(format!("unknown fallback policy: {}", other)),
        }
    }
}

impl fmt::Display for FallbackPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FallbackPolicy::FreeText => write!(f, "free_text"),
            FallbackPolicy::Unrecognized => write!(f, "unrecognized"),
        }
    }
}

// Exact phrases, compared after trimming and lowercasing.
const MENU_PHRASES: &[&str] = &["+", "menu", "開啟按鈕選單", "按鈕選單", "開啟選單", "選單"];
const HELP_PHRASES: &[&str] = &["help", "?", "？", "說明", "使用說明", "怎麼用"];
const REMOVAL_MENU_PHRASES: &[&str] = &["-", "remove", "用完食材", "移除食材", "刪食材", "減食材"];
const LIST_PHRASES: &[&str] = &["list", "fridge", "inventory", "查看冰箱", "冰箱", "我的冰箱"];
const CLEAR_PHRASES: &[&str] = &["clear", "reset", "清空冰箱", "清空", "重置冰箱", "清空全部"];
const NEXT_PHRASES: &[&str] = &["next", "next page", "下一頁", "下一"];
const PREVIOUS_PHRASES: &[&str] = &["prev", "previous", "previous page", "上一頁", "上一"];
const REGENERATE_PHRASES: &[&str] = &[
    "regenerate", "more recipes", "other recipes", "換食譜", "換", "重新推薦", "再推薦", "換一批",
];
const RECOMMEND_PHRASES: &[&str] = &[
    "recommend", "recipes", "what should i cook", "推薦", "推薦食譜", "給我食譜", "食譜", "煮什麼",
    "今天煮什麼",
];

/// Markers of a question rather than a list.
const INTERROGATIVES: &[&str] = &["?", "？", "嗎", "什麼", "怎麼", "如何", "為什麼", "哪"];
const QUESTION_WORDS: &[&str] = &[
    "how", "what", "why", "when", "where", "which", "who", "can", "could", "should", "is", "are",
    "do", "does",
];

/// Upper bound on a list item, in characters.
const MAX_ITEM_CHARS: usize = 24;
const MAX_LIST_ITEMS: usize = 20;
/// A lone item is only trusted if it is this short and all Han characters.
const MAX_SINGLE_ITEM_CHARS: usize = 8;

static ADD_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)^(?:加入|加|\+|add\b)\s*[:：]?\s*(.*)$").expect("Invalid add regex")
});

/// Single-character prefixes (刪, 減) need a space or colon after them, so
/// "減脂雞胸" stays an ingredient.
static REMOVE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?is)^(?:(?:移除|刪除|用完|-|remove\b|delete\b)\s*[:：]?|[刪減](?:\s+|\s*[:：]))\s*(.*)$",
    )
    .expect("Invalid remove regex")
});

static STEPS_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:做法|步驟|view\s+steps|steps?)\s*#?\s*(\d+)$").expect("Invalid steps regex")
});

static PAGE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:page\s*(\d+)|第\s*(\d+)\s*頁)$").expect("Invalid page regex")
});

static URL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(https?://|www\.)").expect("Invalid URL regex"));

fn is_phrase(text: &str, phrases: &[&str]) -> bool {
    let lowered = text.to_lowercase();
    phrases.iter().any(|p| *p == lowered)
}

fn match_control(text: &str) -> Option<Intent> {
    if is_phrase(text, MENU_PHRASES) {
        Some(Intent::ShowMenu)
    } else if is_phrase(text, HELP_PHRASES) {
        Some(Intent::ShowHelp)
    } else if is_phrase(text, REMOVAL_MENU_PHRASES) {
        Some(Intent::RemoveIngredients(Vec::new()))
    } else if is_phrase(text, LIST_PHRASES) {
        Some(Intent::ListInventory)
    } else if is_phrase(text, CLEAR_PHRASES) {
        Some(Intent::ClearInventory)
    } else {
        None
    }
}

fn prefixed_items(regex: &Regex, text: &str) -> Option<Vec<String>> {
    regex
        .captures(text)
        .map(|c| c.get(1).map(|m| split_command_items(m.as_str())).unwrap_or_default())
}

fn match_edit(text: &str) -> Option<Intent> {
    if let Some(items) = prefixed_items(&ADD_REGEX, text) {
        return Some(Intent::AddIngredients(items));
    }
    prefixed_items(&REMOVE_REGEX, text).map(Intent::RemoveIngredients)
}

fn match_paging(text: &str) -> Option<Intent> {
    if is_phrase(text, NEXT_PHRASES) {
        return Some(Intent::PageSteps(PageDelta::Next));
    }
    if is_phrase(text, PREVIOUS_PHRASES) {
        return Some(Intent::PageSteps(PageDelta::Previous));
    }
    let caps = PAGE_REGEX.captures(text)?;
    let number = parse_number(caps.get(1).or_else(|| caps.get(2))?.as_str());
    Some(Intent::PageSteps(PageDelta::Absolute(number.saturating_sub(1))))
}

fn match_steps(text: &str) -> Option<Intent> {
    let digits = STEPS_REGEX.captures(text)?.get(1)?;
    Some(Intent::ShowRecipeSteps(parse_number(digits.as_str())))
}

/// All-digit text; too large for `usize` saturates and is clamped downstream.
fn parse_number(digits: &str) -> usize {
    digits.parse().unwrap_or(usize::MAX)
}

fn match_recommend(text: &str) -> Option<Intent> {
    if is_phrase(text, REGENERATE_PHRASES) {
        Some(Intent::RegenerateSameIngredients)
    } else if is_phrase(text, RECOMMEND_PHRASES) {
        Some(Intent::Recommend)
    } else {
        None
    }
}

fn looks_like_question(text: &str) -> bool {
    let lowered = text.to_lowercase();
    INTERROGATIVES.iter().any(|m| lowered.contains(m))
        || lowered
            .split_whitespace()
            .next()
            .is_some_and(|first| QUESTION_WORDS.contains(&first))
}

/// "This looks like a bare ingredient list."
fn match_bare_list(text: &str) -> Option<Intent> {
    if looks_like_question(text) || URL_REGEX.is_match(text) {
        return None;
    }

    let items = split_items(text);
    if items.iter().any(|i| is_filler(i)) {
        return None;
    }

    let accepted = match items.as_slice() {
        [] => false,
        [single] => {
            single.chars().count() <= MAX_SINGLE_ITEM_CHARS && single.chars().all(is_han)
        }
        many => {
            many.len() <= MAX_LIST_ITEMS
                && many.iter().all(|i| i.chars().count() <= MAX_ITEM_CHARS)
        }
    };

    accepted.then_some(Intent::FreeTextIngredients(items))
}

struct Rule {
    name: &'static str,
    matcher: fn(&str) -> Option<Intent>,
}

/// Evaluated in order; first match wins.
const RULES: &[Rule] = &[
    Rule {
        name: "control",
        matcher: match_control,
    },
    Rule {
        name: "edit",
        matcher: match_edit,
    },
    Rule {
        name: "paging",
        matcher: match_paging,
    },
    Rule {
        name: "steps",
        matcher: match_steps,
    },
    Rule {
        name: "recommend",
        matcher: match_recommend,
    },
    Rule {
        name: "bare_list",
        matcher: match_bare_list,
    },
];

#[derive(Debug, Clone, Copy, Default)]
pub struct IntentClassifier {
    fallback: FallbackPolicy,
}

impl IntentClassifier {
    pub fn new(fallback: FallbackPolicy) -> Self {
        Self { fallback }
    }

    pub fn classify(&self, text: &str) -> Intent {
        let text = text.trim();
        if text.is_empty() {
            return Intent::Unrecognized;
        }

        for rule in RULES {
            if let Some(intent) = (rule.matcher)(text) {
                tracing::debug!(rule = rule.name, ?intent, "Classified message");
                return intent;
            }
        }

        self.fallback.intent()
    }
}
