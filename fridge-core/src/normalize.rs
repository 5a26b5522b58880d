//! Ingredient normalization.
//!
//! Turns free-form ingredient text ("Chicken Thigh", "2 cups flour", "雞蛋 2顆")
//! into a canonical token used for equality and containment checks.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Canonical, whitespace-free, case-folded form of an ingredient string.
///
/// Two ingredient strings name the same ingredient iff their tokens are equal.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NormalizedToken(String);

impl NormalizedToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// True when either token contains the other as a substring.
    pub fn overlaps(&self, other: &NormalizedToken) -> bool {
        self.0.contains(other.as_str()) || other.0.contains(self.as_str())
    }
}

impl fmt::Display for NormalizedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for NormalizedToken {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// How aggressively to normalize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NormalizeMode {
    /// Whitespace removal and case folding only. Used by the fridge inventory,
    /// which keeps cut and variety qualifiers significant.
    #[default]
    Plain,
    /// Also strips quantities, units and approximation words. Used by the
    /// corpus-backed recommendation path.
    Corpus,
}

/// Word-level units, matched against whole lowercase words.
const UNITS: &[&str] = &[
    // Volume
    "tablespoons",
    "tablespoon",
    "teaspoons",
    "teaspoon",
    "cups",
    "cup",
    "tbsp",
    "tbs",
    "tsp",
    "milliliters",
    "milliliter",
    "liters",
    "liter",
    "ml",
    // Weight
    "ounces",
    "ounce",
    "pounds",
    "pound",
    "lbs",
    "lb",
    "oz",
    "kilograms",
    "kilogram",
    "grams",
    "gram",
    "kg",
    "g",
    // Counters
    "packages",
    "package",
    "handfuls",
    "handful",
    "bunches",
    "bunch",
    "pinches",
    "pinch",
    "slices",
    "slice",
    "cloves",
    "clove",
    "pieces",
    "piece",
    "cans",
    "can",
    "pcs",
    "pc",
];

const APPROXIMATION_WORDS: &[&str] = &[
    "approximately",
    "approx",
    "about",
    "around",
    "roughly",
    "some",
    "few",
];

/// Quantity followed by a counter or weight unit in CJK text, e.g. "2顆", "300 克", "半斤".
static CJK_QUANTITY_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"([0-9０-９.]+|[一二兩三四五六七八九十百半幾]+)\s*(公克|公斤|毫升|大匙|小匙|茶匙|克|斤|兩|顆|個|根|片|把|塊|條|包|盒|罐|瓣|隻|尾|支|杯|匙|粒|朵|份)",
    )
    .expect("Invalid CJK quantity regex")
});

/// Standalone approximation words in CJK text.
static CJK_APPROXIMATION_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(適量|少許|些許|少量|大約|約)").expect("Invalid CJK approximation regex")
});

/// Normalize with [`NormalizeMode::Plain`].
///
/// Empty or whitespace-only input yields the empty token.
pub fn normalize(text: &str) -> NormalizedToken {
    normalize_with(text, NormalizeMode::Plain)
}

/// Normalize an ingredient string.
pub fn normalize_with(text: &str, mode: NormalizeMode) -> NormalizedToken {
    let stripped = match mode {
        NormalizeMode::Plain => text.to_string(),
        NormalizeMode::Corpus => strip_quantities(text),
    };

    let folded: String = stripped
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect();

    NormalizedToken(folded)
}

/// Remove amounts, units and approximation words, keeping the ingredient name.
fn strip_quantities(text: &str) -> String {
    let kept: Vec<&str> = text
        .split_whitespace()
        .filter(|word| !is_quantity_word(word))
        .collect();
    let joined = kept.join(" ");

    let joined = CJK_QUANTITY_REGEX.replace_all(&joined, "");
    CJK_APPROXIMATION_REGEX.replace_all(&joined, "").into_owned()
}

fn is_quantity_word(word: &str) -> bool {
    let lower = word.to_lowercase();
    let lower = lower.trim_end_matches(['.', ',']);

    if lower.is_empty() {
        return true;
    }

    // "2", "1/2", "2.5", "300g"
    let numeric_prefix = lower
        .trim_start_matches(|c: char| c.is_ascii_digit() || c == '/' || c == '.')
        .to_string();
    if numeric_prefix.len() < lower.len() {
        return numeric_prefix.is_empty() || is_unit(&numeric_prefix);
    }

    is_unit(lower) || APPROXIMATION_WORDS.iter().any(|w| *w == lower)
}

fn is_unit(word: &str) -> bool {
    UNITS.iter().any(|unit| *unit == word)
}

/// Declared "specific implies general" ingredient aliases.
///
/// An entry `pork belly -> [pork]` means a user holding pork belly also
/// satisfies a recipe that asks for pork. Never the reverse.
#[derive(Debug, Clone, Default)]
pub struct AliasTable {
    implies: HashMap<NormalizedToken, Vec<NormalizedToken>>,
}

impl AliasTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `specific` as implying each of `general`.
    pub fn insert(&mut self, specific: &str, general: &[String]) {
        let key = normalize_with(specific, NormalizeMode::Corpus);
        if key.is_empty() {
            return;
        }
        let targets = self.implies.entry(key).or_default();
        for g in general {
            let token = normalize_with(g, NormalizeMode::Corpus);
            if !token.is_empty() && !targets.contains(&token) {
                targets.push(token);
            }
        }
    }

    pub fn is_alias(&self, token: &NormalizedToken) -> bool {
        self.implies.contains_key(token)
    }

    /// Add every general token implied by a specific token already present.
    pub fn expand(&self, tokens: &BTreeSet<NormalizedToken>) -> BTreeSet<NormalizedToken> {
        let mut expanded = tokens.clone();
        for token in tokens {
            if let Some(general) = self.implies.get(token) {
                expanded.extend(general.iter().cloned());
            }
        }
        expanded
    }

    pub fn len(&self) -> usize {
        self.implies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.implies.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(items: &[&str]) -> BTreeSet<NormalizedToken> {
        items.iter().map(|s| normalize(s)).collect()
    }

    #[test]
    fn test_plain_strips_whitespace_and_case() {
        assert_eq!(normalize("  Chicken  Thigh ").as_str(), "chickenthigh");
        assert_eq!(normalize("霜降 牛小排").as_str(), "霜降牛小排");
    }

    #[test]
    fn test_blank_input_is_empty_token() {
        assert!(normalize("").is_empty());
        assert!(normalize(" \t\n ").is_empty());
    }

    #[test]
    fn test_plain_keeps_quantities() {
        assert_eq!(normalize("2 cups flour").as_str(), "2cupsflour");
    }

    #[test]
    fn test_corpus_strips_units_and_amounts() {
        assert_eq!(normalize_with("2 cups flour", NormalizeMode::Corpus).as_str(), "flour");
        assert_eq!(normalize_with("300g beef", NormalizeMode::Corpus).as_str(), "beef");
        assert_eq!(normalize_with("1/2 tsp salt", NormalizeMode::Corpus).as_str(), "salt");
        assert_eq!(
            normalize_with("about 3 cloves garlic", NormalizeMode::Corpus).as_str(),
            "garlic"
        );
    }

    #[test]
    fn test_corpus_keeps_words_that_contain_units() {
        // "egg" contains "g", "can" is a unit word but "candy" is not
        assert_eq!(normalize_with("Eggs", NormalizeMode::Corpus).as_str(), "eggs");
        assert_eq!(normalize_with("candied ginger", NormalizeMode::Corpus).as_str(), "candiedginger");
    }

    #[test]
    fn test_corpus_strips_cjk_quantities() {
        assert_eq!(normalize_with("雞蛋 2顆", NormalizeMode::Corpus).as_str(), "雞蛋");
        assert_eq!(normalize_with("牛肉300克", NormalizeMode::Corpus).as_str(), "牛肉");
        assert_eq!(normalize_with("鹽 適量", NormalizeMode::Corpus).as_str(), "鹽");
    }

    #[test]
    fn test_overlaps_both_directions() {
        let beef = normalize("beef");
        let short_rib = normalize("marbled beef short-rib");
        assert!(beef.overlaps(&short_rib));
        assert!(short_rib.overlaps(&beef));
        assert!(!beef.overlaps(&normalize("pork")));
    }

    #[test]
    fn test_alias_expands_specific_to_general_only() {
        let mut aliases = AliasTable::new();
        aliases.insert("pork belly", &["pork".to_string()]);

        let expanded = aliases.expand(&tokens(&["pork belly", "onion"]));
        assert!(expanded.contains(&normalize("pork")));
        assert_eq!(expanded.len(), 3);

        let not_expanded = aliases.expand(&tokens(&["pork"]));
        assert!(!not_expanded.contains(&normalize("pork belly")));
    }
}
