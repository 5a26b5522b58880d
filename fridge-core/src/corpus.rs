//! Static recipe corpus for the corpus-backed recommendation path.
//!
//! The bundled corpus lives in `data/recipes.json` and is embedded at compile
//! time. Other corpora with the same shape can be loaded from disk.

use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::CorpusError;
use crate::normalize::{normalize_with, AliasTable, NormalizeMode, NormalizedToken};
use crate::types::Recipe;

const BUNDLED_CORPUS: &str = include_str!("../data/recipes.json");

/// The raw JSON structure of a corpus file.
#[derive(Deserialize)]
struct CorpusFile {
    #[serde(default)]
    aliases: HashMap<String, Vec<String>>,
    recipes: Vec<Recipe>,
}

/// A corpus recipe with its precomputed ingredient tokens.
#[derive(Debug, Clone)]
pub struct CorpusRecord {
    pub recipe: Recipe,
    pub tokens: BTreeSet<NormalizedToken>,
}

impl CorpusRecord {
    pub fn new(recipe: Recipe) -> Self {
        let tokens = recipe
            .ingredients
            .iter()
            .map(|i| normalize_with(i, NormalizeMode::Corpus))
            .filter(|t| !t.is_empty())
            .collect();
        Self { recipe, tokens }
    }

    pub fn name(&self) -> &str {
        &self.recipe.name
    }
}

/// Read-only collection of recipes plus the alias table that goes with them.
#[derive(Debug, Clone, Default)]
pub struct RecipeCorpus {
    records: Vec<CorpusRecord>,
    aliases: AliasTable,
}

impl RecipeCorpus {
    pub fn new(recipes: Vec<Recipe>, aliases: AliasTable) -> Self {
        Self {
            records: recipes.into_iter().map(CorpusRecord::new).collect(),
            aliases,
        }
    }

    /// The corpus shipped with the crate.
    pub fn bundled() -> Result<Self, CorpusError> {
        Self::from_json(BUNDLED_CORPUS)
    }

    pub fn from_path(path: &Path) -> Result<Self, CorpusError> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn from_json(json: &str) -> Result<Self, CorpusError> {
        let file: CorpusFile = serde_json::from_str(json)?;

        // Sort alias keys so construction is deterministic.
        let mut alias_entries: Vec<_> = file.aliases.into_iter().collect();
        alias_entries.sort_by(|a, b| a.0.cmp(&b.0));

        let mut aliases = AliasTable::new();
        for (specific, general) in &alias_entries {
            aliases.insert(specific, general);
        }

        let recipes = file
            .recipes
            .into_iter()
            .filter(|r| !r.name.trim().is_empty())
            .collect();

        Ok(Self::new(recipes, aliases))
    }

    pub fn records(&self) -> &[CorpusRecord] {
        &self.records
    }

    pub fn get(&self, index: usize) -> Option<&CorpusRecord> {
        self.records.get(index)
    }

    pub fn aliases(&self) -> &AliasTable {
        &self.aliases
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_bundled_corpus_loads() {
        let corpus = RecipeCorpus::bundled().unwrap();
        assert!(corpus.len() >= 10);
        assert!(!corpus.aliases().is_empty());
        assert!(corpus.records().iter().all(|r| !r.tokens.is_empty()));
    }

    #[test]
    fn test_record_tokens_strip_quantities() {
        let mut recipe = Recipe::new("Omelette");
        recipe.ingredients = vec!["3 eggs".to_string(), "1 tbsp butter".to_string()];
        let record = CorpusRecord::new(recipe);

        let tokens: Vec<&str> = record.tokens.iter().map(|t| t.as_str()).collect();
        assert_eq!(tokens, vec!["butter", "eggs"]);
    }

    #[test]
    fn test_from_path() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"aliases": {{"pork belly": ["pork"]}},
                "recipes": [{{"name": "Braised Pork", "ingredients": ["pork", "soy sauce"]}},
                            {{"name": "  ", "ingredients": ["ghost"]}}]}}"#
        )
        .unwrap();

        let corpus = RecipeCorpus::from_path(file.path()).unwrap();
        assert_eq!(corpus.len(), 1);
        assert_eq!(corpus.get(0).unwrap().name(), "Braised Pork");
        assert_eq!(corpus.aliases().len(), 1);
    }

    #[test]
    fn test_invalid_json_is_error() {
        assert!(matches!(
            RecipeCorpus::from_json("{not json"),
            Err(CorpusError::InvalidJson(_))
        ));
    }
}
