//! Recipe source that ranks the local corpus instead of calling a model.

use std::collections::{BTreeSet, HashSet};

use async_trait::async_trait;

use super::{Produced, RecipeQuery, RecipeSource};
use crate::error::SourceError;
use crate::extract::heuristic_ingredients;
use crate::index::{RecommendOptions, RecommendationIndex};
use crate::normalize::{normalize, normalize_with, NormalizeMode, NormalizedToken};

/// Each repair attempt tolerates this many more missing ingredients.
const MISSING_WIDENING_PER_ATTEMPT: usize = 2;

#[derive(Debug)]
pub struct CorpusRecipeSource {
    index: RecommendationIndex,
    options: RecommendOptions,
}

impl CorpusRecipeSource {
    pub fn new(index: RecommendationIndex) -> Self {
        Self::with_options(index, RecommendOptions::default())
    }

    pub fn with_options(index: RecommendationIndex, options: RecommendOptions) -> Self {
        Self { index, options }
    }

    pub fn index(&self) -> &RecommendationIndex {
        &self.index
    }

    /// Parts of the message that the corpus recognizes as ingredients.
    fn identify(&self, user_input: &str) -> Vec<String> {
        let mut seen = HashSet::new();
        heuristic_ingredients(user_input)
            .into_iter()
            .filter(|part| {
                let token = normalize_with(part, NormalizeMode::Corpus);
                !token.is_empty() && self.index.knows(&token) && seen.insert(token)
            })
            .collect()
    }
}

#[async_trait]
impl RecipeSource for CorpusRecipeSource {
    async fn produce(&self, query: &RecipeQuery) -> Result<Produced, SourceError> {
        let identified_ingredients = self.identify(&query.user_input);

        let tokens: BTreeSet<NormalizedToken> = query
            .known_ingredients
            .iter()
            .chain(identified_ingredients.iter())
            .map(|i| normalize_with(i, NormalizeMode::Corpus))
            .filter(|t| !t.is_empty())
            .collect();

        let avoid: HashSet<NormalizedToken> =
            query.avoid_titles.iter().map(|t| normalize(t)).collect();

        let options = RecommendOptions {
            top_k: query.wanted + avoid.len(),
            max_missing: self.options.max_missing + MISSING_WIDENING_PER_ATTEMPT * query.attempt,
            ..self.options
        };

        let recipes: Vec<_> = self
            .index
            .recommend(&tokens, options)
            .into_iter()
            .map(|r| r.record.recipe.clone())
            .filter(|r| !avoid.contains(&r.title_token()))
            .take(query.wanted)
            .collect();

        tracing::debug!(
            attempt = query.attempt,
            tokens = tokens.len(),
            found = recipes.len(),
            "Ranked corpus recipes"
        );

        Ok(Produced {
            identified_ingredients,
            recipes,
        })
    }

    fn source_name(&self) -> &'static str {
        "corpus"
    }
}
