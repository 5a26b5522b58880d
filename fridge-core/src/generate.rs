//! "Exactly N distinct recipes" generation protocol.
//!
//! The retry policy lives in [`Accumulator::fold`], a pure reducer over
//! collaborator results, so it can be exercised without any collaborator.
//! [`Orchestrator`] only sequences the calls and commits the round.

use std::collections::HashSet;

use crate::error::CoreError;
use crate::normalize::{normalize, NormalizedToken};
use crate::session::UserSession;
use crate::source::{Produced, RecipeQuery, RecipeSource};
use crate::types::{GenerationRound, Recipe};

pub const DEFAULT_RECIPES_PER_ROUND: usize = 3;
pub const DEFAULT_GENERATION_RETRIES: usize = 2;

/// Distinct recipes and identified ingredients gathered across attempts.
#[derive(Debug, Clone)]
pub struct Accumulator {
    wanted: usize,
    avoid: HashSet<NormalizedToken>,
    seen_titles: HashSet<NormalizedToken>,
    recipes: Vec<Recipe>,
    seen_ingredients: HashSet<NormalizedToken>,
    identified: Vec<String>,
    attempts: usize,
}

impl Accumulator {
    pub fn new<S: AsRef<str>>(wanted: usize, avoid_titles: &[S]) -> Self {
        Self {
            wanted,
            avoid: avoid_titles.iter().map(|t| normalize(t.as_ref())).collect(),
            seen_titles: HashSet::new(),
            recipes: Vec::new(),
            seen_ingredients: HashSet::new(),
            identified: Vec::new(),
            attempts: 0,
        }
    }

    /// Take one attempt's output into account.
    ///
    /// Recipes with an empty, avoided or already-collected title are dropped.
    /// Collection stops at `wanted`.
    pub fn fold(mut self, produced: Produced) -> Self {
        self.attempts += 1;

        for ingredient in produced.identified_ingredients {
            let token = normalize(&ingredient);
            if !token.is_empty() && self.seen_ingredients.insert(token) {
                self.identified.push(ingredient);
            }
        }

        for recipe in produced.recipes {
            if self.is_complete() {
                break;
            }
            let token = recipe.title_token();
            if token.is_empty() || self.avoid.contains(&token) {
                continue;
            }
            if self.seen_titles.insert(token) {
                self.recipes.push(recipe);
            }
        }

        self
    }

    pub fn is_complete(&self) -> bool {
        self.recipes.len() >= self.wanted
    }

    pub fn attempts(&self) -> usize {
        self.attempts
    }

    pub fn recipes(&self) -> &[Recipe] {
        &self.recipes
    }

    pub fn titles(&self) -> Vec<String> {
        self.recipes.iter().map(|r| r.name.clone()).collect()
    }

    /// Every ingredient identified so far, first spelling kept.
    pub fn identified(&self) -> &[String] {
        &self.identified
    }

    /// Exactly `wanted` recipes, or a shortfall.
    pub fn finish(mut self) -> Result<Vec<Recipe>, CoreError> {
        if !self.is_complete() {
            return Err(CoreError::GenerationShortfall {
                wanted: self.wanted,
                got: self.recipes.len(),
            });
        }
        self.recipes.truncate(self.wanted);
        Ok(self.recipes)
    }
}

/// Input for one generation round.
#[derive(Debug, Clone, Default)]
pub struct GenerationRequest {
    pub user_input: String,
    pub known_ingredients: Vec<String>,
    pub avoid_titles: Vec<String>,
    /// Stored in the inventory when the collaborator identifies nothing
    pub fallback_ingredients: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Orchestrator {
    wanted: usize,
    retries: usize,
}

impl Default for Orchestrator {
    fn default() -> Self {
        Self::new(DEFAULT_RECIPES_PER_ROUND, DEFAULT_GENERATION_RETRIES)
    }
}

/// Union by normalized token, first spelling wins.
fn merge_unique(base: &[String], extra: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    base.iter()
        .chain(extra.iter())
        .filter(|i| {
            let token = normalize(i);
            !token.is_empty() && seen.insert(token)
        })
        .cloned()
        .collect()
}

impl Orchestrator {
    pub fn new(wanted: usize, retries: usize) -> Self {
        Self { wanted, retries }
    }

    pub fn wanted(&self) -> usize {
        self.wanted
    }

    /// Produce a round of exactly `wanted` distinct recipes and commit it.
    ///
    /// Identified ingredients are added to the inventory as soon as each
    /// attempt returns, so they stay remembered even when the round fails.
    /// On failure the previous round and step view are left untouched.
    pub async fn generate(
        &self,
        source: &dyn RecipeSource,
        session: &mut UserSession,
        request: GenerationRequest,
    ) -> Result<(), CoreError> {
        let first = RecipeQuery {
            user_input: request.user_input.clone(),
            known_ingredients: request.known_ingredients.clone(),
            avoid_titles: request.avoid_titles.clone(),
            wanted: self.wanted,
            attempt: 0,
        };

        let produced = match source.produce(&first).await {
            Ok(produced) => produced,
            Err(err) => {
                session.inventory.add(&request.fallback_ingredients);
                return Err(err.into());
            }
        };

        if produced.identified_ingredients.is_empty() {
            session.inventory.add(&request.fallback_ingredients);
        } else {
            session.inventory.add(&produced.identified_ingredients);
        }

        let mut acc = Accumulator::new(self.wanted, &request.avoid_titles).fold(produced);
        tracing::debug!(
            source = source.source_name(),
            collected = acc.recipes().len(),
            wanted = self.wanted,
            "First generation attempt"
        );

        for attempt in 1..=self.retries {
            if acc.is_complete() {
                break;
            }

            let query = RecipeQuery {
                user_input: request.user_input.clone(),
                known_ingredients: merge_unique(&request.known_ingredients, acc.identified()),
                avoid_titles: merge_unique(&request.avoid_titles, &acc.titles()),
                wanted: self.wanted,
                attempt,
            };
            let produced = source.produce(&query).await?;
            session.inventory.add(&produced.identified_ingredients);

            acc = acc.fold(produced);
            tracing::debug!(
                attempt,
                collected = acc.recipes().len(),
                wanted = self.wanted,
                "Generation retry"
            );
        }

        let ingredients = merge_unique(&request.known_ingredients, acc.identified());
        let attempts = acc.attempts();
        let recipes = acc.finish()?;

        tracing::info!(
            recipes = recipes.len(),
            attempts,
            ingredients = ingredients.len(),
            "Replacing generation round"
        );
        session.replace_round(GenerationRound::new(recipes, ingredients));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SourceError;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    fn produced(titles: &[&str]) -> Produced {
        Produced {
            identified_ingredients: Vec::new(),
            recipes: titles.iter().map(|t| Recipe::new(*t)).collect(),
        }
    }

    fn names(recipes: &[Recipe]) -> Vec<&str> {
        recipes.iter().map(|r| r.name.as_str()).collect()
    }

    /// Replays scripted results and records the queries it saw.
    #[derive(Debug, Default)]
    struct ScriptedSource {
        replies: Mutex<VecDeque<Result<Produced, SourceError>>>,
        queries: Mutex<Vec<RecipeQuery>>,
    }

    impl ScriptedSource {
        fn new(replies: Vec<Result<Produced, SourceError>>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                queries: Mutex::new(Vec::new()),
            }
        }

        fn queries(&self) -> Vec<RecipeQuery> {
            self.queries.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl RecipeSource for ScriptedSource {
        async fn produce(&self, query: &RecipeQuery) -> Result<Produced, SourceError> {
            self.queries.lock().unwrap().push(query.clone());
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(Produced::default()))
        }

        fn source_name(&self) -> &'static str {
            "scripted"
        }
    }

    fn request(avoid: &[&str]) -> GenerationRequest {
        GenerationRequest {
            user_input: "tomato, rice".to_string(),
            known_ingredients: vec!["tomato".to_string()],
            avoid_titles: avoid.iter().map(|s| s.to_string()).collect(),
            fallback_ingredients: Vec::new(),
        }
    }

    #[test]
    fn test_fold_dedups_and_skips_avoided() {
        let acc = Accumulator::new(3, &["Tomato Soup"])
            .fold(produced(&["Tomato Soup", "Veg Stew", "veg  stew", ""]))
            .fold(produced(&["Veg Stew", "Herb Rice"]));

        assert_eq!(names(acc.recipes()), vec!["Veg Stew", "Herb Rice"]);
        assert_eq!(acc.attempts(), 2);
        assert!(!acc.is_complete());
        assert!(matches!(
            acc.finish(),
            Err(CoreError::GenerationShortfall { wanted: 3, got: 2 })
        ));
    }

    #[test]
    fn test_fold_stops_at_wanted() {
        let acc = Accumulator::new(2, &[] as &[&str]).fold(produced(&["A", "B", "C"]));
        assert!(acc.is_complete());
        assert_eq!(names(&acc.finish().unwrap()), vec!["A", "B"]);
    }

    #[test]
    fn test_fold_collects_identified_ingredients_once() {
        let acc = Accumulator::new(1, &[] as &[&str]).fold(Produced {
            identified_ingredients: vec!["Onion".into(), "onion".into(), " ".into(), "egg".into()],
            recipes: Vec::new(),
        });
        assert_eq!(acc.identified(), ["Onion", "egg"]);
    }

    #[tokio::test]
    async fn test_retry_with_avoid_list_reaches_three() {
        let source = ScriptedSource::new(vec![
            Ok(produced(&["Tomato Soup", "Veg Stew"])),
            Ok(produced(&["Veg Stew", "Herb Rice"])),
            Ok(produced(&["Garlic Noodles"])),
        ]);
        let mut session = UserSession::default();

        Orchestrator::new(3, 2)
            .generate(&source, &mut session, request(&["Tomato Soup"]))
            .await
            .unwrap();

        let round = session.round.as_ref().unwrap();
        assert_eq!(names(&round.recipes), vec!["Veg Stew", "Herb Rice", "Garlic Noodles"]);
        assert_eq!(round.titles, vec!["Veg Stew", "Herb Rice", "Garlic Noodles"]);

        let queries = source.queries();
        assert_eq!(queries.len(), 3);
        assert_eq!(queries[1].attempt, 1);
        assert_eq!(queries[1].avoid_titles, vec!["Tomato Soup", "Veg Stew"]);
        assert_eq!(
            queries[2].avoid_titles,
            vec!["Tomato Soup", "Veg Stew", "Herb Rice"]
        );
    }

    #[tokio::test]
    async fn test_shortfall_keeps_previous_round() {
        let source = ScriptedSource::new(vec![
            Ok(produced(&["Tomato Soup", "Veg Stew"])),
            Ok(produced(&["Veg Stew", "Herb Rice"])),
            Ok(produced(&["Herb Rice"])),
        ]);
        let mut session = UserSession::default();
        session.replace_round(GenerationRound::new(vec![Recipe::new("Old")], Vec::new()));

        let result = Orchestrator::new(3, 2)
            .generate(&source, &mut session, request(&["Tomato Soup"]))
            .await;

        assert!(matches!(
            result,
            Err(CoreError::GenerationShortfall { wanted: 3, got: 2 })
        ));
        assert_eq!(source.queries().len(), 3);
        assert_eq!(session.round.unwrap().titles, vec!["Old"]);
    }

    #[tokio::test]
    async fn test_no_retry_when_first_attempt_suffices() {
        let source = ScriptedSource::new(vec![Ok(produced(&["A", "B", "C", "D"]))]);
        let mut session = UserSession::default();

        Orchestrator::new(3, 2)
            .generate(&source, &mut session, request(&[]))
            .await
            .unwrap();

        assert_eq!(source.queries().len(), 1);
        assert_eq!(session.round.unwrap().recipes.len(), 3);
    }

    #[tokio::test]
    async fn test_identified_ingredients_survive_collaborator_failure() {
        let source = ScriptedSource::new(vec![
            Ok(Produced {
                identified_ingredients: vec!["marbled beef short-rib".into()],
                recipes: vec![Recipe::new("Beef Bowl")],
            }),
            Err(SourceError::Unavailable("quota".into())),
        ]);
        let mut session = UserSession::default();

        let result = Orchestrator::new(3, 2)
            .generate(&source, &mut session, request(&[]))
            .await;

        assert!(matches!(result, Err(CoreError::CollaboratorUnavailable(_))));
        assert_eq!(session.inventory.list(), vec!["marbled beef short-rib"]);
        assert!(session.round.is_none());
    }

    #[tokio::test]
    async fn test_fallback_ingredients_used_when_none_identified() {
        let source = ScriptedSource::new(vec![Ok(produced(&["A", "B", "C"]))]);
        let mut session = UserSession::default();
        let mut req = request(&[]);
        req.fallback_ingredients = vec!["tofu".into(), "leek".into()];

        Orchestrator::new(3, 2)
            .generate(&source, &mut session, req)
            .await
            .unwrap();

        assert_eq!(session.inventory.list(), vec!["tofu", "leek"]);
    }

    #[tokio::test]
    async fn test_success_invalidates_step_view() {
        let source = ScriptedSource::new(vec![Ok(produced(&["A", "B", "C"]))]);
        let mut session = UserSession::default();
        session.step_view = Some(crate::types::StepView {
            recipe_index: 0,
            recipe_name: "Old".into(),
            steps: vec!["x".into()],
            images: vec![None],
            page: 0,
        });

        Orchestrator::default()
            .generate(&source, &mut session, request(&[]))
            .await
            .unwrap();

        assert!(session.step_view.is_none());
    }
}
