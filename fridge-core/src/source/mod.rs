//! Collaborator contracts: who produces recipes and who produces images.
//!
//! The core never talks to the network directly. It asks a [`RecipeSource`]
//! for candidate recipes (local corpus or hosted model) and an
//! [`ImageSource`] for illustrations, treating each call as atomic.

mod corpus;
mod llm;
pub mod prompts;

pub use corpus::CorpusRecipeSource;
pub use llm::LlmRecipeSource;

use async_trait::async_trait;
use std::fmt;

use crate::error::SourceError;
use crate::types::{Recipe, StepPrompt};

/// One request for recipes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecipeQuery {
    pub user_input: String,
    /// Ingredients already known for this user, in their own wording
    pub known_ingredients: Vec<String>,
    /// Titles the producer must not return
    pub avoid_titles: Vec<String>,
    /// How many recipes are wanted in total
    pub wanted: usize,
    /// 0 for the first call of a round, 1.. for repair retries
    pub attempt: usize,
}

/// What a recipe source returned for one query.
///
/// May hold fewer recipes than wanted, or duplicates; the orchestrator copes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Produced {
    pub identified_ingredients: Vec<String>,
    pub recipes: Vec<Recipe>,
}

#[async_trait]
pub trait RecipeSource: Send + Sync + fmt::Debug {
    async fn produce(&self, query: &RecipeQuery) -> Result<Produced, SourceError>;

    /// Step texts paired with illustration prompts, one per step.
    async fn describe_steps(&self, recipe: &Recipe) -> Result<Vec<StepPrompt>, SourceError> {
        Ok(default_step_prompts(recipe))
    }

    fn source_name(&self) -> &'static str;
}

#[async_trait]
pub trait ImageSource: Send + Sync + fmt::Debug {
    /// Produce an image for the prompt. `Ok(None)` means "no image", which is
    /// a normal outcome rather than an error.
    async fn illustrate(&self, prompt: &str) -> Result<Option<String>, SourceError>;
}

/// Image source that never produces images.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoImages;

#[async_trait]
impl ImageSource for NoImages {
    async fn illustrate(&self, _prompt: &str) -> Result<Option<String>, SourceError> {
        Ok(None)
    }
}

pub fn default_dish_prompt(recipe_name: &str) -> String {
    format!(
        "A high-quality photorealistic food photo of {}, plated nicely, natural lighting, shallow depth of field, no text",
        recipe_name
    )
}

pub fn default_step_prompt(recipe_name: &str) -> String {
    format!(
        "Photorealistic instructional cooking image showing a step in action for {}, hands, utensils, ingredients, kitchen, natural lighting, no text",
        recipe_name
    )
}

/// The recipe's own steps, each with the generic instructional prompt.
pub fn default_step_prompts(recipe: &Recipe) -> Vec<StepPrompt> {
    recipe
        .steps
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| StepPrompt {
            text: s.to_string(),
            image_prompt: default_step_prompt(&recipe.name),
        })
        .collect()
}
