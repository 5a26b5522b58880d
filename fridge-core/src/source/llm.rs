//! Recipe source backed by a hosted text model.

use std::collections::HashSet;
use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use serde_json::Value;

use super::prompts::{
    render_recipe_prompt, render_retry_prompt, render_steps_prompt, RECIPE_PROMPT_NAME,
    RETRY_PROMPT_NAME, STEPS_PROMPT_NAME,
};
use super::{default_step_prompt, Produced, RecipeQuery, RecipeSource};
use crate::error::SourceError;
use crate::llm::{CompletionRequest, LlmProvider};
use crate::normalize::normalize;
use crate::types::{Recipe, StepPrompt};

const GENERATION_TEMPERATURE: f32 = 0.6;
const RETRY_TEMPERATURE: f32 = 0.7;
const STEPS_TEMPERATURE: f32 = 0.5;

/// Outermost braces of a reply that wrapped its JSON in prose or code fences.
static JSON_OBJECT_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\{.*\}").expect("Invalid JSON object regex"));

#[derive(Debug)]
pub struct LlmRecipeSource {
    provider: Box<dyn LlmProvider>,
}

impl LlmRecipeSource {
    pub fn new(provider: Box<dyn LlmProvider>) -> Self {
        Self { provider }
    }

    async fn complete_json(
        &self,
        prompt_name: &str,
        request: CompletionRequest,
    ) -> Result<Value, SourceError> {
        tracing::debug!(
            prompt = prompt_name,
            provider = self.provider.provider_name(),
            model = self.provider.model_name(),
            "Calling recipe model"
        );
        let text = self.provider.complete(&request).await?;
        parse_lenient_json(&text)
    }
}

#[async_trait]
impl RecipeSource for LlmRecipeSource {
    async fn produce(&self, query: &RecipeQuery) -> Result<Produced, SourceError> {
        let (prompt_name, request) = if query.attempt == 0 {
            (
                RECIPE_PROMPT_NAME,
                CompletionRequest::json(
                    render_recipe_prompt(
                        &query.user_input,
                        &query.known_ingredients,
                        &query.avoid_titles,
                        query.wanted,
                    ),
                    GENERATION_TEMPERATURE,
                ),
            )
        } else {
            (
                RETRY_PROMPT_NAME,
                CompletionRequest::json(
                    render_retry_prompt(
                        &query.known_ingredients,
                        &query.avoid_titles,
                        query.wanted,
                    ),
                    RETRY_TEMPERATURE,
                ),
            )
        };

        let value = self.complete_json(prompt_name, request).await?;
        Ok(produced_from_value(&value))
    }

    async fn describe_steps(&self, recipe: &Recipe) -> Result<Vec<StepPrompt>, SourceError> {
        let request = CompletionRequest::json(
            render_steps_prompt(&recipe.name, &recipe.steps),
            STEPS_TEMPERATURE,
        );
        let value = self.complete_json(STEPS_PROMPT_NAME, request).await?;
        step_prompts_from_value(&value, &recipe.name)
    }

    fn source_name(&self) -> &'static str {
        "llm"
    }
}

/// Parse the whole reply as JSON, falling back to its outermost `{...}`.
pub(crate) fn parse_lenient_json(text: &str) -> Result<Value, SourceError> {
    if let Ok(value) = serde_json::from_str::<Value>(text.trim()) {
        return Ok(value);
    }

    JSON_OBJECT_REGEX
        .find(text)
        .and_then(|m| serde_json::from_str::<Value>(m.as_str()).ok())
        .ok_or_else(|| {
            SourceError::Malformed(format!(
                "No JSON object in model reply (first 100 chars): {}",
                text.chars().take(100).collect::<String>()
            ))
        })
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn non_empty_str(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Steps may come back as plain strings or as `{"text": ...}` objects.
fn step_texts(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| match item {
                    Value::String(s) => Some(s.trim().to_string()),
                    Value::Object(_) => non_empty_str(item.get("text")),
                    _ => None,
                })
                .filter(|s| !s.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

fn recipe_from_value(value: &Value) -> Option<Recipe> {
    let name = non_empty_str(value.get("name"))?;
    let mut recipe = Recipe::new(name);
    recipe.summary = non_empty_str(value.get("summary")).unwrap_or_default();
    recipe.ingredients = string_list(value.get("ingredients"));
    recipe.steps = step_texts(value.get("steps"));
    recipe.image_prompt = non_empty_str(value.get("image_prompt"));
    Some(recipe)
}

/// Pull ingredients and recipes out of a model reply, skipping anything unusable.
fn produced_from_value(value: &Value) -> Produced {
    let mut seen = HashSet::new();
    let identified_ingredients = string_list(value.get("ingredients"))
        .into_iter()
        .filter(|i| {
            let token = normalize(i);
            !token.is_empty() && seen.insert(token)
        })
        .collect();

    let recipes = value
        .get("recipes")
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(recipe_from_value).collect())
        .unwrap_or_default();

    Produced {
        identified_ingredients,
        recipes,
    }
}

fn step_prompts_from_value(value: &Value, recipe_name: &str) -> Result<Vec<StepPrompt>, SourceError> {
    let steps = value
        .get("steps")
        .and_then(Value::as_array)
        .ok_or_else(|| SourceError::Malformed("Model reply has no steps array".to_string()))?;

    Ok(steps
        .iter()
        .filter_map(|item| {
            let (text, image_prompt) = match item {
                Value::String(s) => (Some(s.trim().to_string()), None),
                Value::Object(_) => (
                    non_empty_str(item.get("text")),
                    non_empty_str(item.get("image_prompt")),
                ),
                _ => (None, None),
            };
            let text = text.filter(|t| !t.is_empty())?;
            Some(StepPrompt {
                text,
                image_prompt: image_prompt.unwrap_or_else(|| default_step_prompt(recipe_name)),
            })
        })
        .collect())
}
