use serde::{Deserialize, Serialize};

use crate::normalize::{normalize, NormalizedToken};

/// A recipe as shown to the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    pub name: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub ingredients: Vec<String>,
    #[serde(default)]
    pub steps: Vec<String>,
    /// Prompt for the dish photo, if the producer supplied one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_prompt: Option<String>,
    /// Image reference filled in by the image collaborator
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl Recipe {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            summary: String::new(),
            ingredients: Vec::new(),
            steps: Vec::new(),
            image_prompt: None,
            image: None,
        }
    }

    /// Token used to tell recipes apart by title.
    pub fn title_token(&self) -> NormalizedToken {
        normalize(&self.name)
    }
}

/// The last set of recipes shown to a user.
///
/// Replaced wholesale on every successful generation, never edited in place.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerationRound {
    pub recipes: Vec<Recipe>,
    /// Ingredients (display strings) the round was produced from
    pub ingredients: Vec<String>,
    /// Recipe names, used as the avoid-list for the next regeneration
    pub titles: Vec<String>,
}

impl GenerationRound {
    pub fn new(recipes: Vec<Recipe>, ingredients: Vec<String>) -> Self {
        let titles = recipes.iter().map(|r| r.name.clone()).collect();
        Self {
            recipes,
            ingredients,
            titles,
        }
    }
}

/// Per-user browsing state over one recipe's illustrated steps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepView {
    /// Zero-based index into the current round's recipes
    pub recipe_index: usize,
    pub recipe_name: String,
    pub steps: Vec<String>,
    /// One entry per step; `None` when no image could be produced
    pub images: Vec<Option<String>>,
    pub page: usize,
}

impl StepView {
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// One step with its (optional) illustration prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepPrompt {
    pub text: String,
    #[serde(default)]
    pub image_prompt: String,
}
