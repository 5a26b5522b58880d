//! Display artifacts handed to the delivery side.

use std::fmt;

use serde::Serialize;

use crate::config::PlatformLimits;
use crate::error::CoreError;
use crate::types::Recipe;

/// Ingredients listed on a recipe card before the rest is elided.
pub const MAX_CARD_INGREDIENTS: usize = 12;

/// Quick-action labels longer than this are cut.
pub const MAX_LABEL_CHARS: usize = 20;

/// A tappable shortcut. `text` is sent back as if the user typed it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuickAction {
    pub label: String,
    pub text: String,
}

impl QuickAction {
    pub fn new(label: impl Into<String>, text: impl Into<String>) -> Self {
        let label: String = label.into();
        Self {
            label: label.chars().take(MAX_LABEL_CHARS).collect(),
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecipeCard {
    /// 1-based position in the round
    pub rank: usize,
    pub name: String,
    pub summary: String,
    pub ingredients: Vec<String>,
    /// True when `ingredients` was cut short
    pub more_ingredients: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub action: QuickAction,
}

impl RecipeCard {
    pub fn new(rank: usize, recipe: &Recipe) -> Self {
        Self {
            rank,
            name: recipe.name.clone(),
            summary: recipe.summary.clone(),
            ingredients: recipe
                .ingredients
                .iter()
                .take(MAX_CARD_INGREDIENTS)
                .cloned()
                .collect(),
            more_ingredients: recipe.ingredients.len() > MAX_CARD_INGREDIENTS,
            image: recipe.image.clone(),
            action: QuickAction::new(format!("View steps ({})", rank), format!("steps {}", rank)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepCard {
    /// 1-based step number
    pub number: usize,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Artifact {
    Text {
        text: String,
    },
    RecipeCarousel {
        alt_text: String,
        cards: Vec<RecipeCard>,
    },
    StepCarousel {
        alt_text: String,
        cards: Vec<StepCard>,
    },
}

impl Artifact {
    pub fn text(text: impl Into<String>) -> Self {
        Artifact::Text { text: text.into() }
    }

    fn card_count(&self) -> usize {
        match self {
            Artifact::Text { .. } => 0,
            Artifact::RecipeCarousel { cards, .. } => cards.len(),
            Artifact::StepCarousel { cards, .. } => cards.len(),
        }
    }
}

/// Everything sent back for one turn.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Reply {
    pub artifacts: Vec<Artifact>,
    pub quick_actions: Vec<QuickAction>,
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            artifacts: vec![Artifact::text(text)],
            quick_actions: Vec::new(),
        }
    }

    pub fn push(&mut self, artifact: Artifact) {
        self.artifacts.push(artifact);
    }

    pub fn with_quick_actions(mut self, actions: Vec<QuickAction>) -> Self {
        self.quick_actions = actions;
        self
    }

    /// Text of every text artifact, in order.
    pub fn texts(&self) -> Vec<&str> {
        self.artifacts
            .iter()
            .filter_map(|a| match a {
                Artifact::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Check the reply against the platform's limits.
    pub fn validate(&self, limits: &PlatformLimits) -> Result<(), CoreError> {
        if self.artifacts.len() > limits.max_messages_per_reply {
            return Err(CoreError::PlatformLimitExceeded {
                what: "reply artifacts",
                attempted: self.artifacts.len(),
                limit: limits.max_messages_per_reply,
            });
        }
        if let Some(cards) = self
            .artifacts
            .iter()
            .map(Artifact::card_count)
            .find(|&n| n > limits.max_carousel_cards)
        {
            return Err(CoreError::PlatformLimitExceeded {
                what: "carousel cards",
                attempted: cards,
                limit: limits.max_carousel_cards,
            });
        }
        if self.quick_actions.len() > limits.max_quick_replies {
            return Err(CoreError::PlatformLimitExceeded {
                what: "quick actions",
                attempted: self.quick_actions.len(),
                limit: limits.max_quick_replies,
            });
        }
        Ok(())
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for artifact in &self.artifacts {
            match artifact {
                Artifact::Text { text } => writeln!(f, "{}", text)?,
                Artifact::RecipeCarousel { cards, .. } => {
                    for card in cards {
                        writeln!(f, "{}. {}", card.rank, card.name)?;
                        if !card.summary.is_empty() {
                            writeln!(f, "   {}", card.summary)?;
                        }
                        if !card.ingredients.is_empty() {
                            let ellipsis = if card.more_ingredients { ", ..." } else { "" };
                            writeln!(f, "   Ingredients: {}{}", card.ingredients.join(", "), ellipsis)?;
                        }
                        if let Some(image) = &card.image {
                            writeln!(f, "   Image: {}", image)?;
                        }
                        writeln!(f, "   [{}] -> {}", card.action.label, card.action.text)?;
                    }
                }
                Artifact::StepCarousel { cards, .. } => {
                    for card in cards {
                        writeln!(f, "Step {}: {}", card.number, card.text)?;
                        if let Some(image) = &card.image {
                            writeln!(f, "   Image: {}", image)?;
                        }
                    }
                }
            }
        }
        if !self.quick_actions.is_empty() {
            let labels: Vec<String> = self
                .quick_actions
                .iter()
                .map(|a| format!("[{}]", a.label))
                .collect();
            writeln!(f, "{}", labels.join(" "))?;
        }
        Ok(())
    }
}
