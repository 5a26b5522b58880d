//! Assistant configuration from environment variables.

use std::env;
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::generate::{DEFAULT_GENERATION_RETRIES, DEFAULT_RECIPES_PER_ROUND};
use crate::intent::FallbackPolicy;

pub const DEFAULT_STEP_PAGE_SIZE: usize = 5;
pub const DEFAULT_MAX_STEP_IMAGES: usize = 12;
pub const DEFAULT_MAX_QUICK_REPLIES: usize = 13;
pub const DEFAULT_MAX_CAROUSEL_CARDS: usize = 10;
pub const DEFAULT_MAX_MESSAGES_PER_REPLY: usize = 5;
pub const DEFAULT_MAX_REMOVABLE_SHORTCUTS: usize = 10;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value {value:?} for {var}: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Hard limits imposed by the messaging platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlatformLimits {
    /// Actions in one quick-action set
    pub max_quick_replies: usize,
    /// Cards in one carousel
    pub max_carousel_cards: usize,
    /// Artifacts in one reply
    pub max_messages_per_reply: usize,
}

impl Default for PlatformLimits {
    fn default() -> Self {
        Self {
            max_quick_replies: DEFAULT_MAX_QUICK_REPLIES,
            max_carousel_cards: DEFAULT_MAX_CAROUSEL_CARDS,
            max_messages_per_reply: DEFAULT_MAX_MESSAGES_PER_REPLY,
        }
    }
}

/// How recipe steps reach the user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StepDelivery {
    /// One page at a time, with next/previous actions
    #[default]
    Browse,
    /// Every step in a single reply, in as many carousels as the platform allows
    OneShot,
}

impl FromStr for StepDelivery {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "browse" => Ok(StepDelivery::Browse),
            "one_shot" | "oneshot" => Ok(StepDelivery::OneShot),
            other => Err(format!("unknown step delivery: {}", other)),
        }
    }
}

/// Which collaborator produces recipes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RecipeSourceKind {
    /// Rank the bundled corpus
    #[default]
    Corpus,
    /// Ask the hosted text model
    Llm,
}

impl FromStr for RecipeSourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "corpus" => Ok(RecipeSourceKind::Corpus),
            "llm" => Ok(RecipeSourceKind::Llm),
            other => Err(format!("unknown recipe source: {}", other)),
        }
    }
}

impl fmt::Display for RecipeSourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecipeSourceKind::Corpus => write!(f, "corpus"),
            RecipeSourceKind::Llm => write!(f, "llm"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssistantConfig {
    /// Recipes in every round
    pub recipes_per_round: usize,
    /// Extra collaborator attempts after the first
    pub generation_retries: usize,
    pub step_page_size: usize,
    /// Longer recipes are cut to this many illustrated steps
    pub max_step_images: usize,
    /// Inventory items offered in the removal menu
    pub max_removable_shortcuts: usize,
    pub step_delivery: StepDelivery,
    pub recipe_source: RecipeSourceKind,
    pub fallback: FallbackPolicy,
    pub limits: PlatformLimits,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            recipes_per_round: DEFAULT_RECIPES_PER_ROUND,
            generation_retries: DEFAULT_GENERATION_RETRIES,
            step_page_size: DEFAULT_STEP_PAGE_SIZE,
            max_step_images: DEFAULT_MAX_STEP_IMAGES,
            max_removable_shortcuts: DEFAULT_MAX_REMOVABLE_SHORTCUTS,
            step_delivery: StepDelivery::default(),
            recipe_source: RecipeSourceKind::default(),
            fallback: FallbackPolicy::default(),
            limits: PlatformLimits::default(),
        }
    }
}

impl AssistantConfig {
    /// Load configuration from environment variables.
    ///
    /// All optional:
    /// - `FRIDGE_RECIPES_PER_ROUND` (default: 3)
    /// - `FRIDGE_GENERATION_RETRIES` (default: 2, may be 0)
    /// - `FRIDGE_STEP_PAGE_SIZE` (default: 5)
    /// - `FRIDGE_MAX_STEP_IMAGES` (default: 12)
    /// - `FRIDGE_MAX_QUICK_REPLIES` (default: 13)
    /// - `FRIDGE_MAX_CAROUSEL_CARDS` (default: 10)
    /// - `FRIDGE_MAX_MESSAGES_PER_REPLY` (default: 5)
    /// - `FRIDGE_MAX_REMOVABLE_SHORTCUTS` (default: 10)
    /// - `FRIDGE_STEP_DELIVERY`: "browse" | "one_shot" (default: browse)
    /// - `FRIDGE_RECIPE_SOURCE`: "corpus" | "llm" (default: corpus)
    /// - `FRIDGE_FALLBACK`: "free_text" | "unrecognized" (default: free_text)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    /// Same as [`from_env`](Self::from_env) over an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let config = Self {
            recipes_per_round: positive(&lookup, "FRIDGE_RECIPES_PER_ROUND", defaults.recipes_per_round)?,
            generation_retries: parsed(&lookup, "FRIDGE_GENERATION_RETRIES", defaults.generation_retries)?,
            step_page_size: positive(&lookup, "FRIDGE_STEP_PAGE_SIZE", defaults.step_page_size)?,
            max_step_images: positive(&lookup, "FRIDGE_MAX_STEP_IMAGES", defaults.max_step_images)?,
            max_removable_shortcuts: positive(
                &lookup,
                "FRIDGE_MAX_REMOVABLE_SHORTCUTS",
                defaults.max_removable_shortcuts,
            )?,
            step_delivery: parsed(&lookup, "FRIDGE_STEP_DELIVERY", defaults.step_delivery)?,
            recipe_source: parsed(&lookup, "FRIDGE_RECIPE_SOURCE", defaults.recipe_source)?,
            fallback: parsed(&lookup, "FRIDGE_FALLBACK", defaults.fallback)?,
            limits: PlatformLimits {
                max_quick_replies: positive(
                    &lookup,
                    "FRIDGE_MAX_QUICK_REPLIES",
                    defaults.limits.max_quick_replies,
                )?,
                max_carousel_cards: positive(
                    &lookup,
                    "FRIDGE_MAX_CAROUSEL_CARDS",
                    defaults.limits.max_carousel_cards,
                )?,
                max_messages_per_reply: positive(
                    &lookup,
                    "FRIDGE_MAX_MESSAGES_PER_REPLY",
                    defaults.limits.max_messages_per_reply,
                )?,
            },
        };

        config.validate()?;
        Ok(config)
    }

    /// Cross-field checks.
    pub fn validate(&self) -> Result<(), ConfigError> {
        // A page of steps is one carousel, so it has to fit in one.
        if self.step_page_size > self.limits.max_carousel_cards {
            return Err(ConfigError::Invalid {
                var: "FRIDGE_STEP_PAGE_SIZE",
                value: self.step_page_size.to_string(),
                reason: format!(
                    "exceeds the carousel limit of {}",
                    self.limits.max_carousel_cards
                ),
            });
        }
        if self.recipes_per_round > self.limits.max_carousel_cards {
            return Err(ConfigError::Invalid {
                var: "FRIDGE_RECIPES_PER_ROUND",
                value: self.recipes_per_round.to_string(),
                reason: format!(
                    "exceeds the carousel limit of {}",
                    self.limits.max_carousel_cards
                ),
            });
        }
        // Round and step replies are a header followed by a carousel.
        if self.limits.max_messages_per_reply < 2 {
            return Err(ConfigError::Invalid {
                var: "FRIDGE_MAX_MESSAGES_PER_REPLY",
                value: self.limits.max_messages_per_reply.to_string(),
                reason: "must be at least 2".to_string(),
            });
        }
        // Room for at least one fixed action next to the removable items.
        if self.limits.max_quick_replies < 2 {
            return Err(ConfigError::Invalid {
                var: "FRIDGE_MAX_QUICK_REPLIES",
                value: self.limits.max_quick_replies.to_string(),
                reason: "must be at least 2".to_string(),
            });
        }
        Ok(())
    }
}

fn parsed<F, T>(lookup: &F, var: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: fmt::Display,
{
    match lookup(var).map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) {
        None => Ok(default),
        Some(value) => value.parse().map_err(|e: T::Err| ConfigError::Invalid {
            var,
            reason: e.to_string(),
            value,
        }),
    }
}

fn positive<F>(lookup: &F, var: &'static str, default: usize) -> Result<usize, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let value = parsed(lookup, var, default)?;
    if value == 0 {
        return Err(ConfigError::Invalid {
            var,
            value: value.to_string(),
            reason: "must be greater than zero".to_string(),
        });
    }
    Ok(value)
}
