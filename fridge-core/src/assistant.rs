//! Conversation front-end: one call per inbound message.
//!
//! [`Assistant::handle`] classifies the text, locks the user's session for
//! the whole turn and always answers with a [`Reply`]. Failures become
//! plain-language replies; nothing here ends a turn with an error.

use std::sync::Arc;

use crate::config::{AssistantConfig, ConfigError, StepDelivery};
use crate::error::CoreError;
use crate::extract::{possessed_ingredients, split_command_items};
use crate::generate::{GenerationRequest, Orchestrator};
use crate::intent::{Intent, IntentClassifier};
use crate::paginate::{batches_for_reply, build_selector, page_slice, turn_page, PageDelta};
use crate::reply::{Artifact, QuickAction, RecipeCard, Reply, StepCard};
use crate::session::{SessionStore, UserSession};
use crate::source::{default_dish_prompt, default_step_prompts, ImageSource, RecipeSource};
use crate::types::{Recipe, StepView};

/// Candidates for the "add" shortcuts on the main menu.
const COMMON_INGREDIENTS: &[&str] = &[
    "egg", "tomato", "onion", "garlic", "chicken", "tofu", "rice", "cabbage",
];
const MENU_INGREDIENT_SHORTCUTS: usize = 6;

const WELCOME_TEXT: &str = "Hi! I'm your fridge helper. Tell me what's in your fridge \
(for example \"tomato, egg\" or \"I have chicken thigh and onion\") and I'll suggest recipes. \
Type \"help\" to see everything I can do.";

const HELP_TEXT: &str = "Things you can say:\n\
- a list of ingredients, e.g. \"tomato, egg\": remember them and suggest recipes\n\
- \"add egg, tofu\" / \"remove beef\": edit your fridge\n\
- \"list\": show your fridge, \"clear\": empty it\n\
- \"recommend\": recipes from your fridge, \"regenerate\": different ones\n\
- \"steps 2\": illustrated steps of recipe 2, then \"next\" / \"prev\" / \"page 3\"\n\
- \"menu\": buttons, \"-\": removal buttons";

const MENU_TEXT: &str = "Pick an action below, or just type your ingredients.";
const UNRECOGNIZED_TEXT: &str =
    "Sorry, I didn't catch that. Type \"help\" to see what I can do.";
const GENERIC_FAILURE_TEXT: &str = "Sorry, something went wrong. Please try again.";
const NO_ROUND_TEXT: &str =
    "There are no recipes yet. Tell me your ingredients or say \"recommend\" first.";
const NO_STEPS_TEXT: &str = "Open a recipe's steps first, e.g. \"steps 1\".";

#[derive(Debug)]
pub struct Assistant {
    config: AssistantConfig,
    sessions: SessionStore,
    classifier: IntentClassifier,
    orchestrator: Orchestrator,
    source: Arc<dyn RecipeSource>,
    images: Arc<dyn ImageSource>,
}

fn inventory_text(session: &UserSession) -> String {
    if session.inventory.is_empty() {
        "Your fridge is empty. Tell me what you have, e.g. \"add egg, tomato\".".to_string()
    } else {
        format!(
            "In your fridge ({}): {}",
            session.inventory.len(),
            session.inventory.list().join(", ")
        )
    }
}

/// "remove <item>", quoted when the bare name would split into several targets.
fn removal_command(item: &str) -> String {
    if split_command_items(item) == [item] {
        format!("remove {}", item)
    } else {
        format!("remove \"{}\"", item)
    }
}

impl Assistant {
    /// Fails when the config cannot produce replies within its own platform
    /// limits (see [`AssistantConfig::validate`]).
    pub fn new(
        config: AssistantConfig,
        source: Arc<dyn RecipeSource>,
        images: Arc<dyn ImageSource>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            classifier: IntentClassifier::new(config.fallback),
            orchestrator: Orchestrator::new(config.recipes_per_round, config.generation_retries),
            sessions: SessionStore::new(),
            config,
            source,
            images,
        })
    }

    pub fn config(&self) -> &AssistantConfig {
        &self.config
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Greeting for a user who just started the conversation.
    pub fn welcome(&self) -> Reply {
        self.menu_reply(WELCOME_TEXT)
    }

    /// Handle one inbound message for `user_id`.
    pub async fn handle(&self, user_id: &str, text: &str) -> Reply {
        let text = text.trim();
        let intent = self.classifier.classify(text);
        tracing::debug!(user_id, ?intent, "Handling message");

        let mut session = self.sessions.lock(user_id).await;
        let reply = match self.dispatch(&mut session, text, intent).await {
            Ok(reply) => reply,
            Err(err) => self.failure_reply(&err, &[]),
        };
        self.checked(reply)
    }

    fn checked(&self, reply: Reply) -> Reply {
        match reply.validate(&self.config.limits) {
            Ok(()) => reply,
            Err(err) => {
                tracing::error!(%err, "Reply exceeds platform limits");
                Reply::text(GENERIC_FAILURE_TEXT)
            }
        }
    }

    async fn dispatch(
        &self,
        session: &mut UserSession,
        text: &str,
        intent: Intent,
    ) -> Result<Reply, CoreError> {
        match intent {
            Intent::ShowMenu => Ok(self.menu_reply(MENU_TEXT)),
            Intent::ShowHelp => Ok(self.menu_reply(HELP_TEXT)),
            Intent::ListInventory => Ok(self.menu_reply(inventory_text(session))),
            Intent::ClearInventory => {
                session.reset();
                Ok(self.menu_reply("Your fridge is now empty."))
            }
            Intent::AddIngredients(items) => self.add(session, &items),
            Intent::RemoveIngredients(items) if items.is_empty() => {
                if session.inventory.is_empty() {
                    Ok(self.menu_reply("Your fridge is empty, nothing to remove."))
                } else {
                    Ok(self.removal_reply(
                        session,
                        "Tap an ingredient to remove it, or type \"remove <name>\".",
                    ))
                }
            }
            Intent::RemoveIngredients(items) => Ok(self.remove(session, &items)),
            Intent::Recommend => self.recommend(session).await,
            Intent::RegenerateSameIngredients => self.regenerate(session).await,
            Intent::ShowRecipeSteps(number) => self.show_steps(session, number).await,
            Intent::PageSteps(delta) => self.page_steps(session, delta),
            Intent::FreeTextIngredients(items) => self.free_text(session, text, items).await,
            Intent::Unrecognized => Ok(self.menu_reply(UNRECOGNIZED_TEXT)),
        }
    }

    fn add(&self, session: &mut UserSession, items: &[String]) -> Result<Reply, CoreError> {
        if items.is_empty() {
            return Err(CoreError::Validation(
                "Tell me what to add, e.g. \"add egg, tomato\".".to_string(),
            ));
        }

        let added = session.inventory.add(items);
        let summary = if added.is_empty() {
            format!("Already in your fridge: {}", items.join(", "))
        } else {
            format!("Added: {}", added.join(", "))
        };
        Ok(self.menu_reply(format!("{}\n{}", summary, inventory_text(session))))
    }

    fn remove(&self, session: &mut UserSession, items: &[String]) -> Reply {
        let removed = session.inventory.remove(items);
        let summary = if removed.is_empty() {
            format!("Couldn't find {} in your fridge.", items.join(", "))
        } else {
            session.step_view = None;
            format!("Removed: {}", removed.join(", "))
        };
        let text = format!("{}\n{}", summary, inventory_text(session));

        if session.inventory.is_empty() {
            self.menu_reply(text)
        } else {
            self.removal_reply(session, text)
        }
    }

    async fn recommend(&self, session: &mut UserSession) -> Result<Reply, CoreError> {
        if session.inventory.is_empty() {
            return Err(CoreError::Validation(
                "Your fridge is empty. Tell me a few ingredients first, e.g. \"tomato, egg\"."
                    .to_string(),
            ));
        }

        let ingredients = session.inventory.list();
        let request = GenerationRequest {
            user_input: format!("Recommend recipes using: {}", ingredients.join(", ")),
            known_ingredients: ingredients,
            ..GenerationRequest::default()
        };
        Ok(self.generate(session, request, Vec::new()).await)
    }

    async fn regenerate(&self, session: &mut UserSession) -> Result<Reply, CoreError> {
        let (ingredients, avoid_titles) = match &session.round {
            Some(round) if !round.ingredients.is_empty() => {
                (round.ingredients.clone(), round.titles.clone())
            }
            Some(round) => (session.inventory.list(), round.titles.clone()),
            None => (session.inventory.list(), Vec::new()),
        };
        if ingredients.is_empty() {
            return Err(CoreError::Validation(
                "Nothing to cook with yet. Tell me your ingredients first.".to_string(),
            ));
        }

        let request = GenerationRequest {
            user_input: format!("Suggest different recipes using: {}", ingredients.join(", ")),
            known_ingredients: ingredients,
            avoid_titles,
            fallback_ingredients: Vec::new(),
        };
        Ok(self.generate(session, request, Vec::new()).await)
    }

    /// Free text goes to the recipe source as-is. Items the list heuristic
    /// already picked out are stored up front.
    async fn free_text(
        &self,
        session: &mut UserSession,
        text: &str,
        items: Vec<String>,
    ) -> Result<Reply, CoreError> {
        let (stored, fallback_ingredients) = if items.is_empty() {
            (Vec::new(), possessed_ingredients(text))
        } else {
            (session.inventory.add(&items), Vec::new())
        };

        let request = GenerationRequest {
            user_input: text.to_string(),
            known_ingredients: session.inventory.list(),
            avoid_titles: Vec::new(),
            fallback_ingredients,
        };
        Ok(self.generate(session, request, stored).await)
    }

    /// Run a generation round and turn the outcome into a reply.
    async fn generate(
        &self,
        session: &mut UserSession,
        request: GenerationRequest,
        mut added: Vec<String>,
    ) -> Reply {
        let before = session.inventory.len();
        let result = self
            .orchestrator
            .generate(self.source.as_ref(), session, request)
            .await;
        added.extend(session.inventory.list().into_iter().skip(before));

        match result {
            Ok(()) => {
                self.illustrate_round(session).await;
                self.round_reply(session, &added)
            }
            Err(err) => self.failure_reply(&err, &added),
        }
    }

    async fn illustrate(&self, prompt: &str) -> Option<String> {
        match self.images.illustrate(prompt).await {
            Ok(image) => image,
            Err(err) => {
                tracing::warn!(%err, "Image generation failed, continuing without image");
                None
            }
        }
    }

    /// Attach one image per recipe of a freshly generated round.
    async fn illustrate_round(&self, session: &mut UserSession) {
        let Some(round) = session.round.as_mut() else {
            return;
        };
        for recipe in &mut round.recipes {
            let prompt = recipe
                .image_prompt
                .clone()
                .unwrap_or_else(|| default_dish_prompt(&recipe.name));
            recipe.image = self.illustrate(&prompt).await;
        }
    }

    fn round_reply(&self, session: &UserSession, added: &[String]) -> Reply {
        let Some(round) = &session.round else {
            return self.menu_reply(GENERIC_FAILURE_TEXT);
        };

        let mut text = if round.ingredients.is_empty() {
            format!("Here are {} recipes for you.", round.recipes.len())
        } else {
            format!(
                "Here are {} recipes using: {}",
                round.recipes.len(),
                round.ingredients.join(", ")
            )
        };
        if !added.is_empty() {
            text.push_str(&format!("\nAdded to your fridge: {}", added.join(", ")));
        }

        let cards = round
            .recipes
            .iter()
            .enumerate()
            .map(|(i, recipe)| RecipeCard::new(i + 1, recipe))
            .collect();

        let mut reply = Reply::text(text);
        reply.push(Artifact::RecipeCarousel {
            alt_text: "Recipe suggestions".to_string(),
            cards,
        });
        reply.with_quick_actions(self.main_menu())
    }

    async fn show_steps(
        &self,
        session: &mut UserSession,
        number: usize,
    ) -> Result<Reply, CoreError> {
        let round = session
            .round
            .as_ref()
            .ok_or_else(|| CoreError::Validation(NO_ROUND_TEXT.to_string()))?;
        if number == 0 || number > round.recipes.len() {
            return Err(CoreError::Validation(format!(
                "Pick a recipe between 1 and {}.",
                round.recipes.len()
            )));
        }
        let index = number - 1;

        // Re-opening the recipe being browsed reuses its illustrations.
        let cached = matches!(&session.step_view, Some(view) if view.recipe_index == index);
        if cached {
            if let Some(view) = session.step_view.as_mut() {
                view.page = 0;
            }
        } else {
            let recipe = round.recipes[index].clone();
            let view = self.build_step_view(index, &recipe).await?;
            session.step_view = Some(view);
        }

        Ok(self.steps_reply(session))
    }

    async fn build_step_view(&self, index: usize, recipe: &Recipe) -> Result<StepView, CoreError> {
        let mut prompts = match self.source.describe_steps(recipe).await {
            Ok(prompts) if !prompts.is_empty() => prompts,
            Ok(_) => default_step_prompts(recipe),
            Err(err) => {
                tracing::warn!(%err, recipe = %recipe.name, "Step rewrite failed, using original steps");
                default_step_prompts(recipe)
            }
        };
        prompts.truncate(self.config.max_step_images);

        if prompts.is_empty() {
            return Err(CoreError::Validation(format!(
                "\"{}\" has no steps to show.",
                recipe.name
            )));
        }

        let mut images = Vec::with_capacity(prompts.len());
        for prompt in &prompts {
            let image = if prompt.image_prompt.is_empty() {
                None
            } else {
                self.illustrate(&prompt.image_prompt).await
            };
            images.push(image);
        }

        Ok(StepView {
            recipe_index: index,
            recipe_name: recipe.name.clone(),
            steps: prompts.into_iter().map(|p| p.text).collect(),
            images,
            page: 0,
        })
    }

    fn page_steps(&self, session: &mut UserSession, delta: PageDelta) -> Result<Reply, CoreError> {
        let view = session
            .step_view
            .as_mut()
            .ok_or_else(|| CoreError::Validation(NO_STEPS_TEXT.to_string()))?;
        view.page = turn_page(view.page, delta, view.len(), self.config.step_page_size);
        Ok(self.steps_reply(session))
    }

    fn steps_reply(&self, session: &UserSession) -> Reply {
        let Some(view) = &session.step_view else {
            return self.menu_reply(NO_STEPS_TEXT);
        };

        let cards: Vec<StepCard> = view
            .steps
            .iter()
            .zip(&view.images)
            .enumerate()
            .map(|(i, (text, image))| StepCard {
                number: i + 1,
                text: text.clone(),
                image: image.clone(),
            })
            .collect();
        let alt_text = format!("{} steps", view.recipe_name);

        let mut reply = match self.config.step_delivery {
            StepDelivery::Browse => {
                let (page, window) = page_slice(&cards, view.page, self.config.step_page_size);
                let mut reply = Reply::text(format!(
                    "{}, steps {}-{}/{}",
                    view.recipe_name, window.start, window.end, window.total
                ));
                reply.push(Artifact::StepCarousel {
                    alt_text,
                    cards: page.to_vec(),
                });
                reply
            }
            StepDelivery::OneShot => {
                // One slot goes to the header text.
                let max_batches = self.config.limits.max_messages_per_reply.saturating_sub(1);
                let batches =
                    batches_for_reply(&cards, self.config.limits.max_carousel_cards, max_batches);
                let shown: usize = batches.iter().map(Vec::len).sum();

                let mut header = format!("{}, {} steps", view.recipe_name, cards.len());
                if shown < cards.len() {
                    header.push_str(&format!(" (showing the first {})", shown));
                }
                let mut reply = Reply::text(header);
                for batch in batches {
                    reply.push(Artifact::StepCarousel {
                        alt_text: alt_text.clone(),
                        cards: batch,
                    });
                }
                reply
            }
        };

        reply.quick_actions = self.main_menu();
        reply
    }

    fn failure_reply(&self, err: &CoreError, added: &[String]) -> Reply {
        let mut text = match err {
            CoreError::Validation(message) => message.clone(),
            CoreError::GenerationShortfall { wanted, got } => format!(
                "I could only come up with {} of {} different recipes. \
                 Try listing a few more ingredients, or say \"regenerate\" to try again.",
                got, wanted
            ),
            CoreError::CollaboratorUnavailable(_) => {
                "Sorry, the recipe service is unavailable right now. Please try again in a moment."
                    .to_string()
            }
            CoreError::PlatformLimitExceeded { .. } => GENERIC_FAILURE_TEXT.to_string(),
        };

        if !matches!(err, CoreError::Validation(_)) {
            tracing::warn!(%err, "Turn failed");
        }
        if !added.is_empty() {
            text.push_str(&format!(
                "\nI still added these to your fridge: {}",
                added.join(", ")
            ));
        }
        self.menu_reply(text)
    }

    fn menu_reply(&self, text: impl Into<String>) -> Reply {
        Reply::text(text).with_quick_actions(self.main_menu())
    }

    fn removal_reply(&self, session: &UserSession, text: impl Into<String>) -> Reply {
        Reply::text(text).with_quick_actions(self.removal_menu(session))
    }

    /// Common-ingredient shortcuts followed by every function action.
    pub fn main_menu(&self) -> Vec<QuickAction> {
        let shortcuts: Vec<QuickAction> = COMMON_INGREDIENTS
            .iter()
            .take(MENU_INGREDIENT_SHORTCUTS)
            .map(|i| QuickAction::new(format!("+ {}", i), format!("add {}", i)))
            .collect();
        let fixed = [
            QuickAction::new("Recommend", "recommend"),
            QuickAction::new("New recipes", "regenerate"),
            QuickAction::new("Remove items", "remove"),
            QuickAction::new("Previous page", "prev"),
            QuickAction::new("Next page", "next"),
            QuickAction::new("My fridge", "list"),
            QuickAction::new("Clear fridge", "clear"),
        ];
        build_selector(&shortcuts, &fixed, self.config.limits.max_quick_replies)
    }

    /// One removal shortcut per inventory item, then the function actions.
    pub fn removal_menu(&self, session: &UserSession) -> Vec<QuickAction> {
        let items: Vec<QuickAction> = session
            .inventory
            .list()
            .into_iter()
            .take(self.config.max_removable_shortcuts)
            .map(|i| QuickAction::new(format!("- {}", i), removal_command(&i)))
            .collect();
        let fixed = [
            QuickAction::new("Recommend", "recommend"),
            QuickAction::new("New recipes", "regenerate"),
            QuickAction::new("My fridge", "list"),
            QuickAction::new("Menu", "menu"),
        ];
        build_selector(&items, &fixed, self.config.limits.max_quick_replies)
    }
}
