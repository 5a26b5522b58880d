//! End-to-end conversations through `Assistant::handle`.
//!
//! The corpus-backed assistant runs against the bundled recipe corpus. The
//! model-backed assistant runs against a `FakeProvider` with queued replies,
//! so every test is deterministic and offline.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use fridge_core::llm::FakeProvider;
use fridge_core::{
    Artifact, Assistant, AssistantConfig, CorpusRecipeSource, FallbackPolicy, ImageSource,
    LlmRecipeSource, NoImages, PlatformLimits, RecipeCard, RecipeCorpus, RecommendationIndex,
    Reply, SourceError, StepCard, StepDelivery,
};

/// Hands out numbered image URLs.
#[derive(Debug, Default)]
struct NumberedImages {
    calls: AtomicUsize,
}

#[async_trait]
impl ImageSource for NumberedImages {
    async fn illustrate(&self, _prompt: &str) -> Result<Option<String>, SourceError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(Some(format!("https://img.test/{}.png", n)))
    }
}

/// Always fails, like an image service that is down.
#[derive(Debug)]
struct BrokenImages;

#[async_trait]
impl ImageSource for BrokenImages {
    async fn illustrate(&self, _prompt: &str) -> Result<Option<String>, SourceError> {
        Err(SourceError::Unavailable("image service down".to_string()))
    }
}

fn corpus_assistant(config: AssistantConfig) -> Assistant {
    let corpus = RecipeCorpus::bundled().unwrap();
    let source = CorpusRecipeSource::new(RecommendationIndex::new(corpus));
    Assistant::new(config, Arc::new(source), Arc::new(NoImages)).unwrap()
}

fn llm_assistant(provider: Arc<FakeProvider>, images: Arc<dyn ImageSource>) -> Assistant {
    let source = LlmRecipeSource::new(Box::new(provider));
    Assistant::new(AssistantConfig::default(), Arc::new(source), images).unwrap()
}

/// Send one message and check the reply fits the platform limits.
async fn say(assistant: &Assistant, user: &str, text: &str) -> Reply {
    let reply = assistant.handle(user, text).await;
    assert!(
        reply.validate(&assistant.config().limits).is_ok(),
        "reply to {:?} exceeds limits: {:?}",
        text,
        reply
    );
    reply
}

fn first_text(reply: &Reply) -> &str {
    reply.texts().first().copied().unwrap_or_default()
}

fn recipe_cards(reply: &Reply) -> Vec<&RecipeCard> {
    reply
        .artifacts
        .iter()
        .filter_map(|a| match a {
            Artifact::RecipeCarousel { cards, .. } => Some(cards),
            _ => None,
        })
        .flatten()
        .collect()
}

fn step_carousels(reply: &Reply) -> Vec<&Vec<StepCard>> {
    reply
        .artifacts
        .iter()
        .filter_map(|a| match a {
            Artifact::StepCarousel { cards, .. } => Some(cards),
            _ => None,
        })
        .collect()
}

fn recipes_json(names: &[&str], ingredients: &[&str]) -> String {
    let recipes: Vec<serde_json::Value> = names
        .iter()
        .map(|name| {
            serde_json::json!({
                "name": name,
                "summary": format!("A simple {}", name),
                "ingredients": ingredients,
                "steps": ["Prep everything", "Cook", "Serve"],
            })
        })
        .collect();
    serde_json::json!({ "ingredients": ingredients, "recipes": recipes }).to_string()
}

// ============================================================================
// Inventory editing
// ============================================================================

#[tokio::test]
async fn test_add_list_remove_clear() {
    let assistant = corpus_assistant(AssistantConfig::default());

    let reply = say(&assistant, "u1", "add egg, tomato").await;
    assert!(first_text(&reply).starts_with("Added: egg, tomato"));
    assert!(first_text(&reply).contains("In your fridge (2): egg, tomato"));

    let reply = say(&assistant, "u1", "add Egg").await;
    assert!(first_text(&reply).starts_with("Already in your fridge"));

    let reply = say(&assistant, "u1", "list").await;
    assert_eq!(first_text(&reply), "In your fridge (2): egg, tomato");

    let reply = say(&assistant, "u1", "remove egg").await;
    assert!(first_text(&reply).starts_with("Removed: egg"));
    assert!(reply.quick_actions.iter().any(|a| a.text == "remove tomato"));

    let reply = say(&assistant, "u1", "remove beef").await;
    assert!(first_text(&reply).starts_with("Couldn't find beef"));

    let reply = say(&assistant, "u1", "clear").await;
    assert_eq!(first_text(&reply), "Your fridge is now empty.");

    let reply = say(&assistant, "u1", "list").await;
    assert!(first_text(&reply).starts_with("Your fridge is empty"));
}

#[tokio::test]
async fn test_bare_dash_opens_removal_menu() {
    let assistant = corpus_assistant(AssistantConfig::default());

    let reply = say(&assistant, "u1", "-").await;
    assert!(first_text(&reply).contains("nothing to remove"));

    say(&assistant, "u1", "add chicken, onion, rice").await;
    let reply = say(&assistant, "u1", "-").await;
    let labels: Vec<&str> = reply.quick_actions.iter().map(|a| a.label.as_str()).collect();
    assert_eq!(&labels[..3], &["- chicken", "- onion", "- rice"]);
    assert!(reply.quick_actions.iter().any(|a| a.text == "menu"));
}

#[tokio::test]
async fn test_add_without_items_asks_for_them() {
    let assistant = corpus_assistant(AssistantConfig::default());
    let reply = say(&assistant, "u1", "add").await;
    assert!(first_text(&reply).starts_with("Tell me what to add"));
    assert!(assistant.sessions().lock("u1").await.inventory.is_empty());
}

#[tokio::test]
async fn test_unrecognized_policy() {
    let config = AssistantConfig {
        fallback: FallbackPolicy::Unrecognized,
        ..AssistantConfig::default()
    };
    let assistant = corpus_assistant(config);
    let reply = say(&assistant, "u1", "what's for dinner tonight?").await;
    assert!(first_text(&reply).starts_with("Sorry, I didn't catch that"));
    assert!(assistant.sessions().lock("u1").await.inventory.is_empty());
}

// ============================================================================
// Corpus-backed recommendations
// ============================================================================

#[tokio::test]
async fn test_recommend_needs_ingredients() {
    let assistant = corpus_assistant(AssistantConfig::default());
    let reply = say(&assistant, "u1", "recommend").await;
    assert!(first_text(&reply).starts_with("Your fridge is empty"));
    assert!(recipe_cards(&reply).is_empty());
}

#[tokio::test]
async fn test_recommend_from_corpus() {
    let assistant = corpus_assistant(AssistantConfig::default());
    say(&assistant, "u1", "add egg, tomato").await;

    let reply = say(&assistant, "u1", "recommend").await;
    assert!(first_text(&reply).starts_with("Here are 3 recipes using: egg, tomato"));

    let cards = recipe_cards(&reply);
    assert_eq!(cards.len(), 3);
    assert!(cards.iter().any(|c| c.name == "Tomato Egg Stir Fry"));
    assert_eq!(cards[0].action.text, "steps 1");
    assert_eq!(cards[2].action.text, "steps 3");
}

#[tokio::test]
async fn test_regenerate_avoids_previous_titles() {
    let assistant = corpus_assistant(AssistantConfig::default());
    say(&assistant, "u1", "add egg, tomato, onion, garlic").await;

    let first = say(&assistant, "u1", "recommend").await;
    let first_names: Vec<String> = recipe_cards(&first).iter().map(|c| c.name.clone()).collect();
    assert_eq!(first_names.len(), 3);

    let second = say(&assistant, "u1", "regenerate").await;
    let second_names: Vec<String> = recipe_cards(&second).iter().map(|c| c.name.clone()).collect();
    assert_eq!(second_names.len(), 3);
    for name in &second_names {
        assert!(!first_names.contains(name), "{} repeated", name);
    }
}

#[tokio::test]
async fn test_steps_without_round() {
    let assistant = corpus_assistant(AssistantConfig::default());
    let reply = say(&assistant, "u1", "steps 1").await;
    assert!(first_text(&reply).starts_with("There are no recipes yet"));

    let reply = say(&assistant, "u1", "next").await;
    assert!(first_text(&reply).starts_with("Open a recipe's steps first"));
}

#[tokio::test]
async fn test_step_paging_clamps() {
    let config = AssistantConfig {
        step_page_size: 2,
        ..AssistantConfig::default()
    };
    let assistant = corpus_assistant(config);
    say(&assistant, "u1", "add egg, tomato").await;
    say(&assistant, "u1", "recommend").await;

    let reply = say(&assistant, "u1", "steps 4").await;
    assert_eq!(first_text(&reply), "Pick a recipe between 1 and 3.");

    let reply = say(&assistant, "u1", "steps 1").await;
    assert!(first_text(&reply).ends_with(", steps 1-2/5"));
    let carousels = step_carousels(&reply);
    assert_eq!(carousels.len(), 1);
    assert_eq!(carousels[0].len(), 2);
    assert_eq!(carousels[0][0].number, 1);

    let reply = say(&assistant, "u1", "prev").await;
    assert!(first_text(&reply).ends_with(", steps 1-2/5"));

    let reply = say(&assistant, "u1", "next").await;
    assert!(first_text(&reply).ends_with(", steps 3-4/5"));

    let reply = say(&assistant, "u1", "next").await;
    assert!(first_text(&reply).ends_with(", steps 5-5/5"));
    assert_eq!(step_carousels(&reply)[0][0].number, 5);

    let reply = say(&assistant, "u1", "next").await;
    assert!(first_text(&reply).ends_with(", steps 5-5/5"));

    let reply = say(&assistant, "u1", "page 2").await;
    assert!(first_text(&reply).ends_with(", steps 3-4/5"));

    // Re-opening the same recipe starts from its first page.
    let reply = say(&assistant, "u1", "steps 1").await;
    assert!(first_text(&reply).ends_with(", steps 1-2/5"));
}

#[tokio::test]
async fn test_removing_an_item_closes_steps() {
    let assistant = corpus_assistant(AssistantConfig::default());
    say(&assistant, "u1", "add egg, tomato").await;
    say(&assistant, "u1", "recommend").await;
    say(&assistant, "u1", "steps 1").await;

    say(&assistant, "u1", "remove tomato").await;
    let reply = say(&assistant, "u1", "next").await;
    assert!(first_text(&reply).starts_with("Open a recipe's steps first"));
}

#[tokio::test]
async fn test_one_shot_steps_respect_message_cap() {
    let config = AssistantConfig {
        recipes_per_round: 2,
        step_page_size: 2,
        step_delivery: StepDelivery::OneShot,
        limits: PlatformLimits {
            max_carousel_cards: 2,
            max_messages_per_reply: 3,
            ..PlatformLimits::default()
        },
        ..AssistantConfig::default()
    };
    let assistant = corpus_assistant(config);
    say(&assistant, "u1", "add egg, tomato").await;
    say(&assistant, "u1", "recommend").await;

    let reply = say(&assistant, "u1", "steps 1").await;
    assert!(first_text(&reply).ends_with(", 5 steps (showing the first 4)"));
    let carousels = step_carousels(&reply);
    assert_eq!(carousels.len(), 2);
    assert_eq!(carousels[1].last().map(|c| c.number), Some(4));
    assert_eq!(reply.artifacts.len(), 3);
}

#[tokio::test]
async fn test_two_message_limit_still_shows_recipes_and_steps() {
    let config = AssistantConfig {
        step_delivery: StepDelivery::OneShot,
        limits: PlatformLimits {
            max_messages_per_reply: 2,
            ..PlatformLimits::default()
        },
        ..AssistantConfig::default()
    };
    let assistant = corpus_assistant(config);
    say(&assistant, "u1", "add egg, tomato").await;

    let reply = say(&assistant, "u1", "recommend").await;
    assert_eq!(reply.artifacts.len(), 2);
    assert_eq!(recipe_cards(&reply).len(), 3);

    let reply = say(&assistant, "u1", "steps 1").await;
    assert_eq!(reply.artifacts.len(), 2);
    assert_eq!(step_carousels(&reply)[0].len(), 5);
}

// ============================================================================
// Model-backed generation
// ============================================================================

#[tokio::test]
async fn test_free_text_round_with_retry() {
    let provider = Arc::new(FakeProvider::new());
    provider.push_response(recipes_json(&["Tomato Soup", "Veg Stew"], &["tomato", "egg"]));
    provider.push_response(recipes_json(&["Tomato Soup", "Herb Rice"], &[]));
    let assistant = llm_assistant(provider.clone(), Arc::new(NumberedImages::default()));

    let reply = say(&assistant, "u1", "I have tomatoes and eggs").await;
    assert!(first_text(&reply).starts_with("Here are 3 recipes using: tomato, egg"));
    assert!(first_text(&reply).contains("Added to your fridge: tomato, egg"));

    let cards = recipe_cards(&reply);
    let names: Vec<&str> = cards.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["Tomato Soup", "Veg Stew", "Herb Rice"]);
    assert_eq!(cards[0].image.as_deref(), Some("https://img.test/1.png"));
    assert_eq!(cards[2].image.as_deref(), Some("https://img.test/3.png"));

    let received = provider.received();
    assert_eq!(received.len(), 2);
    assert!(received[1].prompt.contains("Tomato Soup"));
    assert!(received[1].prompt.contains("Veg Stew"));

    let session = assistant.sessions().lock("u1").await;
    assert_eq!(session.inventory.list(), vec!["tomato", "egg"]);
}

#[tokio::test]
async fn test_model_steps_are_illustrated_and_paged() {
    let provider = Arc::new(FakeProvider::new());
    provider.push_response(recipes_json(
        &["Tomato Soup", "Veg Stew", "Herb Rice"],
        &["tomato"],
    ));
    let steps: Vec<serde_json::Value> = (1..=7)
        .map(|i| serde_json::json!({ "text": format!("Step {}", i), "image_prompt": format!("photo {}", i) }))
        .collect();
    provider.push_response(serde_json::json!({ "steps": steps }).to_string());
    let assistant = llm_assistant(provider.clone(), Arc::new(NumberedImages::default()));

    say(&assistant, "u1", "tomato, egg").await;
    let reply = say(&assistant, "u1", "steps 1").await;
    assert_eq!(first_text(&reply), "Tomato Soup, steps 1-5/7");
    let carousels = step_carousels(&reply);
    let page = carousels[0];
    assert_eq!(page.len(), 5);
    assert_eq!(page[0].text, "Step 1");
    // Three recipe images came first.
    assert_eq!(page[0].image.as_deref(), Some("https://img.test/4.png"));

    let reply = say(&assistant, "u1", "next").await;
    assert_eq!(first_text(&reply), "Tomato Soup, steps 6-7/7");

    // Paging back reuses the illustrations instead of asking again.
    say(&assistant, "u1", "prev").await;
    say(&assistant, "u1", "steps 1").await;
    assert_eq!(provider.received().len(), 2);
}

#[tokio::test]
async fn test_image_failures_leave_cards_without_images() {
    let provider = Arc::new(FakeProvider::new());
    provider.push_response(recipes_json(&["Mapo Tofu", "Tofu Soup", "Scallion Pancake"], &["tofu"]));
    let assistant = llm_assistant(provider, Arc::new(BrokenImages));

    let reply = say(&assistant, "u1", "tofu, scallion").await;
    let cards = recipe_cards(&reply);
    assert_eq!(cards.len(), 3);
    assert!(cards.iter().all(|c| c.image.is_none()));
}

#[tokio::test]
async fn test_shortfall_keeps_previous_state() {
    let provider = Arc::new(
        FakeProvider::new().with_default_response(&recipes_json(&["Only Soup"], &[])),
    );
    let assistant = llm_assistant(provider.clone(), Arc::new(NoImages));
    say(&assistant, "u1", "add egg").await;

    let reply = say(&assistant, "u1", "recommend").await;
    assert!(first_text(&reply).starts_with("I could only come up with 1 of 3 different recipes"));
    assert!(recipe_cards(&reply).is_empty());
    // First call plus two retries.
    assert_eq!(provider.received().len(), 3);

    let reply = say(&assistant, "u1", "steps 1").await;
    assert!(first_text(&reply).starts_with("There are no recipes yet"));
}

#[tokio::test]
async fn test_unavailable_service_still_remembers_ingredients() {
    let provider = Arc::new(FakeProvider::new());
    provider.push_failure("connection refused");
    let assistant = llm_assistant(provider, Arc::new(NoImages));

    let reply = say(&assistant, "u1", "tomato, egg").await;
    assert!(first_text(&reply).starts_with("Sorry, the recipe service is unavailable"));
    assert!(first_text(&reply).contains("I still added these to your fridge: tomato, egg"));

    let reply = say(&assistant, "u1", "list").await;
    assert_eq!(first_text(&reply), "In your fridge (2): tomato, egg");
}

// ============================================================================
// Sessions
// ============================================================================

#[tokio::test]
async fn test_users_do_not_share_fridges() {
    let assistant = Arc::new(corpus_assistant(AssistantConfig::default()));
    let items = ["egg", "tofu", "rice", "pork", "beef", "basil", "pasta", "ginger"];

    let mut handles = Vec::new();
    for (i, item) in items.iter().enumerate() {
        let assistant = assistant.clone();
        let text = format!("add {}", item);
        handles.push(tokio::spawn(async move {
            assistant.handle(&format!("user-{}", i), &text).await
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(assistant.sessions().user_count(), items.len());
    for (i, item) in items.iter().enumerate() {
        let reply = say(&assistant, &format!("user-{}", i), "list").await;
        assert_eq!(first_text(&reply), format!("In your fridge (1): {}", item));
    }
}

#[tokio::test]
async fn test_concurrent_messages_from_one_user_all_apply() {
    let assistant = Arc::new(corpus_assistant(AssistantConfig::default()));

    let mut handles = Vec::new();
    for i in 0..10 {
        let assistant = assistant.clone();
        handles.push(tokio::spawn(async move {
            assistant.handle("u1", &format!("add item{}", i)).await
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let session = assistant.sessions().lock("u1").await;
    assert_eq!(session.inventory.len(), 10);
}
