//! Prompt templates for the hosted recipe model.

pub const RECIPE_PROMPT_NAME: &str = "recipe_generation";
pub const RETRY_PROMPT_NAME: &str = "recipe_retry";
pub const STEPS_PROMPT_NAME: &str = "step_illustration";

/// Only this many avoid titles are spelled out in a prompt.
pub const MAX_AVOID_TITLES_IN_PROMPT: usize = 12;

fn join_or(items: &[String], empty: &str) -> String {
    if items.is_empty() {
        empty.to_string()
    } else {
        items.join(", ")
    }
}

/// First call of a round: extract ingredients from the message and author recipes.
pub fn render_recipe_prompt(
    user_input: &str,
    known_ingredients: &[String],
    avoid_titles: &[String],
    wanted: usize,
) -> String {
    let known = join_or(known_ingredients, "(none)");
    let avoid_capped: Vec<String> = avoid_titles
        .iter()
        .take(MAX_AVOID_TITLES_IN_PROMPT)
        .cloned()
        .collect();
    let avoid = join_or(&avoid_capped, "(none)");

    format!(
        r#"Respond with JSON only, no other text. Write in the user's language; only image_prompt is in English.
You are a home-cooking assistant.

User message:
{user_input}

Ingredients already in the user's fridge (their own wording, may include cuts or varieties):
{known}

JSON format:
{{
  "ingredients": ["ingredients mentioned or implied by the user, without amounts or units, deduplicated"],
  "recipes": [
    {{
      "name": "dish name",
      "summary": "one-sentence introduction",
      "ingredients": ["key ingredients, reusing the wording from ingredients above"],
      "steps": ["step 1", "step 2", "... at least 5 steps"],
      "image_prompt": "English prompt for a photorealistic food photo of this dish, plated nicely, natural lighting, shallow depth of field, no text"
    }}
  ]
}}

Rules:
- Keep the user's wording and cut names in ingredients. Do not turn "marbled beef short-rib" into "beef" unless the user only wrote "beef".
- Return exactly {wanted} recipes, each clearly different in name and method.
- Even with few ingredients, make {wanted} home-style dishes. Common seasonings may be assumed; do not add odd ingredients.
- Do not reuse or closely imitate these dish names: {avoid}
- Each recipe has at least 5 steps that a beginner can follow.
- image_prompt must be in English and clearly show the finished dish."#,
        user_input = user_input,
        known = known,
        wanted = wanted,
        avoid = avoid,
    )
}

/// Repair call: ask again for the full count, avoiding what was already collected.
pub fn render_retry_prompt(ingredients: &[String], avoid_titles: &[String], wanted: usize) -> String {
    format!(
        r#"Respond with JSON only, no other text.
Using these ingredients, produce exactly {wanted} recipes in the same JSON format as before ("ingredients" and "recipes" with name, summary, ingredients, steps, image_prompt).
Avoid these dish names: {avoid}
Ingredients: {ingredients}
Keep cut and variety names as written; do not generalize them to broad categories."#,
        wanted = wanted,
        avoid = join_or(avoid_titles, "(none)"),
        ingredients = join_or(ingredients, "(none)"),
    )
}

/// Rewrite steps more clearly and attach an English illustration prompt to each.
pub fn render_steps_prompt(recipe_name: &str, steps: &[String]) -> String {
    let numbered: Vec<String> = steps
        .iter()
        .enumerate()
        .map(|(i, s)| format!("{}. {}", i + 1, s))
        .collect();

    format!(
        r#"Respond with JSON only, no other text.
Rewrite each step more clearly (same language as the steps) and give each step an English image prompt for an instructional picture: hands at work, utensils, ingredients, easy to understand at a glance, no text or watermark.

Dish: {recipe_name}
Original steps:
{steps}

JSON format:
{{
  "steps": [
    {{
      "text": "clear, short step",
      "image_prompt": "English prompt for a photorealistic instructional cooking image showing THIS step in action (hands, utensils, ingredients), kitchen setting, natural lighting, no text, no watermark"
    }}
  ]
}}

Rules:
- Keep the same number of steps as the original.
- image_prompt must be in English."#,
        recipe_name = recipe_name,
        steps = numbered.join("\n"),
    )
}
