use std::collections::BTreeSet;

use fridge_core::{normalize_with, NormalizeMode, RecommendOptions, RecommendationIndex};

fn join<'a>(tokens: impl IntoIterator<Item = &'a fridge_core::NormalizedToken>) -> String {
    tokens
        .into_iter()
        .map(|t| t.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn run(index: &RecommendationIndex, ingredients: &[String], options: RecommendOptions) {
    let tokens: BTreeSet<_> = ingredients
        .iter()
        .map(|i| normalize_with(i, NormalizeMode::Corpus))
        .filter(|t| !t.is_empty())
        .collect();

    let results = index.recommend(&tokens, options);
    if results.is_empty() {
        println!("No matching recipes.");
        return;
    }

    for (rank, result) in results.iter().enumerate() {
        println!(
            "{}. {} (score {:.1})",
            rank + 1,
            result.record.name(),
            result.score
        );
        println!("   have:    {}", join(&result.overlap));
        if !result.missing.is_empty() {
            println!("   missing: {}", join(&result.missing));
        }
    }
}
