mod chat;
mod recommend;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use fridge_core::llm::create_provider_from_env;
use fridge_core::{
    normalize_with, Assistant, AssistantConfig, CorpusRecipeSource, LlmRecipeSource, NoImages,
    NormalizeMode, RecipeCorpus, RecipeSource, RecipeSourceKind, RecommendationIndex,
    StepDelivery,
};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser)]
#[command(name = "fridge")]
#[command(about = "Recipes from whatever is in your fridge", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Chat with the assistant in the terminal
    Chat {
        /// User id the conversation is stored under
        #[arg(long, default_value = "local")]
        user: String,
        /// Recipe source: corpus or llm (default: FRIDGE_RECIPE_SOURCE, then corpus)
        #[arg(long)]
        source: Option<RecipeSourceKind>,
        /// Step delivery: browse or one_shot (default: FRIDGE_STEP_DELIVERY, then browse)
        #[arg(long)]
        step_delivery: Option<StepDelivery>,
        /// Recipe corpus JSON file (default: the bundled corpus)
        #[arg(long, env = "FRIDGE_CORPUS")]
        corpus: Option<PathBuf>,
        /// Print replies as JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Rank corpus recipes against a list of ingredients
    Recommend {
        /// Ingredients you have
        #[arg(required = true)]
        ingredients: Vec<String>,
        #[arg(long, default_value_t = 5)]
        top_k: usize,
        #[arg(long, default_value_t = 3)]
        max_missing: usize,
        #[arg(long, default_value_t = 1)]
        min_overlap: usize,
        /// Only recipes that need nothing you don't have
        #[arg(long)]
        strict: bool,
        /// Recipe corpus JSON file (default: the bundled corpus)
        #[arg(long, env = "FRIDGE_CORPUS")]
        corpus: Option<PathBuf>,
    },
    /// Print the normalized token for each argument
    Normalize {
        #[arg(required = true)]
        texts: Vec<String>,
        /// Also strip quantities and units
        #[arg(long)]
        corpus: bool,
    },
}

/// Console logging to stderr, filtered by RUST_LOG (default: warn).
fn init_logging() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    let fmt_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}

fn load_corpus(path: Option<&Path>) -> Result<RecipeCorpus> {
    match path {
        Some(path) => RecipeCorpus::from_path(path)
            .with_context(|| format!("Failed to load corpus from {}", path.display())),
        None => RecipeCorpus::bundled().context("Failed to load bundled corpus"),
    }
}

fn build_assistant(config: AssistantConfig, corpus: Option<&Path>) -> Result<Assistant> {
    let source: Arc<dyn RecipeSource> = match config.recipe_source {
        RecipeSourceKind::Corpus => {
            let index = RecommendationIndex::new(load_corpus(corpus)?);
            Arc::new(CorpusRecipeSource::new(index))
        }
        RecipeSourceKind::Llm => {
            let provider = create_provider_from_env().context("Failed to configure LLM provider")?;
            Arc::new(LlmRecipeSource::new(provider))
        }
    };

    tracing::info!(
        source = source.source_name(),
        recipes_per_round = config.recipes_per_round,
        "Starting assistant"
    );
    Assistant::new(config, source, Arc::new(NoImages)).context("Invalid configuration")
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Commands::Chat {
            user,
            source,
            step_delivery,
            corpus,
            json,
        } => {
            let mut config = AssistantConfig::from_env().context("Invalid configuration")?;
            if let Some(source) = source {
                config.recipe_source = source;
            }
            if let Some(step_delivery) = step_delivery {
                config.step_delivery = step_delivery;
            }
            let assistant = build_assistant(config, corpus.as_deref())?;
            chat::run(&assistant, &user, json).await?;
        }
        Commands::Recommend {
            ingredients,
            top_k,
            max_missing,
            min_overlap,
            strict,
            corpus,
        } => {
            let index = RecommendationIndex::new(load_corpus(corpus.as_deref())?);
            let options = fridge_core::RecommendOptions {
                top_k,
                allow_missing: !strict,
                max_missing,
                min_overlap,
            };
            recommend::run(&index, &ingredients, options);
        }
        Commands::Normalize { texts, corpus } => {
            let mode = if corpus {
                NormalizeMode::Corpus
            } else {
                NormalizeMode::Plain
            };
            for text in texts {
                println!("{}\t{}", text, normalize_with(&text, mode));
            }
        }
    }

    Ok(())
}
