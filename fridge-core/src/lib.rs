pub mod assistant;
pub mod config;
pub mod corpus;
pub mod error;
pub mod extract;
pub mod generate;
pub mod index;
pub mod intent;
pub mod inventory;
pub mod llm;
pub mod normalize;
pub mod paginate;
pub mod reply;
pub mod session;
pub mod source;
pub mod types;

pub use assistant::Assistant;
pub use config::{AssistantConfig, ConfigError, PlatformLimits, RecipeSourceKind, StepDelivery};
pub use corpus::{CorpusRecord, RecipeCorpus};
pub use error::{CoreError, CorpusError, SourceError};
pub use generate::{Accumulator, GenerationRequest, Orchestrator};
pub use index::{Recommendation, RecommendOptions, RecommendationIndex};
pub use intent::{FallbackPolicy, Intent, IntentClassifier};
pub use inventory::FridgeInventory;
pub use normalize::{normalize, normalize_with, AliasTable, NormalizeMode, NormalizedToken};
pub use paginate::{chunk, PageDelta};
pub use reply::{Artifact, QuickAction, RecipeCard, Reply, StepCard};
pub use session::{SessionStore, UserSession};
pub use source::{
    CorpusRecipeSource, ImageSource, LlmRecipeSource, NoImages, Produced, RecipeQuery,
    RecipeSource,
};
pub use types::{GenerationRound, Recipe, StepPrompt, StepView};
