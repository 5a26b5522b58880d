use thiserror::Error;

use crate::llm::LlmError;

/// Failure of a recipe- or image-producing collaborator.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Collaborator unavailable: {0}")]
    Unavailable(String),

    #[error("Collaborator returned an unusable response: {0}")]
    Malformed(String),
}

impl From<LlmError> for SourceError {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::ParseError(msg) => SourceError::Malformed(msg),
            other => SourceError::Unavailable(other.to_string()),
        }
    }
}

/// Errors surfaced by the assistant core.
///
/// None of these terminate a turn: the assistant translates each one into a
/// plain-language reply.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Only {got} of {wanted} distinct recipes could be produced")]
    GenerationShortfall { wanted: usize, got: usize },

    #[error(transparent)]
    CollaboratorUnavailable(#[from] SourceError),

    #[error("{what} has {attempted} entries, platform limit is {limit}")]
    PlatformLimitExceeded {
        what: &'static str,
        attempted: usize,
        limit: usize,
    },
}

#[derive(Error, Debug)]
pub enum CorpusError {
    #[error("Failed to read corpus file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid corpus JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
}
