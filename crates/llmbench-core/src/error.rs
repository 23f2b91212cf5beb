use thiserror::Error;

#[derive(Error, Debug)]
pub enum LlmBenchError {
    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Ollama unreachable at {0} - is Ollama running?")]
    Unreachable(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Ollama error: {0}")]
    Ollama(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("No response received from Ollama for model {0}")]
    IncompleteResponse(String),

    #[error("Measurement for model {found} appended to bucket for {expected}")]
    ModelMismatch { expected: String, found: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, LlmBenchError>;
