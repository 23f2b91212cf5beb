use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;
use llmbench_core::{InferenceMetadata, Result};

/// One item produced by an inference call.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamChunk {
    Content(String),
    /// Terminal record carrying timing and token counts.
    Done(InferenceMetadata),
}

pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<StreamChunk>> + Send>>;

#[async_trait]
pub trait InferenceClient: Send + Sync {
    /// Send `prompt` to `model`. With `stream` unset the whole response arrives
    /// as a single `Content` chunk; either way the stream ends with `Done`.
    async fn generate(&self, model: &str, prompt: &str, stream: bool) -> Result<ChunkStream>;
}
