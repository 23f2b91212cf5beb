pub mod client;
pub mod echo;
pub mod ollama;
pub mod recorder;
pub mod runner;

pub use client::{ChunkStream, InferenceClient, StreamChunk};
pub use echo::Echo;
pub use ollama::OllamaClient;
pub use recorder::{RunFailure, RunRecorder};
pub use runner::{BenchmarkOutcome, BenchmarkPlan, BenchmarkRunner};

#[cfg(test)]
pub(crate) mod testing;
