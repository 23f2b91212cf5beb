pub mod config;
pub mod error;
pub mod measurement;
pub mod report;
pub mod stats;

pub use config::{DefaultsConfig, LlmBenchConfig, OllamaConfig, DEFAULT_OLLAMA_HOST};
pub use error::{LlmBenchError, Result};
pub use measurement::{InferenceMetadata, Measurement};
pub use report::{format_csv, format_json, format_measurement, format_reports};
pub use stats::{AveragedReport, ModelStatsBucket};
