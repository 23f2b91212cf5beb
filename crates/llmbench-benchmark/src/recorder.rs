use std::io::Write;

use futures::StreamExt;
use llmbench_core::{InferenceMetadata, LlmBenchError, Measurement};
use thiserror::Error;
use tracing::debug;

use crate::client::{InferenceClient, StreamChunk};
use crate::echo::Echo;

/// A single run that did not produce a measurement.
#[derive(Error, Debug)]
#[error("Run failed for model {model}: {cause}")]
pub struct RunFailure {
    pub model: String,
    pub prompt: String,
    #[source]
    pub cause: LlmBenchError,
}

/// Times one prompt against one model. Performs no retries.
pub struct RunRecorder<C> {
    client: C,
}

impl<C: InferenceClient> RunRecorder<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// With `verbose` set the response is streamed and each chunk is written
    /// to `echo` as it arrives. Echo failures never affect the measurement.
    pub async fn record<W: Write>(
        &self,
        model: &str,
        prompt: &str,
        verbose: bool,
        echo: &mut Echo<W>,
    ) -> std::result::Result<Measurement, RunFailure> {
        let fail = |cause: LlmBenchError| RunFailure {
            model: model.to_string(),
            prompt: prompt.to_string(),
            cause,
        };

        let mut chunks = self
            .client
            .generate(model, prompt, verbose)
            .await
            .map_err(fail)?;

        let mut metadata: Option<InferenceMetadata> = None;
        while let Some(chunk) = chunks.next().await {
            match chunk.map_err(fail)? {
                StreamChunk::Content(text) if verbose => echo.write(&text),
                StreamChunk::Content(_) => {}
                StreamChunk::Done(meta) => metadata = Some(meta),
            }
        }

        let metadata = metadata.ok_or_else(|| fail(LlmBenchError::IncompleteResponse(model.to_string())))?;
        let measurement = Measurement::from_metadata(model, prompt, &metadata);
        debug!(
            model = %model,
            response_tokens = measurement.response_tokens,
            response_time = measurement.response_time,
            "Run recorded"
        );
        Ok(measurement)
    }
}
