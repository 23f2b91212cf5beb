use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use futures::{stream, Stream, StreamExt};
use llmbench_core::{InferenceMetadata, LlmBenchError, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::client::{ChunkStream, InferenceClient, StreamChunk};

const NANOS_PER_SEC: f64 = 1_000_000_000.0;

#[derive(Debug, Clone)]
pub struct OllamaClient {
    host: String,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    models: Vec<TagModel>,
}

#[derive(Debug, Deserialize)]
struct TagModel {
    name: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    message: Option<ResponseMessage>,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(flatten)]
    metrics: OllamaMetrics,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: String,
}

/// Raw metrics from the final chat response. Durations are nanoseconds.
#[derive(Debug, Clone, Default, Deserialize)]
struct OllamaMetrics {
    #[serde(default)]
    load_duration: u64,
    #[serde(default)]
    prompt_eval_count: Option<u64>,
    #[serde(default)]
    prompt_eval_duration: u64,
    #[serde(default)]
    eval_count: u64,
    #[serde(default)]
    eval_duration: u64,
}

impl OllamaMetrics {
    fn into_metadata(self, model: &str) -> InferenceMetadata {
        let prompt_eval_count = self.prompt_eval_count.unwrap_or_else(|| {
            // Ollama omits the count when the prompt was served from cache
            warn!(model = %model, "Prompt token count was not provided, potentially due to prompt caching");
            0
        });

        InferenceMetadata {
            load_duration: nanos_to_secs(self.load_duration),
            prompt_eval_duration: nanos_to_secs(self.prompt_eval_duration),
            prompt_eval_count,
            eval_duration: nanos_to_secs(self.eval_duration),
            eval_count: self.eval_count,
        }
    }
}

fn nanos_to_secs(nanos: u64) -> f64 {
    nanos as f64 / NANOS_PER_SEC
}

impl OllamaClient {
    pub fn new(host: &str) -> Self {
        Self {
            host: host.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    pub fn with_timeout(host: &str, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(|e| LlmBenchError::Http(e.to_string()))?;

        Ok(Self {
            host: host.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    #[instrument(skip(self), fields(host = %self.host))]
    pub async fn list_models(&self) -> Result<Vec<String>> {
        let url = format!("{}/api/tags", self.host);
        debug!("Fetching models from Ollama API");

        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| self.map_reqwest_error(e))?;

        if !resp.status().is_success() {
            return Err(LlmBenchError::Ollama(format!(
                "Failed to list models: {}",
                resp.status()
            )));
        }

        let tags: TagsResponse = resp.json().await.map_err(|e| self.map_reqwest_error(e))?;
        info!(count = tags.models.len(), "Fetched models from Ollama");
        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }

    fn map_reqwest_error(&self, e: reqwest::Error) -> LlmBenchError {
        if e.is_connect() {
            return LlmBenchError::Unreachable(self.host.clone());
        }
        if e.is_timeout() {
            return LlmBenchError::Timeout(e.to_string());
        }
        LlmBenchError::Http(e.to_string())
    }
}

#[async_trait]
impl InferenceClient for OllamaClient {
    #[instrument(skip(self, prompt), fields(host = %self.host))]
    async fn generate(&self, model: &str, prompt: &str, stream: bool) -> Result<ChunkStream> {
        let url = format!("{}/api/chat", self.host);

        let request = ChatRequest {
            model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            stream,
        };

        let resp = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.map_reqwest_error(e))?;

        let status = resp.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(LlmBenchError::ModelNotFound(model.to_string()));
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(LlmBenchError::Ollama(format!(
                "Chat failed: {} - {}",
                status,
                &body[..floor_char_boundary(&body, 500)]
            )));
        }

        if !stream {
            let body = resp.bytes().await.map_err(|e| self.map_reqwest_error(e))?;
            let mut decoder = NdjsonDecoder::new(model);
            let mut chunks = decoder.push(&body);
            chunks.extend(decoder.finish());
            return Ok(Box::pin(stream::iter(chunks)));
        }

        let host = self.host.clone();
        let body = resp.bytes_stream().map(move |r| {
            r.map_err(|e| {
                if e.is_timeout() {
                    LlmBenchError::Timeout(e.to_string())
                } else if e.is_connect() {
                    LlmBenchError::Unreachable(host.clone())
                } else {
                    LlmBenchError::Http(e.to_string())
                }
            })
        });

        Ok(decode_ndjson(Box::pin(body), model))
    }
}

fn floor_char_boundary(s: &str, max: usize) -> usize {
    if s.len() <= max {
        return s.len();
    }
    (0..=max).rev().find(|&i| s.is_char_boundary(i)).unwrap_or(0)
}

/// Splits newline-delimited chat responses into chunks. Lines may arrive
/// split across any number of body chunks.
struct NdjsonDecoder {
    model: String,
    buf: Vec<u8>,
}

impl NdjsonDecoder {
    fn new(model: &str) -> Self {
        Self {
            model: model.to_string(),
            buf: Vec::new(),
        }
    }

    fn push(&mut self, bytes: &[u8]) -> Vec<Result<StreamChunk>> {
        self.buf.extend_from_slice(bytes);

        let mut out = Vec::new();
        while let Some(pos) = self.buf.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buf.drain(..=pos).collect();
            self.decode_line(&line, &mut out);
        }
        out
    }

    fn finish(&mut self) -> Vec<Result<StreamChunk>> {
        let rest = std::mem::take(&mut self.buf);
        let mut out = Vec::new();
        self.decode_line(&rest, &mut out);
        out
    }

    fn decode_line(&self, line: &[u8], out: &mut Vec<Result<StreamChunk>>) {
        let text = String::from_utf8_lossy(line);
        let text = text.trim();
        if text.is_empty() {
            return;
        }

        let resp: ChatResponse = match serde_json::from_str(text) {
            Ok(resp) => resp,
            Err(e) => {
                out.push(Err(LlmBenchError::Json(e)));
                return;
            }
        };

        if let Some(error) = resp.error {
            out.push(Err(error_for(&self.model, error)));
            return;
        }

        if let Some(content) = resp.message.map(|m| m.content).filter(|c| !c.is_empty()) {
            out.push(Ok(StreamChunk::Content(content)));
        }

        if resp.done {
            out.push(Ok(StreamChunk::Done(resp.metrics.into_metadata(&self.model))));
        }
    }
}

fn error_for(model: &str, message: String) -> LlmBenchError {
    if message.contains("not found") {
        return LlmBenchError::ModelNotFound(model.to_string());
    }
    LlmBenchError::Ollama(message)
}

struct DecodeState<S> {
    body: S,
    decoder: NdjsonDecoder,
    pending: VecDeque<Result<StreamChunk>>,
    finished: bool,
}

fn decode_ndjson<S, B>(body: S, model: &str) -> ChunkStream
where
    S: Stream<Item = Result<B>> + Unpin + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
{
    let state = DecodeState {
        body,
        decoder: NdjsonDecoder::new(model),
        pending: VecDeque::new(),
        finished: false,
    };

    Box::pin(stream::unfold(state, |mut st| async move {
        loop {
            if let Some(item) = st.pending.pop_front() {
                return Some((item, st));
            }
            if st.finished {
                return None;
            }
            match st.body.next().await {
                Some(Ok(bytes)) => {
                    let chunks = st.decoder.push(bytes.as_ref());
                    st.pending.extend(chunks);
                }
                Some(Err(e)) => {
                    st.finished = true;
                    st.pending.push_back(Err(e));
                }
                None => {
                    st.finished = true;
                    let chunks = st.decoder.finish();
                    st.pending.extend(chunks);
                }
            }
        }
    }))
}
