use std::collections::HashMap;
use std::io::{self, Write};
use std::sync::Mutex;

use async_trait::async_trait;
use futures::stream;
use llmbench_core::{InferenceMetadata, LlmBenchError, Result};

use crate::client::{ChunkStream, InferenceClient, StreamChunk};

/// What the scripted client does for a given model.
#[derive(Clone)]
pub enum Script {
    Reply {
        text: String,
        meta: InferenceMetadata,
    },
    /// Successive calls for the model replay these in order, wrapping around.
    Sequence(Vec<InferenceMetadata>),
    NotFound,
    Unreachable,
    /// Content with no terminal metadata record.
    Truncated,
}

/// In-memory `InferenceClient` that replays a fixed script per model and
/// records every call it receives.
#[derive(Default)]
pub struct ScriptedClient {
    scripts: HashMap<String, Script>,
    calls: Mutex<Vec<(String, String, bool)>>,
}

impl ScriptedClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, model: &str, script: Script) -> Self {
        self.scripts.insert(model.to_string(), script);
        self
    }

    pub fn calls(&self) -> Vec<(String, String, bool)> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

pub fn reply(text: &str, meta: InferenceMetadata) -> Script {
    Script::Reply {
        text: text.to_string(),
        meta,
    }
}

pub fn meta(prompt_tokens: u64, prompt_secs: f64, response_tokens: u64, response_secs: f64) -> InferenceMetadata {
    InferenceMetadata {
        load_duration: 0.0,
        prompt_eval_duration: prompt_secs,
        prompt_eval_count: prompt_tokens,
        eval_duration: response_secs,
        eval_count: response_tokens,
    }
}

#[async_trait]
impl InferenceClient for ScriptedClient {
    async fn generate(&self, model: &str, prompt: &str, stream: bool) -> Result<ChunkStream> {
        let previous = match self.calls.lock() {
            Ok(mut calls) => {
                let previous = calls.iter().filter(|(m, _, _)| m == model).count();
                calls.push((model.to_string(), prompt.to_string(), stream));
                previous
            }
            Err(_) => 0,
        };

        let script = self
            .scripts
            .get(model)
            .cloned()
            .unwrap_or(Script::NotFound);

        let chunks: Vec<Result<StreamChunk>> = match script {
            Script::NotFound => return Err(LlmBenchError::ModelNotFound(model.to_string())),
            Script::Unreachable => return Err(LlmBenchError::Unreachable("http://localhost:11434".to_string())),
            Script::Truncated => vec![Ok(StreamChunk::Content("partial".to_string()))],
            Script::Sequence(metas) if metas.is_empty() => vec![],
            Script::Sequence(metas) => vec![
                Ok(StreamChunk::Content("ok".to_string())),
                Ok(StreamChunk::Done(metas[previous % metas.len()].clone())),
            ],
            Script::Reply { text, meta } if stream => text
                .split_inclusive(' ')
                .map(|word| Ok(StreamChunk::Content(word.to_string())))
                .chain(std::iter::once(Ok(StreamChunk::Done(meta))))
                .collect(),
            Script::Reply { text, meta } => vec![
                Ok(StreamChunk::Content(text)),
                Ok(StreamChunk::Done(meta)),
            ],
        };

        Ok(Box::pin(stream::iter(chunks)))
    }
}

/// `Write` sink that accepts `ok_writes` writes and then fails every call.
#[derive(Debug, Default)]
pub struct BrokenAfter {
    ok_writes: usize,
    pub attempts: usize,
    pub written: Vec<u8>,
}

impl BrokenAfter {
    pub fn new(ok_writes: usize) -> Self {
        Self {
            ok_writes,
            ..Self::default()
        }
    }
}

impl Write for BrokenAfter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.attempts += 1;
        if self.attempts > self.ok_writes {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"));
        }
        self.written.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
