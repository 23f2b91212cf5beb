use serde::{Deserialize, Serialize};

/// Timing and token counts reported by the inference endpoint for one call.
///
/// Durations are in seconds; any unit conversion happens in the client.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InferenceMetadata {
    pub load_duration: f64,
    pub prompt_eval_duration: f64,
    pub prompt_eval_count: u64,
    pub eval_duration: f64,
    pub eval_count: u64,
}

/// One completed inference call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    pub model: String,
    pub prompt: String,
    pub prompt_tokens: u64,
    pub response_tokens: u64,
    pub load_time: f64,
    pub prompt_eval_time: f64,
    pub response_time: f64,
}

impl Measurement {
    pub fn from_metadata(model: &str, prompt: &str, meta: &InferenceMetadata) -> Self {
        Self {
            model: model.to_string(),
            prompt: prompt.to_string(),
            prompt_tokens: meta.prompt_eval_count,
            response_tokens: meta.eval_count,
            load_time: meta.load_duration.max(0.0),
            prompt_eval_time: meta.prompt_eval_duration.max(0.0),
            response_time: meta.eval_duration.max(0.0),
        }
    }

    pub fn total_time(&self) -> f64 {
        self.load_time + self.prompt_eval_time + self.response_time
    }

    pub fn prompt_eval_rate(&self) -> Option<f64> {
        rate(self.prompt_tokens, self.prompt_eval_time)
    }

    pub fn response_rate(&self) -> Option<f64> {
        rate(self.response_tokens, self.response_time)
    }

    pub fn total_rate(&self) -> Option<f64> {
        rate(self.response_tokens, self.total_time())
    }
}

/// Tokens per second, or `None` when the duration is zero.
fn rate(tokens: u64, secs: f64) -> Option<f64> {
    if secs <= 0.0 {
        return None;
    }
    Some(tokens as f64 / secs)
}
