use serde::{Deserialize, Serialize};

use crate::{LlmBenchError, Measurement, Result};

/// Measurements collected for a single model across repeated runs, in run order.
#[derive(Debug, Clone, Default)]
pub struct ModelStatsBucket {
    model: String,
    measurements: Vec<Measurement>,
}

/// Averages over every measurement in a bucket.
///
/// Rates are the mean of per-run rates, so each run carries equal weight
/// regardless of how many tokens it produced. A run with a zero denominator
/// is left out of that one rate but still counts toward token and time means.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AveragedReport {
    pub model: String,
    pub runs: usize,
    pub avg_prompt_eval_rate: f64,
    pub avg_response_rate: f64,
    pub avg_total_rate: f64,
    pub avg_prompt_tokens: f64,
    pub avg_response_tokens: f64,
    pub avg_load_time: f64,
    pub avg_prompt_eval_time: f64,
    pub avg_response_time: f64,
    pub avg_total_time: f64,
}

impl ModelStatsBucket {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            measurements: Vec::new(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn measurements(&self) -> &[Measurement] {
        &self.measurements
    }

    pub fn len(&self) -> usize {
        self.measurements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.measurements.is_empty()
    }

    pub fn append(&mut self, measurement: Measurement) -> Result<()> {
        if measurement.model.trim().is_empty() {
            return Err(LlmBenchError::InvalidInput("measurement has an empty model name".into()));
        }
        if measurement.model != self.model {
            return Err(LlmBenchError::ModelMismatch {
                expected: self.model.clone(),
                found: measurement.model,
            });
        }
        self.measurements.push(measurement);
        Ok(())
    }

    /// Returns `None` for an empty bucket, which callers treat as
    /// "leave this model out of the report".
    pub fn reduce(&self) -> Option<AveragedReport> {
        if self.measurements.is_empty() {
            return None;
        }

        let ms = &self.measurements;

        Some(AveragedReport {
            model: self.model.clone(),
            runs: ms.len(),
            avg_prompt_eval_rate: mean_or_zero(ms.iter().filter_map(Measurement::prompt_eval_rate)),
            avg_response_rate: mean_or_zero(ms.iter().filter_map(Measurement::response_rate)),
            avg_total_rate: mean_or_zero(ms.iter().filter_map(Measurement::total_rate)),
            avg_prompt_tokens: mean_or_zero(ms.iter().map(|m| m.prompt_tokens as f64)),
            avg_response_tokens: mean_or_zero(ms.iter().map(|m| m.response_tokens as f64)),
            avg_load_time: mean_or_zero(ms.iter().map(|m| m.load_time)),
            avg_prompt_eval_time: mean_or_zero(ms.iter().map(|m| m.prompt_eval_time)),
            avg_response_time: mean_or_zero(ms.iter().map(|m| m.response_time)),
            avg_total_time: mean_or_zero(ms.iter().map(Measurement::total_time)),
        })
    }
}

fn mean_or_zero(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, n) = values.fold((0.0, 0usize), |(sum, n), v| (sum + v, n + 1));
    if n == 0 {
        return 0.0;
    }
    sum / n as f64
}
