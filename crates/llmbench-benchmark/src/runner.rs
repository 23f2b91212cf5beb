use std::io::Write;

use llmbench_core::{format_measurement, AveragedReport, LlmBenchError, ModelStatsBucket, Result};
use tracing::{debug, info, instrument, warn};

use crate::client::InferenceClient;
use crate::echo::Echo;
use crate::recorder::{RunFailure, RunRecorder};

/// What to benchmark. Passed explicitly to [`BenchmarkRunner::run`].
///
/// Duplicate model names are run as independent entries, each with its own
/// bucket and report.
#[derive(Debug, Clone)]
pub struct BenchmarkPlan {
    pub models: Vec<String>,
    pub prompts: Vec<String>,
    pub repeats: u32,
    pub verbose: bool,
}

impl BenchmarkPlan {
    pub fn validate(&self) -> Result<()> {
        if self.models.is_empty() {
            return Err(LlmBenchError::InvalidInput("no models selected".into()));
        }
        if self.models.iter().any(|m| m.trim().is_empty()) {
            return Err(LlmBenchError::InvalidInput("model names must not be empty".into()));
        }
        if self.prompts.is_empty() {
            return Err(LlmBenchError::InvalidInput("no prompts provided".into()));
        }
        if self.repeats == 0 {
            return Err(LlmBenchError::InvalidInput("repeats must be greater than 0".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct BenchmarkOutcome {
    /// One report per model with at least one successful run, in plan order.
    pub reports: Vec<AveragedReport>,
    pub failures: Vec<RunFailure>,
    /// Models left out because every run failed.
    pub skipped_models: Vec<String>,
}

impl BenchmarkOutcome {
    pub fn warnings(&self) -> Vec<String> {
        self.skipped_models
            .iter()
            .map(|model| format!("All runs failed for model {model}; it was excluded from the report"))
            .collect()
    }
}

pub struct BenchmarkRunner<C> {
    recorder: RunRecorder<C>,
}

impl<C: InferenceClient> BenchmarkRunner<C> {
    pub fn new(client: C) -> Self {
        Self {
            recorder: RunRecorder::new(client),
        }
    }

    pub fn client(&self) -> &C {
        self.recorder.client()
    }

    /// Runs every model × repeat × prompt strictly in sequence.
    ///
    /// Individual run failures are collected and never abort the benchmark.
    /// Verbose output goes to `out` on a best-effort basis. Only an unusable
    /// plan is returned as an error.
    #[instrument(skip_all, fields(models = plan.models.len(), prompts = plan.prompts.len(), repeats = plan.repeats))]
    pub async fn run<W: Write>(&self, plan: &BenchmarkPlan, out: &mut W) -> Result<BenchmarkOutcome> {
        plan.validate()?;
        info!("Starting benchmark");

        let mut outcome = BenchmarkOutcome::default();
        let mut echo = Echo::new(out, plan.verbose);

        for model in &plan.models {
            let bucket = self.run_model(model, plan, &mut echo, &mut outcome.failures).await?;
            debug!(model = %bucket.model(), measurements = bucket.len(), "Reducing bucket");

            match bucket.reduce() {
                Some(report) => {
                    info!(model = %model, runs = report.runs, avg_response_rate = report.avg_response_rate, "Model complete");
                    outcome.reports.push(report);
                }
                None => {
                    warn!(model = %model, "All runs failed; excluding model from report");
                    outcome.skipped_models.push(model.clone());
                }
            }
        }

        info!(
            reports = outcome.reports.len(),
            failures = outcome.failures.len(),
            "Benchmark complete"
        );
        Ok(outcome)
    }

    async fn run_model<W: Write>(
        &self,
        model: &str,
        plan: &BenchmarkPlan,
        echo: &mut Echo<W>,
        failures: &mut Vec<RunFailure>,
    ) -> Result<ModelStatsBucket> {
        info!(model = %model, "Benchmarking model");
        let mut bucket = ModelStatsBucket::new(model);

        for repeat in 0..plan.repeats {
            for prompt in &plan.prompts {
                debug!(model = %model, repeat = repeat + 1, total = plan.repeats, "Run");

                echo.write(&format!("\n\nBenchmarking: {model}\nPrompt: {prompt}\nResponse:\n"));

                match self.recorder.record(model, prompt, plan.verbose, echo).await {
                    Ok(measurement) => {
                        if echo.is_enabled() {
                            echo.write(&format!("\n{}", format_measurement(&measurement)));
                        }
                        bucket.append(measurement)?;
                    }
                    Err(failure) => {
                        warn!(model = %model, error = %failure.cause, "Run failed");
                        failures.push(failure);
                    }
                }
            }
        }

        Ok(bucket)
    }
}
