use std::fmt::Write;

use crate::{AveragedReport, Measurement, Result};

const DIVIDER: &str = "----------------------------------------------------";

/// Values shared by the per-run and averaged layouts.
struct StatsBlock<'a> {
    model: &'a str,
    prompt_eval_rate: f64,
    response_rate: f64,
    total_rate: f64,
    prompt_tokens: u64,
    response_tokens: u64,
    load_time: f64,
    prompt_eval_time: f64,
    response_time: f64,
    total_time: f64,
}

impl<'a> From<&'a AveragedReport> for StatsBlock<'a> {
    fn from(r: &'a AveragedReport) -> Self {
        Self {
            model: &r.model,
            prompt_eval_rate: r.avg_prompt_eval_rate,
            response_rate: r.avg_response_rate,
            total_rate: r.avg_total_rate,
            prompt_tokens: r.avg_prompt_tokens.round() as u64,
            response_tokens: r.avg_response_tokens.round() as u64,
            load_time: r.avg_load_time,
            prompt_eval_time: r.avg_prompt_eval_time,
            response_time: r.avg_response_time,
            total_time: r.avg_total_time,
        }
    }
}

impl<'a> From<&'a Measurement> for StatsBlock<'a> {
    fn from(m: &'a Measurement) -> Self {
        Self {
            model: &m.model,
            prompt_eval_rate: m.prompt_eval_rate().unwrap_or(0.0),
            response_rate: m.response_rate().unwrap_or(0.0),
            total_rate: m.total_rate().unwrap_or(0.0),
            prompt_tokens: m.prompt_tokens,
            response_tokens: m.response_tokens,
            load_time: m.load_time,
            prompt_eval_time: m.prompt_eval_time,
            response_time: m.response_time,
            total_time: m.total_time(),
        }
    }
}

impl StatsBlock<'_> {
    fn write_to(&self, out: &mut String) {
        // writing into a String cannot fail
        let _ = writeln!(out, "{DIVIDER}");
        let _ = writeln!(out, "{}", self.model);
        let _ = writeln!(out, "\tPrompt eval: {:.2} t/s", self.prompt_eval_rate);
        let _ = writeln!(out, "\tResponse: {:.2} t/s", self.response_rate);
        let _ = writeln!(out, "\tTotal: {:.2} t/s", self.total_rate);
        let _ = writeln!(out);
        let _ = writeln!(out, "Stats:");
        let _ = writeln!(out, "\tPrompt tokens: {}", self.prompt_tokens);
        let _ = writeln!(out, "\tResponse tokens: {}", self.response_tokens);
        let _ = writeln!(out, "\tModel load time: {:.2}s", self.load_time);
        let _ = writeln!(out, "\tPrompt eval time: {:.2}s", self.prompt_eval_time);
        let _ = writeln!(out, "\tResponse time: {:.2}s", self.response_time);
        let _ = writeln!(out, "\tTotal time: {:.2}s", self.total_time);
        let _ = writeln!(out, "{DIVIDER}");
    }
}

/// Render averaged reports in the order given. Empty input renders to an empty string.
pub fn format_reports(reports: &[AveragedReport]) -> String {
    let mut out = String::new();
    for report in reports {
        out.push_str("Average stats:\n");
        StatsBlock::from(report).write_to(&mut out);
        out.push('\n');
    }
    out
}

/// Render a single run using the same block layout as the averaged report.
pub fn format_measurement(measurement: &Measurement) -> String {
    let mut out = String::new();
    StatsBlock::from(measurement).write_to(&mut out);
    out
}

pub fn format_json(reports: &[AveragedReport]) -> Result<String> {
    Ok(serde_json::to_string_pretty(reports)?)
}

pub fn format_csv(reports: &[AveragedReport]) -> String {
    let mut out = String::from(
        "model,runs,prompt_eval_tps,response_tps,total_tps,prompt_tokens,response_tokens,\
         load_s,prompt_eval_s,response_s,total_s\n",
    );
    for r in reports {
        let _ = writeln!(
            out,
            "{},{},{:.2},{:.2},{:.2},{},{},{:.2},{:.2},{:.2},{:.2}",
            csv_field(&r.model),
            r.runs,
            r.avg_prompt_eval_rate,
            r.avg_response_rate,
            r.avg_total_rate,
            r.avg_prompt_tokens.round() as u64,
            r.avg_response_tokens.round() as u64,
            r.avg_load_time,
            r.avg_prompt_eval_time,
            r.avg_response_time,
            r.avg_total_time,
        );
    }
    out
}

fn csv_field(s: &str) -> String {
    if s.contains([',', '"', '\n']) {
        return format!("\"{}\"", s.replace('"', "\"\""));
    }
    s.to_string()
}
