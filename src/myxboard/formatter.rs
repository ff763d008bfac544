//! Normalizes raw evaluation payloads into the stored result schema
//!
//! Every task kind has its own raw shape on the engine side. The board only
//! ever stores [`FormattedResult`] entries, one per model:
//!
//! ```text
//! { config_general: { model_name, start_time, end_time },
//!   results:        { "myxmatch|general|0": { rank } } | { <metric>: value },
//!   details:        { full_prompt | eval_tasks, execution_time, run_id, evaluation_type } }
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use tracing::{debug, warn};

use super::task::EvaluationTask;
use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigGeneral {
    pub model_name: String,
    pub start_time: String,
    pub end_time: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eval_tasks: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_time: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,
    pub evaluation_type: EvaluationTask,
}

/// One model's normalized result for one task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormattedResult {
    pub config_general: ConfigGeneral,
    pub results: BTreeMap<String, Value>,
    pub details: ResultDetails,
}

impl FormattedResult {
    pub fn model_name(&self) -> &str {
        &self.config_general.model_name
    }

    /// Rank reported by a match evaluation, if this entry carries one
    pub fn rank(&self) -> Option<i64> {
        self.results
            .get(&match_key(self.details.evaluation_type))
            .and_then(|r| r.get("rank"))
            .and_then(rank_from_value)
    }
}

fn match_key(task: EvaluationTask) -> String {
    format!("{}|general|0", task.as_str())
}

/// Ranks arrive as integers or as whole floats (`1.0`)
fn rank_from_value(value: &Value) -> Option<i64> {
    value.as_i64().or_else(|| {
        value
            .as_f64()
            .filter(|f| f.is_finite())
            .map(|f| f.round() as i64)
    })
}

fn deserialize_rank<'de, D>(deserializer: D) -> std::result::Result<i64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    rank_from_value(&value)
        .ok_or_else(|| serde::de::Error::custom(format!("rank must be a number, got {}", value)))
}

#[derive(Debug, Clone, Deserialize)]
pub struct MatchEntry {
    pub model: String,
    #[serde(deserialize_with = "deserialize_rank")]
    pub rank: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MatchPayload {
    pub models: Vec<MatchEntry>,
    #[serde(default)]
    pub prompt: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BenchmarkEntry {
    pub model: String,
    #[serde(default)]
    pub metrics: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BenchmarkPayload {
    pub results: Vec<BenchmarkEntry>,
    #[serde(default)]
    pub eval_tasks: Vec<String>,
    #[serde(default)]
    pub execution_time: Option<f64>,
    #[serde(default)]
    pub run_id: Option<String>,
}

/// Raw payload tagged by the task kind that produced it
#[derive(Debug, Clone)]
pub enum RawResult {
    Match(MatchPayload),
    Benchmark(BenchmarkPayload),
}

impl RawResult {
    /// Decode a raw payload for `task`.
    ///
    /// Returns `None` when the payload lacks the top-level key for its kind or
    /// the entries under it are malformed.
    pub fn parse(task: EvaluationTask, payload: &Value) -> Option<Self> {
        let key = match task {
            EvaluationTask::MyxMatch => "models",
            EvaluationTask::Benchmark => "results",
        };
        if payload.get(key).is_none() {
            warn!(task = %task, key, "evaluation payload is missing its result key");
            return None;
        }

        let parsed = match task {
            EvaluationTask::MyxMatch => {
                serde_json::from_value(payload.clone()).map(RawResult::Match)
            }
            EvaluationTask::Benchmark => {
                serde_json::from_value(payload.clone()).map(RawResult::Benchmark)
            }
        };
        match parsed {
            Ok(raw) => Some(raw),
            Err(e) => {
                warn!(task = %task, error = %e, "malformed evaluation payload");
                None
            }
        }
    }

    pub fn format(&self, start_time: &str, end_time: &str) -> Vec<FormattedResult> {
        let config = |model: &str| ConfigGeneral {
            model_name: model.to_string(),
            start_time: start_time.to_string(),
            end_time: end_time.to_string(),
        };

        match self {
            RawResult::Match(payload) => {
                let key = match_key(EvaluationTask::MyxMatch);
                payload
                    .models
                    .iter()
                    .map(|entry| {
                        debug!(model = %entry.model, rank = entry.rank, "formatting match result");
                        FormattedResult {
                            config_general: config(&entry.model),
                            results: BTreeMap::from([(key.clone(), json!({ "rank": entry.rank }))]),
                            details: ResultDetails {
                                full_prompt: Some(payload.prompt.clone()),
                                eval_tasks: None,
                                execution_time: None,
                                run_id: None,
                                evaluation_type: EvaluationTask::MyxMatch,
                            },
                        }
                    })
                    .collect()
            }
            RawResult::Benchmark(payload) => payload
                .results
                .iter()
                .map(|entry| FormattedResult {
                    config_general: config(&entry.model),
                    results: entry
                        .metrics
                        .iter()
                        .map(|(k, v)| (k.clone(), sanitize_metric(v)))
                        .collect(),
                    details: ResultDetails {
                        full_prompt: None,
                        eval_tasks: Some(payload.eval_tasks.clone()),
                        execution_time: payload.execution_time,
                        run_id: payload.run_id.clone(),
                        evaluation_type: EvaluationTask::Benchmark,
                    },
                })
                .collect(),
        }
    }
}

/// Normalize a raw payload for storage.
///
/// A payload without the expected shape yields an empty list; callers treat
/// that as "no results yet".
pub fn format_for_storage(
    task: EvaluationTask,
    payload: &Value,
    start_time: &str,
    end_time: &str,
) -> Vec<FormattedResult> {
    match RawResult::parse(task, payload) {
        Some(raw) => raw.format(start_time, end_time),
        None => Vec::new(),
    }
}

/// Same as [`format_for_storage`] for a task named by string
pub fn format_named(
    task_name: &str,
    payload: &Value,
    start_time: &str,
    end_time: &str,
) -> Result<Vec<FormattedResult>> {
    let task: EvaluationTask = task_name.parse()?;
    Ok(format_for_storage(task, payload, start_time, end_time))
}

/// Non-finite metric values are stored as 0.0.
///
/// This is lossy: a stored 0.0 may have been NaN or infinite on the engine side.
fn sanitize_metric(value: &Value) -> Value {
    match value {
        Value::Null => json!(0.0),
        Value::Number(n) => match n.as_f64() {
            Some(f) if !f.is_finite() => json!(0.0),
            _ => value.clone(),
        },
        Value::String(s) if is_non_finite_literal(s) => json!(0.0),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), sanitize_metric(v)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(sanitize_metric).collect()),
        _ => value.clone(),
    }
}

fn is_non_finite_literal(s: &str) -> bool {
    matches!(
        s.trim().to_ascii_lowercase().as_str(),
        "nan" | "-nan" | "inf" | "+inf" | "-inf" | "infinity" | "+infinity" | "-infinity"
    )
}
