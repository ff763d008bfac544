use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::formatter::FormattedResult;
use super::task::EvaluationTask;
use crate::api::types::{null_as_default, JobState};

/// Remote storage key for a board name
pub fn sanitize_board_name(name: &str) -> String {
    name.trim().replace('/', "--")
}

/// A tracked evaluation job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobEntry {
    pub job_name: String,
    pub status: JobState,
    pub start_time: DateTime<Utc>,
}

impl JobEntry {
    pub fn new(job_name: impl Into<String>, start_time: DateTime<Utc>) -> Self {
        Self {
            job_name: job_name.into(),
            status: JobState::Pending,
            start_time,
        }
    }
}

/// Full board snapshot as exchanged with the remote store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardRecord {
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub models: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub results: BTreeMap<EvaluationTask, Vec<FormattedResult>>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub job_status: BTreeMap<EvaluationTask, JobEntry>,
    #[serde(default)]
    pub from_hf_collection: bool,
    #[serde(default)]
    pub hf_collection_name: Option<String>,
}

impl BoardRecord {
    pub fn new(name: impl Into<String>, models: Vec<String>) -> Self {
        Self {
            name: name.into(),
            models,
            results: BTreeMap::new(),
            job_status: BTreeMap::new(),
            from_hf_collection: false,
            hf_collection_name: None,
        }
    }

    pub fn from_collection(collection: impl Into<String>, models: Vec<String>) -> Self {
        let collection = collection.into();
        Self {
            from_hf_collection: true,
            hf_collection_name: Some(collection.clone()),
            ..Self::new(collection, models)
        }
    }

    pub fn sanitized_name(&self) -> String {
        sanitize_board_name(&self.name)
    }
}
