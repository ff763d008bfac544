use serde::{Deserialize, Deserializer, Serialize};

/// Handle returned when the engine accepts a job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobHandle {
    pub job_name: String,
}

/// Lifecycle of a remote job as tracked on a board.
///
/// `Error` is local: the last status query itself failed and will be retried.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Pending,
    Running,
    Completed,
    Failed,
    Error,
    #[default]
    #[serde(other)]
    Unknown,
}

impl JobState {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobState::Pending => "pending",
            JobState::Running => "running",
            JobState::Completed => "completed",
            JobState::Failed => "failed",
            JobState::Error => "error",
            JobState::Unknown => "unknown",
        }
    }

    /// Completed and failed jobs are never polled again
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Completed | JobState::Failed)
    }
}

impl std::fmt::Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobStatusResponse {
    #[serde(default)]
    pub status: JobState,
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub end_time: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Task-specific submission parameters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskParams {
    /// Required by match tasks, ignored otherwise
    #[serde(default)]
    pub prompt: Option<String>,
    /// Benchmark suite selection; the engine default applies when empty
    #[serde(default)]
    pub eval_tasks: Vec<String>,
}

/// Entry of `myxboard/list`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardSummary {
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub models: Vec<String>,
}

/// Treats an explicit JSON `null` like a missing field
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_state_serialization() {
        let json = serde_json::to_string(&JobState::Completed).unwrap();
        assert_eq!(json, r#""completed""#);

        let state: JobState = serde_json::from_str(r#""running""#).unwrap();
        assert_eq!(state, JobState::Running);

        let state: JobState = serde_json::from_str(r#""queued_somewhere""#).unwrap();
        assert_eq!(state, JobState::Unknown);
    }

    #[test]
    fn test_job_state_terminal() {
        assert!(JobState::Completed.is_terminal());
        assert!(JobState::Failed.is_terminal());
        assert!(!JobState::Error.is_terminal());
        assert!(!JobState::Unknown.is_terminal());
        assert!(!JobState::Pending.is_terminal());
    }

    #[test]
    fn test_job_status_response_defaults() {
        let resp: JobStatusResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(resp.status, JobState::Unknown);
        assert!(resp.start_time.is_none());

        let resp: JobStatusResponse =
            serde_json::from_str(r#"{"status": "completed", "end_time": "2024-10-01T12:00:00Z"}"#)
                .unwrap();
        assert_eq!(resp.status, JobState::Completed);
        assert_eq!(resp.end_time.as_deref(), Some("2024-10-01T12:00:00Z"));
    }

    #[test]
    fn test_board_summary_null_models() {
        let summary: BoardSummary =
            serde_json::from_str(r#"{"name": "board", "models": null}"#).unwrap();
        assert!(summary.models.is_empty());
    }
}
