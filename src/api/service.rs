use async_trait::async_trait;
use serde_json::Value;

use super::types::{BoardSummary, JobHandle, JobStatusResponse, TaskParams};
use crate::error::Result;
use crate::myxboard::{BoardRecord, EvaluationTask};

/// Remote operations the MyxBoard lifecycle depends on.
///
/// Boards are addressed by their sanitized name. Implementations do not
/// retry; polling retries are driven by the board and orchestrator.
#[async_trait]
pub trait RemoteService: Send + Sync {
    /// Submit one evaluation job for `task` over `models`
    async fn submit_job(
        &self,
        task: EvaluationTask,
        board: &str,
        models: &[String],
        params: &TaskParams,
    ) -> Result<JobHandle>;

    async fn job_status(&self, job_name: &str) -> Result<JobStatusResponse>;

    /// Raw, task-kind-specific result payload
    async fn fetch_result(&self, task: EvaluationTask, board: &str) -> Result<Value>;

    async fn list_boards(&self) -> Result<Vec<BoardSummary>>;

    /// `None` when no board is stored under that name
    async fn get_board(&self, board: &str) -> Result<Option<BoardRecord>>;

    async fn create_board(&self, record: &BoardRecord) -> Result<()>;

    async fn update_board(&self, record: &BoardRecord) -> Result<()>;

    async fn delete_board(&self, board: &str) -> Result<()>;
}
