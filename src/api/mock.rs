//! In-memory [`RemoteService`] for board and orchestrator tests

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::{HashMap, HashSet, VecDeque};
use std::time::Duration;

use super::service::RemoteService;
use super::types::{BoardSummary, JobHandle, JobState, JobStatusResponse, TaskParams};
use crate::error::{Error, Result};
use crate::myxboard::{BoardRecord, EvaluationTask};

#[derive(Default)]
struct MockState {
    boards: HashMap<String, BoardRecord>,
    statuses: HashMap<String, VecDeque<JobState>>,
    results: HashMap<EvaluationTask, Value>,
    submitted: Vec<(EvaluationTask, String, Vec<String>, TaskParams)>,
    failing_status_calls: usize,
    failing_updates: usize,
    invalid_fetches: usize,
    rejected_tasks: HashSet<EvaluationTask>,
    status_delay: Option<Duration>,
    status_calls: usize,
    creates: usize,
    updates: usize,
    next_job: usize,
}

#[derive(Default)]
pub(crate) struct MockService {
    state: Mutex<MockState>,
}

impl MockService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Statuses returned by successive polls of `job_name`; the last one repeats.
    /// Unscripted jobs report `running`.
    pub fn script_job(&self, job_name: &str, sequence: &[JobState]) {
        self.state
            .lock()
            .statuses
            .insert(job_name.to_string(), sequence.iter().copied().collect());
    }

    pub fn set_result(&self, task: EvaluationTask, payload: Value) {
        self.state.lock().results.insert(task, payload);
    }

    /// Make the next `n` status queries fail at the transport level
    pub fn fail_status_calls(&self, n: usize) {
        self.state.lock().failing_status_calls = n;
    }

    /// Make the next `n` board saves fail
    pub fn fail_updates(&self, n: usize) {
        self.state.lock().failing_updates = n;
    }

    /// Make the next `n` result downloads return an undecodable body
    pub fn fail_fetches_invalid(&self, n: usize) {
        self.state.lock().invalid_fetches = n;
    }

    /// Reject every submission for `task`
    pub fn reject_task(&self, task: EvaluationTask) {
        self.state.lock().rejected_tasks.insert(task);
    }

    /// Delay every status answer by `delay`
    pub fn slow_status(&self, delay: Duration) {
        self.state.lock().status_delay = Some(delay);
    }

    pub fn insert_board(&self, record: BoardRecord) {
        self.state
            .lock()
            .boards
            .insert(record.sanitized_name(), record);
    }

    pub fn board(&self, sanitized: &str) -> Option<BoardRecord> {
        self.state.lock().boards.get(sanitized).cloned()
    }

    pub fn submitted(&self) -> Vec<(EvaluationTask, String, Vec<String>, TaskParams)> {
        self.state.lock().submitted.clone()
    }

    pub fn status_calls(&self) -> usize {
        self.state.lock().status_calls
    }

    pub fn creates(&self) -> usize {
        self.state.lock().creates
    }

    pub fn updates(&self) -> usize {
        self.state.lock().updates
    }
}

#[async_trait]
impl RemoteService for MockService {
    async fn submit_job(
        &self,
        task: EvaluationTask,
        board: &str,
        models: &[String],
        params: &TaskParams,
    ) -> Result<JobHandle> {
        let mut state = self.state.lock();
        if state.rejected_tasks.contains(&task) {
            return Err(Error::Status {
                endpoint: format!("task/{}/{}", task, board),
                status: 400,
                body: "rejected".to_string(),
            });
        }
        state.next_job += 1;
        let job_name = format!("{}-job-{}", task, state.next_job);
        state
            .submitted
            .push((task, board.to_string(), models.to_vec(), params.clone()));
        Ok(JobHandle { job_name })
    }

    async fn job_status(&self, job_name: &str) -> Result<JobStatusResponse> {
        let (answer, delay) = {
            let mut state = self.state.lock();
            state.status_calls += 1;
            let answer = if state.failing_status_calls > 0 {
                state.failing_status_calls -= 1;
                Err(Error::Status {
                    endpoint: format!("task/job-status/{}", job_name),
                    status: 503,
                    body: "unavailable".to_string(),
                })
            } else {
                let status = match state.statuses.get_mut(job_name) {
                    Some(sequence) if sequence.len() > 1 => {
                        sequence.pop_front().unwrap_or(JobState::Running)
                    }
                    Some(sequence) => sequence.front().copied().unwrap_or(JobState::Running),
                    None => JobState::Running,
                };
                Ok(JobStatusResponse {
                    status,
                    start_time: Some("2024-10-01T12:00:00Z".to_string()),
                    end_time: Some("2024-10-01T12:05:00Z".to_string()),
                    message: None,
                })
            };
            (answer, state.status_delay)
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        answer
    }

    async fn fetch_result(&self, task: EvaluationTask, board: &str) -> Result<Value> {
        let mut state = self.state.lock();
        if state.invalid_fetches > 0 {
            state.invalid_fetches -= 1;
            return Err(Error::InvalidResponse {
                endpoint: format!("evaluation/download/{}/{}", task, board),
                reason: "expected value at line 1 column 1".to_string(),
            });
        }
        state.results.get(&task).cloned().ok_or_else(|| Error::Status {
            endpoint: format!("evaluation/download/{}/{}", task, board),
            status: 404,
            body: "no result".to_string(),
        })
    }

    async fn list_boards(&self) -> Result<Vec<BoardSummary>> {
        Ok(self
            .state
            .lock()
            .boards
            .values()
            .map(|r| BoardSummary {
                name: r.name.clone(),
                models: r.models.clone(),
            })
            .collect())
    }

    async fn get_board(&self, board: &str) -> Result<Option<BoardRecord>> {
        Ok(self.state.lock().boards.get(board).cloned())
    }

    async fn create_board(&self, record: &BoardRecord) -> Result<()> {
        let mut state = self.state.lock();
        state.creates += 1;
        state.boards.insert(record.sanitized_name(), record.clone());
        Ok(())
    }

    async fn update_board(&self, record: &BoardRecord) -> Result<()> {
        let mut state = self.state.lock();
        state.updates += 1;
        if state.failing_updates > 0 {
            state.failing_updates -= 1;
            return Err(Error::Status {
                endpoint: format!("myxboard/update/{}", record.sanitized_name()),
                status: 500,
                body: "store unavailable".to_string(),
            });
        }
        state.boards.insert(record.sanitized_name(), record.clone());
        Ok(())
    }

    async fn delete_board(&self, board: &str) -> Result<()> {
        self.state.lock().boards.remove(board);
        Ok(())
    }
}
