//! Evaluation Orchestrator
//!
//! Submits one job per requested task for a board, then hands the board to a
//! background worker that polls it on a fixed interval.
//!
//! Flow:
//! 1. Validate the request (no network traffic yet)
//! 2. Submit each task and register its job on the board
//! 3. Push the board snapshot
//! 4. Spawn the poll loop; it stops once every job is completed or failed
//!    and that state has been saved
//!
//! [`Orchestrator::watch`] restarts step 4 for a board reloaded after the
//! process that submitted its jobs went away.

use chrono::Utc;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::interval;
use tracing::{debug, error, info, warn};

use crate::api::{RemoteService, TaskParams};
use crate::config::Settings;
use crate::error::{Error, Result};
use crate::myxboard::{check_jobs, EvaluationTask, MyxBoard};

/// Configuration for the poll loop
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Delay between poll cycles (default: 30 seconds)
    pub poll_interval_secs: u64,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 30,
        }
    }
}

impl From<&Settings> for OrchestratorConfig {
    fn from(settings: &Settings) -> Self {
        Self {
            poll_interval_secs: settings.poll_interval_secs.max(1),
        }
    }
}

/// Tasks to run on a board and their parameters
#[derive(Debug, Clone, Default)]
pub struct EvaluationRequest {
    pub tasks: Vec<EvaluationTask>,
    /// Required by match tasks
    pub prompt: Option<String>,
    /// Benchmark suites to run
    pub eval_tasks: Vec<String>,
}

impl EvaluationRequest {
    pub fn validate(&self) -> Result<()> {
        if self.tasks.is_empty() {
            return Err(Error::Validation("no evaluation tasks requested".to_string()));
        }

        let mut seen = HashSet::new();
        let duplicates: Vec<&str> = self
            .tasks
            .iter()
            .filter(|task| !seen.insert(**task))
            .map(|task| task.as_str())
            .collect();
        if !duplicates.is_empty() {
            return Err(Error::Validation(format!(
                "tasks requested more than once: {}",
                duplicates.join(", ")
            )));
        }

        let has_prompt = self
            .prompt
            .as_deref()
            .is_some_and(|p| !p.trim().is_empty());
        let missing: Vec<&str> = self
            .tasks
            .iter()
            .filter(|task| task.requires_prompt() && !has_prompt)
            .map(|task| task.as_str())
            .collect();
        if !missing.is_empty() {
            return Err(Error::Validation(format!(
                "a prompt is required for: {}",
                missing.join(", ")
            )));
        }
        Ok(())
    }

    fn params_for(&self, task: EvaluationTask) -> TaskParams {
        match task {
            EvaluationTask::MyxMatch => TaskParams {
                prompt: self.prompt.clone(),
                eval_tasks: Vec::new(),
            },
            EvaluationTask::Benchmark => TaskParams {
                prompt: None,
                eval_tasks: self.eval_tasks.clone(),
            },
        }
    }
}

/// A running evaluation. Dropping the handle leaves the poll loop running.
#[derive(Debug)]
pub struct EvaluationHandle {
    board: Arc<Mutex<MyxBoard>>,
    task: JoinHandle<()>,
    errors: Vec<Error>,
}

impl EvaluationHandle {
    /// Shared board, readable while polling continues
    pub fn board(&self) -> Arc<Mutex<MyxBoard>> {
        self.board.clone()
    }

    /// Submissions or saves that failed while the evaluation was started.
    /// Polling runs for every job that was submitted regardless.
    pub fn errors(&self) -> &[Error] {
        &self.errors
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Stop polling. Jobs keep running remotely; [`Orchestrator::watch`] resumes.
    pub fn abort(&self) {
        self.task.abort();
    }

    /// Wait for every job to reach a terminal state
    pub async fn wait(self) -> Result<Arc<Mutex<MyxBoard>>> {
        self.task
            .await
            .map_err(|e| Error::Worker(e.to_string()))?;
        Ok(self.board)
    }
}

pub struct Orchestrator {
    service: Arc<dyn RemoteService>,
    config: OrchestratorConfig,
}

impl Orchestrator {
    pub fn new(service: Arc<dyn RemoteService>, config: OrchestratorConfig) -> Self {
        Self { service, config }
    }

    /// Submit the requested tasks and start polling in the background
    pub async fn evaluate(
        &self,
        board: MyxBoard,
        request: EvaluationRequest,
    ) -> Result<EvaluationHandle> {
        self.evaluate_with_callback(board, request, |_: &MyxBoard| {})
            .await
    }

    /// Like [`Orchestrator::evaluate`]; `on_complete` runs once after the last job finishes.
    ///
    /// Fails without spawning anything only when the request is invalid, a
    /// task already has a job in flight, or no task could be submitted. Any
    /// other failure is reported through [`EvaluationHandle::errors`].
    pub async fn evaluate_with_callback<F>(
        &self,
        mut board: MyxBoard,
        request: EvaluationRequest,
        on_complete: F,
    ) -> Result<EvaluationHandle>
    where
        F: FnOnce(&MyxBoard) + Send + 'static,
    {
        request.validate()?;
        for task in &request.tasks {
            if let Some(entry) = board.job_status().get(task) {
                if !entry.status.is_terminal() {
                    return Err(Error::JobInFlight {
                        task: *task,
                        job_name: entry.job_name.clone(),
                    });
                }
            }
        }

        let (submitted, mut errors) = self.submit_all(&mut board, &request).await;
        if submitted == 0 {
            return Err(errors
                .into_iter()
                .next()
                .unwrap_or_else(|| Error::Validation("no evaluation tasks submitted".to_string())));
        }

        if let Err(e) = board.save().await {
            warn!(board = %board.name(), error = %e, "Could not save submitted jobs, the poll loop will retry");
            errors.push(e);
        }

        Ok(self.spawn_polling(board, on_complete, errors))
    }

    /// Resume polling a board whose jobs were submitted earlier
    pub fn watch(&self, board: MyxBoard) -> EvaluationHandle {
        self.watch_with_callback(board, |_: &MyxBoard| {})
    }

    /// Like [`Orchestrator::watch`]; `on_complete` runs once every job has finished
    pub fn watch_with_callback<F>(&self, board: MyxBoard, on_complete: F) -> EvaluationHandle
    where
        F: FnOnce(&MyxBoard) + Send + 'static,
    {
        self.spawn_polling(board, on_complete, Vec::new())
    }

    fn spawn_polling<F>(&self, board: MyxBoard, on_complete: F, errors: Vec<Error>) -> EvaluationHandle
    where
        F: FnOnce(&MyxBoard) + Send + 'static,
    {
        let board = Arc::new(Mutex::new(board));
        let task = tokio::spawn(poll_until_done(
            board.clone(),
            self.service.clone(),
            Duration::from_secs(self.config.poll_interval_secs),
            on_complete,
        ));
        EvaluationHandle {
            board,
            task,
            errors,
        }
    }

    /// Submit every task, returning how many went through and what failed
    async fn submit_all(
        &self,
        board: &mut MyxBoard,
        request: &EvaluationRequest,
    ) -> (usize, Vec<Error>) {
        let sanitized = board.sanitized_name();
        let mut submitted = 0;
        let mut errors = Vec::new();
        for task in &request.tasks {
            let params = request.params_for(*task);
            let tracked = match self
                .service
                .submit_job(*task, &sanitized, board.models(), &params)
                .await
            {
                Ok(handle) => board.submit_and_track(*task, &handle.job_name, Utc::now()),
                Err(e) => Err(e),
            };
            match tracked {
                Ok(()) => submitted += 1,
                Err(e) => {
                    error!(board = %board.name(), %task, error = %e, "Job submission failed");
                    errors.push(e);
                }
            }
        }
        (submitted, errors)
    }
}

/// Poll until every job is terminal and saved.
///
/// The board lock is only taken to snapshot and to apply answers; status
/// queries and saves run without it.
async fn poll_until_done<F>(
    board: Arc<Mutex<MyxBoard>>,
    service: Arc<dyn RemoteService>,
    period: Duration,
    on_complete: F,
) where
    F: FnOnce(&MyxBoard) + Send + 'static,
{
    let (name, sanitized) = {
        let guard = board.lock().await;
        (guard.name().to_string(), guard.sanitized_name())
    };
    info!(board = %name, interval_secs = period.as_secs(), "Polling evaluation jobs");

    let mut ticker = interval(period);
    // first tick completes immediately
    ticker.tick().await;

    let mut cycles = 0u64;
    loop {
        {
            let guard = board.lock().await;
            if guard.is_settled() {
                info!(board = %name, cycles, "All evaluation jobs finished");
                on_complete(&*guard);
                return;
            }
        }

        ticker.tick().await;
        cycles += 1;

        let jobs = board.lock().await.tracked_jobs();
        let checks = check_jobs(service.as_ref(), &sanitized, &jobs).await;
        let snapshot = {
            let mut guard = board.lock().await;
            guard.apply_checks(checks);
            guard.unsaved_snapshot()
        };

        if let Some((record, revision)) = snapshot {
            match service.update_board(&record).await {
                Ok(()) => board.lock().await.mark_saved(revision),
                Err(e) => warn!(board = %name, error = %e, "Saving board failed, retrying next cycle"),
            }
        }
        debug!(board = %name, cycles, in_flight = jobs.len(), "poll cycle done");
    }
}
