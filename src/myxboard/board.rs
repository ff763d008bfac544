//! MyxBoard state manager
//!
//! A board owns a named model list, the job table for its evaluation tasks
//! and the normalized results those jobs produced. All state lives on the
//! engine; every mutating operation pushes the full snapshot back before it
//! returns.
//!
//! Polling is split in three phases so callers sharing a board behind a lock
//! only hold it while state changes: [`MyxBoard::tracked_jobs`] takes a
//! snapshot, [`check_jobs`] talks to the engine, and
//! [`MyxBoard::apply_checks`] folds the answers back in.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::formatter::{format_for_storage, FormattedResult};
use super::record::{sanitize_board_name, BoardRecord, JobEntry};
use super::task::EvaluationTask;
use crate::api::{CollectionClient, JobState, RemoteService};
use crate::config::SupportedModels;
use crate::error::{Error, Result};

/// Result downloads of a completed job that may come back without usable
/// entries before the job is given up as failed
pub const MAX_EMPTY_RESULT_FETCHES: u32 = 5;

/// What [`MyxBoard::get_results`] reports for one task
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TaskOutcome {
    Results(Vec<FormattedResult>),
    Status { status: JobState, job_name: String },
}

impl TaskOutcome {
    pub fn is_results(&self) -> bool {
        matches!(self, TaskOutcome::Results(_))
    }
}

/// An in-flight job as seen when a poll cycle starts
#[derive(Debug, Clone, PartialEq)]
pub struct TrackedJob {
    pub task: EvaluationTask,
    pub job_name: String,
    pub start_time: DateTime<Utc>,
}

/// Engine answer for one tracked job
#[derive(Debug)]
pub enum JobCheck {
    /// Job still pending, running or failed
    Status(JobState),
    /// Job completed and its result payload was downloaded
    Finished {
        payload: Value,
        start_time: String,
        end_time: String,
    },
    /// Status or result call failed
    Unreachable(Error),
}

/// Query the engine for every job in `jobs`.
///
/// Completed jobs also have their result payload downloaded. Needs no access
/// to the board itself.
pub async fn check_jobs(
    service: &dyn RemoteService,
    board: &str,
    jobs: &[TrackedJob],
) -> Vec<(TrackedJob, JobCheck)> {
    let mut checks = Vec::with_capacity(jobs.len());
    for job in jobs {
        let check = match service.job_status(&job.job_name).await {
            Ok(response) if response.status == JobState::Completed => {
                match service.fetch_result(job.task, board).await {
                    Ok(payload) => JobCheck::Finished {
                        payload,
                        start_time: response
                            .start_time
                            .unwrap_or_else(|| job.start_time.to_rfc3339()),
                        end_time: response
                            .end_time
                            .unwrap_or_else(|| Utc::now().to_rfc3339()),
                    },
                    Err(e) => {
                        if e.is_invalid_response() {
                            warn!(board, task = %job.task, error = %e, "Result payload could not be decoded");
                        } else {
                            warn!(board, task = %job.task, error = %e, "Result download failed");
                        }
                        JobCheck::Unreachable(e)
                    }
                }
            }
            Ok(response) => JobCheck::Status(response.status),
            Err(e) => {
                warn!(board, task = %job.task, job_name = %job.job_name, error = %e, "Job status poll failed");
                JobCheck::Unreachable(e)
            }
        };
        checks.push((job.clone(), check));
    }
    checks
}

pub struct MyxBoard {
    service: Arc<dyn RemoteService>,
    record: BoardRecord,
    /// Bumped on every local change
    revision: u64,
    /// Revision last pushed to the engine
    saved_revision: u64,
    /// Per task count of completed-but-empty result downloads, not persisted
    empty_fetches: HashMap<EvaluationTask, u32>,
}

impl std::fmt::Debug for MyxBoard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MyxBoard")
            .field("record", &self.record)
            .field("revision", &self.revision)
            .field("saved_revision", &self.saved_revision)
            .finish()
    }
}

impl MyxBoard {
    fn with_record(service: Arc<dyn RemoteService>, record: BoardRecord) -> Self {
        Self {
            service,
            record,
            revision: 0,
            saved_revision: 0,
            empty_fetches: HashMap::new(),
        }
    }

    /// Open the board called `name`, creating it remotely if it does not exist yet
    pub async fn create(
        service: Arc<dyn RemoteService>,
        name: &str,
        models: Vec<String>,
        supported: &SupportedModels,
    ) -> Result<Self> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::Validation("board name must not be empty".to_string()));
        }
        supported.validate(&models)?;
        Self::open(service, BoardRecord::new(name, models)).await
    }

    /// Build a board from the models of a Hugging Face collection
    pub async fn from_collection(
        service: Arc<dyn RemoteService>,
        collections: &CollectionClient,
        collection: &str,
        supported: &SupportedModels,
    ) -> Result<Self> {
        let models = collections.model_ids(collection).await?;
        supported.validate(&models)?;
        Self::open(service, BoardRecord::from_collection(collection, models)).await
    }

    /// Open a board that must already exist remotely
    pub async fn load(service: Arc<dyn RemoteService>, name: &str) -> Result<Self> {
        let sanitized = sanitize_board_name(name);
        match service.get_board(&sanitized).await? {
            Some(record) => {
                debug!(board = %record.name, "loaded board");
                Ok(Self::with_record(service, record))
            }
            None => Err(Error::BoardNotFound(name.to_string())),
        }
    }

    async fn open(service: Arc<dyn RemoteService>, record: BoardRecord) -> Result<Self> {
        let sanitized = record.sanitized_name();
        match service.get_board(&sanitized).await? {
            Some(existing) => {
                if existing.models != record.models {
                    warn!(
                        board = %existing.name,
                        "Board already exists with a different model list, using the stored one"
                    );
                }
                info!(board = %existing.name, "Opened existing MyxBoard");
                Ok(Self::with_record(service, existing))
            }
            None => {
                service.create_board(&record).await?;
                info!(board = %record.name, models = record.models.len(), "Created MyxBoard");
                Ok(Self::with_record(service, record))
            }
        }
    }

    pub fn name(&self) -> &str {
        &self.record.name
    }

    pub fn sanitized_name(&self) -> String {
        self.record.sanitized_name()
    }

    pub fn models(&self) -> &[String] {
        &self.record.models
    }

    pub fn results(&self) -> &BTreeMap<EvaluationTask, Vec<FormattedResult>> {
        &self.record.results
    }

    pub fn job_status(&self) -> &BTreeMap<EvaluationTask, JobEntry> {
        &self.record.job_status
    }

    /// Service the board reads from and saves to
    pub fn service(&self) -> Arc<dyn RemoteService> {
        Arc::clone(&self.service)
    }

    /// Collection the board was built from, if any
    pub fn source_collection(&self) -> Option<&str> {
        if self.record.from_hf_collection {
            self.record.hf_collection_name.as_deref()
        } else {
            None
        }
    }

    fn touch(&mut self) {
        self.revision += 1;
    }

    /// Record a freshly submitted job for `task`.
    ///
    /// Rejected with [`Error::JobInFlight`] while an earlier job for the same
    /// task has not reached a terminal state. Cached results for the task are
    /// dropped. Nothing is pushed remotely until [`MyxBoard::save`].
    pub fn submit_and_track(
        &mut self,
        task: EvaluationTask,
        job_name: &str,
        start_time: DateTime<Utc>,
    ) -> Result<()> {
        if let Some(entry) = self.record.job_status.get(&task) {
            if !entry.status.is_terminal() {
                return Err(Error::JobInFlight {
                    task,
                    job_name: entry.job_name.clone(),
                });
            }
        }

        if self.record.results.remove(&task).is_some() {
            debug!(board = %self.record.name, %task, "dropped cached results");
        }
        self.record
            .job_status
            .insert(task, JobEntry::new(job_name, start_time));
        self.empty_fetches.remove(&task);
        self.touch();
        info!(board = %self.record.name, %task, job_name, "Tracking evaluation job");
        Ok(())
    }

    /// Jobs that have not reached a terminal state yet
    pub fn tracked_jobs(&self) -> Vec<TrackedJob> {
        self.record
            .job_status
            .iter()
            .filter(|(_, entry)| !entry.status.is_terminal())
            .map(|(task, entry)| TrackedJob {
                task: *task,
                job_name: entry.job_name.clone(),
                start_time: entry.start_time,
            })
            .collect()
    }

    /// True once every tracked job is completed or failed
    pub fn all_terminal(&self) -> bool {
        self.record
            .job_status
            .values()
            .all(|entry| entry.status.is_terminal())
    }

    /// True once every job is terminal and the final state has been saved
    pub fn is_settled(&self) -> bool {
        self.all_terminal() && !self.is_dirty()
    }

    /// Query every in-flight job once, collect finished results and save.
    ///
    /// A failing status or result call marks the job `error` and is retried on
    /// the next call. A failing save leaves the board dirty so the next call
    /// pushes it again. Returns whether every tracked job is now terminal.
    pub async fn poll_once(&mut self) -> Result<bool> {
        let jobs = self.tracked_jobs();
        let checks = check_jobs(self.service.as_ref(), &self.sanitized_name(), &jobs).await;
        self.apply_checks(checks);

        if self.is_dirty() {
            self.save().await?;
        }
        Ok(self.all_terminal())
    }

    /// Fold the answers of [`check_jobs`] into the board.
    ///
    /// Answers for a job that has since been replaced by a resubmission are
    /// dropped.
    pub fn apply_checks(&mut self, checks: Vec<(TrackedJob, JobCheck)>) {
        for (job, check) in checks {
            let current = self
                .record
                .job_status
                .get(&job.task)
                .is_some_and(|entry| entry.job_name == job.job_name);
            if !current {
                debug!(board = %self.record.name, task = %job.task, job_name = %job.job_name, "dropping stale job check");
                continue;
            }

            match check {
                JobCheck::Status(status) => self.set_status(job.task, status),
                JobCheck::Unreachable(_) => self.set_status(job.task, JobState::Error),
                JobCheck::Finished {
                    payload,
                    start_time,
                    end_time,
                } => {
                    let formatted = format_for_storage(job.task, &payload, &start_time, &end_time);
                    if formatted.is_empty() {
                        self.record_empty_fetch(job.task);
                    } else {
                        self.store(job.task, formatted);
                    }
                }
            }
        }
    }

    fn record_empty_fetch(&mut self, task: EvaluationTask) {
        let count = self.empty_fetches.entry(task).or_insert(0);
        *count += 1;
        if *count >= MAX_EMPTY_RESULT_FETCHES {
            warn!(
                board = %self.record.name,
                %task,
                attempts = *count,
                "Completed job never produced usable results, marking it failed"
            );
            self.empty_fetches.remove(&task);
            self.set_status(task, JobState::Failed);
        } else {
            info!(board = %self.record.name, %task, "Job completed but no results yet");
            self.set_status(task, JobState::Running);
        }
    }

    fn set_status(&mut self, task: EvaluationTask, status: JobState) {
        if let Some(entry) = self.record.job_status.get_mut(&task) {
            if entry.status != status {
                debug!(board = %self.record.name, %task, from = %entry.status, to = %status, "job status");
                entry.status = status;
                self.touch();
            }
        }
    }

    fn store(&mut self, task: EvaluationTask, results: Vec<FormattedResult>) {
        info!(board = %self.record.name, %task, entries = results.len(), "Stored evaluation results");
        self.record.results.insert(task, results);
        self.empty_fetches.remove(&task);
        if let Some(entry) = self.record.job_status.get_mut(&task) {
            entry.status = JobState::Completed;
        }
        if task.is_ranked() {
            self.reorder_by_rank(task);
        }
        self.touch();
    }

    /// Store already normalized results for `task` and push the board
    pub async fn update_results(
        &mut self,
        task: EvaluationTask,
        results: Vec<FormattedResult>,
    ) -> Result<()> {
        self.store(task, results);
        self.save().await
    }

    /// Sort models ascending by the rank in the task's results.
    /// Ties keep their current order; unranked models go last.
    fn reorder_by_rank(&mut self, task: EvaluationTask) {
        let Some(results) = self.record.results.get(&task) else {
            return;
        };
        let ranks: Vec<(String, i64)> = results
            .iter()
            .filter_map(|r| r.rank().map(|rank| (r.model_name().to_string(), rank)))
            .collect();
        if ranks.is_empty() {
            return;
        }

        let rank_of = |model: &str| {
            ranks
                .iter()
                .find(|(name, _)| name == model || name == SupportedModels::engine_name(model))
                .map(|(_, rank)| *rank)
                .unwrap_or(i64::MAX)
        };
        self.record.models.sort_by_key(|model| rank_of(model.as_str()));
        debug!(board = %self.record.name, models = ?self.record.models, "reordered by rank");
    }

    /// Cached results per task, or a status descriptor for tasks without results.
    /// Never touches the network.
    pub fn get_results(&self, filter: Option<EvaluationTask>) -> BTreeMap<EvaluationTask, TaskOutcome> {
        let mut outcomes = BTreeMap::new();
        for task in EvaluationTask::ALL {
            if filter.is_some_and(|f| f != task) {
                continue;
            }
            if let Some(results) = self.record.results.get(&task) {
                outcomes.insert(task, TaskOutcome::Results(results.clone()));
            } else if let Some(entry) = self.record.job_status.get(&task) {
                outcomes.insert(
                    task,
                    TaskOutcome::Status {
                        status: entry.status,
                        job_name: entry.job_name.clone(),
                    },
                );
            }
        }
        outcomes
    }

    /// Push the full snapshot to the remote store
    pub async fn save(&mut self) -> Result<()> {
        let revision = self.revision;
        self.service.update_board(&self.record).await?;
        self.mark_saved(revision);
        Ok(())
    }

    /// Copy of the record to push, if anything changed since the last save
    pub fn unsaved_snapshot(&self) -> Option<(BoardRecord, u64)> {
        self.is_dirty().then(|| (self.record.clone(), self.revision))
    }

    /// Note that the snapshot taken at `revision` reached the engine
    pub fn mark_saved(&mut self, revision: u64) {
        if revision > self.saved_revision {
            self.saved_revision = revision;
        }
        debug!(board = %self.record.name, revision, dirty = self.is_dirty(), "saved board");
    }

    pub fn is_dirty(&self) -> bool {
        self.revision != self.saved_revision
    }

    /// Remove the remote record
    pub async fn delete(self) -> Result<()> {
        self.service.delete_board(&self.sanitized_name()).await?;
        info!(board = %self.record.name, "Deleted MyxBoard");
        Ok(())
    }
}
