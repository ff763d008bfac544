//! Remyx AI client library
//!
//! Client for the Remyx engine with a focus on MyxBoards: named sets of
//! models evaluated together, whose jobs are tracked and whose results are
//! cached on the engine.
//!
//! ## Module Structure
//!
//! - `config`: credentials and the settings file
//! - `error`: crate error type
//! - `api`: REST client, wire types and the `RemoteService` seam
//! - `myxboard`: board state and result formatting
//! - `orchestrator`: job submission and background polling

pub mod api;
pub mod config;
pub mod error;
pub mod myxboard;
pub mod orchestrator;

pub use api::{CollectionClient, JobState, RemoteService, RemyxClient};
pub use config::{ClientConfig, Settings, SupportedModels};
pub use error::{Error, Result};
pub use myxboard::{EvaluationTask, FormattedResult, MyxBoard, TaskOutcome};
pub use orchestrator::{EvaluationHandle, EvaluationRequest, Orchestrator, OrchestratorConfig};
