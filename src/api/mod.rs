//! Remote Service Client
//!
//! Typed access to the Remyx engine: job submission and status, evaluation
//! download, MyxBoard storage, plus the wider platform endpoints (models,
//! training, user, datasets). Hugging Face collections are resolved here too.

pub mod client;
pub mod collection;
pub mod service;
pub mod types;

#[cfg(test)]
pub(crate) mod mock;

pub use client::RemyxClient;
pub use collection::CollectionClient;
pub use service::RemoteService;
pub use types::{BoardSummary, JobHandle, JobState, JobStatusResponse, TaskParams};
