//! MyxBoard result lifecycle
//!
//! Board state with its task kinds and result formatter.

pub mod board;
pub mod formatter;
pub mod record;
pub mod task;

pub use board::{check_jobs, JobCheck, MyxBoard, TaskOutcome, TrackedJob, MAX_EMPTY_RESULT_FETCHES};
pub use formatter::{format_for_storage, FormattedResult, RawResult};
pub use record::{sanitize_board_name, BoardRecord, JobEntry};
pub use task::EvaluationTask;
