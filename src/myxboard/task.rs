use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Kind of evaluation a MyxBoard can run
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationTask {
    /// Ranked pairwise match judged against a prompt
    #[serde(rename = "myxmatch")]
    MyxMatch,
    /// Fixed benchmark suite reporting named metrics
    Benchmark,
}

impl EvaluationTask {
    pub const ALL: [EvaluationTask; 2] = [EvaluationTask::MyxMatch, EvaluationTask::Benchmark];

    pub fn as_str(&self) -> &'static str {
        match self {
            EvaluationTask::MyxMatch => "myxmatch",
            EvaluationTask::Benchmark => "benchmark",
        }
    }

    /// Match tasks cannot be submitted without a prompt
    pub fn requires_prompt(&self) -> bool {
        matches!(self, EvaluationTask::MyxMatch)
    }

    /// Results for this kind carry a rank that reorders the board
    pub fn is_ranked(&self) -> bool {
        matches!(self, EvaluationTask::MyxMatch)
    }
}

impl fmt::Display for EvaluationTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EvaluationTask {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "myxmatch" => Ok(EvaluationTask::MyxMatch),
            "benchmark" => Ok(EvaluationTask::Benchmark),
            other => Err(Error::UnknownTask(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_serialization() {
        let json = serde_json::to_string(&EvaluationTask::MyxMatch).unwrap();
        assert_eq!(json, r#""myxmatch""#);

        let task: EvaluationTask = serde_json::from_str(r#""benchmark""#).unwrap();
        assert_eq!(task, EvaluationTask::Benchmark);
    }

    #[test]
    fn test_task_from_str() {
        assert_eq!("MYXMATCH".parse::<EvaluationTask>().unwrap(), EvaluationTask::MyxMatch);
        assert!(matches!(
            "leaderboard".parse::<EvaluationTask>(),
            Err(Error::UnknownTask(name)) if name == "leaderboard"
        ));
    }

    #[test]
    fn test_task_as_map_key() {
        let mut map = std::collections::BTreeMap::new();
        map.insert(EvaluationTask::MyxMatch, 1);
        let json = serde_json::to_string(&map).unwrap();
        assert_eq!(json, r#"{"myxmatch":1}"#);

        let back: std::collections::BTreeMap<EvaluationTask, i32> =
            serde_json::from_str(&json).unwrap();
        assert_eq!(back[&EvaluationTask::MyxMatch], 1);
    }
}
