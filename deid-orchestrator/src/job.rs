use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use deid_common::{io, AppError};
use serde::{Deserialize, Serialize};

/// Terminal/non-terminal state of one file within a job. Distinct from
/// `FileMachine`'s type-state enum: this is the serializable projection
/// that gets persisted to disk, not the compile-time-checked driver.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskState {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl TaskState {
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskState::Completed | TaskState::Failed)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub job_id: String,
    pub file_path: PathBuf,
    pub state: TaskState,
    pub error: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Task {
    pub fn new(job_id: impl Into<String>, file_path: PathBuf) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            job_id: job_id.into(),
            file_path,
            state: TaskState::Pending,
            error: None,
            started_at: None,
            completed_at: None,
        }
    }

    pub fn mark_processing(&mut self) {
        self.state = TaskState::Processing;
        self.started_at = Some(Utc::now());
    }

    pub fn mark_completed(&mut self) {
        self.state = TaskState::Completed;
        self.completed_at = Some(Utc::now());
    }

    pub fn mark_failed(&mut self, error: impl Into<String>) {
        self.state = TaskState::Failed;
        self.error = Some(error.into());
        self.completed_at = Some(Utc::now());
    }
}

/// A run over a fixed set of input files. Persisted as JSON next to the
/// checkpoint directory; a job is complete once every task is terminal.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Job {
    pub id: String,
    pub tasks: Vec<Task>,
    pub created_at: DateTime<Utc>,
}

impl Job {
    pub fn new(files: Vec<PathBuf>) -> Self {
        let id = uuid::Uuid::new_v4().to_string();
        let tasks = files.into_iter().map(|path| Task::new(&id, path)).collect();
        Self {
            id,
            tasks,
            created_at: Utc::now(),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.tasks.iter().all(|t| t.state.is_terminal())
    }

    pub fn exit_code(&self) -> i32 {
        if self.tasks.iter().all(|t| t.state == TaskState::Completed) {
            0
        } else if self.tasks.iter().any(|t| t.state == TaskState::Completed) {
            2
        } else {
            1
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), AppError> {
        io::write_json_atomic(path, self)
    }

    pub fn load(path: &Path) -> Result<Option<Self>, AppError> {
        io::read_json_opt(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_is_complete_only_when_every_task_is_terminal() {
        let mut job = Job::new(vec![PathBuf::from("a.txt"), PathBuf::from("b.txt")]);
        assert!(!job.is_complete());
        job.tasks[0].mark_completed();
        assert!(!job.is_complete());
        job.tasks[1].mark_failed("boom");
        assert!(job.is_complete());
    }

    #[test]
    fn exit_code_reflects_partial_failure() {
        let mut job = Job::new(vec![PathBuf::from("a.txt"), PathBuf::from("b.txt")]);
        job.tasks[0].mark_completed();
        job.tasks[1].mark_completed();
        assert_eq!(job.exit_code(), 0);

        job.tasks[1].mark_failed("boom");
        assert_eq!(job.exit_code(), 2);

        job.tasks[0].state = TaskState::Failed;
        assert_eq!(job.exit_code(), 1);
    }
}
