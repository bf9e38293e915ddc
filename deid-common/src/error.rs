use async_openai::error::OpenAIError;
use thiserror::Error;

/// The error taxonomy shared by every crate in the workspace.
///
/// Each variant corresponds to one of the error kinds in the de-identification
/// pipeline's error model: `InvalidInput` and `Internal` are non-retryable and
/// propagate out of a job boundary; `LoaderError`, `LLMError` and
/// `RetrieverError` are local to a file or a chunk and are captured by the
/// orchestrator instead of aborting the run; `CheckpointError` aborts the job
/// because resumability is a core guarantee; `Cancelled` is cooperative.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("loader error: {0}")]
    Loader(String),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("retriever error: {0}")]
    Retriever(String),

    #[error("checkpoint error: {0}")]
    Checkpoint(String),

    #[error("cancelled")]
    Cancelled,

    #[error("internal error: {0}")]
    Internal(String),

    #[error("OpenAI error: {0}")]
    OpenAI(#[from] OpenAIError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Reqwest(#[from] reqwest::Error),
}

impl AppError {
    /// Whether a failure of this kind may safely be retried by the orchestrator.
    ///
    /// `InvalidInput`, `Checkpoint` and `Internal` are never retried: the
    /// first two indicate the caller must change something before the job can
    /// succeed, the third indicates a broken invariant.
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            AppError::InvalidInput(_) | AppError::Checkpoint(_) | AppError::Internal(_)
        )
    }
}
