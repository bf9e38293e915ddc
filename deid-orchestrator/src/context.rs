use std::path::PathBuf;

use chunk_processor::ChunkResult;
use masking_engine::MaskingReport;
use phi_types::PHIEntity;

use crate::progress::ProgressEstimator;

/// Per-file working state threaded through the stage functions. Mirrors
/// what's already been produced (`text`, `entities`, `masking_report`)
/// rather than letting each stage return an ad-hoc tuple.
pub struct FileContext {
    pub path: PathBuf,
    pub resume: bool,
    pub file_id: String,
    pub text: Option<String>,
    pub rag_context: Option<String>,
    pub chunk_results: Vec<ChunkResult>,
    pub entities: Option<Vec<PHIEntity>>,
    pub masking_report: Option<MaskingReport>,
    pub progress: ProgressEstimator,
}

impl FileContext {
    pub fn new(path: PathBuf, resume: bool, default_chars_per_sec: f64) -> Self {
        let file_id = path.to_string_lossy().into_owned();
        Self {
            path,
            resume,
            file_id,
            text: None,
            rag_context: None,
            chunk_results: Vec::new(),
            entities: None,
            masking_report: None,
            progress: ProgressEstimator::new(default_chars_per_sec),
        }
    }

    pub fn text(&self) -> Result<&str, deid_common::AppError> {
        self.text
            .as_deref()
            .ok_or_else(|| deid_common::AppError::Internal("file text expected to be loaded".to_string()))
    }

    pub fn take_entities(&mut self) -> Result<Vec<PHIEntity>, deid_common::AppError> {
        self.entities
            .take()
            .ok_or_else(|| deid_common::AppError::Internal("entities expected to be merged".to_string()))
    }

    pub fn take_masking_report(&mut self) -> Result<MaskingReport, deid_common::AppError> {
        self.masking_report
            .take()
            .ok_or_else(|| deid_common::AppError::Internal("masking report expected to be produced".to_string()))
    }

    pub fn abort(&self, err: deid_common::AppError) -> deid_common::AppError {
        tracing::error!(file = %self.file_id, error = %err, "file processing aborted");
        err
    }
}
