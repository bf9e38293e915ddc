use std::collections::HashSet;
use std::path::{Path, PathBuf};

use chrono::Utc;
use deid_common::{io, AppError};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Durable resume state for one input, persisted as JSON. A checkpoint is
/// only trusted on resume if `file_hash`, `chunk_size` and `chunk_overlap`
/// all match the current run's; otherwise it's abandoned and processing
/// restarts from scratch.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProcessingCheckpoint {
    pub file_path: String,
    pub file_hash: String,
    pub total_size: usize,
    pub total_chunks: usize,
    pub last_completed_chunk: i64,
    pub processed_chunks: HashSet<usize>,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub started_at: String,
    pub last_updated_at: String,
    pub output_file: Option<String>,
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl ProcessingCheckpoint {
    pub fn new(
        file_path: impl Into<String>,
        file_hash: impl Into<String>,
        total_size: usize,
        total_chunks: usize,
        chunk_size: usize,
        chunk_overlap: usize,
    ) -> Self {
        let now = Utc::now().to_rfc3339();
        Self {
            file_path: file_path.into(),
            file_hash: file_hash.into(),
            total_size,
            total_chunks,
            last_completed_chunk: -1,
            processed_chunks: HashSet::new(),
            chunk_size,
            chunk_overlap,
            started_at: now.clone(),
            last_updated_at: now,
            output_file: None,
            metadata: serde_json::Map::new(),
        }
    }

    pub fn progress_percent(&self) -> f64 {
        if self.total_chunks == 0 {
            return 0.0;
        }
        (self.processed_chunks.len() as f64 / self.total_chunks as f64) * 100.0
    }

    pub fn is_complete(&self) -> bool {
        self.processed_chunks.len() >= self.total_chunks
    }

    /// True if a previously saved checkpoint is safe to resume from: same
    /// input signature and the same chunking configuration.
    pub fn matches(&self, file_hash: &str, chunk_size: usize, chunk_overlap: usize) -> bool {
        self.file_hash == file_hash && self.chunk_size == chunk_size && self.chunk_overlap == chunk_overlap
    }

    pub fn record_chunk(&mut self, chunk_id: usize) {
        self.processed_chunks.insert(chunk_id);
        self.last_completed_chunk = self.last_completed_chunk.max(chunk_id as i64);
        self.last_updated_at = Utc::now().to_rfc3339();
    }

    pub fn save(&self, path: &Path) -> Result<(), AppError> {
        io::write_json_atomic(path, self).map_err(|e| match e {
            AppError::Io(inner) => AppError::Checkpoint(inner.to_string()),
            AppError::Json(inner) => AppError::Checkpoint(inner.to_string()),
            other => other,
        })
    }

    pub fn load(path: &Path) -> Result<Option<Self>, AppError> {
        match io::read_json_opt(path) {
            Ok(checkpoint) => Ok(checkpoint),
            Err(e) => {
                tracing::warn!(error = %e, "failed to load checkpoint, treating as absent");
                Ok(None)
            }
        }
    }
}

/// Hash of the first 1 MiB of `bytes`, plenty to detect a changed input
/// without hashing arbitrarily large files on every resume check.
pub fn file_signature(bytes: &[u8]) -> String {
    const SIGNATURE_WINDOW: usize = 1024 * 1024;
    let window = &bytes[..bytes.len().min(SIGNATURE_WINDOW)];
    format!("{:x}", Sha256::digest(window))
}

/// Checkpoint file path for a given input identifier, under `checkpoint_dir`.
pub fn checkpoint_path(checkpoint_dir: &Path, input_id: &str) -> PathBuf {
    let safe_name: String = input_id
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '.' || c == '-' || c == '_' { c } else { '_' })
        .collect();
    checkpoint_dir.join(format!("{safe_name}.checkpoint.json"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mismatched_chunking_invalidates_checkpoint() {
        let checkpoint = ProcessingCheckpoint::new("f", "hash", 100, 5, 2000, 200);
        assert!(checkpoint.matches("hash", 2000, 200));
        assert!(!checkpoint.matches("hash", 1000, 200));
        assert!(!checkpoint.matches("other", 2000, 200));
    }

    #[test]
    fn is_complete_when_all_chunks_recorded() {
        let mut checkpoint = ProcessingCheckpoint::new("f", "hash", 100, 2, 2000, 200);
        assert!(!checkpoint.is_complete());
        checkpoint.record_chunk(0);
        checkpoint.record_chunk(1);
        assert!(checkpoint.is_complete());
    }

    #[test]
    fn round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = checkpoint_path(dir.path(), "input.txt");
        let mut checkpoint = ProcessingCheckpoint::new("input.txt", "hash", 100, 2, 2000, 200);
        checkpoint.record_chunk(0);
        checkpoint.save(&path).unwrap();

        let loaded = ProcessingCheckpoint::load(&path).unwrap().unwrap();
        assert_eq!(loaded.processed_chunks, checkpoint.processed_chunks);
    }

    #[test]
    fn missing_checkpoint_loads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = checkpoint_path(dir.path(), "missing.txt");
        assert!(ProcessingCheckpoint::load(&path).unwrap().is_none());
    }
}
