use std::path::{Path, PathBuf};

use chrono::Local;

/// Composes output paths under a results directory using the
/// `<results_dir>/<prefix>_<timestamp>.<ext>` convention from the external
/// interfaces section: one masked-document path per input file, carrying
/// the input's own extension and a run timestamp so repeated runs never
/// clobber each other's output.
#[derive(Clone, Debug)]
pub struct OutputPathManager {
    results_dir: PathBuf,
}

impl OutputPathManager {
    pub fn new(results_dir: impl Into<PathBuf>) -> Self {
        Self {
            results_dir: results_dir.into(),
        }
    }

    /// Build the masked-output path for `input_path`, stamped with `now`.
    pub fn masked_output_path(&self, input_path: &Path, now: chrono::DateTime<Local>) -> PathBuf {
        let prefix = input_path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("output");
        let ext = input_path.extension().and_then(|e| e.to_str());
        let timestamp = now.format("%Y%m%d_%H%M%S");

        let file_name = match ext {
            Some(ext) => format!("{prefix}_{timestamp}.{ext}"),
            None => format!("{prefix}_{timestamp}"),
        };
        self.results_dir.join(file_name)
    }

    /// Path of the per-chunk JSONL result stream for `input_path`.
    pub fn chunk_stream_path(&self, input_path: &Path) -> PathBuf {
        let stem = input_path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("output");
        self.results_dir.join(format!("{stem}.chunks.jsonl"))
    }

    pub fn results_dir(&self) -> &Path {
        &self.results_dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn composes_prefix_timestamp_extension() {
        let mgr = OutputPathManager::new("/tmp/results");
        let now = Local.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();
        let path = mgr.masked_output_path(Path::new("/data/notes.txt"), now);
        assert_eq!(path, PathBuf::from("/tmp/results/notes_20260102_030405.txt"));
    }

    #[test]
    fn falls_back_when_no_extension() {
        let mgr = OutputPathManager::new("/tmp/results");
        let now = Local.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();
        let path = mgr.masked_output_path(Path::new("/data/record"), now);
        assert_eq!(path, PathBuf::from("/tmp/results/record_20260102_030405"));
    }
}
