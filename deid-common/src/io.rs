use std::fs;
use std::path::Path;

use serde::Serialize;
use tempfile::NamedTempFile;

use crate::error::AppError;

/// Serialize `value` as pretty JSON and write it to `path` atomically: the
/// payload lands in a temp file in the same directory first, then is
/// renamed into place, so a crash mid-write never leaves a torn checkpoint
/// or job record behind.
pub fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<(), AppError> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir)?;

    let mut tmp = NamedTempFile::new_in(dir)?;
    serde_json::to_writer_pretty(&mut tmp, value)?;
    tmp.persist(path)
        .map_err(|e| AppError::Io(e.error))?;
    Ok(())
}

/// Append one JSON line to `path`, creating it if necessary, flushing after
/// every write so a reader tailing the file never sees a partial record.
pub fn append_jsonl<T: Serialize>(path: &Path, value: &T) -> Result<(), AppError> {
    use std::io::Write;

    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    let mut file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?;
    let line = serde_json::to_string(value)?;
    writeln!(file, "{line}")?;
    file.flush()?;
    Ok(())
}

/// Read and deserialize a JSON file, returning `Ok(None)` if it doesn't exist.
pub fn read_json_opt<T: serde::de::DeserializeOwned>(
    path: &Path,
) -> Result<Option<T>, AppError> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(AppError::Io(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Serialize, Deserialize, PartialEq, Debug)]
    struct Sample {
        a: u32,
        b: String,
    }

    #[test]
    fn round_trips_through_atomic_write() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.json");
        let value = Sample {
            a: 7,
            b: "hi".to_string(),
        };
        write_json_atomic(&path, &value).unwrap();
        let read_back: Sample = read_json_opt(&path).unwrap().unwrap();
        assert_eq!(value, read_back);
    }

    #[test]
    fn missing_file_reads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.json");
        let read_back: Option<Sample> = read_json_opt(&path).unwrap();
        assert!(read_back.is_none());
    }

    #[test]
    fn appends_multiple_jsonl_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stream.jsonl");
        append_jsonl(&path, &Sample { a: 1, b: "x".into() }).unwrap();
        append_jsonl(&path, &Sample { a: 2, b: "y".into() }).unwrap();
        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 2);
    }
}
