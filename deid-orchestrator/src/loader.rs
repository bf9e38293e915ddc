use std::path::Path;

use async_trait::async_trait;
use deid_common::AppError;

/// Turns an input path into text to be de-identified. A concrete binary
/// wanting to support PDFs, DOCX, or other formats plugs in its own
/// implementation; `PlainTextLoader` is the only one this crate ships.
#[async_trait]
pub trait DocumentLoader: Send + Sync {
    async fn load(&self, path: &Path) -> Result<String, AppError>;
}

/// Reads the file as UTF-8 text, no transformation.
#[derive(Clone, Copy, Debug, Default)]
pub struct PlainTextLoader;

#[async_trait]
impl DocumentLoader for PlainTextLoader {
    async fn load(&self, path: &Path) -> Result<String, AppError> {
        tokio::fs::read_to_string(path)
            .await
            .map_err(|e| AppError::Loader(format!("failed to read {}: {e}", path.display())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reads_plain_text_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("note.txt");
        tokio::fs::write(&path, "hello").await.unwrap();

        let loader = PlainTextLoader;
        assert_eq!(loader.load(&path).await.unwrap(), "hello");
    }

    #[tokio::test]
    async fn missing_file_is_a_loader_error() {
        let loader = PlainTextLoader;
        let err = loader.load(Path::new("/nonexistent/path.txt")).await.unwrap_err();
        assert!(matches!(err, AppError::Loader(_)));
    }
}
