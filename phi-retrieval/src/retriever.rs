use async_trait::async_trait;
use deid_common::AppError;

use crate::document::Document;

/// Thin adapter over an external regulation vector store. A retriever
/// failure is never fatal to the pipeline — callers fall back to
/// [`crate::minimal_context::minimal_context`] and record `rag_used=false`.
#[async_trait]
pub trait RegulationRetriever: Send + Sync {
    async fn retrieve_by_context(&self, text: &str, k: usize) -> Result<Vec<Document>, AppError>;

    async fn get_phi_definitions(&self, types: &[String]) -> Result<Vec<Document>, AppError>;
}

/// A retriever that is simply not configured — every call fails, which
/// `phi-identifier` interprets as "fall back to minimal context".
pub struct NullRetriever;

#[async_trait]
impl RegulationRetriever for NullRetriever {
    async fn retrieve_by_context(&self, _text: &str, _k: usize) -> Result<Vec<Document>, AppError> {
        Err(AppError::Retriever("no regulation store configured".to_string()))
    }

    async fn get_phi_definitions(&self, _types: &[String]) -> Result<Vec<Document>, AppError> {
        Err(AppError::Retriever("no regulation store configured".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn null_retriever_always_errors() {
        let retriever = NullRetriever;
        assert!(retriever.retrieve_by_context("query", 3).await.is_err());
        assert!(retriever.get_phi_definitions(&["NAME".to_string()]).await.is_err());
    }
}
