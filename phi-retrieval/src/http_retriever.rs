use async_trait::async_trait;
use deid_common::AppError;
use serde::Deserialize;

use crate::document::Document;
use crate::retriever::RegulationRetriever;

/// Reference adapter over a regulation vector-store HTTP API. Expects a
/// `POST {base_url}/retrieve {query, k}` endpoint returning
/// `{documents: [{page_content, source, score}]}`, and a
/// `POST {base_url}/definitions {types}` endpoint with the same response
/// shape. A real deployment's vector store and embedding model are out of
/// scope for this core; this is one reasonable wire contract for it.
pub struct HttpRetriever {
    base_url: String,
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct DocumentsResponse {
    documents: Vec<Document>,
}

impl HttpRetriever {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl RegulationRetriever for HttpRetriever {
    async fn retrieve_by_context(&self, text: &str, k: usize) -> Result<Vec<Document>, AppError> {
        let url = format!("{}/retrieve", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&serde_json::json!({ "query": text, "k": k }))
            .send()
            .await?
            .error_for_status()?
            .json::<DocumentsResponse>()
            .await?;
        Ok(response.documents)
    }

    async fn get_phi_definitions(&self, types: &[String]) -> Result<Vec<Document>, AppError> {
        let url = format!("{}/definitions", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&serde_json::json!({ "types": types }))
            .send()
            .await?
            .error_for_status()?
            .json::<DocumentsResponse>()
            .await?;
        Ok(response.documents)
    }
}
