use serde::{Deserialize, Serialize};

/// A single retrieved snippet: the regulation text plus where it came from.
/// `score` is the retriever's own ranking score, not a probability.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Document {
    pub page_content: String,
    pub source: String,
    pub score: Option<f32>,
}

impl Document {
    pub fn new(page_content: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            page_content: page_content.into(),
            source: source.into(),
            score: None,
        }
    }
}
