use serde::{Deserialize, Serialize};

use crate::phi_type::PHIType;

/// An immutable PHI detection, in whatever coordinate space the producer
/// uses (chunk-local when freshly parsed from the LLM, document-global
/// once merged by the chunk processor). Created by the identifier,
/// consumed by the masking engine; never mutated in place — downstream
/// code that needs a changed position builds a new value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PHIEntity {
    #[serde(rename = "type")]
    pub phi_type: PHIType,
    pub text: String,
    pub start_pos: usize,
    pub end_pos: usize,
    pub confidence: f32,
    pub reason: String,
    pub regulation_source: Option<String>,
    pub custom_type: Option<String>,
}

impl PHIEntity {
    pub fn len(&self) -> usize {
        self.end_pos.saturating_sub(self.start_pos)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Shift this entity's positions by `offset`, as done when converting
    /// chunk-local offsets into document-global coordinates.
    pub fn shifted(&self, offset: usize) -> Self {
        Self {
            start_pos: self.start_pos + offset,
            end_pos: self.end_pos + offset,
            ..self.clone()
        }
    }
}
