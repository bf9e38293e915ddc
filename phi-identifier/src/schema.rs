use serde::{Deserialize, Serialize};
use serde_json::json;

/// One raw detection as emitted by the LLM, before post-processing. Field
/// names match the structured-output schema exactly; `phi_type` is still a
/// free-form string here since the registry hasn't normalized it yet.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PHIIdentificationResult {
    pub entity_text: String,
    pub phi_type: String,
    #[serde(default)]
    pub custom_type_name: Option<String>,
    #[serde(default)]
    pub custom_type_description: Option<String>,
    pub start_position: i64,
    pub end_position: i64,
    pub confidence: f32,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub regulation_source: Option<String>,
    #[serde(default)]
    pub masking_action: Option<String>,
}

/// The raw structured-output envelope. `total_entities`/`has_phi` are never
/// trusted from the model — the caller recomputes them on receipt.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PHIDetectionResponse {
    pub entities: Vec<PHIIdentificationResult>,
    #[serde(default)]
    pub total_entities: i64,
    #[serde(default)]
    pub has_phi: bool,
}

impl PHIDetectionResponse {
    /// Normalize the self-reported counters against the actual entity list.
    pub fn normalized(mut self) -> Self {
        self.total_entities = self.entities.len() as i64;
        self.has_phi = !self.entities.is_empty();
        self
    }
}

/// JSON Schema for `PHIDetectionResponse`, handed to the LLM client as the
/// structured-output contract.
pub fn phi_detection_schema() -> serde_json::Value {
    json!({
        "type": "object",
        "properties": {
            "entities": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "entity_text": { "type": "string" },
                        "phi_type": { "type": "string" },
                        "custom_type_name": { "type": ["string", "null"] },
                        "custom_type_description": { "type": ["string", "null"] },
                        "start_position": { "type": "integer" },
                        "end_position": { "type": "integer" },
                        "confidence": { "type": "number" },
                        "reason": { "type": "string" },
                        "regulation_source": { "type": ["string", "null"] },
                        "masking_action": { "type": ["string", "null"] }
                    },
                    "required": [
                        "entity_text", "phi_type", "start_position",
                        "end_position", "confidence", "reason"
                    ]
                }
            },
            "total_entities": { "type": "integer" },
            "has_phi": { "type": "boolean" }
        },
        "required": ["entities"]
    })
}
