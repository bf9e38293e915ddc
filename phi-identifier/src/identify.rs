use std::sync::Arc;
use std::time::Instant;

use phi_tools::{Tool, ToolResult};
use phi_types::{PHIEntity, PHIType, TypeRegistry};

use crate::llm_client::StructuredLlmClient;
use crate::prompt::build_prompt;
use crate::schema::PHIIdentificationResult;

/// Output of identifying PHI in a single chunk. Positions in `entities` are
/// already document-global (shifted by `chunk_start_pos`).
#[derive(Debug, Clone)]
pub struct IdentificationOutcome {
    pub entities: Vec<PHIEntity>,
    pub processing_time_ms: f64,
    pub tool_calls_made: usize,
    pub rag_used: bool,
}

/// Run the full C4 flow for one chunk: assemble the prompt, call the LLM,
/// then apply the deterministic post-processing rules in order. Any LLM
/// failure yields an empty entity list and propagates the error to the
/// caller (the chunk processor records it against the chunk; C4 never
/// retries on its own).
pub async fn identify_chunk(
    registry: &TypeRegistry,
    llm_client: &dyn StructuredLlmClient,
    context: &str,
    rag_used: bool,
    tool_hints: &[ToolResult],
    chunk_text: &str,
    chunk_start_pos: usize,
) -> Result<IdentificationOutcome, deid_common::AppError> {
    let started = Instant::now();
    let (system_prompt, user_prompt) = build_prompt(registry, context, tool_hints, chunk_text);

    let response = llm_client.invoke_structured(&system_prompt, &user_prompt).await?;

    let entities = post_process(registry, response.entities, chunk_text, chunk_start_pos);

    Ok(IdentificationOutcome {
        entities,
        processing_time_ms: started.elapsed().as_secs_f64() * 1000.0,
        tool_calls_made: tool_hints.len(),
        rag_used,
    })
}

/// Run every scanner over `chunk_text` and merge each tool's own overlaps.
/// Tool calls are cheap and independent, so results are simply
/// concatenated across tools (cross-tool overlap resolution is the
/// identifier's job via `map_alias`/dedup, not the scanners').
pub fn run_tools(tools: &[Arc<dyn Tool>], chunk_text: &str) -> Vec<ToolResult> {
    tools
        .iter()
        .flat_map(|tool| phi_tools::merge_results(tool.scan(chunk_text)))
        .collect()
}

fn post_process(
    registry: &TypeRegistry,
    raw_entities: Vec<PHIIdentificationResult>,
    chunk_text: &str,
    chunk_start_pos: usize,
) -> Vec<PHIEntity> {
    let mut entities: Vec<PHIEntity> = Vec::with_capacity(raw_entities.len());
    let mut seen: Vec<(String, i64, i64)> = Vec::with_capacity(raw_entities.len());

    for mut raw in raw_entities {
        // Rule 1: normalise the raw phi_type via the registry's alias map.
        let (phi_type, mut custom_type) = registry.map_alias(&raw.phi_type);

        // Rule 2: synthesize a custom type name if the model left it blank.
        if phi_type == PHIType::Custom && custom_type.is_none() {
            if let Some(name) = raw.custom_type_name.take() {
                custom_type = Some(name);
            } else {
                let synthesized: String = raw.entity_text.chars().take(50).collect();
                tracing::warn!(text = %synthesized, "CUSTOM entity missing custom_type_name, synthesizing one");
                custom_type = Some(synthesized);
            }
        }

        // Rule 3: clamp start <= end rather than reject.
        let (mut start, mut end) = (raw.start_position, raw.end_position);
        if start > end {
            std::mem::swap(&mut start, &mut end);
        }
        let mut start = start.max(0) as usize;
        let mut end = end.max(0) as usize;

        // Rule 4: repair positions against the chunk if they don't bound
        // entity_text; if the text can't be found either, keep the
        // supplied positions and warn.
        let slice_matches = chunk_text
            .get(start..end.min(chunk_text.len()))
            .map(|s| s == raw.entity_text)
            .unwrap_or(false);
        if !slice_matches {
            if let Some(found_start) = chunk_text.find(&raw.entity_text) {
                start = found_start;
                end = found_start + raw.entity_text.len();
            } else {
                tracing::warn!(
                    text = %raw.entity_text,
                    "entity text not found in chunk, keeping reported positions"
                );
            }
        }

        // Rule 5: dedupe by (entity_text, start, end) in chunk coordinates.
        let key = (raw.entity_text.clone(), start as i64, end as i64);
        if seen.contains(&key) {
            continue;
        }
        seen.push(key);

        // Rule 6: shift into document coordinates.
        entities.push(PHIEntity {
            phi_type,
            text: raw.entity_text,
            start_pos: start + chunk_start_pos,
            end_pos: end + chunk_start_pos,
            confidence: raw.confidence.clamp(0.0, 1.0),
            reason: raw.reason,
            regulation_source: raw.regulation_source,
            custom_type,
        });
    }

    entities
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::PHIDetectionResponse;
    use async_trait::async_trait;

    struct StubClient(PHIDetectionResponse);

    #[async_trait]
    impl StructuredLlmClient for StubClient {
        async fn invoke_structured(
            &self,
            _system_prompt: &str,
            _user_prompt: &str,
        ) -> Result<PHIDetectionResponse, deid_common::AppError> {
            Ok(self.0.clone())
        }
    }

    fn raw(text: &str, phi_type: &str, start: i64, end: i64) -> PHIIdentificationResult {
        PHIIdentificationResult {
            entity_text: text.to_string(),
            phi_type: phi_type.to_string(),
            custom_type_name: None,
            custom_type_description: None,
            start_position: start,
            end_position: end,
            confidence: 0.9,
            reason: "test".to_string(),
            regulation_source: None,
            masking_action: None,
        }
    }

    #[tokio::test]
    async fn identifies_and_shifts_to_document_coordinates() {
        let registry = TypeRegistry::new();
        let response = PHIDetectionResponse {
            entities: vec![raw("John Doe", "NAME", 0, 8)],
            total_entities: 1,
            has_phi: true,
        };
        let client = StubClient(response);

        let outcome = identify_chunk(&registry, &client, "context", false, &[], "John Doe is here", 100)
            .await
            .unwrap();

        assert_eq!(outcome.entities.len(), 1);
        assert_eq!(outcome.entities[0].start_pos, 100);
        assert_eq!(outcome.entities[0].end_pos, 108);
    }

    #[test]
    fn repairs_positions_by_searching_chunk() {
        let registry = TypeRegistry::new();
        let raw_entities = vec![raw("John Doe", "NAME", 0, 4)];
        let entities = post_process(&registry, raw_entities, "Patient John Doe arrived", 0);
        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0].start_pos, 8);
        assert_eq!(entities[0].end_pos, 16);
    }

    #[test]
    fn swaps_inverted_positions() {
        let registry = TypeRegistry::new();
        let raw_entities = vec![raw("abc", "NAME", 3, 0)];
        let entities = post_process(&registry, raw_entities, "xxxabcxxx", 0);
        assert_eq!(entities.len(), 1);
    }

    #[test]
    fn deduplicates_identical_spans() {
        let registry = TypeRegistry::new();
        let raw_entities = vec![raw("abc", "NAME", 0, 3), raw("abc", "NAME", 0, 3)];
        let entities = post_process(&registry, raw_entities, "abc", 0);
        assert_eq!(entities.len(), 1);
    }

    #[test]
    fn synthesizes_custom_type_name_when_missing() {
        let registry = TypeRegistry::new();
        let raw_entities = vec![raw("occupation: farmer", "CUSTOM", 0, 18)];
        let entities = post_process(&registry, raw_entities, "occupation: farmer", 0);
        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0].custom_type.as_deref(), Some("occupation: farmer"));
    }
}
