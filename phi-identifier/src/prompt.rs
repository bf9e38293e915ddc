use std::collections::BTreeMap;

use phi_tools::ToolResult;
use phi_types::{PromptFormat, TypeRegistry};

const SYSTEM_PREAMBLE: &str = "You are a Protected Health Information (PHI) de-identification \
expert. Identify every span of PHI in the provided text and classify it using only the types \
listed below, or CUSTOM:<name> for anything not covered.";

const MAX_HINT_SAMPLES: usize = 5;

/// Assemble the system + user prompt pair fed to the structured-output LLM
/// call. `context` is either rendered retrieved regulation snippets or the
/// built-in minimal context (see `phi_retrieval::render_context`); `hints`
/// are deterministic tool results for the same chunk, or empty.
pub fn build_prompt(
    registry: &TypeRegistry,
    context: &str,
    hints: &[ToolResult],
    chunk_text: &str,
) -> (String, String) {
    let type_list = registry.get_types_for_prompt(PromptFormat::List, true, true, true);

    let mut system = String::new();
    system.push_str(SYSTEM_PREAMBLE);
    system.push_str("\n\n");
    system.push_str(&type_list);

    let mut user = String::new();
    user.push_str("Regulation context:\n");
    user.push_str(context);
    user.push_str("\n\n");

    if !hints.is_empty() {
        user.push_str(&render_hints_block(hints));
        user.push_str("\n\n");
    }

    user.push_str("Text to analyze:\n");
    user.push_str(chunk_text);

    (system, user)
}

/// Render pre-scan hints grouped by PHI type, deduped by text, showing at
/// most `MAX_HINT_SAMPLES` examples per type plus a count of the rest.
fn render_hints_block(hints: &[ToolResult]) -> String {
    let mut grouped: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for hint in hints {
        let texts = grouped.entry(hint.phi_type.as_str()).or_default();
        if !texts.contains(&hint.text.as_str()) {
            texts.push(&hint.text);
        }
    }

    let mut lines = vec!["--- pre-scan hints ---".to_string()];
    for (phi_type, texts) in grouped {
        let shown: Vec<&str> = texts.iter().take(MAX_HINT_SAMPLES).copied().collect();
        let remainder = texts.len().saturating_sub(shown.len());
        let mut line = format!("  {phi_type}: {}", shown.join(", "));
        if remainder > 0 {
            line.push_str(&format!(" (+{remainder} more)"));
        }
        lines.push(line);
    }
    lines.push("--- end pre-scan hints ---".to_string());
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use phi_types::PHIType;

    fn hint(text: &str, phi_type: PHIType) -> ToolResult {
        ToolResult {
            text: text.to_string(),
            phi_type,
            start_pos: 0,
            end_pos: text.len(),
            confidence: 0.9,
            tool_name: "test".to_string(),
            metadata: serde_json::Map::new(),
        }
    }

    #[test]
    fn includes_type_list_and_chunk_text() {
        let registry = TypeRegistry::new();
        let (system, user) = build_prompt(&registry, "context text", &[], "the chunk");
        assert!(system.contains("NAME"));
        assert!(user.contains("the chunk"));
        assert!(user.contains("context text"));
    }

    #[test]
    fn hints_block_dedupes_and_caps_samples() {
        let mut hints = Vec::new();
        for i in 0..8 {
            hints.push(hint(&format!("id-{i}"), PHIType::Id));
        }
        hints.push(hint("id-0", PHIType::Id));

        let block = render_hints_block(&hints);
        assert!(block.contains("+3 more"));
    }
}
