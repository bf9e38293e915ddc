use phi_types::PHIType;
use serde::{Deserialize, Serialize};

/// A single detection produced by a deterministic tool. These are *hints*
/// consumed by the identifier, never final output — equality intentionally
/// ignores `confidence`/`tool_name`/`metadata` so dedup keys off identity.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolResult {
    pub text: String,
    pub phi_type: PHIType,
    pub start_pos: usize,
    pub end_pos: usize,
    pub confidence: f32,
    pub tool_name: String,
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

impl PartialEq for ToolResult {
    fn eq(&self, other: &Self) -> bool {
        self.text == other.text && self.phi_type == other.phi_type && self.start_pos == other.start_pos
    }
}

impl Eq for ToolResult {}

/// A fast, stateless PHI scanner. Safe to share across threads (`Send +
/// Sync`) since tools carry no mutable state.
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;
    fn supported_types(&self) -> Vec<PHIType>;
    fn scan(&self, text: &str) -> Vec<ToolResult>;
}

/// Merge overlapping results from a single tool's own output: sort by
/// `(start_pos, -confidence)`, then keep the first result of each
/// overlapping run unless a later one strictly beats its confidence (or
/// ties and is longer).
pub fn merge_results(mut results: Vec<ToolResult>) -> Vec<ToolResult> {
    if results.is_empty() {
        return results;
    }
    results.sort_by(|a, b| {
        a.start_pos
            .cmp(&b.start_pos)
            .then(b.confidence.partial_cmp(&a.confidence).unwrap_or(std::cmp::Ordering::Equal))
    });

    let mut merged: Vec<ToolResult> = Vec::with_capacity(results.len());
    let mut current = results.remove(0);

    for candidate in results {
        if candidate.start_pos < current.end_pos {
            let candidate_len = candidate.end_pos.saturating_sub(candidate.start_pos);
            let current_len = current.end_pos.saturating_sub(current.start_pos);
            if candidate.confidence > current.confidence {
                current = candidate;
            } else if (candidate.confidence - current.confidence).abs() < f32::EPSILON
                && candidate_len > current_len
            {
                current = candidate;
            }
        } else {
            merged.push(current);
            current = candidate;
        }
    }
    merged.push(current);
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(text: &str, start: usize, end: usize, confidence: f32) -> ToolResult {
        ToolResult {
            text: text.to_string(),
            phi_type: PHIType::Id,
            start_pos: start,
            end_pos: end,
            confidence,
            tool_name: "test".to_string(),
            metadata: serde_json::Map::new(),
        }
    }

    #[test]
    fn merges_overlapping_by_confidence() {
        let results = vec![result("a", 0, 5, 0.6), result("b", 2, 8, 0.9)];
        let merged = merge_results(results);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].text, "b");
    }

    #[test]
    fn keeps_non_overlapping_results() {
        let results = vec![result("a", 0, 5, 0.6), result("b", 10, 15, 0.9)];
        let merged = merge_results(results);
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn tie_confidence_prefers_longer_span() {
        let results = vec![result("a", 0, 5, 0.9), result("b", 0, 8, 0.9)];
        let merged = merge_results(results);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].text, "b");
    }
}
