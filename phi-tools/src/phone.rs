use phi_types::PHIType;
use regex::Regex;

use crate::tool::{Tool, ToolResult};

struct PhonePattern {
    pattern: Regex,
    phone_type: &'static str,
    region: &'static str,
    confidence: f32,
}

/// Phone/fax scanner. Distinguishes phone from fax by looking back up to 15
/// characters for a `fax`/`傳真` keyword, and boosts confidence by 0.05
/// (capped at 0.99) when a contact keyword appears within the preceding 20
/// characters. Matches that look like an ISO date or a Taiwan ID are
/// dropped outright — both shapes collide with the looser phone patterns.
pub struct PhoneTool {
    patterns: Vec<PhonePattern>,
    keyword_pattern: Regex,
    exclusion_patterns: Vec<Regex>,
}

impl Default for PhoneTool {
    fn default() -> Self {
        Self::new()
    }
}

impl PhoneTool {
    #[allow(clippy::expect_used)]
    pub fn new() -> Self {
        let compile = |p: &str| Regex::new(p).expect("built-in phone pattern must compile");
        Self {
            patterns: vec![
                PhonePattern {
                    pattern: compile(r"\b09\d{2}[-\s]?\d{3}[-\s]?\d{3}\b"),
                    phone_type: "MOBILE",
                    region: "TW",
                    confidence: 0.95,
                },
                PhonePattern {
                    pattern: compile(r"\(0[2-9]\)\s?\d{4}[-\s]?\d{4}\b"),
                    phone_type: "LANDLINE",
                    region: "TW",
                    confidence: 0.95,
                },
                PhonePattern {
                    pattern: compile(r"\b0[2-9][-\s]?\d{4}[-\s]?\d{4}\b"),
                    phone_type: "LANDLINE",
                    region: "TW",
                    confidence: 0.90,
                },
                PhonePattern {
                    pattern: compile(r"\b[2-9]\d{3}[-\s]?\d{4}\b"),
                    phone_type: "LANDLINE",
                    region: "TW",
                    confidence: 0.70,
                },
                PhonePattern {
                    pattern: compile(r"\+886[-\s]?[2-9][-\s]?\d{4}[-\s]?\d{4}\b"),
                    phone_type: "LANDLINE",
                    region: "TW",
                    confidence: 0.98,
                },
                PhonePattern {
                    pattern: compile(r"\+886[-\s]?9\d{2}[-\s]?\d{3}[-\s]?\d{3}\b"),
                    phone_type: "MOBILE",
                    region: "TW",
                    confidence: 0.98,
                },
                PhonePattern {
                    pattern: compile(r"\+\d{1,3}[-\s]?\d{2,4}[-\s]?\d{3,4}[-\s]?\d{3,4}\b"),
                    phone_type: "INTERNATIONAL",
                    region: "UNKNOWN",
                    confidence: 0.85,
                },
            ],
            keyword_pattern: compile(r"(?i)電話|手機|聯絡|連絡|phone|tel|mobile|cell|contact|fax|傳真"),
            exclusion_patterns: vec![
                compile(r"\d{4}[-/]\d{2}[-/]\d{2}"),
                compile(r"[A-Z][12]\d{8}"),
            ],
        }
    }

    fn should_exclude(&self, text: &str) -> bool {
        self.exclusion_patterns.iter().any(|p| p.is_match(text))
    }

    fn calculate_confidence(&self, text: &str, start: usize, base_confidence: f32) -> f32 {
        let context_start = start.saturating_sub(20).min(start);
        let context_start = find_char_boundary_at_or_before(text, context_start);
        let context = &text[context_start..start];
        if self.keyword_pattern.is_match(context) {
            (base_confidence + 0.05).min(0.99)
        } else {
            base_confidence
        }
    }

    fn determine_phi_type(&self, text: &str, start: usize) -> PHIType {
        let context_start = start.saturating_sub(15);
        let context_start = find_char_boundary_at_or_before(text, context_start);
        let context = text[context_start..start].to_lowercase();
        if context.contains("fax") || context.contains("傳真") {
            PHIType::Fax
        } else {
            PHIType::Phone
        }
    }
}

fn find_char_boundary_at_or_before(text: &str, idx: usize) -> usize {
    let mut idx = idx.min(text.len());
    while idx > 0 && !text.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}

fn normalize_phone(phone: &str) -> String {
    phone.chars().filter(|c| c.is_ascii_digit() || *c == '+').collect()
}

impl Tool for PhoneTool {
    fn name(&self) -> &str {
        "phone_tool"
    }

    fn supported_types(&self) -> Vec<PHIType> {
        vec![PHIType::Phone, PHIType::Fax, PHIType::Contact]
    }

    fn scan(&self, text: &str) -> Vec<ToolResult> {
        let mut results = Vec::new();
        let mut found: std::collections::HashSet<usize> = std::collections::HashSet::new();

        for spec in &self.patterns {
            for m in spec.pattern.find_iter(text) {
                if found.contains(&m.start()) {
                    continue;
                }
                let phone_number = m.as_str();
                if self.should_exclude(phone_number) {
                    continue;
                }
                let confidence = self.calculate_confidence(text, m.start(), spec.confidence);
                let phi_type = self.determine_phi_type(text, m.start());

                let mut metadata = serde_json::Map::new();
                metadata.insert("phone_type".to_string(), spec.phone_type.into());
                metadata.insert("region".to_string(), spec.region.into());
                metadata.insert("normalized".to_string(), normalize_phone(phone_number).into());

                results.push(ToolResult {
                    text: phone_number.to_string(),
                    phi_type,
                    start_pos: m.start(),
                    end_pos: m.end(),
                    confidence,
                    tool_name: self.name().to_string(),
                    metadata,
                });

                for pos in m.start()..m.end() {
                    found.insert(pos);
                }
            }
        }
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_mobile_number() {
        let tool = PhoneTool::new();
        let results = tool.scan("手機: 0912-345-678");
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].phi_type, PHIType::Phone);
        assert!(results[0].confidence > 0.95);
    }

    #[test]
    fn relabels_as_fax_from_context() {
        let tool = PhoneTool::new();
        let results = tool.scan("傳真: 02-1234-5678");
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].phi_type, PHIType::Fax);
    }

    #[test]
    fn excludes_date_like_matches() {
        let tool = PhoneTool::new();
        let results = tool.scan("Visit date: 2024-03-05");
        assert!(results.is_empty());
    }

    #[test]
    fn excludes_taiwan_id_like_matches() {
        let tool = PhoneTool::new();
        let results = tool.scan("ID A123456789 on file");
        assert!(results.iter().all(|r| r.text != "1234 5678"));
    }

    #[test]
    fn normalizes_to_digits_and_plus() {
        let tool = PhoneTool::new();
        let results = tool.scan("Call +886-2-1234-5678");
        assert_eq!(results.len(), 1);
        let normalized = results[0].metadata.get("normalized").unwrap().as_str().unwrap();
        assert_eq!(normalized, "+886212345678");
    }
}
