use phi_types::PHIType;
use regex::Regex;

use crate::tool::{Tool, ToolResult};

struct PatternSpec {
    phi_type: PHIType,
    pattern: Regex,
    confidence: f32,
}

/// Table-driven scanner over precompiled patterns for the PHI types that
/// have a reliable surface shape: Taiwan national ID/ARC, email, URL,
/// IPv4/IPv6, several date spellings, and loosely-confident account/MRN
/// shapes. Patterns with a capture group report the group instead of the
/// whole match (used for the fax pattern, which needs to strip the leading
/// keyword).
pub struct RegexTool {
    patterns: Vec<PatternSpec>,
}

impl Default for RegexTool {
    fn default() -> Self {
        Self::new()
    }
}

impl RegexTool {
    pub fn new() -> Self {
        Self {
            patterns: default_patterns(),
        }
    }

    /// Scan for a single PHI type only.
    pub fn scan_type(&self, text: &str, phi_type: PHIType) -> Vec<ToolResult> {
        self.patterns
            .iter()
            .filter(|p| p.phi_type == phi_type)
            .flat_map(|p| scan_one(self.name(), p, text))
            .collect()
    }
}

impl Tool for RegexTool {
    fn name(&self) -> &str {
        "regex_phi_tool"
    }

    fn supported_types(&self) -> Vec<PHIType> {
        let mut types: Vec<PHIType> = self.patterns.iter().map(|p| p.phi_type).collect();
        types.dedup();
        types
    }

    fn scan(&self, text: &str) -> Vec<ToolResult> {
        self.patterns
            .iter()
            .flat_map(|p| scan_one(self.name(), p, text))
            .collect()
    }
}

fn scan_one(tool_name: &str, spec: &PatternSpec, text: &str) -> Vec<ToolResult> {
    spec.pattern
        .captures_iter(text)
        .map(|caps| {
            let (matched, start, end) = if let Some(group) = caps.get(1) {
                (group.as_str(), group.start(), group.end())
            } else {
                let whole = caps.get(0).expect("capture 0 always present");
                (whole.as_str(), whole.start(), whole.end())
            };
            ToolResult {
                text: matched.to_string(),
                phi_type: spec.phi_type,
                start_pos: start,
                end_pos: end,
                confidence: spec.confidence,
                tool_name: tool_name.to_string(),
                metadata: serde_json::Map::new(),
            }
        })
        .collect()
}

#[allow(clippy::expect_used)]
fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("built-in pattern must compile")
}

fn default_patterns() -> Vec<PatternSpec> {
    vec![
        PatternSpec {
            phi_type: PHIType::Id,
            pattern: compile(r"\b[A-Z][12]\d{8}\b"),
            confidence: 0.95,
        },
        PatternSpec {
            phi_type: PHIType::Id,
            pattern: compile(r"\b[A-Z]{2}\d{8,10}\b"),
            confidence: 0.80,
        },
        PatternSpec {
            phi_type: PHIType::Email,
            pattern: compile(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b"),
            confidence: 0.95,
        },
        PatternSpec {
            phi_type: PHIType::Url,
            pattern: compile(r#"https?://[^\s<>"]+"#),
            confidence: 0.95,
        },
        PatternSpec {
            phi_type: PHIType::Url,
            pattern: compile(r#"www\.[^\s<>"]+"#),
            confidence: 0.90,
        },
        PatternSpec {
            phi_type: PHIType::IpAddress,
            pattern: compile(
                r"\b(?:(?:25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)\.){3}(?:25[0-5]|2[0-4][0-9]|[01]?[0-9][0-9]?)\b",
            ),
            confidence: 0.95,
        },
        PatternSpec {
            phi_type: PHIType::IpAddress,
            pattern: compile(r"\b(?:[0-9a-fA-F]{1,4}:){7}[0-9a-fA-F]{1,4}\b"),
            confidence: 0.90,
        },
        PatternSpec {
            phi_type: PHIType::Date,
            pattern: compile(r"\b\d{4}[-/]\d{1,2}[-/]\d{1,2}\b"),
            confidence: 0.90,
        },
        PatternSpec {
            phi_type: PHIType::Date,
            pattern: compile(r"\b\d{1,2}[-/]\d{1,2}[-/]\d{4}\b"),
            confidence: 0.85,
        },
        PatternSpec {
            phi_type: PHIType::Date,
            pattern: compile(r"(?:民國)?\d{2,4}年\d{1,2}月\d{1,2}日"),
            confidence: 0.90,
        },
        PatternSpec {
            phi_type: PHIType::Date,
            pattern: compile(
                r"(?i)\b(?:January|February|March|April|May|June|July|August|September|October|November|December)\s+\d{1,2},?\s+\d{4}\b",
            ),
            confidence: 0.85,
        },
        PatternSpec {
            phi_type: PHIType::MedicalRecordNumber,
            pattern: compile(r"\b[A-Z]?\d{7,10}\b"),
            confidence: 0.70,
        },
        PatternSpec {
            phi_type: PHIType::AccountNumber,
            pattern: compile(r"\b\d{3}-\d{2}-\d{6,7}-\d\b"),
            confidence: 0.85,
        },
        PatternSpec {
            phi_type: PHIType::AccountNumber,
            pattern: compile(r"\b\d{10,16}\b"),
            confidence: 0.60,
        },
        PatternSpec {
            phi_type: PHIType::Fax,
            pattern: compile(r"(?i)(?:傳真|fax)[^\d]*(\d{2,4}[-\s]?\d{3,4}[-\s]?\d{3,4})"),
            confidence: 0.90,
        },
        PatternSpec {
            phi_type: PHIType::Location,
            pattern: compile(r"[一-鿿]{2,4}(?:市|縣)[一-鿿]{2,4}(?:區|鎮|鄉)"),
            confidence: 0.80,
        },
        PatternSpec {
            phi_type: PHIType::Location,
            pattern: compile(r"\b\d{3,5}\s*[一-鿿]+(?:市|縣|區|路|街|巷|弄|號)"),
            confidence: 0.85,
        },
    ]
}
