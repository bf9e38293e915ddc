use phi_types::PHIType;
use regex::Regex;

use crate::tool::{Tool, ToolResult};

/// Letter → two-digit value for the Taiwan ID checksum. Not a simple
/// A=10.. sequence: `I` and `O` are assigned out of order (34, 35) to skip
/// visually-confusable digits.
fn letter_value(letter: char) -> Option<u32> {
    match letter {
        'A' => Some(10),
        'B' => Some(11),
        'C' => Some(12),
        'D' => Some(13),
        'E' => Some(14),
        'F' => Some(15),
        'G' => Some(16),
        'H' => Some(17),
        'I' => Some(34),
        'J' => Some(18),
        'K' => Some(19),
        'L' => Some(20),
        'M' => Some(21),
        'N' => Some(22),
        'O' => Some(35),
        'P' => Some(23),
        'Q' => Some(24),
        'R' => Some(25),
        'S' => Some(26),
        'T' => Some(27),
        'U' => Some(28),
        'V' => Some(29),
        'W' => Some(32),
        'X' => Some(30),
        'Y' => Some(31),
        'Z' => Some(33),
        _ => None,
    }
}

const TW_ID_WEIGHTS: [u32; 11] = [1, 9, 8, 7, 6, 5, 4, 3, 2, 1, 1];

/// Validate a Taiwan National ID checksum: `[A-Z][12]\d{8}`, weighted sum of
/// (letter's two digits followed by the nine body digits) against
/// `TW_ID_WEIGHTS`, valid iff the sum is a multiple of 10.
fn validate_taiwan_id(id_number: &str) -> bool {
    let chars: Vec<char> = id_number.chars().collect();
    if chars.len() != 10 {
        return false;
    }
    let Some(letter_val) = letter_value(chars[0].to_ascii_uppercase()) else {
        return false;
    };
    let mut digits = vec![letter_val / 10, letter_val % 10];
    for c in &chars[1..] {
        match c.to_digit(10) {
            Some(d) => digits.push(d),
            None => return false,
        }
    }
    let total: u32 = digits.iter().zip(TW_ID_WEIGHTS.iter()).map(|(d, w)| d * w).sum();
    total % 10 == 0
}

/// Basic ARC (resident certificate) validation: both leading characters
/// must be valid letter codes. Full validation would require knowing the
/// issue date, which this tool doesn't have.
fn validate_taiwan_arc(arc_number: &str) -> bool {
    let chars: Vec<char> = arc_number.chars().collect();
    if chars.len() != 10 {
        return false;
    }
    letter_value(chars[0].to_ascii_uppercase()).is_some()
        && letter_value(chars[1].to_ascii_uppercase()).is_some()
}

pub struct IdValidatorTool {
    validate_checksum: bool,
    tw_id_pattern: Regex,
    tw_arc_pattern: Regex,
}

impl Default for IdValidatorTool {
    fn default() -> Self {
        Self::new(true)
    }
}

impl IdValidatorTool {
    #[allow(clippy::expect_used)]
    pub fn new(validate_checksum: bool) -> Self {
        Self {
            validate_checksum,
            tw_id_pattern: Regex::new(r"\b[A-Z][12]\d{8}\b").expect("valid pattern"),
            tw_arc_pattern: Regex::new(r"\b[A-Z]{2}\d{8}\b").expect("valid pattern"),
        }
    }

    fn scan_taiwan_id(&self, text: &str) -> Vec<ToolResult> {
        self.tw_id_pattern
            .find_iter(text)
            .map(|m| {
                let id_number = m.as_str();
                let is_valid = validate_taiwan_id(id_number);
                let confidence = if is_valid {
                    0.99
                } else if self.validate_checksum {
                    0.60
                } else {
                    0.70
                };
                let mut metadata = serde_json::Map::new();
                metadata.insert("id_type".to_string(), "TW_NATIONAL_ID".into());
                metadata.insert("checksum_valid".to_string(), is_valid.into());
                ToolResult {
                    text: id_number.to_string(),
                    phi_type: PHIType::Id,
                    start_pos: m.start(),
                    end_pos: m.end(),
                    confidence,
                    tool_name: self.name().to_string(),
                    metadata,
                }
            })
            .collect()
    }

    fn scan_taiwan_arc(&self, text: &str) -> Vec<ToolResult> {
        self.tw_arc_pattern
            .find_iter(text)
            .map(|m| {
                let arc_number = m.as_str();
                let is_valid = validate_taiwan_arc(arc_number);
                let confidence = if is_valid { 0.95 } else { 0.65 };
                let mut metadata = serde_json::Map::new();
                metadata.insert("id_type".to_string(), "TW_ARC".into());
                metadata.insert("checksum_valid".to_string(), is_valid.into());
                ToolResult {
                    text: arc_number.to_string(),
                    phi_type: PHIType::Id,
                    start_pos: m.start(),
                    end_pos: m.end(),
                    confidence,
                    tool_name: self.name().to_string(),
                    metadata,
                }
            })
            .collect()
    }

    /// Validate a single ID value (no surrounding text), returning
    /// `(is_valid, id_kind)`.
    pub fn validate_id(&self, id_number: &str) -> (bool, &'static str) {
        let candidate = id_number.trim().to_uppercase();
        if self.tw_id_pattern.is_match(&candidate) {
            return (validate_taiwan_id(&candidate), "TW_NATIONAL_ID");
        }
        if self.tw_arc_pattern.is_match(&candidate) {
            return (validate_taiwan_arc(&candidate), "TW_ARC");
        }
        (false, "UNKNOWN")
    }
}

impl Tool for IdValidatorTool {
    fn name(&self) -> &str {
        "id_validator_tool"
    }

    fn supported_types(&self) -> Vec<PHIType> {
        vec![PHIType::Id, PHIType::AccountNumber]
    }

    fn scan(&self, text: &str) -> Vec<ToolResult> {
        let mut results = self.scan_taiwan_id(text);
        results.extend(self.scan_taiwan_arc(text));
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_checksum_scores_high() {
        let tool = IdValidatorTool::new(true);
        let (valid, kind) = tool.validate_id("A123456789");
        assert!(valid);
        assert_eq!(kind, "TW_NATIONAL_ID");
    }

    #[test]
    fn invalid_checksum_scores_low_but_still_reported() {
        let tool = IdValidatorTool::new(true);
        let results = tool.scan("ID: A123456780");
        assert_eq!(results.len(), 1);
        assert!((results[0].confidence - 0.60).abs() < f32::EPSILON);
    }

    #[test]
    fn unknown_shape_is_unknown() {
        let tool = IdValidatorTool::default();
        let (valid, kind) = tool.validate_id("not-an-id");
        assert!(!valid);
        assert_eq!(kind, "UNKNOWN");
    }
}
