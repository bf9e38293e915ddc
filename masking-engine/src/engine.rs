use std::collections::HashMap;

use phi_types::{PHIEntity, PHIType};
use serde::{Deserialize, Serialize};

use crate::config::MaskingEngineConfig;
use crate::date_shift::DateShiftingStrategy;
use crate::generalization::GeneralizationStrategy;
use crate::partial::PartialMaskingStrategy;
use crate::pseudonymization::PseudonymizationStrategy;
use crate::redaction::RedactionStrategy;
use crate::strategy::{default_for, MaskingStrategy, StrategyType};
use crate::suppression::SuppressionStrategy;

/// One applied replacement, recorded for the masking report.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MaskingRecord {
    pub phi_type: PHIType,
    pub strategy: StrategyType,
    pub original_text: String,
    pub replacement: String,
    pub start_pos: usize,
    pub end_pos: usize,
}

/// The masked document plus a record of every substitution made, so a
/// caller can audit what happened without re-deriving it from the entity
/// list and the masked text.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MaskingReport {
    pub masked_text: String,
    pub replacements: Vec<MaskingRecord>,
    pub leaked_originals: Vec<String>,
}

/// Applies a resolved strategy to each entity in a document, right to left,
/// so earlier spans' byte positions stay valid as later ones are rewritten.
pub struct MaskingEngine {
    phi_specific_strategies: HashMap<PHIType, StrategyType>,
    strategies: HashMap<StrategyType, Box<dyn MaskingStrategy>>,
    verify_no_leaks: bool,
}

impl MaskingEngine {
    pub fn new(config: MaskingEngineConfig) -> Self {
        let mut strategies: HashMap<StrategyType, Box<dyn MaskingStrategy>> = HashMap::new();
        strategies.insert(
            StrategyType::Redaction,
            Box::new(RedactionStrategy {
                placeholder: config.redaction_placeholder,
                preserve_length: config.redaction_preserve_length,
                mask_char: config.redaction_mask_char,
            }),
        );
        strategies.insert(StrategyType::Generalization, Box::new(GeneralizationStrategy::default()));
        strategies.insert(
            StrategyType::Pseudonymization,
            Box::new(PseudonymizationStrategy {
                salt: config.pseudonymization_salt,
                hash_length: config.pseudonymization_hash_length,
                ..PseudonymizationStrategy::default()
            }),
        );
        strategies.insert(
            StrategyType::DateShifting,
            Box::new(DateShiftingStrategy {
                offset_days: config.date_offset_days,
                offset_range: config.date_offset_range,
                preserve_year: config.date_preserve_year,
                ..DateShiftingStrategy::new(config.date_seed)
            }),
        );
        strategies.insert(
            StrategyType::PartialMasking,
            Box::new(PartialMaskingStrategy {
                keep_prefix: config.partial_keep_prefix,
                keep_suffix: config.partial_keep_suffix,
                mask_char: config.partial_mask_char,
            }),
        );
        strategies.insert(StrategyType::Suppression, Box::new(SuppressionStrategy));

        Self {
            phi_specific_strategies: config.phi_specific_strategies,
            strategies,
            verify_no_leaks: config.verify_no_leaks,
        }
    }

    fn resolve(&self, phi_type: PHIType) -> StrategyType {
        self.phi_specific_strategies.get(&phi_type).copied().unwrap_or_else(|| default_for(phi_type))
    }

    /// Produce the masked document. `entities` should already be
    /// deduplicated and non-overlapping (the orchestrator's job); overlap
    /// here is handled defensively by clamping, not by re-resolving it.
    pub fn mask_document(&mut self, text: &str, entities: &[PHIEntity]) -> MaskingReport {
        let mut ordered: Vec<&PHIEntity> = entities.iter().collect();
        ordered.sort_by(|a, b| b.start_pos.cmp(&a.start_pos));

        let mut output = text.to_string();
        let mut replacements = Vec::with_capacity(ordered.len());

        for entity in ordered {
            let strategy_type = self.resolve(entity.phi_type);
            let Some(strategy) = self.strategies.get_mut(&strategy_type) else {
                tracing::error!(?strategy_type, "unregistered strategy type, skipping entity");
                continue;
            };
            let replacement = strategy.mask(entity);

            let Some((start, end)) = clamp_to_boundary(&output, entity.start_pos, entity.end_pos) else {
                tracing::warn!(
                    text = %entity.text,
                    start = entity.start_pos,
                    end = entity.end_pos,
                    "entity span is not a valid byte range in the current document, skipping"
                );
                continue;
            };
            output.replace_range(start..end, &replacement);

            replacements.push(MaskingRecord {
                phi_type: entity.phi_type,
                strategy: strategy_type,
                original_text: entity.text.clone(),
                replacement,
                start_pos: start,
                end_pos: end,
            });
        }

        let leaked_originals = if self.verify_no_leaks {
            find_leaked_originals(&output, entities)
        } else {
            Vec::new()
        };

        MaskingReport {
            masked_text: output,
            replacements,
            leaked_originals,
        }
    }
}

/// Clamp `start..end` to `text`'s length and the nearest char boundary at or
/// before each point, rejecting the span only if it collapses to nothing.
fn clamp_to_boundary(text: &str, start: usize, end: usize) -> Option<(usize, usize)> {
    let len = text.len();
    let mut start = start.min(len);
    let mut end = end.min(len);
    while start > 0 && !text.is_char_boundary(start) {
        start -= 1;
    }
    while end > 0 && !text.is_char_boundary(end) {
        end -= 1;
    }
    if start >= end {
        return None;
    }
    Some((start, end))
}

/// Every strategy but `GENERALIZATION` is expected to remove the original
/// text entirely; this is a post-hoc warning check, not an error, since a
/// coincidental substring match (common words) is possible and not a leak.
fn find_leaked_originals(masked_text: &str, entities: &[PHIEntity]) -> Vec<String> {
    entities
        .iter()
        .filter(|e| !e.text.is_empty() && masked_text.contains(&e.text))
        .map(|e| e.text.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity(phi_type: PHIType, text: &str, start: usize, end: usize) -> PHIEntity {
        PHIEntity {
            phi_type,
            text: text.to_string(),
            start_pos: start,
            end_pos: end,
            confidence: 0.9,
            reason: "test".to_string(),
            regulation_source: None,
            custom_type: None,
        }
    }

    #[test]
    fn right_to_left_pass_keeps_earlier_spans_valid() {
        let mut config = MaskingEngineConfig::default();
        config.phi_specific_strategies.insert(PHIType::Name, StrategyType::Redaction);
        let mut engine = MaskingEngine::new(config);
        let text = "John, age 94";
        let entities = vec![entity(PHIType::Name, "John", 0, 4), entity(PHIType::AgeOver89, "94", 10, 12)];

        let report = engine.mask_document(text, &entities);
        assert_eq!(report.masked_text, "[REDACTED], age \u{2265}90 years");
    }

    #[test]
    fn default_routing_applies_per_type() {
        let mut engine = MaskingEngine::new(MaskingEngineConfig::default());
        let text = "ID: A123456789";
        let entities = vec![entity(PHIType::Id, "A123456789", 4, 14)];
        let report = engine.mask_document(text, &entities);
        assert_eq!(report.masked_text, "ID: A1******89");
        assert_eq!(report.replacements[0].strategy, StrategyType::PartialMasking);
    }

    #[test]
    fn suppression_yields_empty_replacement() {
        let mut config = MaskingEngineConfig::default();
        config.phi_specific_strategies.insert(PHIType::Location, StrategyType::Suppression);
        let mut engine = MaskingEngine::new(config);

        let text = "lives in Taipei now";
        let entities = vec![entity(PHIType::Location, "Taipei", 9, 15)];
        let report = engine.mask_document(text, &entities);
        assert_eq!(report.masked_text, "lives in  now");
    }

    #[test]
    fn no_leak_check_is_clean_for_redaction() {
        let mut engine = MaskingEngine::new(MaskingEngineConfig::default());
        let text = "patient John Smith arrived";
        let entities = vec![entity(PHIType::Name, "John Smith", 8, 18)];
        let report = engine.mask_document(text, &entities);
        assert!(report.leaked_originals.is_empty());
    }
}
