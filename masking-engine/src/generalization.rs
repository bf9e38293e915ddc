use std::collections::HashMap;

use phi_types::{PHIEntity, PHIType};

use crate::strategy::{MaskingStrategy, StrategyType};

fn has_cjk(text: &str) -> bool {
    text.chars().any(|c| ('\u{4e00}'..='\u{9fff}').contains(&c))
}

fn generalize_age_89(text: &str) -> String {
    if has_cjk(text) {
        "\u{2265}90\u{6b72}".to_string()
    } else {
        "\u{2265}90 years".to_string()
    }
}

fn generalize_age_90(text: &str) -> String {
    if has_cjk(text) {
        ">90\u{6b72}".to_string()
    } else {
        ">90 years".to_string()
    }
}

fn generalize_date(text: &str) -> String {
    if text.chars().count() >= 4 {
        text.chars().take(4).collect()
    } else {
        "[DATE]".to_string()
    }
}

fn generalize_location(text: &str) -> String {
    if has_cjk(text) {
        "[\u{5730}\u{5340}]".to_string()
    } else {
        "[LOCATION]".to_string()
    }
}

/// Replaces entity text with a broader category rather than removing it
/// outright: `"94\u{6b72}"` becomes `"\u{2265}90\u{6b72}"`, a full date
/// collapses to its year. Types without a built-in or custom rule fall back
/// to `[GENERALIZED]` with a warning, since silently redacting would hide a
/// missing rule rather than surface it.
#[derive(Default)]
pub struct GeneralizationStrategy {
    pub custom_rules: HashMap<PHIType, fn(&str) -> String>,
}

impl MaskingStrategy for GeneralizationStrategy {
    fn mask(&mut self, entity: &PHIEntity) -> String {
        if let Some(rule) = self.custom_rules.get(&entity.phi_type) {
            return rule(&entity.text);
        }

        match entity.phi_type {
            PHIType::AgeOver89 => generalize_age_89(&entity.text),
            PHIType::AgeOver90 => generalize_age_90(&entity.text),
            PHIType::Date => generalize_date(&entity.text),
            PHIType::Location => generalize_location(&entity.text),
            other => {
                tracing::warn!(phi_type = %other, "no generalization rule, falling back to [GENERALIZED]");
                "[GENERALIZED]".to_string()
            }
        }
    }

    fn strategy_type(&self) -> StrategyType {
        StrategyType::Generalization
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity(phi_type: PHIType, text: &str) -> PHIEntity {
        PHIEntity {
            phi_type,
            text: text.to_string(),
            start_pos: 0,
            end_pos: text.len(),
            confidence: 0.9,
            reason: "test".to_string(),
            regulation_source: None,
            custom_type: None,
        }
    }

    #[test]
    fn generalizes_cjk_age() {
        let mut strategy = GeneralizationStrategy::default();
        assert_eq!(strategy.mask(&entity(PHIType::AgeOver89, "94\u{6b72}")), "\u{2265}90\u{6b72}");
    }

    #[test]
    fn generalizes_english_age() {
        let mut strategy = GeneralizationStrategy::default();
        assert_eq!(strategy.mask(&entity(PHIType::AgeOver89, "94 years")), "\u{2265}90 years");
    }

    #[test]
    fn generalizes_bare_number_age_as_english() {
        let mut strategy = GeneralizationStrategy::default();
        assert_eq!(strategy.mask(&entity(PHIType::AgeOver89, "94")), "\u{2265}90 years");
    }

    #[test]
    fn generalizes_date_to_year() {
        let mut strategy = GeneralizationStrategy::default();
        assert_eq!(strategy.mask(&entity(PHIType::Date, "2024-01-15")), "2024");
    }

    #[test]
    fn falls_back_without_rule() {
        let mut strategy = GeneralizationStrategy::default();
        assert_eq!(strategy.mask(&entity(PHIType::Phone, "0912345678")), "[GENERALIZED]");
    }
}
