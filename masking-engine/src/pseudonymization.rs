use std::collections::HashMap;

use phi_types::{PHIEntity, PHIType};
use sha2::{Digest, Sha256};

use crate::strategy::{MaskingStrategy, StrategyType};

fn default_template(phi_type: PHIType) -> &'static str {
    match phi_type {
        PHIType::Name => "Patient-{hash}",
        PHIType::Phone => "XXX-XXXX-{hash}",
        PHIType::Email => "patient{hash}@example.com",
        PHIType::MedicalRecordNumber => "MRN-{hash}",
        PHIType::Ssn => "XXX-XX-{hash}",
        PHIType::Id => "ID-{hash}",
        PHIType::AccountNumber => "ACC-{hash}",
        _ => "PSEUDO-{hash}",
    }
}

/// Replaces entity text with a consistent fake value derived from a salted
/// hash of the text, so the same input always masks to the same output
/// within a document without ever round-tripping to the original.
pub struct PseudonymizationStrategy {
    pub salt: String,
    pub hash_length: usize,
    pub custom_templates: HashMap<PHIType, String>,
    cache: HashMap<(PHIType, String), String>,
}

impl PseudonymizationStrategy {
    pub fn new(salt: impl Into<String>) -> Self {
        Self {
            salt: salt.into(),
            hash_length: 4,
            custom_templates: HashMap::new(),
            cache: HashMap::new(),
        }
    }

    fn generate_hash(&self, text: &str) -> String {
        let digest = Sha256::digest(format!("{}{}", self.salt, text).as_bytes());
        let hex = format!("{digest:x}");
        hex.chars().take(self.hash_length).collect::<String>().to_uppercase()
    }
}

impl Default for PseudonymizationStrategy {
    fn default() -> Self {
        Self::new("default-salt")
    }
}

impl MaskingStrategy for PseudonymizationStrategy {
    fn mask(&mut self, entity: &PHIEntity) -> String {
        let key = (entity.phi_type, entity.text.clone());
        if let Some(existing) = self.cache.get(&key) {
            return existing.clone();
        }

        let hash = self.generate_hash(&entity.text);
        let template = self
            .custom_templates
            .get(&entity.phi_type)
            .map(String::as_str)
            .unwrap_or_else(|| default_template(entity.phi_type));
        let pseudonym = template.replace("{hash}", &hash);

        self.cache.insert(key, pseudonym.clone());
        pseudonym
    }

    fn strategy_type(&self) -> StrategyType {
        StrategyType::Pseudonymization
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
    fn same_input_yields_same_pseudonym() {
        let mut strategy = PseudonymizationStrategy::default();
        let first = strategy.mask(&entity(PHIType::Name, "\u{5f35}\u{4e09}"));
        let second = strategy.mask(&entity(PHIType::Name, "\u{5f35}\u{4e09}"));
        assert_eq!(first, second);
        assert!(first.starts_with("Patient-"));
    }

    #[test]
    fn different_input_yields_different_pseudonym() {
        let mut strategy = PseudonymizationStrategy::default();
        let a = strategy.mask(&entity(PHIType::Name, "Alice"));
        let b = strategy.mask(&entity(PHIType::Name, "Bob"));
        assert_ne!(a, b);
    }

    #[test]
    fn unmapped_type_uses_generic_template() {
        let mut strategy = PseudonymizationStrategy::default();
        let masked = strategy.mask(&entity(PHIType::Location, "Taipei"));
        assert!(masked.starts_with("PSEUDO-"));
    }
}
