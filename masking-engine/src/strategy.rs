use phi_types::{PHIEntity, PHIType};
use serde::{Deserialize, Serialize};

/// Which masking strategy produced a replacement. Carried on `MaskingReport`
/// entries and used to key `MaskingConfig::phi_specific_strategies`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StrategyType {
    Redaction,
    Generalization,
    Pseudonymization,
    DateShifting,
    PartialMasking,
    Suppression,
}

/// A pure function from an entity to its replacement text. Implementations
/// may hold per-document state (the pseudonym cache, the date-shift offset)
/// but must be deterministic given that state.
pub trait MaskingStrategy: Send + Sync {
    fn mask(&mut self, entity: &PHIEntity) -> String;

    fn strategy_type(&self) -> StrategyType;
}

/// Default strategy selector: `AGE_OVER_89/90` → Generalization; `NAME`,
/// `MEDICAL_RECORD_NUMBER` → Pseudonymization; `DATE` → Date Shifting;
/// `PHONE`, `SSN`, `ID` → Partial Masking; everything else → Redaction.
pub fn default_for(phi_type: PHIType) -> StrategyType {
    match phi_type {
        PHIType::AgeOver89 | PHIType::AgeOver90 => StrategyType::Generalization,
        PHIType::Name | PHIType::MedicalRecordNumber => StrategyType::Pseudonymization,
        PHIType::Date => StrategyType::DateShifting,
        PHIType::Phone | PHIType::Ssn | PHIType::Id => StrategyType::PartialMasking,
        _ => StrategyType::Redaction,
    }
}
