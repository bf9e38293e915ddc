pub mod config;
pub mod date_shift;
pub mod engine;
pub mod generalization;
pub mod partial;
pub mod pseudonymization;
pub mod redaction;
pub mod strategy;
pub mod suppression;

pub use config::MaskingEngineConfig;
pub use date_shift::DateShiftingStrategy;
pub use engine::{MaskingEngine, MaskingRecord, MaskingReport};
pub use generalization::GeneralizationStrategy;
pub use partial::PartialMaskingStrategy;
pub use pseudonymization::PseudonymizationStrategy;
pub use redaction::RedactionStrategy;
pub use strategy::{default_for, MaskingStrategy, StrategyType};
pub use suppression::SuppressionStrategy;
