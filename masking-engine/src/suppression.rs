use phi_types::PHIEntity;

use crate::strategy::{MaskingStrategy, StrategyType};

/// Removes the entity entirely, leaving no replacement text behind.
#[derive(Default)]
pub struct SuppressionStrategy;

impl MaskingStrategy for SuppressionStrategy {
    fn mask(&mut self, _entity: &PHIEntity) -> String {
        String::new()
    }

    fn strategy_type(&self) -> StrategyType {
        StrategyType::Suppression
    }
}
