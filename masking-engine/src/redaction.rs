use phi_types::PHIEntity;

use crate::strategy::{MaskingStrategy, StrategyType};

/// Replaces entity text with a fixed placeholder, or with `mask_char`
/// repeated to the original length when `preserve_length` is set.
#[derive(Clone, Debug)]
pub struct RedactionStrategy {
    pub placeholder: String,
    pub preserve_length: bool,
    pub mask_char: char,
}

impl Default for RedactionStrategy {
    fn default() -> Self {
        Self {
            placeholder: "[REDACTED]".to_string(),
            preserve_length: false,
            mask_char: '*',
        }
    }
}

impl MaskingStrategy for RedactionStrategy {
    fn mask(&mut self, entity: &PHIEntity) -> String {
        if self.preserve_length {
            self.mask_char.to_string().repeat(entity.text.chars().count())
        } else {
            self.placeholder.clone()
        }
    }

    fn strategy_type(&self) -> StrategyType {
        StrategyType::Redaction
    }
}
