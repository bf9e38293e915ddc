use std::collections::HashMap;

use phi_types::PHIType;

use crate::strategy::StrategyType;

/// Tunables for every built-in strategy plus the per-type overrides that let
/// a caller route a specific `PHIType` to a non-default strategy.
#[derive(Clone, Debug)]
pub struct MaskingEngineConfig {
    pub phi_specific_strategies: HashMap<PHIType, StrategyType>,

    pub redaction_placeholder: String,
    pub redaction_preserve_length: bool,
    pub redaction_mask_char: char,

    pub pseudonymization_salt: String,
    pub pseudonymization_hash_length: usize,

    pub date_offset_days: Option<i64>,
    pub date_offset_range: (i64, i64),
    pub date_preserve_year: bool,
    pub date_seed: Option<u64>,

    pub partial_keep_prefix: usize,
    pub partial_keep_suffix: usize,
    pub partial_mask_char: char,

    pub verify_no_leaks: bool,
}

impl Default for MaskingEngineConfig {
    fn default() -> Self {
        Self {
            phi_specific_strategies: HashMap::new(),
            redaction_placeholder: "[REDACTED]".to_string(),
            redaction_preserve_length: false,
            redaction_mask_char: '*',
            pseudonymization_salt: "default-salt".to_string(),
            pseudonymization_hash_length: 4,
            date_offset_days: None,
            date_offset_range: (-365, 365),
            date_preserve_year: false,
            date_seed: None,
            partial_keep_prefix: 2,
            partial_keep_suffix: 2,
            partial_mask_char: '*',
            verify_no_leaks: true,
        }
    }
}
