use chrono::{Datelike, Duration, NaiveDate};
use phi_types::PHIEntity;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::strategy::{MaskingStrategy, StrategyType};

const KNOWN_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%Y\u{5e74}%m\u{6708}%d\u{65e5}",
    "%d-%m-%Y",
    "%d/%m/%Y",
    "%m-%d-%Y",
    "%m/%d/%Y",
];

fn parse_date(text: &str) -> Option<NaiveDate> {
    KNOWN_FORMATS.iter().find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
}

/// Shifts a date by a single offset drawn once per document, so temporal
/// ordering between dates in the same document is preserved even though
/// each individual date no longer matches the source.
pub struct DateShiftingStrategy {
    pub offset_days: Option<i64>,
    pub offset_range: (i64, i64),
    pub preserve_year: bool,
    rng: StdRng,
    offset: Option<i64>,
}

impl DateShiftingStrategy {
    pub fn new(seed: Option<u64>) -> Self {
        Self {
            offset_days: None,
            offset_range: (-365, 365),
            preserve_year: false,
            rng: seed.map(StdRng::seed_from_u64).unwrap_or_else(StdRng::from_entropy),
            offset: None,
        }
    }

    fn offset(&mut self) -> i64 {
        if let Some(offset) = self.offset {
            return offset;
        }
        let (low, high) = self.offset_range;
        let offset = self.offset_days.unwrap_or_else(|| self.rng.gen_range(low..=high));
        self.offset = Some(offset);
        offset
    }
}

impl Default for DateShiftingStrategy {
    fn default() -> Self {
        Self::new(None)
    }
}

impl MaskingStrategy for DateShiftingStrategy {
    fn mask(&mut self, entity: &PHIEntity) -> String {
        let Some(original) = parse_date(&entity.text) else {
            tracing::warn!(text = %entity.text, "failed to parse date for shifting");
            return "[DATE]".to_string();
        };

        let offset = self.offset();
        let Some(mut shifted) = original.checked_add_signed(Duration::days(offset)) else {
            return "[DATE]".to_string();
        };

        if self.preserve_year {
            shifted = shifted.with_year(original.year()).unwrap_or(shifted);
        }

        shifted.format("%Y-%m-%d").to_string()
    }

    fn strategy_type(&self) -> StrategyType {
        StrategyType::DateShifting
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use phi_types::PHIType;

    fn entity(text: &str) -> PHIEntity {
        PHIEntity {
            phi_type: PHIType::Date,
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
    fn shifts_by_fixed_offset() {
        let mut strategy = DateShiftingStrategy {
            offset_days: Some(30),
            ..DateShiftingStrategy::new(Some(1))
        };
        assert_eq!(strategy.mask(&entity("2024-01-15")), "2024-02-14");
    }

    #[test]
    fn reuses_same_offset_within_document() {
        let mut strategy = DateShiftingStrategy::new(Some(42));
        let first = strategy.mask(&entity("2024-01-15"));
        let offset = strategy.offset;
        let second = strategy.mask(&entity("2024-06-01"));
        assert_eq!(strategy.offset, offset);
        assert_ne!(first, second);
    }

    #[test]
    fn unparseable_date_falls_back() {
        let mut strategy = DateShiftingStrategy::new(Some(1));
        assert_eq!(strategy.mask(&entity("not a date")), "[DATE]");
    }

    #[test]
    fn preserve_year_keeps_original_year() {
        let mut strategy = DateShiftingStrategy {
            offset_days: Some(10),
            preserve_year: true,
            ..DateShiftingStrategy::new(Some(1))
        };
        let masked = strategy.mask(&entity("2024-12-28"));
        assert!(masked.starts_with("2024-"));
    }
}
