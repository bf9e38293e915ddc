use std::collections::HashMap;

use phi_types::PHIType;
use serde::{Deserialize, Serialize};

use crate::pipeline::FileReport;

/// Totals across every file in a run: used for the job-level summary
/// printed at the end of a CLI invocation.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RunAggregates {
    pub files_processed: usize,
    pub files_failed: usize,
    pub phi_found: usize,
    pub total_processing_ms: f64,
    pub phi_type_distribution: HashMap<PHIType, usize>,
}

impl RunAggregates {
    pub fn record_success(&mut self, report: &FileReport) {
        self.files_processed += 1;
        self.phi_found += report.entities.len();
        self.total_processing_ms += report.processing_time_ms;
        for entity in &report.entities {
            *self.phi_type_distribution.entry(entity.phi_type).or_insert(0) += 1;
        }
    }

    pub fn record_failure(&mut self) {
        self.files_failed += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use phi_types::PHIEntity;

    fn entity(phi_type: PHIType) -> PHIEntity {
        PHIEntity {
            phi_type,
            text: "x".to_string(),
            start_pos: 0,
            end_pos: 1,
            confidence: 0.9,
            reason: "test".to_string(),
            regulation_source: None,
            custom_type: None,
        }
    }

    #[test]
    fn tallies_phi_type_distribution() {
        let mut aggregates = RunAggregates::default();
        let report = FileReport {
            entities: vec![entity(PHIType::Name), entity(PHIType::Name), entity(PHIType::Date)],
            masked_text: String::new(),
            processing_time_ms: 10.0,
        };
        aggregates.record_success(&report);
        assert_eq!(aggregates.phi_type_distribution[&PHIType::Name], 2);
        assert_eq!(aggregates.phi_type_distribution[&PHIType::Date], 1);
        assert_eq!(aggregates.files_processed, 1);
    }
}
