use std::collections::HashMap;

use serde::Serialize;

use crate::confusion::ConfusionMatrix;
use crate::efficiency::efficiency_score;
use crate::latency::LatencyStats;
use crate::matcher::{calculate_metrics, calculate_metrics_by_type, MatchMode};
use crate::sample::PHISample;

/// One scored document: its own confusion counts plus the measurements the
/// efficiency score needs. Produced per-file by a caller driving the
/// orchestrator in evaluation mode, then folded into an `EvaluationReport`.
#[derive(Clone, Debug, Serialize)]
pub struct SampleConfusion {
    pub sample_id: String,
    pub confusion: ConfusionMatrix,
    pub detection_time_ms: f64,
    pub prompt_length: f64,
}

/// Aggregate precision/recall/F1 overall and per normalised type, plus
/// latency stats and the efficiency composite score, over a batch of
/// predicted/ground-truth sample pairs.
#[derive(Clone, Debug, Serialize)]
pub struct EvaluationReport {
    pub mode: String,
    pub overall: ConfusionMatrix,
    pub by_type: HashMap<String, ConfusionMatrix>,
    pub samples: Vec<SampleConfusion>,
    pub latency: LatencyStats,
    pub efficiency: f64,
}

/// One document's predicted/ground-truth spans plus how long detection took
/// and how long the prompt used to produce it was (characters).
pub struct EvaluationCase {
    pub sample_id: String,
    pub ground_truth: Vec<PHISample>,
    pub predicted: Vec<PHISample>,
    pub detection_time_ms: f64,
    pub prompt_length: f64,
}

/// Budgets the efficiency composite score is measured against.
pub struct EfficiencyBudget {
    pub t_max_ms: f64,
    pub l_max_chars: f64,
}

impl Default for EfficiencyBudget {
    fn default() -> Self {
        Self {
            t_max_ms: 120_000.0,
            l_max_chars: 8_000.0,
        }
    }
}

pub fn evaluate(cases: &[EvaluationCase], mode: MatchMode, budget: &EfficiencyBudget) -> EvaluationReport {
    let mut overall = ConfusionMatrix::default();
    let mut by_type: HashMap<String, ConfusionMatrix> = HashMap::new();
    let mut samples = Vec::with_capacity(cases.len());
    let mut detection_times = Vec::with_capacity(cases.len());

    for case in cases {
        let confusion = calculate_metrics(&case.ground_truth, &case.predicted, mode);
        overall = overall + confusion;

        for (phi_type, cm) in calculate_metrics_by_type(&case.ground_truth, &case.predicted, mode) {
            let entry = by_type.entry(phi_type).or_default();
            *entry = *entry + cm;
        }

        detection_times.push(case.detection_time_ms);
        samples.push(SampleConfusion {
            sample_id: case.sample_id.clone(),
            confusion,
            detection_time_ms: case.detection_time_ms,
            prompt_length: case.prompt_length,
        });
    }

    let latency = LatencyStats::compute(&detection_times);
    let avg_prompt_length = if cases.is_empty() {
        0.0
    } else {
        cases.iter().map(|c| c.prompt_length).sum::<f64>() / cases.len() as f64
    };
    let efficiency = efficiency_score(overall.f1(), budget.t_max_ms, latency.mean, budget.l_max_chars, avg_prompt_length);

    EvaluationReport {
        mode: format!("{mode:?}"),
        overall,
        by_type,
        samples,
        latency,
        efficiency,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(text: &str, phi_type: &str) -> PHISample {
        PHISample::new(text, phi_type)
    }

    #[test]
    fn aggregates_overall_and_per_type_across_cases() {
        let cases = vec![
            EvaluationCase {
                sample_id: "doc-1".to_string(),
                ground_truth: vec![sample("John", "NAME")],
                predicted: vec![sample("John", "NAME")],
                detection_time_ms: 100.0,
                prompt_length: 500.0,
            },
            EvaluationCase {
                sample_id: "doc-2".to_string(),
                ground_truth: vec![sample("Jane", "NAME"), sample("2024-01-01", "DATE")],
                predicted: vec![sample("Jane", "NAME")],
                detection_time_ms: 200.0,
                prompt_length: 600.0,
            },
        ];

        let report = evaluate(&cases, MatchMode::Exact, &EfficiencyBudget::default());
        assert_eq!(report.overall.true_positives, 2);
        assert_eq!(report.overall.false_negatives, 1);
        assert_eq!(report.by_type["DATE"].false_negatives, 1);
        assert_eq!(report.samples.len(), 2);
        assert!(report.efficiency > 0.0 && report.efficiency <= 1.0);
    }

    #[test]
    fn empty_batch_does_not_panic() {
        let report = evaluate(&[], MatchMode::Exact, &EfficiencyBudget::default());
        assert_eq!(report.overall, ConfusionMatrix::default());
        assert_eq!(report.efficiency, 0.0);
    }
}
