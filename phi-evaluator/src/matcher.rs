use std::collections::HashMap;

use crate::confusion::ConfusionMatrix;
use crate::normalize::normalize_phi_type;
use crate::sample::PHISample;

/// How strictly a predicted span must agree with a ground-truth span to
/// count as the same entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MatchMode {
    /// Normalised text equal and normalised types equal.
    Exact,
    /// Either text contains the other (case-folded) and types equal.
    Partial,
    /// Either text contains the other (case-folded); type is ignored.
    Overlap,
}

struct Normalized {
    text: String,
    phi_type: String,
}

fn normalize_all(samples: &[PHISample]) -> Vec<Normalized> {
    samples
        .iter()
        .map(|s| Normalized {
            text: s.normalized_text(),
            phi_type: normalize_phi_type(&s.phi_type),
        })
        .collect()
}

fn text_matches(mode: MatchMode, pred: &str, truth: &str) -> bool {
    match mode {
        MatchMode::Exact => pred == truth,
        MatchMode::Partial | MatchMode::Overlap => pred == truth || truth.contains(pred) || pred.contains(truth),
    }
}

fn type_matches(mode: MatchMode, pred: &str, truth: &str) -> bool {
    match mode {
        MatchMode::Exact | MatchMode::Partial => pred == truth,
        MatchMode::Overlap => true,
    }
}

/// Greedy one-to-one matching: each predicted span claims the first
/// unmatched ground-truth span that satisfies `mode`, in predicted-list
/// order. Unclaimed ground truth becomes a false negative; unmatched
/// predictions become false positives. Symmetric under swapping predicted
/// and ground truth for `Exact` mode (TP is a set-intersection count there,
/// independent of iteration order).
pub fn match_entities(
    ground_truth: &[PHISample],
    predicted: &[PHISample],
    mode: MatchMode,
) -> (usize, usize, usize) {
    let truth = normalize_all(ground_truth);
    let pred = normalize_all(predicted);
    let mut matched_truth = vec![false; truth.len()];
    let mut true_positives = 0;

    for p in &pred {
        let found = truth.iter().enumerate().find(|(i, t)| {
            !matched_truth[*i] && text_matches(mode, &p.text, &t.text) && type_matches(mode, &p.phi_type, &t.phi_type)
        });
        if let Some((i, _)) = found {
            matched_truth[i] = true;
            true_positives += 1;
        }
    }

    let false_positives = pred.len() - true_positives;
    let false_negatives = matched_truth.iter().filter(|m| !**m).count();
    (true_positives, false_positives, false_negatives)
}

pub fn calculate_metrics(ground_truth: &[PHISample], predicted: &[PHISample], mode: MatchMode) -> ConfusionMatrix {
    let (tp, fp, fn_) = match_entities(ground_truth, predicted, mode);
    ConfusionMatrix {
        true_positives: tp,
        false_positives: fp,
        false_negatives: fn_,
    }
}

/// Buckets both lists by normalised type, then scores each bucket
/// independently (a prediction of one type never counts toward another
/// type's recall, even under `Overlap` mode).
pub fn calculate_metrics_by_type(
    ground_truth: &[PHISample],
    predicted: &[PHISample],
    mode: MatchMode,
) -> HashMap<String, ConfusionMatrix> {
    let mut truth_by_type: HashMap<String, Vec<PHISample>> = HashMap::new();
    for sample in ground_truth {
        truth_by_type
            .entry(normalize_phi_type(&sample.phi_type))
            .or_default()
            .push(sample.clone());
    }
    let mut pred_by_type: HashMap<String, Vec<PHISample>> = HashMap::new();
    for sample in predicted {
        pred_by_type
            .entry(normalize_phi_type(&sample.phi_type))
            .or_default()
            .push(sample.clone());
    }

    let mut types: Vec<String> = truth_by_type.keys().chain(pred_by_type.keys()).cloned().collect();
    types.sort();
    types.dedup();

    types
        .into_iter()
        .map(|phi_type| {
            let truth = truth_by_type.get(&phi_type).cloned().unwrap_or_default();
            let pred = pred_by_type.get(&phi_type).cloned().unwrap_or_default();
            let metrics = calculate_metrics(&truth, &pred, mode);
            (phi_type, metrics)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(text: &str, phi_type: &str) -> PHISample {
        PHISample::new(text, phi_type)
    }

    #[test]
    fn exact_mode_requires_text_and_type_equality() {
        let truth = vec![sample("John Doe", "NAME")];
        let pred = vec![sample("john doe", "NAME"), sample("Jane", "NAME")];
        let (tp, fp, fn_) = match_entities(&truth, &pred, MatchMode::Exact);
        assert_eq!((tp, fp, fn_), (1, 1, 0));
    }

    #[test]
    fn partial_mode_allows_substring_but_still_checks_type() {
        let truth = vec![sample("John Doe", "NAME")];
        let pred = vec![sample("John", "NAME")];
        let (tp, fp, fn_) = match_entities(&truth, &pred, MatchMode::Partial);
        assert_eq!((tp, fp, fn_), (1, 0, 0));

        let pred_wrong_type = vec![sample("John", "DATE")];
        let (tp, fp, fn_) = match_entities(&truth, &pred_wrong_type, MatchMode::Partial);
        assert_eq!((tp, fp, fn_), (0, 1, 1));
    }

    #[test]
    fn overlap_mode_ignores_type() {
        let truth = vec![sample("John Doe", "NAME")];
        let pred = vec![sample("John", "DATE")];
        let (tp, fp, fn_) = match_entities(&truth, &pred, MatchMode::Overlap);
        assert_eq!((tp, fp, fn_), (1, 0, 0));
    }

    #[test]
    fn exact_mode_is_symmetric_under_swap() {
        let a = vec![sample("John Doe", "NAME"), sample("1990-01-01", "DATE")];
        let b = vec![sample("John Doe", "NAME"), sample("Taipei", "LOCATION")];

        let (tp1, fp1, fn1) = match_entities(&a, &b, MatchMode::Exact);
        let (tp2, fp2, fn2) = match_entities(&b, &a, MatchMode::Exact);

        assert_eq!(tp1, tp2);
        assert_eq!(fp1, fn2);
        assert_eq!(fn1, fp2);
    }

    #[test]
    fn per_type_metrics_do_not_leak_across_types() {
        let truth = vec![sample("John", "NAME"), sample("2024-01-01", "DATE")];
        let pred = vec![sample("John", "NAME")];
        let by_type = calculate_metrics_by_type(&truth, &pred, MatchMode::Exact);
        assert_eq!(by_type["NAME"].true_positives, 1);
        assert_eq!(by_type["DATE"].false_negatives, 1);
        assert_eq!(by_type["DATE"].true_positives, 0);
    }
}
