/// Tracks `chars/second` throughput with exponential smoothing so a
/// remaining-time estimate doesn't swing wildly between chunks of very
/// different sizes.
#[derive(Clone, Debug)]
pub struct ProgressEstimator {
    smoothing: f64,
    chars_per_sec: Option<f64>,
    default_chars_per_sec: f64,
}

impl ProgressEstimator {
    pub fn new(default_chars_per_sec: f64) -> Self {
        Self {
            smoothing: 0.3,
            chars_per_sec: None,
            default_chars_per_sec,
        }
    }

    pub fn record_chunk(&mut self, chars: usize, elapsed_secs: f64) {
        if elapsed_secs <= 0.0 || chars == 0 {
            return;
        }
        let sample = chars as f64 / elapsed_secs;
        self.chars_per_sec = Some(match self.chars_per_sec {
            Some(previous) => self.smoothing * sample + (1.0 - self.smoothing) * previous,
            None => sample,
        });
    }

    pub fn rate(&self) -> f64 {
        self.chars_per_sec.unwrap_or(self.default_chars_per_sec)
    }

    pub fn estimate_remaining_secs(&self, remaining_chars: usize) -> f64 {
        let rate = self.rate();
        if rate <= 0.0 {
            return 0.0;
        }
        remaining_chars as f64 / rate
    }
}

/// `processed_chunks / total_chunks`, clamped to `[0, 1]`; `total_chunks ==
/// 0` reports complete rather than dividing by zero.
pub fn chunk_progress(processed_chunks: usize, total_chunks: usize) -> f64 {
    if total_chunks == 0 {
        return 1.0;
    }
    (processed_chunks as f64 / total_chunks as f64).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn smooths_toward_new_samples() {
        let mut estimator = ProgressEstimator::new(100.0);
        estimator.record_chunk(1000, 1.0);
        assert_eq!(estimator.rate(), 1000.0);
        estimator.record_chunk(500, 1.0);
        assert!(estimator.rate() < 1000.0 && estimator.rate() > 500.0);
    }

    #[test]
    fn uses_default_before_any_sample() {
        let estimator = ProgressEstimator::new(250.0);
        assert_eq!(estimator.rate(), 250.0);
    }

    #[test]
    fn zero_total_chunks_is_complete() {
        assert_eq!(chunk_progress(0, 0), 1.0);
    }
}
