pub mod model;
pub mod normalize;

pub use model::{
    AnalysisResult, ComparisonSample, Features, Metric, SampleValue, Scores, TechniqueLabel,
};
pub use normalize::{DEFAULT_STEP_SECS, normalize};

/// Aggregate gap statistics for a continuous series.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GapStats {
    /// Samples where both sides had a value.
    pub compared: usize,
    /// Samples skipped because one side was missing.
    pub skipped: usize,
    pub mean_abs_gap: f64,
    pub max_abs_gap: f64,
}

/// Mean and max absolute difference between reference and user values.
pub fn gap_stats(samples: &[ComparisonSample]) -> GapStats {
    let mut stats = GapStats::default();
    let mut total = 0.0;

    for sample in samples {
        match sample.numeric_pair() {
            Some((original, played)) => {
                let gap = (original - played).abs();
                total += gap;
                stats.max_abs_gap = stats.max_abs_gap.max(gap);
                stats.compared += 1;
            }
            None => stats.skipped += 1,
        }
    }

    if stats.compared > 0 {
        stats.mean_abs_gap = total / stats.compared as f64;
    }
    stats
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(index: usize, original: Option<f64>, played: Option<f64>) -> ComparisonSample {
        ComparisonSample {
            index,
            second: index as f64 * DEFAULT_STEP_SECS,
            original: original.map(SampleValue::Number),
            played: played.map(SampleValue::Number),
        }
    }

    #[test]
    fn test_gap_stats() {
        let samples = vec![
            sample(0, Some(105.0), Some(100.0)),
            sample(1, Some(108.0), Some(110.0)),
            sample(2, None, Some(90.0)),
        ];
        let stats = gap_stats(&samples);
        assert_eq!(stats.compared, 2);
        assert_eq!(stats.skipped, 1);
        assert!((stats.mean_abs_gap - 3.5).abs() < 1e-12);
        assert_eq!(stats.max_abs_gap, 5.0);
    }

    #[test]
    fn test_gap_stats_empty() {
        assert_eq!(gap_stats(&[]), GapStats::default());
    }
}
