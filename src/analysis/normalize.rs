use super::model::{AnalysisResult, ComparisonSample, Metric, SampleValue};

/// Time between consecutive analysis samples, in seconds.
pub const DEFAULT_STEP_SECS: f64 = 0.5;

/// Align reference and user features for one metric into per-step samples.
///
/// Returns an empty series when either side lacks the metric's array. When
/// the two arrays differ in length the series is truncated to the shorter one.
pub fn normalize(result: &AnalysisResult, metric: Metric, step: f64) -> Vec<ComparisonSample> {
    let reference = &result.reference_features;
    let user = &result.user_features;

    match metric {
        Metric::Pitch => match (&reference.pitches, &user.pitches) {
            (Some(orig), Some(played)) => {
                zip_series(orig, played, step, |v| v.map(|p| SampleValue::Number(round_half_up(p))))
            }
            _ => missing(metric),
        },
        Metric::Rhythm => match (&reference.onsets, &user.onsets) {
            (Some(orig), Some(played)) => {
                zip_series(orig, played, step, |v| v.map(SampleValue::Number))
            }
            _ => missing(metric),
        },
        Metric::Technique => match (&reference.techniques, &user.techniques) {
            (Some(orig), Some(played)) => {
                zip_series(orig, played, step, |v| v.as_ref().map(SampleValue::from))
            }
            _ => missing(metric),
        },
    }
}

/// Nearest integer, with halves going toward positive infinity (`-2.5` -> `-2`).
fn round_half_up(v: f64) -> f64 {
    (v + 0.5).floor()
}

fn missing(metric: Metric) -> Vec<ComparisonSample> {
    log::debug!("No {} data in analysis result, series is empty", metric.label());
    Vec::new()
}

fn zip_series<T>(
    original: &[T],
    played: &[T],
    step: f64,
    convert: impl Fn(&T) -> Option<SampleValue>,
) -> Vec<ComparisonSample> {
    if original.len() != played.len() {
        log::debug!(
            "Series length mismatch (reference {}, user {}), truncating to {}",
            original.len(),
            played.len(),
            original.len().min(played.len())
        );
    }

    original
        .iter()
        .zip(played)
        .enumerate()
        .map(|(index, (o, p))| ComparisonSample {
            index,
            second: index as f64 * step,
            original: convert(o),
            played: convert(p),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::model::{Features, TechniqueLabel};

    fn pitch_result(reference: &[f64], user: &[f64]) -> AnalysisResult {
        AnalysisResult {
            reference_features: Features {
                pitches: Some(reference.iter().copied().map(Some).collect()),
                ..Default::default()
            },
            user_features: Features {
                pitches: Some(user.iter().copied().map(Some).collect()),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_pitch_rounded_and_aligned() {
        let r = pitch_result(&[105.0, 108.0, 95.0], &[100.0, 110.0, 90.0]);
        let samples = normalize(&r, Metric::Pitch, DEFAULT_STEP_SECS);

        let got: Vec<(f64, f64, f64)> = samples
            .iter()
            .map(|s| {
                let (o, p) = s.numeric_pair().unwrap();
                (s.second, o, p)
            })
            .collect();
        assert_eq!(got, vec![(0.0, 105.0, 100.0), (0.5, 108.0, 110.0), (1.0, 95.0, 90.0)]);
    }

    #[test]
    fn test_pitch_rounding() {
        let r = pitch_result(&[220.4, 219.6], &[110.5, 0.2]);
        let samples = normalize(&r, Metric::Pitch, DEFAULT_STEP_SECS);
        assert_eq!(samples[0].numeric_pair(), Some((220.0, 111.0)));
        assert_eq!(samples[1].numeric_pair(), Some((220.0, 0.0)));
    }

    #[test]
    fn test_negative_halves_round_up() {
        let r = pitch_result(&[-2.5, -2.6, -0.5], &[2.5, -3.4, 0.0]);
        let samples = normalize(&r, Metric::Pitch, DEFAULT_STEP_SECS);
        assert_eq!(samples[0].numeric_pair(), Some((-2.0, 3.0)));
        assert_eq!(samples[1].numeric_pair(), Some((-3.0, -3.0)));
        assert_eq!(samples[2].numeric_pair(), Some((0.0, 0.0)));
    }

    #[test]
    fn test_length_and_even_spacing() {
        let values: Vec<f64> = (0..40).map(|i| 100.0 + i as f64).collect();
        let r = pitch_result(&values, &values);
        let samples = normalize(&r, Metric::Pitch, 0.5);

        assert_eq!(samples.len(), values.len());
        for (i, s) in samples.iter().enumerate() {
            assert_eq!(s.index, i);
            assert!((s.second - i as f64 * 0.5).abs() < 1e-12);
        }
    }

    #[test]
    fn test_truncates_to_shorter_series() {
        let r = pitch_result(&[1.0, 2.0, 3.0, 4.0], &[1.0, 2.0]);
        assert_eq!(normalize(&r, Metric::Pitch, 0.5).len(), 2);
    }

    #[test]
    fn test_missing_array_is_empty() {
        let r = pitch_result(&[1.0], &[1.0]);
        assert!(normalize(&r, Metric::Rhythm, 0.5).is_empty());
        assert!(normalize(&r, Metric::Technique, 0.5).is_empty());

        let mut one_sided = r.clone();
        one_sided.user_features.pitches = None;
        assert!(normalize(&one_sided, Metric::Pitch, 0.5).is_empty());
    }

    #[test]
    fn test_rhythm_passes_through() {
        let r = AnalysisResult {
            reference_features: Features {
                onsets: Some(vec![Some(0.25), Some(1.75)]),
                ..Default::default()
            },
            user_features: Features {
                onsets: Some(vec![Some(0.3), None]),
                ..Default::default()
            },
            ..Default::default()
        };
        let samples = normalize(&r, Metric::Rhythm, 0.5);
        assert_eq!(samples[0].numeric_pair(), Some((0.25, 0.3)));
        assert_eq!(samples[1].played, None);
        assert_eq!(samples[1].numeric_pair(), None);
    }

    #[test]
    fn test_techniques_keep_shape() {
        let r = AnalysisResult {
            reference_features: Features {
                techniques: Some(vec![
                    Some(TechniqueLabel::One("bend".into())),
                    Some(TechniqueLabel::Many(vec!["bend".into(), "vibrato".into()])),
                ]),
                ..Default::default()
            },
            user_features: Features {
                techniques: Some(vec![
                    Some(TechniqueLabel::Many(vec!["bend".into()])),
                    Some(TechniqueLabel::One("normal".into())),
                ]),
                ..Default::default()
            },
            ..Default::default()
        };
        let samples = normalize(&r, Metric::Technique, 0.5);
        assert_eq!(samples[0].original, Some(SampleValue::Label("bend".into())));
        assert_eq!(
            samples[0].played,
            Some(SampleValue::Labels(vec!["bend".into()]))
        );
        let (o, p) = samples[0].label_pair().unwrap();
        assert_eq!(o, p);
    }

    #[test]
    fn test_normalize_is_pure() {
        let r = pitch_result(&[105.0, 108.0], &[100.0, 110.0]);
        assert_eq!(
            normalize(&r, Metric::Pitch, 0.5),
            normalize(&r, Metric::Pitch, 0.5)
        );
    }
}
