use super::technique::{TECHNIQUE_CATEGORIES, TechniqueSeries};
use crate::analysis::{ComparisonSample, Metric};

/// Samples per measure marker on the rhythm chart (4 steps = 2 s at 0.5 s/step).
pub const SAMPLES_PER_MEASURE: usize = 4;

/// Spacing of x ticks on the technique chart, in seconds.
const TECHNIQUE_X_TICK_SECS: f64 = 0.5;

/// Upper bound on ticks per axis. Wider spans use a multiple of the base step.
pub const MAX_TICKS: usize = 100;

/// Headroom added above and below a continuous series so extrema aren't
/// clipped against the axis.
pub fn domain_pad(metric: Metric) -> f64 {
    match metric {
        Metric::Pitch => 50.0,
        Metric::Rhythm => 0.5,
        Metric::Technique => 0.0,
    }
}

/// Distance between y ticks on a continuous chart.
pub fn tick_step(metric: Metric) -> f64 {
    match metric {
        Metric::Pitch => 20.0,
        Metric::Rhythm => 0.5,
        Metric::Technique => 1.0,
    }
}

/// One x position of a continuous (pitch/rhythm) chart.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinePoint {
    pub index: usize,
    pub second: f64,
    pub original: Option<f64>,
    pub played: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChartPoints {
    Line(Vec<LinePoint>),
    Technique(TechniqueSeries),
}

#[derive(Debug, Clone, PartialEq)]
pub enum YAxis {
    Continuous { domain: [f64; 2], ticks: Vec<f64> },
    Categorical { categories: &'static [&'static str] },
}

/// A normalized series mapped into the conventions of its chart type.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartDomain {
    pub metric: Metric,
    pub points: ChartPoints,
    pub x_domain: [f64; 2],
    pub x_ticks: Vec<f64>,
    pub y_axis: YAxis,
    /// Measure boundaries in seconds (rhythm only).
    pub measure_markers: Vec<f64>,
}

impl ChartDomain {
    pub fn is_empty(&self) -> bool {
        match &self.points {
            ChartPoints::Line(points) => points.is_empty(),
            ChartPoints::Technique(series) => series.is_empty(),
        }
    }

    /// Y domain as numbers. Categorical axes span the category bands.
    pub fn y_domain(&self) -> [f64; 2] {
        match &self.y_axis {
            YAxis::Continuous { domain, .. } => *domain,
            YAxis::Categorical { categories } => [-0.5, categories.len() as f64 - 0.5],
        }
    }
}

/// Map samples onto chart axes for `metric`. Never fails: empty input yields
/// an empty point set over a single-tick `[0, 0]` domain.
pub fn to_chart_domain(samples: &[ComparisonSample], metric: Metric) -> ChartDomain {
    match metric {
        Metric::Pitch | Metric::Rhythm => continuous_domain(samples, metric),
        Metric::Technique => technique_domain(samples),
    }
}

fn continuous_domain(samples: &[ComparisonSample], metric: Metric) -> ChartDomain {
    let points: Vec<LinePoint> = samples
        .iter()
        .map(|s| LinePoint {
            index: s.index,
            second: s.second,
            original: s.original.as_ref().and_then(|v| v.as_number()),
            played: s.played.as_ref().and_then(|v| v.as_number()),
        })
        .collect();

    let values = points
        .iter()
        .flat_map(|p| [p.original, p.played])
        .flatten()
        .filter(|v| v.is_finite());
    let (min, max) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });

    let Some(last) = points.last().map(|p| p.second) else {
        return empty_domain(metric, ChartPoints::Line(points));
    };

    let pad = domain_pad(metric);
    let y_axis = if min.is_finite() && (max + pad).is_finite() {
        let domain = [(min - pad).max(0.0), max + pad];
        YAxis::Continuous {
            ticks: ticks(domain[0], domain[1], tick_step(metric)),
            domain,
        }
    } else {
        // Every sample had a missing side, or the span overflows
        default_y_axis()
    };

    let measure_markers = if metric == Metric::Rhythm {
        points
            .iter()
            .filter(|p| p.index % SAMPLES_PER_MEASURE == 0)
            .map(|p| p.second)
            .collect()
    } else {
        Vec::new()
    };

    ChartDomain {
        metric,
        points: ChartPoints::Line(points),
        x_domain: [0.0, last],
        x_ticks: ticks(0.0, last, 1.0),
        y_axis,
        measure_markers,
    }
}

fn technique_domain(samples: &[ComparisonSample]) -> ChartDomain {
    let series = TechniqueSeries::partition(samples);

    let Some(last) = samples.iter().map(|s| s.second).reduce(f64::max) else {
        return empty_domain(Metric::Technique, ChartPoints::Technique(series));
    };
    let x_max = last + TECHNIQUE_X_TICK_SECS;

    ChartDomain {
        metric: Metric::Technique,
        points: ChartPoints::Technique(series),
        x_domain: [0.0, x_max],
        x_ticks: ticks(0.0, x_max, TECHNIQUE_X_TICK_SECS),
        y_axis: YAxis::Categorical {
            categories: &TECHNIQUE_CATEGORIES,
        },
        measure_markers: Vec::new(),
    }
}

fn empty_domain(metric: Metric, points: ChartPoints) -> ChartDomain {
    let y_axis = match metric {
        Metric::Technique => YAxis::Categorical {
            categories: &TECHNIQUE_CATEGORIES,
        },
        _ => default_y_axis(),
    };
    ChartDomain {
        metric,
        points,
        x_domain: [0.0, 0.0],
        x_ticks: vec![0.0],
        y_axis,
        measure_markers: Vec::new(),
    }
}

fn default_y_axis() -> YAxis {
    YAxis::Continuous {
        domain: [0.0, 0.0],
        ticks: vec![0.0],
    }
}

/// Ticks from `min` toward `max` at `base_step`, widened to a whole multiple
/// of `base_step` when the span would need more than `MAX_TICKS` ticks.
fn ticks(min: f64, max: f64, base_step: f64) -> Vec<f64> {
    if !min.is_finite() {
        return vec![0.0];
    }
    let span = max - min;
    if base_step.is_nan() || base_step <= 0.0 || !span.is_finite() || span < 0.0 {
        return vec![min];
    }

    let intervals = span / base_step;
    let step = if intervals > (MAX_TICKS - 1) as f64 {
        base_step * (intervals / (MAX_TICKS - 1) as f64).ceil()
    } else {
        base_step
    };

    // Small epsilon so max lands on a tick despite float error
    let count = ((span / step + 1e-9).floor() as usize).min(MAX_TICKS - 1);
    (0..=count)
        .map(|k| min + k as f64 * step)
        .filter(|t| t.is_finite())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::SampleValue;

    fn numeric(values: &[(f64, f64)]) -> Vec<ComparisonSample> {
        values
            .iter()
            .enumerate()
            .map(|(i, &(o, p))| ComparisonSample {
                index: i,
                second: i as f64 * 0.5,
                original: Some(SampleValue::Number(o)),
                played: Some(SampleValue::Number(p)),
            })
            .collect()
    }

    fn y_of(domain: &ChartDomain) -> ([f64; 2], Vec<f64>) {
        match &domain.y_axis {
            YAxis::Continuous { domain, ticks } => (*domain, ticks.clone()),
            YAxis::Categorical { .. } => panic!("expected continuous axis"),
        }
    }

    #[test]
    fn test_pitch_domain_and_ticks() {
        let d = to_chart_domain(&numeric(&[(100.0, 200.0)]), Metric::Pitch);
        let (domain, ticks) = y_of(&d);
        assert_eq!(domain, [50.0, 250.0]);
        assert_eq!(ticks.len(), 11);
        assert_eq!(ticks[0], 50.0);
        assert_eq!(ticks[1], 70.0);
        assert_eq!(*ticks.last().unwrap(), 250.0);
    }

    #[test]
    fn test_pitch_domain_floors_at_zero() {
        let d = to_chart_domain(&numeric(&[(105.0, 100.0), (108.0, 110.0), (95.0, 90.0)]), Metric::Pitch);
        let (domain, _) = y_of(&d);
        assert_eq!(domain, [40.0, 160.0]);

        let d = to_chart_domain(&numeric(&[(10.0, 30.0)]), Metric::Pitch);
        let (domain, ticks) = y_of(&d);
        assert_eq!(domain, [0.0, 80.0]);
        assert_eq!(ticks, vec![0.0, 20.0, 40.0, 60.0, 80.0]);
    }

    #[test]
    fn test_rhythm_domain_and_measures() {
        let values: Vec<(f64, f64)> = (0..9).map(|i| (i as f64 * 0.5, i as f64 * 0.5 + 0.1)).collect();
        let d = to_chart_domain(&numeric(&values), Metric::Rhythm);
        let (domain, ticks) = y_of(&d);
        assert_eq!(domain[0], 0.0);
        assert!((domain[1] - 4.6).abs() < 1e-9);
        assert_eq!(ticks.first(), Some(&0.0));
        assert_eq!(ticks.last(), Some(&4.5));
        assert_eq!(d.measure_markers, vec![0.0, 2.0, 4.0]);
        assert_eq!(d.x_ticks, vec![0.0, 1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_technique_axes() {
        let samples: Vec<ComparisonSample> = (0..3)
            .map(|i| ComparisonSample {
                index: i,
                second: i as f64 * 0.5,
                original: Some(SampleValue::Label("bend".into())),
                played: Some(SampleValue::Label("normal".into())),
            })
            .collect();
        let d = to_chart_domain(&samples, Metric::Technique);
        assert_eq!(d.x_ticks, vec![0.0, 0.5, 1.0, 1.5]);
        assert_eq!(d.x_domain, [0.0, 1.5]);
        assert_eq!(
            d.y_axis,
            YAxis::Categorical { categories: &TECHNIQUE_CATEGORIES }
        );
        match d.points {
            ChartPoints::Technique(series) => assert_eq!(series.mismatched(), 3),
            ChartPoints::Line(_) => panic!("expected technique points"),
        }
    }

    #[test]
    fn test_empty_input() {
        for metric in Metric::ALL {
            let d = to_chart_domain(&[], metric);
            assert!(d.is_empty());
            assert_eq!(d.x_ticks, vec![0.0]);
        }
        let (domain, ticks) = y_of(&to_chart_domain(&[], Metric::Pitch));
        assert_eq!(domain, [0.0, 0.0]);
        assert_eq!(ticks, vec![0.0]);
    }

    #[test]
    fn test_all_missing_values() {
        let samples = vec![ComparisonSample {
            index: 0,
            second: 0.0,
            original: None,
            played: Some(SampleValue::Number(100.0)),
        }];
        let d = to_chart_domain(&samples, Metric::Pitch);
        // played alone still drives the domain
        let (domain, _) = y_of(&d);
        assert_eq!(domain, [50.0, 150.0]);

        let samples = vec![ComparisonSample {
            index: 0,
            second: 0.0,
            original: None,
            played: None,
        }];
        let (domain, _) = y_of(&to_chart_domain(&samples, Metric::Pitch));
        assert_eq!(domain, [0.0, 0.0]);
    }

    #[test]
    fn test_outlier_keeps_ticks_bounded() {
        let d = to_chart_domain(&numeric(&[(100.0, 110.0), (2e7, 120.0)]), Metric::Pitch);
        let (domain, ticks) = y_of(&d);
        assert_eq!(domain, [50.0, 2e7 + 50.0]);
        assert!(ticks.len() <= MAX_TICKS);
        assert_eq!(ticks[0], 50.0);
        // Widened step is still a whole multiple of the base step
        let step = ticks[1] - ticks[0];
        assert_eq!((step / tick_step(Metric::Pitch)).fract(), 0.0);
        assert!(*ticks.last().unwrap() <= domain[1]);

        let d = to_chart_domain(&numeric(&[(100.0, 110.0), (1e20, 120.0)]), Metric::Pitch);
        let (_, ticks) = y_of(&d);
        assert!(ticks.len() <= MAX_TICKS);
        assert!(ticks.iter().all(|t| t.is_finite()));
    }

    #[test]
    fn test_extreme_values_never_panic() {
        let d = to_chart_domain(&numeric(&[(f64::MAX, 1.0)]), Metric::Pitch);
        let (domain, ticks) = y_of(&d);
        assert_eq!(domain[0], 0.0);
        assert!(!ticks.is_empty() && ticks.len() <= MAX_TICKS);
        assert!(ticks.iter().all(|t| t.is_finite()));

        let d = to_chart_domain(&numeric(&[(f64::NAN, f64::INFINITY)]), Metric::Rhythm);
        let (domain, _) = y_of(&d);
        assert_eq!(domain, [0.0, 0.0]);
    }

    #[test]
    fn test_negative_only_values() {
        // Domain formula gives an inverted axis; ticks collapse to the floor
        let d = to_chart_domain(&numeric(&[(-200.0, -150.0), (-180.0, -120.0)]), Metric::Pitch);
        let (domain, ticks) = y_of(&d);
        assert_eq!(domain, [0.0, -70.0]);
        assert_eq!(ticks, vec![0.0]);

        let d = to_chart_domain(&numeric(&[(-20.0, -10.0)]), Metric::Pitch);
        let (domain, ticks) = y_of(&d);
        assert_eq!(domain, [0.0, 40.0]);
        assert_eq!(ticks, vec![0.0, 20.0, 40.0]);
    }

    #[test]
    fn test_wide_x_span_keeps_ticks_bounded() {
        let samples: Vec<ComparisonSample> = (0..3)
            .map(|i| ComparisonSample {
                index: i,
                second: i as f64 * 1e6,
                original: Some(SampleValue::Number(100.0)),
                played: Some(SampleValue::Number(100.0)),
            })
            .collect();
        let d = to_chart_domain(&samples, Metric::Pitch);
        assert_eq!(d.x_domain, [0.0, 2e6]);
        assert!(d.x_ticks.len() <= MAX_TICKS);
        assert_eq!(d.x_ticks[0], 0.0);

        let d = to_chart_domain(&samples, Metric::Technique);
        assert!(d.x_ticks.len() <= MAX_TICKS);
    }
}
