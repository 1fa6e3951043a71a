use crate::analysis::ComparisonSample;

/// Ordered technique categories, bottom to top on the y axis.
pub const TECHNIQUE_CATEGORIES: [&str; 4] = ["normal", "bend", "vibrato", "hammer"];

/// Position of a label on the categorical axis. Case and surrounding
/// whitespace are ignored; `hammer-on` is accepted as `hammer`.
pub fn category_index(label: &str) -> Option<usize> {
    let label = label.trim().to_ascii_lowercase();
    let label = match label.as_str() {
        "hammer-on" | "hammer_on" | "hammeron" => "hammer",
        other => other,
    };
    TECHNIQUE_CATEGORIES.iter().position(|c| *c == label)
}

/// Order-sensitive label list equality: same length, same label at every position.
pub fn labels_match(original: &[String], played: &[String]) -> bool {
    original.len() == played.len() && original.iter().zip(played).all(|(o, p)| o == p)
}

/// Technique sample positioned on the chart, carrying the labels to plot.
#[derive(Debug, Clone, PartialEq)]
pub struct TechniquePoint {
    pub index: usize,
    pub second: f64,
    pub labels: Vec<String>,
}

/// Technique samples split by agreement.
///
/// A matched sample contributes one point to `matched`. A mismatched sample
/// contributes one point to `original_only` and one to `played_only` at the
/// same x, so disagreement renders as two distinct markers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TechniqueSeries {
    pub matched: Vec<TechniquePoint>,
    pub original_only: Vec<TechniquePoint>,
    pub played_only: Vec<TechniquePoint>,
    /// Samples with a missing side, not plotted.
    pub skipped: usize,
}

impl TechniqueSeries {
    pub fn partition(samples: &[ComparisonSample]) -> Self {
        let mut series = Self::default();

        for sample in samples {
            let Some((original, played)) = sample.label_pair() else {
                series.skipped += 1;
                continue;
            };

            if labels_match(&original, &played) {
                series.matched.push(TechniquePoint {
                    index: sample.index,
                    second: sample.second,
                    labels: original,
                });
            } else {
                series.original_only.push(TechniquePoint {
                    index: sample.index,
                    second: sample.second,
                    labels: original,
                });
                series.played_only.push(TechniquePoint {
                    index: sample.index,
                    second: sample.second,
                    labels: played,
                });
            }
        }

        series
    }

    /// Number of samples where original and played labels disagree.
    pub fn mismatched(&self) -> usize {
        self.original_only.len()
    }

    /// Samples that were classified (matched or mismatched).
    pub fn classified(&self) -> usize {
        self.matched.len() + self.mismatched()
    }

    pub fn is_empty(&self) -> bool {
        self.classified() == 0
    }
}
