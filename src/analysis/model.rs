use serde::{Deserialize, Serialize};

/// Raw payload for one comparison task, as returned by `GET /results/{task_id}`.
///
/// Every field is optional on the wire: a partial payload still deserializes,
/// and the missing metric simply normalizes to an empty series.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct AnalysisResult {
    pub user_features: Features,
    pub reference_features: Features,
    pub feedback: String,
    pub scores: Scores,
}

/// Per-recording feature arrays, one sample per fixed time step.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Features {
    pub pitches: Option<Vec<Option<f64>>>,
    pub onsets: Option<Vec<Option<f64>>>,
    pub techniques: Option<Vec<Option<TechniqueLabel>>>,
}

/// Summary scores computed by the analysis backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Scores {
    pub overall_score: f64,
    pub tempo_match_percentage: f64,
    pub pitch_match_percentage: f64,
    pub rhythm_match_percentage: f64,
}

/// A technique entry: either one label or several simultaneously active labels.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum TechniqueLabel {
    One(String),
    Many(Vec<String>),
}

impl TechniqueLabel {
    /// Coerce to a label list (`One(x)` becomes `[x]`).
    pub fn to_list(&self) -> Vec<String> {
        match self {
            Self::One(label) => vec![label.clone()],
            Self::Many(labels) => labels.clone(),
        }
    }
}

/// Which comparison chart a series feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    Pitch,
    Rhythm,
    Technique,
}

impl Metric {
    pub const ALL: [Metric; 3] = [Metric::Pitch, Metric::Rhythm, Metric::Technique];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Pitch => "pitch",
            Self::Rhythm => "rhythm",
            Self::Technique => "technique",
        }
    }

    pub fn is_continuous(&self) -> bool {
        !matches!(self, Self::Technique)
    }
}

impl std::str::FromStr for Metric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pitch" => Ok(Self::Pitch),
            "rhythm" | "onset" | "onsets" => Ok(Self::Rhythm),
            "technique" | "techniques" => Ok(Self::Technique),
            other => Err(format!("unknown metric: {other}")),
        }
    }
}

/// Value of one side of a comparison sample.
#[derive(Debug, Clone, PartialEq)]
pub enum SampleValue {
    Number(f64),
    Label(String),
    Labels(Vec<String>),
}

impl SampleValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(v) => Some(*v),
            _ => None,
        }
    }

    /// Categorical view of the value. Scalars become single-element lists so
    /// that a `Label` and a `Labels` can be compared directly.
    pub fn labels(&self) -> Vec<String> {
        match self {
            Self::Number(v) => vec![v.to_string()],
            Self::Label(label) => vec![label.clone()],
            Self::Labels(labels) => labels.clone(),
        }
    }
}

impl From<&TechniqueLabel> for SampleValue {
    fn from(label: &TechniqueLabel) -> Self {
        match label {
            TechniqueLabel::One(l) => Self::Label(l.clone()),
            TechniqueLabel::Many(ls) => Self::Labels(ls.clone()),
        }
    }
}

/// One aligned time step of reference (`original`) vs. user (`played`).
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonSample {
    pub index: usize,
    pub second: f64,
    pub original: Option<SampleValue>,
    pub played: Option<SampleValue>,
}

impl ComparisonSample {
    /// Both sides as numbers, if both are present and numeric.
    pub fn numeric_pair(&self) -> Option<(f64, f64)> {
        let original = self.original.as_ref()?.as_number()?;
        let played = self.played.as_ref()?.as_number()?;
        Some((original, played))
    }

    /// Both sides as label lists, if both are present.
    pub fn label_pair(&self) -> Option<(Vec<String>, Vec<String>)> {
        let original = self.original.as_ref()?.labels();
        let played = self.played.as_ref()?.labels();
        Some((original, played))
    }
}
