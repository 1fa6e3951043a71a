use std::path::{Path, PathBuf};

use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use thiserror::Error;
use walkdir::WalkDir;

use crate::analysis::{AnalysisResult, GapStats, Metric, Scores, gap_stats, normalize};
use crate::chart::mismatch_markers;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),
    #[error("Failed to build worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}

/// Comparison summary for one saved analysis result.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultSummary {
    pub path: PathBuf,
    pub scores: Scores,
    pub pitch: GapStats,
    pub rhythm: GapStats,
    pub technique_samples: usize,
    pub technique_mismatches: usize,
}

impl ResultSummary {
    pub fn from_result(path: PathBuf, result: &AnalysisResult, step: f64) -> Self {
        let techniques = normalize(result, Metric::Technique, step);
        Self {
            path,
            scores: result.scores,
            pitch: gap_stats(&normalize(result, Metric::Pitch, step)),
            rhythm: gap_stats(&normalize(result, Metric::Rhythm, step)),
            technique_samples: techniques.len(),
            technique_mismatches: mismatch_markers(&techniques).len(),
        }
    }
}

pub struct ReportResult {
    pub summaries: Vec<ResultSummary>,
    pub failed: usize,
}

/// All `*.json` files under `dir`, sorted for deterministic output.
pub fn find_result_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| match e {
            Ok(entry) => Some(entry),
            Err(err) => {
                log::warn!("Skipping unreadable entry: {err}");
                None
            }
        })
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| {
            p.extension()
                .map(|ext| ext.eq_ignore_ascii_case("json"))
                .unwrap_or(false)
        })
        .collect();
    files.sort();
    files
}

/// Load and summarize every saved result under `dir` in parallel.
/// Files that can't be read or parsed are counted, not fatal.
pub fn summarize_dir(dir: &Path, jobs: usize, step: f64) -> Result<ReportResult, ReportError> {
    if !dir.is_dir() {
        return Err(ReportError::NotADirectory(dir.to_path_buf()));
    }

    let files = find_result_files(dir);
    log::info!("Summarizing {} result files with {} workers", files.len(), jobs);

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::with_template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} results ({eta}) {msg}")
            .map(|s| s.progress_chars("=>-"))
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );

    let pool = rayon::ThreadPoolBuilder::new().num_threads(jobs).build()?;

    let loaded: Vec<Option<ResultSummary>> = pool.install(|| {
        files
            .par_iter()
            .map(|path| {
                let summary = load_summary(path, step);
                pb.inc(1);
                summary
            })
            .collect()
    });

    let failed = loaded.iter().filter(|s| s.is_none()).count();
    let summaries: Vec<ResultSummary> = loaded.into_iter().flatten().collect();

    pb.finish_with_message(format!("{} summarized, {} failed", summaries.len(), failed));
    Ok(ReportResult { summaries, failed })
}

fn load_summary(path: &Path, step: f64) -> Option<ResultSummary> {
    let contents = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            log::warn!("Failed to read {}: {}", path.display(), e);
            return None;
        }
    };
    match serde_json::from_str::<AnalysisResult>(&contents) {
        Ok(result) => Some(ResultSummary::from_result(path.to_path_buf(), &result, step)),
        Err(e) => {
            log::warn!("Failed to parse {}: {}", path.display(), e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RESULT_JSON: &str = r#"{
        "user_features": {
            "pitches": [100, 110, 90],
            "onsets": [0.0, 0.6, 1.0],
            "techniques": ["normal", "bend", "vibrato"]
        },
        "reference_features": {
            "pitches": [105, 108, 95],
            "onsets": [0.0, 0.5, 1.0],
            "techniques": ["normal", "vibrato", ["vibrato"]]
        },
        "feedback": "Solid timing.",
        "scores": {"overall_score": 74.0}
    }"#;

    #[test]
    fn test_summary_from_result() {
        let result: AnalysisResult = serde_json::from_str(RESULT_JSON).unwrap();
        let s = ResultSummary::from_result(PathBuf::from("a.json"), &result, 0.5);
        assert_eq!(s.scores.overall_score, 74.0);
        assert_eq!(s.pitch.compared, 3);
        assert!((s.pitch.mean_abs_gap - 4.0).abs() < 1e-12);
        assert_eq!(s.technique_samples, 3);
        assert_eq!(s.technique_mismatches, 1);
    }

    #[test]
    fn test_summarize_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("b.json"), RESULT_JSON).unwrap();
        std::fs::write(dir.path().join("nested/a.JSON"), RESULT_JSON).unwrap();
        std::fs::write(dir.path().join("broken.json"), "{not json").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let report = summarize_dir(dir.path(), 2, 0.5).unwrap();
        assert_eq!(report.summaries.len(), 2);
        assert_eq!(report.failed, 1);
    }

    #[test]
    fn test_summarize_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert!(matches!(
            summarize_dir(&missing, 1, 0.5),
            Err(ReportError::NotADirectory(_))
        ));
    }
}
