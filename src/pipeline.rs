use std::sync::Arc;

use crate::analysis::{AnalysisResult, ComparisonSample, Metric, normalize};
use crate::backend::{ResultSource, Scoped, ViewScope};
use crate::chart::annotate::MARKER_WIDTH;
use crate::chart::{
    ChartDomain, DivergenceRegion, LinearScale, MismatchOverlay, divergence_regions,
    mismatch_markers, mismatch_overlays, to_chart_domain,
};
use crate::config::ChartConfig;

/// Pixel bounds of the plot area inside the chart.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlotArea {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl PlotArea {
    pub fn new(chart: &ChartConfig) -> Self {
        // Keep at least a 1px plot even for a margin larger than the chart
        let margin_x = chart.margin.clamp(0.0, ((chart.width - 1.0) / 2.0).max(0.0));
        let margin_y = chart.margin.clamp(0.0, ((chart.height - 1.0) / 2.0).max(0.0));
        Self {
            left: margin_x,
            top: margin_y,
            right: chart.width - margin_x,
            bottom: chart.height - margin_y,
        }
    }

    pub fn x_range(&self) -> [f64; 2] {
        [self.left, self.right]
    }

    /// Bottom to top, since domain values grow upward.
    pub fn y_range(&self) -> [f64; 2] {
        [self.bottom, self.top]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Overlay {
    Divergence(Vec<DivergenceRegion>),
    Mismatch(Vec<MismatchOverlay>),
}

/// Everything needed to draw one comparison chart at one size.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartFrame {
    pub samples: Vec<ComparisonSample>,
    pub domain: ChartDomain,
    pub plot: PlotArea,
    pub x_scale: LinearScale,
    pub y_scale: LinearScale,
    pub overlay: Overlay,
}

/// One loaded performance result, ready to be charted.
#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonView {
    result: AnalysisResult,
    step: f64,
}

impl ComparisonView {
    pub fn new(result: AnalysisResult, step: f64) -> Self {
        Self { result, step }
    }

    pub fn result(&self) -> &AnalysisResult {
        &self.result
    }

    /// Derive a chart frame: normalize → adapt → annotate, in that order,
    /// against scales realized for `chart`. Pure: same inputs, same frame.
    pub fn frame(&self, metric: Metric, chart: &ChartConfig) -> ChartFrame {
        let samples = normalize(&self.result, metric, self.step);
        let domain = to_chart_domain(&samples, metric);

        let plot = PlotArea::new(chart);
        let x_scale = LinearScale::new(domain.x_domain, plot.x_range());
        let y_scale = LinearScale::new(domain.y_domain(), plot.y_range());

        let overlay = if metric.is_continuous() {
            Overlay::Divergence(divergence_regions(&samples, &x_scale, &y_scale))
        } else {
            let markers = mismatch_markers(&samples);
            Overlay::Mismatch(mismatch_overlays(&markers, &x_scale, plot.y_range(), MARKER_WIDTH))
        };

        log::debug!(
            "{} frame: {} samples at {}x{}",
            metric.label(),
            samples.len(),
            chart.width,
            chart.height
        );

        ChartFrame {
            samples,
            domain,
            plot,
            x_scale,
            y_scale,
            overlay,
        }
    }
}

/// Page-level state of a comparison view.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewState {
    Loading,
    Ready(ComparisonView),
    /// The fetch failed; the page shows its "no results" state.
    NoResults(String),
    /// The view closed before the fetch completed.
    Cancelled,
}

/// Fetch a task's result within `scope` and turn it into a view state.
/// Failures are not retried.
pub async fn load_view<S>(scope: &ViewScope, source: Arc<S>, task_id: &str, step: f64) -> ViewState
where
    S: ResultSource + 'static,
{
    let id = task_id.to_string();
    match scope.run_blocking(move || source.fetch_result(&id)).await {
        Scoped::Done(Ok(result)) => ViewState::Ready(ComparisonView::new(result, step)),
        Scoped::Done(Err(e)) => {
            log::warn!("Could not load result {task_id}: {e}");
            ViewState::NoResults(e.to_string())
        }
        Scoped::Cancelled => ViewState::Cancelled,
    }
}
