use super::scale::ScaleFunction;
use super::technique::labels_match;
use crate::analysis::ComparisonSample;

/// Width of a mismatch highlight rectangle, in pixels.
pub const MARKER_WIDTH: f64 = 12.0;

/// Distance of the mismatch glyph above the plot area, in pixels.
pub const GLYPH_OFFSET: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Series {
    Original,
    Played,
}

/// Band between the two series over one consecutive sample pair.
#[derive(Debug, Clone, PartialEq)]
pub struct DivergenceRegion {
    pub start_index: usize,
    pub end_index: usize,
    /// Series lying above the other across the pair.
    pub top_series: Series,
    /// `max(original, played)` at the start and end of the pair (domain units).
    pub top: [f64; 2],
    /// `min(original, played)` at the start and end of the pair (domain units).
    pub bottom: [f64; 2],
    /// Screen-space quadrilateral: top-start, top-end, bottom-end, bottom-start.
    pub polygon: Vec<Point>,
}

/// Divergence fill between reference and user lines, one polygon per
/// consecutive sample pair. Pairs with a missing or non-numeric value at
/// either endpoint are skipped.
pub fn divergence_regions(
    samples: &[ComparisonSample],
    x: &dyn ScaleFunction,
    y: &dyn ScaleFunction,
) -> Vec<DivergenceRegion> {
    samples
        .windows(2)
        .filter_map(|pair| {
            let (start, end) = (&pair[0], &pair[1]);
            let (o0, p0) = start.numeric_pair()?;
            let (o1, p1) = end.numeric_pair()?;

            let top = [o0.max(p0), o1.max(p1)];
            let bottom = [o0.min(p0), o1.min(p1)];
            let top_series = if o0 + o1 >= p0 + p1 {
                Series::Original
            } else {
                Series::Played
            };

            let (x0, x1) = (x.to_pixel(start.second), x.to_pixel(end.second));
            let polygon = vec![
                Point { x: x0, y: y.to_pixel(top[0]) },
                Point { x: x1, y: y.to_pixel(top[1]) },
                Point { x: x1, y: y.to_pixel(bottom[1]) },
                Point { x: x0, y: y.to_pixel(bottom[0]) },
            ];

            Some(DivergenceRegion {
                start_index: start.index,
                end_index: end.index,
                top_series,
                top,
                bottom,
                polygon,
            })
        })
        .collect()
}

/// A technique sample whose original and played labels disagree.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TechniqueMismatchMarker {
    pub second: f64,
    pub index: usize,
}

pub fn mismatch_markers(samples: &[ComparisonSample]) -> Vec<TechniqueMismatchMarker> {
    samples
        .iter()
        .filter_map(|s| {
            let (original, played) = s.label_pair()?;
            (!labels_match(&original, &played)).then_some(TechniqueMismatchMarker {
                second: s.second,
                index: s.index,
            })
        })
        .collect()
}

/// Screen geometry for one mismatch marker.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MismatchOverlay {
    pub marker: TechniqueMismatchMarker,
    /// Fixed-width highlight spanning the full y range.
    pub highlight: Rect,
    /// Anchor of the glyph drawn above the highlight.
    pub glyph: Point,
}

/// Lay out mismatch markers against the realized x scale and the pixel
/// extent of the y axis (`y_range` in either order).
pub fn mismatch_overlays(
    markers: &[TechniqueMismatchMarker],
    x: &dyn ScaleFunction,
    y_range: [f64; 2],
    width: f64,
) -> Vec<MismatchOverlay> {
    let top = y_range[0].min(y_range[1]);
    let height = (y_range[0] - y_range[1]).abs();

    markers
        .iter()
        .map(|&marker| {
            let cx = x.to_pixel(marker.second);
            MismatchOverlay {
                marker,
                highlight: Rect {
                    x: cx - width / 2.0,
                    y: top,
                    width,
                    height,
                },
                glyph: Point {
                    x: cx,
                    y: top - GLYPH_OFFSET,
                },
            }
        })
        .collect()
}

/// Hover state for mismatch markers: at most one is active at a time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MarkerHover {
    active: Option<usize>,
}

impl MarkerHover {
    /// Pointer entered the marker for sample `index`; it replaces any other.
    pub fn enter(&mut self, index: usize) {
        self.active = Some(index);
    }

    /// Pointer left the marker for sample `index`. Leaving a marker that is
    /// no longer active (a later `enter` won) is ignored.
    pub fn leave(&mut self, index: usize) {
        if self.active == Some(index) {
            self.active = None;
        }
    }

    pub fn clear(&mut self) {
        self.active = None;
    }

    pub fn active(&self) -> Option<usize> {
        self.active
    }

    pub fn is_active(&self, index: usize) -> bool {
        self.active == Some(index)
    }
}
