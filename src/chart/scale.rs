use super::technique::{TECHNIQUE_CATEGORIES, category_index};

/// Maps a domain value to a pixel coordinate for the chart as currently drawn.
///
/// Any charting backend supplies these once it has laid out its axes; the
/// annotator depends on nothing else. Plain closures qualify.
pub trait ScaleFunction {
    fn to_pixel(&self, value: f64) -> f64;
}

impl<F: Fn(f64) -> f64> ScaleFunction for F {
    fn to_pixel(&self, value: f64) -> f64 {
        self(value)
    }
}

/// Linear mapping of `domain` onto `range`. `range` may be inverted
/// (e.g. `[bottom, top]` for a y axis where pixels grow downward).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearScale {
    domain: [f64; 2],
    range: [f64; 2],
}

impl LinearScale {
    pub fn new(domain: [f64; 2], range: [f64; 2]) -> Self {
        Self { domain, range }
    }

    pub fn domain(&self) -> [f64; 2] {
        self.domain
    }

    pub fn range(&self) -> [f64; 2] {
        self.range
    }
}

impl ScaleFunction for LinearScale {
    fn to_pixel(&self, value: f64) -> f64 {
        let [d0, d1] = self.domain;
        let [r0, r1] = self.range;
        let span = d1 - d0;
        // Degenerate (empty-series) domain: everything sits mid-range
        if span.abs() < f64::EPSILON {
            return (r0 + r1) / 2.0;
        }
        r0 + (value - d0) / span * (r1 - r0)
    }
}

/// Band scale for the technique axis: category `i` is centered in the i-th band.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CategoryScale {
    inner: LinearScale,
}

impl CategoryScale {
    pub fn new(range: [f64; 2]) -> Self {
        let n = TECHNIQUE_CATEGORIES.len() as f64;
        Self {
            inner: LinearScale::new([-0.5, n - 0.5], range),
        }
    }

    /// Pixel for a label, or `None` if it is not a known category.
    pub fn label_to_pixel(&self, label: &str) -> Option<f64> {
        category_index(label).map(|i| self.inner.to_pixel(i as f64))
    }

    pub fn range(&self) -> [f64; 2] {
        self.inner.range()
    }
}

impl ScaleFunction for CategoryScale {
    fn to_pixel(&self, value: f64) -> f64 {
        self.inner.to_pixel(value)
    }
}
