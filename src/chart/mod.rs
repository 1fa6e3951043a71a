pub mod annotate;
pub mod domain;
pub mod scale;
pub mod technique;

pub use annotate::{
    DivergenceRegion, MarkerHover, MismatchOverlay, Point, Rect, Series, TechniqueMismatchMarker,
    divergence_regions, mismatch_markers, mismatch_overlays,
};
pub use domain::{ChartDomain, ChartPoints, LinePoint, YAxis, to_chart_domain};
pub use scale::{CategoryScale, LinearScale, ScaleFunction};
pub use technique::{TECHNIQUE_CATEGORIES, TechniquePoint, TechniqueSeries};
