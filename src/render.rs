use std::io::{self, Write};

use crate::chart::{
    CategoryScale, ChartPoints, LinePoint, MarkerHover, ScaleFunction, TECHNIQUE_CATEGORIES,
    TechniquePoint, YAxis,
};
use crate::pipeline::{ChartFrame, Overlay};

const ORIGINAL_COLOR: &str = "#38bdf8";
const PLAYED_COLOR: &str = "#f97316";
const MATCHED_COLOR: &str = "#22c55e";
const MISMATCH_COLOR: &str = "#ef4444";
const AXIS_COLOR: &str = "rgba(255,255,255,0.25)";
const LABEL_COLOR: &str = "rgba(255,255,255,0.6)";

/// Per-render UI parameters that aren't part of the data.
#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    pub title: String,
    pub hover: MarkerHover,
}

/// Write a standalone SVG document for one chart frame.
pub fn write_svg<W: Write>(w: &mut W, frame: &ChartFrame, options: &RenderOptions) -> io::Result<()> {
    let width = frame.plot.right + frame.plot.left;
    let height = frame.plot.bottom + frame.plot.top;

    writeln!(
        w,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{height}" viewBox="0 0 {width} {height}" font-family="Inter, system-ui, sans-serif">"#
    )?;
    writeln!(w, r##"<rect width="100%" height="100%" fill="#0f172a"/>"##)?;
    if !options.title.is_empty() {
        writeln!(
            w,
            r#"<text x="{:.1}" y="{:.1}" font-size="12" fill="white">{}</text>"#,
            frame.plot.left,
            frame.plot.top / 2.0,
            escape(&options.title)
        )?;
    }

    write_axes(w, frame)?;

    if frame.domain.is_empty() {
        writeln!(
            w,
            r#"<text x="{:.1}" y="{:.1}" text-anchor="middle" font-size="14" fill="{LABEL_COLOR}">No data</text>"#,
            width / 2.0,
            height / 2.0
        )?;
        return writeln!(w, "</svg>");
    }

    match (&frame.domain.points, &frame.overlay) {
        (ChartPoints::Line(points), Overlay::Divergence(regions)) => {
            for region in regions {
                let pts: Vec<String> = region
                    .polygon
                    .iter()
                    .map(|p| format!("{:.1},{:.1}", p.x, p.y))
                    .collect();
                writeln!(
                    w,
                    r#"<polygon class="divergence" points="{}" fill="{MISMATCH_COLOR}" fill-opacity="0.18" stroke="none"/>"#,
                    pts.join(" ")
                )?;
            }
            write_line(w, frame, points, |p| p.original, ORIGINAL_COLOR, "original")?;
            write_line(w, frame, points, |p| p.played, PLAYED_COLOR, "played")?;
        }
        (ChartPoints::Technique(series), Overlay::Mismatch(overlays)) => {
            for o in overlays {
                let active = options.hover.is_active(o.marker.index);
                let opacity = if active { 0.35 } else { 0.12 };
                writeln!(
                    w,
                    r#"<rect class="mismatch{}" data-index="{}" x="{:.1}" y="{:.1}" width="{:.1}" height="{:.1}" fill="{MISMATCH_COLOR}" fill-opacity="{opacity}"/>"#,
                    if active { " active" } else { "" },
                    o.marker.index,
                    o.highlight.x,
                    o.highlight.y,
                    o.highlight.width,
                    o.highlight.height
                )?;
                writeln!(
                    w,
                    r#"<text x="{:.1}" y="{:.1}" text-anchor="middle" font-size="{}" fill="{MISMATCH_COLOR}">!</text>"#,
                    o.glyph.x,
                    o.glyph.y,
                    if active { 14 } else { 10 }
                )?;
            }

            let categories = CategoryScale::new(frame.plot.y_range());
            write_technique_points(w, frame, &categories, &series.matched, MATCHED_COLOR, 0.0)?;
            // Disagreement: two markers at the same x, nudged apart
            write_technique_points(w, frame, &categories, &series.original_only, ORIGINAL_COLOR, -4.0)?;
            write_technique_points(w, frame, &categories, &series.played_only, PLAYED_COLOR, 4.0)?;
        }
        _ => log::warn!("Chart points and overlay disagree on chart type, skipping series"),
    }

    writeln!(w, "</svg>")
}

fn write_axes<W: Write>(w: &mut W, frame: &ChartFrame) -> io::Result<()> {
    let plot = &frame.plot;

    writeln!(
        w,
        r#"<line x1="{:.1}" y1="{:.1}" x2="{:.1}" y2="{:.1}" stroke="{AXIS_COLOR}"/>"#,
        plot.left, plot.bottom, plot.right, plot.bottom
    )?;
    writeln!(
        w,
        r#"<line x1="{:.1}" y1="{:.1}" x2="{:.1}" y2="{:.1}" stroke="{AXIS_COLOR}"/>"#,
        plot.left, plot.top, plot.left, plot.bottom
    )?;

    for &tick in &frame.domain.x_ticks {
        let x = frame.x_scale.to_pixel(tick);
        writeln!(
            w,
            r#"<text x="{x:.1}" y="{:.1}" text-anchor="middle" font-size="10" fill="{LABEL_COLOR}">{}</text>"#,
            plot.bottom + 14.0,
            format_tick(tick)
        )?;
    }

    for &marker in &frame.domain.measure_markers {
        let x = frame.x_scale.to_pixel(marker);
        writeln!(
            w,
            r#"<line class="measure" x1="{x:.1}" y1="{:.1}" x2="{x:.1}" y2="{:.1}" stroke="{AXIS_COLOR}" stroke-dasharray="4 4"/>"#,
            plot.top, plot.bottom
        )?;
    }

    match &frame.domain.y_axis {
        YAxis::Continuous { ticks, .. } => {
            for &tick in ticks {
                let y = frame.y_scale.to_pixel(tick);
                writeln!(
                    w,
                    r#"<text x="{:.1}" y="{y:.1}" text-anchor="end" dominant-baseline="middle" font-size="10" fill="{LABEL_COLOR}">{}</text>"#,
                    plot.left - 4.0,
                    format_tick(tick)
                )?;
            }
        }
        YAxis::Categorical { categories } => {
            let scale = CategoryScale::new(plot.y_range());
            for label in categories.iter() {
                if let Some(y) = scale.label_to_pixel(label) {
                    writeln!(
                        w,
                        r#"<text x="{:.1}" y="{y:.1}" text-anchor="end" dominant-baseline="middle" font-size="10" fill="{LABEL_COLOR}">{label}</text>"#,
                        plot.left - 4.0
                    )?;
                }
            }
        }
    }

    Ok(())
}

/// Polyline for one series, broken wherever a value is missing.
fn write_line<W: Write>(
    w: &mut W,
    frame: &ChartFrame,
    points: &[LinePoint],
    value: impl Fn(&LinePoint) -> Option<f64>,
    color: &str,
    class: &str,
) -> io::Result<()> {
    for run in points.split(|p| value(p).is_none()) {
        if run.is_empty() {
            continue;
        }
        let pts: Vec<String> = run
            .iter()
            .filter_map(|p| {
                let v = value(p)?;
                Some(format!(
                    "{:.1},{:.1}",
                    frame.x_scale.to_pixel(p.second),
                    frame.y_scale.to_pixel(v)
                ))
            })
            .collect();
        writeln!(
            w,
            r#"<polyline class="{class}" points="{}" fill="none" stroke="{color}" stroke-width="2"/>"#,
            pts.join(" ")
        )?;
    }
    Ok(())
}

fn write_technique_points<W: Write>(
    w: &mut W,
    frame: &ChartFrame,
    categories: &CategoryScale,
    points: &[TechniquePoint],
    color: &str,
    nudge: f64,
) -> io::Result<()> {
    for point in points {
        let x = frame.x_scale.to_pixel(point.second) + nudge;
        for label in &point.labels {
            match categories.label_to_pixel(label) {
                Some(y) => writeln!(
                    w,
                    r#"<circle cx="{x:.1}" cy="{y:.1}" r="4" fill="{color}" stroke="white" stroke-width="1"/>"#
                )?,
                None => log::debug!(
                    "Technique label {label:?} at {}s is not one of {:?}, not plotted",
                    point.second,
                    TECHNIQUE_CATEGORIES
                ),
            }
        }
    }
    Ok(())
}

fn format_tick(v: f64) -> String {
    if v.fract() == 0.0 {
        format!("{v:.0}")
    } else {
        format!("{v:.1}")
    }
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
