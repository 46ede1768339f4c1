/// Drawing of a [`ChartArtifact`] with plotters
///
/// Layout (top to bottom): title, plot area, legend row, optional flag caption.
/// Time-series charts stack one coloured value axis per parameter on the left
/// of the plot area; series are projected onto a shared 0..1 range so each
/// keeps its own physical scale.
use chrono::{DateTime, NaiveDateTime};
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use plotters::style::{FontStyle, FontTransform};
use std::panic;
use std::path::Path;
use tracing::debug;

use crate::charts::model::{
    clip_to_unit_band, ChartArtifact, ChartKind, MarkerShape, SeriesColor, SeriesStyle,
};
use crate::charts::ChartError;

/// Raster size used when the caller does not choose one
pub const DEFAULT_SIZE: (u32, u32) = (1400, 600);

const FONT: &str = "sans-serif";
/// Horizontal distance between stacked value axes
const AXIS_SPACING: i32 = 60;
const TICK_FRACTIONS: [f64; 5] = [0.0, 0.25, 0.5, 0.75, 1.0];
const LEGEND_ROW_HEIGHT: u32 = 36;
const CAPTION_ROW_HEIGHT: u32 = 26;
const MARKER_RADIUS: i32 = 5;

/// Uncompressed RGB8 image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl ChartArtifact {
    /// Render to an SVG document
    pub fn to_svg(&self, size: (u32, u32)) -> Result<String, ChartError> {
        let mut svg = String::new();
        {
            let root = SVGBackend::with_string(&mut svg, size).into_drawing_area();
            render_guarded(|| draw_chart(self, &root).map_err(|e| e.to_string()))?;
        }
        Ok(svg)
    }

    /// Render to an in-memory RGB buffer
    pub fn to_rgb(&self, size: (u32, u32)) -> Result<RasterImage, ChartError> {
        let (width, height) = size;
        let mut pixels = vec![0u8; width as usize * height as usize * 3];
        {
            let root = BitMapBackend::with_buffer(&mut pixels, size).into_drawing_area();
            render_guarded(|| draw_chart(self, &root).map_err(|e| e.to_string()))?;
        }
        Ok(RasterImage {
            width,
            height,
            pixels,
        })
    }

    /// Render and write a PNG file, creating missing parent directories
    pub fn save_png(&self, path: &Path, size: (u32, u32)) -> Result<(), ChartError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        debug!("Writing chart to {}", path.display());
        let root = BitMapBackend::new(path, size).into_drawing_area();
        render_guarded(|| draw_chart(self, &root).map_err(|e| e.to_string()))
    }
}

/// Font backends can panic when no usable system font exists
fn render_guarded<F>(render: F) -> Result<(), ChartError>
where
    F: FnOnce() -> Result<(), String>,
{
    panic::catch_unwind(panic::AssertUnwindSafe(render))
        .map_err(|_| ChartError::Render("plotting backend panicked".to_string()))?
        .map_err(ChartError::Render)
}

fn rgb(color: SeriesColor) -> RGBColor {
    RGBColor(color.0, color.1, color.2)
}

/// Chart x coordinate: days since the Unix epoch
fn to_days(timestamp: NaiveDateTime) -> f64 {
    timestamp.and_utc().timestamp() as f64 / 86_400.0
}

fn format_day(days: &f64) -> String {
    DateTime::from_timestamp((days * 86_400.0).round() as i64, 0)
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

fn format_tick(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value:.1}")
    }
}

/// Marker outline centred on (0, 0)
fn marker_vertices(shape: MarkerShape, r: i32) -> Vec<(i32, i32)> {
    match shape {
        MarkerShape::Circle => (0..12)
            .map(|i| {
                let angle = std::f64::consts::TAU * i as f64 / 12.0;
                (
                    (r as f64 * angle.cos()).round() as i32,
                    (r as f64 * angle.sin()).round() as i32,
                )
            })
            .collect(),
        MarkerShape::Square => vec![(-r, -r), (r, -r), (r, r), (-r, r)],
        MarkerShape::TriangleUp => vec![(0, -r), (r, r), (-r, r)],
        MarkerShape::TriangleDown => vec![(-r, -r), (r, -r), (0, r)],
        MarkerShape::Diamond => vec![(0, -r), (r, 0), (0, r), (-r, 0)],
    }
}

fn closed(mut vertices: Vec<(i32, i32)>) -> Vec<(i32, i32)> {
    if let Some(&first) = vertices.first() {
        vertices.push(first);
    }
    vertices
}

fn translate(vertices: &[(i32, i32)], (x, y): (i32, i32)) -> Vec<(i32, i32)> {
    vertices.iter().map(|(dx, dy)| (x + dx, y + dy)).collect()
}

fn draw_chart<DB: DrawingBackend>(
    chart: &ChartArtifact,
    root: &DrawingArea<DB, Shift>,
) -> Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
    root.fill(&WHITE)?;

    // Reserve the bottom strip for legend and caption
    let (_, height) = root.dim_in_pixel();
    let footer_height = LEGEND_ROW_HEIGHT
        + if chart.caption.is_some() {
            CAPTION_ROW_HEIGHT
        } else {
            0
        };
    let (upper, footer) = root.split_vertically(height.saturating_sub(footer_height));

    let time_series = chart.kind == ChartKind::TimeSeries;
    let stacked_axes = if time_series { chart.axes.len().max(1) as i32 } else { 0 };

    // Stacked axes are drawn by hand in the left margin
    let mut builder = ChartBuilder::on(&upper);
    builder
        .margin_top(10)
        .margin_right(30)
        .margin_left(10 + stacked_axes * AXIS_SPACING)
        .x_label_area_size(45)
        .y_label_area_size(if time_series { 0 } else { 70 });
    if let Some(title) = &chart.title {
        builder.caption(title, (FONT, 24).into_font().style(FontStyle::Bold));
    }

    // Time series plot in a shared 0..1 band; each axis maps into it
    let (start, end) = chart.time_range;
    let x_range = to_days(start)..to_days(end);
    let y_range = match (time_series, chart.axes.first()) {
        (false, Some(axis)) => axis.min..axis.max,
        _ => 0.0..1.0,
    };
    let mut ctx = builder.build_cartesian_2d(x_range.clone(), y_range)?;

    {
        let mut mesh = ctx.configure_mesh();
        mesh.x_labels(8)
            .x_label_formatter(&format_day)
            .light_line_style(BLACK.mix(0.04))
            .bold_line_style(BLACK.mix(0.12))
            .label_style((FONT, 13));
        if time_series {
            mesh.disable_y_mesh().disable_y_axis();
        } else {
            mesh.x_desc("Date").y_labels(6);
            if let Some(axis) = chart.axes.first() {
                mesh.y_desc(axis.label.as_str());
            }
        }
        mesh.draw()?;
    }

    // Horizontal grid at the shared tick positions
    if time_series {
        ctx.draw_series(TICK_FRACTIONS.iter().map(|&f| {
            PathElement::new(vec![(x_range.start, f), (x_range.end, f)], BLACK.mix(0.12))
        }))?;
    }

    // Series
    for series in &chart.series {
        let color = rgb(series.color);
        let axis = chart.axes.get(series.axis);
        let project = |v: f64| match axis {
            Some(axis) if time_series => axis.fraction(v),
            _ => v,
        };

        match series.style {
            SeriesStyle::Line => {
                // gaps split the line first, then the axis band cuts it further
                for segment in series.segments() {
                    let projected: Vec<(f64, f64)> = segment
                        .into_iter()
                        .map(|(t, v)| (to_days(t), project(v)))
                        .collect();
                    let runs = if time_series {
                        clip_to_unit_band(&projected)
                    } else {
                        vec![projected.clone()]
                    };
                    for run in runs {
                        ctx.draw_series(LineSeries::new(run, color.stroke_width(2)))?;
                    }
                    // dots only on real readings, not on the edge crossings
                    ctx.draw_series(
                        projected
                            .into_iter()
                            .filter(|&(_, y)| !time_series || (0.0..=1.0).contains(&y))
                            .map(|c| Circle::new(c, 2, color.filled())),
                    )?;
                }
                // flagged readings outside the axis stay off the plot like the line
                ctx.draw_series(series.highlighted.iter().filter_map(|p| {
                    let value = p.value?;
                    if time_series && axis.is_some_and(|a| !a.contains(value)) {
                        return None;
                    }
                    Some(
                        EmptyElement::at((to_days(p.timestamp), project(value)))
                            + Circle::new((0, 0), MARKER_RADIUS, color.filled())
                            + Circle::new((0, 0), MARKER_RADIUS + 1, BLACK.stroke_width(2)),
                    )
                }))?;
            }
            SeriesStyle::Markers(shape) => {
                let vertices = marker_vertices(shape, MARKER_RADIUS);
                ctx.draw_series(series.points.iter().filter_map(|p| {
                    let value = p.value?;
                    Some(
                        EmptyElement::at((to_days(p.timestamp), project(value)))
                            + Polygon::new(vertices.clone(), color.mix(0.7).filled()),
                    )
                }))?;

                let large = marker_vertices(shape, MARKER_RADIUS + 1);
                ctx.draw_series(series.highlighted.iter().filter_map(|p| {
                    let value = p.value?;
                    Some(
                        EmptyElement::at((to_days(p.timestamp), project(value)))
                            + Polygon::new(large.clone(), color.mix(0.9).filled())
                            + PathElement::new(closed(large.clone()), BLACK.stroke_width(2)),
                    )
                }))?;
            }
        }
    }

    if time_series {
        let (x_px, y_px) = ctx.plotting_area().get_pixel_range();
        draw_stacked_axes(chart, &upper, x_px.start, (y_px.start, y_px.end))?;
    }

    draw_footer(chart, &footer)?;
    root.present()?;
    Ok(())
}

/// One value axis per series, stacked leftwards from the plot area
fn draw_stacked_axes<DB: DrawingBackend>(
    chart: &ChartArtifact,
    area: &DrawingArea<DB, Shift>,
    plot_left: i32,
    (top, bottom): (i32, i32),
) -> Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
    for (i, axis) in chart.axes.iter().enumerate() {
        let color = rgb(axis.color);
        let x = plot_left - 4 - i as i32 * AXIS_SPACING;

        area.draw(&PathElement::new(vec![(x, top), (x, bottom)], color.stroke_width(2)))?;

        for fraction in TICK_FRACTIONS {
            let y = bottom - ((bottom - top) as f64 * fraction).round() as i32;
            area.draw(&PathElement::new(vec![(x - 5, y), (x, y)], color.stroke_width(1)))?;
            let value = axis.min + (axis.max - axis.min) * fraction;
            area.draw(&Text::new(
                format_tick(value),
                (x - 7, y),
                (FONT, 12)
                    .into_font()
                    .color(&color)
                    .pos(Pos::new(HPos::Right, VPos::Center)),
            ))?;
        }

        area.draw(&Text::new(
            axis.label.clone(),
            (x - 44, (top + bottom) / 2),
            (FONT, 13)
                .into_font()
                .transform(FontTransform::Rotate270)
                .color(&color)
                .pos(Pos::new(HPos::Center, VPos::Center)),
        ))?;
    }
    Ok(())
}

/// Legend row below the plot, then the flag caption
fn draw_footer<DB: DrawingBackend>(
    chart: &ChartArtifact,
    area: &DrawingArea<DB, Shift>,
) -> Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
    let (width, _) = area.dim_in_pixel();
    let label_style = (FONT, 14)
        .into_font()
        .color(&BLACK)
        .pos(Pos::new(HPos::Left, VPos::Center));
    let legend_y = (LEGEND_ROW_HEIGHT / 2) as i32;

    let mut entries = Vec::with_capacity(chart.series.len());
    for series in &chart.series {
        let (w, _) = area.estimate_text_size(&series.label, &label_style)?;
        entries.push((series, w as i32));
    }
    let total: i32 = entries.iter().map(|(_, w)| 30 + w + 20).sum();
    let mut x = (width as i32 - total).max(0) / 2;

    for (series, text_width) in entries {
        let color = rgb(series.color);
        match series.style {
            SeriesStyle::Line => {
                area.draw(&PathElement::new(
                    vec![(x, legend_y), (x + 22, legend_y)],
                    color.stroke_width(3),
                ))?;
            }
            SeriesStyle::Markers(shape) => {
                let vertices = marker_vertices(shape, MARKER_RADIUS);
                area.draw(&Polygon::new(
                    translate(&vertices, (x + 11, legend_y)),
                    color.mix(0.7).filled(),
                ))?;
            }
        }
        area.draw(&Text::new(
            series.label.clone(),
            (x + 30, legend_y),
            label_style.clone(),
        ))?;
        x += 30 + text_width + 20;
    }

    if let Some(caption) = &chart.caption {
        area.draw(&Text::new(
            caption.clone(),
            (width as i32 / 2, (LEGEND_ROW_HEIGHT + CAPTION_ROW_HEIGHT / 2) as i32),
            (FONT, 12)
                .into_font()
                .style(FontStyle::Italic)
                .color(&BLACK)
                .pos(Pos::new(HPos::Center, VPos::Center)),
        ))?;
    }
    Ok(())
}
