use tracing::debug;

use crate::charts::model::{
    sort_by_timestamp, time_range, ChartArtifact, ChartKind, MarkerShape, Series, SeriesColor,
    SeriesStyle, Trace, ValueAxis, FLAG_CAPTION,
};
use crate::charts::ChartError;
use crate::domain::{Measurement, Parameter};

pub const CONCENTRATION_AXIS_LABEL: &str = "Concentration [mg/L]";

const SERIES: [(Parameter, &str, SeriesColor, MarkerShape); 5] = [
    (Parameter::Nitrates, "Nitrates [mg/L]", SeriesColor(31, 119, 180), MarkerShape::Circle),
    (Parameter::Nitrites, "Nitrites [mg/L]", SeriesColor(255, 127, 14), MarkerShape::Square),
    (Parameter::Phosphates, "Phosphates [mg/L]", SeriesColor(44, 160, 44), MarkerShape::TriangleUp),
    (Parameter::Chlorides, "Chlorides [mg/L]", SeriesColor(214, 39, 40), MarkerShape::Diamond),
    (Parameter::Sulphates, "Sulphates [mg/L]", SeriesColor(148, 103, 189), MarkerShape::TriangleDown),
];

/// Scatter overlay of chemical concentrations on one shared mg/L axis
///
/// Each measurement's value lands in exactly one layer: the normal markers,
/// or the outlined layer when it carries a `<`/`>` flag.
pub fn render_concentration_chart(
    measurements: &[Measurement],
    title: Option<&str>,
) -> Result<ChartArtifact, ChartError> {
    let sorted = sort_by_timestamp(measurements);
    let time_range = time_range(&sorted).ok_or(ChartError::NoMeasurements)?;

    let mut series = Vec::new();
    let mut max_value = 0.0_f64;

    for (parameter, label, color, shape) in SERIES {
        let trace = Trace::extract(&sorted, parameter);
        if !trace.has_values() {
            debug!("No {} values, omitting from legend", parameter);
            continue;
        }

        max_value = trace
            .normal
            .iter()
            .chain(&trace.flagged)
            .filter_map(|p| p.value)
            .fold(max_value, f64::max);

        series.push(Series {
            parameter,
            label: label.to_string(),
            color,
            style: SeriesStyle::Markers(shape),
            axis: 0,
            points: trace.normal,
            highlighted: trace.flagged,
        });
    }

    let axis_max = if max_value > 0.0 { max_value * 1.1 } else { 1.0 };

    let mut chart = ChartArtifact {
        kind: ChartKind::Concentration,
        title: title.map(str::to_string),
        time_range,
        axes: vec![ValueAxis {
            label: CONCENTRATION_AXIS_LABEL.to_string(),
            color: SeriesColor(0, 0, 0),
            min: 0.0,
            max: axis_max,
        }],
        series,
        caption: None,
    };
    if chart.has_flagged_values() {
        chart.caption = Some(FLAG_CAPTION.to_string());
    }
    Ok(chart)
}
