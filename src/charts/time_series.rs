use tracing::debug;

use crate::charts::model::{
    sort_by_timestamp, time_range, ChartArtifact, ChartKind, Series, SeriesColor, SeriesStyle,
    Trace, ValueAxis, FLAG_CAPTION,
};
use crate::charts::ChartError;
use crate::domain::{Measurement, Parameter};

/// Display settings for one independently scaled parameter
struct AxisScale {
    parameter: Parameter,
    label: &'static str,
    color: SeriesColor,
    min: f64,
    max: f64,
}

/// Drawing order; each entry gets its own axis when it has data
const SCALES: [AxisScale; 4] = [
    AxisScale {
        parameter: Parameter::WaterTemperature,
        label: "Water temperature [°C]",
        color: SeriesColor(31, 119, 180),
        min: 0.0,
        max: 30.0,
    },
    AxisScale {
        parameter: Parameter::Ph,
        label: "pH",
        color: SeriesColor(255, 127, 14),
        min: 5.0,
        max: 9.0,
    },
    AxisScale {
        parameter: Parameter::DissolvedOxygen,
        label: "Dissolved oxygen [mg/L]",
        color: SeriesColor(0, 100, 0),
        min: 0.0,
        max: 15.0,
    },
    AxisScale {
        parameter: Parameter::Conductivity,
        label: "Conductivity [µS/cm]",
        color: SeriesColor(148, 103, 189),
        min: 0.0,
        max: 3500.0,
    },
];

/// Time-series overlay of the continuous physicochemical parameters
///
/// Parameters without a single recorded value get neither an axis nor a
/// legend entry. Missing values become gaps in the line.
pub fn render_time_series(
    measurements: &[Measurement],
    title: Option<&str>,
) -> Result<ChartArtifact, ChartError> {
    let sorted = sort_by_timestamp(measurements);
    let time_range = time_range(&sorted).ok_or(ChartError::NoMeasurements)?;

    let mut axes = Vec::new();
    let mut series = Vec::new();

    for scale in &SCALES {
        let trace = Trace::extract(&sorted, scale.parameter);
        if !trace.has_values() {
            debug!("No {} values, omitting axis", scale.parameter);
            continue;
        }

        let axis = axes.len();
        axes.push(ValueAxis {
            label: scale.label.to_string(),
            color: scale.color,
            min: scale.min,
            max: scale.max,
        });
        series.push(Series {
            parameter: scale.parameter,
            label: scale.label.to_string(),
            color: scale.color,
            style: SeriesStyle::Line,
            axis,
            points: trace.all,
            highlighted: trace.flagged,
        });
    }

    let mut chart = ChartArtifact {
        kind: ChartKind::TimeSeries,
        title: title.map(str::to_string),
        time_range,
        axes,
        series,
        caption: None,
    };
    if chart.has_flagged_values() {
        chart.caption = Some(FLAG_CAPTION.to_string());
    }
    Ok(chart)
}
