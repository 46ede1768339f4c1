// Chart rendering for one point's measurements
//
// - time_series: temperature, pH, dissolved oxygen and conductivity over time,
//   each on its own scale stacked on the left
// - concentration: nitrates, nitrites, phosphates, chlorides and sulphates as
//   markers on one mg/L scale
//
// Both return a ChartArtifact describing the chart; render turns it into
// SVG/RGB/PNG output with plotters.

pub mod concentration;
pub mod model;
pub mod render;
pub mod time_series;

use thiserror::Error;

pub use concentration::render_concentration_chart;
pub use model::{
    ChartArtifact, ChartKind, MarkerShape, Series, SeriesColor, SeriesPoint, SeriesStyle,
    ValueAxis, FLAG_CAPTION,
};
pub use render::{RasterImage, DEFAULT_SIZE};
pub use time_series::render_time_series;

#[derive(Error, Debug)]
pub enum ChartError {
    #[error("No measurements provided for plotting")]
    NoMeasurements,

    #[error("Chart rendering failed: {0}")]
    Render(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
