use chrono::{Duration, NaiveDateTime};

use crate::domain::{Measurement, Parameter};

/// Footnote added to any chart that shows at least one flagged value
pub const FLAG_CAPTION: &str =
    "* Points outlined in black are values flagged '<' or '>' (outside the measurement range)";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeriesColor(pub u8, pub u8, pub u8);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    /// Continuous physicochemical parameters, one scale per parameter
    TimeSeries,
    /// Chemical concentrations on one shared mg/L scale
    Concentration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerShape {
    Circle,
    Square,
    TriangleUp,
    Diamond,
    TriangleDown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeriesStyle {
    /// Connected line; missing values break the line
    Line,
    /// Unconnected markers
    Markers(MarkerShape),
}

/// Vertical scale shared by one or more series
#[derive(Debug, Clone, PartialEq)]
pub struct ValueAxis {
    pub label: String,
    pub color: SeriesColor,
    pub min: f64,
    pub max: f64,
}

impl ValueAxis {
    /// Position of `value` on this axis; 0 at `min`, 1 at `max`
    ///
    /// Not clamped: readings outside the axis land outside 0..=1 and are
    /// clipped away when drawn.
    pub fn fraction(&self, value: f64) -> f64 {
        let span = self.max - self.min;
        if span <= 0.0 {
            return 0.0;
        }
        (value - self.min) / span
    }

    pub fn contains(&self, value: f64) -> bool {
        (self.min..=self.max).contains(&value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeriesPoint {
    pub timestamp: NaiveDateTime,
    pub value: Option<f64>,
}

/// One parameter's data as placed on the chart
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub parameter: Parameter,
    pub label: String,
    pub color: SeriesColor,
    pub style: SeriesStyle,
    /// Index into [`ChartArtifact::axes`]
    pub axis: usize,
    /// Normal layer, in timestamp order
    pub points: Vec<SeriesPoint>,
    /// Values carrying a `<`/`>` flag, drawn with an outline on top
    pub highlighted: Vec<SeriesPoint>,
}

impl Series {
    /// Runs of consecutive recorded values; a missing value ends a run
    pub fn segments(&self) -> Vec<Vec<(NaiveDateTime, f64)>> {
        let mut segments = Vec::new();
        let mut current = Vec::new();

        for point in &self.points {
            match point.value {
                Some(v) => current.push((point.timestamp, v)),
                None if !current.is_empty() => segments.push(std::mem::take(&mut current)),
                None => {}
            }
        }
        if !current.is_empty() {
            segments.push(current);
        }
        segments
    }

    /// Timestamps of the normal layer, in plotted order
    pub fn timestamps(&self) -> Vec<NaiveDateTime> {
        self.points.iter().map(|p| p.timestamp).collect()
    }
}

/// Rendered chart description
///
/// Holds everything needed to draw the chart; see `to_svg`, `to_rgb` and
/// `save_png` for turning it into an image.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartArtifact {
    pub kind: ChartKind,
    pub title: Option<String>,
    pub time_range: (NaiveDateTime, NaiveDateTime),
    pub axes: Vec<ValueAxis>,
    pub series: Vec<Series>,
    pub caption: Option<String>,
}

impl ChartArtifact {
    /// Legend entries in drawing order
    pub fn legend(&self) -> Vec<&str> {
        self.series.iter().map(|s| s.label.as_str()).collect()
    }

    pub fn series_for(&self, parameter: Parameter) -> Option<&Series> {
        self.series.iter().find(|s| s.parameter == parameter)
    }

    pub fn has_flagged_values(&self) -> bool {
        self.series.iter().any(|s| !s.highlighted.is_empty())
    }
}

/// Per-parameter values pulled from time-ordered measurements
pub(crate) struct Trace {
    /// One entry per measurement, `None` where nothing was recorded
    pub all: Vec<SeriesPoint>,
    /// Recorded values without a flag
    pub normal: Vec<SeriesPoint>,
    /// Recorded values with a `<`/`>` flag
    pub flagged: Vec<SeriesPoint>,
}

impl Trace {
    pub fn extract(measurements: &[&Measurement], parameter: Parameter) -> Self {
        let mut trace = Trace {
            all: Vec::with_capacity(measurements.len()),
            normal: Vec::new(),
            flagged: Vec::new(),
        };

        for m in measurements {
            let value = m.value(parameter);
            let point = SeriesPoint {
                timestamp: m.timestamp(),
                value,
            };
            trace.all.push(point);

            if value.is_some() {
                if m.flag(parameter).is_some() {
                    trace.flagged.push(point);
                } else {
                    trace.normal.push(point);
                }
            }
        }
        trace
    }

    pub fn has_values(&self) -> bool {
        !self.normal.is_empty() || !self.flagged.is_empty()
    }
}

/// Cut a polyline to the horizontal band `0 <= y <= 1`
///
/// Parts outside the band are dropped; where the line crosses an edge a point
/// is interpolated on that edge, so each returned run ends at the boundary.
pub(crate) fn clip_to_unit_band(points: &[(f64, f64)]) -> Vec<Vec<(f64, f64)>> {
    let inside = |y: f64| (0.0..=1.0).contains(&y);
    let edge_toward = |y: f64| if y > 1.0 { 1.0 } else { 0.0 };
    let crossing = |a: (f64, f64), b: (f64, f64), edge: f64| {
        (a.0 + (b.0 - a.0) * (edge - a.1) / (b.1 - a.1), edge)
    };

    let mut runs = Vec::new();
    let mut current = Vec::new();
    let mut prev: Option<(f64, f64)> = None;

    for &p in points {
        if let Some(q) = prev {
            match (inside(q.1), inside(p.1)) {
                // leaving the band
                (true, false) => {
                    current.push(crossing(q, p, edge_toward(p.1)));
                    runs.push(std::mem::take(&mut current));
                }
                // entering the band
                (false, true) => current.push(crossing(q, p, edge_toward(q.1))),
                // jumping over it from one side to the other
                (false, false) if edge_toward(q.1) != edge_toward(p.1) => runs.push(vec![
                    crossing(q, p, edge_toward(q.1)),
                    crossing(q, p, edge_toward(p.1)),
                ]),
                _ => {}
            }
        }
        if inside(p.1) {
            current.push(p);
        }
        prev = Some(p);
    }
    if !current.is_empty() {
        runs.push(current);
    }
    runs
}

/// Stable sort by timestamp
pub(crate) fn sort_by_timestamp(measurements: &[Measurement]) -> Vec<&Measurement> {
    let mut sorted: Vec<&Measurement> = measurements.iter().collect();
    sorted.sort_by_key(|m| m.timestamp());
    sorted
}

/// First and last timestamp, widened by a day on each side when they coincide
pub(crate) fn time_range(sorted: &[&Measurement]) -> Option<(NaiveDateTime, NaiveDateTime)> {
    let first = sorted.first()?.timestamp();
    let last = sorted.last()?.timestamp();
    if first == last {
        Some((first - Duration::days(1), last + Duration::days(1)))
    } else {
        Some((first, last))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn day(d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_segments_split_on_gaps() {
        let series = Series {
            parameter: Parameter::Ph,
            label: "pH".to_string(),
            color: SeriesColor(0, 0, 0),
            style: SeriesStyle::Line,
            axis: 0,
            points: vec![
                SeriesPoint { timestamp: day(1), value: Some(7.0) },
                SeriesPoint { timestamp: day(2), value: Some(7.1) },
                SeriesPoint { timestamp: day(3), value: None },
                SeriesPoint { timestamp: day(4), value: Some(7.3) },
                SeriesPoint { timestamp: day(5), value: None },
            ],
            highlighted: Vec::new(),
        };

        let segments = series.segments();
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0], vec![(day(1), 7.0), (day(2), 7.1)]);
        assert_eq!(segments[1], vec![(day(4), 7.3)]);
    }

    #[test]
    fn test_axis_fraction_is_unclamped() {
        let axis = ValueAxis {
            label: "pH".to_string(),
            color: SeriesColor(0, 0, 0),
            min: 5.0,
            max: 9.0,
        };
        assert_eq!(axis.fraction(7.0), 0.5);
        assert_eq!(axis.fraction(9.0), 1.0);
        // off-range readings do not collapse onto the edges
        assert!(axis.fraction(10.5) > 1.0);
        assert!(axis.fraction(1.0) < 0.0);
        assert!(axis.contains(9.0));
        assert!(!axis.contains(10.5));
    }

    #[test]
    fn test_clip_keeps_in_band_line_whole() {
        let line = vec![(0.0, 0.2), (1.0, 0.5), (2.0, 0.9)];
        assert_eq!(clip_to_unit_band(&line), vec![line]);
    }

    #[test]
    fn test_clip_cuts_line_at_upper_edge() {
        // pH 7, 10.5, 7 on a 5..9 axis
        let line = vec![(0.0, 0.5), (1.0, 1.375), (2.0, 0.5)];
        let runs = clip_to_unit_band(&line);

        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0][0], (0.0, 0.5));
        let exit = runs[0][1];
        assert_eq!(exit.1, 1.0);
        assert!((exit.0 - 4.0 / 7.0).abs() < 1e-9);
        let entry = runs[1][0];
        assert_eq!(entry.1, 1.0);
        assert!((entry.0 - (2.0 - 4.0 / 7.0)).abs() < 1e-9);
        assert_eq!(runs[1][1], (2.0, 0.5));
        assert!(runs.iter().flatten().all(|&(_, y)| y <= 1.0));
    }

    #[test]
    fn test_clip_drops_points_outside_band() {
        assert!(clip_to_unit_band(&[(0.0, 1.5), (1.0, 2.0)]).is_empty());

        let runs = clip_to_unit_band(&[(0.0, -1.0), (2.0, 3.0)]);
        assert_eq!(runs, vec![vec![(0.5, 0.0), (1.0, 1.0)]]);
    }

    #[test]
    fn test_time_range_pads_single_timestamp() {
        let m = Measurement::new("P1", day(10));
        let sorted = vec![&m];
        assert_eq!(time_range(&sorted), Some((day(9), day(11))));
        assert_eq!(time_range(&[]), None);
    }
}
