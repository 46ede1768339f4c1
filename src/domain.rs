// Measurement model
//
// Normalized sampling-point and measurement types consumed by the chart renderer
// and produced by the workbook providers.

pub mod measurement;
pub mod point;

pub use measurement::{CellValue, Measurement, MeasurementMetadata, MetadataField, Parameter};
pub use point::{MeasurementPoint, PointMetadata};
