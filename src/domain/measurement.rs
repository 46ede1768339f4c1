use chrono::{NaiveDateTime, NaiveTime};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

use crate::parsers::{NumericValue, Qualifier};

/// Physicochemical and chemical parameters recorded on the sampling sheets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Parameter {
    WaterTemperature,
    Transparency,
    DissolvedOxygen,
    Nitrates,
    Nitrites,
    Phosphates,
    Chlorides,
    Sulphates,
    #[serde(rename = "pH")]
    Ph,
    /// Second temperature reading taken during the home test
    WaterTemperatureHome,
    Conductivity,
}

impl Parameter {
    pub const ALL: [Parameter; 11] = [
        Parameter::WaterTemperature,
        Parameter::Transparency,
        Parameter::DissolvedOxygen,
        Parameter::Nitrates,
        Parameter::Nitrites,
        Parameter::Phosphates,
        Parameter::Chlorides,
        Parameter::Sulphates,
        Parameter::Ph,
        Parameter::WaterTemperatureHome,
        Parameter::Conductivity,
    ];

    /// Canonical parameter name used as the map key in serialized output
    pub fn name(self) -> &'static str {
        match self {
            Parameter::WaterTemperature => "water_temperature",
            Parameter::Transparency => "transparency",
            Parameter::DissolvedOxygen => "dissolved_oxygen",
            Parameter::Nitrates => "nitrates",
            Parameter::Nitrites => "nitrites",
            Parameter::Phosphates => "phosphates",
            Parameter::Chlorides => "chlorides",
            Parameter::Sulphates => "sulphates",
            Parameter::Ph => "pH",
            Parameter::WaterTemperatureHome => "water_temperature_home",
            Parameter::Conductivity => "conductivity",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.name() == name)
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Per-sample context columns carried through from the data sheet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MetadataField {
    SamplingLocation,
    DepthInfo,
    SampleVolumeL,
    WaterState,
    WaterGaugeState,
    PrecipitationMm,
    PrecipitationDescription,
    Anomalies,
    FieldTestTime,
    HomeTestDate,
    HomeTestTime,
    CalibrationDate,
    Remarks,
}

/// Raw cell content kept without interpretation
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    Text(String),
    Number(f64),
    Bool(bool),
    DateTime(NaiveDateTime),
    Time(NaiveTime),
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Text(s) => f.write_str(s),
            CellValue::Number(n) => write!(f, "{n}"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S")),
            CellValue::Time(t) => write!(f, "{}", t.format("%H:%M:%S")),
        }
    }
}

/// Sample context keyed by field; empty source cells are not stored
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct MeasurementMetadata(BTreeMap<MetadataField, CellValue>);

impl MeasurementMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: MetadataField, value: CellValue) {
        self.0.insert(field, value);
    }

    pub fn get(&self, field: MetadataField) -> Option<&CellValue> {
        self.0.get(&field)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&MetadataField, &CellValue)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// One sampling event at one point
///
/// `flags` and `units` only ever hold parameters that have a recorded value;
/// the recording methods keep the three maps consistent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Measurement {
    point_id: String,
    timestamp: NaiveDateTime,
    parameters: BTreeMap<Parameter, Option<f64>>,
    flags: BTreeMap<Parameter, Qualifier>,
    units: BTreeMap<Parameter, String>,
    metadata: MeasurementMetadata,
}

impl Measurement {
    pub fn new(point_id: impl Into<String>, timestamp: NaiveDateTime) -> Self {
        Self {
            point_id: point_id.into(),
            timestamp,
            parameters: BTreeMap::new(),
            flags: BTreeMap::new(),
            units: BTreeMap::new(),
            metadata: MeasurementMetadata::new(),
        }
    }

    /// Store a parsed reading; absent readings leave the measurement untouched
    pub fn record(&mut self, parameter: Parameter, reading: NumericValue, unit: &str) {
        if let NumericValue::Value { value, qualifier } = reading {
            self.parameters.insert(parameter, Some(value));
            self.units.insert(parameter, unit.to_string());
            match qualifier {
                Some(q) => {
                    self.flags.insert(parameter, q);
                }
                None => {
                    self.flags.remove(&parameter);
                }
            }
        }
    }

    /// Mark a parameter as present but without a reading
    pub fn record_missing(&mut self, parameter: Parameter) {
        self.parameters.insert(parameter, None);
        self.flags.remove(&parameter);
        self.units.remove(&parameter);
    }

    pub fn with_reading(mut self, parameter: Parameter, reading: NumericValue, unit: &str) -> Self {
        self.record(parameter, reading, unit);
        self
    }

    pub fn with_metadata(mut self, metadata: MeasurementMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn point_id(&self) -> &str {
        &self.point_id
    }

    pub fn timestamp(&self) -> NaiveDateTime {
        self.timestamp
    }

    pub fn value(&self, parameter: Parameter) -> Option<f64> {
        self.parameters.get(&parameter).copied().flatten()
    }

    pub fn flag(&self, parameter: Parameter) -> Option<Qualifier> {
        self.flags.get(&parameter).copied()
    }

    pub fn unit(&self, parameter: Parameter) -> Option<&str> {
        self.units.get(&parameter).map(String::as_str)
    }

    pub fn parameters(&self) -> &BTreeMap<Parameter, Option<f64>> {
        &self.parameters
    }

    pub fn flags(&self) -> &BTreeMap<Parameter, Qualifier> {
        &self.flags
    }

    pub fn units(&self) -> &BTreeMap<Parameter, String> {
        &self.units
    }

    pub fn metadata(&self) -> &MeasurementMetadata {
        &self.metadata
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 15)
            .unwrap()
            .and_hms_opt(10, 30, 0)
            .unwrap()
    }

    #[test]
    fn test_create_measurement_is_empty() {
        let m = Measurement::new("P001", ts());
        assert_eq!(m.point_id(), "P001");
        assert_eq!(m.timestamp(), ts());
        assert!(m.parameters().is_empty());
        assert!(m.flags().is_empty());
        assert!(m.units().is_empty());
        assert!(m.metadata().is_empty());
    }

    #[test]
    fn test_record_sets_value_unit_and_flag() {
        let m = Measurement::new("P001", ts())
            .with_reading(Parameter::WaterTemperature, NumericValue::plain(15.5), "°C")
            .with_reading(
                Parameter::Nitrates,
                NumericValue::qualified(0.05, Qualifier::Below),
                "mg/L",
            );

        assert_eq!(m.value(Parameter::WaterTemperature), Some(15.5));
        assert_eq!(m.unit(Parameter::WaterTemperature), Some("°C"));
        assert_eq!(m.flag(Parameter::WaterTemperature), None);
        assert_eq!(m.flag(Parameter::Nitrates), Some(Qualifier::Below));
    }

    #[test]
    fn test_absent_reading_is_not_recorded() {
        let m = Measurement::new("P001", ts()).with_reading(Parameter::Ph, NumericValue::Absent, "");
        assert!(!m.parameters().contains_key(&Parameter::Ph));
        assert!(m.units().is_empty());
    }

    #[test]
    fn test_record_missing_clears_flag_and_unit() {
        let mut m = Measurement::new("P001", ts()).with_reading(
            Parameter::Nitrites,
            NumericValue::qualified(0.01, Qualifier::Below),
            "mg/L",
        );
        m.record_missing(Parameter::Nitrites);

        assert_eq!(m.parameters().get(&Parameter::Nitrites), Some(&None));
        assert_eq!(m.value(Parameter::Nitrites), None);
        assert!(m.flags().is_empty());
        assert!(m.units().is_empty());
    }

    #[test]
    fn test_parameter_names() {
        assert_eq!(Parameter::Ph.name(), "pH");
        assert_eq!(Parameter::from_name("dissolved_oxygen"), Some(Parameter::DissolvedOxygen));
        assert_eq!(Parameter::from_name("turbidity"), None);
    }

    #[test]
    fn test_serialize_uses_canonical_names() {
        let m = Measurement::new("P001", ts())
            .with_reading(Parameter::Ph, NumericValue::plain(7.1), "")
            .with_reading(
                Parameter::Sulphates,
                NumericValue::qualified(250.0, Qualifier::Above),
                "mg/L",
            );
        let json = serde_json::to_value(&m).unwrap();
        assert_eq!(json["parameters"]["pH"], 7.1);
        assert_eq!(json["flags"]["sulphates"], ">");
        assert_eq!(json["units"]["pH"], "");
    }
}
