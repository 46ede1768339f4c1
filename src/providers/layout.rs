/// Fixed workbook layout
///
/// ```text
/// Punkty sheet:    row 0 = column headers, one point per following row
/// Point sheets:    rows 0-7 = form header (ignored)
///                  row 8.. = one sample per row, no header, positional columns
/// ```
///
/// Column indexes are zero-based and absolute (column A = 0).
use crate::domain::{MetadataField, Parameter};

/// Name of the sheet listing every measurement point
pub const REGISTRY_SHEET: &str = "Punkty";

/// Physical rows above the first sample row on a point sheet
pub const MEASUREMENTS_START_ROW: u32 = 8;

pub const DATE_COLUMN: u32 = 0;
pub const TIME_COLUMN: u32 = 1;

/// Registry column headers
pub mod registry {
    pub const CODE: &str = "Kod punktu";
    pub const COORDINATES: &str = "Współrzędne punktu";
    pub const RIVER: &str = "Nazwa rzeki";
    pub const JCWP: &str = "Kod JCWP";
    pub const CATCHMENT: &str = "Zarząd zlewni";
    pub const RZGW: &str = "RZGW";
    pub const NAME: &str = "Nazwa punktu";
    pub const LOCATION: &str = "Opis lokalizacji";
    pub const SURROUNDINGS: &str = "Otoczenie";
    pub const INVESTIGATOR: &str = "Osoba badająca";
    pub const CONTACT: &str = "Kontakt";

    pub const ALL: [&str; 11] = [
        CODE,
        COORDINATES,
        RIVER,
        JCWP,
        CATCHMENT,
        RZGW,
        NAME,
        LOCATION,
        SURROUNDINGS,
        INVESTIGATOR,
        CONTACT,
    ];
}

/// Where a parameter lives on a point sheet and which unit it is reported in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParameterColumn {
    pub parameter: Parameter,
    pub column: u32,
    pub unit: &'static str,
}

pub const PARAMETER_COLUMNS: [ParameterColumn; 11] = [
    ParameterColumn { parameter: Parameter::WaterTemperature, column: 11, unit: "°C" },
    ParameterColumn { parameter: Parameter::Transparency, column: 12, unit: "cm" },
    ParameterColumn { parameter: Parameter::DissolvedOxygen, column: 13, unit: "mg/L" },
    ParameterColumn { parameter: Parameter::Nitrates, column: 16, unit: "mg/L" },
    ParameterColumn { parameter: Parameter::Nitrites, column: 17, unit: "mg/L" },
    ParameterColumn { parameter: Parameter::Phosphates, column: 18, unit: "mg/L" },
    ParameterColumn { parameter: Parameter::Chlorides, column: 19, unit: "mg/L" },
    ParameterColumn { parameter: Parameter::Sulphates, column: 20, unit: "mg/L" },
    ParameterColumn { parameter: Parameter::Ph, column: 21, unit: "" },
    ParameterColumn { parameter: Parameter::WaterTemperatureHome, column: 22, unit: "°C" },
    ParameterColumn { parameter: Parameter::Conductivity, column: 23, unit: "µS/cm" },
];

pub const METADATA_COLUMNS: [(MetadataField, u32); 13] = [
    (MetadataField::SamplingLocation, 2),
    (MetadataField::DepthInfo, 3),
    (MetadataField::SampleVolumeL, 4),
    (MetadataField::WaterState, 5),
    (MetadataField::WaterGaugeState, 6),
    (MetadataField::PrecipitationMm, 7),
    (MetadataField::PrecipitationDescription, 8),
    (MetadataField::Anomalies, 9),
    (MetadataField::FieldTestTime, 10),
    (MetadataField::HomeTestDate, 14),
    (MetadataField::HomeTestTime, 15),
    (MetadataField::CalibrationDate, 24),
    (MetadataField::Remarks, 25),
];

/// Layout entry for a parameter
pub fn parameter_column(parameter: Parameter) -> &'static ParameterColumn {
    let index = match parameter {
        Parameter::WaterTemperature => 0,
        Parameter::Transparency => 1,
        Parameter::DissolvedOxygen => 2,
        Parameter::Nitrates => 3,
        Parameter::Nitrites => 4,
        Parameter::Phosphates => 5,
        Parameter::Chlorides => 6,
        Parameter::Sulphates => 7,
        Parameter::Ph => 8,
        Parameter::WaterTemperatureHome => 9,
        Parameter::Conductivity => 10,
    };
    &PARAMETER_COLUMNS[index]
}

pub fn unit_for(parameter: Parameter) -> &'static str {
    parameter_column(parameter).unit
}
