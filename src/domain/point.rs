use serde::Serialize;
use std::collections::BTreeMap;

use crate::parsers::Coordinates;

/// A fixed sampling location listed in the registry sheet
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeasurementPoint {
    /// Registry code, or the point name when the code cell is empty
    pub id: String,
    /// Display name; also the name of the sheet holding this point's samples
    pub name: String,
    pub metadata: PointMetadata,
}

/// Descriptive registry attributes of a point
///
/// Every text field is trimmed; an empty registry cell becomes an empty string.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PointMetadata {
    pub river_name: String,
    /// Surface water body (JCWP) code
    pub jcwp_code: String,
    pub catchment_authority: String,
    /// Regional water management board (RZGW)
    pub rzgw: String,
    pub location_description: String,
    pub surroundings: String,
    pub investigator: String,
    pub contact: String,
    /// `None` when the coordinate cell could not be parsed
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Registry columns outside the known layout, keyed by header text
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, String>,
}

impl MeasurementPoint {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            metadata: PointMetadata::default(),
        }
    }

    pub fn with_metadata(mut self, metadata: PointMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn coordinates(&self) -> Option<Coordinates> {
        match (self.metadata.latitude, self.metadata.longitude) {
            (Some(latitude), Some(longitude)) => Some(Coordinates {
                latitude,
                longitude,
            }),
            _ => None,
        }
    }

    /// Label used by selection lists, e.g. `"Wisła@Most (P1)"`
    pub fn display_label(&self) -> String {
        format!("{} ({})", self.name, self.id)
    }
}
