use calamine::{open_workbook_auto, Data, Range, Reader};
use chrono::NaiveTime;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::domain::{Measurement, MeasurementMetadata, MeasurementPoint, PointMetadata};
use crate::parsers::{parse_coordinates, parse_numeric};
use crate::providers::cells::{cell_text, cell_value, parse_date, parse_time};
use crate::providers::layout::{
    registry, DATE_COLUMN, MEASUREMENTS_START_ROW, METADATA_COLUMNS, PARAMETER_COLUMNS,
    REGISTRY_SHEET, TIME_COLUMN,
};

/// Structural problems with the source workbook
///
/// Bad cells and undated rows are absorbed during parsing; these errors mean
/// the file does not follow the expected layout at all.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Failed to open workbook: {0}")]
    WorkbookOpen(String),

    #[error("Sheet not found: {0}")]
    SheetNotFound(String),

    #[error("Failed to read sheet {sheet}: {msg}")]
    SheetRead { sheet: String, msg: String },

    #[error("Missing column '{column}' in sheet {sheet}")]
    MissingColumn { sheet: String, column: String },
}

/// Read access to measurement points and their samples
pub trait DataProvider {
    /// Every point in the registry, in sheet order
    fn list_points(&mut self) -> Result<Vec<MeasurementPoint>, ProviderError>;

    /// Samples of one point; an unknown id yields an empty list
    fn list_measurements(&mut self, point_id: &str) -> Result<Vec<Measurement>, ProviderError>;
}

/// Anything that can hand out worksheet ranges by sheet name
pub trait SheetSource {
    fn worksheet(&self, name: &str) -> Result<Range<Data>, ProviderError>;
}

/// Workbook on disk (xlsx, xlsm, xls, ods); reopened for every sheet read
#[derive(Debug, Clone)]
pub struct WorkbookFile {
    path: PathBuf,
}

impl WorkbookFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SheetSource for WorkbookFile {
    fn worksheet(&self, name: &str) -> Result<Range<Data>, ProviderError> {
        // Synchronous file read; async callers should use spawn_blocking()
        let mut workbook = open_workbook_auto(&self.path)
            .map_err(|e| ProviderError::WorkbookOpen(e.to_string()))?;

        if !workbook.sheet_names().iter().any(|n| n == name) {
            return Err(ProviderError::SheetNotFound(name.to_string()));
        }

        workbook
            .worksheet_range(name)
            .map_err(|e| ProviderError::SheetRead {
                sheet: name.to_string(),
                msg: e.to_string(),
            })
    }
}

/// Sheets held in memory, mainly for tests and generated data
#[derive(Debug, Clone, Default)]
pub struct InMemoryWorkbook {
    sheets: HashMap<String, Range<Data>>,
}

impl InMemoryWorkbook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sheet(mut self, name: impl Into<String>, range: Range<Data>) -> Self {
        self.sheets.insert(name.into(), range);
        self
    }
}

impl SheetSource for InMemoryWorkbook {
    fn worksheet(&self, name: &str) -> Result<Range<Data>, ProviderError> {
        self.sheets
            .get(name)
            .cloned()
            .ok_or_else(|| ProviderError::SheetNotFound(name.to_string()))
    }
}

/// Provider for the water quality workbook layout
///
/// The `Punkty` sheet lists every point; each point's samples live on a
/// sheet named exactly like the point. The registry is read once per
/// provider, point sheets are re-read on every request.
pub struct ExcelProvider<S: SheetSource = WorkbookFile> {
    source: S,
    points: Option<Vec<MeasurementPoint>>,
}

impl ExcelProvider<WorkbookFile> {
    pub fn new(workbook_path: impl Into<PathBuf>) -> Self {
        Self::from_source(WorkbookFile::new(workbook_path))
    }
}

impl<S: SheetSource> ExcelProvider<S> {
    pub fn from_source(source: S) -> Self {
        Self {
            source,
            points: None,
        }
    }

    /// Registry entry for `point_id`, if any
    pub fn find_point(&mut self, point_id: &str) -> Result<Option<MeasurementPoint>, ProviderError> {
        Ok(self
            .registry()?
            .iter()
            .find(|p| p.id == point_id)
            .cloned())
    }

    fn registry(&mut self) -> Result<&[MeasurementPoint], ProviderError> {
        if self.points.is_none() {
            info!("Loading point registry from sheet: {}", REGISTRY_SHEET);
            let range = self.source.worksheet(REGISTRY_SHEET)?;
            let points = parse_registry(&range)?;
            info!("Loaded {} measurement points", points.len());
            self.points = Some(points);
        }
        Ok(self.points.as_deref().unwrap_or_default())
    }
}

impl<S: SheetSource> DataProvider for ExcelProvider<S> {
    fn list_points(&mut self) -> Result<Vec<MeasurementPoint>, ProviderError> {
        Ok(self.registry()?.to_vec())
    }

    fn list_measurements(&mut self, point_id: &str) -> Result<Vec<Measurement>, ProviderError> {
        let Some(point) = self.find_point(point_id)? else {
            debug!("Unknown point id {}, no measurements", point_id);
            return Ok(Vec::new());
        };

        let range = self.source.worksheet(&point.name)?;
        let measurements = parse_measurement_sheet(&range, &point.id);

        info!(
            "Parsed {} measurements from sheet {}",
            measurements.len(),
            point.name
        );
        Ok(measurements)
    }
}

/// Parse the registry sheet into points
///
/// Row 0 holds the column headers. Rows without a point name are skipped.
/// A repeated id replaces the earlier point in place.
pub fn parse_registry(range: &Range<Data>) -> Result<Vec<MeasurementPoint>, ProviderError> {
    let mut rows = range.rows();
    let Some(header_row) = rows.next() else {
        debug!("Registry sheet is empty");
        return Ok(Vec::new());
    };

    // Columns are located by header text, not position
    let headers: Vec<String> = header_row.iter().map(cell_text).collect();
    let column = |name: &str| -> Result<usize, ProviderError> {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| ProviderError::MissingColumn {
                sheet: REGISTRY_SHEET.to_string(),
                column: name.to_string(),
            })
    };

    let code_col = column(registry::CODE)?;
    let coords_col = column(registry::COORDINATES)?;
    let river_col = column(registry::RIVER)?;
    let jcwp_col = column(registry::JCWP)?;
    let catchment_col = column(registry::CATCHMENT)?;
    let rzgw_col = column(registry::RZGW)?;
    let name_col = column(registry::NAME)?;
    let location_col = column(registry::LOCATION)?;
    let surroundings_col = column(registry::SURROUNDINGS)?;
    let investigator_col = column(registry::INVESTIGATOR)?;
    let contact_col = column(registry::CONTACT)?;

    // Unknown headers are carried through as extra metadata
    let extra_cols: Vec<(usize, &String)> = headers
        .iter()
        .enumerate()
        .filter(|(_, h)| !h.is_empty() && !registry::ALL.contains(&h.as_str()))
        .collect();

    let mut points: Vec<MeasurementPoint> = Vec::new();
    let mut index_by_id: HashMap<String, usize> = HashMap::new();

    for row in rows {
        let text = |col: usize| row.get(col).map(cell_text).unwrap_or_default();

        // The name is the sheet key, so nameless rows are useless
        let name = text(name_col);
        if name.is_empty() {
            continue;
        }

        // Points without a code are identified by name
        let code = text(code_col);
        let id = if code.is_empty() { name.clone() } else { code };

        let coords = row.get(coords_col).and_then(parse_coordinates);

        let extra = extra_cols
            .iter()
            .filter_map(|(col, header)| {
                let value = text(*col);
                (!value.is_empty()).then(|| ((*header).clone(), value))
            })
            .collect();

        let point = MeasurementPoint::new(id, name).with_metadata(PointMetadata {
            river_name: text(river_col),
            jcwp_code: text(jcwp_col),
            catchment_authority: text(catchment_col),
            rzgw: text(rzgw_col),
            location_description: text(location_col),
            surroundings: text(surroundings_col),
            investigator: text(investigator_col),
            contact: text(contact_col),
            latitude: coords.map(|c| c.latitude),
            longitude: coords.map(|c| c.longitude),
            extra,
        });

        // Later duplicates replace the earlier point in place
        match index_by_id.get(&point.id) {
            Some(&idx) => {
                warn!(
                    "Duplicate point id {} in registry, keeping the later row ({})",
                    point.id, point.name
                );
                points[idx] = point;
            }
            None => {
                index_by_id.insert(point.id.clone(), points.len());
                points.push(point);
            }
        }
    }

    Ok(points)
}

static EMPTY_CELL: Data = Data::Empty;

/// Cell at an absolute sheet position, `Data::Empty` outside the used range
fn cell_at(range: &Range<Data>, row: u32, col: u32) -> &Data {
    range.get_value((row, col)).unwrap_or(&EMPTY_CELL)
}

fn is_blank(cell: &Data) -> bool {
    match cell {
        Data::Empty => true,
        Data::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

/// Parse a point's data sheet
///
/// Rows above [`MEASUREMENTS_START_ROW`] are the form header. Rows with an
/// empty date cell are padding; rows whose date cannot be read are dropped.
pub fn parse_measurement_sheet(range: &Range<Data>, point_id: &str) -> Vec<Measurement> {
    let (Some((start_row, _)), Some((end_row, _))) = (range.start(), range.end()) else {
        return Vec::new();
    };

    (start_row.max(MEASUREMENTS_START_ROW)..=end_row)
        .filter(|&row| !is_blank(cell_at(range, row, DATE_COLUMN)))
        .filter_map(|row| parse_measurement_row(range, row, point_id))
        .collect()
}

fn parse_measurement_row(range: &Range<Data>, row: u32, point_id: &str) -> Option<Measurement> {
    let date = parse_date(cell_at(range, row, DATE_COLUMN))?;
    let time = parse_time(cell_at(range, row, TIME_COLUMN)).unwrap_or(NaiveTime::MIN);

    let mut measurement = Measurement::new(point_id, date.and_time(time));

    for column in PARAMETER_COLUMNS {
        let reading = parse_numeric(cell_at(range, row, column.column));
        measurement.record(column.parameter, reading, column.unit);
    }

    let mut metadata = MeasurementMetadata::new();
    for (field, col) in METADATA_COLUMNS {
        if let Some(value) = cell_value(cell_at(range, row, col)) {
            metadata.insert(field, value);
        }
    }

    Some(measurement.with_metadata(metadata))
}
