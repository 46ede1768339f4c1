// Workbook ingestion
//
// This module turns the water quality workbook into domain types:
// - Punkty sheet: one row per measurement point (registry)
// - One sheet per point, named after the point: one row per sample

pub mod cells;
pub mod excel_provider;
pub mod layout;

pub use excel_provider::{
    parse_measurement_sheet, parse_registry, DataProvider, ExcelProvider, InMemoryWorkbook,
    ProviderError, SheetSource, WorkbookFile,
};
