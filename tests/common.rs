#![allow(dead_code)]

use calamine::{Data, Range};
use water_quality_charts::providers::layout::{registry, MEASUREMENTS_START_ROW, REGISTRY_SHEET};
use water_quality_charts::providers::InMemoryWorkbook;

/// Registry sheet with the standard header row and the given rows
///
/// Each row is `(code, name, coordinates)`; other columns stay empty.
pub fn registry_sheet(rows: &[(&str, &str, &str)]) -> Range<Data> {
    let mut range = Range::new((0, 0), (rows.len() as u32, registry::ALL.len() as u32 - 1));

    for (col, header) in registry::ALL.iter().enumerate() {
        range.set_value((0, col as u32), Data::String(header.to_string()));
    }

    let column = |name: &str| registry::ALL.iter().position(|h| *h == name).unwrap() as u32;
    for (i, (code, name, coords)) in rows.iter().enumerate() {
        let row = i as u32 + 1;
        range.set_value((row, column(registry::CODE)), Data::String(code.to_string()));
        range.set_value((row, column(registry::NAME)), Data::String(name.to_string()));
        range.set_value(
            (row, column(registry::COORDINATES)),
            Data::String(coords.to_string()),
        );
    }
    range
}

/// Point sheet with an 8-row form header and one data row per entry
///
/// Each entry lists `(column, cell)` pairs for that row.
pub fn point_sheet(rows: &[Vec<(u32, Data)>]) -> Range<Data> {
    let last_row = MEASUREMENTS_START_ROW + rows.len().max(1) as u32 - 1;
    let mut range = Range::new((0, 0), (last_row, 25));
    range.set_value((0, 0), Data::String("Karta pomiarowa".to_string()));

    for (i, cells) in rows.iter().enumerate() {
        for (col, cell) in cells {
            range.set_value((MEASUREMENTS_START_ROW + i as u32, *col), cell.clone());
        }
    }
    range
}

pub fn text(s: &str) -> Data {
    Data::String(s.to_string())
}

/// Workbook with the `P1` / `Wisła@Most` point and the given data sheet
pub fn single_point_workbook(data: Range<Data>) -> InMemoryWorkbook {
    InMemoryWorkbook::new()
        .with_sheet(
            REGISTRY_SHEET,
            registry_sheet(&[("P1", "Wisła@Most", "52,10 21,05")]),
        )
        .with_sheet("Wisła@Most", data)
}
