use crate::model::{Cell, DEMAND_COL, LOCATION_COL, LoadError, Table, YEAR_COL};
use calamine::{Data, Reader, open_workbook_auto_from_rs};
use std::io::Cursor;

/// Parses the first sheet of a workbook and normalizes it into a [`Table`].
pub fn load_from_bytes(bytes: &[u8]) -> Result<Table, LoadError> {
    let mut table = parse_workbook(bytes)?;
    normalize_table(&mut table);
    Ok(table)
}

fn parse_workbook(bytes: &[u8]) -> Result<Table, LoadError> {
    let cursor = Cursor::new(bytes.to_vec());
    let mut workbook =
        open_workbook_auto_from_rs(cursor).map_err(|e| LoadError::Workbook(e.to_string()))?;

    let sheet_names = workbook.sheet_names().to_vec();
    let first_sheet = sheet_names.first().ok_or(LoadError::NoSheets)?;
    let range = workbook
        .worksheet_range(first_sheet)
        .map_err(|e| LoadError::Workbook(e.to_string()))?;

    let mut rows = range.rows();
    let columns: Vec<String> = match rows.next() {
        Some(header) => header.iter().map(header_name).collect(),
        None => Vec::new(),
    };

    let width = columns.len();
    let rows = rows
        .map(|row| {
            (0..width)
                .map(|i| row.get(i).map_or(Cell::Empty, cell_from))
                .collect()
        })
        .collect();

    Ok(Table { columns, rows })
}

fn header_name(data: &Data) -> String {
    match data {
        Data::String(s) => s.trim().to_string(),
        Data::Empty => String::new(),
        other => other.to_string(),
    }
}

fn cell_from(data: &Data) -> Cell {
    match data {
        Data::Empty | Data::Error(_) => Cell::Empty,
        Data::String(s) => Cell::Text(s.clone()),
        Data::Float(f) => Cell::Number(*f),
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Bool(b) => Cell::Number(if *b { 1.0 } else { 0.0 }),
        Data::DateTime(dt) => Cell::Number(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
    }
}

/// Normalizes the table in place: lower-cased underscore-separated column
/// names, canonical `final_location` strings, integer `year` values, and a
/// derived `demand` column when none is present.
pub fn normalize_table(table: &mut Table) {
    for col in &mut table.columns {
        *col = normalize_column_name(col);
    }

    if let Some(idx) = table.col_index(LOCATION_COL) {
        for row in &mut table.rows {
            if let Some(cell) = row.get_mut(idx) {
                *cell = normalize_location(cell);
            }
        }
    }

    if let Some(idx) = table.col_index(YEAR_COL) {
        for row in &mut table.rows {
            if let Some(cell) = row.get_mut(idx) {
                *cell = coerce_year(cell);
            }
        }
    }

    if table.col_index(DEMAND_COL).is_none() {
        derive_demand(table);
    }
}

fn normalize_column_name(name: &str) -> String {
    name.trim().to_lowercase().replace([' ', '-'], "_")
}

fn normalize_location(cell: &Cell) -> Cell {
    match cell {
        Cell::Empty => Cell::Empty,
        Cell::Number(n) => Cell::Text(n.to_string()),
        Cell::Text(s) => Cell::Text(s.to_lowercase().trim().to_string()),
    }
}

/// Non-numeric years become absent, never an error.
fn coerce_year(cell: &Cell) -> Cell {
    match cell.to_number() {
        Some(n) => Cell::Number(n.trunc()),
        None => Cell::Empty,
    }
}

/// Demand is the row-wise sum over every "sold"+"igr" column, or a constant
/// zero when the dataset has no such columns.
fn derive_demand(table: &mut Table) {
    let sold_cols: Vec<usize> = table
        .columns
        .iter()
        .enumerate()
        .filter(|(_, col)| col.contains("sold") && col.contains("igr"))
        .map(|(i, _)| i)
        .collect();

    table.columns.push(DEMAND_COL.to_string());
    for row in &mut table.rows {
        let total = sold_cols
            .iter()
            .filter_map(|&i| row.get(i).and_then(Cell::to_number))
            .sum::<f64>();
        row.push(Cell::Number(total));
    }
}
