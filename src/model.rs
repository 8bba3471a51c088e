// Core structs: Cell, Table, analysis payloads
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

pub const LOCATION_COL: &str = "final_location";
pub const YEAR_COL: &str = "year";
pub const DEMAND_COL: &str = "demand";

/// A single spreadsheet cell after loading. Anything unreadable is `Empty`,
/// never an error.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Number(f64),
    Text(String),
}

impl Cell {
    /// Numeric view of the cell. Numeric text is parsed, anything else is absent.
    pub fn to_number(&self) -> Option<f64> {
        match self {
            Cell::Empty => None,
            Cell::Number(n) => Some(*n),
            Cell::Text(s) => s.trim().parse().ok(),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s),
            _ => None,
        }
    }

    /// JSON rendering for table records. Integral numbers within f64's exact
    /// integer range serialize as integers.
    pub fn to_json(&self) -> Value {
        match self {
            Cell::Empty => Value::Null,
            Cell::Number(n) if n.fract() == 0.0 && n.abs() < 9_007_199_254_740_992.0 => {
                Value::from(*n as i64)
            }
            Cell::Number(n) => Value::from(*n),
            Cell::Text(s) => Value::from(s.clone()),
        }
    }
}

/// The normalized dataset: ordered column names plus row-major cells.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn col_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|col| col == name)
    }

    pub fn location_of<'r>(&self, row: &'r [Cell]) -> Option<&'r str> {
        let idx = self.col_index(LOCATION_COL)?;
        row.get(idx)?.as_text()
    }

    pub fn year_of(&self, row: &[Cell]) -> Option<i64> {
        let idx = self.col_index(YEAR_COL)?;
        row.get(idx)?.to_number().map(|n| n.trunc() as i64)
    }

    pub fn demand_of(&self, row: &[Cell]) -> Option<f64> {
        let idx = self.col_index(DEMAND_COL)?;
        row.get(idx)?.to_number()
    }

    /// Known locations in first-appearance order.
    pub fn distinct_locations(&self) -> Vec<String> {
        let Some(idx) = self.col_index(LOCATION_COL) else {
            return Vec::new();
        };
        let mut seen: Vec<String> = Vec::new();
        for row in &self.rows {
            if let Some(Cell::Text(loc)) = row.get(idx) {
                if !loc.is_empty() && !seen.contains(loc) {
                    seen.push(loc.clone());
                }
            }
        }
        seen
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LocationSummary {
    pub location: String,
    pub text: String,
}

/// Successful analyze payload: one summary per matched location, the merged
/// per-year chart series and the flat table rows.
#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub summary: Vec<LocationSummary>,
    #[serde(rename = "chartData")]
    pub chart_data: Vec<Map<String, Value>>,
    #[serde(rename = "tableData")]
    pub table_data: Vec<Map<String, Value>>,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read dataset: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse workbook: {0}")]
    Workbook(String),
    #[error("workbook has no sheets")]
    NoSheets,
}

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("No file provided.")]
    MissingFile,
    #[error("Invalid file format.")]
    InvalidFormat,
    #[error("Failed to process file.")]
    Parse(#[source] LoadError),
}

#[derive(Debug, Error)]
pub enum AnalyzeError {
    #[error("Missing query.")]
    MissingQuery,
    #[error("No data available.")]
    NoData,
    #[error("No matching location found for '{0}'.")]
    NoMatch(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distinct_locations_keep_first_appearance_order() {
        let table = Table {
            columns: vec![LOCATION_COL.to_string()],
            rows: vec![
                vec![Cell::Text("pune".into())],
                vec![Cell::Text("mumbai".into())],
                vec![Cell::Empty],
                vec![Cell::Text("pune".into())],
            ],
        };
        assert_eq!(table.distinct_locations(), vec!["pune", "mumbai"]);
    }

    #[test]
    fn cell_json_keeps_integral_numbers_as_integers() {
        assert_eq!(Cell::Number(2021.0).to_json(), serde_json::json!(2021));
        assert_eq!(Cell::Number(10.5).to_json(), serde_json::json!(10.5));
        assert_eq!(Cell::Empty.to_json(), Value::Null);
    }

    #[test]
    fn year_is_truncated_to_an_integer() {
        let table = Table {
            columns: vec![YEAR_COL.to_string()],
            rows: vec![],
        };
        assert_eq!(table.year_of(&[Cell::Number(2021.0)]), Some(2021));
        assert_eq!(table.year_of(&[Cell::Text("2021".into())]), Some(2021));
        assert_eq!(table.year_of(&[Cell::Text("soon".into())]), None);
        assert_eq!(table.year_of(&[Cell::Empty]), None);
    }
}
