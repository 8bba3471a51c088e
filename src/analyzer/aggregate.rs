use super::summary;
use crate::matcher::match_locations;
use crate::model::{AnalyzeError, Cell, DEMAND_COL, LOCATION_COL, LocationSummary, Table, YEAR_COL};
use crate::normalizer::{detect_price_cols, parse_price};
use crate::query::{self, QueryIntent};
use crate::utils::{round2, title_case};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Everything an analyze call produces: per-location summaries, the merged
/// per-year chart series and the flat table rows.
#[derive(Debug)]
pub struct Analysis {
    pub summaries: Vec<LocationSummary>,
    pub chart_data: Vec<Map<String, Value>>,
    pub table_data: Vec<Map<String, Value>>,
}

/// Resolves a free-text query against the dataset.
///
/// Validates the query, derives intent and window, matches locations, and per
/// location filters, windows, sorts and summarizes its rows while merging
/// demand and average price into a single year-keyed chart map shared across
/// all matched locations.
pub fn run_analysis(table: &Table, raw_query: &str) -> Result<Analysis, AnalyzeError> {
    let query = raw_query.to_lowercase().trim().to_string();
    if query.is_empty() {
        return Err(AnalyzeError::MissingQuery);
    }

    let locations = table.distinct_locations();
    let price_cols = detect_price_cols(&table.columns);
    let last_n = query::extract_window(&query);
    let intent = query::classify(&query);

    let matched = match_locations(&query, &locations);
    if matched.is_empty() {
        return Err(AnalyzeError::NoMatch(query));
    }

    let mut summaries = Vec::new();
    let mut table_data = Vec::new();
    // One record per distinct year across every matched location. A location
    // without data for some year simply contributes no keys to that record.
    let mut year_map: BTreeMap<i64, Map<String, Value>> = BTreeMap::new();

    for location in &matched {
        let mut rows: Vec<&Vec<Cell>> = table
            .rows
            .iter()
            .filter(|row| table.location_of(row) == Some(location.as_str()))
            .collect();

        if let Some(n) = last_n {
            apply_window(table, &mut rows, n);
        }
        sort_rows_by_year(table, &mut rows);

        let display = title_case(location);
        summaries.push(LocationSummary {
            location: display.clone(),
            text: summary::generate(table, &rows, &price_cols, location, last_n),
        });

        merge_into_chart(table, &rows, &price_cols, &display, intent, &mut year_map);
        append_table_rows(table, &rows, &price_cols, intent, &mut table_data);
    }

    Ok(Analysis {
        summaries,
        chart_data: year_map.into_values().collect(),
        table_data,
    })
}

/// Year-ascending order, rows without a year last.
pub(crate) fn sort_rows_by_year(table: &Table, rows: &mut [&Vec<Cell>]) {
    rows.sort_by_key(|row| match table.year_of(row) {
        Some(year) => (false, year),
        None => (true, 0),
    });
}

/// Keeps rows newer than `max year - last_n`. Rows without a year are
/// dropped; a slice with no years at all is left as-is.
pub(crate) fn apply_window(table: &Table, rows: &mut Vec<&Vec<Cell>>, last_n: i64) {
    if let Some(max_year) = rows.iter().filter_map(|row| table.year_of(row)).max() {
        rows.retain(|row| {
            table
                .year_of(row)
                .is_some_and(|year| year > max_year - last_n)
        });
    }
}

#[derive(Default)]
struct YearGroup {
    demand: f64,
    row_means: Vec<f64>,
}

fn merge_into_chart(
    table: &Table,
    rows: &[&Vec<Cell>],
    price_cols: &[String],
    display: &str,
    intent: QueryIntent,
    year_map: &mut BTreeMap<i64, Map<String, Value>>,
) {
    let mut years: BTreeMap<i64, YearGroup> = BTreeMap::new();
    for row in rows {
        let Some(year) = table.year_of(row) else {
            continue;
        };
        let group = years.entry(year).or_default();
        group.demand += table.demand_of(row).unwrap_or(0.0);
        if let Some(mean) = row_price_mean(table, row, price_cols) {
            group.row_means.push(mean);
        }
    }

    for (year, group) in years {
        let record = year_map.entry(year).or_insert_with(|| {
            let mut record = Map::new();
            record.insert("year".to_string(), Value::from(year));
            record
        });

        if intent.wants_demand() {
            record.insert(display.to_string(), Value::from(group.demand.trunc() as i64));
        }
        if intent.wants_price() && !group.row_means.is_empty() {
            let avg = group.row_means.iter().sum::<f64>() / group.row_means.len() as f64;
            record.insert(format!("{display}_price"), Value::from(round2(avg)));
        }
    }
}

/// Mean across the price columns of one row's normalized prices. The chart
/// value for a year is the mean of these per-row means, not a flat mean over
/// every cell.
fn row_price_mean(table: &Table, row: &[Cell], price_cols: &[String]) -> Option<f64> {
    let values: Vec<f64> = price_cols
        .iter()
        .filter_map(|col| table.col_index(col))
        .filter_map(|idx| row.get(idx).and_then(parse_price))
        .collect();
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Raw per-row records; the column set depends on the intent.
fn append_table_rows(
    table: &Table,
    rows: &[&Vec<Cell>],
    price_cols: &[String],
    intent: QueryIntent,
    table_data: &mut Vec<Map<String, Value>>,
) {
    let mut cols: Vec<&str> = vec![LOCATION_COL, YEAR_COL];
    if intent.wants_demand() {
        cols.push(DEMAND_COL);
    }
    if intent.wants_price() {
        cols.extend(price_cols.iter().map(String::as_str));
    }

    for row in rows {
        let mut record = Map::new();
        for col in &cols {
            let value = table
                .col_index(col)
                .and_then(|idx| row.get(idx))
                .map_or(Value::Null, Cell::to_json);
            record.insert((*col).to_string(), value);
        }
        table_data.push(record);
    }
}
