use super::aggregate::{apply_window, sort_rows_by_year};
use crate::model::{Cell, Table};
use crate::normalizer::parse_price;
use crate::utils::title_case;

/// Builds the one-paragraph trend summary for a single location's rows.
///
/// Rows are re-sorted and re-windowed here so the text stays consistent with
/// whatever filtering the caller already applied (windowing is idempotent:
/// the maximum year of a windowed slice is the maximum of the full slice).
pub fn generate(
    table: &Table,
    rows: &[&Vec<Cell>],
    price_cols: &[String],
    location: &str,
    last_n: Option<i64>,
) -> String {
    let mut rows: Vec<&Vec<Cell>> = rows.to_vec();
    sort_rows_by_year(table, &mut rows);
    if let Some(n) = last_n {
        apply_window(table, &mut rows, n);
    }

    let demand_vals: Vec<f64> = rows.iter().filter_map(|row| table.demand_of(row)).collect();

    // Column-major: all of one price column's values (rows in year order)
    // before the next column's.
    let mut price_vals: Vec<f64> = Vec::new();
    for col in price_cols {
        if let Some(idx) = table.col_index(col) {
            for row in &rows {
                if let Some(price) = row.get(idx).and_then(parse_price) {
                    price_vals.push(price);
                }
            }
        }
    }

    let demand_trend = match demand_vals.as_slice() {
        [] => "",
        [_] => "steady",
        [first, .., last] => {
            if last > first {
                "rising"
            } else if last < first {
                "falling"
            } else {
                "stable"
            }
        }
    };

    let price_trend = match (price_vals.first(), price_vals.last()) {
        (Some(&first), Some(&last)) if first != 0.0 => {
            let pct = (last - first) / first * 100.0;
            format!("{pct:.1}% average change over period")
        }
        // A zero baseline has no meaningful percent change; report it the
        // same way as an empty series.
        _ => "No price data available".to_string(),
    };

    let span = match last_n {
        Some(n) => n.to_string(),
        None => "all".to_string(),
    };

    format!(
        "{} has shown {} in prices, with demand {} over the past {} years.",
        title_case(location),
        price_trend,
        demand_trend,
        span
    )
}
