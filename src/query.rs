use regex::Regex;
use std::sync::LazyLock;

static WINDOW_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)last\s+(\d+)\s+years").unwrap());

/// What a query is asking for, decided from keyword patterns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryIntent {
    DemandTrends,
    PriceGrowth,
    Analysis,
}

impl QueryIntent {
    pub fn wants_demand(&self) -> bool {
        matches!(self, QueryIntent::DemandTrends | QueryIntent::Analysis)
    }

    pub fn wants_price(&self) -> bool {
        matches!(self, QueryIntent::PriceGrowth | QueryIntent::Analysis)
    }
}

/// Picks the intent: "compare" + "demand" beats "price growth", and anything
/// else is a full analysis covering both measures.
pub fn classify(query: &str) -> QueryIntent {
    if query.contains("compare") && query.contains("demand") {
        QueryIntent::DemandTrends
    } else if query.contains("price growth") {
        QueryIntent::PriceGrowth
    } else {
        QueryIntent::Analysis
    }
}

/// Extracts a "last N years" window. A window of zero means full history.
pub fn extract_window(query: &str) -> Option<i64> {
    let n = WINDOW_RE
        .captures(query)
        .and_then(|caps| caps[1].parse::<i64>().ok())?;
    (n > 0).then_some(n)
}
