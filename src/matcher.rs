use difflib::get_close_matches;

/// Minimum sequence-similarity ratio for a fuzzy hit.
const SIMILARITY_THRESHOLD: f32 = 0.8;

/// Known locations mentioned in the query.
///
/// A location counts as mentioned when its exact string appears in the query,
/// or when the whole query is within similarity-ratio distance of the
/// location name itself. The fuzzy pass compares the full query against each
/// single candidate, so it only fires on queries that are essentially a
/// (misspelled) location name.
pub fn match_locations(query: &str, locations: &[String]) -> Vec<String> {
    locations
        .iter()
        .filter(|loc| query.contains(loc.as_str()) || fuzzy_match(query, loc))
        .cloned()
        .collect()
}

fn fuzzy_match(query: &str, location: &str) -> bool {
    !get_close_matches(query, vec![location], 1, SIMILARITY_THRESHOLD).is_empty()
}
