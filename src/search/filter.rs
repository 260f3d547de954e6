use crate::models::{Property, SearchFilters, SortOrder};
use std::cmp::Reverse;

/// Filter and sort listings for the results page
pub fn apply_filters<'a>(
    properties: &'a [Property],
    query: &str,
    filters: &SearchFilters,
) -> Vec<&'a Property> {
    let terms: Vec<String> = query
        .split_whitespace()
        .map(str::to_lowercase)
        .collect();

    let mut results: Vec<(&Property, usize)> = properties
        .iter()
        .filter(|p| filters.price_range.contains(p.price))
        .filter(|p| filters.bhk.is_empty() || filters.bhk.contains(&p.bhk))
        .filter(|p| {
            filters.localities.is_empty()
                || filters
                    .localities
                    .iter()
                    .any(|l| l.eq_ignore_ascii_case(&p.location.locality))
        })
        .filter(|p| {
            filters.property_types.is_empty() || filters.property_types.contains(&p.property_type)
        })
        .filter_map(|p| {
            let score = relevance(p, &terms);
            (terms.is_empty() || score > 0).then_some((p, score))
        })
        .collect();

    match filters.sort.unwrap_or(SortOrder::Relevance) {
        SortOrder::Relevance => results.sort_by_key(|(_, score)| Reverse(*score)),
        SortOrder::PriceLowToHigh => results.sort_by_key(|(p, _)| p.price),
        SortOrder::PriceHighToLow => results.sort_by_key(|(p, _)| Reverse(p.price)),
        SortOrder::Newest => results.sort_by_key(|(p, _)| Reverse(p.posted_at)),
        SortOrder::AreaLargest => results.sort_by_key(|(p, _)| Reverse(p.carpet_area_sqft)),
    }

    results.into_iter().map(|(p, _)| p).collect()
}

/// Number of query terms found in the listing, weighting locality hits
fn relevance(property: &Property, terms: &[String]) -> usize {
    let title = property.title.to_lowercase();
    let locality = property.location.locality.to_lowercase();
    let city = property.location.city.to_lowercase();
    let kind = property.property_type.label().to_lowercase();

    terms
        .iter()
        .map(|term| {
            let mut score = 0;
            if locality.contains(term.as_str()) {
                score += 3;
            }
            if title.contains(term.as_str()) {
                score += 2;
            }
            if city.contains(term.as_str()) || kind.contains(term.as_str()) {
                score += 1;
            }
            score
        })
        .sum()
}
