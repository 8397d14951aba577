//! Query text → structured filters.

use super::patterns::{Bound, CategoryPatterns, PatternTable, Trigger};
use super::{ExtractedFilters, Filter, FilterCategory, Range};

/// Scan `query` for every enabled category, in the order given.
///
/// Pure: the result depends only on the query, the categories and the
/// table contents.
pub fn extract(
    query: &str,
    categories: &[FilterCategory],
    table: &PatternTable,
) -> ExtractedFilters {
    let lowered = query.to_lowercase();
    let mut filters = ExtractedFilters::new();

    for &category in categories {
        let Some(patterns) = table.get(category) else {
            log::debug!("no patterns registered for '{category}'");
            continue;
        };

        let haystack = if category.matches_original_case() {
            query
        } else {
            lowered.as_str()
        };

        match extract_category(haystack, category, patterns) {
            Some(filter) => {
                log::debug!("extracted {category} = {filter:?}");
                filters.insert(filter);
            }
            None => log::debug!("nothing extracted for '{category}'"),
        }
    }

    log::debug!("extracted filters from {query:?}: {filters:?}");
    filters
}

/// First trigger that yields a value wins.
fn extract_category(
    haystack: &str,
    category: FilterCategory,
    patterns: &CategoryPatterns,
) -> Option<Filter> {
    for trigger in &patterns.triggers {
        match trigger {
            Trigger::Numeric { regex, bound } => {
                let Some(number) = regex
                    .captures(haystack)
                    .and_then(|caps| caps.get(1))
                    .and_then(|m| m.as_str().parse::<i64>().ok())
                else {
                    continue;
                };

                let range = match bound {
                    Bound::Min => Range::at_least(number),
                    Bound::Max => Range::at_most(number),
                    Bound::Unbounded => continue,
                };
                log::debug!("'{}' matched {number}", trigger.pattern());
                return Filter::range(category, range);
            }
            Trigger::Literal { needle, value } => {
                if !haystack.contains(needle.as_str()) {
                    continue;
                }
                log::debug!("'{}' matched", trigger.pattern());

                for rule in &patterns.suffixes {
                    if haystack.contains(&format!("{needle}{}", rule.suffix)) {
                        log::debug!("'{needle}' matched with suffix '{}'", rule.suffix);
                        return Filter::text(category, format!("{value}{}", rule.replacement));
                    }
                }
                return Filter::text(category, value.clone());
            }
        }
    }

    None
}
