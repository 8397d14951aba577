//! Filter predicates and re-ranking of scored candidates.
//!
//! Two scores are in play here. `total_score` is the relevance score shown
//! to callers and is penalised for mismatches. The final order, however, is
//! by priority score: the summed category weights of the filters a candidate
//! satisfies. The two can disagree.

use serde_json::Value;

use super::{ExtractedFilters, Filter};
use crate::search::Candidate;

/// Lower bound of a penalised score.
pub const MIN_ADJUSTED_SCORE: f32 = 0.1;
/// Upper bound of any score leaving the filter stage.
pub const MAX_ADJUSTED_SCORE: f32 = 1.0;
/// Share of the score removed when every filter mismatches.
pub const MAX_PENALTY: f32 = 0.5;

const FRONTEND_TAGS: &[&str] = &[
    "frontend",
    "프론트",
    "프론트엔드",
    "react",
    "vue",
    "angular",
    "javascript",
    "typescript",
];
const BACKEND_TAGS: &[&str] = &[
    "backend", "백엔드", "java", "python", "spring", "django", "node.js",
];
const FULLSTACK_TAGS: &[&str] = &["fullstack", "풀스택"];

impl Filter {
    /// Whether `candidate` satisfies this filter.
    pub fn matches(&self, candidate: &Candidate) -> bool {
        match self {
            Filter::ExperienceYears(range) => {
                range.contains(candidate.attribute_i64("years_experience").unwrap_or(0))
            }
            // salary_range is free text on the profile, nothing to compare yet
            Filter::Salary(_) => true,
            Filter::Companies(company) => company_matches(candidate, company),
            Filter::Skills(skill) => skill_matches(candidate, skill),
            Filter::Seniority(value) | Filter::Availability(value) | Filter::Location(value) => {
                match candidate.metadata.get(self.category().as_str()) {
                    Some(Value::String(actual)) => actual == value,
                    Some(_) => false,
                    None => true,
                }
            }
        }
    }
}

/// Case-insensitive containment against the experience list, then the flat
/// `company` attribute. A candidate with no company data at all passes.
fn company_matches(candidate: &Candidate, company: &str) -> bool {
    let needle = company.to_lowercase();

    if candidate
        .experience
        .iter()
        .any(|exp| exp.company.to_lowercase().contains(&needle))
    {
        return true;
    }

    if let Some(flat) = candidate.attribute_str("company") {
        return flat.to_lowercase().contains(&needle);
    }

    candidate.experience.is_empty()
}

/// Skill tags translate into a role requirement on `primary_role`.
fn skill_matches(candidate: &Candidate, skill: &str) -> bool {
    let role = candidate
        .attribute_str("primary_role")
        .unwrap_or_default()
        .to_lowercase();
    let skill = skill.to_lowercase();

    if FRONTEND_TAGS.contains(&skill.as_str()) {
        role == "frontend" || role == "fullstack"
    } else if BACKEND_TAGS.contains(&skill.as_str()) {
        role == "backend" || role == "fullstack"
    } else if FULLSTACK_TAGS.contains(&skill.as_str()) {
        role == "fullstack"
    } else {
        role == "fullstack"
    }
}

/// Sum of category priorities for the filters `candidate` satisfies.
pub fn priority_score(candidate: &Candidate, filters: &ExtractedFilters) -> u32 {
    filters
        .iter()
        .filter(|filter| filter.matches(candidate))
        .map(|filter| filter.category().priority())
        .sum()
}

/// Filter, re-score and re-order `candidates`.
///
/// Strict mode drops a candidate on its first failing filter. Lenient mode
/// keeps everyone and scales the score by `1 - (mismatches / filters) * 0.5`.
/// Surviving scores are clamped into `[0.1, 1.0]`, then the list is stably
/// sorted by priority score, highest first.
pub fn apply(
    candidates: Vec<Candidate>,
    filters: &ExtractedFilters,
    strict: bool,
) -> Vec<Candidate> {
    if filters.is_empty() {
        return candidates;
    }

    let before = candidates.len();
    let total = filters.len() as f32;

    let mut kept: Vec<(u32, Candidate)> = Vec::with_capacity(before);

    'candidates: for mut candidate in candidates {
        let mut mismatches = 0usize;

        for filter in filters.iter() {
            if !filter.matches(&candidate) {
                if strict {
                    log::debug!(
                        "{} excluded by {} filter",
                        candidate.developer_id,
                        filter.category()
                    );
                    continue 'candidates;
                }
                mismatches += 1;
            }
        }

        let score = if mismatches > 0 {
            let penalty = (mismatches as f32 / total) * MAX_PENALTY;
            candidate.total_score * (1.0 - penalty)
        } else {
            candidate.total_score
        };
        candidate.total_score = score.clamp(MIN_ADJUSTED_SCORE, MAX_ADJUSTED_SCORE);

        let priority = priority_score(&candidate, filters);
        kept.push((priority, candidate));
    }

    // sort_by is stable: equal priorities keep their incoming order
    kept.sort_by(|a, b| b.0.cmp(&a.0));

    log::info!("filters applied: {before} -> {} candidates", kept.len());
    kept.into_iter().map(|(_, candidate)| candidate).collect()
}
