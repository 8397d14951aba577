//! Query-to-filter extraction and filter-aware re-ranking.
//!
//! # Architecture
//!
//! - `category`: filter categories, typed values and the extracted set
//! - `patterns`: trigger tables (literal, regex, suffix rules)
//! - `extract`: scans a query against the table
//! - `rank`: predicates, strict/lenient application, priority ordering
//! - `profile`: named engine configurations (default, strict, flexible)

mod category;
mod extract;
mod patterns;
mod profile;
mod rank;

pub use category::{ExtractedFilters, Filter, FilterCategory, Range};
pub use patterns::{CustomPattern, PatternTable};
pub use profile::{FilterProfile, DEFAULT_PROFILE};

use crate::search::Candidate;

#[derive(Debug, thiserror::Error)]
pub enum FilterError {
    #[error("unknown filter category: {0}")]
    UnknownCategory(String),

    #[error("invalid pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("empty pattern for category {0}")]
    EmptyPattern(FilterCategory),
}

/// Extracts filters from queries and applies them to search results.
///
/// Owns its pattern table; registering a pattern on one engine does not
/// affect any other.
#[derive(Debug, Clone)]
pub struct FilterEngine {
    profile: FilterProfile,
    patterns: PatternTable,
}

impl FilterEngine {
    pub fn new(profile: FilterProfile, patterns: PatternTable) -> Self {
        log::info!(
            "filter engine ready: '{}' profile (strict: {})",
            profile.name,
            profile.strict_mode
        );
        Self { profile, patterns }
    }

    pub fn with_profile(profile: FilterProfile) -> Self {
        Self::new(profile, PatternTable::builtin())
    }

    pub fn profile(&self) -> &FilterProfile {
        &self.profile
    }

    pub fn patterns(&self) -> &PatternTable {
        &self.patterns
    }

    /// Filters expressed by `query` for the profile's enabled categories.
    pub fn extract(&self, query: &str) -> ExtractedFilters {
        let filters = extract::extract(query, &self.profile.enabled_filters, &self.patterns);
        log::debug!("extracted filters: {}", filters.describe());
        filters
    }

    /// Apply `filters` to `candidates` with the profile's strictness.
    pub fn apply(&self, candidates: Vec<Candidate>, filters: &ExtractedFilters) -> Vec<Candidate> {
        rank::apply(candidates, filters, self.profile.strict_mode)
    }

    pub fn describe(&self, filters: &ExtractedFilters) -> String {
        filters.describe()
    }

    /// Register an extra trigger for `category`.
    pub fn add_custom_pattern(
        &mut self,
        category: FilterCategory,
        pattern: &str,
        value: &str,
    ) -> Result<(), FilterError> {
        self.patterns.add_pattern(category, pattern, value)?;
        log::info!("custom pattern added: {category} - {pattern} -> {value}");
        Ok(())
    }
}

impl Default for FilterEngine {
    fn default() -> Self {
        Self::with_profile(FilterProfile::default_profile())
    }
}
