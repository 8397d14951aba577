use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::FilterCategory;

pub const DEFAULT_PROFILE: &str = "default";

const STANDARD_CATEGORIES: [FilterCategory; 6] = [
    FilterCategory::Seniority,
    FilterCategory::Availability,
    FilterCategory::Location,
    FilterCategory::ExperienceYears,
    FilterCategory::Companies,
    FilterCategory::Skills,
];

/// Named filter behaviour selected when an engine is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterProfile {
    #[serde(default, skip_serializing)]
    pub name: String,
    pub enabled_filters: Vec<FilterCategory>,
    #[serde(default)]
    pub strict_mode: bool,
    #[serde(default)]
    pub min_score_threshold: f32,
}

impl FilterProfile {
    /// Six categories, mismatches penalised.
    pub fn default_profile() -> Self {
        Self {
            name: DEFAULT_PROFILE.to_string(),
            enabled_filters: STANDARD_CATEGORIES.to_vec(),
            strict_mode: false,
            min_score_threshold: 0.3,
        }
    }

    /// Six categories, any mismatch excludes.
    pub fn strict() -> Self {
        Self {
            name: "strict".to_string(),
            enabled_filters: STANDARD_CATEGORIES.to_vec(),
            strict_mode: true,
            min_score_threshold: 0.5,
        }
    }

    /// Seniority and availability only.
    pub fn flexible() -> Self {
        Self {
            name: "flexible".to_string(),
            enabled_filters: vec![FilterCategory::Seniority, FilterCategory::Availability],
            strict_mode: false,
            min_score_threshold: 0.1,
        }
    }

    pub fn builtin() -> Vec<Self> {
        vec![Self::default_profile(), Self::strict(), Self::flexible()]
    }

    /// Look `name` up among the configured overrides, then the built-ins.
    /// Unknown names resolve to the default profile.
    pub fn resolve(name: &str, overrides: &BTreeMap<String, FilterProfile>) -> Self {
        if let Some(profile) = overrides.get(name) {
            return FilterProfile {
                name: name.to_string(),
                ..profile.clone()
            };
        }

        match Self::builtin().into_iter().find(|p| p.name == name) {
            Some(profile) => profile,
            None => {
                log::warn!("unknown filter profile '{name}', using '{DEFAULT_PROFILE}'");
                match overrides.get(DEFAULT_PROFILE) {
                    Some(profile) => FilterProfile {
                        name: DEFAULT_PROFILE.to_string(),
                        ..profile.clone()
                    },
                    None => Self::default_profile(),
                }
            }
        }
    }
}

impl Default for FilterProfile {
    fn default() -> Self {
        Self::default_profile()
    }
}
