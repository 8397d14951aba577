//! Filter categories and the typed values extracted for them.

use std::fmt;
use std::str::FromStr;

use serde::{ser::SerializeMap, Deserialize, Serialize, Serializer};

use super::FilterError;

/// A structured constraint a query can express.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterCategory {
    Seniority,
    Availability,
    Location,
    ExperienceYears,
    Companies,
    Skills,
    Salary,
}

impl FilterCategory {
    pub const ALL: [FilterCategory; 7] = [
        FilterCategory::Seniority,
        FilterCategory::Availability,
        FilterCategory::Location,
        FilterCategory::ExperienceYears,
        FilterCategory::Companies,
        FilterCategory::Skills,
        FilterCategory::Salary,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FilterCategory::Seniority => "seniority",
            FilterCategory::Availability => "availability",
            FilterCategory::Location => "location",
            FilterCategory::ExperienceYears => "experience_years",
            FilterCategory::Companies => "companies",
            FilterCategory::Skills => "skills",
            FilterCategory::Salary => "salary",
        }
    }

    /// Weight a matched filter of this category adds to the ordering score.
    pub fn priority(&self) -> u32 {
        match self {
            FilterCategory::Location => 5,
            FilterCategory::Availability => 4,
            FilterCategory::Seniority | FilterCategory::ExperienceYears => 3,
            FilterCategory::Companies => 2,
            FilterCategory::Skills | FilterCategory::Salary => 1,
        }
    }

    /// Human readable label used in filter summaries.
    pub fn label(&self) -> &'static str {
        match self {
            FilterCategory::Seniority => "경력 레벨",
            FilterCategory::Availability => "가용성",
            FilterCategory::Location => "지역",
            FilterCategory::ExperienceYears => "경력 연차",
            FilterCategory::Companies => "회사 경험",
            FilterCategory::Skills => "기술 스택",
            FilterCategory::Salary => "연봉",
        }
    }

    /// Range categories are matched with regex triggers capturing an integer.
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            FilterCategory::ExperienceYears | FilterCategory::Salary
        )
    }

    /// Company and skill triggers are proper nouns (`LG`, `React`) and are
    /// tested against the query as typed. Every other category is tested
    /// against a lowercased copy.
    pub fn matches_original_case(&self) -> bool {
        matches!(self, FilterCategory::Companies | FilterCategory::Skills)
    }

    /// Unit suffix used when a range of this category is summarised.
    fn range_unit(&self) -> &'static str {
        match self {
            FilterCategory::Salary => "만원",
            _ => "년",
        }
    }
}

impl fmt::Display for FilterCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FilterCategory {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FilterCategory::ALL
            .into_iter()
            .find(|category| category.as_str() == s.trim())
            .ok_or_else(|| FilterError::UnknownCategory(s.to_string()))
    }
}

/// Inclusive numeric bounds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Range {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<i64>,
}

impl Range {
    pub fn at_least(min: i64) -> Self {
        Self {
            min: Some(min),
            max: None,
        }
    }

    pub fn at_most(max: i64) -> Self {
        Self {
            min: None,
            max: Some(max),
        }
    }

    pub fn contains(&self, value: i64) -> bool {
        if let Some(min) = self.min {
            if value < min {
                return false;
            }
        }
        if let Some(max) = self.max {
            if value > max {
                return false;
            }
        }
        true
    }
}

/// One extracted constraint, typed by category.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Seniority(String),
    Availability(String),
    Location(String),
    ExperienceYears(Range),
    Companies(String),
    Skills(String),
    Salary(Range),
}

impl Filter {
    /// Build a text-valued filter. Returns `None` for range categories.
    pub fn text(category: FilterCategory, value: impl Into<String>) -> Option<Self> {
        let value = value.into();
        match category {
            FilterCategory::Seniority => Some(Filter::Seniority(value)),
            FilterCategory::Availability => Some(Filter::Availability(value)),
            FilterCategory::Location => Some(Filter::Location(value)),
            FilterCategory::Companies => Some(Filter::Companies(value)),
            FilterCategory::Skills => Some(Filter::Skills(value)),
            FilterCategory::ExperienceYears | FilterCategory::Salary => None,
        }
    }

    /// Build a range-valued filter. Returns `None` for text categories.
    pub fn range(category: FilterCategory, range: Range) -> Option<Self> {
        match category {
            FilterCategory::ExperienceYears => Some(Filter::ExperienceYears(range)),
            FilterCategory::Salary => Some(Filter::Salary(range)),
            _ => None,
        }
    }

    pub fn category(&self) -> FilterCategory {
        match self {
            Filter::Seniority(_) => FilterCategory::Seniority,
            Filter::Availability(_) => FilterCategory::Availability,
            Filter::Location(_) => FilterCategory::Location,
            Filter::ExperienceYears(_) => FilterCategory::ExperienceYears,
            Filter::Companies(_) => FilterCategory::Companies,
            Filter::Skills(_) => FilterCategory::Skills,
            Filter::Salary(_) => FilterCategory::Salary,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Filter::Seniority(value)
            | Filter::Availability(value)
            | Filter::Location(value)
            | Filter::Companies(value)
            | Filter::Skills(value) => Some(value),
            Filter::ExperienceYears(_) | Filter::Salary(_) => None,
        }
    }

    pub fn as_range(&self) -> Option<&Range> {
        match self {
            Filter::ExperienceYears(range) | Filter::Salary(range) => Some(range),
            _ => None,
        }
    }

    /// Summary fragments, e.g. `지역: 서울` or `경력 연차: 3년 이상`.
    pub fn describe(&self) -> Vec<String> {
        let category = self.category();
        let label = category.label();

        match self.as_range() {
            Some(range) => {
                let unit = category.range_unit();
                let mut parts = Vec::new();
                if let Some(min) = range.min {
                    parts.push(format!("{label}: {min}{unit} 이상"));
                }
                if let Some(max) = range.max {
                    parts.push(format!("{label}: {max}{unit} 이하"));
                }
                parts
            }
            None => vec![format!("{label}: {}", self.as_text().unwrap_or_default())],
        }
    }
}

impl Serialize for Filter {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Filter::ExperienceYears(range) | Filter::Salary(range) => range.serialize(serializer),
            _ => serializer.serialize_str(self.as_text().unwrap_or_default()),
        }
    }
}

/// Filters extracted from one query, at most one per category, kept in the
/// order the categories were scanned.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedFilters {
    filters: Vec<Filter>,
}

impl ExtractedFilters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a filter, replacing any earlier filter of the same category.
    pub fn insert(&mut self, filter: Filter) {
        let category = filter.category();
        match self.filters.iter_mut().find(|f| f.category() == category) {
            Some(existing) => *existing = filter,
            None => self.filters.push(filter),
        }
    }

    #[cfg(test)]
    pub fn get(&self, category: FilterCategory) -> Option<&Filter> {
        self.filters.iter().find(|f| f.category() == category)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Filter> {
        self.filters.iter()
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Comma separated summary of every filter, empty when nothing was extracted.
    pub fn describe(&self) -> String {
        self.filters
            .iter()
            .flat_map(Filter::describe)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl FromIterator<Filter> for ExtractedFilters {
    fn from_iter<T: IntoIterator<Item = Filter>>(iter: T) -> Self {
        let mut filters = ExtractedFilters::new();
        for filter in iter {
            filters.insert(filter);
        }
        filters
    }
}

impl Serialize for ExtractedFilters {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.filters.len()))?;
        for filter in &self.filters {
            map.serialize_entry(filter.category().as_str(), filter)?;
        }
        map.end()
    }
}
