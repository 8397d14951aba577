//! Trigger tables that map query fragments onto canonical filter values.
//!
//! Literal triggers are substring tests. Range categories use regex
//! triggers whose first capture group is the number, tagged with the bound
//! it sets. Location carries suffix rules so `서울거주` resolves to `서울`.

use std::collections::BTreeMap;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::{FilterCategory, FilterError};

/// Which side of a range a numeric trigger sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    Min,
    Max,
    /// The trigger recognises a number but sets no bound. Scanning moves on
    /// to the next trigger, so `3년이상` still reaches the `이상` trigger.
    Unbounded,
}

impl Bound {
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "min" | "min_years" | "min_salary" => Bound::Min,
            "max" | "max_years" | "max_salary" => Bound::Max,
            _ => Bound::Unbounded,
        }
    }
}

#[derive(Debug, Clone)]
pub enum Trigger {
    Literal { needle: String, value: String },
    Numeric { regex: Regex, bound: Bound },
}

impl Trigger {
    pub fn literal(needle: impl Into<String>, value: impl Into<String>) -> Self {
        Trigger::Literal {
            needle: needle.into(),
            value: value.into(),
        }
    }

    pub fn numeric(pattern: &str, bound: Bound) -> Result<Self, FilterError> {
        let regex = Regex::new(pattern).map_err(|source| FilterError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })?;
        Ok(Trigger::Numeric { regex, bound })
    }

    /// The trigger text as it was registered.
    pub fn pattern(&self) -> &str {
        match self {
            Trigger::Literal { needle, .. } => needle,
            Trigger::Numeric { regex, .. } => regex.as_str(),
        }
    }
}

/// A trailing qualifier stripped from a matched location (`거주`, `지역`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuffixRule {
    pub suffix: String,
    pub replacement: String,
}

#[derive(Debug, Clone, Default)]
pub struct CategoryPatterns {
    pub triggers: Vec<Trigger>,
    pub suffixes: Vec<SuffixRule>,
}

/// A pattern registered from configuration or at runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomPattern {
    pub category: FilterCategory,
    pub pattern: String,
    pub value: String,
}

/// Every category's triggers, owned by one filter engine.
#[derive(Debug, Clone, Default)]
pub struct PatternTable {
    categories: BTreeMap<FilterCategory, CategoryPatterns>,
}

const SENIORITY: &[(&str, &str)] = &[
    ("시니어", "senior"),
    ("주니어", "junior"),
    ("미드", "mid"),
    ("중급", "mid"),
    ("고급", "senior"),
    ("초급", "junior"),
];

const AVAILABILITY: &[(&str, &str)] = &[
    ("즉시", "available"),
    ("바로", "available"),
    ("바쁨", "busy"),
    ("고려", "considering"),
    ("검토", "considering"),
];

const LOCATIONS: &[&str] = &[
    "서울", "경기", "부산", "대구", "대전", "광주", "인천", "울산", "세종",
];

const LOCATION_SUFFIXES: &[&str] = &["거주", "지역", "근무"];

const EXPERIENCE_YEARS: &[(&str, Bound)] = &[
    (r"(\d+)년", Bound::Unbounded),
    (r"(\d+)년이상", Bound::Min),
    (r"(\d+)년 이상", Bound::Min),
    (r"(\d+)년이하", Bound::Max),
    (r"(\d+)년 이하", Bound::Max),
];

const COMPANIES: &[(&str, &str)] = &[
    ("네이버", "네이버"),
    ("카카오", "카카오"),
    ("쿠팡", "쿠팡"),
    ("배달의민족", "배달의민족"),
    ("토스", "토스"),
    ("당근마켓", "당근마켓"),
    ("라인", "라인"),
    ("nhn", "NHN"),
    ("구글", "Google"),
    ("페이스북", "Facebook"),
    ("마이크로소프트", "Microsoft"),
    ("애플", "Apple"),
    ("삼성전자", "삼성전자"),
    ("삼성", "삼성전자"),
    ("LG", "LG"),
    ("현대", "현대"),
    ("SK", "SK"),
    ("KT", "KT"),
    ("SKT", "SKT"),
    ("롯데", "롯데"),
    ("포스코", "포스코"),
    ("한화", "한화"),
    ("CJ", "CJ"),
    ("GS", "GS"),
    ("두산", "두산"),
    ("LS", "LS"),
    ("효성", "효성"),
    ("아시아나", "아시아나"),
    ("대우", "대우"),
    ("한진", "한진"),
    ("코오롱", "코오롱"),
    ("동부", "동부"),
    ("한라", "한라"),
    ("태영", "태영"),
    ("롯데정보통신", "롯데정보통신"),
    ("삼성SDS", "삼성SDS"),
    ("삼성전자DS", "삼성전자DS"),
    ("LG CNS", "LG CNS"),
    ("LG U+", "LG U+"),
    ("SK C&C", "SK C&C"),
    ("KT DS", "KT DS"),
    ("현대오토에버", "현대오토에버"),
    ("현대모비스", "현대모비스"),
    ("현대엔지니어링", "현대엔지니어링"),
];

const SKILLS: &[(&str, &str)] = &[
    ("프론트", "frontend"),
    ("프론트엔드", "frontend"),
    ("백엔드", "backend"),
    ("풀스택", "fullstack"),
    ("React", "React"),
    ("Vue", "Vue"),
    ("Angular", "Angular"),
    ("JavaScript", "JavaScript"),
    ("TypeScript", "TypeScript"),
    ("Python", "Python"),
    ("Java", "Java"),
    ("Node.js", "Node.js"),
    ("Spring", "Spring"),
    ("Django", "Django"),
    ("AWS", "AWS"),
    ("Docker", "Docker"),
    ("Kubernetes", "Kubernetes"),
    ("MySQL", "MySQL"),
    ("PostgreSQL", "PostgreSQL"),
    ("MongoDB", "MongoDB"),
];

const SALARY: &[(&str, Bound)] = &[
    (r"(\d+)만원", Bound::Unbounded),
    (r"(\d+)만원이상", Bound::Min),
    (r"(\d+)만원 이상", Bound::Min),
    (r"(\d+)만원이하", Bound::Max),
    (r"(\d+)만원 이하", Bound::Max),
];

fn literals(pairs: &[(&str, &str)]) -> CategoryPatterns {
    CategoryPatterns {
        triggers: pairs
            .iter()
            .map(|(needle, value)| Trigger::literal(*needle, *value))
            .collect(),
        suffixes: Vec::new(),
    }
}

fn numerics(patterns: &[(&str, Bound)]) -> Result<CategoryPatterns, FilterError> {
    Ok(CategoryPatterns {
        triggers: patterns
            .iter()
            .map(|(pattern, bound)| Trigger::numeric(pattern, *bound))
            .collect::<Result<_, _>>()?,
        suffixes: Vec::new(),
    })
}

impl PatternTable {
    /// The stock table for Korean developer-search queries.
    pub fn builtin() -> Self {
        let mut categories = BTreeMap::new();

        categories.insert(FilterCategory::Seniority, literals(SENIORITY));
        categories.insert(FilterCategory::Availability, literals(AVAILABILITY));

        let location = CategoryPatterns {
            triggers: LOCATIONS
                .iter()
                .map(|name| Trigger::literal(*name, *name))
                .collect(),
            suffixes: LOCATION_SUFFIXES
                .iter()
                .map(|suffix| SuffixRule {
                    suffix: suffix.to_string(),
                    replacement: String::new(),
                })
                .collect(),
        };
        categories.insert(FilterCategory::Location, location);

        // the built-in regexes are literals above, compiling them cannot fail
        if let Ok(patterns) = numerics(EXPERIENCE_YEARS) {
            categories.insert(FilterCategory::ExperienceYears, patterns);
        }
        categories.insert(FilterCategory::Companies, literals(COMPANIES));
        categories.insert(FilterCategory::Skills, literals(SKILLS));
        if let Ok(patterns) = numerics(SALARY) {
            categories.insert(FilterCategory::Salary, patterns);
        }

        Self { categories }
    }

    pub fn get(&self, category: FilterCategory) -> Option<&CategoryPatterns> {
        self.categories.get(&category)
    }

    /// Append a trigger to the end of a category's list.
    ///
    /// For range categories `pattern` is a regex with one capture group and
    /// `value` is a bound tag (`min_years`, `max_salary`, ...). Literal
    /// triggers of lowercased categories are stored lowercased so they can
    /// match at all.
    pub fn add_pattern(
        &mut self,
        category: FilterCategory,
        pattern: &str,
        value: &str,
    ) -> Result<(), FilterError> {
        if pattern.is_empty() {
            return Err(FilterError::EmptyPattern(category));
        }

        let trigger = if category.is_numeric() {
            Trigger::numeric(pattern, Bound::from_tag(value))?
        } else if category.matches_original_case() {
            Trigger::literal(pattern, value)
        } else {
            Trigger::literal(pattern.to_lowercase(), value)
        };

        self.categories
            .entry(category)
            .or_default()
            .triggers
            .push(trigger);

        Ok(())
    }

    pub fn extend(&mut self, patterns: &[CustomPattern]) -> Result<(), FilterError> {
        for custom in patterns {
            self.add_pattern(custom.category, &custom.pattern, &custom.value)?;
        }
        Ok(())
    }

    pub fn trigger_count(&self, category: FilterCategory) -> usize {
        self.get(category).map(|p| p.triggers.len()).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_covers_every_category() {
        let table = PatternTable::builtin();
        for category in FilterCategory::ALL {
            assert!(
                table.trigger_count(category) > 0,
                "no triggers for {category}"
            );
        }
        assert_eq!(table.trigger_count(FilterCategory::ExperienceYears), 5);
        assert_eq!(
            table.get(FilterCategory::Location).unwrap().suffixes.len(),
            3
        );
    }

    #[test]
    fn test_bound_tags() {
        assert_eq!(Bound::from_tag("min_years"), Bound::Min);
        assert_eq!(Bound::from_tag("max_salary"), Bound::Max);
        assert_eq!(Bound::from_tag("years"), Bound::Unbounded);
    }

    #[test]
    fn test_add_pattern_appends() {
        let mut table = PatternTable::builtin();
        let before = table.trigger_count(FilterCategory::Companies);

        table
            .add_pattern(FilterCategory::Companies, "크래프톤", "크래프톤")
            .unwrap();

        let triggers = &table.get(FilterCategory::Companies).unwrap().triggers;
        assert_eq!(triggers.len(), before + 1);
        assert_eq!(triggers.last().unwrap().pattern(), "크래프톤");
    }

    #[test]
    fn test_add_pattern_lowercases_case_insensitive_categories() {
        let mut table = PatternTable::builtin();
        table
            .add_pattern(FilterCategory::Seniority, "Lead", "senior")
            .unwrap();
        table
            .add_pattern(FilterCategory::Skills, "Rust", "Rust")
            .unwrap();

        let seniority = &table.get(FilterCategory::Seniority).unwrap().triggers;
        assert_eq!(seniority.last().unwrap().pattern(), "lead");
        let skills = &table.get(FilterCategory::Skills).unwrap().triggers;
        assert_eq!(skills.last().unwrap().pattern(), "Rust");
    }

    #[test]
    fn test_add_invalid_regex_fails() {
        let mut table = PatternTable::builtin();
        let result = table.add_pattern(FilterCategory::Salary, r"(\d+", "min_salary");
        assert!(matches!(result, Err(FilterError::InvalidPattern { .. })));
        assert_eq!(table.trigger_count(FilterCategory::Salary), 5);
    }

    #[test]
    fn test_add_empty_pattern_fails() {
        let mut table = PatternTable::builtin();
        assert!(matches!(
            table.add_pattern(FilterCategory::Location, "", "서울"),
            Err(FilterError::EmptyPattern(FilterCategory::Location))
        ));
    }
}
