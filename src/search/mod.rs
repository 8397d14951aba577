//! Semantic developer search over three sub-indexes.
//!
//! Every developer is indexed three ways: one profile document, one document
//! per skill and one per past position. A query is embedded once and looked
//! up in each collection; the hits are fused into a per-developer score and
//! then re-ranked by the filters extracted from the same query.

pub mod chroma;
pub mod embeddings;
pub mod fusion;
pub mod store;

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::SearchConfig;
use crate::developers::{Developer, Education, Experience, Skill};
use crate::filters::{ExtractedFilters, FilterEngine, FilterError, FilterProfile};
use embeddings::{Embedder, EmbeddingError};
use fusion::SubIndexResults;
use store::{Hit, StoreError, StoreRecord, VectorStore};

/// Query used to rank profiles when searching by attributes alone.
const ATTRIBUTE_SEARCH_QUERY: &str = "개발자";

#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Embedding(#[from] EmbeddingError),

    #[error(transparent)]
    Filter(#[from] FilterError),

    #[error("unknown search type: {0} (expected comprehensive or profile_only)")]
    InvalidSearchType(String),
}

/// One of the three collections a developer is indexed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SubIndex {
    Profiles,
    Skills,
    Experience,
}

impl SubIndex {
    pub const ALL: [SubIndex; 3] = [SubIndex::Profiles, SubIndex::Skills, SubIndex::Experience];

    /// Collection name in the store.
    pub fn as_str(&self) -> &'static str {
        match self {
            SubIndex::Profiles => "profiles",
            SubIndex::Skills => "skills",
            SubIndex::Experience => "experience",
        }
    }
}

impl fmt::Display for SubIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchType {
    /// Fuse profile, skill and experience hits.
    #[default]
    Comprehensive,
    /// Profile collection only; similarity is the score.
    ProfileOnly,
}

impl SearchType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchType::Comprehensive => "comprehensive",
            SearchType::ProfileOnly => "profile_only",
        }
    }
}

impl fmt::Display for SearchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SearchType {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "comprehensive" => Ok(SearchType::Comprehensive),
            "profile_only" => Ok(SearchType::ProfileOnly),
            other => Err(SearchError::InvalidSearchType(other.to_string())),
        }
    }
}

/// Weighted contribution of each sub-index to a candidate's total.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SubScores {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skills: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub experience: Option<f32>,
}

impl SubScores {
    pub fn add(&mut self, index: SubIndex, weighted: f32) {
        let slot = match index {
            SubIndex::Profiles => &mut self.profile,
            SubIndex::Skills => &mut self.skills,
            SubIndex::Experience => &mut self.experience,
        };
        *slot = Some(slot.unwrap_or(0.0) + weighted);
    }
}

/// A scored search result for one developer.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Candidate {
    pub developer_id: String,
    pub metadata: Map<String, Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub experience: Vec<Experience>,
    pub scores: SubScores,
    pub total_score: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document: Option<String>,
}

impl Candidate {
    pub fn attribute_str(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(Value::as_str)
    }

    /// Integer attribute; floats are truncated.
    pub fn attribute_i64(&self, key: &str) -> Option<i64> {
        let value = self.metadata.get(key)?;
        value.as_i64().or_else(|| value.as_f64().map(|f| f as i64))
    }

    /// Profile hit scored by raw similarity.
    fn from_profile_hit(hit: Hit) -> Option<Self> {
        let developer_id = hit.developer_id()?.to_string();
        let similarity = hit.similarity()?;

        Some(Self {
            developer_id,
            metadata: hit.metadata,
            scores: SubScores {
                profile: Some(similarity),
                ..Default::default()
            },
            total_score: similarity,
            document: hit.document,
            ..Default::default()
        })
    }
}

/// Exact attribute constraints for browsing without a text query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttributeFilters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seniority: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub availability: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_years_experience: Option<i64>,
}

impl AttributeFilters {
    /// Blank values mean "any".
    pub fn normalized(self) -> Self {
        let keep = |value: Option<String>| {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        Self {
            seniority: keep(self.seniority),
            primary_role: keep(self.primary_role),
            availability: keep(self.availability),
            location: keep(self.location),
            min_years_experience: self.min_years_experience,
        }
    }

    fn text_constraints(&self) -> [(&'static str, Option<&str>); 4] {
        [
            ("seniority", self.seniority.as_deref()),
            ("primary_role", self.primary_role.as_deref()),
            ("availability", self.availability.as_deref()),
            ("location", self.location.as_deref()),
        ]
    }

    /// Attributes missing from `metadata` do not exclude.
    pub fn matches(&self, metadata: &Map<String, Value>) -> bool {
        for (key, expected) in self.text_constraints() {
            let (Some(expected), Some(actual)) = (expected, metadata.get(key)) else {
                continue;
            };
            if actual.as_str() != Some(expected) {
                log::debug!("{key} mismatch: {actual} != {expected}");
                return false;
            }
        }

        if let Some(min) = self.min_years_experience {
            let years = metadata
                .get("years_experience")
                .and_then(Value::as_i64)
                .unwrap_or(0);
            if years < min {
                log::debug!("years_experience mismatch: {years} < {min}");
                return false;
            }
        }

        true
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub profiles: usize,
    pub skills: usize,
    pub experience: usize,
    pub total: usize,
}

/// Ranked candidates together with the filters that ranked them.
#[derive(Debug, Clone, Default)]
pub struct SearchResults {
    pub filters: ExtractedFilters,
    pub candidates: Vec<Candidate>,
}

pub struct SearchEngine {
    store: Arc<dyn VectorStore>,
    embedder: Arc<dyn Embedder>,
    settings: SearchConfig,
    filter_engine: FilterEngine,
}

impl SearchEngine {
    /// Connect the engine, creating any missing collection.
    pub fn new(
        store: Arc<dyn VectorStore>,
        embedder: Arc<dyn Embedder>,
        settings: SearchConfig,
        filter_engine: FilterEngine,
    ) -> Result<Self, SearchError> {
        for index in SubIndex::ALL {
            store.ensure_collection(index)?;
        }
        log::info!(
            "search engine ready (model: {}, filter profile: {})",
            embedder.name(),
            filter_engine.profile().name
        );

        Ok(Self {
            store,
            embedder,
            settings,
            filter_engine,
        })
    }

    pub fn filter_engine_mut(&mut self) -> &mut FilterEngine {
        &mut self.filter_engine
    }

    /// A filter engine for profile `name` sharing this engine's patterns.
    pub fn filter_engine_for(
        &self,
        name: &str,
        overrides: &BTreeMap<String, FilterProfile>,
    ) -> FilterEngine {
        FilterEngine::new(
            FilterProfile::resolve(name, overrides),
            self.filter_engine.patterns().clone(),
        )
    }

    /// Search with the engine's own filter profile.
    pub fn search_developers(
        &self,
        query: &str,
        search_type: SearchType,
        limit: usize,
    ) -> Result<SearchResults, SearchError> {
        self.search_with(&self.filter_engine, query, search_type, limit)
    }

    /// Search with an explicit filter engine.
    ///
    /// `limit` is kept within `1..=max_limit`. More hits than needed are
    /// fetched so that filtering still leaves enough to return.
    pub fn search_with(
        &self,
        filters: &FilterEngine,
        query: &str,
        search_type: SearchType,
        limit: usize,
    ) -> Result<SearchResults, SearchError> {
        let limit = self.clamp_limit(limit);
        log::info!("search: '{query}' (type: {search_type}, limit: {limit})");

        let extracted = filters.extract(query);
        let embedding = self.embedder.embed(query)?;

        let candidates = match search_type {
            SearchType::ProfileOnly => {
                let hits = self.store.query(SubIndex::Profiles, &embedding, limit * 3)?;
                let mut candidates: Vec<_> = hits
                    .into_iter()
                    .filter_map(Candidate::from_profile_hit)
                    .collect();
                candidates.sort_by(|a, b| b.total_score.total_cmp(&a.total_score));
                candidates
            }
            SearchType::Comprehensive => {
                let n_results = limit * 3 * 2;
                let results = SubIndexResults {
                    profiles: self.store.query(SubIndex::Profiles, &embedding, n_results)?,
                    skills: self.store.query(SubIndex::Skills, &embedding, n_results)?,
                    experience: self.store.query(SubIndex::Experience, &embedding, n_results)?,
                };
                fusion::fuse(&results, &self.settings.weights)
            }
        };

        let mut candidates = filters.apply(candidates, &extracted);
        candidates.truncate(limit);
        Ok(SearchResults {
            filters: extracted,
            candidates,
        })
    }

    fn clamp_limit(&self, limit: usize) -> usize {
        limit.clamp(1, self.settings.max_limit.max(1))
    }

    /// Browse profiles by exact attributes, ranked by similarity to a
    /// generic query.
    pub fn search_by_filters(
        &self,
        attributes: &AttributeFilters,
        limit: usize,
    ) -> Result<Vec<Candidate>, SearchError> {
        let limit = self.clamp_limit(limit);
        log::info!("attribute search: {attributes:?} (limit: {limit})");

        let embedding = self.embedder.embed(ATTRIBUTE_SEARCH_QUERY)?;
        let hits = self.store.query(SubIndex::Profiles, &embedding, limit * 3)?;

        let mut candidates: Vec<_> = hits
            .into_iter()
            .filter(|hit| attributes.matches(&hit.metadata))
            .filter_map(Candidate::from_profile_hit)
            .collect();
        candidates.sort_by(|a, b| b.total_score.total_cmp(&a.total_score));
        candidates.truncate(limit);
        Ok(candidates)
    }

    pub fn get_stats(&self) -> Result<Stats, SearchError> {
        let profiles = self.store.count(SubIndex::Profiles)?;
        let skills = self.store.count(SubIndex::Skills)?;
        let experience = self.store.count(SubIndex::Experience)?;

        Ok(Stats {
            profiles,
            skills,
            experience,
            total: profiles + skills + experience,
        })
    }

    /// Reassemble a developer from the three collections. `Ok(None)` when no
    /// profile exists for `developer_id`.
    pub fn get_developer_by_id(&self, developer_id: &str) -> Result<Option<Developer>, SearchError> {
        let profiles = self
            .store
            .get_where(SubIndex::Profiles, "developer_id", developer_id)?;
        let Some(profile) = profiles.into_iter().next() else {
            log::info!("developer not found: {developer_id}");
            return Ok(None);
        };

        let skills = self
            .store
            .get_where(SubIndex::Skills, "developer_id", developer_id)?
            .into_iter()
            .map(|hit| Skill {
                name: text(&hit.metadata, "skill_name"),
                level: u8::try_from(number(&hit.metadata, "skill_level")).unwrap_or(u8::MAX),
                years: u32::try_from(number(&hit.metadata, "years_used")).unwrap_or(u32::MAX),
            })
            .collect();

        let experience = self
            .store
            .get_where(SubIndex::Experience, "developer_id", developer_id)?
            .iter()
            .map(|hit| Experience::from_metadata(&hit.metadata))
            .collect();

        let metadata = &profile.metadata;
        log::info!("developer loaded: {developer_id}");

        Ok(Some(Developer {
            developer_id: developer_id.to_string(),
            name: text(metadata, "name"),
            location: text(metadata, "location"),
            seniority: text(metadata, "seniority"),
            primary_role: text(metadata, "primary_role"),
            years_experience: u32::try_from(number(metadata, "years_experience"))
                .unwrap_or(u32::MAX),
            availability: text(metadata, "availability"),
            salary_range: text(metadata, "salary_range"),
            skills,
            experience,
            education: Education::default(),
            github_stars: 0,
            stackoverflow_reputation: 0,
        }))
    }

    /// Index `developers` into all three collections.
    pub fn add_developers(&self, developers: &[Developer]) -> Result<usize, SearchError> {
        log::info!("indexing {} developers", developers.len());

        let mut profiles = Vec::new();
        let mut skills = Vec::new();
        let mut experience = Vec::new();

        for dev in developers {
            let id = &dev.developer_id;
            profiles.push((
                format!("profile_{id}"),
                dev.profile_text(),
                dev.profile_metadata(),
            ));
            for skill in &dev.skills {
                skills.push((
                    format!("skill_{id}_{}", skill.name),
                    dev.skill_text(skill),
                    dev.skill_metadata(skill),
                ));
            }
            for (i, exp) in dev.experience.iter().enumerate() {
                experience.push((
                    format!("exp_{id}_{i}"),
                    dev.experience_text(exp),
                    dev.experience_metadata(exp),
                ));
            }
        }

        for (index, documents) in [
            (SubIndex::Profiles, profiles),
            (SubIndex::Skills, skills),
            (SubIndex::Experience, experience),
        ] {
            let records = self.embed_records(documents)?;
            log::debug!("adding {} records to '{index}'", records.len());
            self.store.add(index, records)?;
        }

        log::info!("indexed {} developers", developers.len());
        Ok(developers.len())
    }

    fn embed_records(
        &self,
        documents: Vec<(String, String, Map<String, Value>)>,
    ) -> Result<Vec<StoreRecord>, SearchError> {
        let texts: Vec<String> = documents.iter().map(|(_, text, _)| text.clone()).collect();
        let embeddings = self.embedder.embed_batch(&texts)?;

        if embeddings.len() != documents.len() {
            return Err(EmbeddingError::EmbeddingFailed(format!(
                "expected {} embeddings, got {}",
                documents.len(),
                embeddings.len()
            ))
            .into());
        }

        Ok(documents
            .into_iter()
            .zip(embeddings)
            .map(|((id, document, metadata), embedding)| StoreRecord {
                id,
                embedding,
                document,
                metadata,
            })
            .collect())
    }
}

fn text(metadata: &Map<String, Value>, key: &str) -> String {
    metadata
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn number(metadata: &Map<String, Value>, key: &str) -> u64 {
    metadata.get(key).and_then(Value::as_u64).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_search_type_parsing() {
        assert_eq!(
            "comprehensive".parse::<SearchType>().unwrap(),
            SearchType::Comprehensive
        );
        assert_eq!(
            "profile_only".parse::<SearchType>().unwrap(),
            SearchType::ProfileOnly
        );
        assert!(matches!(
            "fuzzy".parse::<SearchType>(),
            Err(SearchError::InvalidSearchType(_))
        ));
    }

    #[test]
    fn test_attribute_i64_accepts_floats() {
        let candidate = Candidate {
            metadata: json!({"years_experience": 4.0, "name": "김철수"})
                .as_object()
                .cloned()
                .unwrap(),
            ..Default::default()
        };
        assert_eq!(candidate.attribute_i64("years_experience"), Some(4));
        assert_eq!(candidate.attribute_i64("name"), None);
        assert_eq!(candidate.attribute_str("name"), Some("김철수"));
    }

    #[test]
    fn test_attribute_filters() {
        let metadata = json!({"seniority": "senior", "location": "서울", "years_experience": 5})
            .as_object()
            .cloned()
            .unwrap();

        let filters = AttributeFilters {
            seniority: Some("senior".to_string()),
            primary_role: Some("backend".to_string()),
            ..Default::default()
        };
        // primary_role is absent from the metadata and does not exclude
        assert!(filters.matches(&metadata));

        let filters = AttributeFilters {
            location: Some("부산".to_string()),
            ..Default::default()
        };
        assert!(!filters.matches(&metadata));

        let filters = AttributeFilters {
            min_years_experience: Some(6),
            ..Default::default()
        };
        assert!(!filters.matches(&metadata));
    }

    #[test]
    fn test_blank_attributes_are_dropped() {
        let filters = AttributeFilters {
            seniority: Some("  ".to_string()),
            location: Some("서울".to_string()),
            ..Default::default()
        }
        .normalized();

        assert_eq!(filters.seniority, None);
        assert_eq!(filters.location.as_deref(), Some("서울"));
    }

    #[test]
    fn test_sub_scores_accumulate() {
        let mut scores = SubScores::default();
        scores.add(SubIndex::Skills, 0.25);
        scores.add(SubIndex::Skills, 0.5);
        assert_eq!(scores.skills, Some(0.75));
        assert_eq!(scores.profile, None);
    }
}
