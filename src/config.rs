use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};

use crate::filters::{CustomPattern, FilterProfile};
use crate::search::chroma::{DEFAULT_DATABASE, DEFAULT_TENANT};
use crate::search::embeddings::DEFAULT_MODEL;

const CONFIG_FILE: &str = "config.yaml";

const DEFAULT_STORE_URL: &str = "http://localhost:8000";
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_SEARCH_LIMIT: usize = 10;
const MAX_SEARCH_LIMIT: usize = 100;
const DEFAULT_SAMPLE_COUNT: usize = 30;

/// Connection to the vector database
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_store_url")]
    pub url: String,
    #[serde(default = "default_tenant")]
    pub tenant: String,
    #[serde(default = "default_database")]
    pub database: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: default_store_url(),
            tenant: default_tenant(),
            database: default_database(),
        }
    }
}

fn default_store_url() -> String {
    DEFAULT_STORE_URL.to_string()
}

fn default_tenant() -> String {
    DEFAULT_TENANT.to_string()
}

fn default_database() -> String {
    DEFAULT_DATABASE.to_string()
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Model name for embeddings (e.g., "all-MiniLM-L6-v2")
    #[serde(default = "default_model")]
    pub model: String,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
        }
    }
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WebConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

/// Weight of each sub-index in the fused score
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SearchWeights {
    pub profile: f32,
    pub skills: f32,
    pub experience: f32,
}

impl Default for SearchWeights {
    fn default() -> Self {
        Self {
            profile: 0.4,
            skills: 0.35,
            experience: 0.25,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default)]
    pub weights: SearchWeights,
    #[serde(default = "default_limit")]
    pub default_limit: usize,
    #[serde(default = "max_limit")]
    pub max_limit: usize,
    /// Developers generated by `init-data`
    #[serde(default = "sample_count")]
    pub sample_count: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            weights: SearchWeights::default(),
            default_limit: default_limit(),
            max_limit: max_limit(),
            sample_count: sample_count(),
        }
    }
}

fn default_limit() -> usize {
    DEFAULT_SEARCH_LIMIT
}

fn max_limit() -> usize {
    MAX_SEARCH_LIMIT
}

fn sample_count() -> usize {
    DEFAULT_SAMPLE_COUNT
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub web: WebConfig,
    #[serde(default)]
    pub search: SearchConfig,
    /// Overrides or additions to the built-in filter profiles, by name
    #[serde(default)]
    pub filter_profiles: BTreeMap<String, FilterProfile>,
    /// Appended to the built-in pattern table at startup
    #[serde(default)]
    pub custom_patterns: Vec<CustomPattern>,

    #[serde(skip_serializing, skip_deserializing)]
    base_path: PathBuf,
}

impl Config {
    pub fn validate(&self) -> anyhow::Result<()> {
        let weights = &self.search.weights;
        for (name, weight) in [
            ("profile", weights.profile),
            ("skills", weights.skills),
            ("experience", weights.experience),
        ] {
            if !weight.is_finite() || weight < 0.0 {
                bail!("search.weights.{name} must be a non-negative number, got {weight}");
            }
        }

        if self.search.default_limit == 0 || self.search.max_limit == 0 {
            bail!("search limits must be greater than 0");
        }
        if self.search.default_limit > self.search.max_limit {
            bail!(
                "search.default_limit ({}) exceeds search.max_limit ({})",
                self.search.default_limit,
                self.search.max_limit
            );
        }

        for (name, profile) in &self.filter_profiles {
            if profile.enabled_filters.is_empty() {
                bail!("filter profile '{name}' enables no filters");
            }
        }

        if self.store.url.trim().is_empty() {
            bail!("store.url is empty");
        }

        Ok(())
    }

    /// Load `config.yaml` from `base_path`, writing the defaults first if it
    /// does not exist.
    pub fn load_with(base_path: &Path) -> anyhow::Result<Self> {
        let path = base_path.join(CONFIG_FILE);

        if !path.exists() {
            std::fs::create_dir_all(base_path)
                .with_context(|| format!("failed to create {}", base_path.display()))?;
            std::fs::write(&path, serde_yml::to_string(&Self::default())?)
                .with_context(|| format!("failed to write {}", path.display()))?;
            log::info!("created default config at {}", path.display());
        }

        let config_str = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let mut config: Self = serde_yml::from_str(&config_str)
            .with_context(|| format!("config is malformed: {}", path.display()))?;

        config.base_path = base_path.to_path_buf();

        config.validate()?;

        // resave in case config version needs an upgrade
        if config_str != serde_yml::to_string(&config)? {
            config.save()?;
        }

        Ok(config)
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let path = self.base_path.join(CONFIG_FILE);
        let config_str = serde_yml::to_string(&self)?;
        std::fs::write(&path, config_str)
            .with_context(|| format!("failed to write {}", path.display()))?;
        Ok(())
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Apply `DEVSEARCH_*` overrides. These are never written back to disk.
    pub fn apply_env<F>(&mut self, lookup: F) -> anyhow::Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("DEVSEARCH_STORE_URL") {
            self.store.url = url;
        }
        if let Some(model) = lookup("DEVSEARCH_MODEL") {
            self.embedding.model = model;
        }
        if let Some(host) = lookup("DEVSEARCH_HOST") {
            self.web.host = host;
        }
        if let Some(port) = lookup("DEVSEARCH_PORT") {
            self.web.port = port
                .trim()
                .parse()
                .with_context(|| format!("DEVSEARCH_PORT is not a port number: {port:?}"))?;
        }

        self.validate()
    }
}
