use crate::{
    config::Config,
    filters::{FilterEngine, FilterProfile, PatternTable},
    search::{chroma::ChromaStore, embeddings::EmbeddingModel, SearchEngine},
};
use anyhow::{Context, Result};
use homedir::my_home;
use std::path::PathBuf;
use std::sync::Arc;

/// Builds the configured components from the environment.
pub struct AppFactory;

impl AppFactory {
    /// Base directory holding `config.yaml` and the model cache.
    pub fn get_base_path() -> Result<PathBuf> {
        if let Ok(base_path) = std::env::var("DEVSEARCH_BASE_PATH") {
            return Ok(PathBuf::from(base_path));
        }

        let home = my_home()
            .map_err(|err| anyhow::anyhow!("Could not determine home directory: {err:?}"))?
            .context("Home directory path is empty")?;
        Ok(home.join(".local/share/devsearch"))
    }

    /// Load config from the base path with `DEVSEARCH_*` overrides applied.
    pub fn load_config() -> Result<Config> {
        let base_path = Self::get_base_path()?;
        std::fs::create_dir_all(&base_path)
            .context("Failed to create application base directory")?;

        let mut config = Config::load_with(&base_path)?;
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Built-in patterns plus the configured custom ones, under `profile`.
    pub fn create_filter_engine(config: &Config, profile: &str) -> Result<FilterEngine> {
        let mut patterns = PatternTable::builtin();
        patterns
            .extend(&config.custom_patterns)
            .context("invalid custom pattern in config")?;

        Ok(FilterEngine::new(
            FilterProfile::resolve(profile, &config.filter_profiles),
            patterns,
        ))
    }

    /// Connect to the store and load the embedding model. Queries are
    /// filtered with `profile` unless a caller picks another per search.
    pub fn create_search_engine(config: &Config, profile: &str) -> Result<SearchEngine> {
        let store = ChromaStore::new(&config.store.url, &config.store.tenant, &config.store.database);
        let embedder = EmbeddingModel::new(&config.embedding.model, config.base_path().to_path_buf())
            .context("Failed to load embedding model")?;
        let filter_engine = Self::create_filter_engine(config, profile)?;

        SearchEngine::new(
            Arc::new(store),
            Arc::new(embedder),
            config.search.clone(),
            filter_engine,
        )
        .with_context(|| format!("Failed to connect to vector store at {}", config.store.url))
    }
}
