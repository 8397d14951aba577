//! The vector database as seen by the search engine.

use serde_json::{Map, Value};

use super::SubIndex;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("store returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed store response: {0}")]
    Decode(String),

    #[error("unknown collection: {0}")]
    UnknownCollection(String),
}

/// A record to be written into a collection.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreRecord {
    pub id: String,
    pub embedding: Vec<f32>,
    pub document: String,
    pub metadata: Map<String, Value>,
}

/// A record read back from a collection. `distance` is only set for
/// nearest-neighbour queries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Hit {
    pub id: String,
    pub metadata: Map<String, Value>,
    pub document: Option<String>,
    pub distance: Option<f32>,
}

impl Hit {
    pub fn developer_id(&self) -> Option<&str> {
        self.metadata.get("developer_id").and_then(Value::as_str)
    }

    /// `1 - distance`. Out of range distances are passed through as is.
    pub fn similarity(&self) -> Option<f32> {
        self.distance.map(|distance| 1.0 - distance)
    }
}

/// Operations the engine needs from a vector database.
///
/// Implementations are blocking; the web layer calls them from
/// `block_in_place`.
pub trait VectorStore: Send + Sync {
    /// Create the collection backing `index` unless it exists.
    fn ensure_collection(&self, index: SubIndex) -> Result<(), StoreError>;

    fn add(&self, index: SubIndex, records: Vec<StoreRecord>) -> Result<(), StoreError>;

    /// Up to `n_results` nearest neighbours of `embedding`, closest first.
    fn query(
        &self,
        index: SubIndex,
        embedding: &[f32],
        n_results: usize,
    ) -> Result<Vec<Hit>, StoreError>;

    /// Every record whose metadata `field` equals `value`.
    fn get_where(&self, index: SubIndex, field: &str, value: &str)
        -> Result<Vec<Hit>, StoreError>;

    fn count(&self, index: SubIndex) -> Result<usize, StoreError>;
}
