//! In-memory stand-ins for the vector store and the embedding model.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use serde_json::{json, Map, Value};

use crate::config::SearchConfig;
use crate::filters::FilterEngine;
use crate::search::embeddings::{Embedder, EmbeddingError};
use crate::search::store::{Hit, StoreError, StoreRecord, VectorStore};
use crate::search::{SearchEngine, SubIndex};

const DIMENSIONS: usize = 16;

/// Bag-of-characters embedding, L2 normalised.
#[derive(Default)]
pub struct FakeEmbedder {
    pub fail: AtomicBool,
}

impl Embedder for FakeEmbedder {
    fn name(&self) -> &str {
        "fake"
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(EmbeddingError::EmbeddingFailed("model offline".to_string()));
        }

        let mut vector = vec![0.0f32; DIMENSIONS];
        for c in text.chars() {
            vector[c as usize % DIMENSIONS] += 1.0;
        }
        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|x| *x /= norm);
        }
        Ok(vector)
    }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        texts.iter().map(|text| self.embed(text)).collect()
    }
}

/// Records written through `add` are searchable by cosine distance. Canned
/// hits, when set for a collection, are returned from `query` instead.
#[derive(Default)]
pub struct FakeStore {
    records: Mutex<BTreeMap<SubIndex, Vec<StoreRecord>>>,
    canned: Mutex<BTreeMap<SubIndex, Vec<Hit>>>,
    calls: Mutex<Vec<String>>,
    pub fail: AtomicBool,
}

impl FakeStore {
    pub fn with_hits(index: SubIndex, hits: Vec<Hit>) -> Self {
        let store = Self::default();
        store.set_hits(index, hits);
        store
    }

    pub fn set_hits(&self, index: SubIndex, hits: Vec<Hit>) {
        self.canned.lock().unwrap().insert(index, hits);
    }

    pub fn records(&self, index: SubIndex) -> Vec<StoreRecord> {
        self.records
            .lock()
            .unwrap()
            .get(&index)
            .cloned()
            .unwrap_or_default()
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record_call(&self, call: String) -> Result<(), StoreError> {
        self.calls.lock().unwrap().push(call);
        if self.fail.load(Ordering::SeqCst) {
            return Err(StoreError::Status {
                status: 500,
                body: "store unavailable".to_string(),
            });
        }
        Ok(())
    }
}

fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 1.0;
    }
    1.0 - dot / (norm_a * norm_b)
}

impl VectorStore for FakeStore {
    fn ensure_collection(&self, index: SubIndex) -> Result<(), StoreError> {
        self.record_call(format!("ensure {index}"))
    }

    fn add(&self, index: SubIndex, records: Vec<StoreRecord>) -> Result<(), StoreError> {
        self.record_call(format!("add {index} {}", records.len()))?;
        self.records
            .lock()
            .unwrap()
            .entry(index)
            .or_default()
            .extend(records);
        Ok(())
    }

    fn query(
        &self,
        index: SubIndex,
        embedding: &[f32],
        n_results: usize,
    ) -> Result<Vec<Hit>, StoreError> {
        self.record_call(format!("query {index} {n_results}"))?;

        if let Some(hits) = self.canned.lock().unwrap().get(&index) {
            return Ok(hits.iter().take(n_results).cloned().collect());
        }

        let mut hits: Vec<Hit> = self
            .records(index)
            .into_iter()
            .map(|record| Hit {
                distance: Some(cosine_distance(&record.embedding, embedding)),
                id: record.id,
                metadata: record.metadata,
                document: Some(record.document),
            })
            .collect();
        hits.sort_by(|a, b| a.distance.unwrap_or(1.0).total_cmp(&b.distance.unwrap_or(1.0)));
        hits.truncate(n_results);
        Ok(hits)
    }

    fn get_where(
        &self,
        index: SubIndex,
        field: &str,
        value: &str,
    ) -> Result<Vec<Hit>, StoreError> {
        self.record_call(format!("get {index} {field}={value}"))?;

        Ok(self
            .records(index)
            .into_iter()
            .filter(|record| record.metadata.get(field).and_then(Value::as_str) == Some(value))
            .map(|record| Hit {
                id: record.id,
                metadata: record.metadata,
                document: Some(record.document),
                distance: None,
            })
            .collect())
    }

    fn count(&self, index: SubIndex) -> Result<usize, StoreError> {
        self.record_call(format!("count {index}"))?;
        Ok(self.records(index).len())
    }
}

pub fn metadata(value: Value) -> Map<String, Value> {
    value.as_object().cloned().unwrap_or_default()
}

/// A query hit for `developer_id` with extra metadata.
pub fn hit(developer_id: &str, distance: f32, extra: Value) -> Hit {
    let mut metadata = metadata(extra);
    metadata.insert("developer_id".to_string(), json!(developer_id));
    Hit {
        id: format!("hit_{developer_id}"),
        metadata,
        document: Some(format!("{developer_id} document")),
        distance: Some(distance),
    }
}

pub fn engine_with(store: Arc<FakeStore>, embedder: Arc<FakeEmbedder>) -> SearchEngine {
    SearchEngine::new(
        store,
        embedder,
        SearchConfig::default(),
        FilterEngine::default(),
    )
    .unwrap()
}

pub fn engine(store: Arc<FakeStore>) -> SearchEngine {
    engine_with(store, Arc::new(FakeEmbedder::default()))
}
