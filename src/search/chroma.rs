//! Chroma over its v2 HTTP API.

use std::collections::HashMap;
use std::sync::RwLock;

use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Map, Value};

use super::store::{Hit, StoreError, StoreRecord, VectorStore};
use super::SubIndex;

pub const DEFAULT_TENANT: &str = "default_tenant";
pub const DEFAULT_DATABASE: &str = "default_database";

pub struct ChromaStore {
    client: Client,
    base_url: String,
    tenant: String,
    database: String,
    /// collection name -> chroma collection id
    collections: RwLock<HashMap<SubIndex, String>>,
}

#[derive(Debug, Deserialize)]
struct CollectionResponse {
    id: String,
}

type Rows<T> = Vec<Vec<Option<T>>>;

/// `query` answers with one row per query embedding. Any key may be
/// missing or null.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct QueryResponse {
    ids: Vec<Vec<String>>,
    documents: Option<Rows<String>>,
    metadatas: Option<Rows<Map<String, Value>>>,
    distances: Option<Rows<f32>>,
}

impl QueryResponse {
    fn into_hits(self) -> Vec<Hit> {
        let (Some(metadatas), Some(distances)) = (self.metadatas, self.distances) else {
            return Vec::new();
        };
        let (Some(ids), Some(metadatas), Some(distances)) = (
            self.ids.into_iter().next(),
            metadatas.into_iter().next(),
            distances.into_iter().next(),
        ) else {
            return Vec::new();
        };
        let mut documents = self
            .documents
            .and_then(|rows| rows.into_iter().next())
            .unwrap_or_default()
            .into_iter();

        ids.into_iter()
            .zip(metadatas)
            .zip(distances)
            .map(|((id, metadata), distance)| Hit {
                id,
                metadata: metadata.unwrap_or_default(),
                document: documents.next().flatten(),
                distance,
            })
            .collect()
    }
}

/// `get` answers with flat lists.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct GetResponse {
    ids: Vec<String>,
    documents: Option<Vec<Option<String>>>,
    metadatas: Option<Vec<Option<Map<String, Value>>>>,
}

impl GetResponse {
    fn into_hits(self) -> Vec<Hit> {
        let Some(metadatas) = self.metadatas else {
            return Vec::new();
        };
        let mut documents = self.documents.unwrap_or_default().into_iter();

        self.ids
            .into_iter()
            .zip(metadatas)
            .map(|(id, metadata)| Hit {
                id,
                metadata: metadata.unwrap_or_default(),
                document: documents.next().flatten(),
                distance: None,
            })
            .collect()
    }
}

impl ChromaStore {
    pub fn new(base_url: &str, tenant: &str, database: &str) -> Self {
        let base_url = base_url.strip_suffix('/').unwrap_or(base_url).to_string();

        Self {
            client: Client::new(),
            base_url,
            tenant: tenant.to_string(),
            database: database.to_string(),
            collections: RwLock::new(HashMap::new()),
        }
    }

    fn collections_url(&self) -> String {
        format!(
            "{}/api/v2/tenants/{}/databases/{}/collections",
            self.base_url, self.tenant, self.database
        )
    }

    fn post(&self, url: String) -> RequestBuilder {
        log::debug!("POST {url}");
        self.client.post(url)
    }

    fn cached_id(&self, index: SubIndex) -> Option<String> {
        self.collections
            .read()
            .ok()
            .and_then(|ids| ids.get(&index).cloned())
    }

    fn forget(&self, index: SubIndex) {
        if let Ok(mut ids) = self.collections.write() {
            ids.remove(&index);
        }
    }

    fn create_or_get(&self, index: SubIndex) -> Result<String, StoreError> {
        let response = self
            .post(self.collections_url())
            .json(&json!({
                "name": index.as_str(),
                "get_or_create": true,
                "metadata": {"hnsw:space": "cosine"},
            }))
            .send()?;
        let collection: CollectionResponse = decode(index, response)?;

        log::info!("collection '{index}' ready ({})", collection.id);
        if let Ok(mut ids) = self.collections.write() {
            ids.insert(index, collection.id.clone());
        }
        Ok(collection.id)
    }

    fn collection_url(&self, index: SubIndex, action: &str) -> Result<String, StoreError> {
        let id = match self.cached_id(index) {
            Some(id) => id,
            None => self.create_or_get(index)?,
        };
        Ok(format!("{}/{id}/{action}", self.collections_url()))
    }

    /// Decode a collection-scoped response, dropping the cached id if chroma
    /// no longer knows the collection.
    fn scoped<T: DeserializeOwned>(
        &self,
        index: SubIndex,
        response: Response,
    ) -> Result<T, StoreError> {
        let result = decode(index, response);
        if let Err(StoreError::UnknownCollection(_)) = &result {
            self.forget(index);
        }
        result
    }
}

fn decode<T: DeserializeOwned>(index: SubIndex, response: Response) -> Result<T, StoreError> {
    let status = response.status();
    let body = response.text()?;

    if status == StatusCode::NOT_FOUND {
        return Err(StoreError::UnknownCollection(index.to_string()));
    }
    if !status.is_success() {
        log::error!("chroma returned {status} for '{index}': {body}");
        return Err(StoreError::Status {
            status: status.as_u16(),
            body,
        });
    }

    serde_json::from_str(&body).map_err(|err| {
        log::error!("{err}. tried to parse: {body:?}");
        StoreError::Decode(err.to_string())
    })
}

impl VectorStore for ChromaStore {
    fn ensure_collection(&self, index: SubIndex) -> Result<(), StoreError> {
        self.create_or_get(index).map(|_| ())
    }

    fn add(&self, index: SubIndex, records: Vec<StoreRecord>) -> Result<(), StoreError> {
        if records.is_empty() {
            return Ok(());
        }

        let mut ids = Vec::with_capacity(records.len());
        let mut embeddings = Vec::with_capacity(records.len());
        let mut documents = Vec::with_capacity(records.len());
        let mut metadatas = Vec::with_capacity(records.len());
        for record in records {
            ids.push(record.id);
            embeddings.push(record.embedding);
            documents.push(record.document);
            metadatas.push(record.metadata);
        }

        let response = self
            .post(self.collection_url(index, "add")?)
            .json(&json!({
                "ids": ids,
                "embeddings": embeddings,
                "documents": documents,
                "metadatas": metadatas,
            }))
            .send()?;
        // add answers with an empty object
        let _: Value = self.scoped(index, response)?;
        Ok(())
    }

    fn query(
        &self,
        index: SubIndex,
        embedding: &[f32],
        n_results: usize,
    ) -> Result<Vec<Hit>, StoreError> {
        let response = self
            .post(self.collection_url(index, "query")?)
            .json(&json!({
                "query_embeddings": [embedding],
                "n_results": n_results,
                "include": ["documents", "metadatas", "distances"],
            }))
            .send()?;
        let raw: QueryResponse = self.scoped(index, response)?;
        Ok(raw.into_hits())
    }

    fn get_where(
        &self,
        index: SubIndex,
        field: &str,
        value: &str,
    ) -> Result<Vec<Hit>, StoreError> {
        let response = self
            .post(self.collection_url(index, "get")?)
            .json(&json!({
                "where": {field: value},
                "include": ["documents", "metadatas"],
            }))
            .send()?;
        let raw: GetResponse = self.scoped(index, response)?;
        Ok(raw.into_hits())
    }

    fn count(&self, index: SubIndex) -> Result<usize, StoreError> {
        let url = self.collection_url(index, "count")?;
        log::debug!("GET {url}");
        let response = self.client.get(url).send()?;
        self.scoped(index, response)
    }
}
