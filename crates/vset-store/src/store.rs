//! Vector-set store adapter
//!
//! Every call is a direct round trip to the backend; the store keeps no state
//! besides the backend handle and the key of the vector set. Batch writes and
//! removals are best effort: each item is attempted, item-level failures are
//! logged and counted, and only backend errors abort the call.

use std::sync::Arc;

use tracing::{debug, warn};
use uuid::Uuid;
use vset_filter::compile;

use crate::backend::{RawHit, SimilarityParams, VectorSetBackend};
use crate::error::{VectorError, VectorResult};
use crate::types::{Entry, Match, Metadata, SearchRequest, Vector};

/// Similarity store over one vector set
#[derive(Clone)]
pub struct VectorSetStore {
    backend: Arc<dyn VectorSetBackend>,
    key: String,
}

fn generate_id() -> String {
    Uuid::new_v4().to_string()
}

fn element_at<'a, T: ?Sized>(list: &[Option<&'a T>], index: usize) -> Option<&'a T> {
    list.get(index).copied().flatten()
}

impl VectorSetStore {
    /// Create a store over `key` on the given backend
    pub fn new(backend: Arc<dyn VectorSetBackend>, key: impl Into<String>) -> Self {
        Self {
            backend,
            key: key.into(),
        }
    }

    /// Connect to the Redis server and key named by `config`
    #[cfg(feature = "redis")]
    pub fn connect(config: &crate::config::StoreConfig) -> VectorResult<Self> {
        let backend = crate::redis_backend::RedisVectorSetBackend::connect(config)?;
        Ok(Self::new(Arc::new(backend), config.key.clone()))
    }

    /// Key of the vector set
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Add a vector under a freshly generated ID
    pub fn add(&self, vector: &Vector) -> VectorResult<String> {
        let id = generate_id();
        self.add_with_id(&id, vector)?;
        Ok(id)
    }

    /// Add or replace a vector under `id`
    pub fn add_with_id(&self, id: &str, vector: &Vector) -> VectorResult<()> {
        self.add_batch_with_ids(&[Some(id)], &[Some(vector)], &[])
    }

    /// Add a vector with metadata under a freshly generated ID
    pub fn add_with_metadata(&self, vector: &Vector, metadata: &Metadata) -> VectorResult<String> {
        self.add_batch(std::slice::from_ref(vector), std::slice::from_ref(metadata))?
            .into_iter()
            .next()
            .ok_or(VectorError::EmptyBatch)
    }

    /// Add vectors under freshly generated IDs.
    ///
    /// `metadata[i]` is attached to `vectors[i]` when present. The generated
    /// IDs are returned in input order whether or not the backend accepted
    /// each entry.
    pub fn add_batch(&self, vectors: &[Vector], metadata: &[Metadata]) -> VectorResult<Vec<String>> {
        let ids: Vec<String> = vectors.iter().map(|_| generate_id()).collect();

        let id_refs: Vec<Option<&str>> = ids.iter().map(|id| Some(id.as_str())).collect();
        let vector_refs: Vec<Option<&Vector>> = vectors.iter().map(Some).collect();
        let metadata_refs: Vec<Option<&Metadata>> = metadata.iter().map(Some).collect();

        self.add_batch_with_ids(&id_refs, &vector_refs, &metadata_refs)?;
        Ok(ids)
    }

    /// Add vectors with caller supplied IDs.
    ///
    /// Runs once per element of `vectors`. A missing `ids[i]` is replaced by a
    /// generated ID and a missing `metadata[i]` means no attribute. Elements
    /// whose vector is missing or fails [`Vector::validate`] are skipped.
    pub fn add_batch_with_ids(
        &self,
        ids: &[Option<&str>],
        vectors: &[Option<&Vector>],
        metadata: &[Option<&Metadata>],
    ) -> VectorResult<()> {
        let attempted = vectors.len();

        let succeeded = (0..attempted)
            .filter_map(|index| Self::resolve_entry(index, ids, vectors, metadata))
            .try_fold(0usize, |succeeded, entry| {
                let added = self.backend.vector_add(&self.key, &entry)?;
                if !added {
                    warn!(
                        key = %self.key,
                        id = %entry.id,
                        dimensions = entry.vector.len(),
                        has_metadata = entry.metadata.is_some(),
                        "Entry not added to the vector set"
                    );
                }
                Ok::<_, VectorError>(succeeded + usize::from(added))
            })?;

        debug!(key = %self.key, succeeded, attempted, "Batch add completed");
        Ok(())
    }

    fn resolve_entry(
        index: usize,
        ids: &[Option<&str>],
        vectors: &[Option<&Vector>],
        metadata: &[Option<&Metadata>],
    ) -> Option<Entry> {
        let id = element_at(ids, index).map_or_else(generate_id, str::to_string);

        let Some(vector) = element_at(vectors, index) else {
            warn!(index, "Skipping element since its vector is missing");
            return None;
        };
        if let Err(e) = vector.validate() {
            warn!(index, id = %id, error = %e, "Skipping element since its vector is invalid");
            return None;
        }

        Some(Entry {
            id,
            vector: vector.clone(),
            metadata: element_at(metadata, index).cloned(),
        })
    }

    /// Nearest entries to the request's query vector, in backend order.
    ///
    /// A missing request or query vector yields no matches, while an empty
    /// or non-finite query vector is rejected. Hits lacking an ID or score
    /// are dropped.
    pub fn search(&self, request: Option<&SearchRequest>) -> VectorResult<Vec<Match>> {
        let Some(request) = request else {
            return Ok(Vec::new());
        };
        let Some(query) = request.query_vector.as_ref() else {
            return Ok(Vec::new());
        };
        query.validate()?;

        let filter = compile(request.filter.as_ref());
        if request.filter.is_some() && filter.is_none() {
            warn!(key = %self.key, "Filter could not be compiled; searching without it");
        }

        let params = SimilarityParams {
            count: request.max_results,
            tolerance: request.tolerance(),
            filter,
        };

        let hits = self
            .backend
            .vector_similarity_search(&self.key, query, &params)?;
        let returned = hits.len();

        let matches = hits
            .into_iter()
            .filter_map(|hit| self.reconstruct(hit).transpose())
            .collect::<VectorResult<Vec<_>>>()?;

        debug!(key = %self.key, returned, matched = matches.len(), "Search completed");
        Ok(matches)
    }

    /// Turn a hit into a match, fetching its vector. `Ok(None)` for
    /// malformed hits.
    fn reconstruct(&self, hit: RawHit) -> VectorResult<Option<Match>> {
        let (Some(id), Some(payload)) = (hit.id, hit.payload) else {
            return Ok(None);
        };
        let Some(score) = payload.score else {
            return Ok(None);
        };

        let vector = self
            .backend
            .vector_fetch(&self.key, &id)?
            .unwrap_or_default();

        Ok(Some(Match {
            id,
            score,
            vector,
            metadata: payload.attributes.map(Metadata::from),
        }))
    }

    /// Remove one entry
    pub fn remove(&self, id: &str) -> VectorResult<()> {
        self.remove_batch(&[id])
    }

    /// Remove entries by ID, continuing past IDs the backend did not remove
    pub fn remove_batch<S: AsRef<str>>(&self, ids: &[S]) -> VectorResult<()> {
        let attempted = ids.len();

        let succeeded = ids.iter().try_fold(0usize, |succeeded, id| {
            let id = id.as_ref();
            let removed = self.backend.vector_remove(&self.key, id)?;
            if !removed {
                warn!(key = %self.key, id = %id, "Id not removed from the vector set");
            }
            Ok::<_, VectorError>(succeeded + usize::from(removed))
        })?;

        debug!(key = %self.key, succeeded, attempted, "Batch remove completed");
        Ok(())
    }

    /// Delete the whole vector set
    pub fn remove_all(&self) -> VectorResult<()> {
        self.backend.delete_key(&self.key)?;
        debug!(key = %self.key, "Vector set deleted");
        Ok(())
    }
}
