//! Text indexing on top of the vector-set store

use serde::Serialize;
use std::sync::Arc;
use tracing::debug;
use vset_filter::FilterExpr;

use crate::embedding::Embedder;
use crate::error::{VectorError, VectorResult};
use crate::store::VectorSetStore;
use crate::types::{Match, Metadata, SearchRequest, Vector};

/// Embeds texts and stores or queries them in a vector set
pub struct TextIndex {
    store: VectorSetStore,
    embedder: Arc<dyn Embedder>,
}

impl TextIndex {
    /// Create an index over `store` using `embedder`
    pub fn new(store: VectorSetStore, embedder: Arc<dyn Embedder>) -> Self {
        Self { store, embedder }
    }

    /// Underlying store
    pub fn store(&self) -> &VectorSetStore {
        &self.store
    }

    fn embed(&self, text: &str) -> VectorResult<Vector> {
        if text.trim().is_empty() {
            return Err(VectorError::invalid_input("text cannot be empty"));
        }

        let vector = self.embedder.embed(text)?;
        let expected = self.embedder.dimension();
        if vector.len() != expected {
            return Err(VectorError::InvalidDimension {
                expected,
                actual: vector.len(),
            });
        }
        Ok(vector)
    }

    /// Embed `text` and store it, returning the generated ID
    pub fn add_text(&self, text: &str, metadata: Option<&Metadata>) -> VectorResult<String> {
        let vector = self.embed(text)?;
        let id = match metadata {
            Some(metadata) => self.store.add_with_metadata(&vector, metadata)?,
            None => self.store.add(&vector)?,
        };
        debug!(id = %id, "Text indexed");
        Ok(id)
    }

    /// Embed `text` and store it with `record` serialized as JSON metadata,
    /// which makes the record's fields available to filters
    pub fn add_record<T: Serialize>(&self, text: &str, record: &T) -> VectorResult<String> {
        let metadata = Metadata::from_record(record)?;
        self.add_text(text, Some(&metadata))
    }

    /// Entries nearest to the embedding of `query`
    pub fn search_text(
        &self,
        query: &str,
        filter: Option<FilterExpr>,
        max_results: usize,
    ) -> VectorResult<Vec<Match>> {
        let vector = self.embed(query)?;
        let mut request = SearchRequest::new(vector).with_max_results(max_results);
        request.filter = filter;
        self.store.search(Some(&request))
    }
}
