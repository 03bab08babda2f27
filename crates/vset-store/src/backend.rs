//! Backend capability interface
//!
//! The adapter only needs five primitives from the server holding the vector
//! set. Implementations report per-item outcomes as `Ok(bool)`; an `Err` means
//! the call itself failed (connection, protocol, syntax) and is propagated to
//! the caller untouched.

use serde::{Deserialize, Serialize};

use crate::error::VectorResult;
use crate::types::{Entry, Vector};

/// Parameters of one similarity query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarityParams {
    /// Maximum number of hits
    pub count: usize,
    /// Maximum distance from the query, if bounded
    pub tolerance: Option<f64>,
    /// Compiled filter expression
    pub filter: Option<String>,
}

/// Score and attributes attached to a hit
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HitPayload {
    pub score: Option<f64>,
    pub attributes: Option<String>,
}

/// One hit as decoded from the backend reply.
///
/// Fields stay optional so that malformed replies can be dropped by the
/// adapter instead of failing the whole search.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawHit {
    pub id: Option<String>,
    pub payload: Option<HitPayload>,
}

impl RawHit {
    /// Well-formed hit with a score and optional attributes
    pub fn scored(id: impl Into<String>, score: f64, attributes: Option<String>) -> Self {
        Self {
            id: Some(id.into()),
            payload: Some(HitPayload {
                score: Some(score),
                attributes,
            }),
        }
    }
}

/// Primitive operations of a vector-set server
#[cfg_attr(test, mockall::automock)]
pub trait VectorSetBackend: Send + Sync {
    /// Add or replace `entry` under `key`, attaching its metadata as the
    /// element attribute
    fn vector_add(&self, key: &str, entry: &Entry) -> VectorResult<bool>;

    /// Remove element `id` from `key`
    fn vector_remove(&self, key: &str, id: &str) -> VectorResult<bool>;

    /// Raw vector stored for `id`, `None` if there is no such element
    fn vector_fetch(&self, key: &str, id: &str) -> VectorResult<Option<Vector>>;

    /// Nearest elements to `query`, most similar first
    fn vector_similarity_search(
        &self,
        key: &str,
        query: &Vector,
        params: &SimilarityParams,
    ) -> VectorResult<Vec<RawHit>>;

    /// Drop the whole vector set
    fn delete_key(&self, key: &str) -> VectorResult<()>;
}
