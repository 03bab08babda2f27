//! vset store - similarity search over Redis vector sets
//!
//! This crate provides:
//! - `VectorSetStore`, CRUD and nearest-neighbour search over one vector set
//! - `VectorSetBackend` trait for the server primitives the store relies on
//! - In-memory backend for testing
//! - Redis integration (optional, feature-gated)
//! - `TextIndex` for embedding texts before storing or querying them

pub mod backend;
pub mod config;
pub mod embedding;
pub mod error;
pub mod index;
pub mod memory;
pub mod predicate;
#[cfg(feature = "redis")]
pub mod redis_backend;
pub mod store;
pub mod types;

pub use backend::{HitPayload, RawHit, SimilarityParams, VectorSetBackend};
pub use config::StoreConfig;
pub use embedding::{Embedder, MockEmbedder};
pub use error::{VectorError, VectorResult};
pub use index::TextIndex;
pub use memory::InMemoryVectorSetBackend;
#[cfg(feature = "redis")]
pub use redis_backend::RedisVectorSetBackend;
pub use store::VectorSetStore;
pub use types::{Entry, Match, Metadata, SearchRequest, Vector};
pub use vset_filter::{FilterExpr, Operand, Scalar};

/// Prelude for common imports
pub mod prelude {
    pub use crate::backend::VectorSetBackend;
    pub use crate::error::{VectorError, VectorResult};
    pub use crate::store::VectorSetStore;
    pub use crate::types::{Match, Metadata, SearchRequest, Vector};
    pub use vset_filter::FilterExpr;
}
